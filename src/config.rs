//! Client configuration: API root, app credentials, timeouts, paging, renewal, and rate limits.
//!
//! Build a [`ClientConfig`] with [`ClientConfig::builder`] or load one from JSON with
//! [`ClientConfig::from_json`]. Both paths run the same validation.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	gate::DEFAULT_RENEWAL_BUFFER,
	paging::DEFAULT_PAGE_SIZE,
	ratelimit::{BackoffPolicy, DEFAULT_USAGE_HEADER, RateLimitCodes, RateLimitConfig},
};

/// Default Graph API host.
pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/";
/// Default Graph API version label.
pub const DEFAULT_API_VERSION: &str = "v19.0";
/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(30);
/// Largest page size the Graph API honors for collection edges.
pub const MAX_PAGE_SIZE: u32 = 500;
/// Longest accepted renewal buffer; long-lived Graph tokens last about 60 days.
pub const MAX_RENEWAL_BUFFER: Duration = Duration::days(365);

/// Validated client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Graph API host, e.g. `https://graph.facebook.com/`.
	pub base_url: Url,
	/// Version label prefixed to every path, e.g. `v19.0`.
	pub api_version: String,
	/// App id used by the token exchange.
	pub app_id: Option<String>,
	/// App secret used by the token exchange.
	pub app_secret: Option<TokenSecret>,
	/// Upper bound for a single outbound call.
	pub timeout: Duration,
	/// Default page size for collection edges.
	pub page_size: u32,
	/// Lead time before expiry inside which credentials are renewed.
	pub renewal_buffer: Duration,
	/// Throttle classification and backoff settings.
	pub rate_limit: RateLimitConfig,
}
impl ClientConfig {
	/// Returns a builder seeded with defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Parses and validates a JSON settings document.
	///
	/// Every field is optional; durations are expressed in seconds.
	pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(raw);
		let settings: ClientSettings = serde_path_to_error::deserialize(&mut de)?;

		settings.into_builder()?.build()
	}

	/// Versioned API root every request path is resolved against.
	pub fn versioned_root(&self) -> Result<Url, ConfigError> {
		let mut root = self.base_url.clone();

		if !root.path().ends_with('/') {
			let path = format!("{}/", root.path());

			root.set_path(&path);
		}

		root.join(&format!("{}/", self.api_version))
			.map_err(|source| ConfigError::InvalidUrl { source })
	}
}

/// Builder for [`ClientConfig`].
#[derive(Clone, Debug, Default)]
pub struct ClientConfigBuilder {
	base_url: Option<Url>,
	api_version: Option<String>,
	app_id: Option<String>,
	app_secret: Option<TokenSecret>,
	timeout: Option<Duration>,
	page_size: Option<u32>,
	renewal_buffer: Option<Duration>,
	rate_limit_codes: Option<RateLimitCodes>,
	extra_rate_limit_codes: Vec<i64>,
	usage_header: Option<String>,
	default_backoff_secs: Option<u64>,
}
impl ClientConfigBuilder {
	/// Overrides the Graph API host.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Overrides the Graph API version label.
	pub fn api_version(mut self, version: impl Into<String>) -> Self {
		self.api_version = Some(version.into());

		self
	}

	/// Sets the app id and secret used by the token exchange.
	pub fn app_credentials(mut self, app_id: impl Into<String>, secret: impl Into<String>) -> Self {
		self.app_id = Some(app_id.into());
		self.app_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Overrides the per-call timeout (defaults to 30 seconds).
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Overrides the default page size (defaults to 25).
	pub fn page_size(mut self, size: u32) -> Self {
		self.page_size = Some(size);

		self
	}

	/// Overrides the renewal buffer (defaults to 7 days).
	pub fn renewal_buffer(mut self, buffer: Duration) -> Self {
		self.renewal_buffer = Some(buffer);

		self
	}

	/// Replaces the rate-limit code set.
	pub fn rate_limit_codes(mut self, codes: RateLimitCodes) -> Self {
		self.rate_limit_codes = Some(codes);

		self
	}

	/// Adds a code on top of the configured set.
	pub fn extra_rate_limit_code(mut self, code: i64) -> Self {
		self.extra_rate_limit_codes.push(code);

		self
	}

	/// Overrides the usage header name.
	pub fn usage_header(mut self, name: impl Into<String>) -> Self {
		self.usage_header = Some(name.into());

		self
	}

	/// Overrides the fallback backoff (defaults to 60 seconds).
	pub fn default_backoff_secs(mut self, secs: u64) -> Self {
		self.default_backoff_secs = Some(secs);

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let base_url = match self.base_url {
			Some(url) => url,
			None => Url::parse(DEFAULT_BASE_URL).map_err(|source| ConfigError::InvalidUrl { source })?,
		};
		let mut codes = self.rate_limit_codes.unwrap_or_default();

		for code in self.extra_rate_limit_codes {
			codes = codes.with_code(code);
		}

		let config = ClientConfig {
			base_url,
			api_version: self.api_version.unwrap_or_else(|| DEFAULT_API_VERSION.into()),
			app_id: self.app_id,
			app_secret: self.app_secret,
			timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
			page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
			renewal_buffer: self.renewal_buffer.unwrap_or(DEFAULT_RENEWAL_BUFFER),
			rate_limit: RateLimitConfig {
				codes,
				usage_header: self.usage_header.unwrap_or_else(|| DEFAULT_USAGE_HEADER.into()),
				default_backoff_secs: self
					.default_backoff_secs
					.unwrap_or(BackoffPolicy::DEFAULT_BACKOFF_SECS),
			},
		};

		config.validate()?;

		Ok(config)
	}
}

impl ClientConfig {
	fn validate(&self) -> Result<(), ConfigError> {
		validate_base_url(&self.base_url)?;

		if self.api_version.is_empty() || self.api_version.contains('/') {
			return Err(ConfigError::InvalidApiVersion { version: self.api_version.clone() });
		}
		if !self.timeout.is_positive() {
			return Err(ConfigError::NonPositiveTimeout);
		}
		if self.renewal_buffer.is_negative() || self.renewal_buffer > MAX_RENEWAL_BUFFER {
			return Err(ConfigError::RenewalBufferOutOfRange {
				max_days: MAX_RENEWAL_BUFFER.whole_days(),
			});
		}
		if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
			return Err(ConfigError::PageSizeOutOfRange { size: self.page_size, max: MAX_PAGE_SIZE });
		}
		if self.rate_limit.default_backoff_secs == 0 {
			return Err(ConfigError::NonPositiveBackoff);
		}

		Ok(())
	}
}

fn validate_base_url(url: &Url) -> Result<(), ConfigError> {
	let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

	if url.scheme() == "https" || (url.scheme() == "http" && loopback) {
		Ok(())
	} else {
		Err(ConfigError::InsecureUrl { url: url.to_string() })
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ClientSettings {
	base_url: Option<String>,
	api_version: Option<String>,
	app_id: Option<String>,
	app_secret: Option<String>,
	timeout_secs: Option<u64>,
	page_size: Option<u32>,
	renewal_buffer_secs: Option<u64>,
	rate_limit_codes: Option<RateLimitCodes>,
	extra_rate_limit_codes: Vec<i64>,
	usage_header: Option<String>,
	default_backoff_secs: Option<u64>,
}
impl ClientSettings {
	fn into_builder(self) -> Result<ClientConfigBuilder, ConfigError> {
		let mut builder = ClientConfig::builder();

		if let Some(raw) = self.base_url {
			builder = builder
				.base_url(Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { source })?);
		}
		if let Some(version) = self.api_version {
			builder = builder.api_version(version);
		}
		match (self.app_id, self.app_secret) {
			(Some(id), Some(secret)) => builder = builder.app_credentials(id, secret),
			(None, None) => {},
			_ => return Err(ConfigError::MissingAppCredentials),
		}
		if let Some(secs) = self.timeout_secs {
			builder = builder.timeout(seconds(secs));
		}
		if let Some(size) = self.page_size {
			builder = builder.page_size(size);
		}
		if let Some(secs) = self.renewal_buffer_secs {
			builder = builder.renewal_buffer(seconds(secs));
		}
		if let Some(codes) = self.rate_limit_codes {
			builder = builder.rate_limit_codes(codes);
		}
		for code in self.extra_rate_limit_codes {
			builder = builder.extra_rate_limit_code(code);
		}
		if let Some(header) = self.usage_header {
			builder = builder.usage_header(header);
		}
		if let Some(secs) = self.default_backoff_secs {
			builder = builder.default_backoff_secs(secs);
		}

		Ok(builder)
	}
}

fn seconds(secs: u64) -> Duration {
	Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
}
