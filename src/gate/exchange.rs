//! Graph long-lived token exchange (`grant_type=fb_exchange_token`).

// self
use crate::{
	_prelude::*,
	auth::{Connection, Renewal, TokenSecret},
	clock::{Clock, SystemClock},
	config::ClientConfig,
	error::ConfigError,
	gate::{RenewFuture, TokenRenewer},
	http::{ApiRequest, ApiTransport},
	ratelimit::ResponseInspector,
};

const EXCHANGE_PATH: &str = "oauth/access_token";
const EXCHANGE_GRANT: &str = "fb_exchange_token";

/// [`TokenRenewer`] that exchanges the current credential for a new long-lived token.
///
/// The refresh token is presented when the connection has one; otherwise the access token
/// itself is exchanged. Exchange responses pass through the same throttle classifier as data
/// calls, so a throttled renewal surfaces as [`Error::Throttled`].
pub struct ExchangeRenewer<T>
where
	T: ?Sized,
{
	transport: Arc<T>,
	app_id: Option<String>,
	app_secret: Option<TokenSecret>,
	inspector: ResponseInspector,
	clock: Arc<dyn Clock>,
}
impl<T> ExchangeRenewer<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a renewer using the app credentials and rate-limit settings from `config`.
	pub fn new(config: &ClientConfig, transport: Arc<T>) -> Self {
		Self {
			transport,
			app_id: config.app_id.clone(),
			app_secret: config.app_secret.clone(),
			inspector: ResponseInspector::new(&config.rate_limit),
			clock: Arc::new(SystemClock),
		}
	}

	/// Replaces the clock used to compute `expires_at` and resolve backoff.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Builds the exchange request for `secret`.
	pub fn exchange_request(&self, secret: &TokenSecret) -> Result<ApiRequest, ConfigError> {
		let (Some(app_id), Some(app_secret)) = (&self.app_id, &self.app_secret) else {
			return Err(ConfigError::MissingAppCredentials);
		};

		Ok(ApiRequest::get(EXCHANGE_PATH)
			.with_query("grant_type", EXCHANGE_GRANT)
			.with_query("client_id", app_id.as_str())
			.with_query("client_secret", app_secret.expose())
			.with_query("fb_exchange_token", secret.expose()))
	}
}
impl<T> TokenRenewer for ExchangeRenewer<T>
where
	T: ?Sized + ApiTransport,
{
	fn renew<'a>(&'a self, connection: &'a Connection) -> RenewFuture<'a> {
		Box::pin(async move {
			let secret = connection
				.renewal_secret()
				.ok_or_else(|| Error::CredentialExpired { connection: connection.id.clone() })?;
			let request = self.exchange_request(secret)?;
			let response = self.transport.send(&request, None).await?;
			let now = self.clock.now();
			let response = self.inspector.inspect(&request, response, now)?;

			parse_renewal(&response.body, now)
		})
	}
}

#[derive(Debug, Deserialize)]
struct ExchangeResponse {
	access_token: String,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default)]
	expires_in: Option<u64>,
}

fn parse_renewal(body: &JsonValue, now: OffsetDateTime) -> Result<Renewal> {
	let parsed: ExchangeResponse = serde_path_to_error::deserialize(body).map_err(|e| {
		Error::malformed(format!("token exchange response is invalid at `{}`", e.path()))
	})?;
	let access_token = TokenSecret::new(parsed.access_token);

	if access_token.is_blank() {
		return Err(Error::malformed("token exchange returned a blank access token"));
	}

	let expires_at = parsed
		.expires_in
		.map(|secs| {
			i64::try_from(secs)
				.ok()
				.and_then(|secs| now.checked_add(Duration::seconds(secs)))
				.ok_or_else(|| Error::malformed("token exchange returned an out-of-range `expires_in`"))
		})
		.transpose()?;

	Ok(Renewal {
		access_token,
		refresh_token: parsed.refresh_token.map(TokenSecret::new).filter(|token| !token.is_blank()),
		expires_at,
	})
}
