//! Throttle detection and backoff resolution for Graph API responses.
//!
//! [`RateLimitClassifier`] decides whether a response is a throttle, [`BackoffPolicy`] turns the
//! response hints into a strictly positive retry-after, and [`ResponseInspector`] combines both
//! into the typed result every outbound call passes through.

pub mod backoff;
pub mod classifier;

pub use backoff::*;
pub use classifier::*;

// self
use crate::{
	_prelude::*,
	http::{ApiRequest, ApiResponse},
	obs,
};

/// Default name of the account-usage header carrying `reset_time_duration`.
pub const DEFAULT_USAGE_HEADER: &str = "x-ad-account-usage";

/// Platform error codes that mean "too many calls" when returned with HTTP 400.
///
/// The list has no authoritative published source, so it is data: callers can extend it
/// through [`RateLimitCodes::with_code`] or configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateLimitCodes(BTreeSet<i64>);
impl RateLimitCodes {
	/// Codes observed from the Marketing API (app, user, page, and ads-management limits).
	pub const KNOWN: [i64; 14] =
		[4, 17, 32, 613, 80000, 80001, 80002, 80003, 80004, 80005, 80006, 80008, 80009, 80014];

	/// Creates a set from arbitrary codes.
	pub fn new(codes: impl IntoIterator<Item = i64>) -> Self {
		Self(codes.into_iter().collect())
	}

	/// Adds a code to the set.
	pub fn with_code(mut self, code: i64) -> Self {
		self.0.insert(code);

		self
	}

	/// Returns `true` when `code` is a rate-limit code.
	pub fn contains(&self, code: i64) -> bool {
		self.0.contains(&code)
	}

	/// Iterates over the codes in ascending order.
	pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
		self.0.iter().copied()
	}
}
impl Default for RateLimitCodes {
	fn default() -> Self {
		Self::new(Self::KNOWN)
	}
}

/// Rate-limit settings shared by the classifier and the backoff policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
	/// Error codes treated as throttles on HTTP 400.
	pub codes: RateLimitCodes,
	/// Header carrying the JSON usage payload.
	pub usage_header: String,
	/// Wait applied when no usable hint is present, in seconds (at least 1).
	pub default_backoff_secs: u64,
}
impl Default for RateLimitConfig {
	fn default() -> Self {
		Self {
			codes: RateLimitCodes::default(),
			usage_header: DEFAULT_USAGE_HEADER.into(),
			default_backoff_secs: BackoffPolicy::DEFAULT_BACKOFF_SECS,
		}
	}
}

/// Throttle failure carrying everything the scheduler needs to defer the work.
#[derive(Clone, Debug, ThisError)]
#[error(
	"Advertising API throttled `{}`; retry after {}s.",
	.request.path,
	.signal.retry_after_secs
)]
pub struct ThrottleError {
	/// Request that triggered the throttle.
	pub request: ApiRequest,
	/// Response that carried the throttle.
	pub response: ApiResponse,
	/// Resolved signal; `retry_after_secs` is always positive.
	pub signal: RateLimitSignal,
}
impl ThrottleError {
	/// Resolved wait in whole seconds.
	pub fn retry_after_secs(&self) -> u64 {
		self.signal.retry_after_secs
	}

	/// Resolved wait as a [`Duration`].
	pub fn retry_after(&self) -> Duration {
		self.signal.retry_after()
	}
}

/// Turns raw responses into `Ok(response) | Throttled | Api error`.
#[derive(Clone, Debug)]
pub struct ResponseInspector {
	/// Throttle classifier.
	pub classifier: RateLimitClassifier,
	/// Backoff resolver used once a throttle is detected.
	pub backoff: BackoffPolicy,
}
impl ResponseInspector {
	/// Builds an inspector from rate-limit settings.
	pub fn new(config: &RateLimitConfig) -> Self {
		Self {
			classifier: RateLimitClassifier::new(config),
			backoff: BackoffPolicy::new(config.default_backoff_secs),
		}
	}

	/// Classifies `response` for `request`, resolving backoff against `now`.
	pub fn inspect(
		&self,
		request: &ApiRequest,
		response: ApiResponse,
		now: OffsetDateTime,
	) -> Result<ApiResponse> {
		let classification = self.classifier.classify(&response);

		if classification.throttled {
			let signal = self.backoff.resolve(&classification.hints, now);

			obs::log_throttle(request, response.status, &signal);

			return Err(ThrottleError { request: request.clone(), response, signal }.into());
		}
		if !response.is_success() {
			return Err(Error::Api {
				status: response.status,
				code: response.error_code(),
				message: response
					.error_message()
					.map(str::to_owned)
					.unwrap_or_else(|| format!("unexpected status for `{}`", request.path)),
			});
		}

		Ok(response)
	}
}
impl Default for ResponseInspector {
	fn default() -> Self {
		Self::new(&RateLimitConfig::default())
	}
}
