//! Client-level error types shared across the gate, paging, and job layers.

// self
use crate::{
	_prelude::*, auth::ConnectionId, job::QueueError, ratelimit::ThrottleError, sink::SinkError,
	store::StoreError,
};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// [`Error::Throttled`] is the only variant the job envelope treats as recoverable; every other
/// variant follows the surrounding framework's failure handling.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The advertising API asked the caller to slow down.
	#[error(transparent)]
	Throttled(Box<ThrottleError>),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Credential store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		StoreError,
	),
	/// Job queue failure.
	#[error(transparent)]
	Queue(#[from] QueueError),
	/// Persistence sink failure.
	#[error(transparent)]
	Sink(#[from] SinkError),

	/// Response could not be interpreted (missing `data`, broken paging metadata, bad JSON).
	#[error("Advertising API returned a malformed response: {reason}.")]
	MalformedResponse {
		/// Description of what was missing or invalid.
		reason: String,
	},
	/// No renewable access token is available for the connection.
	#[error("Connection `{connection}` has no usable access token.")]
	CredentialExpired {
		/// Connection whose credential is unusable.
		connection: ConnectionId,
	},
	/// Non-throttle error status returned by the advertising API.
	#[error("Advertising API returned status {status}: {message}.")]
	Api {
		/// HTTP status code.
		status: u16,
		/// Platform error code from the error body, when present.
		code: Option<i64>,
		/// Platform error message, or a generic description.
		message: String,
	},
}
impl Error {
	/// Builds a [`Error::MalformedResponse`] from any displayable reason.
	pub fn malformed(reason: impl Into<String>) -> Self {
		Self::MalformedResponse { reason: reason.into() }
	}

	/// Returns `true` for throttle signals.
	pub fn is_throttled(&self) -> bool {
		matches!(self, Self::Throttled(_))
	}

	/// Returns the throttle payload when this error is a throttle signal.
	pub fn as_throttle(&self) -> Option<&ThrottleError> {
		match self {
			Self::Throttled(throttle) => Some(throttle),
			_ => None,
		}
	}

	/// Mandatory wait before retrying, present only for throttle signals.
	pub fn retry_after(&self) -> Option<Duration> {
		self.as_throttle().map(ThrottleError::retry_after)
	}

	/// Message suitable for end users; internal detail stays in logs.
	pub fn user_message(&self) -> &'static str {
		match self {
			Self::Throttled(_) => "The advertising platform is busy. Please try again later.",
			Self::CredentialExpired { .. } =>
				"Your advertising account connection has expired. Please reconnect it.",
			Self::Transport(_) => "The advertising platform could not be reached.",
			_ => "Synchronization failed.",
		}
	}
}
impl From<ThrottleError> for Error {
	fn from(e: ThrottleError) -> Self {
		Self::Throttled(Box::new(e))
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed or joined.
	#[error("Base URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL must use HTTPS outside of loopback hosts.
	#[error("The base URL must use HTTPS: {url}.")]
	InsecureUrl {
		/// URL that failed validation.
		url: String,
	},
	/// Graph API version label is empty or contains a slash.
	#[error("API version `{version}` is invalid.")]
	InvalidApiVersion {
		/// Rejected version label.
		version: String,
	},
	/// Request timeout must be strictly positive.
	#[error("The request timeout must be positive.")]
	NonPositiveTimeout,
	/// Renewal buffer is negative or longer than the accepted maximum.
	#[error("The renewal buffer must be between zero and {max_days} days.")]
	RenewalBufferOutOfRange {
		/// Longest accepted buffer, in days.
		max_days: i64,
	},
	/// Page size is outside the range the platform accepts.
	#[error("Page size {size} is outside 1..={max}.")]
	PageSizeOutOfRange {
		/// Rejected page size.
		size: u32,
		/// Largest accepted page size.
		max: u32,
	},
	/// Default backoff must be at least one second.
	#[error("The default backoff must be at least one second.")]
	NonPositiveBackoff,
	/// Token renewal requires app credentials.
	#[error("Token renewal requires an app id and app secret.")]
	MissingAppCredentials,
	/// Settings document could not be parsed.
	#[error("Client settings are invalid at `{path}`.")]
	Parse {
		/// JSON path to the offending field.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: serde_json::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<serde_path_to_error::Error<serde_json::Error>> for ConfigError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let path = e.path().to_string();

		Self::Parse { path, source: e.into_inner() }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network or timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the advertising API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The call neither completed nor produced a classifiable response in time.
	#[error("Advertising API call timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}

	/// Returns `true` when the failure was a timeout.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
