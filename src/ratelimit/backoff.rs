//! Resolves throttle hints into a single strictly positive retry-after.

// crates.io
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, obs, ratelimit::ThrottleHints};

const RESET_TIME_DURATION: &str = "reset_time_duration";

/// Where a resolved retry-after came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalSource {
	/// `Retry-After` header.
	Header,
	/// `reset_time_duration` inside the account-usage header.
	UsageHeader,
	/// No usable hint; the policy default applied.
	DefaultFallback,
}
impl SignalSource {
	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Header => "header",
			Self::UsageHeader => "usage-header",
			Self::DefaultFallback => "default-fallback",
		}
	}
}
impl Display for SignalSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Transient per-response rate-limit verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSignal {
	/// Whether a throttle was detected.
	pub detected: bool,
	/// Mandatory minimum wait before retrying, in seconds.
	pub retry_after_secs: u64,
	/// Hint that produced `retry_after_secs`.
	pub source: SignalSource,
}
impl RateLimitSignal {
	/// Signal for responses that are not throttles.
	pub const fn clear() -> Self {
		Self { detected: false, retry_after_secs: 0, source: SignalSource::DefaultFallback }
	}

	/// Wait as a [`Duration`].
	pub fn retry_after(&self) -> Duration {
		Duration::seconds(i64::try_from(self.retry_after_secs).unwrap_or(i64::MAX))
	}
}

/// Ordered backoff resolution: `Retry-After`, then usage `reset_time_duration`, then a default.
///
/// Hints that are missing, unparseable, or resolve to zero fall through to the next rule, so
/// [`BackoffPolicy::resolve`] always yields a strictly positive wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
	default_secs: u64,
}
impl BackoffPolicy {
	/// Wait applied when no hint is usable.
	pub const DEFAULT_BACKOFF_SECS: u64 = 60;

	/// Creates a policy; a zero default is raised to one second.
	pub fn new(default_secs: u64) -> Self {
		Self { default_secs: default_secs.max(1) }
	}

	/// Fallback wait in seconds.
	pub fn default_secs(&self) -> u64 {
		self.default_secs
	}

	/// Resolves the wait for a detected throttle.
	pub fn resolve(&self, hints: &ThrottleHints, now: OffsetDateTime) -> RateLimitSignal {
		let (retry_after_secs, source) = if let Some(secs) =
			hints.retry_after.as_deref().and_then(|raw| parse_retry_after(raw, now))
		{
			(secs, SignalSource::Header)
		} else if let Some(secs) = hints.usage.as_deref().and_then(parse_usage_reset) {
			(secs, SignalSource::UsageHeader)
		} else {
			(self.default_secs, SignalSource::DefaultFallback)
		};

		RateLimitSignal { detected: true, retry_after_secs, source }
	}
}
impl Default for BackoffPolicy {
	fn default() -> Self {
		Self::new(Self::DEFAULT_BACKOFF_SECS)
	}
}

/// Parses `Retry-After` as integer seconds or an HTTP-date; `None` unless the wait is positive.
pub fn parse_retry_after(raw: &str, now: OffsetDateTime) -> Option<u64> {
	let raw = raw.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return (secs > 0).then_some(secs);
	}

	match OffsetDateTime::parse(raw, &Rfc2822) {
		Ok(moment) => {
			let delta = (moment - now).whole_seconds().max(0);

			u64::try_from(delta).ok().filter(|secs| *secs > 0)
		},
		Err(_) => {
			obs::log_unusable_hint("retry-after", "not integer seconds or an HTTP-date");

			None
		},
	}
}

/// Reads a positive numeric `reset_time_duration` from a usage header payload.
///
/// Fractional values round up so the caller never retries early.
pub fn parse_usage_reset(raw: &str) -> Option<u64> {
	let payload = match serde_json::from_str::<JsonValue>(raw) {
		Ok(payload) => payload,
		Err(_) => {
			obs::log_unusable_hint("usage", "payload is not valid JSON");

			return None;
		},
	};
	let value = payload.get(RESET_TIME_DURATION)?;

	if let Some(secs) = value.as_u64() {
		return (secs > 0).then_some(secs);
	}

	value.as_f64().filter(|secs| secs.is_finite() && *secs > 0.0).map(|secs| secs.ceil() as u64)
}
