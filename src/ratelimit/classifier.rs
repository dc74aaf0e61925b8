//! Code-driven throttle classification.

// self
use crate::{
	_prelude::*,
	http::ApiResponse,
	ratelimit::{RateLimitCodes, RateLimitConfig},
};

const STATUS_TOO_MANY_REQUESTS: u16 = 429;
const STATUS_BAD_REQUEST: u16 = 400;
const RETRY_AFTER: &str = "retry-after";

/// Raw backoff hints copied out of a response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThrottleHints {
	/// `Retry-After` header value, untrimmed.
	pub retry_after: Option<String>,
	/// Account-usage header value (a JSON document).
	pub usage: Option<String>,
}

/// Classifier verdict plus the hints backoff resolution needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
	/// Whether the response is a throttle.
	pub throttled: bool,
	/// Backoff hints, extracted regardless of the verdict.
	pub hints: ThrottleHints,
}

/// Decides whether a response is a throttling event.
///
/// Rules, in order: status 429 is a throttle; status 400 with an error code in the configured
/// set is a throttle; nothing else is, whatever the message text says.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitClassifier {
	codes: RateLimitCodes,
	usage_header: String,
}
impl RateLimitClassifier {
	/// Builds a classifier from rate-limit settings.
	pub fn new(config: &RateLimitConfig) -> Self {
		Self { codes: config.codes.clone(), usage_header: config.usage_header.clone() }
	}

	/// Returns `true` when the response is a throttle.
	pub fn is_throttled(&self, response: &ApiResponse) -> bool {
		match response.status {
			STATUS_TOO_MANY_REQUESTS => true,
			STATUS_BAD_REQUEST =>
				response.error_code().is_some_and(|code| self.codes.contains(code)),
			_ => false,
		}
	}

	/// Classifies the response and extracts backoff hints.
	pub fn classify(&self, response: &ApiResponse) -> Classification {
		let hints = ThrottleHints {
			retry_after: response.headers.get(RETRY_AFTER).map(str::to_owned),
			usage: response.headers.get(&self.usage_header).map(str::to_owned),
		};

		Classification { throttled: self.is_throttled(response), hints }
	}
}
impl Default for RateLimitClassifier {
	fn default() -> Self {
		Self::new(&RateLimitConfig::default())
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::http::ResponseHeaders;

	fn response(status: u16, body: JsonValue) -> ApiResponse {
		ApiResponse::new(status, body, ResponseHeaders::default())
	}

	#[test]
	fn status_429_is_throttled_regardless_of_body() {
		let classifier = RateLimitClassifier::default();

		for body in
			[JsonValue::Null, json!({ "error": { "code": 100 } }), json!("plain"), json!([1, 2])]
		{
			assert!(classifier.is_throttled(&response(429, body)));
		}
	}

	#[test]
	fn status_400_depends_on_code_membership() {
		let classifier = RateLimitClassifier::default();

		for code in RateLimitCodes::KNOWN {
			assert!(
				classifier.is_throttled(&response(400, json!({ "error": { "code": code } }))),
				"Code {code} with 400 should be throttled."
			);
		}
		for code in [1, 2, 100, 190, 200, 368, 80007] {
			assert!(
				!classifier.is_throttled(&response(400, json!({ "error": { "code": code } }))),
				"Code {code} with 400 should not be throttled."
			);
		}
	}

	#[test]
	fn message_text_never_triggers_throttling() {
		let classifier = RateLimitClassifier::default();
		let body = json!({ "error": { "code": 100, "message": "Too many calls, rate limit hit" } });

		assert!(!classifier.is_throttled(&response(400, body.clone())));
		assert!(!classifier.is_throttled(&response(403, body)));
		assert!(!classifier.is_throttled(&response(400, JsonValue::Null)));
	}

	#[test]
	fn known_codes_on_other_statuses_are_not_throttles() {
		let classifier = RateLimitClassifier::default();

		assert!(!classifier.is_throttled(&response(500, json!({ "error": { "code": 17 } }))));
		assert!(!classifier.is_throttled(&response(200, json!({ "code": 4 }))));
	}

	#[test]
	fn custom_codes_extend_the_set() {
		let config = RateLimitConfig {
			codes: RateLimitCodes::default().with_code(2446079),
			..RateLimitConfig::default()
		};
		let classifier = RateLimitClassifier::new(&config);

		assert!(classifier.is_throttled(&response(400, json!({ "error": { "code": 2446079 } }))));
	}

	#[test]
	fn classify_extracts_hints_from_configured_headers() {
		let config =
			RateLimitConfig { usage_header: "x-business-usage".into(), ..RateLimitConfig::default() };
		let classifier = RateLimitClassifier::new(&config);
		let headers: ResponseHeaders = [
			("Retry-After", "17"),
			("X-Business-Usage", "{\"reset_time_duration\":3}"),
			("X-Ad-Account-Usage", "{\"reset_time_duration\":9}"),
		]
		.into_iter()
		.collect();
		let classification = classifier.classify(&ApiResponse::new(429, JsonValue::Null, headers));

		assert!(classification.throttled);
		assert_eq!(classification.hints.retry_after.as_deref(), Some("17"));
		assert_eq!(classification.hints.usage.as_deref(), Some("{\"reset_time_duration\":3}"));
	}
}
