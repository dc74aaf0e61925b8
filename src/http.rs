//! Transport primitives for Graph API calls.
//!
//! [`ApiRequest`] and [`ApiResponse`] are immutable values built once per call and handed by
//! value to the classifier and backoff logic. [`ApiTransport`] is the crate's only dependency on
//! an HTTP stack; the reqwest-backed [`ReqwestTransport`] ships behind the `reqwest` feature.

// self
use crate::{_prelude::*, auth::TokenSecret};
#[cfg(feature = "reqwest")]
use crate::{
	config::ClientConfig,
	error::{ConfigError, TransportError},
};

const REDACTED_QUERY_KEYS: &[&str] = &["access_token", "client_secret", "fb_exchange_token"];

/// Boxed future returned by [`ApiTransport::send`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<ApiResponse>> + 'a + Send>>;

/// Abstraction over HTTP transports able to execute Graph API requests.
///
/// Implementations resolve `request.path` against their versioned base URL, attach
/// `Authorization: Bearer <token>` when `bearer` is set, and return every HTTP response
/// (including error statuses) as an [`ApiResponse`]. Only failures that produced no response
/// at all (DNS, TLS, timeout) surface as errors.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and captures the full response.
	fn send<'a>(
		&'a self,
		request: &'a ApiRequest,
		bearer: Option<&'a TokenSecret>,
	) -> TransportFuture<'a>;
}

/// HTTP verbs used against the Graph API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	#[default]
	/// Read requests.
	Get,
	/// Write requests.
	Post,
}
impl Method {
	/// Returns the verb as sent on the wire.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Descriptor of an outbound call, relative to the versioned API root.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: Method,
	/// Path relative to the versioned root, e.g. `act_123/campaigns`.
	pub path: String,
	/// Ordered query parameters.
	pub query: Vec<(String, String)>,
}
impl ApiRequest {
	/// Creates a request with the provided verb and path.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		let path = path.into();

		Self { method, path: path.trim_start_matches('/').to_owned(), query: Vec::new() }
	}

	/// Convenience constructor for `GET` requests.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// Sets a query parameter, replacing any previous value for the key.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.set_query(key, value);

		self
	}

	/// Sets a query parameter in place, replacing any previous value for the key.
	pub fn set_query(&mut self, key: impl Into<String>, value: impl Into<String>) {
		let key = key.into();
		let value = value.into();

		match self.query.iter_mut().find(|(k, _)| *k == key) {
			Some(slot) => slot.1 = value,
			None => self.query.push((key, value)),
		}
	}

	/// Removes a query parameter.
	pub fn remove_query(&mut self, key: &str) {
		self.query.retain(|(k, _)| k != key);
	}

	/// Returns the value of a query parameter.
	pub fn query_value(&self, key: &str) -> Option<&str> {
		self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
	}
}
impl Debug for ApiRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let query = self
			.query
			.iter()
			.map(|(k, v)| {
				let shown =
					if REDACTED_QUERY_KEYS.contains(&k.as_str()) { "<redacted>" } else { v.as_str() };

				(k.as_str(), shown)
			})
			.collect::<Vec<_>>();

		f.debug_struct("ApiRequest")
			.field("method", &self.method)
			.field("path", &self.path)
			.field("query", &query)
			.finish()
	}
}

/// Ordered response headers with case-insensitive lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeaders(Vec<(String, String)>);
impl ResponseHeaders {
	/// Returns the first value stored under `name`, ignoring ASCII case.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.0.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
	}

	/// Appends a header, keeping arrival order.
	pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.0.push((name.into(), value.into()));
	}

	/// Iterates over headers in arrival order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}
impl<K, V> FromIterator<(K, V)> for ResponseHeaders
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

/// Immutable snapshot of a Graph API response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Parsed JSON body; `Null` when the body is empty or not JSON.
	pub body: JsonValue,
	/// Response headers in arrival order.
	pub headers: ResponseHeaders,
}
impl ApiResponse {
	/// Creates a response from already-parsed parts.
	pub fn new(status: u16, body: JsonValue, headers: ResponseHeaders) -> Self {
		Self { status, body, headers }
	}

	/// Creates a response from raw body bytes.
	pub fn from_bytes(status: u16, headers: ResponseHeaders, bytes: &[u8]) -> Self {
		let body = if bytes.is_empty() {
			JsonValue::Null
		} else {
			serde_json::from_slice(bytes).unwrap_or(JsonValue::Null)
		};

		Self { status, body, headers }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Platform error code, read from `error.code` or a top-level `code`.
	///
	/// Numeric strings are accepted; anything else is treated as absent.
	pub fn error_code(&self) -> Option<i64> {
		let raw = self.body.pointer("/error/code").or_else(|| self.body.get("code"))?;

		match raw {
			JsonValue::Number(n) => n.as_i64(),
			JsonValue::String(s) => s.trim().parse().ok(),
			_ => None,
		}
	}

	/// Platform error message, read from `error.message` or a top-level `message`.
	pub fn error_message(&self) -> Option<&str> {
		self.body
			.pointer("/error/message")
			.or_else(|| self.body.get("message"))
			.and_then(JsonValue::as_str)
	}
}

/// Reqwest-backed [`ApiTransport`] bound to a versioned Graph API root.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	root: Url,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport with the configured timeout.
	pub fn new(config: &ClientConfig) -> Result<Self> {
		let client = ReqwestClient::builder()
			.timeout(config.timeout.unsigned_abs())
			.build()
			.map_err(ConfigError::from)?;

		Self::with_client(config, client)
	}

	/// Wraps an existing reqwest client. The caller owns its timeout configuration.
	pub fn with_client(config: &ClientConfig, client: ReqwestClient) -> Result<Self> {
		Ok(Self { client, root: config.versioned_root()? })
	}

	fn endpoint(&self, request: &ApiRequest) -> Result<Url> {
		let mut url = self
			.root
			.join(&request.path)
			.map_err(|source| ConfigError::InvalidUrl { source })?;

		if !request.query.is_empty() {
			url.query_pairs_mut().extend_pairs(request.query.iter());
		}

		Ok(url)
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn send<'a>(
		&'a self,
		request: &'a ApiRequest,
		bearer: Option<&'a TokenSecret>,
	) -> TransportFuture<'a> {
		Box::pin(async move {
			let url = self.endpoint(request)?;
			let method = match request.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
			};
			let mut builder = self.client.request(method, url);

			if let Some(token) = bearer {
				builder = builder.header(reqwest::header::AUTHORIZATION, token.bearer());
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
				})
				.collect::<ResponseHeaders>();
			let bytes = response.bytes().await.map_err(TransportError::from)?;

			Ok(ApiResponse::from_bytes(status, headers, &bytes))
		})
	}
}
