//! Graph API client: credential gate, transport, and throttle classification in one call path.

// self
use crate::{
	_prelude::*,
	auth::ConnectionId,
	clock::{Clock, SystemClock},
	config::ClientConfig,
	gate::FreshnessGate,
	http::{ApiRequest, ApiResponse, ApiTransport},
	obs::{self, OpKind, OpOutcome, OpSpan},
	paging::{PageFetcher, PageFuture, Paginator},
	ratelimit::ResponseInspector,
};
#[cfg(feature = "reqwest")]
use crate::{gate::ExchangeRenewer, http::ReqwestTransport, store::ConnectionStore};

#[cfg(feature = "reqwest")]
/// Graph client specialized for the crate's default reqwest transport.
pub type ReqwestGraphClient = GraphClient<ReqwestTransport>;

/// Executes Graph API calls on behalf of stored connections.
///
/// Every call first passes the [`FreshnessGate`], then goes out with the connection's bearer
/// token, and finally runs through the [`ResponseInspector`]. Throttles therefore always
/// surface as [`Error::Throttled`] with a positive retry-after, and no other error variant
/// carries one.
pub struct GraphClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Transport used for every outbound call.
	pub transport: Arc<T>,
	/// Credential gate consulted before each call.
	pub gate: Arc<FreshnessGate>,
	inspector: ResponseInspector,
	clock: Arc<dyn Clock>,
	page_size: u32,
}
impl<T> GraphClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a client that reuses the caller-provided transport and gate.
	pub fn new(
		config: &ClientConfig,
		transport: impl Into<Arc<T>>,
		gate: Arc<FreshnessGate>,
	) -> Self {
		Self {
			transport: transport.into(),
			gate,
			inspector: ResponseInspector::new(&config.rate_limit),
			clock: Arc::new(SystemClock),
			page_size: config.page_size,
		}
	}

	/// Replaces the clock used to resolve HTTP-date backoff hints.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Page size applied by [`GraphClient::paginate`].
	pub fn page_size(&self) -> u32 {
		self.page_size
	}

	/// Executes `request` for `connection` and classifies the response.
	pub async fn execute(
		&self,
		connection: &ConnectionId,
		request: &ApiRequest,
	) -> Result<ApiResponse> {
		const KIND: OpKind = OpKind::Request;

		let span = OpSpan::new(KIND, "execute");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let fresh = self.gate.ensure_fresh(connection).await?;
				let response = self.transport.send(request, fresh.usable_token()).await?;

				self.inspector.inspect(request, response, self.clock.now())
			})
			.await;

		obs::record_op_outcome(KIND, OpOutcome::of(&result));

		result
	}

	/// Lazily walks the collection behind `request` for `connection`.
	///
	/// `request` must not carry cursor parameters; `limit` is set from the configured page
	/// size.
	pub fn paginate(
		&self,
		connection: &ConnectionId,
		request: ApiRequest,
	) -> Paginator<BoundClient<'_, T>> {
		let fetcher = BoundClient { client: self, connection: connection.clone() };

		Paginator::new(fetcher, request, self.page_size)
	}
}
#[cfg(feature = "reqwest")]
impl GraphClient<ReqwestTransport> {
	/// Provisions a reqwest transport and the default exchange renewer for `store`.
	pub fn connect(config: &ClientConfig, store: Arc<dyn ConnectionStore>) -> Result<Self> {
		let transport = Arc::new(ReqwestTransport::new(config)?);
		let renewer = Arc::new(ExchangeRenewer::new(config, transport.clone()));
		let gate = Arc::new(FreshnessGate::new(config, store, renewer));

		Ok(Self::new(config, transport, gate))
	}
}
impl<T> Debug for GraphClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GraphClient")
			.field("inspector", &self.inspector)
			.field("page_size", &self.page_size)
			.finish()
	}
}

/// [`PageFetcher`] that routes page requests through a [`GraphClient`] for one connection.
pub struct BoundClient<'a, T>
where
	T: ?Sized + ApiTransport,
{
	client: &'a GraphClient<T>,
	connection: ConnectionId,
}
impl<T> BoundClient<'_, T>
where
	T: ?Sized + ApiTransport,
{
	/// Connection whose credential signs every page request.
	pub fn connection(&self) -> &ConnectionId {
		&self.connection
	}
}
impl<T> PageFetcher for BoundClient<'_, T>
where
	T: ?Sized + ApiTransport,
{
	fn fetch(&self, request: ApiRequest) -> PageFuture<'_> {
		Box::pin(async move { self.client.execute(&self.connection, &request).await })
	}
}
impl<T> Debug for BoundClient<'_, T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BoundClient").field("connection", &self.connection).finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	use time::macros;
	// self
	use super::*;
	use crate::{
		auth::{Connection, TokenSecret},
		clock::ManualClock,
		gate::{RenewFuture, TokenRenewer},
		http::{ResponseHeaders, TransportFuture},
		store::MemoryConnectionStore,
	};

	const NOW: OffsetDateTime = macros::datetime!(2025-06-01 12:00 UTC);

	struct NoRenewal;
	impl TokenRenewer for NoRenewal {
		fn renew<'a>(&'a self, _: &'a Connection) -> RenewFuture<'a> {
			Box::pin(async { Err(Error::malformed("renewal is not scripted")) })
		}
	}

	/// Returns scripted responses and records the bearer token of each call.
	#[derive(Default)]
	struct ScriptedTransport {
		responses: Mutex<VecDeque<ApiResponse>>,
		bearers: Mutex<Vec<Option<String>>>,
	}
	impl ApiTransport for ScriptedTransport {
		fn send<'a>(
			&'a self,
			_: &'a ApiRequest,
			bearer: Option<&'a TokenSecret>,
		) -> TransportFuture<'a> {
			self.bearers.lock().push(bearer.map(|token| token.expose().to_owned()));

			let next = self.responses.lock().pop_front();

			Box::pin(async move {
				Ok(next.expect("Transport was called more often than scripted."))
			})
		}
	}

	fn client(responses: Vec<ApiResponse>) -> (GraphClient<ScriptedTransport>, ConnectionId) {
		let config = ClientConfig::builder().build().expect("Default config should be valid.");
		let id = ConnectionId::new("conn-1").expect("Connection fixture should be valid.");
		let store = Arc::new(MemoryConnectionStore::default());

		store.insert(
			Connection::new(id.clone())
				.with_access_token("EAAB-current")
				.with_expires_at(NOW + Duration::days(30)),
		);

		let clock = Arc::new(ManualClock::new(NOW));
		let gate = Arc::new(
			FreshnessGate::new(&config, store, Arc::new(NoRenewal)).with_clock(clock.clone()),
		);
		let transport =
			ScriptedTransport { responses: Mutex::new(responses.into()), ..Default::default() };
		let client = GraphClient::new(&config, Arc::new(transport), gate).with_clock(clock);

		(client, id)
	}

	#[tokio::test]
	async fn execute_signs_requests_and_passes_successes() {
		let (client, id) =
			client(vec![ApiResponse::new(200, json!({ "id": "1" }), ResponseHeaders::default())]);
		let response = client
			.execute(&id, &ApiRequest::get("me"))
			.await
			.expect("A 2xx response should pass through.");

		assert_eq!(response.body, json!({ "id": "1" }));
		assert_eq!(*client.transport.bearers.lock(), vec![Some("EAAB-current".to_owned())]);
	}

	#[tokio::test]
	async fn execute_surfaces_rate_limit_codes_as_throttles() {
		let (client, id) = client(vec![ApiResponse::new(
			400,
			json!({ "error": { "code": 80004, "message": "There have been too many calls" } }),
			[("x-ad-account-usage", "{\"reset_time_duration\":45}")].into_iter().collect(),
		)]);
		let err = client
			.execute(&id, &ApiRequest::get("act_1/ads"))
			.await
			.expect_err("Code 80004 on HTTP 400 must be a throttle.");

		assert_eq!(err.retry_after(), Some(Duration::seconds(45)));
	}

	#[tokio::test]
	async fn paginate_walks_pages_through_the_client() {
		let (client, id) = client(vec![
			ApiResponse::new(
				200,
				json!({
					"data": [{ "id": "1" }],
					"paging": { "cursors": { "after": "c1" }, "next": "https://graph.example/n" }
				}),
				ResponseHeaders::default(),
			),
			ApiResponse::new(200, json!({ "data": [{ "id": "2" }] }), ResponseHeaders::default()),
		]);
		let items = client
			.paginate(&id, ApiRequest::get("act_1/campaigns"))
			.collect_all()
			.await
			.expect("Both pages should be collected.");

		assert_eq!(items, vec![json!({ "id": "1" }), json!({ "id": "2" })]);
		assert_eq!(client.transport.bearers.lock().len(), 2);
	}
}
