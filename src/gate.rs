//! Token freshness gate: renews connection credentials before they enter the renewal buffer.
//!
//! [`FreshnessGate::ensure_fresh`] runs in front of every outbound call. Each connection has
//! its own single-flight guard, so concurrent callers wait for one renewal and then observe the
//! persisted result instead of renewing again. The renewal call itself is pluggable through
//! [`TokenRenewer`]; [`ExchangeRenewer`] implements the Graph long-lived token exchange.

pub mod exchange;

mod metrics;

pub use exchange::ExchangeRenewer;
pub use metrics::RenewalMetrics;

// self
use crate::{
	_prelude::*,
	auth::{Connection, ConnectionId, Renewal},
	clock::{self, Clock, SystemClock},
	config::ClientConfig,
	obs::{self, OpKind, OpOutcome, OpSpan},
	store::ConnectionStore,
};

/// Default lead time before expiry inside which credentials are renewed.
pub const DEFAULT_RENEWAL_BUFFER: Duration = Duration::days(7);

/// Boxed future returned by [`TokenRenewer::renew`].
pub type RenewFuture<'a> = Pin<Box<dyn Future<Output = Result<Renewal>> + 'a + Send>>;

type GuardMap = Arc<Mutex<HashMap<ConnectionId, Arc<AsyncMutex<()>>>>>;

/// Strategy that trades a connection's current credential for a fresh one.
pub trait TokenRenewer
where
	Self: Send + Sync,
{
	/// Requests replacement credential material for `connection`.
	fn renew<'a>(&'a self, connection: &'a Connection) -> RenewFuture<'a>;
}

/// Returns `true` when `connection` holds an access token whose expiry falls at or before
/// `now + buffer`.
///
/// Connections without an access token or without an expiry never need renewal.
pub fn needs_renewal(connection: &Connection, now: OffsetDateTime, buffer: Duration) -> bool {
	if connection.usable_token().is_none() {
		return false;
	}

	let horizon = clock::saturating_add(now, buffer);

	connection.expires_at.is_some_and(|expires_at| expires_at <= horizon)
}

/// Serializes credential renewal per connection and persists renewed records.
pub struct FreshnessGate {
	store: Arc<dyn ConnectionStore>,
	renewer: Arc<dyn TokenRenewer>,
	clock: Arc<dyn Clock>,
	buffer: Duration,
	guards: GuardMap,
	/// Renewal counters.
	pub metrics: Arc<RenewalMetrics>,
}
impl FreshnessGate {
	/// Creates a gate that loads connections from `store` and renews them with `renewer`.
	pub fn new(
		config: &ClientConfig,
		store: Arc<dyn ConnectionStore>,
		renewer: Arc<dyn TokenRenewer>,
	) -> Self {
		Self {
			store,
			renewer,
			clock: Arc::new(SystemClock),
			buffer: config.renewal_buffer,
			guards: Default::default(),
			metrics: Default::default(),
		}
	}

	/// Replaces the clock used for renewal decisions.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Renewal buffer applied by [`FreshnessGate::needs_renewal`].
	pub fn buffer(&self) -> Duration {
		self.buffer
	}

	/// Pure renewal decision using the configured buffer.
	pub fn needs_renewal(&self, connection: &Connection, now: OffsetDateTime) -> bool {
		needs_renewal(connection, now, self.buffer)
	}

	/// Renews `connection` regardless of its expiry and persists the result.
	///
	/// The stored record is reloaded under the connection's guard. When its access token no
	/// longer matches the caller's copy, another caller has already renewed it and the stored
	/// record is returned as is. Connections missing from the store are renewed from `connection`.
	pub async fn renew(&self, connection: &Connection) -> Result<Connection> {
		let span = OpSpan::new(OpKind::Renewal, "renew");

		span.instrument(async move {
			let guard = self.guard(&connection.id);
			let _singleflight = guard.lock().await;
			let current = self.store.fetch(&connection.id).await?;

			match current {
				Some(stored) if stored.access_token != connection.access_token => Ok(stored),
				Some(stored) => self.renew_locked(&stored).await,
				None => self.renew_locked(connection).await,
			}
		})
		.await
	}

	/// Returns a connection whose access token is safe to use for the next call.
	///
	/// Fails with [`Error::CredentialExpired`] when the connection is unknown or holds no
	/// access token. When renewal fails while the current token is still valid, the current
	/// record is returned and the failure is logged; throttles always propagate.
	pub async fn ensure_fresh(&self, id: &ConnectionId) -> Result<Connection> {
		let span = OpSpan::new(OpKind::Renewal, "ensure_fresh");

		span.instrument(async move {
			let guard = self.guard(id);
			let _singleflight = guard.lock().await;
			let current = self
				.store
				.fetch(id)
				.await?
				.filter(|connection| connection.usable_token().is_some())
				.ok_or_else(|| Error::CredentialExpired { connection: id.clone() })?;
			let now = self.clock.now();

			if !self.needs_renewal(&current, now) {
				return Ok(current);
			}

			match self.renew_locked(&current).await {
				Ok(renewed) => Ok(renewed),
				Err(err) if err.is_throttled() => Err(err),
				Err(err) if !current.is_expired_at(now) => {
					obs::log_renewal_bypassed(id, &err);

					Ok(current)
				},
				Err(Error::Api { .. } | Error::MalformedResponse { .. }) =>
					Err(Error::CredentialExpired { connection: id.clone() }),
				Err(err) => Err(err),
			}
		})
		.await
	}

	fn guard(&self, id: &ConnectionId) -> Arc<AsyncMutex<()>> {
		let mut guards = self.guards.lock();

		guards.entry(id.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}

	async fn renew_locked(&self, current: &Connection) -> Result<Connection> {
		const KIND: OpKind = OpKind::Renewal;

		obs::record_op_outcome(KIND, OpOutcome::Attempt);
		self.metrics.attempts.increment();

		let result = async {
			let renewal = self.renewer.renew(current).await?;
			let mut renewed = current.clone();

			renewed.apply_renewal(renewal, self.clock.now());
			self.store.save(renewed.clone()).await?;
			obs::log_renewed(&renewed.id, renewed.expires_at);

			Ok::<_, Error>(renewed)
		}
		.await;

		match &result {
			Ok(_) => self.metrics.successes.increment(),
			Err(_) => self.metrics.failures.increment(),
		}

		obs::record_op_outcome(KIND, OpOutcome::of(&result));

		result
	}
}
