// self
use crate::{
	_prelude::*,
	auth::ConnectionId,
	http::ApiRequest,
	job::SyncJob,
	obs::OpKind,
	ratelimit::RateLimitSignal,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by client operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("meta_ads_sync.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a detected throttle. Only the request path reaches the log, never query values.
pub fn log_throttle(request: &ApiRequest, status: u16, signal: &RateLimitSignal) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		path = %request.path,
		status,
		retry_after_secs = signal.retry_after_secs,
		source = signal.source.as_str(),
		"Advertising API throttled the request."
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (request, status, signal);
}

/// Logs a backoff hint that was present but unusable.
pub fn log_unusable_hint(hint: &'static str, reason: &'static str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(hint, reason, "Ignoring unusable backoff hint.");
	#[cfg(not(feature = "tracing"))]
	let _ = (hint, reason);
}

/// Logs a completed credential renewal.
pub fn log_renewed(connection: &ConnectionId, expires_at: Option<OffsetDateTime>) {
	#[cfg(feature = "tracing")]
	tracing::info!(%connection, ?expires_at, "Renewed connection credential.");
	#[cfg(not(feature = "tracing"))]
	let _ = (connection, expires_at);
}

/// Logs a failed renewal that is bypassed because the current token is still valid.
pub fn log_renewal_bypassed(connection: &ConnectionId, error: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(%connection, %error, "Renewal failed; continuing with the current token.");
	#[cfg(not(feature = "tracing"))]
	let _ = (connection, error);
}

/// Logs a job deferred by a throttle.
pub fn log_requeued(job: &SyncJob, delay: Duration) {
	#[cfg(feature = "tracing")]
	tracing::info!(
		connection = %job.connection,
		resource = job.resource.label(),
		delay_secs = delay.whole_seconds(),
		"Requeued throttled job."
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (job, delay);
}

/// Logs a job failure handed to the surrounding framework.
pub fn log_job_failed(job: &SyncJob, error: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		connection = %job.connection,
		resource = job.resource.label(),
		%error,
		"Sync job failed."
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (job, error);
}

/// Logs a job skipped because it was synced within the dedup window.
pub fn log_dedup_skip(key: &str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(key, "Skipping job synced within the dedup window.");
	#[cfg(not(feature = "tracing"))]
	let _ = key;
}
