//! Retry-aware envelope around one attempt of a sync job.

// self
use crate::{
	_prelude::*,
	job::{Attempt, JobMetrics, JobQueue, SyncJob},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Runs job attempts and turns throttles into deferred re-enqueues.
///
/// Retries are unbounded here; any attempt budget belongs to the surrounding framework.
pub struct JobEnvelope {
	queue: Arc<dyn JobQueue>,
	/// Attempt counters.
	pub metrics: Arc<JobMetrics>,
}
impl JobEnvelope {
	/// Creates an envelope that re-enqueues throttled jobs into `queue`.
	pub fn new(queue: Arc<dyn JobQueue>) -> Self {
		Self { queue, metrics: Default::default() }
	}

	/// Runs one attempt of `job` with `work`.
	///
	/// - `Ok(Attempt::Succeeded)` when `work` completes.
	/// - `Ok(Attempt::Requeued)` when `work` fails with [`Error::Throttled`]: the identical job
	///   is enqueued again, deferred by exactly the throttle's retry-after, and the attempt is
	///   discarded.
	/// - `Err` with the unchanged error for every other failure.
	pub async fn run<T, F, Fut>(&self, job: SyncJob, work: F) -> Result<Attempt<T>>
	where
		F: FnOnce(SyncJob) -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		const KIND: OpKind = OpKind::Job;

		let span = OpSpan::new(KIND, job.resource.label());

		obs::record_op_outcome(KIND, OpOutcome::Attempt);
		self.metrics.started.increment();

		let result = span
			.instrument(async {
				match work(job.clone()).await {
					Ok(output) => Ok(Attempt::Succeeded(output)),
					Err(Error::Throttled(throttle)) => {
						let delay = throttle.retry_after();

						self.queue.enqueue(job.clone(), delay).await?;
						obs::log_requeued(&job, delay);

						Ok(Attempt::Requeued { delay })
					},
					Err(err) => {
						obs::log_job_failed(&job, &err);

						Err(err)
					},
				}
			})
			.await;
		let outcome = match &result {
			Ok(Attempt::Succeeded(_)) => {
				self.metrics.succeeded.increment();

				OpOutcome::Success
			},
			Ok(Attempt::Requeued { .. }) => {
				self.metrics.requeued.increment();

				OpOutcome::Throttled
			},
			Err(_) => {
				self.metrics.failed.increment();

				OpOutcome::Failure
			},
		};

		obs::record_op_outcome(KIND, outcome);

		result
	}
}
impl Debug for JobEnvelope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("JobEnvelope").field("metrics", &self.metrics).finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::{PrimitiveDateTime, macros};
	// self
	use super::*;
	use crate::{
		auth::ConnectionId,
		clock::ManualClock,
		http::{ApiRequest, ApiResponse, ResponseHeaders},
		job::{JobState, MemoryQueue},
		ratelimit::{RateLimitSignal, ResponseInspector, SignalSource, ThrottleError},
		resource::SyncResource,
	};

	const NOW: OffsetDateTime = macros::datetime!(2025-06-01 12:00 UTC);

	fn job() -> SyncJob {
		SyncJob::new(
			ConnectionId::new("conn-1").expect("Connection fixture should be valid."),
			SyncResource::AdAccounts,
		)
	}

	fn throttle(retry_after_secs: u64) -> Error {
		ThrottleError {
			request: ApiRequest::get("me/adaccounts"),
			response: ApiResponse::new(429, JsonValue::Null, ResponseHeaders::default()),
			signal: RateLimitSignal { detected: true, retry_after_secs, source: SignalSource::Header },
		}
		.into()
	}

	fn envelope() -> (JobEnvelope, Arc<MemoryQueue>) {
		let queue = Arc::new(MemoryQueue::with_clock(Arc::new(ManualClock::new(NOW))));

		(JobEnvelope::new(queue.clone()), queue)
	}

	#[tokio::test]
	async fn throttled_work_is_requeued_with_the_exact_delay() {
		let (envelope, queue) = envelope();
		let attempt = envelope
			.run(job(), |_| async { Err::<(), _>(throttle(90)) })
			.await
			.expect("A throttle must not fail the job.");

		assert_eq!(attempt, Attempt::Requeued { delay: Duration::seconds(90) });
		assert_eq!(attempt.state(), JobState::ThrottledRequeued { delay_secs: 90 });

		let pending = queue.pending();

		assert_eq!(pending.len(), 1);
		assert_eq!(pending[0].job, job());
		assert_eq!(pending[0].not_before, NOW + Duration::seconds(90));
		assert_eq!(envelope.metrics.requeued(), 1);
		assert_eq!(envelope.metrics.failed(), 0);
	}

	#[tokio::test]
	async fn far_future_retry_after_is_requeued_at_the_latest_instant() {
		let (envelope, queue) = envelope();
		let response = ApiResponse::new(
			429,
			JsonValue::Null,
			[("Retry-After", "99999999999999")].into_iter().collect::<ResponseHeaders>(),
		);
		let request = ApiRequest::get("me/adaccounts");
		let throttle = ResponseInspector::default()
			.inspect(&request, response, NOW)
			.expect_err("429 must surface as a throttle.");
		let attempt = envelope
			.run(job(), |_| async move { Err::<(), _>(throttle) })
			.await
			.expect("A far-future retry-after must not fail the job.");

		assert_eq!(attempt, Attempt::Requeued { delay: Duration::seconds(99_999_999_999_999) });

		let pending = queue.pending();

		assert_eq!(pending.len(), 1);
		assert_eq!(pending[0].not_before, PrimitiveDateTime::MAX.assume_utc());
		assert_eq!(queue.pop_ready(), None);
	}

	#[tokio::test]
	async fn other_errors_propagate_without_requeue() {
		let (envelope, queue) = envelope();
		let err = envelope
			.run(job(), |job| async move {
				Err::<(), _>(Error::CredentialExpired { connection: job.connection })
			})
			.await
			.expect_err("Credential failures must propagate.");

		assert!(matches!(err, Error::CredentialExpired { .. }));
		assert!(queue.is_empty());
		assert_eq!(envelope.metrics.failed(), 1);
	}

	#[tokio::test]
	async fn successes_return_the_output_once() {
		let (envelope, queue) = envelope();
		let attempt = envelope
			.run(job(), |job| async move { Ok(job.resource.label()) })
			.await
			.expect("Successful work should complete.");

		assert_eq!(attempt.into_output(), Some("ad_accounts"));
		assert!(queue.is_empty());
		assert_eq!(envelope.metrics.succeeded(), 1);
	}
}
