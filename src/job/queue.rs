//! Job queue contract and the in-memory delayed queue.

// self
use crate::{
	_prelude::*,
	clock::{self, Clock, SystemClock},
	job::SyncJob,
};

/// Boxed future returned by [`JobQueue::enqueue`].
pub type QueueFuture<'a> = Pin<Box<dyn Future<Output = Result<(), QueueError>> + 'a + Send>>;

/// Destination for jobs that must run again later.
pub trait JobQueue
where
	Self: Send + Sync,
{
	/// Enqueues `job` so it becomes runnable no earlier than `delay` from now.
	fn enqueue(&self, job: SyncJob, delay: Duration) -> QueueFuture<'_>;
}

/// Failure reported by a [`JobQueue`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("Job queue failed: {message}.")]
pub struct QueueError {
	/// Human-readable error payload.
	pub message: String,
}
impl QueueError {
	/// Creates a queue error from any displayable message.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}
}

/// Job waiting in a [`MemoryQueue`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueuedJob {
	/// Enqueued descriptor.
	pub job: SyncJob,
	/// Earliest instant at which the job is released.
	pub not_before: OffsetDateTime,
}

/// In-process delayed queue; jobs are never released before their not-before instant.
#[derive(Clone)]
pub struct MemoryQueue {
	clock: Arc<dyn Clock>,
	entries: Arc<Mutex<Vec<QueuedJob>>>,
}
impl MemoryQueue {
	/// Creates an empty queue backed by the system clock.
	pub fn new() -> Self {
		Self::with_clock(Arc::new(SystemClock))
	}

	/// Creates an empty queue backed by `clock`.
	pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
		Self { clock, entries: Default::default() }
	}

	/// Releases the ready job with the earliest not-before instant, if any.
	///
	/// Jobs with the same instant are released in enqueue order.
	pub fn pop_ready(&self) -> Option<SyncJob> {
		let now = self.clock.now();
		let mut entries = self.entries.lock();
		let index = entries
			.iter()
			.enumerate()
			.filter(|(_, entry)| entry.not_before <= now)
			.min_by_key(|(index, entry)| (entry.not_before, *index))
			.map(|(index, _)| index)?;

		Some(entries.remove(index).job)
	}

	/// Earliest not-before instant among waiting jobs.
	pub fn next_ready_at(&self) -> Option<OffsetDateTime> {
		self.entries.lock().iter().map(|entry| entry.not_before).min()
	}

	/// Snapshot of waiting jobs in enqueue order.
	pub fn pending(&self) -> Vec<QueuedJob> {
		self.entries.lock().clone()
	}

	/// Number of waiting jobs.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	/// Returns `true` when no jobs are waiting.
	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}
impl Default for MemoryQueue {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for MemoryQueue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MemoryQueue").field("entries", &*self.entries.lock()).finish()
	}
}
impl JobQueue for MemoryQueue {
	fn enqueue(&self, job: SyncJob, delay: Duration) -> QueueFuture<'_> {
		let not_before = clock::saturating_add(self.clock.now(), delay.max(Duration::ZERO));

		self.entries.lock().push(QueuedJob { job, not_before });

		Box::pin(async { Ok(()) })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::{auth::ConnectionId, clock::ManualClock, resource::SyncResource};

	fn job(connection: &str) -> SyncJob {
		SyncJob::new(
			ConnectionId::new(connection).expect("Connection fixture should be valid."),
			SyncResource::AdAccounts,
		)
	}

	#[tokio::test]
	async fn delayed_jobs_wait_for_their_instant() {
		let clock = Arc::new(ManualClock::new(macros::datetime!(2025-06-01 12:00 UTC)));
		let queue = MemoryQueue::with_clock(clock.clone());

		queue.enqueue(job("late"), Duration::seconds(90)).await.expect("Enqueue should succeed.");
		queue.enqueue(job("now"), Duration::ZERO).await.expect("Enqueue should succeed.");

		assert_eq!(queue.pop_ready(), Some(job("now")));
		assert_eq!(queue.pop_ready(), None);

		clock.advance(Duration::seconds(89));

		assert_eq!(queue.pop_ready(), None, "A job must not be released before its delay.");

		clock.advance(Duration::seconds(1));

		assert_eq!(queue.pop_ready(), Some(job("late")));
		assert!(queue.is_empty());
	}

	#[tokio::test]
	async fn ready_jobs_release_in_instant_then_enqueue_order() {
		let clock = Arc::new(ManualClock::new(macros::datetime!(2025-06-01 12:00 UTC)));
		let queue = MemoryQueue::with_clock(clock.clone());

		queue.enqueue(job("b"), Duration::seconds(10)).await.expect("Enqueue should succeed.");
		queue.enqueue(job("a"), Duration::seconds(5)).await.expect("Enqueue should succeed.");
		queue.enqueue(job("c"), Duration::seconds(5)).await.expect("Enqueue should succeed.");
		clock.advance(Duration::minutes(1));

		let order = std::iter::from_fn(|| queue.pop_ready())
			.map(|job| job.connection.to_string())
			.collect::<Vec<_>>();

		assert_eq!(order, ["a", "c", "b"]);
	}
}
