//! "Already synced" window kept in an explicit TTL store.
//!
//! The scheduler consults a [`DedupStore`] before admitting a job and marks the job's key
//! once the job completes, so the same collection is not mirrored twice inside the window.

// self
use crate::{
	_prelude::*,
	clock::{self, Clock, SystemClock},
	job::{JobQueue, SyncJob},
	obs,
	store::StoreError,
};

/// Boxed future returned by [`DedupStore`] operations.
pub type DedupFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// TTL key-value store backing the dedup window.
pub trait DedupStore
where
	Self: Send + Sync,
{
	/// Returns `true` while `key` is inside its TTL.
	fn is_fresh<'a>(&'a self, key: &'a str) -> DedupFuture<'a, bool>;

	/// Marks `key` as fresh for `ttl`, replacing any previous mark.
	fn mark<'a>(&'a self, key: &'a str, ttl: Duration) -> DedupFuture<'a, ()>;
}

/// In-process [`DedupStore`] driven by an injectable clock.
#[derive(Clone)]
pub struct MemoryDedup {
	clock: Arc<dyn Clock>,
	entries: Arc<Mutex<HashMap<String, OffsetDateTime>>>,
}
impl MemoryDedup {
	/// Creates an empty store backed by the system clock.
	pub fn new() -> Self {
		Self::with_clock(Arc::new(SystemClock))
	}

	/// Creates an empty store backed by `clock`.
	pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
		Self { clock, entries: Default::default() }
	}
}
impl Default for MemoryDedup {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for MemoryDedup {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MemoryDedup").field("entries", &self.entries.lock().len()).finish()
	}
}
impl DedupStore for MemoryDedup {
	fn is_fresh<'a>(&'a self, key: &'a str) -> DedupFuture<'a, bool> {
		let now = self.clock.now();
		let mut entries = self.entries.lock();

		entries.retain(|_, expires_at| *expires_at > now);

		let fresh = entries.contains_key(key);

		Box::pin(async move { Ok(fresh) })
	}

	fn mark<'a>(&'a self, key: &'a str, ttl: Duration) -> DedupFuture<'a, ()> {
		let expires_at = clock::saturating_add(self.clock.now(), ttl);

		self.entries.lock().insert(key.to_owned(), expires_at);

		Box::pin(async { Ok(()) })
	}
}

/// Admission layer that drops jobs synced within the dedup window.
pub struct SyncScheduler {
	queue: Arc<dyn JobQueue>,
	dedup: Arc<dyn DedupStore>,
	window: Duration,
}
impl SyncScheduler {
	/// Creates a scheduler that enqueues into `queue` and remembers completions for `window`.
	pub fn new(queue: Arc<dyn JobQueue>, dedup: Arc<dyn DedupStore>, window: Duration) -> Self {
		Self { queue, dedup, window }
	}

	/// Dedup window applied by [`SyncScheduler::complete`].
	pub fn window(&self) -> Duration {
		self.window
	}

	/// Enqueues `job` for immediate execution unless it was synced within the window.
	///
	/// Returns `false` when the job was skipped.
	pub async fn schedule(&self, job: SyncJob) -> Result<bool> {
		let key = job.dedup_key();

		if self.dedup.is_fresh(&key).await? {
			obs::log_dedup_skip(&key);

			return Ok(false);
		}

		self.queue.enqueue(job, Duration::ZERO).await?;

		Ok(true)
	}

	/// Records that `job` finished successfully.
	pub async fn complete(&self, job: &SyncJob) -> Result<()> {
		if !self.window.is_positive() {
			return Ok(());
		}

		let key = job.dedup_key();

		self.dedup.mark(&key, self.window).await?;

		Ok(())
	}
}
impl Debug for SyncScheduler {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SyncScheduler").field("window", &self.window).finish()
	}
}
