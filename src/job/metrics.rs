// self
use crate::obs::Counter;

/// Counters for job envelope runs.
#[derive(Debug, Default)]
pub struct JobMetrics {
	pub(crate) started: Counter,
	pub(crate) succeeded: Counter,
	pub(crate) requeued: Counter,
	pub(crate) failed: Counter,
}
impl JobMetrics {
	/// Attempts started.
	pub fn started(&self) -> u64 {
		self.started.get()
	}

	/// Attempts that completed.
	pub fn succeeded(&self) -> u64 {
		self.succeeded.get()
	}

	/// Attempts discarded by a throttle and re-enqueued.
	pub fn requeued(&self) -> u64 {
		self.requeued.get()
	}

	/// Attempts that failed.
	pub fn failed(&self) -> u64 {
		self.failed.get()
	}
}
