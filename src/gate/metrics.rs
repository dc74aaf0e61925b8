// self
use crate::obs::Counter;

/// Counters for credential renewals.
#[derive(Debug, Default)]
pub struct RenewalMetrics {
	pub(crate) attempts: Counter,
	pub(crate) successes: Counter,
	pub(crate) failures: Counter,
}
impl RenewalMetrics {
	/// Renewal calls issued.
	pub fn attempts(&self) -> u64 {
		self.attempts.get()
	}

	/// Renewals that produced and persisted a new token.
	pub fn successes(&self) -> u64 {
		self.successes.get()
	}

	/// Renewal calls that failed.
	pub fn failures(&self) -> u64 {
		self.failures.get()
	}
}
