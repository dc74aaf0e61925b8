// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic in-process counter backing the typed metrics structs.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);
impl Counter {
	/// Current value.
	pub fn get(&self) -> u64 {
		self.0.load(Ordering::Relaxed)
	}

	pub(crate) fn increment(&self) {
		self.0.fetch_add(1, Ordering::Relaxed);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn counters_start_at_zero_and_increment() {
		let counter = Counter::default();

		assert_eq!(counter.get(), 0);

		counter.increment();
		counter.increment();

		assert_eq!(counter.get(), 2);
	}
}
