//! Injectable wall clocks so renewal, backoff, and dedup windows stay testable.

// crates.io
use time::PrimitiveDateTime;
// self
use crate::_prelude::*;

/// Adds `delta` to `instant`, clamping to the representable range instead of panicking.
pub fn saturating_add(instant: OffsetDateTime, delta: Duration) -> OffsetDateTime {
	instant.checked_add(delta).unwrap_or(if delta.is_negative() {
		PrimitiveDateTime::MIN.assume_utc()
	} else {
		PrimitiveDateTime::MAX.assume_utc()
	})
}

/// Source of "now" for time-dependent decisions.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Current UTC instant.
	fn now(&self) -> OffsetDateTime;
}

/// Clock backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually advanced clock for tests and simulations.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<OffsetDateTime>>);
impl ManualClock {
	/// Creates a clock frozen at `instant`.
	pub fn new(instant: OffsetDateTime) -> Self {
		Self(Arc::new(Mutex::new(instant)))
	}

	/// Moves the clock to `instant`.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}

	/// Moves the clock forward by `delta`.
	pub fn advance(&self, delta: Duration) {
		let mut now = self.0.lock();

		*now = saturating_add(*now, delta);
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}
