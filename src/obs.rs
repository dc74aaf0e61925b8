//! Optional observability helpers for client operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit structured spans named `meta_ads_sync.op` with the
//!   `op` and `stage` fields, plus events for throttles, renewals, and requeues.
//! - Enable `metrics` to increment the `meta_ads_sync_op_total` counter for every
//!   attempt/success/throttle/failure, labeled by `op` + `outcome`.

mod counter;
mod metrics;
mod tracing;

pub use counter::Counter;
pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operation kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Single Graph API call.
	Request,
	/// Cursor walk over a collection edge.
	Pagination,
	/// Credential renewal.
	Renewal,
	/// Unit of sync work run through the job envelope.
	Job,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Request => "request",
			OpKind::Pagination => "pagination",
			OpKind::Renewal => "renewal",
			OpKind::Job => "job",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// The platform throttled the operation.
	Throttled,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Throttled => "throttled",
			OpOutcome::Failure => "failure",
		}
	}

	/// Maps an operation result to its outcome label.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => OpOutcome::Success,
			Err(err) if err.is_throttled() => OpOutcome::Throttled,
			Err(_) => OpOutcome::Failure,
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
