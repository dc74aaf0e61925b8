//! Units of sync work, their lifecycle, and the retry-aware envelope around them.
//!
//! A [`SyncJob`] is an immutable descriptor handed to external workers. [`JobEnvelope`] runs
//! one attempt: a throttle re-enqueues the identical job deferred by exactly the resolved
//! retry-after, and every other failure propagates unchanged.
//!
//! ```text
//! Pending -> Running -> Succeeded
//!                    -> ThrottledRequeued(delay) -> Pending
//!                    -> Failed
//! ```

pub mod dedup;
pub mod envelope;
pub mod queue;

mod metrics;

pub use dedup::*;
pub use envelope::*;
pub use metrics::JobMetrics;
pub use queue::*;

// self
use crate::{_prelude::*, auth::ConnectionId, resource::SyncResource};

/// Descriptor of one mirrored collection for one connection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncJob {
	/// Connection whose credential is used.
	pub connection: ConnectionId,
	/// Collection to mirror.
	pub resource: SyncResource,
}
impl SyncJob {
	/// Creates a job descriptor.
	pub fn new(connection: ConnectionId, resource: SyncResource) -> Self {
		Self { connection, resource }
	}

	/// Stable key identifying this job in dedup windows.
	pub fn dedup_key(&self) -> String {
		let mut key = format!("{}/{}", self.connection, self.resource.label());

		if let Some(account) = self.resource.account() {
			key.push('/');
			key.push_str(account);
		}
		if let SyncResource::Insights { date_preset, .. } = &self.resource {
			key.push('/');
			key.push_str(date_preset.as_str());
		}

		key
	}
}

/// Lifecycle state of a job attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
	/// Waiting in the queue.
	Pending,
	/// Attempt in progress.
	Running,
	/// Attempt completed; its effects are visible.
	Succeeded,
	/// Attempt discarded by a throttle; the identical job is pending again after the delay.
	ThrottledRequeued {
		/// Deferral applied to the requeued job, in seconds.
		delay_secs: u64,
	},
	/// Attempt failed with a non-throttle error.
	Failed,
}
impl JobState {
	/// Returns `true` when no further attempt follows this state.
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Succeeded | Self::Failed)
	}
}

/// Non-failing outcome of one envelope run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Attempt<T> {
	/// The work completed.
	Succeeded(T),
	/// The work was throttled and re-enqueued.
	Requeued {
		/// Deferral applied to the requeued job.
		delay: Duration,
	},
}
impl<T> Attempt<T> {
	/// Lifecycle state reached by this attempt.
	pub fn state(&self) -> JobState {
		match self {
			Self::Succeeded(_) => JobState::Succeeded,
			Self::Requeued { delay } => JobState::ThrottledRequeued {
				delay_secs: u64::try_from(delay.whole_seconds()).unwrap_or_default(),
			},
		}
	}

	/// Output of a completed attempt.
	pub fn into_output(self) -> Option<T> {
		match self {
			Self::Succeeded(output) => Some(output),
			Self::Requeued { .. } => None,
		}
	}
}
