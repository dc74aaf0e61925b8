//! Persistence boundary for synchronized batches.

// self
use crate::{_prelude::*, resource::SyncResource};

/// Boxed future returned by [`PersistenceSink::upsert`].
pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SinkError>> + 'a + Send>>;

/// Destination of synchronized items.
///
/// Batches of an interrupted walk may be delivered again when the job is retried, so
/// implementations must upsert idempotently.
pub trait PersistenceSink
where
	Self: Send + Sync,
{
	/// Upserts one batch of raw items belonging to `resource`.
	fn upsert<'a>(&'a self, resource: &'a SyncResource, batch: Vec<JsonValue>) -> SinkFuture<'a>;
}

/// Failure reported by a [`PersistenceSink`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("Persistence sink failed: {message}.")]
pub struct SinkError {
	/// Human-readable error payload.
	pub message: String,
}
impl SinkError {
	/// Creates a sink error from any displayable message.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}
}

/// In-memory sink keyed by resource and [`SyncResource::item_key`].
///
/// Items missing their key fields are keyed by their serialized content.
#[derive(Clone, Debug, Default)]
pub struct MemorySink(Arc<RwLock<HashMap<SyncResource, BTreeMap<String, JsonValue>>>>);
impl MemorySink {
	/// Snapshot of the items stored for `resource`, ordered by key.
	pub fn items(&self, resource: &SyncResource) -> Vec<JsonValue> {
		self.0
			.read()
			.get(resource)
			.map(|items| items.values().cloned().collect())
			.unwrap_or_default()
	}

	/// Number of distinct items stored for `resource`.
	pub fn len(&self, resource: &SyncResource) -> usize {
		self.0.read().get(resource).map_or(0, BTreeMap::len)
	}
}
impl PersistenceSink for MemorySink {
	fn upsert<'a>(&'a self, resource: &'a SyncResource, batch: Vec<JsonValue>) -> SinkFuture<'a> {
		Box::pin(async move {
			let mut map = self.0.write();
			let items = map.entry(resource.clone()).or_default();

			for item in batch {
				let key = resource.item_key(&item).unwrap_or_else(|| item.to_string());

				items.insert(key, item);
			}

			Ok(())
		})
	}
}
