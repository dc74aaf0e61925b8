//! Thread-safe in-memory [`ConnectionStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{Connection, ConnectionId},
	store::{ConnectionStore, StoreFuture},
};

type ConnectionMap = Arc<RwLock<HashMap<ConnectionId, Connection>>>;

/// Storage backend that keeps connection records in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryConnectionStore(ConnectionMap);
impl MemoryConnectionStore {
	/// Seeds the store with a record, replacing any previous one with the same id.
	pub fn insert(&self, connection: Connection) {
		self.0.write().insert(connection.id.clone(), connection);
	}

	/// Returns a snapshot of the record with the provided id.
	pub fn get(&self, id: &ConnectionId) -> Option<Connection> {
		self.0.read().get(id).cloned()
	}

	/// Number of stored records.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no records are stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl ConnectionStore for MemoryConnectionStore {
	fn fetch<'a>(&'a self, id: &'a ConnectionId) -> StoreFuture<'a, Option<Connection>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(id).cloned()) })
	}

	fn save(&self, connection: Connection) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(connection.id.clone(), connection);

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn save_replaces_and_fetch_returns_copies() {
		let store = MemoryConnectionStore::default();
		let id = ConnectionId::new("conn-1").expect("Connection fixture should be valid.");

		assert!(store.fetch(&id).await.expect("Fetch should succeed.").is_none());

		store
			.save(Connection::new(id.clone()).with_access_token("first"))
			.await
			.expect("Save should succeed.");
		store
			.save(Connection::new(id.clone()).with_access_token("second"))
			.await
			.expect("Save should succeed.");

		let fetched =
			store.fetch(&id).await.expect("Fetch should succeed.").expect("Record should exist.");

		assert_eq!(fetched.usable_token().map(|token| token.expose()), Some("second"));
		assert_eq!(store.len(), 1);
	}
}
