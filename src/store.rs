//! Credential store contract and the built-in in-memory backend.

pub mod memory;

pub use memory::MemoryConnectionStore;

// self
use crate::{
	_prelude::*,
	auth::{Connection, ConnectionId},
};

/// Boxed future returned by [`ConnectionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for connection credentials.
///
/// Records are created by the external authorization handshake; the client only reads them and
/// writes back renewed credentials. Records are never deleted here.
pub trait ConnectionStore
where
	Self: Send + Sync,
{
	/// Fetches the connection with the provided id, if present.
	fn fetch<'a>(&'a self, id: &'a ConnectionId) -> StoreFuture<'a, Option<Connection>>;

	/// Persists or replaces a connection record.
	fn save(&self, connection: Connection) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`ConnectionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
