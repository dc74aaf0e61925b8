//! Connection identifiers, credential records, and redacting secret wrappers.

pub mod connection;
pub mod id;
pub mod secret;

pub use connection::*;
pub use id::*;
pub use secret::*;
