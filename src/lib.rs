//! Rate-limit-aware synchronization client for the Meta Marketing API: throttle classification,
//! backoff resolution, cursor paging, credential renewal, and requeueing job envelopes.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod http;
pub mod job;
pub mod obs;
pub mod paging;
pub mod ratelimit;
pub mod resource;
pub mod sink;
pub mod store;
pub mod sync;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{Connection, ConnectionId},
		client::GraphClient,
		config::ClientConfig,
		gate::{ExchangeRenewer, FreshnessGate},
		http::ReqwestTransport,
		store::{ConnectionStore, MemoryConnectionStore},
	};

	/// Graph client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = GraphClient<ReqwestTransport>;

	/// Builds a client config pointed at a mock server base URL.
	pub fn test_config(base_url: &str) -> ClientConfig {
		ClientConfig::builder()
			.base_url(Url::parse(base_url).expect("Mock server base URL should parse."))
			.app_credentials("app-test", "app-secret-test")
			.build()
			.expect("Test client config should be valid.")
	}

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_transport(config: &ClientConfig) -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.timeout(config.timeout.unsigned_abs())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(config, client)
			.expect("Reqwest transport should accept the test config.")
	}

	/// Constructs a [`GraphClient`] backed by an in-memory connection store and the reqwest
	/// transport used across integration tests.
	pub fn build_reqwest_test_client(
		config: &ClientConfig,
	) -> (ReqwestTestClient, Arc<MemoryConnectionStore>) {
		let store_backend = Arc::new(MemoryConnectionStore::default());
		let store: Arc<dyn ConnectionStore> = store_backend.clone();
		let transport = Arc::new(test_reqwest_transport(config));
		let renewer = Arc::new(ExchangeRenewer::new(config, transport.clone()));
		let gate = Arc::new(FreshnessGate::new(config, store, renewer));
		let client = GraphClient::new(config, transport, gate);

		(client, store_backend)
	}

	/// Connection fixture with a token that stays valid well past the renewal buffer.
	pub fn long_lived_connection(id: &str, token: &str) -> Connection {
		Connection::new(ConnectionId::new(id).expect("Connection fixture id should be valid."))
			.with_access_token(token)
			.with_expires_at(OffsetDateTime::now_utc() + Duration::days(60))
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet, HashMap, VecDeque},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
