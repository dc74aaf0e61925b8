//! Credential record shared by every unit of work targeting the same platform account.

// self
use crate::{
	_prelude::*,
	auth::{ConnectionId, TokenSecret},
};

/// Stored platform credential.
///
/// `expires_at`, once set, is authoritative for renewal decisions. Records are created by the
/// external authorization handshake and mutated only through [`Connection::apply_renewal`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
	/// Stable connection identifier.
	pub id: ConnectionId,
	/// Opaque access token; callers must avoid logging it.
	pub access_token: Option<TokenSecret>,
	/// Refresh token, if the platform issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Expiry instant of the access token.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub expires_at: Option<OffsetDateTime>,
	/// Instant of the last successful renewal.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub renewed_at: Option<OffsetDateTime>,
}
impl Connection {
	/// Creates an empty connection with no credential material.
	pub fn new(id: ConnectionId) -> Self {
		Self { id, access_token: None, refresh_token: None, expires_at: None, renewed_at: None }
	}

	/// Sets the access token.
	pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the refresh token.
	pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the access token expiry.
	pub fn with_expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets the last renewal instant.
	pub fn with_renewed_at(mut self, instant: OffsetDateTime) -> Self {
		self.renewed_at = Some(instant);

		self
	}

	/// Returns the access token when one is present and non-blank.
	pub fn usable_token(&self) -> Option<&TokenSecret> {
		self.access_token.as_ref().filter(|token| !token.is_blank())
	}

	/// Returns `true` when the access token has already expired at `now`.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|at| at <= now)
	}

	/// Secret presented to the renewal endpoint: the refresh token when present, else the
	/// access token.
	pub fn renewal_secret(&self) -> Option<&TokenSecret> {
		self.refresh_token.as_ref().filter(|token| !token.is_blank()).or(self.usable_token())
	}

	/// Writes a renewal result into the record.
	///
	/// A renewal that omits a refresh token keeps the previous one.
	pub fn apply_renewal(&mut self, renewal: Renewal, now: OffsetDateTime) {
		self.access_token = Some(renewal.access_token);

		if let Some(refresh) = renewal.refresh_token {
			self.refresh_token = Some(refresh);
		}

		self.expires_at = renewal.expires_at;
		self.renewed_at = Some(now);
	}
}
impl Debug for Connection {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Connection")
			.field("id", &self.id)
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.field("renewed_at", &self.renewed_at)
			.finish()
	}
}

/// Fresh credential material produced by a token renewer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Renewal {
	/// Replacement access token.
	pub access_token: TokenSecret,
	/// Replacement refresh token, when rotated.
	pub refresh_token: Option<TokenSecret>,
	/// Expiry of the replacement access token; `None` means it does not expire.
	pub expires_at: Option<OffsetDateTime>,
}
