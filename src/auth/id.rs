//! Validated identifiers for connections and ad accounts.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $validate:path) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				$validate($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				$validate($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.debug_tuple(stringify!($name)).field(&self.0).finish()
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;
const ACCOUNT_NODE_PREFIX: &str = "act_";

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (connection, account).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (connection, account).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (connection, account).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
	/// Ad account identifiers are numeric.
	#[error("{kind} identifier must contain only digits.")]
	NotNumeric {
		/// Kind of identifier (connection, account).
		kind: &'static str,
	},
}

def_id! { ConnectionId, "Identifier of a stored platform connection (credential record).", "Connection", validate_opaque }
def_id! { AccountId, "Numeric ad account identifier, without the `act_` prefix.", "Account", validate_numeric }

impl AccountId {
	/// Parses either a bare numeric id or a Graph node id such as `act_123`.
	pub fn parse_node(value: &str) -> Result<Self, IdentifierError> {
		Self::new(value.strip_prefix(ACCOUNT_NODE_PREFIX).unwrap_or(value))
	}

	/// Graph node id used in edge paths (`act_<id>`).
	pub fn node(&self) -> String {
		format!("{ACCOUNT_NODE_PREFIX}{}", self.0)
	}
}

fn validate_opaque(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

fn validate_numeric(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	validate_opaque(kind, view)?;

	if !view.chars().all(|c| c.is_ascii_digit()) {
		return Err(IdentifierError::NotNumeric { kind });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn connection_ids_reject_whitespace_and_empty() {
		assert!(ConnectionId::new(" conn-1").is_err(), "Leading whitespace must be rejected.");
		assert!(ConnectionId::new("").is_err());

		let id = ConnectionId::new("conn-1").expect("Connection fixture should be valid.");

		assert_eq!(id.as_ref(), "conn-1");
		assert!(ConnectionId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)).is_err());
	}

	#[test]
	fn account_ids_are_numeric_and_render_node_ids() {
		assert_eq!(
			AccountId::new("act_42"),
			Err(IdentifierError::NotNumeric { kind: "Account" }),
			"Prefixed ids must go through parse_node."
		);

		let account = AccountId::parse_node("act_42").expect("Node id should parse.");

		assert_eq!(account.as_ref(), "42");
		assert_eq!(account.node(), "act_42");
		assert_eq!(AccountId::parse_node("42").expect("Bare id should parse."), account);
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let account: AccountId =
			serde_json::from_str("\"1234\"").expect("Account should deserialize successfully.");

		assert_eq!(account.as_ref(), "1234");
		assert!(serde_json::from_str::<AccountId>("\"12a4\"").is_err());
		assert!(serde_json::from_str::<ConnectionId>("\"with space\"").is_err());
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<ConnectionId, u8> = HashMap::from_iter([(
			ConnectionId::new("conn-123").expect("Connection used for lookup should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("conn-123"), Some(&7));
	}
}
