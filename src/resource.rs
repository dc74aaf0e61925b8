//! Typed descriptors of the collections mirrored from the Marketing API.

// self
use crate::{_prelude::*, auth::AccountId, http::ApiRequest};

const AD_ACCOUNT_FIELDS: &str = "id,account_id,name,account_status,currency,timezone_name";
const CAMPAIGN_FIELDS: &str =
	"id,name,status,effective_status,objective,daily_budget,lifetime_budget,updated_time";
const AD_SET_FIELDS: &str = "id,name,campaign_id,status,effective_status,daily_budget,\
	billing_event,optimization_goal,updated_time";
const AD_FIELDS: &str = "id,name,adset_id,campaign_id,status,effective_status,updated_time";
const INSIGHT_FIELDS: &str = "ad_id,adset_id,campaign_id,date_start,date_stop,impressions,\
	clicks,spend,reach,ctr,cpc";

/// Reporting window for insights.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatePreset {
	/// Current day.
	#[serde(rename = "today")]
	Today,
	/// Previous day.
	#[serde(rename = "yesterday")]
	Yesterday,
	/// Last 7 days.
	#[default]
	#[serde(rename = "last_7d")]
	Last7d,
	/// Last 14 days.
	#[serde(rename = "last_14d")]
	Last14d,
	/// Last 30 days.
	#[serde(rename = "last_30d")]
	Last30d,
	/// Last 90 days.
	#[serde(rename = "last_90d")]
	Last90d,
	/// Full account lifetime.
	#[serde(rename = "maximum")]
	Maximum,
}
impl DatePreset {
	/// Returns the wire value for the `date_preset` parameter.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Today => "today",
			Self::Yesterday => "yesterday",
			Self::Last7d => "last_7d",
			Self::Last14d => "last_14d",
			Self::Last30d => "last_30d",
			Self::Last90d => "last_90d",
			Self::Maximum => "maximum",
		}
	}
}
impl Display for DatePreset {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Collection synchronized by one job.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncResource {
	/// Ad accounts visible to the connected user.
	AdAccounts,
	/// Campaigns of one ad account.
	Campaigns {
		/// Owning ad account.
		account: AccountId,
	},
	/// Ad sets of one ad account.
	AdSets {
		/// Owning ad account.
		account: AccountId,
	},
	/// Ads of one ad account.
	Ads {
		/// Owning ad account.
		account: AccountId,
	},
	/// Ad-level performance metrics of one ad account.
	Insights {
		/// Owning ad account.
		account: AccountId,
		/// Reporting window.
		#[serde(default)]
		date_preset: DatePreset,
	},
}
impl SyncResource {
	/// Graph edge, relative to the versioned API root.
	pub fn edge(&self) -> String {
		match self {
			Self::AdAccounts => "me/adaccounts".into(),
			Self::Campaigns { account } => format!("{}/campaigns", account.node()),
			Self::AdSets { account } => format!("{}/adsets", account.node()),
			Self::Ads { account } => format!("{}/ads", account.node()),
			Self::Insights { account, .. } => format!("{}/insights", account.node()),
		}
	}

	/// Comma-separated field list requested for every item.
	pub fn fields(&self) -> &'static str {
		match self {
			Self::AdAccounts => AD_ACCOUNT_FIELDS,
			Self::Campaigns { .. } => CAMPAIGN_FIELDS,
			Self::AdSets { .. } => AD_SET_FIELDS,
			Self::Ads { .. } => AD_FIELDS,
			Self::Insights { .. } => INSIGHT_FIELDS,
		}
	}

	/// Base collection request (without cursor parameters).
	pub fn request(&self) -> ApiRequest {
		let request = ApiRequest::get(self.edge()).with_query("fields", self.fields());

		match self {
			Self::Insights { date_preset, .. } =>
				request.with_query("level", "ad").with_query("date_preset", date_preset.as_str()),
			_ => request,
		}
	}

	/// Stable label suitable for log fields.
	pub const fn label(&self) -> &'static str {
		match self {
			Self::AdAccounts => "ad_accounts",
			Self::Campaigns { .. } => "campaigns",
			Self::AdSets { .. } => "ad_sets",
			Self::Ads { .. } => "ads",
			Self::Insights { .. } => "insights",
		}
	}

	/// Owning ad account, when the collection is account-scoped.
	pub fn account(&self) -> Option<&AccountId> {
		match self {
			Self::AdAccounts => None,
			Self::Campaigns { account }
			| Self::AdSets { account }
			| Self::Ads { account }
			| Self::Insights { account, .. } => Some(account),
		}
	}

	/// Item fields that together identify one row of the collection.
	///
	/// Insights rows carry no `id`; they are identified by ad and reporting day.
	pub const fn key_fields(&self) -> &'static [&'static str] {
		match self {
			Self::Insights { .. } => &["ad_id", "date_start", "date_stop"],
			_ => &["id"],
		}
	}

	/// Upsert key of `item`, or `None` when any key field is missing or not a string.
	pub fn item_key(&self, item: &JsonValue) -> Option<String> {
		let parts = self
			.key_fields()
			.iter()
			.map(|field| item.get(field).and_then(JsonValue::as_str))
			.collect::<Option<Vec<_>>>()?;

		Some(parts.join("/"))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn account() -> AccountId {
		AccountId::new("1234").expect("Account fixture should be valid.")
	}

	#[test]
	fn edges_use_account_nodes() {
		assert_eq!(SyncResource::AdAccounts.edge(), "me/adaccounts");
		assert_eq!(SyncResource::Campaigns { account: account() }.edge(), "act_1234/campaigns");
		assert_eq!(SyncResource::AdSets { account: account() }.edge(), "act_1234/adsets");
		assert_eq!(SyncResource::Ads { account: account() }.edge(), "act_1234/ads");
	}

	#[test]
	fn insights_request_carries_level_and_preset() {
		let resource =
			SyncResource::Insights { account: account(), date_preset: DatePreset::Last30d };
		let request = resource.request();

		assert_eq!(request.path, "act_1234/insights");
		assert_eq!(request.query_value("level"), Some("ad"));
		assert_eq!(request.query_value("date_preset"), Some("last_30d"));
		assert!(request.query_value("fields").is_some_and(|fields| fields.contains("spend")));
	}

	#[test]
	fn resources_serialize_with_a_kind_tag() {
		let payload = serde_json::to_value(SyncResource::AdSets { account: account() })
			.expect("Resource should serialize.");

		assert_eq!(payload, serde_json::json!({ "kind": "ad_sets", "account": "1234" }));

		let decoded: SyncResource =
			serde_json::from_str(r#"{ "kind": "insights", "account": "1234" }"#)
				.expect("Insights without a preset should default to the last 7 days.");

		assert_eq!(decoded, SyncResource::Insights {
			account: account(),
			date_preset: DatePreset::Last7d
		});
	}

	#[test]
	fn item_keys_follow_the_collection_identity() {
		let insights = SyncResource::Insights { account: account(), date_preset: DatePreset::Today };
		let row = serde_json::json!({
			"ad_id": "9",
			"date_start": "2025-06-01",
			"date_stop": "2025-06-01",
			"spend": "1.50"
		});

		assert_eq!(insights.item_key(&row).as_deref(), Some("9/2025-06-01/2025-06-01"));
		assert_eq!(insights.item_key(&serde_json::json!({ "id": "9" })), None);
		assert_eq!(
			SyncResource::Ads { account: account() }
				.item_key(&serde_json::json!({ "id": "9" }))
				.as_deref(),
			Some("9")
		);
	}
}
