//! People hub follower listing.

use serde::{Deserialize, Serialize};

/// Response of the followers listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeopleList {
	#[serde(default)]
	pub total_count: u32,
	#[serde(default)]
	pub people: Vec<Person>,
}

/// One relationship entry. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
	pub xuid: String,
	/// The entry follows the session owner.
	#[serde(default)]
	pub is_following_caller: bool,
	/// The session owner follows the entry.
	#[serde(default)]
	pub is_followed_by_caller: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub added_date_time_utc: Option<String>,
}
