//! Session record body sent with the session directory `PUT`.
//!
//! Shape of the body:
//! ```json
//! {
//!   "properties": {
//!     "system": { "joinRestriction": "followed", "readRestriction": "followed", "closed": false },
//!     "custom": { "BroadcastSetting": 3, "MemberCount": 5, "MaxMemberCount": 20, "...": "..." }
//!   },
//!   "members": {
//!     "me": {
//!       "constants": { "system": { "xuid": "...", "initialize": true } },
//!       "properties": { "system": { "active": true, "connection": "<connection id>", "subscription": { "...": "..." } } }
//!     }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Fixed subscription id the owner member registers for change notifications.
pub const MEMBER_SUBSCRIPTION_ID: &str = "845CC784-7348-4A27-BCDE-C083579DD113";

/// Joinability advertised for friend-only lobbies.
pub const JOINABLE_BY_FRIENDS: &str = "joinable_by_friends";

/// Broadcast setting value for "friends of friends can see".
pub const BROADCAST_SETTING: u8 = 3;

/// Complete session record body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
	pub properties: SessionProperties,
	pub members: SessionMembers,
}

impl SessionRequest {
	/// Builds a lobby record owned by `owner_xuid` reachable through `connection_id`.
	///
	/// System properties and the member block are fixed; only the custom group varies.
	pub fn lobby(custom: CustomProperties, owner_xuid: &str, connection_id: &str) -> Self {
		Self {
			properties: SessionProperties {
				system: SystemProperties::default(),
				custom,
			},
			members: SessionMembers {
				me: MemberEntry {
					constants: MemberConstants {
						system: MemberConstantsSystem {
							xuid: owner_xuid.to_string(),
							initialize: true,
						},
					},
					properties: MemberProperties {
						system: MemberPropertiesSystem {
							active: true,
							connection: connection_id.to_string(),
							subscription: MemberSubscription {
								id: MEMBER_SUBSCRIPTION_ID.to_string(),
								change_types: vec!["everything".to_string()],
							},
						},
					},
				},
			},
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionProperties {
	pub system: SystemProperties,
	pub custom: CustomProperties,
}

/// Access control block of the session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemProperties {
	pub join_restriction: String,
	pub read_restriction: String,
	pub closed: bool,
}

impl Default for SystemProperties {
	fn default() -> Self {
		Self {
			join_restriction: "followed".to_string(),
			read_restriction: "followed".to_string(),
			closed: false,
		}
	}
}

/// Game-specific block of the session record.
///
/// The platform mixes PascalCase and camelCase keys in this block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomProperties {
	pub broadcast_setting: u8,
	pub cross_play_disabled: bool,
	pub joinability: String,
	pub lan_game: bool,
	pub max_member_count: u32,
	pub member_count: u32,
	pub online_cross_platform_game: bool,
	pub supported_connections: Vec<SupportedConnection>,
	pub title_id: u32,
	pub transport_layer: u32,
	#[serde(rename = "levelId")]
	pub level_id: String,
	#[serde(rename = "hostName")]
	pub host_name: String,
	#[serde(rename = "ownerId")]
	pub owner_id: String,
	#[serde(rename = "rakNetGUID")]
	pub rak_net_guid: String,
	#[serde(rename = "worldName")]
	pub world_name: String,
	#[serde(rename = "worldType")]
	pub world_type: String,
	#[serde(rename = "protocol")]
	pub protocol: u32,
	#[serde(rename = "version")]
	pub version: String,
}

/// One way of reaching the hosted server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SupportedConnection {
	pub connection_type: u32,
	pub host_ip_address: String,
	pub host_port: u16,
	#[serde(rename = "RakNetGUID")]
	pub rak_net_guid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMembers {
	pub me: MemberEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberEntry {
	pub constants: MemberConstants,
	pub properties: MemberProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberConstants {
	pub system: MemberConstantsSystem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberConstantsSystem {
	pub xuid: String,
	pub initialize: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProperties {
	pub system: MemberPropertiesSystem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPropertiesSystem {
	pub active: bool,
	pub connection: String,
	pub subscription: MemberSubscription,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSubscription {
	pub id: String,
	pub change_types: Vec<String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn custom() -> CustomProperties {
		CustomProperties {
			broadcast_setting: BROADCAST_SETTING,
			cross_play_disabled: false,
			joinability: JOINABLE_BY_FRIENDS.to_string(),
			lan_game: true,
			max_member_count: 20,
			member_count: 5,
			online_cross_platform_game: true,
			supported_connections: vec![SupportedConnection {
				connection_type: 6,
				host_ip_address: "203.0.113.7".to_string(),
				host_port: 19132,
				rak_net_guid: String::new(),
			}],
			title_id: 0,
			transport_layer: 0,
			level_id: "level".to_string(),
			host_name: "Host".to_string(),
			owner_id: "2535".to_string(),
			rak_net_guid: String::new(),
			world_name: "World".to_string(),
			world_type: "Survival".to_string(),
			protocol: 622,
			version: "1.20".to_string(),
		}
	}

	#[test]
	fn serializes_platform_key_casing() {
		let value = serde_json::to_value(SessionRequest::lobby(custom(), "2535", "conn-1")).unwrap();

		let system = &value["properties"]["system"];
		assert_eq!(system["joinRestriction"], "followed");
		assert_eq!(system["readRestriction"], "followed");
		assert_eq!(system["closed"], false);

		let custom = &value["properties"]["custom"];
		assert_eq!(custom["BroadcastSetting"], 3);
		assert_eq!(custom["MemberCount"], 5);
		assert_eq!(custom["MaxMemberCount"], 20);
		assert_eq!(custom["Joinability"], "joinable_by_friends");
		assert_eq!(custom["TitleId"], 0);
		assert_eq!(custom["levelId"], "level");
		assert_eq!(custom["rakNetGUID"], "");
		assert_eq!(custom["version"], "1.20");
		assert_eq!(custom["SupportedConnections"][0]["HostIpAddress"], "203.0.113.7");
		assert_eq!(custom["SupportedConnections"][0]["RakNetGUID"], "");
	}

	#[test]
	fn member_block_carries_owner_and_connection() {
		let value = serde_json::to_value(SessionRequest::lobby(custom(), "2535", "conn-1")).unwrap();
		let me = &value["members"]["me"];
		assert_eq!(me["constants"]["system"]["xuid"], "2535");
		assert_eq!(me["constants"]["system"]["initialize"], true);
		assert_eq!(me["properties"]["system"]["active"], true);
		assert_eq!(me["properties"]["system"]["connection"], "conn-1");
		assert_eq!(me["properties"]["system"]["subscription"]["id"], MEMBER_SUBSCRIPTION_ID);
		assert_eq!(me["properties"]["system"]["subscription"]["changeTypes"][0], "everything");
	}
}
