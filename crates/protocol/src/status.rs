//! LAN advertisement returned by a game server in its unconnected pong.
//!
//! The advertisement is a semicolon separated string:
//! ```text
//! MCPE;<motd>;<protocol>;<version>;<online>;<max>;<server id>;<level name>;<game mode>;<mode id>;<port v4>;<port v6>;
//! ```

use serde::{Deserialize, Serialize};

/// Edition tags accepted as the first advertisement field.
const EDITIONS: [&str; 2] = ["MCPE", "MCEE"];

/// Live status reported by the hosted server.
///
/// Numeric fields are `None` when the server sent something that does not
/// parse as a number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
	/// First motd line; the name shown for the host.
	pub name: String,
	/// Level name; the world shown under the host.
	pub motd: String,
	pub protocol_version: Option<u32>,
	pub game_version: String,
	pub players_online: Option<u32>,
	pub players_max: Option<u32>,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub server_id: String,
}

impl ServerStatus {
	/// Parses an advertisement string. Returns `None` when the edition tag or
	/// the mandatory fields are missing.
	pub fn parse_advertisement(raw: &str) -> Option<Self> {
		let mut fields = raw.split(';');
		let edition = fields.next()?;
		if !EDITIONS.contains(&edition) {
			return None;
		}

		let name = fields.next()?.to_string();
		let protocol_version = parse_number(fields.next()?);
		let game_version = fields.next()?.to_string();
		let players_online = parse_number(fields.next()?);
		let players_max = parse_number(fields.next()?);
		let server_id = fields.next().unwrap_or_default().to_string();
		let motd = fields.next().unwrap_or_default().to_string();

		Some(Self {
			name,
			motd,
			protocol_version,
			game_version,
			players_online,
			players_max,
			server_id,
		})
	}
}

fn parse_number(field: &str) -> Option<u32> {
	field.trim().parse().ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_dedicated_server_advertisement() {
		let status = ServerStatus::parse_advertisement(
			"MCPE;Dedicated Server;622;1.20.0;5;20;13253860892328930865;Bedrock level;Survival;1;19132;19133;",
		)
		.unwrap();
		assert_eq!(status.name, "Dedicated Server");
		assert_eq!(status.motd, "Bedrock level");
		assert_eq!(status.protocol_version, Some(622));
		assert_eq!(status.game_version, "1.20.0");
		assert_eq!(status.players_online, Some(5));
		assert_eq!(status.players_max, Some(20));
		assert_eq!(status.server_id, "13253860892328930865");
	}

	#[test]
	fn non_numeric_counts_are_unknown() {
		let status = ServerStatus::parse_advertisement("MCPE;Host;abc;1.20;x;;1;World").unwrap();
		assert_eq!(status.protocol_version, None);
		assert_eq!(status.players_online, None);
		assert_eq!(status.players_max, None);
	}

	#[test]
	fn truncated_advertisement_keeps_mandatory_fields() {
		let status = ServerStatus::parse_advertisement("MCPE;Host;622;1.20;1;10").unwrap();
		assert_eq!(status.motd, "");
		assert_eq!(status.players_max, Some(10));
	}

	#[test]
	fn rejects_unknown_edition_or_short_string() {
		assert!(ServerStatus::parse_advertisement("JAVA;Host;1;1;1;1").is_none());
		assert!(ServerStatus::parse_advertisement("MCPE;Host;622").is_none());
	}
}
