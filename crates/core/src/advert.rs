//! Advertisement resolution and session payload construction.
//!
//! Each publish probes the hosted server and merges the answer with the
//! descriptor's last known values. A failed probe or an unknown field never
//! leaves the advertisement empty; the descriptor fills the gap.

use beacon_protocol::{BROADCAST_SETTING, CustomProperties, JOINABLE_BY_FRIENDS, ServerStatus, SessionRequest, SupportedConnection};
use beacon_runtime::ServerProbe;
use tracing::debug;

use crate::descriptor::SessionDescriptor;

/// Values published in one cycle. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisementSnapshot {
	pub host_name: String,
	pub world_name: String,
	pub game_version: String,
	pub protocol_version: u32,
	pub players_online: u32,
	pub players_max: u32,
}

impl AdvertisementSnapshot {
	/// Snapshot made only of the descriptor's current values.
	pub fn from_descriptor(descriptor: &SessionDescriptor) -> Self {
		Self {
			host_name: descriptor.host_name().to_string(),
			world_name: descriptor.world_name().to_string(),
			game_version: descriptor.game_version().to_string(),
			protocol_version: descriptor.protocol_version(),
			players_online: descriptor.players_online(),
			players_max: descriptor.players_max(),
		}
	}
}

/// Probes the server behind `descriptor` and merges the result.
pub async fn resolve(probe: &dyn ServerProbe, descriptor: &SessionDescriptor) -> AdvertisementSnapshot {
	match probe.probe(descriptor.host_ip(), descriptor.host_port()).await {
		Ok(status) => merge(Some(&status), descriptor),
		Err(err) => {
			debug!(
				target = "beacon.probe",
				host = %descriptor.host_ip(),
				port = descriptor.host_port(),
				error = %err,
				"probe failed; advertising last known values"
			);
			merge(None, descriptor)
		}
	}
}

/// Merges probe output over the descriptor.
///
/// Empty strings and zero or unparsable numbers count as unknown. With
/// version pinning on, version and protocol always come from the descriptor.
pub fn merge(status: Option<&ServerStatus>, descriptor: &SessionDescriptor) -> AdvertisementSnapshot {
	let fallback = AdvertisementSnapshot::from_descriptor(descriptor);
	let Some(status) = status else {
		return fallback;
	};

	let pinned = descriptor.keep_version_protocol_constant();
	AdvertisementSnapshot {
		host_name: non_empty(&status.name).unwrap_or(fallback.host_name),
		world_name: non_empty(&status.motd).unwrap_or(fallback.world_name),
		game_version: if pinned {
			fallback.game_version
		} else {
			non_empty(&status.game_version).unwrap_or(fallback.game_version)
		},
		protocol_version: if pinned {
			fallback.protocol_version
		} else {
			known(status.protocol_version).unwrap_or(fallback.protocol_version)
		},
		players_online: known(status.players_online).unwrap_or(fallback.players_online),
		players_max: known(status.players_max).unwrap_or(fallback.players_max),
	}
}

fn non_empty(value: &str) -> Option<String> {
	let value = value.trim();
	(!value.is_empty()).then(|| value.to_string())
}

fn known(value: Option<u32>) -> Option<u32> {
	value.filter(|v| *v != 0)
}

/// Builds the session record body for one publish.
///
/// Identity and reachability come from the descriptor, everything that
/// changes with server state from the snapshot.
pub fn build_session_request(descriptor: &SessionDescriptor, snapshot: &AdvertisementSnapshot) -> SessionRequest {
	let custom = CustomProperties {
		broadcast_setting: BROADCAST_SETTING,
		cross_play_disabled: false,
		joinability: JOINABLE_BY_FRIENDS.to_string(),
		lan_game: true,
		max_member_count: snapshot.players_max,
		member_count: snapshot.players_online,
		online_cross_platform_game: true,
		supported_connections: vec![SupportedConnection {
			connection_type: descriptor.connection_type(),
			host_ip_address: descriptor.host_ip().to_string(),
			host_port: descriptor.host_port(),
			rak_net_guid: String::new(),
		}],
		title_id: 0,
		transport_layer: 0,
		level_id: "level".to_string(),
		host_name: snapshot.host_name.clone(),
		owner_id: descriptor.owner_id().to_string(),
		rak_net_guid: String::new(),
		world_name: snapshot.world_name.clone(),
		world_type: "Survival".to_string(),
		protocol: snapshot.protocol_version,
		version: snapshot.game_version.clone(),
	};
	SessionRequest::lobby(custom, descriptor.owner_id(), descriptor.connection_id())
}

#[cfg(test)]
mod tests {
	use beacon_runtime::fake::FakeProbe;

	use super::*;
	use crate::config::SessionConfig;

	fn descriptor(pinned: bool) -> SessionDescriptor {
		let mut config = SessionConfig::new("id", "203.0.113.7", 19132);
		config.host_name = "Config Host".into();
		config.world_name = "Config World".into();
		config.game_version = "1.19".into();
		config.protocol_version = 560;
		config.players_online = 2;
		config.players_max = 10;
		config.keep_version_protocol_constant = pinned;
		SessionDescriptor::new(&config, "2535")
	}

	fn status() -> ServerStatus {
		ServerStatus {
			name: "Live Host".into(),
			motd: "Live World".into(),
			protocol_version: Some(622),
			game_version: "1.20".into(),
			players_online: Some(5),
			players_max: Some(20),
			server_id: String::new(),
		}
	}

	#[test]
	fn probe_values_win_when_present() {
		let snapshot = merge(Some(&status()), &descriptor(false));
		assert_eq!(snapshot.host_name, "Live Host");
		assert_eq!(snapshot.world_name, "Live World");
		assert_eq!(snapshot.players_online, 5);
		assert_eq!(snapshot.players_max, 20);
		assert_eq!(snapshot.game_version, "1.20");
		assert_eq!(snapshot.protocol_version, 622);
	}

	#[test]
	fn pinning_keeps_descriptor_version_and_protocol() {
		let snapshot = merge(Some(&status()), &descriptor(true));
		assert_eq!(snapshot.game_version, "1.19");
		assert_eq!(snapshot.protocol_version, 560);
		assert_eq!(snapshot.players_online, 5);
	}

	#[test]
	fn zero_and_unknown_fields_fall_back() {
		let mut status = status();
		status.players_online = Some(0);
		status.players_max = None;
		status.protocol_version = Some(0);
		status.game_version = String::new();
		status.name = "  ".into();

		let snapshot = merge(Some(&status), &descriptor(false));
		assert_eq!(snapshot.players_online, 2);
		assert_eq!(snapshot.players_max, 10);
		assert_eq!(snapshot.protocol_version, 560);
		assert_eq!(snapshot.game_version, "1.19");
		assert_eq!(snapshot.host_name, "Config Host");
		assert_eq!(snapshot.world_name, "Live World");
	}

	#[tokio::test]
	async fn failed_probe_degrades_to_descriptor() {
		let d = descriptor(false);
		let snapshot = resolve(&FakeProbe::unreachable(), &d).await;
		assert_eq!(snapshot, AdvertisementSnapshot::from_descriptor(&d));
		assert_eq!(snapshot.players_online, 2);
		assert_eq!(snapshot.players_max, 10);
	}

	#[tokio::test]
	async fn resolve_uses_probe_answer() {
		let snapshot = resolve(&FakeProbe::answering(status()), &descriptor(false)).await;
		assert_eq!(snapshot.players_online, 5);
	}

	#[test]
	fn payload_carries_counts_version_and_connection() {
		let mut d = descriptor(false);
		d.set_connection_id("abc123");
		let snapshot = merge(Some(&status()), &d);
		let value = serde_json::to_value(build_session_request(&d, &snapshot)).unwrap();

		let custom = &value["properties"]["custom"];
		assert_eq!(custom["MemberCount"], 5);
		assert_eq!(custom["MaxMemberCount"], 20);
		assert_eq!(custom["version"], "1.20");
		assert_eq!(custom["protocol"], 622);
		assert_eq!(custom["ownerId"], "2535");
		assert_eq!(custom["hostName"], "Live Host");
		assert_eq!(custom["worldName"], "Live World");
		assert_eq!(custom["SupportedConnections"][0]["ConnectionType"], 6);
		assert_eq!(custom["SupportedConnections"][0]["HostPort"], 19132);
		assert_eq!(value["members"]["me"]["properties"]["system"]["connection"], "abc123");
	}
}
