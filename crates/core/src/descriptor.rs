//! In-memory description of the advertised session.

use uuid::Uuid;

use crate::advert::AdvertisementSnapshot;
use crate::config::SessionConfig;

/// The session record one lifecycle instance advertises.
///
/// Owned by the controller; collaborators only ever see clones. Fields are
/// read through accessors and only change through
/// [`SessionDescriptor::set_connection_id`] or [`SessionDescriptor::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescriptor {
	session_id: String,
	owner_id: String,
	host_name: String,
	world_name: String,
	game_version: String,
	protocol_version: u32,
	players_online: u32,
	players_max: u32,
	host_ip: String,
	host_port: u16,
	connection_type: u32,
	connection_id: String,
	keep_version_protocol_constant: bool,
	auto_friending_enabled: bool,
}

impl SessionDescriptor {
	/// Creates a descriptor with a fresh session id and no connection id.
	pub fn new(config: &SessionConfig, owner_id: &str) -> Self {
		Self {
			session_id: Uuid::new_v4().to_string(),
			owner_id: owner_id.to_string(),
			host_name: config.host_name.clone(),
			world_name: config.world_name.clone(),
			game_version: config.game_version.clone(),
			protocol_version: config.protocol_version,
			players_online: config.players_online,
			players_max: config.players_max,
			host_ip: config.host_ip.clone(),
			host_port: config.host_port,
			connection_type: config.connection_type,
			connection_id: String::new(),
			keep_version_protocol_constant: config.keep_version_protocol_constant,
			auto_friending_enabled: config.auto_friending_enabled,
		}
	}

	pub fn session_id(&self) -> &str {
		&self.session_id
	}

	pub fn owner_id(&self) -> &str {
		&self.owner_id
	}

	pub fn host_name(&self) -> &str {
		&self.host_name
	}

	pub fn world_name(&self) -> &str {
		&self.world_name
	}

	pub fn game_version(&self) -> &str {
		&self.game_version
	}

	pub fn protocol_version(&self) -> u32 {
		self.protocol_version
	}

	pub fn players_online(&self) -> u32 {
		self.players_online
	}

	pub fn players_max(&self) -> u32 {
		self.players_max
	}

	/// Address the game server listens on; never changed by probing.
	pub fn host_ip(&self) -> &str {
		&self.host_ip
	}

	pub fn host_port(&self) -> u16 {
		self.host_port
	}

	pub fn connection_type(&self) -> u32 {
		self.connection_type
	}

	/// Version and protocol stay at their configured values when set.
	pub fn keep_version_protocol_constant(&self) -> bool {
		self.keep_version_protocol_constant
	}

	pub fn auto_friending_enabled(&self) -> bool {
		self.auto_friending_enabled
	}

	/// Connection id delivered by the real-time channel; empty until then.
	pub fn connection_id(&self) -> &str {
		&self.connection_id
	}

	pub fn has_connection_id(&self) -> bool {
		!self.connection_id.is_empty()
	}

	/// Fills the connection id. Returns `false` without changing anything when
	/// it is already set or `id` is empty.
	pub fn set_connection_id(&mut self, id: &str) -> bool {
		if self.has_connection_id() || id.is_empty() {
			return false;
		}
		self.connection_id = id.to_string();
		true
	}

	/// Folds a resolved snapshot into the mutable advertisement fields.
	///
	/// Resolution already honors version pinning, so the snapshot is taken as is.
	pub fn apply(&mut self, snapshot: &AdvertisementSnapshot) {
		self.host_name.clone_from(&snapshot.host_name);
		self.world_name.clone_from(&snapshot.world_name);
		self.game_version.clone_from(&snapshot.game_version);
		self.protocol_version = snapshot.protocol_version;
		self.players_online = snapshot.players_online;
		self.players_max = snapshot.players_max;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config() -> SessionConfig {
		let mut config = SessionConfig::new("id", "203.0.113.7", 19132);
		config.players_online = 2;
		config.players_max = 10;
		config
	}

	#[test]
	fn every_descriptor_gets_its_own_session_id() {
		let a = SessionDescriptor::new(&config(), "owner");
		let b = SessionDescriptor::new(&config(), "owner");
		assert_ne!(a.session_id(), b.session_id());
		assert_eq!(a.owner_id(), "owner");
		assert!(!a.has_connection_id());
	}

	#[test]
	fn accessors_start_from_configuration() {
		let mut config = config();
		config.game_version = "1.19".into();
		config.protocol_version = 560;
		config.keep_version_protocol_constant = true;
		config.auto_friending_enabled = true;
		let descriptor = SessionDescriptor::new(&config, "owner");

		assert_eq!(descriptor.host_ip(), "203.0.113.7");
		assert_eq!(descriptor.host_port(), 19132);
		assert_eq!(descriptor.connection_type(), 6);
		assert_eq!(descriptor.game_version(), "1.19");
		assert_eq!(descriptor.protocol_version(), 560);
		assert_eq!(descriptor.players_online(), 2);
		assert!(descriptor.keep_version_protocol_constant());
		assert!(descriptor.auto_friending_enabled());
		assert_eq!(descriptor.connection_id(), "");
	}

	#[test]
	fn connection_id_is_filled_exactly_once() {
		let mut descriptor = SessionDescriptor::new(&config(), "owner");
		assert!(!descriptor.set_connection_id(""));
		assert!(descriptor.set_connection_id("abc123"));
		assert!(!descriptor.set_connection_id("other"));
		assert_eq!(descriptor.connection_id(), "abc123");
	}

	#[test]
	fn apply_updates_advertised_fields_only() {
		let mut descriptor = SessionDescriptor::new(&config(), "owner");
		let before = descriptor.clone();
		descriptor.apply(&AdvertisementSnapshot {
			host_name: "Live Host".into(),
			world_name: "Live World".into(),
			game_version: "1.21".into(),
			protocol_version: 700,
			players_online: 4,
			players_max: 30,
		});

		assert_eq!(descriptor.host_name(), "Live Host");
		assert_eq!(descriptor.world_name(), "Live World");
		assert_eq!(descriptor.players_online(), 4);
		assert_eq!(descriptor.players_max(), 30);
		assert_eq!(descriptor.session_id(), before.session_id());
		assert_eq!(descriptor.host_ip(), before.host_ip());
		assert_eq!(descriptor.host_port(), before.host_port());
	}
}
