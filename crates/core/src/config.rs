//! Lifecycle configuration, validated once per lifecycle start.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::supervisor::RestartPolicy;

/// Everything a lifecycle instance needs to know about the advertised server.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
	/// Host name shown to friends when the probe has nothing better.
	pub host_name: String,
	/// World name shown to friends when the probe has nothing better.
	pub world_name: String,
	pub game_version: String,
	pub protocol_version: u32,
	pub players_online: u32,
	pub players_max: u32,
	/// Address friends connect to, also the probe target.
	pub host_ip: String,
	pub host_port: u16,
	/// Connection type advertised in the supported connections list.
	pub connection_type: u32,
	/// Publish the configured version/protocol no matter what the probe says.
	pub keep_version_protocol_constant: bool,
	/// Follow back followers and drop non-followers periodically.
	pub auto_friending_enabled: bool,
	/// Log every transition and response.
	pub verbose_logging: bool,
	/// Identity whose token the credential provider supplies.
	pub identity: String,
	pub timing: Timing,
	pub restart: RestartPolicy,
}

/// Periodic triggers and timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
	pub refresh_interval: Duration,
	pub friend_sync_interval: Duration,
	pub probe_timeout: Duration,
	pub http_timeout: Duration,
	/// A token expiring within this margin ends the instance at the next tick.
	pub token_refresh_margin: Duration,
}

impl Default for Timing {
	fn default() -> Self {
		Self {
			refresh_interval: Duration::from_secs(60),
			friend_sync_interval: Duration::from_secs(10),
			probe_timeout: Duration::from_secs(5),
			http_timeout: Duration::from_secs(30),
			token_refresh_margin: Duration::from_secs(300),
		}
	}
}

impl SessionConfig {
	/// Minimal configuration advertising `host_ip:host_port` for `identity`.
	pub fn new(identity: impl Into<String>, host_ip: impl Into<String>, host_port: u16) -> Self {
		Self {
			host_name: "Bedrock Server".to_string(),
			world_name: "Bedrock level".to_string(),
			game_version: String::new(),
			protocol_version: 0,
			players_online: 0,
			players_max: 10,
			host_ip: host_ip.into(),
			host_port,
			connection_type: 6,
			keep_version_protocol_constant: false,
			auto_friending_enabled: false,
			verbose_logging: false,
			identity: identity.into(),
			timing: Timing::default(),
			restart: RestartPolicy::default(),
		}
	}

	pub fn validate(&self) -> Result<()> {
		if self.identity.trim().is_empty() {
			return Err(Error::Config("identity must not be empty".to_string()));
		}
		if self.host_ip.trim().is_empty() {
			return Err(Error::Config("hostIp must not be empty".to_string()));
		}
		if self.host_port == 0 {
			return Err(Error::Config("hostPort must not be 0".to_string()));
		}
		if self.players_max == 0 {
			return Err(Error::Config("playersMax must be positive".to_string()));
		}
		if self.keep_version_protocol_constant && self.game_version.is_empty() {
			return Err(Error::Config("keepVersionProtocolConstant requires gameVersion".to_string()));
		}

		let timing = &self.timing;
		for (name, value) in [
			("refreshInterval", timing.refresh_interval),
			("friendSyncInterval", timing.friend_sync_interval),
			("probeTimeout", timing.probe_timeout),
			("httpTimeout", timing.http_timeout),
		] {
			if value.is_zero() {
				return Err(Error::Config(format!("{name} must be positive")));
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn minimal_config_is_valid() {
		SessionConfig::new("host@example.com", "203.0.113.7", 19132).validate().unwrap();
	}

	#[test]
	fn rejects_missing_address_and_zero_port() {
		let err = SessionConfig::new("id", "", 19132).validate().unwrap_err();
		assert!(err.to_string().contains("hostIp"));

		let err = SessionConfig::new("id", "10.0.0.1", 0).validate().unwrap_err();
		assert!(err.to_string().contains("hostPort"));
	}

	#[test]
	fn rejects_zero_intervals() {
		let mut config = SessionConfig::new("id", "10.0.0.1", 19132);
		config.timing.friend_sync_interval = Duration::ZERO;
		let err = config.validate().unwrap_err();
		assert!(err.to_string().contains("friendSyncInterval"));
	}

	#[test]
	fn pinning_needs_a_version() {
		let mut config = SessionConfig::new("id", "10.0.0.1", 19132);
		config.keep_version_protocol_constant = true;
		assert!(config.validate().is_err());
		config.game_version = "1.20.0".to_string();
		config.validate().unwrap();
	}
}
