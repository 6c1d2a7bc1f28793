//! JSON configuration file and command line overrides.
//!
//! Looked up in order: `--config`, `./beacon.json`, then
//! `<config dir>/beacon/beacon.json`. Every key is optional in the file;
//! `identity` and `hostIp` must come from somewhere before a run starts.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use beacon::{RestartPolicy, SessionConfig, Timing};
use beacon_protocol::Endpoints;
use serde::{Deserialize, Serialize};

use crate::cli::Overrides;
use crate::error::{CliError, Result};

pub const CONFIG_FILE_NAME: &str = "beacon.json";
const DEFAULT_AUTH_DIR: &str = "auth";

/// On-disk configuration. Keys are camelCase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigFile {
	#[serde(alias = "identityEmail", skip_serializing_if = "Option::is_none")]
	pub identity: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub auth_dir: Option<PathBuf>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub host_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub world_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub game_version: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub protocol_version: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub players_online: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub players_max: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub host_ip: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub host_port: Option<u16>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub connection_type: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub keep_version_protocol_constant: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub auto_friending_enabled: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub verbose_logging: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub refresh_interval_secs: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub friend_sync_interval_secs: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub probe_timeout_secs: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub http_timeout_secs: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub token_refresh_margin_secs: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_consecutive_restarts: Option<u32>,
	/// Replaces platform endpoints, mainly for staging or local test servers.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub endpoints: Option<EndpointOverrides>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndpointOverrides {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub session_directory: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub social: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub people_hub: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rta_socket: Option<String>,
}

/// A config file together with where it came from.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
	/// `None` when no file was found and defaults apply.
	pub path: Option<PathBuf>,
	pub file: ConfigFile,
}

impl LoadedConfig {
	/// Loads `explicit` or the first config file found in the default locations.
	///
	/// An explicit path must exist; missing default files are not an error.
	pub fn discover(explicit: Option<&Path>) -> Result<Self> {
		if let Some(path) = explicit {
			return Ok(Self {
				path: Some(path.to_path_buf()),
				file: ConfigFile::load(path)?,
			});
		}

		let candidates = [Some(PathBuf::from(CONFIG_FILE_NAME)), dirs::config_dir().map(|dir| dir.join("beacon").join(CONFIG_FILE_NAME))];
		for path in candidates.into_iter().flatten() {
			if path.is_file() {
				let file = ConfigFile::load(&path)?;
				return Ok(Self { path: Some(path), file });
			}
		}
		Ok(Self::default())
	}
}

impl ConfigFile {
	pub fn load(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path)
			.with_context(|| format!("reading config file {}", path.display()))
			.map_err(CliError::Config)?;
		serde_json::from_str(&content)
			.with_context(|| format!("parsing config file {}", path.display()))
			.map_err(CliError::Config)
	}

	/// Applies command line overrides in place.
	pub fn apply(&mut self, overrides: &Overrides) {
		if let Some(identity) = &overrides.identity {
			self.identity = Some(identity.clone());
		}
		if let Some(host_ip) = &overrides.host_ip {
			self.host_ip = Some(host_ip.clone());
		}
		if let Some(host_port) = overrides.host_port {
			self.host_port = Some(host_port);
		}
		if let Some(auth_dir) = &overrides.auth_dir {
			self.auth_dir = Some(auth_dir.clone());
		}
		if overrides.auto_friending {
			self.auto_friending_enabled = Some(true);
		}
	}

	/// Builds the lifecycle configuration. Validation happens when the
	/// supervisor starts.
	pub fn session_config(&self) -> Result<SessionConfig> {
		let identity = self.identity.clone().ok_or(CliError::MissingSetting("identity"))?;
		let host_ip = self.host_ip.clone().ok_or(CliError::MissingSetting("hostIp"))?;
		let mut config = SessionConfig::new(identity, host_ip, self.host_port.unwrap_or(19132));

		if let Some(value) = &self.host_name {
			config.host_name.clone_from(value);
		}
		if let Some(value) = &self.world_name {
			config.world_name.clone_from(value);
		}
		if let Some(value) = &self.game_version {
			config.game_version.clone_from(value);
		}
		config.protocol_version = self.protocol_version.unwrap_or(config.protocol_version);
		config.players_online = self.players_online.unwrap_or(config.players_online);
		config.players_max = self.players_max.unwrap_or(config.players_max);
		config.connection_type = self.connection_type.unwrap_or(config.connection_type);
		config.keep_version_protocol_constant = self.keep_version_protocol_constant.unwrap_or(false);
		config.auto_friending_enabled = self.auto_friending_enabled.unwrap_or(false);
		config.verbose_logging = self.verbose_logging.unwrap_or(false);

		let defaults = Timing::default();
		config.timing = Timing {
			refresh_interval: secs_or(self.refresh_interval_secs, defaults.refresh_interval),
			friend_sync_interval: secs_or(self.friend_sync_interval_secs, defaults.friend_sync_interval),
			probe_timeout: secs_or(self.probe_timeout_secs, defaults.probe_timeout),
			http_timeout: secs_or(self.http_timeout_secs, defaults.http_timeout),
			token_refresh_margin: secs_or(self.token_refresh_margin_secs, defaults.token_refresh_margin),
		};
		config.restart = RestartPolicy {
			max_consecutive_restarts: self.max_consecutive_restarts,
			..RestartPolicy::default()
		};
		Ok(config)
	}

	pub fn auth_dir(&self) -> PathBuf {
		self.auth_dir.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_AUTH_DIR))
	}

	pub fn endpoints(&self) -> Endpoints {
		let mut endpoints = Endpoints::default();
		if let Some(overrides) = &self.endpoints {
			let fields = [
				(&mut endpoints.session_directory, &overrides.session_directory),
				(&mut endpoints.social, &overrides.social),
				(&mut endpoints.people_hub, &overrides.people_hub),
				(&mut endpoints.rta_socket, &overrides.rta_socket),
			];
			for (target, value) in fields {
				if let Some(value) = value {
					target.clone_from(value);
				}
			}
		}
		endpoints
	}

	/// Fully populated view of what a run would use.
	pub fn effective(config: &SessionConfig, auth_dir: PathBuf, endpoints: &Endpoints) -> Self {
		Self {
			identity: Some(config.identity.clone()),
			auth_dir: Some(auth_dir),
			host_name: Some(config.host_name.clone()),
			world_name: Some(config.world_name.clone()),
			game_version: Some(config.game_version.clone()),
			protocol_version: Some(config.protocol_version),
			players_online: Some(config.players_online),
			players_max: Some(config.players_max),
			host_ip: Some(config.host_ip.clone()),
			host_port: Some(config.host_port),
			connection_type: Some(config.connection_type),
			keep_version_protocol_constant: Some(config.keep_version_protocol_constant),
			auto_friending_enabled: Some(config.auto_friending_enabled),
			verbose_logging: Some(config.verbose_logging),
			refresh_interval_secs: Some(config.timing.refresh_interval.as_secs()),
			friend_sync_interval_secs: Some(config.timing.friend_sync_interval.as_secs()),
			probe_timeout_secs: Some(config.timing.probe_timeout.as_secs()),
			http_timeout_secs: Some(config.timing.http_timeout.as_secs()),
			token_refresh_margin_secs: Some(config.timing.token_refresh_margin.as_secs()),
			max_consecutive_restarts: config.restart.max_consecutive_restarts,
			endpoints: Some(EndpointOverrides {
				session_directory: Some(endpoints.session_directory.clone()),
				social: Some(endpoints.social.clone()),
				people_hub: Some(endpoints.people_hub.clone()),
				rta_socket: Some(endpoints.rta_socket.clone()),
			}),
		}
	}
}

fn secs_or(value: Option<u64>, default: Duration) -> Duration {
	value.map(Duration::from_secs).unwrap_or(default)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn write(dir: &Path, content: &str) -> PathBuf {
		let path = dir.join(CONFIG_FILE_NAME);
		fs::write(&path, content).unwrap();
		path
	}

	#[test]
	fn loads_camel_case_keys() {
		let tmp = tempfile::TempDir::new().unwrap();
		let path = write(
			tmp.path(),
			r#"{
				"identityEmail": "host@example.com",
				"hostIp": "203.0.113.7",
				"hostPort": 19133,
				"playersMax": 30,
				"keepVersionProtocolConstant": true,
				"gameVersion": "1.20.40",
				"refreshIntervalSecs": 30,
				"endpoints": { "rtaSocket": "ws://127.0.0.1:9000/connect" }
			}"#,
		);

		let file = ConfigFile::load(&path).unwrap();
		let config = file.session_config().unwrap();
		assert_eq!(config.identity, "host@example.com");
		assert_eq!(config.host_port, 19133);
		assert_eq!(config.players_max, 30);
		assert!(config.keep_version_protocol_constant);
		assert_eq!(config.timing.refresh_interval, Duration::from_secs(30));
		assert_eq!(config.timing.friend_sync_interval, Duration::from_secs(10));
		config.validate().unwrap();

		let endpoints = file.endpoints();
		assert_eq!(endpoints.rta_socket, "ws://127.0.0.1:9000/connect");
		assert_eq!(endpoints.session_directory, Endpoints::default().session_directory);
	}

	#[test]
	fn overrides_win_over_file() {
		let mut file: ConfigFile = serde_json::from_str(r#"{"identity":"a","hostIp":"10.0.0.1","hostPort":1}"#).unwrap();
		file.apply(&Overrides {
			host_port: Some(19132),
			auth_dir: Some(PathBuf::from("/tokens")),
			auto_friending: true,
			..Default::default()
		});
		let config = file.session_config().unwrap();
		assert_eq!(config.identity, "a");
		assert_eq!(config.host_port, 19132);
		assert!(config.auto_friending_enabled);
		assert_eq!(file.auth_dir(), PathBuf::from("/tokens"));
	}

	#[test]
	fn missing_identity_is_reported_by_name() {
		let file = ConfigFile {
			host_ip: Some("10.0.0.1".into()),
			..Default::default()
		};
		let err = file.session_config().unwrap_err();
		assert!(matches!(err, CliError::MissingSetting("identity")));
	}

	#[test]
	fn malformed_file_names_the_path() {
		let tmp = tempfile::TempDir::new().unwrap();
		let path = write(tmp.path(), "{ not json");
		let err = ConfigFile::load(&path).unwrap_err();
		assert!(err.to_string().contains(&path.display().to_string()));
	}

	#[test]
	fn explicit_path_must_exist() {
		let tmp = tempfile::TempDir::new().unwrap();
		let missing = tmp.path().join("nope.json");
		assert!(LoadedConfig::discover(Some(missing.as_path())).is_err());
	}

	#[test]
	fn effective_view_round_trips_into_same_config() {
		let file: ConfigFile = serde_json::from_str(r#"{"identity":"a","hostIp":"10.0.0.1","maxConsecutiveRestarts":5}"#).unwrap();
		let config = file.session_config().unwrap();
		let effective = ConfigFile::effective(&config, file.auth_dir(), &file.endpoints());
		assert_eq!(effective.session_config().unwrap(), config);
		assert_eq!(effective.auth_dir(), PathBuf::from("auth"));
	}
}
