//! Platform endpoint URLs and fixed protocol constants.

/// Service config id the lobby session template lives under.
pub const SERVICE_CONFIG_ID: &str = "4fc10100-5f7a-4470-899b-280835760c07";

/// Session template used for joinable lobbies.
pub const SESSION_TEMPLATE: &str = "MinecraftLobby";

/// Contract version for session directory calls.
pub const SESSION_CONTRACT_VERSION: &str = "107";

/// Contract version for people hub calls.
pub const PEOPLE_HUB_CONTRACT_VERSION: &str = "5";

/// Header carrying the contract version.
pub const CONTRACT_VERSION_HEADER: &str = "x-xbl-contract-version";

/// Resource name subscribed to on the real-time socket.
///
/// This is an identifier on the platform side, not a URL the client calls.
pub const CONNECTIONS_RESOURCE: &str = "https://sessiondirectory.xboxlive.com/connections/";

/// Base URLs for every endpoint the advertiser talks to.
///
/// Defaults point at the production platform; tests point them at local servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
	pub session_directory: String,
	pub social: String,
	pub people_hub: String,
	pub rta_socket: String,
}

impl Default for Endpoints {
	fn default() -> Self {
		Self {
			session_directory: "https://sessiondirectory.xboxlive.com".to_string(),
			social: "https://social.xboxlive.com".to_string(),
			people_hub: "https://peoplehub.xboxlive.com".to_string(),
			rta_socket: "wss://rta.xboxlive.com/connect".to_string(),
		}
	}
}

impl Endpoints {
	/// Builds endpoints that route every REST call to one base URL.
	pub fn local(http_base: &str, ws_url: &str) -> Self {
		let base = http_base.trim_end_matches('/').to_string();
		Self {
			session_directory: base.clone(),
			social: base.clone(),
			people_hub: base,
			rta_socket: ws_url.to_string(),
		}
	}

	/// `PUT` target for the session record named `session_id`.
	pub fn session_uri(&self, session_id: &str) -> String {
		format!(
			"{}/serviceconfigs/{SERVICE_CONFIG_ID}/sessionTemplates/{SESSION_TEMPLATE}/sessions/{session_id}",
			self.session_directory
		)
	}

	/// `POST` target for handle creation.
	pub fn handles_uri(&self) -> String {
		format!("{}/handles", self.session_directory)
	}

	/// `GET` target listing the caller's followers.
	pub fn followers_uri(&self) -> String {
		format!("{}/users/me/people/followers", self.people_hub)
	}

	/// `PUT`/`DELETE` target for a single relationship.
	pub fn person_uri(&self, xuid: &str) -> String {
		format!("{}/users/me/people/xuid({xuid})", self.social)
	}
}
