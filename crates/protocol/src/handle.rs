//! Handle registration body posted once per advertised session.

use serde::{Deserialize, Serialize};

use crate::endpoints::{SERVICE_CONFIG_ID, SESSION_TEMPLATE};

/// Pointer to a session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRef {
	pub scid: String,
	pub template_name: String,
	pub name: String,
}

/// Body of the handle `POST`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHandleRequest {
	pub version: u32,
	#[serde(rename = "type")]
	pub kind: String,
	pub session_ref: SessionRef,
}

impl CreateHandleRequest {
	/// Activity handle pointing at the lobby session `session_name`.
	pub fn activity(session_name: &str) -> Self {
		Self {
			version: 1,
			kind: "activity".to_string(),
			session_ref: SessionRef {
				scid: SERVICE_CONFIG_ID.to_string(),
				template_name: SESSION_TEMPLATE.to_string(),
				name: session_name.to_string(),
			},
		}
	}
}
