//! Error taxonomy of the session lifecycle.
//!
//! Only [`Error::Credential`], [`Error::Config`] and [`Error::RestartLimit`]
//! ever leave the supervisor. Channel failures restart the lifecycle; publish,
//! handle and friend-sync failures are logged where they happen and superseded
//! by the next tick.

use beacon_runtime::CredentialError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	#[error("credential acquisition failed: {0}")]
	Credential(#[from] CredentialError),

	#[error("invalid configuration: {0}")]
	Config(String),

	#[error("session publish failed: {0}")]
	Publish(#[source] beacon_runtime::Error),

	#[error("handle registration failed: {0}")]
	HandleRegistration(#[source] beacon_runtime::Error),

	#[error("friend sync failed: {0}")]
	FriendSync(#[source] beacon_runtime::Error),

	#[error("gave up after {restarts} consecutive restarts")]
	RestartLimit { restarts: u32 },
}
