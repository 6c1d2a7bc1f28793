//! Friends-session advertiser for a locally hosted Bedrock server.
//!
//! A [`Supervisor`] runs one [`SessionController`] at a time. The controller
//! authenticates, opens the real-time channel, waits for its connection id,
//! publishes the session record, registers the session handle once and then
//! keeps the record and the friends list fresh on timers. Any channel failure
//! ends the instance; the supervisor starts a new one with a new session id.
//!
//! ```ignore
//! let services = Services {
//! 	credentials: Arc::new(TokenFileProvider::new("auth")),
//! 	connector: Arc::new(RtaConnector::new(endpoints.rta_socket.clone())),
//! 	platform: Arc::new(XboxLiveClient::new(endpoints, timeout)?),
//! 	probe: Arc::new(RakNetProbe::new(timeout)),
//! };
//! Supervisor::new(config, services).run(shutdown).await?;
//! ```

pub mod advert;
pub mod config;
pub mod controller;
pub mod descriptor;
pub mod error;
pub mod friends;
pub mod state;
pub mod supervisor;

pub use advert::{AdvertisementSnapshot, build_session_request, resolve};
pub use config::{SessionConfig, Timing};
pub use controller::{RunSummary, Services, SessionController, Termination};
pub use descriptor::SessionDescriptor;
pub use error::{Error, Result};
pub use friends::{FriendAction, FriendSyncReport};
pub use state::{LifecycleEvent, LifecycleState};
pub use supervisor::{RestartPolicy, Supervisor};
