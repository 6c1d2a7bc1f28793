//! Outbound plumbing for the session advertiser.
//!
//! Each external collaborator the lifecycle depends on sits behind a trait so
//! the controller can be driven by in-memory [`fake`] implementations in tests:
//!
//! * [`Platform`] - authenticated REST calls (session PUT, handle POST, people).
//! * [`ChannelConnector`] - the real-time activity socket.
//! * [`ServerProbe`] - live status of the hosted game server.
//! * [`CredentialProvider`] - identity tokens.

pub mod channel;
pub mod credentials;
pub mod error;
pub mod fake;
pub mod platform;
pub mod probe;

pub use channel::{ChannelConnector, ChannelEvent, ChannelHandle, InboundEvents, RtaConnector};
pub use credentials::{CredentialProvider, TokenFileProvider};
pub use error::{CredentialError, Error, ProbeError, Result};
pub use platform::{Platform, XboxLiveClient};
pub use probe::{RakNetProbe, ServerProbe};
