//! Wire types for the platform endpoints a hosted session is advertised on.
//!
//! This crate contains the serde-serializable types exchanged with the
//! session directory, the social graph, the people hub and the real-time
//! activity socket, plus the LAN advertisement string returned by a
//! server probe. These types represent the "protocol layer" - the shapes of
//! data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization and parsing
//! * 1:1 with the wire: Field names match the platform's JSON
//! * Stable: Changes only when the wire format changes
//!
//! Lifecycle logic is built on top of these types in `beacon-rs`.

pub mod auth;
pub mod endpoints;
pub mod handle;
pub mod people;
pub mod rta;
pub mod session;
pub mod status;

pub use auth::*;
pub use endpoints::*;
pub use handle::*;
pub use people::*;
pub use rta::*;
pub use session::*;
pub use status::*;
