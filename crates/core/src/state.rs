//! Named lifecycle states and the events the supervisor broadcasts about them.

use std::fmt;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Where one lifecycle instance currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
	Unauthenticated,
	Authenticated,
	ChannelConnecting,
	/// Connected, waiting for the connection id.
	ChannelOpen,
	/// First session publish succeeded.
	Published,
	HandleRegistered,
	/// Periodic refresh and friend sync running.
	SteadyState,
	Terminated,
}

impl LifecycleState {
	/// Returns `true` when `next` directly follows `self`.
	///
	/// Any live state may terminate; everything else only moves forward one step.
	pub fn can_advance_to(self, next: LifecycleState) -> bool {
		use LifecycleState::*;

		match (self, next) {
			(Terminated, _) => false,
			(_, Terminated) => true,
			(Unauthenticated, Authenticated)
			| (Authenticated, ChannelConnecting)
			| (ChannelConnecting, ChannelOpen)
			| (ChannelOpen, Published)
			| (Published, HandleRegistered)
			| (HandleRegistered, SteadyState) => true,
			_ => false,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Unauthenticated => "unauthenticated",
			Self::Authenticated => "authenticated",
			Self::ChannelConnecting => "channel_connecting",
			Self::ChannelOpen => "channel_open",
			Self::Published => "published",
			Self::HandleRegistered => "handle_registered",
			Self::SteadyState => "steady_state",
			Self::Terminated => "terminated",
		}
	}
}

impl fmt::Display for LifecycleState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Notification published on the supervisor's broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
	/// A new instance created its descriptor.
	InstanceStarted { generation: u64, session_id: String },
	StateChanged { generation: u64, state: LifecycleState },
	/// The instance ended and the next one starts after `delay`.
	Restarting { generation: u64, reason: String, delay: Duration },
}

/// State of one instance plus the sink its transitions are reported to.
#[derive(Debug)]
pub struct Lifecycle {
	generation: u64,
	state: LifecycleState,
	events: broadcast::Sender<LifecycleEvent>,
}

impl Lifecycle {
	pub fn new(generation: u64, events: broadcast::Sender<LifecycleEvent>) -> Self {
		Self {
			generation,
			state: LifecycleState::Unauthenticated,
			events,
		}
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn state(&self) -> LifecycleState {
		self.state
	}

	/// Moves to `next`. Out-of-order transitions are logged and ignored.
	pub fn advance(&mut self, next: LifecycleState) -> bool {
		if !self.state.can_advance_to(next) {
			warn!(
				target = "beacon.session",
				generation = self.generation,
				from = %self.state,
				to = %next,
				"ignoring invalid transition"
			);
			return false;
		}
		debug!(target = "beacon.session", generation = self.generation, from = %self.state, to = %next, "state changed");
		self.state = next;
		self.emit(LifecycleEvent::StateChanged {
			generation: self.generation,
			state: next,
		});
		true
	}

	pub fn emit(&self, event: LifecycleEvent) {
		// No subscribers is fine.
		let _ = self.events.send(event);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use LifecycleState::*;

	#[test]
	fn forward_path_is_accepted_in_order() {
		let path = [Unauthenticated, Authenticated, ChannelConnecting, ChannelOpen, Published, HandleRegistered, SteadyState, Terminated];
		for pair in path.windows(2) {
			assert!(pair[0].can_advance_to(pair[1]), "{} -> {}", pair[0], pair[1]);
		}
	}

	#[test]
	fn skipping_and_leaving_terminated_are_rejected() {
		assert!(!ChannelOpen.can_advance_to(SteadyState));
		assert!(!SteadyState.can_advance_to(Published));
		assert!(!Terminated.can_advance_to(Unauthenticated));
		assert!(ChannelConnecting.can_advance_to(Terminated));
	}

	#[test]
	fn lifecycle_broadcasts_accepted_transitions_only() {
		let (tx, mut rx) = broadcast::channel(8);
		let mut lifecycle = Lifecycle::new(3, tx);

		assert!(lifecycle.advance(Authenticated));
		assert!(!lifecycle.advance(SteadyState));
		assert_eq!(lifecycle.state(), Authenticated);

		assert_eq!(rx.try_recv().unwrap(), LifecycleEvent::StateChanged { generation: 3, state: Authenticated });
		assert!(rx.try_recv().is_err());
	}
}
