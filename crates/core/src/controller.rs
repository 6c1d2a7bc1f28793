//! One lifecycle instance: authenticate, connect, publish, keep publishing.
//!
//! The controller is a single task. Channel events, completions of the HTTP
//! work it spawned, and both periodic timers are multiplexed in one
//! `select!` loop, so the descriptor has exactly one writer. Everything the
//! instance spawned lives in its [`JoinSet`] and dies with it; nothing from a
//! finished instance can fire later.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use beacon_protocol::{CreateHandleRequest, IdentityToken};
use beacon_runtime::{ChannelConnector, ChannelEvent, ChannelHandle, CredentialProvider, InboundEvents, Platform, ServerProbe};
use tokio::sync::broadcast;
use tokio::task::{self, JoinError, JoinSet};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::advert::{self, AdvertisementSnapshot};
use crate::config::SessionConfig;
use crate::descriptor::SessionDescriptor;
use crate::error::{Error, Result};
use crate::friends::{self, FriendSyncReport};
use crate::state::{Lifecycle, LifecycleEvent, LifecycleState};

/// External collaborators of a lifecycle instance.
#[derive(Clone)]
pub struct Services {
	pub credentials: Arc<dyn CredentialProvider>,
	pub connector: Arc<dyn ChannelConnector>,
	pub platform: Arc<dyn Platform>,
	pub probe: Arc<dyn ServerProbe>,
}

/// Why an instance ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
	ChannelClosed { code: Option<u16>, reason: String },
	ChannelError(String),
	ChannelConnectFailed(String),
	/// The token entered its refresh margin.
	TokenExpired,
	Shutdown,
}

impl fmt::Display for Termination {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::ChannelClosed { code: Some(code), reason } => write!(f, "channel closed ({code}): {reason}"),
			Self::ChannelClosed { code: None, reason } => write!(f, "channel closed: {reason}"),
			Self::ChannelError(err) => write!(f, "channel error: {err}"),
			Self::ChannelConnectFailed(err) => write!(f, "channel connect failed: {err}"),
			Self::TokenExpired => f.write_str("identity token expiring"),
			Self::Shutdown => f.write_str("shutdown requested"),
		}
	}
}

/// What the supervisor needs to know about a finished instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
	pub termination: Termination,
	pub reached_steady_state: bool,
	/// Empty when the instance ended before creating its descriptor.
	pub session_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PublishReason {
	Initial,
	Refresh,
}

impl PublishReason {
	fn as_str(self) -> &'static str {
		match self {
			Self::Initial => "initial",
			Self::Refresh => "refresh",
		}
	}
}

/// Completion of work spawned by the loop.
enum TaskOutcome {
	Resolved { reason: PublishReason, snapshot: AdvertisementSnapshot },
	Published { reason: PublishReason, result: beacon_runtime::Result<()> },
	HandleRegistered(beacon_runtime::Result<()>),
	FriendSync(Result<FriendSyncReport>),
}

/// Drives one lifecycle instance from token acquisition to termination.
pub struct SessionController {
	config: Arc<SessionConfig>,
	services: Services,
	lifecycle: Lifecycle,
	shutdown: CancellationToken,
}

impl SessionController {
	pub fn new(
		config: Arc<SessionConfig>,
		services: Services,
		generation: u64,
		events: broadcast::Sender<LifecycleEvent>,
		shutdown: CancellationToken,
	) -> Self {
		Self {
			config,
			services,
			lifecycle: Lifecycle::new(generation, events),
			shutdown,
		}
	}

	/// Runs the instance until its channel ends, its token expires or shutdown.
	///
	/// Only a credential failure is returned as an error. A token already inside
	/// its refresh margin ends the instance with [`Termination::TokenExpired`]
	/// before any session is created.
	pub async fn run(mut self) -> Result<RunSummary> {
		let generation = self.lifecycle.generation();

		let token = tokio::select! {
			_ = self.shutdown.cancelled() => return Ok(self.finish(Termination::Shutdown, String::new(), false)),
			token = self.services.credentials.acquire(&self.config.identity) => token?,
		};
		let usable_for = token.time_until_margin(self.config.timing.token_refresh_margin, SystemTime::now());
		if usable_for.is_zero() {
			warn!(target = "beacon.session", generation, owner = %token.owner_id, "identity token is inside its refresh margin");
			return Ok(self.finish(Termination::TokenExpired, String::new(), false));
		}
		// `None` when the deadline is beyond what the clock can represent.
		let token_deadline = Instant::now().checked_add(usable_for);
		let token = Arc::new(token);
		self.lifecycle.advance(LifecycleState::Authenticated);

		let descriptor = SessionDescriptor::new(&self.config, &token.owner_id);
		let session_id = descriptor.session_id().to_string();
		info!(target = "beacon.session", generation, session_id = %session_id, "lifecycle instance started");
		self.lifecycle.emit(LifecycleEvent::InstanceStarted {
			generation,
			session_id: session_id.clone(),
		});

		self.lifecycle.advance(LifecycleState::ChannelConnecting);
		let connected = tokio::select! {
			_ = self.shutdown.cancelled() => return Ok(self.finish(Termination::Shutdown, session_id, false)),
			connected = self.services.connector.connect(&token) => connected,
		};
		let (handle, inbound) = match connected {
			Ok(connected) => connected,
			Err(err) => {
				warn!(target = "beacon.channel", generation, error = %err, "channel connect failed");
				return Ok(self.finish(Termination::ChannelConnectFailed(err.to_string()), session_id, false));
			}
		};
		self.lifecycle.advance(LifecycleState::ChannelOpen);

		let mut instance = Instance {
			config: Arc::clone(&self.config),
			services: self.services.clone(),
			token,
			token_deadline,
			descriptor,
			handle_registered: false,
			reached_steady_state: false,
			refresh: None,
			friends: None,
			refresh_task: None,
			friend_task: None,
			tasks: JoinSet::new(),
		};
		let termination = instance.event_loop(&mut self.lifecycle, inbound, &self.shutdown).await;
		let reached = instance.reached_steady_state;
		instance.teardown(handle).await;

		Ok(self.finish(termination, session_id, reached))
	}

	fn finish(mut self, termination: Termination, session_id: String, reached_steady_state: bool) -> RunSummary {
		debug!(
			target = "beacon.session",
			generation = self.lifecycle.generation(),
			from = %self.lifecycle.state(),
			termination = %termination,
			"lifecycle instance terminated"
		);
		self.lifecycle.advance(LifecycleState::Terminated);
		RunSummary {
			termination,
			reached_steady_state,
			session_id,
		}
	}
}

/// Mutable state of a connected instance. Only the loop touches it.
struct Instance {
	config: Arc<SessionConfig>,
	services: Services,
	token: Arc<IdentityToken>,
	/// When the token enters its refresh margin.
	token_deadline: Option<Instant>,
	descriptor: SessionDescriptor,
	handle_registered: bool,
	reached_steady_state: bool,
	refresh: Option<Interval>,
	friends: Option<Interval>,
	/// The resolve or publish task of the running refresh.
	refresh_task: Option<task::Id>,
	friend_task: Option<task::Id>,
	tasks: JoinSet<TaskOutcome>,
}

impl Instance {
	async fn event_loop(&mut self, lifecycle: &mut Lifecycle, mut inbound: InboundEvents, shutdown: &CancellationToken) -> Termination {
		loop {
			tokio::select! {
				biased;

				_ = shutdown.cancelled() => return Termination::Shutdown,

				event = inbound.recv() => match event {
					Some(event) => {
						if let Some(termination) = self.on_channel_event(lifecycle, event) {
							return termination;
						}
					}
					None => return Termination::ChannelError("event stream ended".to_string()),
				},

				Some(joined) = self.tasks.join_next() => self.on_task(lifecycle, joined),

				_ = next_tick(&mut self.refresh) => {
					if let Some(termination) = self.on_refresh_tick(lifecycle) {
						return termination;
					}
				}

				_ = next_tick(&mut self.friends) => {
					if let Some(termination) = self.on_friend_tick(lifecycle) {
						return termination;
					}
				}
			}
		}
	}

	fn on_channel_event(&mut self, lifecycle: &Lifecycle, event: ChannelEvent) -> Option<Termination> {
		let generation = lifecycle.generation();
		match event {
			ChannelEvent::ConnectionId(id) => {
				if !self.descriptor.set_connection_id(&id) {
					debug!(target = "beacon.channel", generation, connection_id = %id, "ignoring repeated connection id");
					return None;
				}
				debug!(target = "beacon.channel", generation, connection_id = %id, "connection id received");
				self.refresh = Some(periodic(self.config.timing.refresh_interval));
				self.spawn_resolve(PublishReason::Initial);
				None
			}
			ChannelEvent::Message(frame) => {
				debug!(target = "beacon.channel", generation, %frame, "channel frame");
				None
			}
			ChannelEvent::Closed { code, reason } => {
				warn!(target = "beacon.channel", generation, ?code, %reason, "channel closed");
				Some(Termination::ChannelClosed { code, reason })
			}
			ChannelEvent::Error(err) => {
				warn!(target = "beacon.channel", generation, error = %err, "channel failed");
				Some(Termination::ChannelError(err))
			}
		}
	}

	fn on_refresh_tick(&mut self, lifecycle: &Lifecycle) -> Option<Termination> {
		if self.token_expiring() {
			return Some(Termination::TokenExpired);
		}
		if self.refresh_task.is_some() {
			debug!(target = "beacon.session", generation = lifecycle.generation(), "previous refresh still running; skipping tick");
			return None;
		}
		self.spawn_resolve(PublishReason::Refresh);
		None
	}

	fn on_friend_tick(&mut self, lifecycle: &Lifecycle) -> Option<Termination> {
		if self.token_expiring() {
			return Some(Termination::TokenExpired);
		}
		if self.friend_task.is_some() {
			debug!(target = "beacon.friends", generation = lifecycle.generation(), "previous friend sync still running; skipping tick");
			return None;
		}
		let platform = Arc::clone(&self.services.platform);
		let token = Arc::clone(&self.token);
		let task = self
			.tasks
			.spawn(async move { TaskOutcome::FriendSync(friends::sync(platform.as_ref(), &token).await) });
		self.friend_task = Some(task.id());
		None
	}

	fn on_task(&mut self, lifecycle: &mut Lifecycle, joined: std::result::Result<TaskOutcome, JoinError>) {
		let generation = lifecycle.generation();
		let outcome = match joined {
			Ok(outcome) => outcome,
			Err(err) => {
				warn!(target = "beacon.session", generation, error = %err, "background task failed");
				let failed = Some(err.id());
				if self.refresh_task == failed {
					self.refresh_task = None;
				}
				if self.friend_task == failed {
					self.friend_task = None;
				}
				return;
			}
		};

		match outcome {
			TaskOutcome::Resolved { reason, snapshot } => {
				self.descriptor.apply(&snapshot);
				self.spawn_publish(reason);
			}
			TaskOutcome::Published { reason, result } => {
				self.refresh_task = None;
				match result {
					Ok(()) => {
						debug!(
							target = "beacon.http",
							generation,
							session_id = %self.descriptor.session_id(),
							reason = reason.as_str(),
							players = self.descriptor.players_online(),
							"session published"
						);
						if !self.handle_registered {
							self.enter_steady_state(lifecycle);
						}
					}
					Err(err) => {
						let err = Error::Publish(err);
						warn!(target = "beacon.http", generation, reason = reason.as_str(), error = %err, "session publish failed");
					}
				}
			}
			TaskOutcome::HandleRegistered(result) => match result {
				Ok(()) => debug!(target = "beacon.http", generation, "handle registered"),
				Err(err) => {
					let err = Error::HandleRegistration(err);
					warn!(target = "beacon.http", generation, error = %err, "handle registration failed");
				}
			},
			TaskOutcome::FriendSync(result) => {
				self.friend_task = None;
				match result {
					Ok(report) if report.is_empty() => {}
					Ok(report) => debug!(
						target = "beacon.friends",
						generation,
						added = report.added.len(),
						removed = report.removed.len(),
						failed = report.failed.len(),
						"friend sync finished"
					),
					Err(err) => warn!(target = "beacon.friends", generation, error = %err, "friend sync failed"),
				}
			}
		}
	}

	/// First successful publish: register the handle once, then start the
	/// periodic work.
	fn enter_steady_state(&mut self, lifecycle: &mut Lifecycle) {
		lifecycle.advance(LifecycleState::Published);

		self.handle_registered = true;
		let platform = Arc::clone(&self.services.platform);
		let token = Arc::clone(&self.token);
		let request = CreateHandleRequest::activity(self.descriptor.session_id());
		self.tasks
			.spawn(async move { TaskOutcome::HandleRegistered(platform.post_handle(&token, &request).await) });
		lifecycle.advance(LifecycleState::HandleRegistered);

		lifecycle.advance(LifecycleState::SteadyState);
		self.reached_steady_state = true;
		if self.descriptor.auto_friending_enabled() {
			self.friends = Some(periodic(self.config.timing.friend_sync_interval));
		}
		info!(
			target = "beacon.session",
			generation = lifecycle.generation(),
			session_id = %self.descriptor.session_id(),
			"session advertised"
		);
	}

	fn spawn_resolve(&mut self, reason: PublishReason) {
		let probe = Arc::clone(&self.services.probe);
		let descriptor = self.descriptor.clone();
		let task = self.tasks.spawn(async move {
			let snapshot = advert::resolve(probe.as_ref(), &descriptor).await;
			TaskOutcome::Resolved { reason, snapshot }
		});
		self.refresh_task = Some(task.id());
	}

	fn spawn_publish(&mut self, reason: PublishReason) {
		let snapshot = AdvertisementSnapshot::from_descriptor(&self.descriptor);
		let request = advert::build_session_request(&self.descriptor, &snapshot);
		let session_id = self.descriptor.session_id().to_string();
		let platform = Arc::clone(&self.services.platform);
		let token = Arc::clone(&self.token);
		let task = self.tasks.spawn(async move {
			let result = platform.put_session(&token, &session_id, &request).await;
			TaskOutcome::Published { reason, result }
		});
		self.refresh_task = Some(task.id());
	}

	fn token_expiring(&self) -> bool {
		let expiring = self.token_deadline.is_some_and(|deadline| Instant::now() >= deadline);
		if expiring {
			info!(target = "beacon.session", session_id = %self.descriptor.session_id(), "identity token expiring; restarting");
		}
		expiring
	}

	/// Stops the channel and every spawned task before the instance is dropped.
	async fn teardown(mut self, mut handle: ChannelHandle) {
		self.refresh = None;
		self.friends = None;
		handle.close();
		self.tasks.shutdown().await;
	}
}

fn periodic(period: std::time::Duration) -> Interval {
	let mut interval = interval_at(Instant::now() + period, period);
	interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
	interval
}

/// Next tick of `timer`, or never when it is not armed.
async fn next_tick(timer: &mut Option<Interval>) {
	match timer {
		Some(interval) => {
			interval.tick().await;
		}
		None => std::future::pending().await,
	}
}
