//! Restart loop around [`SessionController`].
//!
//! Each restart builds a brand-new controller with a fresh descriptor; the
//! previous one has already torn down its channel and tasks by the time
//! `run` returns.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::SessionConfig;
use crate::controller::{RunSummary, Services, SessionController, Termination};
use crate::error::{Error, Result};
use crate::state::LifecycleEvent;

const EVENT_CAPACITY: usize = 64;

/// Delay between lifecycle instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
	pub base_delay: Duration,
	pub max_delay: Duration,
	/// Give up after this many restarts in a row without reaching steady state.
	pub max_consecutive_restarts: Option<u32>,
}

impl RestartPolicy {
	/// Delay before the restart following `failures` unhealthy instances in a row.
	///
	/// Zero failures restarts immediately; after that the delay doubles from
	/// `base_delay` up to `max_delay`.
	pub fn delay_for_attempt(&self, failures: u32) -> Duration {
		if failures == 0 {
			return Duration::ZERO;
		}
		let shift = (failures - 1).min(20);
		self.base_delay.saturating_mul(1 << shift).min(self.max_delay)
	}
}

impl Default for RestartPolicy {
	fn default() -> Self {
		Self {
			base_delay: Duration::from_secs(1),
			max_delay: Duration::from_secs(60),
			max_consecutive_restarts: None,
		}
	}
}

/// Keeps one lifecycle instance alive at a time until shutdown.
pub struct Supervisor {
	config: Arc<SessionConfig>,
	services: Services,
	events: broadcast::Sender<LifecycleEvent>,
}

impl Supervisor {
	pub fn new(config: SessionConfig, services: Services) -> Self {
		let (events, _) = broadcast::channel(EVENT_CAPACITY);
		Self {
			config: Arc::new(config),
			services,
			events,
		}
	}

	/// Lifecycle notifications of every instance this supervisor runs.
	pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
		self.events.subscribe()
	}

	/// Runs instances until `shutdown` fires or a fatal error occurs.
	///
	/// Returns `Ok` on shutdown. Credential failures, invalid configuration and
	/// an exhausted restart budget are returned as errors.
	pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
		self.config.validate()?;
		let policy = self.config.restart;

		let mut generation = 0u64;
		let mut failures = 0u32;
		loop {
			generation += 1;
			let controller = SessionController::new(
				Arc::clone(&self.config),
				self.services.clone(),
				generation,
				self.events.clone(),
				shutdown.clone(),
			);

			let summary = match controller.run().await {
				Ok(summary) => summary,
				Err(err) => {
					error!(target = "beacon.supervisor", generation, error = %err, "lifecycle instance failed fatally");
					return Err(err);
				}
			};
			if summary.termination == Termination::Shutdown || shutdown.is_cancelled() {
				info!(target = "beacon.supervisor", generation, "shut down");
				return Ok(());
			}

			failures = if summary.reached_steady_state { 0 } else { failures + 1 };
			if let Some(max) = policy.max_consecutive_restarts {
				if failures > max {
					error!(target = "beacon.supervisor", generation, restarts = max, "restart limit reached");
					return Err(Error::RestartLimit { restarts: max });
				}
			}

			let delay = policy.delay_for_attempt(failures);
			self.announce_restart(generation, &summary, delay);
			if !delay.is_zero() {
				tokio::select! {
					_ = shutdown.cancelled() => return Ok(()),
					_ = tokio::time::sleep(delay) => {}
				}
			}
		}
	}

	fn announce_restart(&self, generation: u64, summary: &RunSummary, delay: Duration) {
		let reason = summary.termination.to_string();
		warn!(
			target = "beacon.supervisor",
			generation,
			session_id = %summary.session_id,
			reason = %reason,
			delay_ms = delay.as_millis() as u64,
			"restarting lifecycle"
		);
		let _ = self.events.send(LifecycleEvent::Restarting { generation, reason, delay });
	}
}
