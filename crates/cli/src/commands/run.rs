use std::sync::Arc;

use beacon::{LifecycleEvent, Services, Supervisor};
use beacon_runtime::{RakNetProbe, RtaConnector, TokenFileProvider, XboxLiveClient};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::Overrides;
use crate::config::LoadedConfig;
use crate::error::Result;

pub async fn execute(mut loaded: LoadedConfig, overrides: &Overrides) -> Result<()> {
	loaded.file.apply(overrides);
	let config = loaded.file.session_config()?;
	let endpoints = loaded.file.endpoints();
	let auth_dir = loaded.file.auth_dir();

	info!(
		target = "beacon",
		identity = %config.identity,
		host = %config.host_ip,
		port = config.host_port,
		auth_dir = %auth_dir.display(),
		"starting advertiser"
	);

	let services = Services {
		credentials: Arc::new(TokenFileProvider::new(auth_dir)),
		connector: Arc::new(RtaConnector::new(endpoints.rta_socket.clone())),
		platform: Arc::new(XboxLiveClient::new(endpoints, config.timing.http_timeout)?),
		probe: Arc::new(RakNetProbe::new(config.timing.probe_timeout)),
	};
	let supervisor = Supervisor::new(config, services);

	let shutdown = CancellationToken::new();
	tokio::spawn(cancel_on_interrupt(shutdown.clone()));
	tokio::spawn(report(supervisor.subscribe()));

	supervisor.run(shutdown).await?;
	Ok(())
}

async fn cancel_on_interrupt(shutdown: CancellationToken) {
	match tokio::signal::ctrl_c().await {
		Ok(()) => info!(target = "beacon", "interrupt received; shutting down"),
		Err(err) => warn!(target = "beacon", error = %err, "cannot listen for interrupts; shutting down"),
	}
	shutdown.cancel();
}

async fn report(mut events: broadcast::Receiver<LifecycleEvent>) {
	loop {
		match events.recv().await {
			Ok(LifecycleEvent::InstanceStarted { generation, session_id }) => {
				info!(target = "beacon", generation, %session_id, "advertising session");
			}
			Ok(LifecycleEvent::Restarting { generation, reason, delay }) => {
				info!(target = "beacon", generation, %reason, delay_ms = delay.as_millis() as u64, "session will restart");
			}
			Ok(LifecycleEvent::StateChanged { generation, state }) => {
				debug!(target = "beacon", generation, %state, "lifecycle state");
			}
			Err(broadcast::error::RecvError::Lagged(skipped)) => {
				debug!(target = "beacon", skipped, "lifecycle reporter lagged");
			}
			Err(broadcast::error::RecvError::Closed) => break,
		}
	}
}
