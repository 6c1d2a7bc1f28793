mod config;
mod probe;
mod run;

use crate::cli::{Commands, ConfigAction};
use crate::config::LoadedConfig;
use crate::error::Result;

/// Runs `command`. `loaded` is only required by commands that use the config.
pub async fn dispatch(command: Commands, loaded: Result<LoadedConfig>) -> Result<()> {
	match command {
		Commands::Run(overrides) => run::execute(loaded?, &overrides).await,
		Commands::Probe { host, port, timeout_ms } => probe::execute(&host, port, timeout_ms).await,
		Commands::Config { action } => match action {
			ConfigAction::Check(overrides) => config::check(loaded?, &overrides),
		},
	}
}
