use beacon_cli::cli::Cli;
use beacon_cli::config::LoadedConfig;
use beacon_cli::{commands, logging};
use clap::Parser;
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	let loaded = LoadedConfig::discover(cli.config.as_deref());
	let verbose_config = loaded.as_ref().is_ok_and(|loaded| loaded.file.verbose_logging == Some(true));
	logging::init_logging(cli.verbose, verbose_config);

	if let Err(err) = commands::dispatch(cli.command, loaded).await {
		error!(target = "beacon", error = %err, "command failed");
		std::process::exit(1);
	}
}
