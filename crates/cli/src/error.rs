use beacon_runtime::ProbeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("{0:#}")]
	Config(anyhow::Error),

	#[error("missing required setting `{0}` (set it in the config file or on the command line)")]
	MissingSetting(&'static str),

	#[error(transparent)]
	Beacon(#[from] beacon::Error),

	#[error(transparent)]
	Runtime(#[from] beacon_runtime::Error),

	#[error(transparent)]
	Probe(#[from] ProbeError),

	#[error("failed to encode output: {0}")]
	Output(#[from] serde_json::Error),
}
