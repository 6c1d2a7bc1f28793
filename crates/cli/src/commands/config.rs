use tracing::info;

use crate::cli::Overrides;
use crate::config::{ConfigFile, LoadedConfig};
use crate::error::Result;

/// Prints the merged configuration if it would start a run.
pub fn check(mut loaded: LoadedConfig, overrides: &Overrides) -> Result<()> {
	loaded.file.apply(overrides);
	let config = loaded.file.session_config()?;
	config.validate()?;

	match &loaded.path {
		Some(path) => info!(target = "beacon", path = %path.display(), "config file loaded"),
		None => info!(target = "beacon", "no config file found; using defaults"),
	}
	let effective = ConfigFile::effective(&config, loaded.file.auth_dir(), &loaded.file.endpoints());
	println!("{}", serde_json::to_string_pretty(&effective)?);
	Ok(())
}
