//! Tracing bootstrap.
//!
//! Precedence: `RUST_LOG`, then `-v`/`-vv`, then `verboseLogging` from the
//! config file. Logs go to stderr so command output on stdout stays clean.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_logging(verbosity: u8, verbose_config: bool) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity, verbose_config)));
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(true)
		.with_writer(std::io::stderr)
		.try_init();
}

fn default_directives(verbosity: u8, verbose_config: bool) -> String {
	let level = match verbosity {
		0 => "warn",
		1 => "info",
		_ => "debug",
	};
	if verbose_config && verbosity < 2 {
		format!("{level},beacon=debug")
	} else {
		level.to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn verbosity_flags_map_to_levels() {
		assert_eq!(default_directives(0, false), "warn");
		assert_eq!(default_directives(1, false), "info");
		assert_eq!(default_directives(4, false), "debug");
	}

	#[test]
	fn verbose_config_enables_debug_for_beacon_targets() {
		assert_eq!(default_directives(0, true), "warn,beacon=debug");
		assert_eq!(default_directives(2, true), "debug");
	}
}
