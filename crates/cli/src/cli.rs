use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "beacon")]
#[command(about = "Advertise a locally hosted Bedrock server as a joinable friends session")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Config file (defaults to ./beacon.json, then the user config directory)
	#[arg(short, long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Advertise the server until interrupted
	Run(Overrides),

	/// Query a server's LAN advertisement and print it as JSON
	Probe {
		host: String,
		#[arg(default_value_t = 19132)]
		port: u16,
		/// Give up after this many milliseconds
		#[arg(long, default_value_t = 5000)]
		timeout_ms: u64,
	},

	/// Configuration helpers
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
	/// Load, merge and validate the configuration, then print it
	Check(Overrides),
}

/// Command line values that win over the config file.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
	/// Account whose cached token is used
	#[arg(long)]
	pub identity: Option<String>,

	/// Address friends connect to
	#[arg(long, value_name = "IP")]
	pub host_ip: Option<String>,

	#[arg(long, value_name = "PORT")]
	pub host_port: Option<u16>,

	/// Directory holding cached identity tokens
	#[arg(long, value_name = "DIR")]
	pub auth_dir: Option<PathBuf>,

	/// Follow back followers and drop non-followers
	#[arg(long)]
	pub auto_friending: bool,
}
