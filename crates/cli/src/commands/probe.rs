use std::time::Duration;

use beacon_runtime::{RakNetProbe, ServerProbe};

use crate::error::Result;

pub async fn execute(host: &str, port: u16, timeout_ms: u64) -> Result<()> {
	let probe = RakNetProbe::new(Duration::from_millis(timeout_ms));
	let status = probe.probe(host, port).await?;
	println!("{}", serde_json::to_string_pretty(&status)?);
	Ok(())
}
