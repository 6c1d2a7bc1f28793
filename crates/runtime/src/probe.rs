//! Live status probe for the hosted game server.
//!
//! Sends a RakNet unconnected ping over UDP and parses the advertisement
//! string from the unconnected pong.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use beacon_protocol::ServerStatus;
use tokio::net::UdpSocket;
use tracing::debug;

use crate::error::ProbeError;

/// RakNet offline message magic.
pub const OFFLINE_MAGIC: [u8; 16] = [
	0x00, 0xff, 0xff, 0x00, 0xfe, 0xfe, 0xfe, 0xfe, 0xfd, 0xfd, 0xfd, 0xfd, 0x12, 0x34, 0x56, 0x78,
];

const UNCONNECTED_PING: u8 = 0x01;
const UNCONNECTED_PONG: u8 = 0x1c;
/// id + time + server guid + magic + string length
const PONG_HEADER_LEN: usize = 1 + 8 + 8 + 16 + 2;

/// Queries a game server for its live status.
#[async_trait]
pub trait ServerProbe: Send + Sync {
	async fn probe(&self, host: &str, port: u16) -> Result<ServerStatus, ProbeError>;
}

/// [`ServerProbe`] using the RakNet unconnected ping.
#[derive(Debug, Clone)]
pub struct RakNetProbe {
	timeout: Duration,
	client_guid: u64,
}

impl RakNetProbe {
	pub fn new(timeout: Duration) -> Self {
		let client_guid = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|d| d.as_nanos() as u64)
			.unwrap_or_default()
			^ u64::from(std::process::id());
		Self { timeout, client_guid }
	}

	async fn exchange(&self, host: &str, port: u16) -> Result<ServerStatus, ProbeError> {
		let bind_addr = if host.contains(':') { "[::]:0" } else { "0.0.0.0:0" };
		let socket = UdpSocket::bind(bind_addr).await?;
		socket.connect((host, port)).await?;

		let sent_at = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|d| d.as_millis() as u64)
			.unwrap_or_default();
		socket.send(&encode_ping(sent_at, self.client_guid)).await?;

		let mut buf = [0u8; 2048];
		loop {
			let len = socket.recv(&mut buf).await?;
			match decode_pong(&buf[..len]) {
				Ok(advertisement) => {
					debug!(target = "beacon.probe", %host, port, %advertisement, "pong");
					return ServerStatus::parse_advertisement(&advertisement)
						.ok_or_else(|| ProbeError::Malformed(format!("unrecognized advertisement: {advertisement}")));
				}
				Err(err) => debug!(target = "beacon.probe", %host, port, error = %err, "ignoring datagram"),
			}
		}
	}
}

#[async_trait]
impl ServerProbe for RakNetProbe {
	async fn probe(&self, host: &str, port: u16) -> Result<ServerStatus, ProbeError> {
		match tokio::time::timeout(self.timeout, self.exchange(host, port)).await {
			Ok(result) => result,
			Err(_) => Err(ProbeError::Timeout {
				host: host.to_string(),
				port,
				timeout: self.timeout,
			}),
		}
	}
}

/// Encodes an unconnected ping.
pub fn encode_ping(time_ms: u64, client_guid: u64) -> Vec<u8> {
	let mut packet = Vec::with_capacity(33);
	packet.push(UNCONNECTED_PING);
	packet.extend_from_slice(&time_ms.to_be_bytes());
	packet.extend_from_slice(&OFFLINE_MAGIC);
	packet.extend_from_slice(&client_guid.to_be_bytes());
	packet
}

/// Encodes an unconnected pong carrying `advertisement`.
pub fn encode_pong(time_ms: u64, server_guid: u64, advertisement: &str) -> Vec<u8> {
	let bytes = advertisement.as_bytes();
	let mut packet = Vec::with_capacity(PONG_HEADER_LEN + bytes.len());
	packet.push(UNCONNECTED_PONG);
	packet.extend_from_slice(&time_ms.to_be_bytes());
	packet.extend_from_slice(&server_guid.to_be_bytes());
	packet.extend_from_slice(&OFFLINE_MAGIC);
	packet.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
	packet.extend_from_slice(bytes);
	packet
}

/// Extracts the advertisement string from an unconnected pong.
pub fn decode_pong(packet: &[u8]) -> Result<String, ProbeError> {
	if packet.len() < PONG_HEADER_LEN {
		return Err(ProbeError::Malformed(format!("pong too short ({} bytes)", packet.len())));
	}
	if packet[0] != UNCONNECTED_PONG {
		return Err(ProbeError::Malformed(format!("unexpected packet id 0x{:02x}", packet[0])));
	}
	if packet[17..33] != OFFLINE_MAGIC {
		return Err(ProbeError::Malformed("offline magic mismatch".to_string()));
	}

	let len = u16::from_be_bytes([packet[33], packet[34]]) as usize;
	let body = packet
		.get(PONG_HEADER_LEN..PONG_HEADER_LEN + len)
		.ok_or_else(|| ProbeError::Malformed(format!("advertisement truncated (want {len} bytes)")))?;
	String::from_utf8(body.to_vec()).map_err(|e| ProbeError::Malformed(e.to_string()))
}
