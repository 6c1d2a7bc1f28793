//! Tests for the RakNet status probe against a local UDP responder

use std::time::Duration;

use beacon_runtime::probe::{decode_pong, encode_pong};
use beacon_runtime::{ProbeError, RakNetProbe, ServerProbe};
use tokio::net::UdpSocket;

#[tokio::test]
async fn probe_parses_pong_from_server() {
	let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
	let port = server.local_addr().unwrap().port();

	let responder = tokio::spawn(async move {
		let mut buf = [0u8; 64];
		let (len, peer) = server.recv_from(&mut buf).await.unwrap();
		assert_eq!(len, 33);
		assert_eq!(buf[0], 0x01);
		// a stray datagram first; the probe must skip it
		server.send_to(&[0xff, 0x00], peer).await.unwrap();
		let pong = encode_pong(1, 99, "MCPE;My Server;622;1.20.0;5;20;99;Survival World;Survival;1;19132;19133;");
		server.send_to(&pong, peer).await.unwrap();
	});

	let status = RakNetProbe::new(Duration::from_secs(2)).probe("127.0.0.1", port).await.unwrap();
	responder.await.unwrap();

	assert_eq!(status.name, "My Server");
	assert_eq!(status.motd, "Survival World");
	assert_eq!(status.players_online, Some(5));
	assert_eq!(status.players_max, Some(20));
	assert_eq!(status.protocol_version, Some(622));
	assert_eq!(status.game_version, "1.20.0");
}

#[tokio::test]
async fn silent_server_times_out() {
	let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
	let port = server.local_addr().unwrap().port();

	let err = RakNetProbe::new(Duration::from_millis(100)).probe("127.0.0.1", port).await.unwrap_err();
	assert!(matches!(err, ProbeError::Timeout { .. }));
	drop(server);
}

#[test]
fn pong_helpers_agree() {
	let pong = encode_pong(0, 0, "MCPE;a;1;b;2;3;");
	assert_eq!(decode_pong(&pong).unwrap(), "MCPE;a;1;b;2;3;");
}
