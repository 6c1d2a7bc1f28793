//! In-memory collaborators for driving the lifecycle without a network.
//!
//! # Example
//!
//! ```ignore
//! let (connector, channels) = FakeConnectorBuilder::new().build();
//! let platform = Arc::new(FakePlatform::default());
//!
//! // ... start a controller with `connector` and `platform` ...
//!
//! channels.send_connection_id(0, "abc123");
//! assert_eq!(platform.puts().len(), 1);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use beacon_protocol::{CreateHandleRequest, IdentityToken, PeopleList, ServerStatus, SessionRequest};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::channel::{ChannelConnector, ChannelEvent, ChannelHandle, InboundEvents};
use crate::credentials::CredentialProvider;
use crate::error::{CredentialError, Error, ProbeError, Result};
use crate::platform::Platform;
use crate::probe::ServerProbe;

#[derive(Default)]
struct ConnectorState {
	channels: Vec<mpsc::UnboundedSender<ChannelEvent>>,
	attempts: usize,
	fail_next: usize,
}

/// Builder for a fake connector and its controller.
#[derive(Default)]
pub struct FakeConnectorBuilder {
	fail_first: usize,
}

impl FakeConnectorBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes the first `count` connection attempts fail.
	pub fn fail_first(mut self, count: usize) -> Self {
		self.fail_first = count;
		self
	}

	/// Returns the connector for the code under test and a controller for the test.
	pub fn build(self) -> (FakeConnector, FakeChannelController) {
		let state = Arc::new(Mutex::new(ConnectorState {
			fail_next: self.fail_first,
			..Default::default()
		}));
		(
			FakeConnector {
				state: Arc::clone(&state),
			},
			FakeChannelController { state },
		)
	}
}

/// [`ChannelConnector`] handing out in-memory channels.
pub struct FakeConnector {
	state: Arc<Mutex<ConnectorState>>,
}

#[async_trait]
impl ChannelConnector for FakeConnector {
	async fn connect(&self, _token: &IdentityToken) -> Result<(ChannelHandle, InboundEvents)> {
		let mut state = self.state.lock();
		state.attempts += 1;
		if state.fail_next > 0 {
			state.fail_next -= 1;
			return Err(Error::Io(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "fake connect refused")));
		}
		let (tx, rx) = mpsc::unbounded_channel();
		state.channels.push(tx);
		Ok((ChannelHandle::default(), rx))
	}
}

/// Injects events into channels opened through the paired [`FakeConnector`].
pub struct FakeChannelController {
	state: Arc<Mutex<ConnectorState>>,
}

impl FakeChannelController {
	/// Number of successfully opened channels.
	pub fn connections(&self) -> usize {
		self.state.lock().channels.len()
	}

	/// Number of connection attempts, failed ones included.
	pub fn attempts(&self) -> usize {
		self.state.lock().attempts
	}

	/// Sends `event` on channel `index`. Returns `false` when the receiving side is gone.
	pub fn inject(&self, index: usize, event: ChannelEvent) -> bool {
		self.state.lock().channels.get(index).is_some_and(|tx| tx.send(event).is_ok())
	}

	/// Delivers a connection id on channel `index`.
	pub fn send_connection_id(&self, index: usize, id: &str) -> bool {
		self.inject(index, ChannelEvent::ConnectionId(id.to_string()))
	}

	/// Closes channel `index` the way a server close frame would.
	pub fn close(&self, index: usize, reason: &str) -> bool {
		self.inject(
			index,
			ChannelEvent::Closed {
				code: Some(1000),
				reason: reason.to_string(),
			},
		)
	}

	/// Returns `true` while the receiving side of channel `index` is alive.
	pub fn is_open(&self, index: usize) -> bool {
		self.state.lock().channels.get(index).is_some_and(|tx| !tx.is_closed())
	}
}

/// One recorded [`Platform`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
	PutSession { session_id: String, authorization: String, request: Box<SessionRequest> },
	PostHandle(CreateHandleRequest),
	GetFollowers,
	AddFriend(String),
	RemoveFriend(String),
}

#[derive(Default)]
struct PlatformState {
	calls: Vec<PlatformCall>,
	followers: PeopleList,
	fail_puts: bool,
	fail_handles: bool,
	fail_followers: bool,
	panic_followers: bool,
	put_latency: Duration,
	followers_latency: Duration,
}

/// [`Platform`] that records calls and answers from configured state.
#[derive(Default)]
pub struct FakePlatform {
	state: Mutex<PlatformState>,
}

impl FakePlatform {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the followers listing returned by `get_followers`.
	pub fn set_followers(&self, followers: PeopleList) {
		self.state.lock().followers = followers;
	}

	/// Makes session `PUT`s fail with a 503 while `fail` is set.
	pub fn fail_puts(&self, fail: bool) {
		self.state.lock().fail_puts = fail;
	}

	/// Makes handle `POST`s fail with a 500 while `fail` is set.
	pub fn fail_handles(&self, fail: bool) {
		self.state.lock().fail_handles = fail;
	}

	/// Makes the followers listing fail while `fail` is set.
	pub fn fail_followers(&self, fail: bool) {
		self.state.lock().fail_followers = fail;
	}

	/// Makes the followers listing panic while `panic` is set.
	pub fn panic_followers(&self, panic: bool) {
		self.state.lock().panic_followers = panic;
	}

	/// Delays every session `PUT` by `latency` after it is recorded.
	pub fn set_put_latency(&self, latency: Duration) {
		self.state.lock().put_latency = latency;
	}

	/// Delays every followers listing by `latency` after it is recorded.
	pub fn set_followers_latency(&self, latency: Duration) {
		self.state.lock().followers_latency = latency;
	}

	/// Every call so far, in order.
	pub fn calls(&self) -> Vec<PlatformCall> {
		self.state.lock().calls.clone()
	}

	/// Session `PUT`s as `(session_id, request)`.
	pub fn puts(&self) -> Vec<(String, SessionRequest)> {
		self.calls()
			.into_iter()
			.filter_map(|call| match call {
				PlatformCall::PutSession { session_id, request, .. } => Some((session_id, *request)),
				_ => None,
			})
			.collect()
	}

	/// Handle `POST`s.
	pub fn handles(&self) -> Vec<CreateHandleRequest> {
		self.calls()
			.into_iter()
			.filter_map(|call| match call {
				PlatformCall::PostHandle(request) => Some(request),
				_ => None,
			})
			.collect()
	}

	/// Calls matching `predicate`.
	pub fn count(&self, predicate: impl Fn(&PlatformCall) -> bool) -> usize {
		self.state.lock().calls.iter().filter(|call| predicate(call)).count()
	}

	fn record(&self, call: PlatformCall) {
		self.state.lock().calls.push(call);
	}
}

fn fake_status(method: &'static str, status: u16) -> Error {
	Error::Status {
		method,
		url: "fake://platform".to_string(),
		status,
		body: String::new(),
	}
}

async fn stall(latency: Duration) {
	if !latency.is_zero() {
		tokio::time::sleep(latency).await;
	}
}

#[async_trait]
impl Platform for FakePlatform {
	async fn put_session(&self, token: &IdentityToken, session_id: &str, request: &SessionRequest) -> Result<()> {
		self.record(PlatformCall::PutSession {
			session_id: session_id.to_string(),
			authorization: token.authorization_header(),
			request: Box::new(request.clone()),
		});
		let latency = self.state.lock().put_latency;
		stall(latency).await;
		if self.state.lock().fail_puts {
			return Err(fake_status("PUT", 503));
		}
		Ok(())
	}

	async fn post_handle(&self, _token: &IdentityToken, request: &CreateHandleRequest) -> Result<()> {
		self.record(PlatformCall::PostHandle(request.clone()));
		if self.state.lock().fail_handles {
			return Err(fake_status("POST", 500));
		}
		Ok(())
	}

	async fn get_followers(&self, _token: &IdentityToken) -> Result<PeopleList> {
		self.record(PlatformCall::GetFollowers);
		let latency = self.state.lock().followers_latency;
		stall(latency).await;
		let state = self.state.lock();
		if state.panic_followers {
			panic!("fake followers listing panicked");
		}
		if state.fail_followers {
			return Err(fake_status("GET", 500));
		}
		Ok(state.followers.clone())
	}

	async fn add_friend(&self, _token: &IdentityToken, xuid: &str) -> Result<()> {
		self.record(PlatformCall::AddFriend(xuid.to_string()));
		Ok(())
	}

	async fn remove_friend(&self, _token: &IdentityToken, xuid: &str) -> Result<()> {
		self.record(PlatformCall::RemoveFriend(xuid.to_string()));
		Ok(())
	}
}

/// [`ServerProbe`] answering with a configurable status.
pub struct FakeProbe {
	reply: Mutex<Option<ServerStatus>>,
	probes: AtomicUsize,
}

impl FakeProbe {
	/// Probe that always answers with `status`.
	pub fn answering(status: ServerStatus) -> Self {
		Self {
			reply: Mutex::new(Some(status)),
			probes: AtomicUsize::new(0),
		}
	}

	/// Probe that always times out.
	pub fn unreachable() -> Self {
		Self {
			reply: Mutex::new(None),
			probes: AtomicUsize::new(0),
		}
	}

	/// Replaces the reply; `None` makes the probe fail.
	pub fn set_reply(&self, reply: Option<ServerStatus>) {
		*self.reply.lock() = reply;
	}

	/// Number of probes answered or failed so far.
	pub fn probes(&self) -> usize {
		self.probes.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl ServerProbe for FakeProbe {
	async fn probe(&self, host: &str, port: u16) -> std::result::Result<ServerStatus, ProbeError> {
		self.probes.fetch_add(1, Ordering::SeqCst);
		self.reply.lock().clone().ok_or_else(|| ProbeError::Timeout {
			host: host.to_string(),
			port,
			timeout: Duration::ZERO,
		})
	}
}

/// [`CredentialProvider`] handing out a fixed token.
pub struct StaticCredentials {
	token: Mutex<Option<IdentityToken>>,
	acquisitions: AtomicUsize,
}

impl StaticCredentials {
	pub fn new(token: IdentityToken) -> Self {
		Self {
			token: Mutex::new(Some(token)),
			acquisitions: AtomicUsize::new(0),
		}
	}

	/// Provider whose every acquisition fails.
	pub fn failing() -> Self {
		Self {
			token: Mutex::new(None),
			acquisitions: AtomicUsize::new(0),
		}
	}

	/// Replaces the token handed out from now on; `None` makes acquisition fail.
	pub fn set_token(&self, token: Option<IdentityToken>) {
		*self.token.lock() = token;
	}

	pub fn acquisitions(&self) -> usize {
		self.acquisitions.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
	async fn acquire(&self, identity: &str) -> std::result::Result<IdentityToken, CredentialError> {
		self.acquisitions.fetch_add(1, Ordering::SeqCst);
		self.token
			.lock()
			.clone()
			.ok_or_else(|| CredentialError::Other(format!("no token configured for {identity}")))
	}
}
