//! Authenticated REST client for the session directory and social graph.
//!
//! Every call takes the identity token snapshot it should authenticate with,
//! so the `Authorization` header always reflects the token current at the
//! time of the call. No call retries; the caller re-enters on its next tick.

use std::time::Duration;

use async_trait::async_trait;
use beacon_protocol::{
	CONTRACT_VERSION_HEADER, CreateHandleRequest, Endpoints, IdentityToken, PEOPLE_HUB_CONTRACT_VERSION, PeopleList, SESSION_CONTRACT_VERSION,
	SessionRequest,
};
use reqwest::header::{ACCEPT_LANGUAGE, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use tracing::debug;

use crate::error::{Error, Result};

/// REST operations the session lifecycle issues.
#[async_trait]
pub trait Platform: Send + Sync {
	/// Creates or overwrites the session record `session_id`.
	async fn put_session(&self, token: &IdentityToken, session_id: &str, request: &SessionRequest) -> Result<()>;

	/// Registers a discoverable handle for a session.
	async fn post_handle(&self, token: &IdentityToken, request: &CreateHandleRequest) -> Result<()>;

	/// Lists accounts following the token owner.
	async fn get_followers(&self, token: &IdentityToken) -> Result<PeopleList>;

	/// Follows `xuid` back.
	async fn add_friend(&self, token: &IdentityToken, xuid: &str) -> Result<()>;

	/// Stops following `xuid`.
	async fn remove_friend(&self, token: &IdentityToken, xuid: &str) -> Result<()>;
}

/// [`Platform`] over HTTPS.
#[derive(Debug, Clone)]
pub struct XboxLiveClient {
	http: reqwest::Client,
	endpoints: Endpoints,
}

impl XboxLiveClient {
	/// Creates a client whose requests give up after `timeout`.
	pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self> {
		let http = reqwest::Client::builder().timeout(timeout).build()?;
		Ok(Self { http, endpoints })
	}

	/// Endpoints this client targets.
	pub fn endpoints(&self) -> &Endpoints {
		&self.endpoints
	}

	fn request(&self, method: Method, url: &str, token: &IdentityToken, contract: Option<&'static str>) -> Result<RequestBuilder> {
		let mut headers = HeaderMap::new();
		headers.insert(AUTHORIZATION, header_value(&token.authorization_header())?);
		if let Some(version) = contract {
			headers.insert(CONTRACT_VERSION_HEADER, HeaderValue::from_static(version));
		}
		Ok(self.http.request(method, url).headers(headers))
	}

	async fn send(&self, method: &'static str, url: String, request: RequestBuilder) -> Result<Response> {
		let response = request.send().await?;
		let status = response.status();
		debug!(target = "beacon.http", method, %url, status = status.as_u16(), "response");

		if status.is_success() {
			return Ok(response);
		}

		let body = response.text().await.unwrap_or_default();
		Err(Error::Status {
			method,
			url,
			status: status.as_u16(),
			body,
		})
	}
}

#[async_trait]
impl Platform for XboxLiveClient {
	async fn put_session(&self, token: &IdentityToken, session_id: &str, request: &SessionRequest) -> Result<()> {
		let url = self.endpoints.session_uri(session_id);
		let builder = self.request(Method::PUT, &url, token, Some(SESSION_CONTRACT_VERSION))?.json(request);
		self.send("PUT", url, builder).await?;
		Ok(())
	}

	async fn post_handle(&self, token: &IdentityToken, request: &CreateHandleRequest) -> Result<()> {
		let url = self.endpoints.handles_uri();
		let builder = self.request(Method::POST, &url, token, Some(SESSION_CONTRACT_VERSION))?.json(request);
		self.send("POST", url, builder).await?;
		Ok(())
	}

	async fn get_followers(&self, token: &IdentityToken) -> Result<PeopleList> {
		let url = self.endpoints.followers_uri();
		let builder = self
			.request(Method::GET, &url, token, Some(PEOPLE_HUB_CONTRACT_VERSION))?
			.header(ACCEPT_LANGUAGE, "en-us");
		let response = self.send("GET", url, builder).await?;
		let bytes = response.bytes().await?;
		Ok(serde_json::from_slice(&bytes)?)
	}

	async fn add_friend(&self, token: &IdentityToken, xuid: &str) -> Result<()> {
		let url = self.endpoints.person_uri(xuid);
		let builder = self.request(Method::PUT, &url, token, None)?;
		self.send("PUT", url, builder).await?;
		Ok(())
	}

	async fn remove_friend(&self, token: &IdentityToken, xuid: &str) -> Result<()> {
		let url = self.endpoints.person_uri(xuid);
		let builder = self.request(Method::DELETE, &url, token, None)?;
		self.send("DELETE", url, builder).await?;
		Ok(())
	}
}

fn header_value(value: &str) -> Result<HeaderValue> {
	HeaderValue::from_str(value).map_err(|e| Error::InvalidHeader(e.to_string()))
}
