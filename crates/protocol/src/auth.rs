//! Identity token issued by the platform's security token service.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Authorization scheme prefix used by every authenticated platform call.
pub const AUTH_SCHEME: &str = "XBL3.0";

/// Authenticated identity used for every outbound call.
///
/// Field names follow the token cache written by common login tools:
/// ```json
/// {
///   "userXUID": "2535400000000000",
///   "userHash": "1234567890123456789",
///   "XSTSToken": "eyJ...",
///   "expiresOn": 1760000000000
/// }
/// ```
///
/// A token is immutable once obtained. Refreshing means replacing it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityToken {
	/// Account id (XUID) of the session owner.
	#[serde(rename = "userXUID")]
	pub owner_id: String,
	/// User hash half of the authorization header.
	#[serde(rename = "userHash")]
	pub hash_secret: String,
	/// Security token half of the authorization header.
	#[serde(rename = "XSTSToken")]
	pub security_token: String,
	/// Expiry as milliseconds since the unix epoch.
	#[serde(rename = "expiresOn")]
	pub expires_at: u64,
}

impl IdentityToken {
	/// Returns the `Authorization` header value for this token.
	pub fn authorization_header(&self) -> String {
		format!("{AUTH_SCHEME} x={};{}", self.hash_secret, self.security_token)
	}

	/// Returns the expiry as a [`SystemTime`], `None` when it is out of range.
	pub fn expiry(&self) -> Option<SystemTime> {
		UNIX_EPOCH.checked_add(Duration::from_millis(self.expires_at))
	}

	/// Returns `true` when the token is expired at `now` or expires within `margin`.
	pub fn expires_within(&self, margin: Duration, now: SystemTime) -> bool {
		match (self.expiry(), now.checked_add(margin)) {
			(Some(expiry), Some(deadline)) => expiry <= deadline,
			_ => false,
		}
	}

	/// Time left at `now` before the token comes within `margin` of expiring.
	///
	/// Zero once it has; [`Duration::MAX`] when the expiry is out of range.
	pub fn time_until_margin(&self, margin: Duration, now: SystemTime) -> Duration {
		match self.expiry() {
			Some(expiry) => expiry.duration_since(now).unwrap_or_default().saturating_sub(margin),
			None => Duration::MAX,
		}
	}
}

impl fmt::Debug for IdentityToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("IdentityToken")
			.field("owner_id", &self.owner_id)
			.field("hash_secret", &"<redacted>")
			.field("security_token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn token(expires_at: u64) -> IdentityToken {
		IdentityToken {
			owner_id: "2535400000000000".into(),
			hash_secret: "1234".into(),
			security_token: "abcd".into(),
			expires_at,
		}
	}

	#[test]
	fn header_uses_hash_and_security_token() {
		assert_eq!(token(0).authorization_header(), "XBL3.0 x=1234;abcd");
	}

	#[test]
	fn deserializes_token_cache_shape() {
		let json = r#"{"userXUID":"1","userHash":"2","XSTSToken":"3","expiresOn":42}"#;
		let parsed: IdentityToken = serde_json::from_str(json).unwrap();
		assert_eq!(parsed.owner_id, "1");
		assert_eq!(parsed.hash_secret, "2");
		assert_eq!(parsed.security_token, "3");
		assert_eq!(parsed.expires_at, 42);
	}

	#[test]
	fn expiry_respects_margin() {
		let now = UNIX_EPOCH + Duration::from_secs(1_000);
		let t = token(1_000_000 + 60_000);
		assert!(!t.expires_within(Duration::from_secs(30), now));
		assert!(t.expires_within(Duration::from_secs(60), now));
		assert!(token(0).expires_within(Duration::ZERO, now));
	}

	#[test]
	fn time_until_margin_counts_down_to_zero() {
		let now = UNIX_EPOCH + Duration::from_secs(1_000);
		let t = token(1_000_000 + 360_000);
		assert_eq!(t.time_until_margin(Duration::from_secs(300), now), Duration::from_secs(60));
		assert_eq!(t.time_until_margin(Duration::from_secs(400), now), Duration::ZERO);
		assert_eq!(token(0).time_until_margin(Duration::ZERO, now), Duration::ZERO);
		assert_eq!(token(u64::MAX).time_until_margin(Duration::from_secs(300), now), Duration::MAX);
	}

	#[test]
	fn debug_redacts_secrets() {
		let rendered = format!("{:?}", token(0));
		assert!(!rendered.contains("abcd"));
		assert!(rendered.contains("2535400000000000"));
	}
}
