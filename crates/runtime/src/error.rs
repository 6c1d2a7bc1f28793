//! Error types for transport and collaborator failures.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result alias for transport calls.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single REST call or real-time connection attempt.
#[derive(Debug, Error)]
pub enum Error {
	#[error("HTTP request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("{method} {url} returned {status}: {body}")]
	Status {
		method: &'static str,
		url: String,
		status: u16,
		body: String,
	},

	#[error("WebSocket error: {0}")]
	WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

	#[error("Invalid header value: {0}")]
	InvalidHeader(String),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
	fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
		Self::WebSocket(Box::new(err))
	}
}

impl Error {
	/// HTTP status code when the call reached the server.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			Self::Http(err) => err.status().map(|s| s.as_u16()),
			_ => None,
		}
	}

	/// Returns `true` when the platform rejected the token.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self.status(), Some(401 | 403))
	}
}

/// Failure to obtain live status from the hosted server.
#[derive(Debug, Error)]
pub enum ProbeError {
	#[error("no reply from {host}:{port} within {timeout:?}")]
	Timeout { host: String, port: u16, timeout: Duration },

	#[error("probe I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("malformed pong: {0}")]
	Malformed(String),
}

/// Failure to obtain an identity token.
#[derive(Debug, Error)]
pub enum CredentialError {
	#[error("no cached token at {}", .0.display())]
	Missing(PathBuf),

	#[error("failed to read {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse {}: {source}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("cached token for {identity} expired")]
	Expired { identity: String },

	#[error("{0}")]
	Other(String),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn status_error_reports_code() {
		let err = Error::Status {
			method: "PUT",
			url: "https://example.invalid/s".into(),
			status: 403,
			body: String::new(),
		};
		assert_eq!(err.status(), Some(403));
		assert!(err.is_unauthorized());
		assert_eq!(err.to_string(), "PUT https://example.invalid/s returned 403: ");
	}

	#[test]
	fn io_error_has_no_status() {
		let err = Error::Io(std::io::Error::other("boom"));
		assert_eq!(err.status(), None);
		assert!(!err.is_unauthorized());
	}
}
