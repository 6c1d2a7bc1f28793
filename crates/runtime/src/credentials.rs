//! Identity token sources.
//!
//! Interactive login is somebody else's job. The provider here reads the token
//! cache such a tool writes, once per acquisition, so a refreshed cache is
//! picked up by the next lifecycle instance.

use std::path::PathBuf;
use std::time::SystemTime;

use async_trait::async_trait;
use beacon_protocol::IdentityToken;
use tracing::debug;

use crate::error::CredentialError;

/// Supplies identity tokens.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
	/// Returns a token for `identity`.
	async fn acquire(&self, identity: &str) -> Result<IdentityToken, CredentialError>;
}

/// Reads `<dir>/<identity>.json` on every acquisition.
#[derive(Debug, Clone)]
pub struct TokenFileProvider {
	dir: PathBuf,
}

impl TokenFileProvider {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	/// Cache file used for `identity`.
	pub fn token_path(&self, identity: &str) -> PathBuf {
		self.dir.join(format!("{}.json", cache_file_stem(identity)))
	}
}

#[async_trait]
impl CredentialProvider for TokenFileProvider {
	async fn acquire(&self, identity: &str) -> Result<IdentityToken, CredentialError> {
		let path = self.token_path(identity);
		let content = match tokio::fs::read_to_string(&path).await {
			Ok(content) => content,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Err(CredentialError::Missing(path)),
			Err(source) => return Err(CredentialError::Read { path, source }),
		};

		let token: IdentityToken = serde_json::from_str(&content).map_err(|source| CredentialError::Parse { path: path.clone(), source })?;

		if token.expires_within(std::time::Duration::ZERO, SystemTime::now()) {
			return Err(CredentialError::Expired {
				identity: identity.to_string(),
			});
		}

		debug!(target = "beacon.auth", path = %path.display(), owner = %token.owner_id, "token loaded");
		Ok(token)
	}
}

/// Maps an identity (usually an email) to a file-name-safe stem.
fn cache_file_stem(identity: &str) -> String {
	identity
		.chars()
		.map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '@') { c } else { '_' })
		.collect()
}
