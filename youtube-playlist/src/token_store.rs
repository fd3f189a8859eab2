//! File-backed persistence of the user's OAuth token across runs.

use eyre::Context;
use oauth2::basic::BasicTokenResponse;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// File name of the token store inside the configuration directory.
pub const TOKEN_STORE_FILE: &str = "oauth2.json";

/// Persists a single [`BasicTokenResponse`] as JSON.
///
/// The file is read once when a client is set up and rewritten once after the token has been
/// refreshed or newly obtained.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored token, if there is a usable one.
    ///
    /// A file that exists but does not hold a token (for example one written by some other
    /// tool) is treated the same as no file, so that the user is simply asked to authorize again.
    pub async fn load(&self) -> eyre::Result<Option<BasicTokenResponse>> {
        if !tokio::fs::try_exists(&self.path)
            .await
            .with_context(|| format!("check for token store {}", self.path.display()))?
        {
            tracing::debug!(path = %self.path.display(), "no stored OAuth token");
            return Ok(None);
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("read token store {}", self.path.display()))?;
        match serde_json::from_str(&contents) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "ignoring unreadable stored OAuth token: {}",
                    e
                );
                Ok(None)
            }
        }
    }

    /// Overwrites the store with `token`.
    ///
    /// On unix the file is only ever readable by its owner, including while it is being written.
    pub async fn save(&self, token: &BasicTokenResponse) -> eyre::Result<()> {
        let json = serde_json::to_string_pretty(token).context("serialize OAuth token")?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options
            .open(&self.path)
            .await
            .with_context(|| format!("open token store {}", self.path.display()))?;

        // A file left behind by something else keeps its old mode on open.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await
                .with_context(|| format!("restrict permissions of {}", self.path.display()))?;
        }

        file.write_all(json.as_bytes())
            .await
            .with_context(|| format!("write token store {}", self.path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("flush token store {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), "stored OAuth token");
        Ok(())
    }
}
