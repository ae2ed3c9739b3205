//! File-backed token provider
//!
//! Shares one access token between processes through a small JSON file. A
//! tokio Mutex makes refresh single-flight within the process: callers that
//! queue behind a refresh find the fresh token in the file and `store` it
//! without another round-trip.
//!
//! Writes use temp-file + rename so a concurrent reader never sees a
//! truncated file.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::strategy::{TokenCallbacks, TokenProvider};

/// Token cache file contents.
///
/// `updated_at` is a unix timestamp in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    pub updated_at: u64,
}

pub struct FileTokenProvider {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenProvider {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cache file. A missing file is `Ok(None)`.
    pub async fn load(&self) -> Result<Option<CachedToken>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(format!("reading token cache: {e}"))),
        };
        let cached = serde_json::from_str(&contents)
            .map_err(|e| Error::TokenParse(format!("parsing token cache: {e}")))?;
        Ok(Some(cached))
    }

    async fn resolve(&self, current_token: Option<String>, callbacks: &TokenCallbacks<'_>) -> Result<()> {
        let _guard = self.lock.lock().await;

        if let Some(cached) = self.load().await?
            && current_token.as_deref() != Some(cached.access_token.as_str())
        {
            debug!(path = %self.path.display(), "using token from cache file");
            callbacks.store(cached.access_token).await;
            return Ok(());
        }

        let access_token = callbacks.refresh().await?;
        let cached = CachedToken {
            access_token: access_token.clone(),
            updated_at: now_millis(),
        };
        write_atomic(&self.path, &cached).await?;
        info!(path = %self.path.display(), "refreshed token written to cache file");
        callbacks.store(access_token).await;
        Ok(())
    }
}

impl TokenProvider for FileTokenProvider {
    fn authenticate<'a>(
        &'a self,
        current_token: Option<String>,
        callbacks: &'a TokenCallbacks<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.resolve(current_token, callbacks))
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Write the cache file atomically with 0600 permissions on unix.
async fn write_atomic(path: &Path, data: &CachedToken) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::TokenParse(format!("serializing token cache: {e}")))?;

    let dir = path.parent().ok_or_else(|| {
        Error::TokenProvider(format!(
            "token cache path {} has no parent directory",
            path.display()
        ))
    })?;

    let tmp_path = dir.join(format!(".token-cache.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp token cache: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting token cache permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp token cache: {e}")))?;

    debug!(path = %path.display(), "persisted token cache");
    Ok(())
}
