//! On-disk cache of the provider's access token
//!
//! Lets a later process pick up the session a previous `login` created.

use crate::abstractions::Identity;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// What gets written to disk after a successful sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub identity: Identity,
    pub saved_at: DateTime<Utc>,
}

impl CachedSession {
    pub fn new(access_token: String, refresh_token: Option<String>, identity: Identity) -> Self {
        Self {
            access_token,
            refresh_token,
            identity,
            saved_at: Utc::now(),
        }
    }
}

/// JSON file holding at most one cached session
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self, session: &CachedSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// Cached session, or `None` when nothing has been saved
    pub async fn load(&self) -> Result<Option<CachedSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path).await?;
        let session = serde_json::from_str(&json)
            .with_context(|| format!("Corrupt session cache at {}", self.path.display()))?;
        Ok(Some(session))
    }

    pub async fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_cache_round_trip_and_clear() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SessionCache::new(temp_dir.path().join("nested").join("session.json"));
        assert_eq!(cache.load().await.unwrap(), None);

        let session = CachedSession::new(
            "token-abc".to_string(),
            Some("refresh-xyz".to_string()),
            Identity::new("u1", Some("tom@fund.vc".to_string())),
        );
        cache.save(&session).await.unwrap();
        assert_eq!(cache.load().await.unwrap(), Some(session));

        cache.clear().await.unwrap();
        assert!(!cache.path().exists());
        assert_eq!(cache.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        std::fs::write(&path, "{ definitely not json").unwrap();

        let err = SessionCache::new(path).load().await.unwrap_err();
        assert!(err.to_string().contains("Corrupt session cache"));
    }
}
