//! Access-token persistence
//!
//! The access token behaves like a short-lived, client-readable cookie: it is
//! written with an expiry and reads as absent once that expiry has passed.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Backing storage for the access token
pub trait TokenStore: Send + Sync + fmt::Debug {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Process-local store, used when no token file is configured
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    value: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredCookie {
    value: String,
    expires_at: u64,
}

/// JSON file holding the token and its expiry
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
    ttl: Duration,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let cookie: StoredCookie = match serde_json::from_str(&raw) {
            Ok(cookie) => cookie,
            Err(err) => {
                log::warn!("Ignoring unreadable token file {:?}: {}", self.path, err);
                return Ok(None);
            }
        };
        if cookie.expires_at <= unix_now() {
            log::debug!("Stored access token expired");
            return Ok(None);
        }
        Ok(Some(cookie.value))
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let cookie = StoredCookie {
            value: token.to_string(),
            expires_at: unix_now() + self.ttl.as_secs(),
        };
        // replace atomically
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec(&cookie)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
