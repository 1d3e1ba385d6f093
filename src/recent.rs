//! Local, non-sensitive client state
//!
//! Recently viewed properties and the remembered sign-in email, kept in a
//! JSON file under the data directory.

use crate::error::Result;
use crate::models::Property;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum number of recently viewed properties kept
pub const RECENT_LIMIT: usize = 5;

const STATE_FILE: &str = "local-state.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalState {
    #[serde(default)]
    remembered_email: Option<String>,
    #[serde(default)]
    recently_viewed: Vec<Property>,
}

/// File-backed local state
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    /// Store kept in `dir/local-state.json`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(STATE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Newest first
    pub fn recently_viewed(&self) -> Result<Vec<Property>> {
        Ok(self.load()?.recently_viewed)
    }

    /// Record a view: moves the property to the front, drops duplicates, keeps at most five
    pub fn save_viewed(&self, property: &Property) -> Result<Vec<Property>> {
        let mut state = self.load()?;
        state.recently_viewed.retain(|p| p.id != property.id);
        state.recently_viewed.insert(0, property.clone());
        state.recently_viewed.truncate(RECENT_LIMIT);
        self.store(&state)?;
        Ok(state.recently_viewed)
    }

    pub fn remove_viewed(&self, property_id: &str) -> Result<Vec<Property>> {
        let mut state = self.load()?;
        state.recently_viewed.retain(|p| p.id != property_id);
        self.store(&state)?;
        Ok(state.recently_viewed)
    }

    pub fn clear_viewed(&self) -> Result<()> {
        let mut state = self.load()?;
        state.recently_viewed.clear();
        self.store(&state)
    }

    pub fn remembered_email(&self) -> Result<Option<String>> {
        Ok(self.load()?.remembered_email)
    }

    /// Remember `email` for the next sign-in, or forget it with `None`
    pub fn set_remembered_email(&self, email: Option<&str>) -> Result<()> {
        let mut state = self.load()?;
        state.remembered_email = email.map(str::to_string);
        self.store(&state)
    }

    fn load(&self) -> Result<LocalState> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw).unwrap_or_else(|err| {
                log::warn!("Resetting unreadable local state {:?}: {}", self.path, err);
                LocalState::default()
            })),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(LocalState::default()),
            Err(err) => Err(err.into()),
        }
    }

    fn store(&self, state: &LocalState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(state)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{LocalStore, RECENT_LIMIT};
    use crate::models::Property;
    use tempfile::tempdir;

    fn property(id: &str) -> Property {
        Property {
            id: id.to_string(),
            ..Property::default()
        }
    }

    #[test]
    fn save_viewed_dedupes_and_caps() {
        let temp = tempdir().expect("tempdir");
        let store = LocalStore::in_dir(temp.path());
        for id in ["a", "b", "c", "d", "e", "f"] {
            store.save_viewed(&property(id)).expect("saved");
        }
        let recent = store.save_viewed(&property("c")).expect("saved");
        let ids: Vec<&str> = recent.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "f", "e", "d", "b"]);
        assert_eq!(recent.len(), RECENT_LIMIT);
    }

    #[test]
    fn remove_and_clear_viewed() {
        let temp = tempdir().expect("tempdir");
        let store = LocalStore::in_dir(temp.path());
        store.save_viewed(&property("a")).expect("saved");
        store.save_viewed(&property("b")).expect("saved");
        let recent = store.remove_viewed("a").expect("removed");
        assert_eq!(recent.len(), 1);
        store.clear_viewed().expect("cleared");
        assert!(store.recently_viewed().expect("loaded").is_empty());
    }

    #[test]
    fn remembered_email_round_trip() {
        let temp = tempdir().expect("tempdir");
        let store = LocalStore::in_dir(&temp.path().join("nested"));
        assert_eq!(store.remembered_email().expect("loaded"), None);
        store
            .set_remembered_email(Some("ada@example.com"))
            .expect("saved");
        assert_eq!(
            store.remembered_email().expect("loaded").as_deref(),
            Some("ada@example.com")
        );
        store.set_remembered_email(None).expect("cleared");
        assert_eq!(store.remembered_email().expect("loaded"), None);
    }
}
