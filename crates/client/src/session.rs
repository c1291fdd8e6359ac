//! Session credential storage
//!
//! The client never reads credentials from ambient global state. Instead a
//! [`SessionStore`] is injected at construction time; it owns the access and
//! refresh credential pair and exposes atomic get/set/clear operations.
//!
//! Two stores are provided:
//!
//! - [`MemorySessionStore`] keeps the pair in process memory.
//! - [`FileSessionStore`] persists the pair as JSON under the fixed keys
//!   `access_token` and `refresh_token`, with owner-only permissions.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::error::ClientError;
use crate::types::TokenPair;

/// Access and refresh credential pair
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "access_token")]
    pub access: String,
    #[serde(rename = "refresh_token")]
    pub refresh: String,
}

impl Credentials {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

impl From<TokenPair> for Credentials {
    fn from(pair: TokenPair) -> Self {
        Self {
            access: pair.access,
            refresh: pair.refresh,
        }
    }
}

/// Storage for the session credential pair
///
/// Writes are last-writer-wins. `store` and `update_access` replace the pair
/// as a unit, so readers never observe an access credential from one pair
/// combined with the refresh credential of another.
pub trait SessionStore: Send + Sync {
    /// Current credential pair, if a session exists
    fn load(&self) -> Option<Credentials>;

    /// Replace the whole credential pair
    fn store(&self, credentials: Credentials) -> Result<(), ClientError>;

    /// Replace the access credential, keeping the refresh credential
    ///
    /// Fails with [`ClientError::SessionExpired`] if there is no session to update.
    fn update_access(&self, access: String) -> Result<(), ClientError>;

    /// Erase both credentials
    fn clear(&self) -> Result<(), ClientError>;

    /// Stored access credential; an empty string counts as absent
    fn access_token(&self) -> Option<String> {
        self.load().map(|c| c.access).filter(|a| !a.is_empty())
    }

    /// Stored refresh credential; an empty string counts as absent
    fn refresh_token(&self) -> Option<String> {
        self.load().map(|c| c.refresh).filter(|r| !r.is_empty())
    }
}

/// In-memory session store
#[derive(Default)]
pub struct MemorySessionStore {
    current: ArcSwapOption<Credentials>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a session
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            current: ArcSwapOption::from_pointee(credentials),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<Credentials> {
        self.current.load_full().map(|c| (*c).clone())
    }

    fn store(&self, credentials: Credentials) -> Result<(), ClientError> {
        self.current.store(Some(Arc::new(credentials)));
        Ok(())
    }

    fn update_access(&self, access: String) -> Result<(), ClientError> {
        let previous = self.current.rcu(|current| {
            current.as_ref().map(|c| {
                Arc::new(Credentials {
                    access: access.clone(),
                    refresh: c.refresh.clone(),
                })
            })
        });
        if previous.is_none() {
            return Err(ClientError::SessionExpired);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        self.current.store(None);
        Ok(())
    }
}

/// Session store persisted to a JSON file
///
/// The file is read once on [`FileSessionStore::open`]; afterwards reads are
/// served from memory and every write goes through to disk.
pub struct FileSessionStore {
    path: PathBuf,
    current: ArcSwapOption<Credentials>,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    /// Open the store at `path`
    ///
    /// A missing file means no session. So does a file that cannot be
    /// parsed: it is logged and left in place for the next `store` or
    /// `clear` to overwrite or remove.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let current = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| {
                ClientError::Storage(format!("failed to read {}: {e}", path.display()))
            })?;
            match serde_json::from_str::<Credentials>(&contents) {
                Ok(credentials) => Some(Arc::new(credentials)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable session file");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            path,
            current: ArcSwapOption::new(current),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, credentials: &Credentials) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(credentials)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)?;
            file.write_all(contents.as_bytes())?;
        }

        #[cfg(not(unix))]
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.path)?;
            file.write_all(contents.as_bytes())?;
        }

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, ClientError> {
        self.write_lock
            .lock()
            .map_err(|_| ClientError::Storage("session store lock poisoned".into()))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<Credentials> {
        self.current.load_full().map(|c| (*c).clone())
    }

    fn store(&self, credentials: Credentials) -> Result<(), ClientError> {
        let _guard = self.lock()?;
        self.persist(&credentials)?;
        self.current.store(Some(Arc::new(credentials)));
        Ok(())
    }

    fn update_access(&self, access: String) -> Result<(), ClientError> {
        let _guard = self.lock()?;
        let refresh = self
            .current
            .load()
            .as_ref()
            .map(|c| c.refresh.clone())
            .ok_or(ClientError::SessionExpired)?;
        let credentials = Credentials { access, refresh };
        self.persist(&credentials)?;
        self.current.store(Some(Arc::new(credentials)));
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        let _guard = self.lock()?;
        self.current.store(None);
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_replaces_pair() {
        let store = MemorySessionStore::new();
        assert!(store.load().is_none());

        store.store(Credentials::new("A1", "R1")).unwrap();
        store.update_access("A2".into()).unwrap();
        assert_eq!(store.load(), Some(Credentials::new("A2", "R1")));

        store.clear().unwrap();
        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());
    }

    #[test]
    fn update_access_without_session_fails() {
        let store = MemorySessionStore::new();
        let result = store.update_access("A2".into());
        assert!(matches!(result, Err(ClientError::SessionExpired)));
        assert!(store.load().is_none());
    }

    #[test]
    fn file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileSessionStore::open(&path).unwrap();
        assert!(store.load().is_none());
        store.store(Credentials::new("A1", "R1")).unwrap();
        store.update_access("A2".into()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["access_token"], "A2");
        assert_eq!(raw["refresh_token"], "R1");

        let reopened = FileSessionStore::open(&path).unwrap();
        assert_eq!(reopened.load(), Some(Credentials::new("A2", "R1")));

        reopened.clear().unwrap();
        assert!(!path.exists());
        // clearing twice is fine
        reopened.clear().unwrap();
    }

    #[test]
    fn file_store_recovers_from_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        // half-written file
        fs::write(&path, r#"{"access_token": "A1""#).unwrap();

        let store = FileSessionStore::open(&path).unwrap();
        assert!(store.load().is_none());
        assert!(store.access_token().is_none());

        store.store(Credentials::new("A2", "R2")).unwrap();
        let reopened = FileSessionStore::open(&path).unwrap();
        assert_eq!(reopened.load(), Some(Credentials::new("A2", "R2")));

        fs::write(&path, "garbage").unwrap();
        let store = FileSessionStore::open(&path).unwrap();
        store.clear().unwrap();
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileSessionStore::open(&path).unwrap();
        store.store(Credentials::new("A1", "R1")).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn debug_redacts_tokens() {
        let rendered = format!("{:?}", Credentials::new("secret-access", "secret-refresh"));
        assert!(!rendered.contains("secret"));
    }
}
