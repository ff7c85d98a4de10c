//! Session persistence
//!
//! Sessions are kept either as a JSON file in the user's data directory or
//! in memory (tests, per-request sessions in the HTTP console).

use super::Session;
use crate::error::{ConsoleError, Result};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Where a session lives between commands
pub enum SessionStore {
    /// JSON file on disk
    File(PathBuf),
    /// Process memory only
    Memory(RwLock<Option<Session>>),
}

impl SessionStore {
    /// File-backed store at `path`
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// In-memory store seeded with `session`
    pub fn memory(session: Option<Session>) -> Self {
        Self::Memory(RwLock::new(session))
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Memory(_) => None,
        }
    }

    /// Load the stored session
    ///
    /// A missing file is not an error; it simply means nobody signed in.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<Session>> {
        match self {
            Self::File(path) => {
                if !path.exists() {
                    return Ok(None);
                }
                let contents = std::fs::read_to_string(path)?;
                let session = serde_json::from_str(&contents).map_err(|e| {
                    ConsoleError::Session(format!(
                        "Stored session at {} is corrupt ({}); sign in again",
                        path.display(),
                        e
                    ))
                })?;
                Ok(Some(session))
            }
            Self::Memory(lock) => Ok(lock
                .read()
                .map_err(|_| ConsoleError::Session("Session lock poisoned".to_string()))?
                .clone()),
        }
    }

    /// Persist `session`, replacing any previous one
    pub fn save(&self, session: &Session) -> Result<()> {
        match self {
            Self::File(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                let json = serde_json::to_string_pretty(session)?;
                std::fs::write(path, json)?;
                restrict_permissions(path)?;
                tracing::debug!("Saved session to {}", path.display());
                Ok(())
            }
            Self::Memory(lock) => {
                *lock
                    .write()
                    .map_err(|_| ConsoleError::Session("Session lock poisoned".to_string()))? =
                    Some(session.clone());
                Ok(())
            }
        }
    }

    /// Forget the stored session
    pub fn clear(&self) -> Result<()> {
        match self {
            Self::File(path) => {
                if path.exists() {
                    std::fs::remove_file(path)?;
                    tracing::debug!("Removed session file {}", path.display());
                }
                Ok(())
            }
            Self::Memory(lock) => {
                *lock
                    .write()
                    .map_err(|_| ConsoleError::Session("Session lock poisoned".to_string()))? =
                    None;
                Ok(())
            }
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Identity;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::file(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let store = SessionStore::file(&path);

        let identity = Identity::new("u1", "owner@example.com").with_metadata("chatbotId", "bot-1");
        let session = Session::new("token-1").with_identity(identity);
        store.save(&session).unwrap();
        assert!(path.exists());

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, session);

        store.clear().unwrap();
        assert!(!path.exists());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_corrupt_file_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = SessionStore::file(&path);
        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("corrupt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        SessionStore::file(&path)
            .save(&Session::new("tok"))
            .unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = SessionStore::memory(None);
        assert!(store.path().is_none());
        store.save(&Session::new("tok")).unwrap();
        assert_eq!(store.load().unwrap().unwrap().access_token, "tok");
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
