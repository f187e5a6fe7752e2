//! Session storage in a small JSON file under the user config directory.

use directories::BaseDirs;
use shared::session::{SessionStorage, SessionStore, StorageError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// `<config dir>/ayna/session.json`, or a file in the working directory when
/// no home directory is known.
pub fn session_path() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().join("ayna").join("session.json"))
        .unwrap_or_else(|| PathBuf::from("./ayna-session.json"))
}

pub fn session_store() -> SessionStore<FileStorage> {
    SessionStore::new(FileStorage::new(session_path()))
}

/// Key/value entries persisted as one JSON object, readable only by the owner.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage backed by `path`. Nothing is read or created until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> BTreeMap<String, String> {
        let Ok(contents) = fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };
        serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!(path = %self.path.display(), %err, "ignoring unreadable session file");
            BTreeMap::new()
        })
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), String> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.to_string()),
                _ => Ok(()),
            };
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| err.to_string())?;
        }
        let body = serde_json::to_string_pretty(entries).map_err(|err| err.to_string())?;
        fs::write(&self.path, body).map_err(|err| err.to_string())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(|err| err.to_string())?;
        }
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.read().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.read();
        entries.insert(key.to_string(), value.to_string());
        self.write(&entries).map_err(|reason| StorageError::Write {
            key: key.to_string(),
            reason,
        })
    }

    fn remove(&self, key: &str) {
        let mut entries = self.read();
        if entries.remove(key).is_some() {
            if let Err(reason) = self.write(&entries) {
                warn!(key, %reason, "failed to remove session entry");
            }
        }
    }
}
