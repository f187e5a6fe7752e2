//! `localStorage` behind the shared [`SessionStorage`] seam.

use gloo_storage::{LocalStorage, Storage};
use shared::session::{SessionStorage, SessionStore, StorageError};

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

impl SessionStorage for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        LocalStorage::raw().get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|err| StorageError::Write {
                key: key.to_string(),
                reason: format!("{err:?}"),
            })
    }

    fn remove(&self, key: &str) {
        if LocalStorage::raw().remove_item(key).is_err() {
            log::warn!("failed to remove `{key}` from localStorage");
        }
    }
}

pub fn session_store() -> SessionStore<BrowserStorage> {
    SessionStore::new(BrowserStorage)
}
