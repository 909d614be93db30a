use web_sys::{Storage, Window};

use sheetboard_shared::store::StoreError;
use sheetboard_shared::KeyValueStore;

/// `window.localStorage`. Private browsing modes may deny access entirely,
/// in which case reads come back empty and writes fail.
#[derive(Clone)]
pub struct LocalStore {
    storage: Option<Storage>,
}

impl LocalStore {
    pub fn open(window: &Window) -> Self {
        let storage = window.local_storage().ok().flatten();
        if storage.is_none() {
            log::warn!("localStorage unavailable; nothing will be persisted");
        }
        Self { storage }
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let Some(storage) = self.storage.as_ref() else {
            return Err(StoreError::Write {
                key: key.to_string(),
                reason: "storage unavailable".to_string(),
            });
        };
        storage
            .set_item(key, value)
            .map_err(|err| StoreError::Write {
                key: key.to_string(),
                reason: format!("{err:?}"),
            })
    }

    fn remove(&mut self, key: &str) {
        if let Some(storage) = self.storage.as_ref() {
            let _ = storage.remove_item(key);
        }
    }
}
