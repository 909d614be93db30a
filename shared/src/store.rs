//! Named slots in the browser's key-value store.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::config::{CANVAS_KEY, HEADER_KEY_PREFIX, MATH_TEXT_KEY, PAGES_KEY, PARTICIPANTS_KEY};
use crate::snapshot::Snapshot;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage rejected write to {key}: {reason}")]
    Write { key: String, reason: String },
    #[error("failed to encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// String-keyed persistent storage. Absence of a key means "use the default".
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot {
    MathText,
    Canvas,
    Pages,
    Participants,
    Header(String),
}

impl Slot {
    pub fn key(&self) -> Cow<'static, str> {
        match self {
            Slot::MathText => Cow::Borrowed(MATH_TEXT_KEY),
            Slot::Canvas => Cow::Borrowed(CANVAS_KEY),
            Slot::Pages => Cow::Borrowed(PAGES_KEY),
            Slot::Participants => Cow::Borrowed(PARTICIPANTS_KEY),
            Slot::Header(field_id) => Cow::Owned(header_key(field_id)),
        }
    }
}

// Keyed by DOM id, so the stock "header-fecha" field lands in "header-header-fecha".
fn header_key(field_id: &str) -> String {
    format!("{HEADER_KEY_PREFIX}{field_id}")
}

pub fn save_text(
    store: &mut impl KeyValueStore,
    slot: &Slot,
    value: &str,
) -> Result<(), StoreError> {
    store.set(&slot.key(), value)
}

pub fn load_text(store: &impl KeyValueStore, slot: &Slot) -> Option<String> {
    store.get(&slot.key())
}

pub fn clear_slot(store: &mut impl KeyValueStore, slot: &Slot) {
    store.remove(&slot.key());
}

pub fn save_json<T: Serialize + ?Sized>(
    store: &mut impl KeyValueStore,
    slot: &Slot,
    value: &T,
) -> Result<(), StoreError> {
    let key = slot.key();
    let payload = serde_json::to_string(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(&key, &payload)
}

/// Reads a JSON slot. Malformed payloads count as absent.
pub fn load_json<T: DeserializeOwned>(store: &impl KeyValueStore, slot: &Slot) -> Option<T> {
    let key = slot.key();
    let raw = store.get(&key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(error) => {
            log::warn!("ignoring malformed {key}: {error}");
            None
        }
    }
}

pub fn save_snapshot(
    store: &mut impl KeyValueStore,
    snapshot: &Snapshot,
) -> Result<(), StoreError> {
    store.set(&Slot::Canvas.key(), snapshot.as_data_url())
}

pub fn load_snapshot(store: &impl KeyValueStore) -> Option<Snapshot> {
    let raw = store.get(&Slot::Canvas.key())?;
    match Snapshot::from_data_url(raw) {
        Ok(snapshot) => Some(snapshot),
        Err(error) => {
            log::warn!("ignoring stored canvas: {error}");
            None
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}
