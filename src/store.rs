//! Saving and loading compositions.
//!
//! A [`Composition`] is a single-layer snapshot: the take's notes plus the
//! instrument, effect configs, and tempo they were played with. It is
//! independent of the live layer store. The [`CompositionLibrary`] keeps a
//! named collection of them as one JSON array under a single key in a
//! [`KeyValueStore`], so any flat string store (a file, a browser-style
//! local store, a test map) can back it.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::effects::EffectConfig;
use crate::session::layers::NoteEvent;
use crate::voice::Instrument;

/// Bumped whenever the serialized shape changes incompatibly.
pub const SCHEMA_VERSION: u32 = 1;

const LIBRARY_KEY: &str = "looplab.compositions";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage rejected the write (out of space?)")]
    Full,

    #[error("malformed composition data: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported schema version {found} (this build reads {SCHEMA_VERSION})")]
    UnsupportedVersion { found: u32 },
}

/// One saved composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub schema_version: u32,
    pub name: String,
    pub notes: Vec<NoteEvent>,
    pub instrument: Instrument,
    pub effects: Vec<EffectConfig>,
    pub tempo_bpm: f32,
    /// Unix epoch milliseconds at save time.
    pub timestamp_ms: u64,
}

/// Wall-clock stamp for a new composition.
pub fn timestamp_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Flat string storage the library persists into.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str);
}

/// In-memory store, for tests and for running without persistence.
#[derive(Default)]
pub struct MemoryStore {
    map: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.map.insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.map.remove(key);
    }
}

/// Named collection of compositions over a key-value store.
pub struct CompositionLibrary<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> CompositionLibrary<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn load_all(&self) -> Result<Vec<Composition>, StoreError> {
        match self.store.get(LIBRARY_KEY) {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn persist(&mut self, compositions: &[Composition]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(compositions)?;
        self.store.set(LIBRARY_KEY, raw)
    }

    /// Save under `composition.name`, replacing any existing entry with
    /// that name.
    pub fn save(&mut self, composition: Composition) -> Result<(), StoreError> {
        let mut all = self.load_all()?;
        all.retain(|c| c.name != composition.name);
        all.push(composition);
        self.persist(&all)
    }

    /// Load by name, verifying the schema version before handing it back.
    pub fn load(&self, name: &str) -> Result<Option<Composition>, StoreError> {
        let all = self.load_all()?;
        match all.into_iter().find(|c| c.name == name) {
            Some(c) if c.schema_version != SCHEMA_VERSION => Err(StoreError::UnsupportedVersion {
                found: c.schema_version,
            }),
            other => Ok(other),
        }
    }

    pub fn list_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.load_all()?.into_iter().map(|c| c.name).collect())
    }

    pub fn delete(&mut self, name: &str) -> Result<bool, StoreError> {
        let mut all = self.load_all()?;
        let before = all.len();
        all.retain(|c| c.name != name);
        let removed = all.len() != before;
        if removed {
            if all.is_empty() {
                self.store.remove(LIBRARY_KEY);
            } else {
                self.persist(&all)?;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composition(name: &str) -> Composition {
        Composition {
            schema_version: SCHEMA_VERSION,
            name: name.to_owned(),
            notes: Vec::new(),
            instrument: Instrument::Piano,
            effects: Vec::new(),
            tempo_bpm: 120.0,
            timestamp_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn save_load_and_list() {
        let mut library = CompositionLibrary::new(MemoryStore::new());
        library.save(composition("first")).unwrap();
        library.save(composition("second")).unwrap();

        assert_eq!(library.list_names().unwrap(), vec!["first", "second"]);
        let loaded = library.load("first").unwrap().unwrap();
        assert_eq!(loaded.instrument, Instrument::Piano);
        assert!(library.load("missing").unwrap().is_none());
    }

    #[test]
    fn save_replaces_same_name() {
        let mut library = CompositionLibrary::new(MemoryStore::new());
        library.save(composition("take")).unwrap();

        let mut updated = composition("take");
        updated.tempo_bpm = 90.0;
        library.save(updated).unwrap();

        assert_eq!(library.list_names().unwrap().len(), 1);
        let loaded = library.load("take").unwrap().unwrap();
        assert!((loaded.tempo_bpm - 90.0).abs() < 1e-6);
    }

    #[test]
    fn delete_removes_and_reports() {
        let mut library = CompositionLibrary::new(MemoryStore::new());
        library.save(composition("gone")).unwrap();
        assert!(library.delete("gone").unwrap());
        assert!(!library.delete("gone").unwrap());
        assert!(library.list_names().unwrap().is_empty());
    }

    #[test]
    fn future_schema_version_is_rejected() {
        let mut library = CompositionLibrary::new(MemoryStore::new());
        let mut from_the_future = composition("v2");
        from_the_future.schema_version = SCHEMA_VERSION + 1;
        library.save(from_the_future).unwrap();

        assert!(matches!(
            library.load("v2"),
            Err(StoreError::UnsupportedVersion { found }) if found == SCHEMA_VERSION + 1
        ));
    }

    #[test]
    fn malformed_payload_surfaces_parse_error() {
        let mut store = MemoryStore::new();
        store.set(LIBRARY_KEY, "not json at all".to_owned()).unwrap();
        let library = CompositionLibrary::new(store);
        assert!(matches!(library.load("x"), Err(StoreError::Malformed(_))));
    }
}
