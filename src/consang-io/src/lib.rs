use std::collections::BTreeMap;

use ahash::AHashMap;

use pedigree::{Family, Person, Warning};

pub mod read;
pub use read::{load_pedigree_file, LoaderError};

pub mod write;
pub use write::{PedigreeEmitter, EmitterError};

pub mod settings;
pub use settings::{SettingsError, YamlSettings};

/// One loaded pedigree: domain records keyed by their string keys, the
/// bidirectional `key <-> index` maps, and the per-database diagnostics
/// lists filled by the loader and the consanguinity kernel.
#[derive(Debug, Clone, Default)]
pub struct Database {
    pub persons: BTreeMap<String, Person>,
    pub families: Vec<Family>,
    pub key_to_index: AHashMap<String, usize>,
    pub index_to_key: BTreeMap<usize, String>,
    pub consanguinity_errors: Vec<String>,
    pub consanguinity_warnings: Vec<Warning>,
}

impl Database {
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.key_to_index.get(key).copied()
    }

    pub fn person_by_index(&self, index: usize) -> Option<&Person> {
        self.index_to_key.get(&index).and_then(|key| self.persons.get(key))
    }
}
