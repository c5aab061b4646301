use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::node::{FamilyNode, PersonNode};

/// Minimal read-only capability over an adapted pedigree. The analytics
/// kernels depend on this trait rather than on [`PedigreeGraph`], so test
/// fixtures and converters can supply graphs without going through the
/// adapter.
pub trait PedigreeView {
    fn person(&self, id: usize) -> Option<&PersonNode>;
    fn family(&self, id: usize) -> Option<&FamilyNode>;
    /// Person indices, ascending.
    fn person_ids(&self) -> Vec<usize>;
    /// Family indices, ascending.
    fn family_ids(&self) -> Vec<usize>;
}

/// Flat, index-keyed stores for one pedigree snapshot, plus the
/// bidirectional `key <-> index` maps. All cross-references are by index.
#[derive(Debug, Clone, Default)]
pub struct PedigreeGraph {
    pub persons: BTreeMap<usize, PersonNode>,
    pub families: BTreeMap<usize, FamilyNode>,
    pub key_to_index: AHashMap<String, usize>,
    pub index_to_key: AHashMap<usize, String>,
}

impl PedigreeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.key_to_index.get(key).copied()
    }

    pub fn key_of(&self, id: usize) -> Option<&str> {
        self.index_to_key.get(&id).map(String::as_str)
    }
}

impl PedigreeView for PedigreeGraph {
    fn person(&self, id: usize) -> Option<&PersonNode> {
        self.persons.get(&id)
    }

    fn family(&self, id: usize) -> Option<&FamilyNode> {
        self.families.get(&id)
    }

    fn person_ids(&self) -> Vec<usize> {
        self.persons.keys().copied().collect()
    }

    fn family_ids(&self) -> Vec<usize> {
        self.families.keys().copied().collect()
    }
}
