use std::collections::BTreeMap;

use ahash::AHashMap;
use log::debug;

use pedigree::{FamilyNode, PersonNode};

mod cache;
pub use cache::{build_sosa_cache, summarize_numbers, SosaBadge, SosaCache, MAX_GENERATION};

mod error;
pub use error::SosaError;

/// Environment variable naming the Sosa root index.
pub const SOSA_ROOT_ENV: &str = "SOSA_ROOT";

/// Read-only string-keyed configuration capability. The settings file
/// loader, test fixtures and plain maps all satisfy it.
pub trait Settings {
    fn get(&self, key: &str) -> Option<String>;
}

impl Settings for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }
}

/// Resolve the Sosa root index: an explicit override wins over the
/// `SOSA_ROOT` environment variable, which wins over the settings entry
/// `sosa_root`. Unparsable candidates fall through to the next source.
pub fn resolve_root_id(
    root_override: Option<usize>,
    settings: &dyn Settings,
) -> Option<usize> {
    root_override
        .or_else(|| parse_root(std::env::var(SOSA_ROOT_ENV).ok()))
        .or_else(|| parse_root(settings.get("sosa_root")))
}

fn parse_root(value: Option<String>) -> Option<usize> {
    value.and_then(|raw| raw.trim().parse().ok())
}

/// Per-root Sosa cache manager. Owns the graph snapshot for the lifetime
/// of its caches: replacing the snapshot through [`SosaCacheManager::update_data`]
/// invalidates every cache atomically. Construction and invalidation must
/// be externally serialized; a cache returned by
/// [`SosaCacheManager::get_cache`] is immutable once built.
#[derive(Debug, Default)]
pub struct SosaCacheManager {
    persons: BTreeMap<usize, PersonNode>,
    families: BTreeMap<usize, FamilyNode>,
    caches: AHashMap<usize, SosaCache>,
}

impl SosaCacheManager {
    pub fn new(
        persons: BTreeMap<usize, PersonNode>,
        families: BTreeMap<usize, FamilyNode>,
    ) -> Self {
        Self { persons, families, caches: AHashMap::new() }
    }

    /// Return the cache for `root_id`, lazily building it on first use.
    ///
    /// # Errors
    /// [`SosaError::MissingRoot`] when the root has no entry in the graph.
    pub fn get_cache(&mut self, root_id: usize) -> Result<&SosaCache, SosaError> {
        use std::collections::hash_map::Entry;
        match self.caches.entry(root_id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(slot) => {
                debug!("building Sosa cache for root {root_id}");
                let cache = build_sosa_cache(&self.persons, &self.families, root_id)?;
                Ok(slot.insert(cache))
            }
        }
    }

    /// Invalidate the cache for `root_id` only.
    pub fn drop_cache(&mut self, root_id: usize) {
        self.caches.remove(&root_id);
    }

    /// Replace the underlying graph snapshot, invalidating all caches.
    pub fn update_data(
        &mut self,
        persons: BTreeMap<usize, PersonNode>,
        families: BTreeMap<usize, FamilyNode>,
    ) {
        self.persons = persons;
        self.families = families;
        self.caches.clear();
    }

    /// Resolve the root from the override/environment/settings chain and
    /// return its cache.
    ///
    /// # Errors
    /// [`SosaError::MissingRoot`] when no source yields a usable root.
    pub fn ensure_from_config(
        &mut self,
        root_override: Option<usize>,
        settings: &dyn Settings,
    ) -> Result<&SosaCache, SosaError> {
        let root_id = resolve_root_id(root_override, settings).ok_or(SosaError::MissingRoot)?;
        self.get_cache(root_id)
    }
}
