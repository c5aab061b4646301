use std::collections::{BTreeMap, VecDeque};

use log::warn;

use pedigree::{FamilyNode, PersonNode};

use crate::error::SosaError;

/// Deepest generation whose Sosa numbers all fit within a `u64`
/// (generation `g` spans numbers `2^g ..= 2^(g+1) - 1`). BFS expansion
/// stops here and flags the cache as overflowed instead of wrapping.
pub const MAX_GENERATION: u64 = 63;

/// Upper bound on enqueued ancestor paths. Ancestral loops make the path
/// count diverge; the BFS stops there and flags the cache instead.
const MAX_PATHS: usize = 1 << 20;

/// Ancestor numbering for one root: root = 1, father of `n` = `2n`,
/// mother of `n` = `2n + 1`. A person reached through several ancestor
/// paths records every number. Once built, a cache is immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SosaCache {
    pub root_id: usize,
    /// Ascending, deduplicated numbers per person.
    pub numbers_by_person: BTreeMap<usize, Vec<u64>>,
    pub min_number: BTreeMap<usize, u64>,
    pub max_generation: u64,
    /// True when the pedigree reached past [`MAX_GENERATION`].
    pub overflowed: bool,
}

impl SosaCache {
    /// Minimal Sosa number of `person_id`, if it is an ancestor of the root.
    pub fn get_number(&self, person_id: usize) -> Option<u64> {
        self.min_number.get(&person_id).copied()
    }

    /// Every Sosa number of `person_id`, ascending.
    pub fn numbers(&self, person_id: usize) -> &[u64] {
        self.numbers_by_person
            .get(&person_id)
            .map_or(&[], Vec::as_slice)
    }
}

/// Build the Sosa cache for `root_id` by BFS along the
/// `child -> origin family -> parent` edges.
///
/// # Errors
/// [`SosaError::MissingRoot`] when the root has no entry in the snapshot.
pub fn build_sosa_cache(
    persons: &BTreeMap<usize, PersonNode>,
    families: &BTreeMap<usize, FamilyNode>,
    root_id: usize,
) -> Result<SosaCache, SosaError> {
    if !persons.contains_key(&root_id) {
        return Err(SosaError::MissingRoot);
    }

    let mut cache = SosaCache {
        root_id,
        numbers_by_person: BTreeMap::new(),
        min_number: BTreeMap::new(),
        max_generation: 0,
        overflowed: false,
    };

    let mut queue: VecDeque<(usize, u64, u64)> = VecDeque::new();
    queue.push_back((root_id, 1, 0));
    let mut processed: usize = 0;

    while let Some((person_id, number, generation)) = queue.pop_front() {
        processed += 1;
        if processed > MAX_PATHS {
            warn!("Sosa numbering for root {root_id} truncated after {MAX_PATHS} ancestor paths");
            cache.overflowed = true;
            break;
        }
        insert_number(&mut cache, person_id, number);
        cache.max_generation = cache.max_generation.max(generation);

        let parents = persons
            .get(&person_id)
            .and_then(|node| node.origin_family)
            .and_then(|family_id| families.get(&family_id))
            .map_or([None, None], FamilyNode::parent_slots);

        if parents == [None, None] {
            continue;
        }
        if generation == MAX_GENERATION {
            if !cache.overflowed {
                warn!(
                    "Sosa numbering for root {root_id} truncated at generation {MAX_GENERATION}"
                );
            }
            cache.overflowed = true;
            continue;
        }

        // Father doubles the number, mother doubles it plus one.
        for (slot, parent) in parents.into_iter().enumerate() {
            let Some(parent) = parent else { continue };
            if !persons.contains_key(&parent) {
                continue;
            }
            queue.push_back((parent, 2 * number + slot as u64, generation + 1));
        }
    }

    Ok(cache)
}

fn insert_number(cache: &mut SosaCache, person_id: usize, number: u64) {
    let numbers = cache.numbers_by_person.entry(person_id).or_default();
    if let Err(position) = numbers.binary_search(&number) {
        numbers.insert(position, number);
    }
    cache
        .min_number
        .entry(person_id)
        .and_modify(|current| *current = (*current).min(number))
        .or_insert(number);
}

/// Navigation badge: one person, its minimal Sosa number rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SosaBadge {
    pub person_id: usize,
    pub label: String,
}

/// Badges for the requested persons, skipping the ones the cache does not
/// number. Order follows `person_ids`.
pub fn summarize_numbers(cache: &SosaCache, person_ids: &[usize]) -> Vec<SosaBadge> {
    person_ids
        .iter()
        .filter_map(|&person_id| {
            cache.get_number(person_id).map(|number| SosaBadge {
                person_id,
                label: number.to_string(),
            })
        })
        .collect()
}
