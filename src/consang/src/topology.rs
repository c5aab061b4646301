use std::collections::BTreeMap;

use ahash::{AHashMap, AHashSet};
use pedigree::{Diagnostics, FamilyNode, PersonNode, WarningKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Resolved parent relation, topological depths and loop marks for one
/// snapshot. Built once per kernel invocation.
#[derive(Debug)]
pub(crate) struct Topology {
    /// Resolved parent slots per person (father, mother). A slot is `None`
    /// when unknown or when the reference failed to resolve.
    pub parents: AHashMap<usize, [Option<usize>; 2]>,
    /// Distance from the founder generation. Founders sit at depth 0.
    pub depths: AHashMap<usize, u32>,
    /// Members of ancestral loops. The kinship recurrence treats them as
    /// founders so the parent relation stays acyclic.
    pub loops: AHashSet<usize>,
    /// Persons carrying at least one dangling parent reference.
    pub dangling: AHashSet<usize>,
}

impl Topology {
    pub fn build(
        persons: &BTreeMap<usize, PersonNode>,
        families: &BTreeMap<usize, FamilyNode>,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut topology = Self {
            parents: AHashMap::with_capacity(persons.len()),
            depths: AHashMap::with_capacity(persons.len()),
            loops: AHashSet::new(),
            dangling: AHashSet::new(),
        };

        topology.resolve_parents(persons, families, diagnostics);

        // ---- Depth pass: color-marking DFS over the parent relation,
        //      visiting persons in ascending index order.
        let mut colors: AHashMap<usize, Color> = AHashMap::with_capacity(persons.len());
        for &id in persons.keys() {
            if colors.get(&id).copied().unwrap_or(Color::White) == Color::White {
                topology.explore(id, &mut colors, persons, diagnostics);
            }
        }
        topology
    }

    /// Resolve each person's parent slots through their origin family,
    /// recording every dangling reference once.
    fn resolve_parents(
        &mut self,
        persons: &BTreeMap<usize, PersonNode>,
        families: &BTreeMap<usize, FamilyNode>,
        diagnostics: &mut Diagnostics,
    ) {
        let mut reported_families: AHashSet<usize> = AHashSet::new();
        let mut reported_refs: AHashSet<(usize, usize)> = AHashSet::new();

        for (&id, node) in persons {
            let slots = match node.origin_family {
                None => [None, None],
                Some(family_id) => match families.get(&family_id) {
                    None => {
                        if reported_families.insert(family_id) {
                            diagnostics.warn(
                                WarningKind::MissingParent,
                                format!(
                                    "person '{}': origin family {family_id} does not resolve",
                                    node.key
                                ),
                            );
                        }
                        self.dangling.insert(id);
                        [None, None]
                    }
                    Some(family) => {
                        let mut resolved = [None, None];
                        for (slot, reference) in family.parent_slots().into_iter().enumerate() {
                            resolved[slot] = match reference {
                                None => None,
                                Some(parent) if persons.contains_key(&parent) => Some(parent),
                                Some(parent) => {
                                    if reported_refs.insert((family_id, parent)) {
                                        diagnostics.warn(
                                            WarningKind::MissingParent,
                                            format!(
                                                "family {family_id}: parent index {parent} does not resolve"
                                            ),
                                        );
                                    }
                                    self.dangling.insert(id);
                                    None
                                }
                            };
                        }
                        resolved
                    }
                },
            };
            self.parents.insert(id, slots);
        }
    }

    /// Iterative DFS from `start`. Depths are assigned post-order; hitting
    /// a gray node flags the active stack segment as one ancestral loop.
    fn explore(
        &mut self,
        start: usize,
        colors: &mut AHashMap<usize, Color>,
        persons: &BTreeMap<usize, PersonNode>,
        diagnostics: &mut Diagnostics,
    ) {
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        colors.insert(start, Color::Gray);

        loop {
            let (node, slot) = match stack.last_mut() {
                None => break,
                Some(frame) => {
                    let current = *frame;
                    if current.1 < 2 {
                        frame.1 += 1;
                    }
                    current
                }
            };

            if slot >= 2 {
                let depth = self.parents[&node]
                    .iter()
                    .flatten()
                    .filter_map(|parent| self.depths.get(parent).copied())
                    .max()
                    .map_or(0, |deepest| deepest + 1);
                self.depths.insert(node, depth);
                colors.insert(node, Color::Black);
                stack.pop();
                continue;
            }

            let Some(parent) = self.parents[&node][slot] else { continue };
            match colors.get(&parent).copied().unwrap_or(Color::White) {
                Color::White => {
                    colors.insert(parent, Color::Gray);
                    stack.push((parent, 0));
                }
                Color::Gray => self.flag_loop(parent, &stack, persons, diagnostics),
                Color::Black => (),
            }
        }
    }

    /// Mark every individual on the active stack from `first` upward as a
    /// loop member, and emit one warning naming `first`.
    fn flag_loop(
        &mut self,
        first: usize,
        stack: &[(usize, usize)],
        persons: &BTreeMap<usize, PersonNode>,
        diagnostics: &mut Diagnostics,
    ) {
        let Some(position) = stack.iter().position(|&(member, _)| member == first) else {
            return;
        };
        for &(member, _) in &stack[position..] {
            self.loops.insert(member);
        }
        let key = persons
            .get(&first)
            .map_or_else(|| first.to_string(), |node| node.key.clone());
        diagnostics.warn(
            WarningKind::AncestralLoop,
            format!("ancestral loop detected involving '{key}'"),
        );
    }

    pub fn depth(&self, id: usize) -> u32 {
        self.depths.get(&id).copied().unwrap_or(0)
    }
}
