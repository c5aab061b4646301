use crate::diagnostics::{Diagnostics, WarningKind};
use crate::family::Family;
use crate::graph::PedigreeGraph;
use crate::node::{FamilyNode, PersonNode};
use crate::person::Person;
use crate::UNKNOWN_INDEX;

/// Project externally supplied person/family records into the node
/// representation consumed by the analytics kernels.
///
/// # Behavior
/// - Indices are assigned deterministically in iteration order, starting
///   at 1. A record supplying a non-zero `key_index` keeps it, so external
///   callers' indices stay stable.
/// - Children back-links (`origin_family`, `union_families`) are resolved
///   by scanning the families exactly once.
/// - Missing references never abort the projection: unresolved parent or
///   child indices become absent slots and a `missing_parent` warning.
///   Duplicate indices are structural errors; the later record is dropped.
pub fn adapt<'a, P, F>(persons: P, families: F) -> (PedigreeGraph, Diagnostics)
where
    P: IntoIterator<Item = &'a Person>,
    F: IntoIterator<Item = &'a Family>,
{
    let mut graph = PedigreeGraph::new();
    let mut diagnostics = Diagnostics::new();

    // ---- Project persons, assigning dense indices in iteration order.
    let mut next_person = 1;
    for person in persons {
        let Some(index) = assign_index(person.key_index, &mut next_person, |id| {
            graph.persons.contains_key(&id)
        }) else {
            diagnostics.error(format!(
                "duplicate index {} assigned to '{}'",
                person.key_index,
                person.key()
            ));
            continue;
        };

        let key = person.key();
        if graph.key_to_index.contains_key(&key) {
            diagnostics.warn(
                WarningKind::DuplicateKey,
                format!("duplicate key '{key}' (index {index}); keeping the first occurrence"),
            );
        } else {
            graph.key_to_index.insert(key.clone(), index);
        }
        graph.index_to_key.insert(index, key.clone());

        let mut node = PersonNode::new(index, &key);
        node.sex = person.sex;
        graph.persons.insert(index, node);
    }

    // ---- Project families and resolve back-links in a single scan.
    let mut next_family = 1;
    for family in families {
        let Some(index) = assign_index(family.key_index, &mut next_family, |id| {
            graph.families.contains_key(&id)
        }) else {
            diagnostics.error(format!("duplicate family index {}", family.key_index));
            continue;
        };

        let father = resolve_parent(&graph, family.parent1, index, &mut diagnostics);
        let mother = resolve_parent(&graph, family.parent2, index, &mut diagnostics);

        let mut children = Vec::with_capacity(family.children.len());
        for &child in &family.children {
            if graph.persons.contains_key(&child) {
                children.push(child);
            } else {
                diagnostics.warn(
                    WarningKind::MissingParent,
                    format!("family {index}: child index {child} does not resolve"),
                );
            }
        }

        for &child in &children {
            let node = graph.persons.get_mut(&child).expect("Resolved child should exist");
            if node.origin_family.is_none() {
                node.origin_family = Some(index);
            }
        }
        for parent in [father, mother].into_iter().flatten() {
            graph
                .persons
                .get_mut(&parent)
                .expect("Resolved parent should exist")
                .union_families
                .push(index);
        }

        graph.families.insert(index, FamilyNode::new(index, father, mother, children));
    }

    (graph, diagnostics)
}

/// Pick the record's own non-zero index, or the next free auto-assigned
/// one. `None` signals a duplicate explicit index.
fn assign_index(
    explicit: usize,
    next: &mut usize,
    taken: impl Fn(usize) -> bool,
) -> Option<usize> {
    if explicit != UNKNOWN_INDEX {
        return (!taken(explicit)).then_some(explicit);
    }
    while taken(*next) {
        *next += 1;
    }
    let index = *next;
    *next += 1;
    Some(index)
}

fn resolve_parent(
    graph: &PedigreeGraph,
    reference: usize,
    family_index: usize,
    diagnostics: &mut Diagnostics,
) -> Option<usize> {
    match reference {
        UNKNOWN_INDEX => None,
        id if graph.persons.contains_key(&id) => Some(id),
        id => {
            diagnostics.warn(
                WarningKind::MissingParent,
                format!("family {family_index}: parent index {id} does not resolve"),
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sex::Sex;
    use pretty_assertions::assert_eq;

    fn nuclear_records() -> (Vec<Person>, Vec<Family>) {
        let persons = vec![
            Person::new("John", "Smith", Sex::Male, 1),
            Person::new("Mary", "Smith", Sex::Female, 2),
            Person::new("Robert", "Smith", Sex::Male, 3),
        ];
        let families = vec![Family::new(1, 1, 2, vec![3])];
        (persons, families)
    }

    #[test]
    fn nuclear_family_back_links() {
        let (persons, families) = nuclear_records();
        let (graph, diagnostics) = adapt(&persons, &families);

        assert!(diagnostics.is_clean());
        assert_eq!(graph.persons[&3].origin_family, Some(1));
        assert_eq!(graph.persons[&1].union_families, vec![1]);
        assert_eq!(graph.persons[&2].union_families, vec![1]);
        assert_eq!(graph.families[&1].parent_slots(), [Some(1), Some(2)]);
    }

    #[test]
    fn preserves_external_indices_and_fills_gaps() {
        let persons = vec![
            Person::new("With", "Index", Sex::Unknown, 7),
            Person::new("No", "Index", Sex::Unknown, 0),
        ];
        let (graph, diagnostics) = adapt(&persons, &[]);

        assert!(diagnostics.is_clean());
        assert_eq!(graph.index_of("With Index"), Some(7));
        assert_eq!(graph.index_of("No Index"), Some(1));
    }

    #[test]
    fn duplicate_index_is_a_structural_error() {
        let persons = vec![
            Person::new("First", "Holder", Sex::Unknown, 4),
            Person::new("Second", "Holder", Sex::Unknown, 4),
        ];
        let (graph, diagnostics) = adapt(&persons, &[]);

        assert_eq!(graph.persons.len(), 1);
        assert_eq!(diagnostics.errors.len(), 1);
        assert!(diagnostics.errors[0].contains("duplicate index 4"));
    }

    #[test]
    fn duplicate_key_keeps_first_mapping() {
        let persons = vec![
            Person::new("John", "Smith", Sex::Male, 1),
            Person::new("John", "Smith", Sex::Male, 2),
        ];
        let (graph, diagnostics) = adapt(&persons, &[]);

        assert_eq!(graph.index_of("John Smith"), Some(1));
        assert_eq!(diagnostics.warnings.len(), 1);
        assert_eq!(diagnostics.warnings[0].kind, WarningKind::DuplicateKey);
    }

    #[test]
    fn unresolved_references_become_absent_slots() {
        let persons = vec![Person::new("Only", "Child", Sex::Unknown, 1)];
        let families = vec![Family::new(1, 99, 0, vec![1, 88])];
        let (graph, diagnostics) = adapt(&persons, &families);

        let family = &graph.families[&1];
        assert_eq!(family.parent_slots(), [None, None]);
        assert_eq!(family.children, vec![1]);
        assert_eq!(diagnostics.warnings.len(), 2);
        assert!(diagnostics
            .warnings
            .iter()
            .all(|w| w.kind == WarningKind::MissingParent));
    }

    #[test]
    fn origin_family_keeps_first_listing() {
        let persons = vec![Person::new("Shared", "Child", Sex::Unknown, 1)];
        let families = vec![
            Family::new(1, 0, 0, vec![1]),
            Family::new(2, 0, 0, vec![1]),
        ];
        let (graph, _) = adapt(&persons, &families);
        assert_eq!(graph.persons[&1].origin_family, Some(1));
    }
}
