use std::collections::BTreeMap;

use ahash::{AHashMap, AHashSet};
use log::{debug, trace};

use pedigree::{
    adapt, ConsangAnnotation, ConsanguinityIssue, Diagnostics, Family, FamilyNode, Person,
    PersonNode,
};

mod topology;
use topology::Topology;

mod kinship;
use kinship::KinshipSolver;

/// Result of one kernel invocation: the coefficient of every person in the
/// snapshot, plus the diagnostics gathered along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeOutcome {
    pub coefficients: BTreeMap<usize, f64>,
    pub diagnostics: Diagnostics,
}

/// Compute the consanguinity coefficient of every person in the snapshot,
/// writing the `annotation` slots in place.
///
/// `F(x)` is the probability that the two alleles at a random locus in `x`
/// are identical by descent: `F(x) = K(father(x), mother(x))` when both
/// parents are known, `0.0` otherwise. Persons on an ancestral loop or
/// carrying a dangling parent reference get `0.0` with their
/// `consanguinity_issue` set accordingly.
///
/// With `from_scratch` every person is recomputed. Otherwise only persons
/// whose annotation is not `known` are recomputed, together with every
/// descendant depending on them. Data defects never abort the computation;
/// they are recorded in the returned [`Diagnostics`].
///
/// Contributions halve at each generation, so ancestral paths longer than
/// the mantissa of an IEEE-754 double underflow to `0.0` rather than
/// raising a diagnostic.
pub fn compute(
    persons: &mut BTreeMap<usize, PersonNode>,
    families: &BTreeMap<usize, FamilyNode>,
    from_scratch: bool,
) -> ComputeOutcome {
    let mut diagnostics = Diagnostics::new();
    let topology = Topology::build(persons, families, &mut diagnostics);

    // ---- Pick the recomputation targets and invalidate their annotations.
    let targets: AHashSet<usize> = if from_scratch {
        persons.keys().copied().collect()
    } else {
        stale_closure(persons, families)
    };
    debug!("consanguinity refresh: {} of {} persons targeted", targets.len(), persons.len());
    for id in &targets {
        persons.get_mut(id).expect("Target should come from the store").annotation.reset();
    }

    // ---- Seed the solver with the coefficients that remain valid.
    let seeds: AHashMap<usize, f64> = persons
        .iter()
        .filter(|(_, node)| node.annotation.known)
        .map(|(&id, node)| (id, node.annotation.coefficient))
        .collect();
    let mut solver = KinshipSolver::new(&topology, seeds);

    // ---- Loop members are settled first: 0.0, known, flagged.
    for (&id, node) in persons.iter_mut() {
        if topology.loops.contains(&id) {
            node.annotation.set(0.0, ConsanguinityIssue::AncestralLoop);
            solver.record(id, 0.0);
        }
    }

    // ---- Bottom-up coefficient pass over the targets, founders first.
    let mut order: Vec<usize> = targets
        .iter()
        .copied()
        .filter(|id| !topology.loops.contains(id))
        .collect();
    order.sort_unstable_by_key(|&id| (topology.depth(id), id));

    for id in order {
        let coefficient = match topology.parents[&id] {
            [Some(father), Some(mother)] => solver.kinship(father, mother),
            _ => 0.0,
        };
        let issue = if topology.dangling.contains(&id) {
            ConsanguinityIssue::MissingParent
        } else {
            ConsanguinityIssue::None
        };
        trace!("F({id}) = {coefficient}");
        solver.record(id, coefficient);
        persons
            .get_mut(&id)
            .expect("Target should come from the store")
            .annotation
            .set(coefficient, issue);
    }

    let coefficients = persons
        .iter()
        .map(|(&id, node)| (id, node.annotation.coefficient))
        .collect();
    ComputeOutcome { coefficients, diagnostics }
}

/// Adapt domain records, run the kernel, and write the annotations back
/// onto the domain persons (matched by `key_index`). Adapter diagnostics
/// are merged into the outcome.
pub fn compute_for_domain(
    persons: &mut BTreeMap<String, Person>,
    families: &[Family],
    from_scratch: bool,
) -> ComputeOutcome {
    let (mut graph, adapt_diagnostics) = adapt(persons.values(), families);

    // ---- Carry the surviving annotations over to the nodes.
    for person in persons.values() {
        if let Some(node) = graph.persons.get_mut(&person.key_index) {
            node.annotation = ConsangAnnotation {
                coefficient: person.consanguinity,
                known: person.consanguinity_known,
                issue: person.consanguinity_issue,
            };
        }
    }

    let mut outcome = compute(&mut graph.persons, &graph.families, from_scratch);

    // ---- Write the refreshed annotations back onto the domain records.
    for person in persons.values_mut() {
        if let Some(node) = graph.persons.get(&person.key_index) {
            person.consanguinity = node.annotation.coefficient;
            person.consanguinity_known = node.annotation.known;
            person.consanguinity_issue = node.annotation.issue;
        }
    }

    let mut diagnostics = adapt_diagnostics;
    diagnostics.merge(outcome.diagnostics);
    outcome.diagnostics = diagnostics;
    outcome
}

/// Persons needing recomputation in incremental mode: every person whose
/// annotation is stale, closed over descendants through the
/// `parent -> family -> children` reverse adjacency.
fn stale_closure(
    persons: &BTreeMap<usize, PersonNode>,
    families: &BTreeMap<usize, FamilyNode>,
) -> AHashSet<usize> {
    let mut children_of: AHashMap<usize, Vec<usize>> = AHashMap::new();
    for family in families.values() {
        for parent in family.parent_slots().into_iter().flatten() {
            children_of
                .entry(parent)
                .or_default()
                .extend(family.children.iter().copied().filter(|child| persons.contains_key(child)));
        }
    }

    let mut closure: AHashSet<usize> = persons
        .iter()
        .filter(|(_, node)| !node.annotation.known)
        .map(|(&id, _)| id)
        .collect();
    let mut queue: Vec<usize> = closure.iter().copied().collect();
    while let Some(id) = queue.pop() {
        for &child in children_of.get(&id).map_or(&[][..], Vec::as_slice) {
            if closure.insert(child) {
                queue.push(child);
            }
        }
    }
    closure
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedigree::{Sex, WarningKind};
    use pretty_assertions::assert_eq;

    /// Build node stores from `(person, origin_family)` pairs and
    /// `(family, father, mother, children)` tuples.
    fn node_stores(
        persons: &[(usize, Option<usize>)],
        families: &[(usize, Option<usize>, Option<usize>, &[usize])],
    ) -> (BTreeMap<usize, PersonNode>, BTreeMap<usize, FamilyNode>) {
        let persons = persons
            .iter()
            .map(|&(id, origin)| {
                let mut node = PersonNode::new(id, &format!("P{id}"));
                node.origin_family = origin;
                (id, node)
            })
            .collect();
        let families = families
            .iter()
            .map(|&(id, father, mother, children)| {
                (id, FamilyNode::new(id, father, mother, children.to_vec()))
            })
            .collect();
        (persons, families)
    }

    fn first_cousin_stores() -> (BTreeMap<usize, PersonNode>, BTreeMap<usize, FamilyNode>) {
        // 1, 2: grandparents | 3, 4: their children | 5, 6: spouses
        // 7, 8: first cousins | 9: child of the cousin union
        node_stores(
            &[
                (1, None),
                (2, None),
                (3, Some(1)),
                (4, Some(1)),
                (5, None),
                (6, None),
                (7, Some(2)),
                (8, Some(3)),
                (9, Some(4)),
            ],
            &[
                (1, Some(1), Some(2), &[3, 4]),
                (2, Some(3), Some(5), &[7]),
                (3, Some(6), Some(4), &[8]),
                (4, Some(7), Some(8), &[9]),
            ],
        )
    }

    #[test]
    fn nuclear_family_has_zero_coefficients() {
        let (mut persons, families) =
            node_stores(&[(1, None), (2, None), (3, Some(1))], &[(1, Some(1), Some(2), &[3])]);
        let outcome = compute(&mut persons, &families, true);

        assert!(outcome.diagnostics.is_clean());
        for id in [1, 2, 3] {
            assert_eq!(outcome.coefficients[&id], 0.0);
            assert!(persons[&id].annotation.known);
            assert_eq!(persons[&id].annotation.issue, ConsanguinityIssue::None);
        }
    }

    #[test]
    fn first_cousin_child_is_one_sixteenth() {
        let (mut persons, families) = first_cousin_stores();
        let outcome = compute(&mut persons, &families, true);

        assert!(outcome.diagnostics.is_clean());
        assert_eq!(outcome.coefficients[&9], 0.0625);
        for id in 1..=8 {
            assert_eq!(outcome.coefficients[&id], 0.0);
        }
    }

    #[test]
    fn half_sibling_child_is_one_eighth() {
        // 1: shared father | 2, 3: distinct mothers | 4, 5: half siblings
        let (mut persons, families) = node_stores(
            &[(1, None), (2, None), (3, None), (4, Some(1)), (5, Some(2)), (6, Some(3))],
            &[
                (1, Some(1), Some(2), &[4]),
                (2, Some(1), Some(3), &[5]),
                (3, Some(4), Some(5), &[6]),
            ],
        );
        let outcome = compute(&mut persons, &families, true);
        assert_eq!(outcome.coefficients[&6], 0.125);
    }

    #[test]
    fn full_sibling_child_is_one_quarter() {
        let (mut persons, families) = node_stores(
            &[(1, None), (2, None), (3, Some(1)), (4, Some(1)), (5, Some(2))],
            &[(1, Some(1), Some(2), &[3, 4]), (2, Some(3), Some(4), &[5])],
        );
        let outcome = compute(&mut persons, &families, true);
        assert_eq!(outcome.coefficients[&5], 0.25);
    }

    #[test]
    fn coefficients_stay_within_unit_interval() {
        let (mut persons, families) = first_cousin_stores();
        let outcome = compute(&mut persons, &families, true);
        for coefficient in outcome.coefficients.values() {
            assert!((0.0..=1.0).contains(coefficient));
        }
    }

    #[test]
    fn self_loop_is_flagged_and_warned() {
        let (mut persons, families) =
            node_stores(&[(1, Some(1))], &[(1, Some(1), None, &[1])]);
        let outcome = compute(&mut persons, &families, true);

        assert_eq!(persons[&1].annotation.coefficient, 0.0);
        assert!(persons[&1].annotation.known);
        assert_eq!(persons[&1].annotation.issue, ConsanguinityIssue::AncestralLoop);
        let loops: Vec<_> = outcome
            .diagnostics
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::AncestralLoop)
            .collect();
        assert_eq!(loops.len(), 1);
        assert!(loops[0].message.contains("P1"));
    }

    #[test]
    fn two_person_loop_flags_every_member() {
        let (mut persons, families) = node_stores(
            &[(1, Some(1)), (2, Some(2)), (3, Some(3))],
            &[
                (1, Some(2), None, &[1]),
                (2, Some(1), None, &[2]),
                (3, Some(1), Some(2), &[3]),
            ],
        );
        let outcome = compute(&mut persons, &families, true);

        for id in [1, 2] {
            assert_eq!(persons[&id].annotation.issue, ConsanguinityIssue::AncestralLoop);
            assert_eq!(persons[&id].annotation.coefficient, 0.0);
        }
        // The loop's descendant is computed normally, its parents acting
        // as founders.
        assert_eq!(persons[&3].annotation.issue, ConsanguinityIssue::None);
        assert_eq!(persons[&3].annotation.coefficient, 0.0);
        assert!(outcome
            .diagnostics
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::AncestralLoop));
    }

    #[test]
    fn dangling_parent_reference_warns_once() {
        let (mut persons, families) = node_stores(
            &[(1, Some(1)), (2, Some(1))],
            &[(1, Some(99), None, &[1, 2])],
        );
        let outcome = compute(&mut persons, &families, true);

        for id in [1, 2] {
            assert_eq!(persons[&id].annotation.coefficient, 0.0);
            assert_eq!(persons[&id].annotation.issue, ConsanguinityIssue::MissingParent);
        }
        let missing: Vec<_> = outcome
            .diagnostics
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::MissingParent)
            .collect();
        assert_eq!(missing.len(), 1);
        assert!(missing[0].message.contains("parent index 99"));
    }

    #[test]
    fn scratch_runs_are_deterministic() {
        let (mut first, families) = first_cousin_stores();
        let (mut second, _) = first_cousin_stores();

        let outcome_a = compute(&mut first, &families, true);
        let outcome_b = compute(&mut second, &families, true);

        assert_eq!(outcome_a, outcome_b);
        assert_eq!(first, second);
    }

    #[test]
    fn incremental_refresh_matches_scratch() {
        let (mut persons, families) = first_cousin_stores();
        compute(&mut persons, &families, true);

        // Stale value on a descendant: incremental mode must repair it.
        let child = persons.get_mut(&9).unwrap();
        child.annotation.coefficient = 0.5;
        child.annotation.known = false;

        let incremental = compute(&mut persons, &families, false);

        let (mut fresh, _) = first_cousin_stores();
        let scratch = compute(&mut fresh, &families, true);

        assert_eq!(incremental.coefficients, scratch.coefficients);
        assert!(persons.values().all(|node| node.annotation.known));
        assert_eq!(persons[&9].annotation.coefficient, 0.0625);
    }

    #[test]
    fn incremental_refresh_walks_descendants() {
        let (mut persons, families) = first_cousin_stores();
        compute(&mut persons, &families, true);

        // Invalidate an ancestor and plant a stale value on a descendant
        // that is still marked known: the closure must reach it.
        persons.get_mut(&3).unwrap().annotation.known = false;
        persons.get_mut(&9).unwrap().annotation.coefficient = 0.9;

        compute(&mut persons, &families, false);
        assert_eq!(persons[&9].annotation.coefficient, 0.0625);
        assert!(persons[&3].annotation.known);
    }

    #[test]
    fn incremental_refresh_trusts_known_annotations() {
        let (mut persons, families) = first_cousin_stores();
        compute(&mut persons, &families, true);

        // A known annotation is trusted as-is, even when its value drifted.
        persons.get_mut(&9).unwrap().annotation.coefficient = 0.5;
        let outcome = compute(&mut persons, &families, false);
        assert_eq!(outcome.coefficients[&9], 0.5);
    }

    #[test]
    fn domain_compute_writes_annotations_back() {
        let mut persons: BTreeMap<String, Person> = [
            Person::new("P1", "Smith", Sex::Male, 1),
            Person::new("P2", "Smith", Sex::Female, 2),
            Person::new("P3", "Smith", Sex::Male, 3),
        ]
        .into_iter()
        .map(|person| (person.key(), person))
        .collect();
        let families = vec![Family::new(1, 1, 2, vec![3])];

        compute_for_domain(&mut persons, &families, true);

        let child = &persons["P3 Smith"];
        assert!(child.consanguinity_known);
        assert_eq!(child.consanguinity, 0.0);

        // Incremental mode respects the known flags on domain records.
        let child = persons.get_mut("P3 Smith").unwrap();
        child.consanguinity = 0.5;
        child.consanguinity_known = false;

        compute_for_domain(&mut persons, &families, false);
        let child = &persons["P3 Smith"];
        assert_eq!(child.consanguinity, 0.0);
        assert!(child.consanguinity_known);
        assert!(persons["P1 Smith"].consanguinity_known);
        assert!(persons["P2 Smith"].consanguinity_known);
    }
}
