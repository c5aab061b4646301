use ahash::AHashMap;

use pedigree::{Family, PedigreeGraph, PedigreeView, Person};

use crate::engine::{SearchEngine, SearchField, SearchType};
use crate::error::SearchError;
use crate::relationship::RelationshipSearchEngine;

/// Machine-readable failure attached to an [`ApiResponse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: String,
    pub message: String,
}

/// Uniform response envelope carried by every facade operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn fail(kind: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError { kind: kind.to_string(), message: message.into() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonHit {
    pub person_id: usize,
    pub key: String,
    pub first_name: String,
    pub surname: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipReport {
    pub relationship_type: String,
    pub distance: usize,
    pub path_keys: Vec<String>,
    pub degree: Option<u32>,
    pub removal: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub total_persons: usize,
    pub total_families: usize,
    /// Persons attached to no family at all.
    pub orphans: usize,
    /// Persons with no resolved parents.
    pub roots: usize,
    pub average_sibship: f64,
    pub max_generation: u64,
    pub mean_consanguinity: f64,
    pub max_consanguinity: f64,
}

/// Unified search/report facade over one pedigree snapshot.
pub struct GenealogySearchAPI {
    engine: SearchEngine,
}

impl GenealogySearchAPI {
    pub fn new(persons: Vec<Person>, families: Vec<Family>) -> Self {
        Self { engine: SearchEngine::new(persons, families) }
    }

    pub fn with_engine(engine: SearchEngine) -> Self {
        Self { engine }
    }

    /// Ranked person search. Unknown field or search-type names yield a
    /// `bad_request` envelope rather than an error.
    pub fn search_persons(
        &self,
        term: &str,
        field: &str,
        search_type: &str,
    ) -> ApiResponse<Vec<PersonHit>> {
        let field: SearchField = match field.parse() {
            Ok(field) => field,
            Err(err) => return ApiResponse::fail("bad_request", err.to_string()),
        };
        let search_type: SearchType = match search_type.parse() {
            Ok(search_type) => search_type,
            Err(err) => return ApiResponse::fail("bad_request", err.to_string()),
        };

        let hits = self
            .engine
            .simple_search(term, field, search_type)
            .into_iter()
            .filter_map(|result| {
                self.engine.person_by_id(result.person_id).map(|person| PersonHit {
                    person_id: result.person_id,
                    key: person.key(),
                    first_name: person.first_name.clone(),
                    surname: person.surname.clone(),
                    score: result.score,
                })
            })
            .collect();
        ApiResponse::ok(hits)
    }

    /// Classify the shortest kinship path between two person indices.
    pub fn find_relationship(&self, a: usize, b: usize) -> ApiResponse<RelationshipReport> {
        let graph = self.engine.graph();
        let relationship = match RelationshipSearchEngine::new(graph).find_relationship(a, b) {
            Ok(relationship) => relationship,
            Err(err @ SearchError::UnknownPerson(_)) => {
                return ApiResponse::fail("not_found", err.to_string())
            }
            Err(err) => return ApiResponse::fail("bad_request", err.to_string()),
        };

        let path_keys = relationship
            .path
            .iter()
            .map(|&id| graph.key_of(id).unwrap_or("?").to_string())
            .collect();
        ApiResponse::ok(RelationshipReport {
            relationship_type: relationship.kind.to_string(),
            distance: relationship.distance,
            path_keys,
            degree: relationship.degree,
            removal: relationship.removal,
        })
    }

    /// Aggregate snapshot statistics.
    pub fn get_statistics_report(&self) -> ApiResponse<Statistics> {
        let graph = self.engine.graph();
        let persons = self.engine.persons();

        let orphans = graph
            .persons
            .values()
            .filter(|node| node.origin_family.is_none() && node.union_families.is_empty())
            .count();
        let roots = graph
            .persons
            .values()
            .filter(|node| resolved_parents(graph, node.person_id) == [None, None])
            .count();

        let child_count: usize = graph.families.values().map(|family| family.children.len()).sum();
        let average_sibship = if graph.families.is_empty() {
            0.0
        } else {
            child_count as f64 / graph.families.len() as f64
        };

        let mean_consanguinity = if persons.is_empty() {
            0.0
        } else {
            persons.iter().map(|person| person.consanguinity).sum::<f64>() / persons.len() as f64
        };
        let max_consanguinity = persons
            .iter()
            .map(|person| person.consanguinity)
            .fold(0.0, f64::max);

        ApiResponse::ok(Statistics {
            total_persons: graph.persons.len(),
            total_families: graph.families.len(),
            orphans,
            roots,
            average_sibship,
            max_generation: generation_depth(graph),
            mean_consanguinity,
            max_consanguinity,
        })
    }

    /// Slice a materialized result vector. Pages are 0-based; out-of-range
    /// pages come back empty.
    pub fn paginate<T: Clone>(results: &[T], page: usize, page_size: usize) -> Vec<T> {
        results
            .iter()
            .skip(page.saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .collect()
    }
}

fn resolved_parents(graph: &PedigreeGraph, person_id: usize) -> [Option<usize>; 2] {
    let slots = graph
        .person(person_id)
        .and_then(|node| node.origin_family)
        .and_then(|family_id| graph.family(family_id))
        .map_or([None, None], |family| family.parent_slots());
    slots.map(|slot| slot.filter(|parent| graph.person(*parent).is_some()))
}

/// Deepest descendant level reachable from any root, walking the parent
/// relation with a cycle guard.
fn generation_depth(graph: &PedigreeGraph) -> u64 {
    let mut depths: AHashMap<usize, u64> = AHashMap::new();
    let mut deepest = 0;

    for &start in graph.persons.keys() {
        if depths.contains_key(&start) {
            continue;
        }
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        let mut active: Vec<usize> = vec![start];

        while let Some(&(node, slot)) = stack.last() {
            if slot >= 2 {
                let depth = resolved_parents(graph, node)
                    .iter()
                    .flatten()
                    .filter_map(|parent| depths.get(parent).copied())
                    .max()
                    .map_or(0, |parent_depth| parent_depth + 1);
                depths.insert(node, depth);
                deepest = deepest.max(depth);
                stack.pop();
                active.pop();
                continue;
            }
            stack.last_mut().expect("Frame should exist").1 += 1;

            let Some(parent) = resolved_parents(graph, node)[slot] else { continue };
            if depths.contains_key(&parent) || active.contains(&parent) {
                continue;
            }
            stack.push((parent, 0));
            active.push(parent);
        }
    }
    deepest
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedigree::Sex;
    use pretty_assertions::assert_eq;

    fn fixture() -> GenealogySearchAPI {
        let persons = vec![
            Person::new("John", "Smith", Sex::Male, 1).with_occupation("Engineer"),
            Person::new("Mary", "Smith", Sex::Female, 2).with_occupation("Teacher"),
            Person::new("Robert", "Smith", Sex::Male, 3),
        ];
        let families = vec![Family::new(1, 1, 2, vec![3])];
        GenealogySearchAPI::new(persons, families)
    }

    #[test]
    fn search_persons_wraps_hits() {
        let api = fixture();
        let response = api.search_persons("John", "first_name", "exact");

        assert!(response.success);
        let hits = response.data.unwrap();
        assert!(hits.iter().any(|hit| hit.first_name == "John"));
    }

    #[test]
    fn search_persons_rejects_unknown_field() {
        let api = fixture();
        let response = api.search_persons("John", "shoe_size", "exact");

        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error.unwrap().kind, "bad_request");
    }

    #[test]
    fn find_relationship_reports_parent_or_child() {
        let api = fixture();
        let response = api.find_relationship(1, 3);

        assert!(response.success);
        let report = response.data.unwrap();
        assert!(["parent", "child"].contains(&report.relationship_type.as_str()));
        assert_eq!(report.distance, 1);
        assert_eq!(report.path_keys, vec!["John Smith", "Robert Smith"]);
    }

    #[test]
    fn find_relationship_unknown_person_is_not_found() {
        let api = fixture();
        let response = api.find_relationship(1, 42);

        assert!(!response.success);
        assert_eq!(response.error.unwrap().kind, "not_found");
    }

    #[test]
    fn statistics_report_counts() {
        let api = fixture();
        let response = api.get_statistics_report();

        assert!(response.success);
        let statistics = response.data.unwrap();
        assert_eq!(statistics.total_persons, 3);
        assert_eq!(statistics.total_families, 1);
        assert_eq!(statistics.roots, 2);
        assert_eq!(statistics.orphans, 0);
        assert_eq!(statistics.average_sibship, 1.0);
        assert_eq!(statistics.max_generation, 1);
    }

    #[test]
    fn statistics_count_orphans() {
        let persons = vec![
            Person::new("Lone", "Star", Sex::Unknown, 1),
            Person::new("Just", "Married", Sex::Unknown, 2),
        ];
        let families = vec![Family::new(1, 2, 0, vec![])];
        let api = GenealogySearchAPI::new(persons, families);

        let statistics = api.get_statistics_report().data.unwrap();
        assert_eq!(statistics.orphans, 1);
        assert_eq!(statistics.roots, 2);
    }

    #[test]
    fn pagination_slices_the_materialized_results() {
        let results: Vec<usize> = (0..10).collect();
        assert_eq!(GenealogySearchAPI::paginate(&results, 0, 4), vec![0, 1, 2, 3]);
        assert_eq!(GenealogySearchAPI::paginate(&results, 2, 4), vec![8, 9]);
        assert!(GenealogySearchAPI::paginate(&results, 3, 4).is_empty());
    }
}
