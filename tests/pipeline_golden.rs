use std::collections::BTreeMap;
use std::io::Write;

use pretty_assertions::assert_eq;

use consang_io::{Database, PedigreeEmitter};
use search::{GenealogySearchAPI, RelationshipKind, RelationshipSearchEngine};
use sosa::SosaCacheManager;

const FIXTURE: &str = include_str!("fixtures/first_cousin_large.txt");

fn load_fixture() -> Database {
    let mut file = tempfile::NamedTempFile::new().expect("Tempfile should be creatable");
    file.write_all(FIXTURE.as_bytes()).expect("Fixture should be writable");
    consang_io::load_pedigree_file(file.path(), true).expect("Fixture should load")
}

fn golden_coefficients() -> BTreeMap<&'static str, f64> {
    BTreeMap::from([
        ("Great Stem", 0.0),
        ("Great Root", 0.0),
        ("Parent One", 0.0),
        ("Parent Two", 0.0),
        ("Spouse One", 0.0),
        ("Spouse Two", 0.0),
        ("Cousin Adam", 0.0),
        ("Cousin Bella", 0.0),
        ("Child Prime", 0.0625),
    ])
}

#[test]
fn coefficients_match_the_golden_map() {
    let database = load_fixture();

    let observed: BTreeMap<&str, f64> = database
        .persons
        .iter()
        .map(|(key, person)| (key.as_str(), person.consanguinity))
        .collect();
    let expected: BTreeMap<&str, f64> =
        golden_coefficients().into_iter().collect();

    assert_eq!(observed, expected);
    assert!(database.persons.values().all(|person| person.consanguinity_known));
    assert!(database.consanguinity_errors.is_empty());
    assert!(database.consanguinity_warnings.is_empty());
}

#[test]
fn incremental_refresh_repairs_a_stale_annotation() {
    let mut database = load_fixture();

    let child = database.persons.get_mut("Child Prime").expect("Child should exist");
    child.consanguinity = 0.5;
    child.consanguinity_known = false;

    consang::compute_for_domain(&mut database.persons, &database.families, false);

    let child = &database.persons["Child Prime"];
    assert_eq!(child.consanguinity, 0.0625);
    assert!(child.consanguinity_known);
}

#[test]
fn canonical_emission_round_trips() {
    let database = load_fixture();
    let emitter = PedigreeEmitter::new();
    let emitted = emitter.export(&database);

    let mut file = tempfile::NamedTempFile::new().expect("Tempfile should be creatable");
    file.write_all(emitted.as_bytes()).expect("Canonical text should be writable");
    let reloaded = consang_io::load_pedigree_file(file.path(), true).expect("Canonical text should load");

    assert_eq!(emitter.export(&reloaded), emitted);
    assert_eq!(reloaded.persons["Child Prime"].consanguinity, 0.0625);
}

#[test]
fn sosa_numbers_match_the_golden_map() {
    let database = load_fixture();
    let (graph, _) = pedigree::adapt(database.persons.values(), &database.families);

    let root = database.index_of("Child Prime").expect("Root should exist");
    let mut manager = SosaCacheManager::new(graph.persons, graph.families);
    let cache = manager.get_cache(root).expect("Cache should build");

    let observed: BTreeMap<&str, Vec<u64>> = cache
        .numbers_by_person
        .iter()
        .map(|(person_id, numbers)| {
            let key = database.index_to_key[person_id].as_str();
            (key, numbers.clone())
        })
        .collect();

    let expected = BTreeMap::from([
        ("Child Prime", vec![1]),
        ("Cousin Adam", vec![2]),
        ("Cousin Bella", vec![3]),
        ("Parent One", vec![4]),
        ("Spouse One", vec![5]),
        ("Spouse Two", vec![6]),
        ("Parent Two", vec![7]),
        ("Great Stem", vec![8, 14]),
        ("Great Root", vec![9, 15]),
    ]);

    assert_eq!(observed, expected);
    assert_eq!(cache.max_generation, 3);
    assert!(!cache.overflowed);
}

#[test]
fn married_cousins_are_spouses_first() {
    let database = load_fixture();
    let (graph, _) = pedigree::adapt(database.persons.values(), &database.families);
    let engine = RelationshipSearchEngine::new(&graph);

    let adam = database.index_of("Cousin Adam").unwrap();
    let bella = database.index_of("Cousin Bella").unwrap();
    let relationship = engine.find_relationship(adam, bella).unwrap();

    // The union edge beats the four-step cousin path.
    assert_eq!(relationship.kind, RelationshipKind::Spouse);
    assert_eq!(relationship.distance, 1);
}

#[test]
fn child_to_great_grandparent_is_an_ancestor_path() {
    let database = load_fixture();
    let (graph, _) = pedigree::adapt(database.persons.values(), &database.families);
    let engine = RelationshipSearchEngine::new(&graph);

    let child = database.index_of("Child Prime").unwrap();
    let ancestor = database.index_of("Great Stem").unwrap();
    let relationship = engine.find_relationship(child, ancestor).unwrap();

    assert_eq!(relationship.kind, RelationshipKind::Ancestor);
    assert_eq!(relationship.distance, 3);
}

#[test]
fn statistics_cover_the_whole_snapshot() {
    let database = load_fixture();
    let api = GenealogySearchAPI::new(
        database.persons.values().cloned().collect(),
        database.families.clone(),
    );

    let statistics = api.get_statistics_report().data.expect("Statistics should build");
    assert_eq!(statistics.total_persons, 9);
    assert_eq!(statistics.total_families, 4);
    assert_eq!(statistics.roots, 4);
    assert_eq!(statistics.orphans, 0);
    assert_eq!(statistics.max_generation, 3);
    assert_eq!(statistics.max_consanguinity, 0.0625);
}
