use std::str::FromStr;

use itertools::Itertools;
use log::warn;

use pedigree::{adapt, Family, PedigreeGraph, Person, Sex};

use crate::error::SearchError;

/// Default normalized Damerau-Levenshtein similarity cut-off for fuzzy
/// searches.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    FirstName,
    Surname,
    Occupation,
    Free,
}

impl FromStr for SearchField {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "first_name" => Self::FirstName,
            "surname" => Self::Surname,
            "occupation" => Self::Occupation,
            "free" => Self::Free,
            other => return Err(SearchError::UnknownField(other.to_string())),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    Exact,
    Prefix,
    Substring,
    Fuzzy,
}

impl FromStr for SearchType {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "exact" => Self::Exact,
            "prefix" => Self::Prefix,
            "substring" => Self::Substring,
            "fuzzy" => Self::Fuzzy,
            other => return Err(SearchError::UnknownSearchType(other.to_string())),
        })
    }
}

/// One scored hit. Results are ranked by descending score, ascending
/// person index on ties.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub person_id: usize,
    pub score: f64,
}

/// Conjunction of optional attribute filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvancedSearchCriteria {
    pub sex: Option<Sex>,
    pub surname: Option<String>,
    pub occupation: Option<String>,
}

/// Materialized person search over one pedigree snapshot.
pub struct SearchEngine {
    persons: Vec<Person>,
    graph: PedigreeGraph,
    fuzzy_threshold: f64,
}

impl SearchEngine {
    pub fn new(persons: Vec<Person>, families: Vec<Family>) -> Self {
        Self::with_threshold(persons, families, DEFAULT_FUZZY_THRESHOLD)
    }

    pub fn with_threshold(persons: Vec<Person>, families: Vec<Family>, fuzzy_threshold: f64) -> Self {
        let (graph, diagnostics) = adapt(&persons, &families);
        for warning in &diagnostics.warnings {
            warn!("search snapshot: {warning}");
        }
        Self { persons, graph, fuzzy_threshold }
    }

    pub fn graph(&self) -> &PedigreeGraph {
        &self.graph
    }

    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    pub fn person_by_id(&self, person_id: usize) -> Option<&Person> {
        self.persons.iter().find(|person| person.key_index == person_id)
    }

    /// Score every person against `term` and return the ranked matches.
    /// Matching is case-insensitive; an empty term matches nothing.
    pub fn simple_search(
        &self,
        term: &str,
        field: SearchField,
        search_type: SearchType,
    ) -> Vec<SearchResult> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.persons
            .iter()
            .filter_map(|person| {
                self.score_person(person, &needle, field, search_type)
                    .map(|score| SearchResult { person_id: person.key_index, score })
            })
            .sorted_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.person_id.cmp(&b.person_id))
            })
            .collect()
    }

    /// All persons satisfying every provided criterion, ascending by index.
    pub fn advanced_search(&self, criteria: &AdvancedSearchCriteria) -> Vec<SearchResult> {
        self.persons
            .iter()
            .filter(|person| {
                criteria.sex.map_or(true, |sex| person.sex == sex)
                    && criteria.surname.as_deref().map_or(true, |surname| {
                        person.surname.eq_ignore_ascii_case(surname)
                    })
                    && criteria.occupation.as_deref().map_or(true, |occupation| {
                        person
                            .occupation
                            .as_deref()
                            .is_some_and(|value| value.eq_ignore_ascii_case(occupation))
                    })
            })
            .map(|person| SearchResult { person_id: person.key_index, score: 1.0 })
            .sorted_by_key(|result| result.person_id)
            .collect()
    }

    fn score_person(
        &self,
        person: &Person,
        needle: &str,
        field: SearchField,
        search_type: SearchType,
    ) -> Option<f64> {
        let values: Vec<&str> = match field {
            SearchField::FirstName => vec![&person.first_name],
            SearchField::Surname => vec![&person.surname],
            SearchField::Occupation => person.occupation.as_deref().into_iter().collect(),
            SearchField::Free => [
                Some(person.first_name.as_str()),
                Some(person.surname.as_str()),
                person.occupation.as_deref(),
            ]
            .into_iter()
            .flatten()
            .collect(),
        };

        values
            .into_iter()
            .filter_map(|value| self.score_value(needle, &value.to_lowercase(), search_type))
            .fold(None, |best: Option<f64>, score| {
                Some(best.map_or(score, |best| best.max(score)))
            })
    }

    fn score_value(&self, needle: &str, value: &str, search_type: SearchType) -> Option<f64> {
        if value.is_empty() {
            return None;
        }
        match search_type {
            SearchType::Exact => (needle == value).then_some(1.0),
            SearchType::Prefix => value
                .starts_with(needle)
                .then(|| needle.len() as f64 / value.len() as f64),
            SearchType::Substring => value
                .contains(needle)
                .then(|| needle.len() as f64 / value.len() as f64),
            SearchType::Fuzzy => {
                let similarity = strsim::normalized_damerau_levenshtein(needle, value);
                (similarity >= self.fuzzy_threshold).then_some(similarity)
            }
        }
    }
}
