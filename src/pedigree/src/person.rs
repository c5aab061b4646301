use crate::node::ConsanguinityIssue;
use crate::sex::Sex;

/// A person record, as supplied by an external loader.
///
/// The `key_index` is the person's stable integer identity within the
/// pedigree; `0` requests automatic assignment at adapt time. The three
/// `consanguinity*` slots are annotation storage written back by the
/// consanguinity kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub first_name: String,
    pub surname: String,
    pub sex: Sex,
    pub occupation: Option<String>,
    pub key_index: usize,
    pub consanguinity: f64,
    pub consanguinity_known: bool,
    pub consanguinity_issue: ConsanguinityIssue,
}

impl Person {
    pub fn new(first_name: &str, surname: &str, sex: Sex, key_index: usize) -> Self {
        Self {
            first_name: first_name.to_string(),
            surname: surname.to_string(),
            sex,
            occupation: None,
            key_index,
            consanguinity: 0.0,
            consanguinity_known: false,
            consanguinity_issue: ConsanguinityIssue::None,
        }
    }

    pub fn with_occupation(mut self, occupation: &str) -> Self {
        self.occupation = Some(occupation.to_string());
        self
    }

    /// Stable string key, derived from the name tokens.
    pub fn key(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.surname.trim())
            .trim()
            .to_string()
    }
}
