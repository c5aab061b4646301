use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("Individual index {0} does not exist within this pedigree")]
    UnknownPerson(usize),

    #[error("Unknown search field '{0}'")]
    UnknownField(String),

    #[error("Unknown search type '{0}'")]
    UnknownSearchType(String),
}
