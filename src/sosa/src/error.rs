use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SosaError {
    #[error("No usable Sosa root could be resolved for this pedigree")]
    MissingRoot,
}
