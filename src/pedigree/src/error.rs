use thiserror::Error;

#[derive(Debug, Error)]
pub enum PedigreeError {
    #[error("Individual index {0} does not exist within this pedigree")]
    UnknownIndividual(usize),

    #[error("Unknown individual key '{0}'")]
    UnknownKey(String),
}
