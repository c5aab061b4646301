use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmitterError {
    #[error("Failed to create the parent directory of the output file: {0}")]
    CreateParentDirectory(#[source] std::io::Error),

    #[error("Failed to write the canonical pedigree text: {0}")]
    WriteFile(#[source] std::io::Error),
}
