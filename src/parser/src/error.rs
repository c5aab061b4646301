use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),
}
