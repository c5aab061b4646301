use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Failed to open pedigree file: {0}")]
    OpenFile(#[source] std::io::Error),

    #[error("Encountered IO error while reading line n°{lineno} of the pedigree file: {source}")]
    ReadLine { source: std::io::Error, lineno: usize },

    #[error("Line n°{lineno} does not belong to any section; expected INDIVIDUALS or FAMILIES first")]
    StrayLine { lineno: usize },

    #[error("Malformed individual on line n°{lineno}: empty name")]
    MalformedIndividual { lineno: usize },

    #[error("Malformed family on line n°{lineno}: expected '<father> + <mother>' before the first '|'")]
    MalformedFamily { lineno: usize },
}
