use std::{
    fmt::{self, Display},
    str::FromStr,
};

/// Relation kind of a union. Opaque to the analytics kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelationKind {
    Married,
    Partnership,
    #[default]
    Unknown,
}

impl FromStr for RelationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "married" | "marriage" => Self::Married,
            "partnership" | "partner" => Self::Partnership,
            _ => Self::Unknown,
        })
    }
}

impl Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", match self {
            Self::Married => "married",
            Self::Partnership => "partnership",
            Self::Unknown => "unknown",
        })
    }
}

/// A family record, as supplied by an external loader.
///
/// `parent1`/`parent2` reference person indices; `0` encodes an unknown
/// parent. `key_index` follows the same convention as [`crate::Person`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Family {
    pub key_index: usize,
    pub parent1: usize,
    pub parent2: usize,
    pub children: Vec<usize>,
    pub kind: RelationKind,
}

impl Family {
    pub fn new(key_index: usize, parent1: usize, parent2: usize, children: Vec<usize>) -> Self {
        Self { key_index, parent1, parent2, children, kind: RelationKind::default() }
    }

    pub fn with_kind(mut self, kind: RelationKind) -> Self {
        self.kind = kind;
        self
    }
}
