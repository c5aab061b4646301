use std::fmt::{self, Display};

/// Data-quality warning categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    MissingParent,
    AncestralLoop,
    DuplicateKey,
}

impl WarningKind {
    pub fn tag(self) -> &'static str {
        match self {
            Self::MissingParent => "missing_parent",
            Self::AncestralLoop => "ancestral_loop",
            Self::DuplicateKey => "duplicate_key",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.tag(), self.message)
    }
}

/// Per-call diagnostics context. Errors are structural defects; warnings
/// are recoverable data-quality findings. Created for each analytics call
/// and returned alongside the results; never process-wide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub errors: Vec<String>,
    pub warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn warn(&mut self, kind: WarningKind, message: impl Into<String>) {
        self.warnings.push(Warning { kind, message: message.into() });
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}
