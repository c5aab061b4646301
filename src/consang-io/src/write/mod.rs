use std::{fmt::Write as _, fs, path::Path};

use located_error::prelude::*;

use pedigree::UNKNOWN_INDEX;

use crate::Database;

mod error;
pub use error::EmitterError;

/// Canonical re-emitter for the line-oriented pedigree text consumed by
/// [`crate::load_pedigree_file`]. Individuals are listed by ascending
/// index, families in load order, separators normalized.
#[derive(Debug, Default)]
pub struct PedigreeEmitter;

impl PedigreeEmitter {
    pub fn new() -> Self {
        Self
    }

    pub fn export(&self, database: &Database) -> String {
        let mut out = String::from("# consang-rs canonical pedigree\nINDIVIDUALS\n");

        for key in database.index_to_key.values() {
            let Some(person) = database.persons.get(key) else { continue };
            let _ = write!(out, "{key}|{}", person.sex);
            if let Some(occupation) = &person.occupation {
                let _ = write!(out, "|{occupation}");
            }
            out.push('\n');
        }

        out.push_str("FAMILIES\n");
        for family in &database.families {
            let parent = |index: usize| match index {
                UNKNOWN_INDEX => "?".to_string(),
                index => database
                    .index_to_key
                    .get(&index)
                    .cloned()
                    .unwrap_or_else(|| "?".to_string()),
            };
            let _ = write!(out, "{} + {}|{}", parent(family.parent1), parent(family.parent2), family.kind);

            let children: Vec<String> = family
                .children
                .iter()
                .filter_map(|child| database.index_to_key.get(child).cloned())
                .collect();
            if !children.is_empty() {
                let _ = write!(out, "|{}", children.join(";"));
            }
            out.push('\n');
        }
        out
    }

    /// Write the canonical text to `path`, creating parent directories as
    /// needed.
    pub fn export_to_path(&self, database: &Database, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let loc_msg = || format!("While emitting the canonical pedigree to {}", path.display());

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(EmitterError::CreateParentDirectory)
                .with_loc(loc_msg)?;
        }
        fs::write(path, self.export(database))
            .map_err(EmitterError::WriteFile)
            .with_loc(loc_msg)
    }
}
