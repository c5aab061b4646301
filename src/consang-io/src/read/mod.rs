use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use located_error::prelude::*;
use log::debug;

use pedigree::{Person, Family, RelationKind, Sex, WarningKind, UNKNOWN_INDEX};

use crate::Database;

mod error;
pub use error::LoaderError;

/// Section being parsed within the pedigree file.
enum ParseMode {
    Individuals,
    Families,
}

/// Parse a line-oriented pedigree file into a [`Database`].
///
/// Format, by sections:
/// ```text
/// # comment
/// INDIVIDUALS
/// John Smith|M|Engineer          (name | sex | optional occupation)
/// FAMILIES
/// John Smith + Mary Smith|married|Robert Smith;Anna Smith
/// ? + Mary Smith|partnership|Eve Smith
/// ```
///
/// Indices are assigned in file order, starting at 1. Unknown parent or
/// child names warn (`missing_parent`) and resolve to absent; duplicate
/// individual names warn (`duplicate_key`) and keep the first record.
/// With `compute_consanguinity` set, a from-scratch kernel pass annotates
/// every person before the database is returned.
pub fn load_pedigree_file(
    path: impl AsRef<Path>,
    compute_consanguinity: bool,
) -> Result<Database> {
    let path = path.as_ref();
    let loc_msg = || format!("While attempting to parse {}", path.display());

    let mut parse_mode = None;
    let mut database = Database::default();
    let reader = BufReader::new(File::open(path).map_err(LoaderError::OpenFile).with_loc(loc_msg)?);

    for (i, line) in reader.lines().enumerate() {
        let lineno = i + 1;
        let line = line
            .map_err(|source| LoaderError::ReadLine { source, lineno })
            .with_loc(loc_msg)?;

        // ---- Strip inline comments, skip blank lines.
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        // ---- Section switches.
        match line {
            "INDIVIDUALS" => {
                parse_mode = Some(ParseMode::Individuals);
                continue;
            }
            "FAMILIES" => {
                parse_mode = Some(ParseMode::Families);
                continue;
            }
            _ => (),
        }

        match parse_mode {
            Some(ParseMode::Individuals) => {
                parse_individual(&mut database, line, lineno).with_loc(loc_msg)?
            }
            Some(ParseMode::Families) => {
                parse_family(&mut database, line, lineno).with_loc(loc_msg)?
            }
            None => return Err(LoaderError::StrayLine { lineno }).with_loc(loc_msg),
        }
    }

    debug!(
        "loaded {} persons and {} families from {}",
        database.persons.len(),
        database.families.len(),
        path.display()
    );

    if compute_consanguinity {
        let outcome = consang::compute_for_domain(&mut database.persons, &database.families, true);
        database.consanguinity_errors.extend(outcome.diagnostics.errors);
        database.consanguinity_warnings.extend(outcome.diagnostics.warnings);
    }
    Ok(database)
}

/// `<First> <Last...>|<sex>|<occupation>`; sex and occupation optional.
fn parse_individual(
    database: &mut Database,
    line: &str,
    lineno: usize,
) -> Result<(), LoaderError> {
    let mut fields = line.split('|').map(str::trim);
    let name = fields.next().unwrap_or("");
    if name.is_empty() {
        return Err(LoaderError::MalformedIndividual { lineno });
    }

    let sex = fields
        .next()
        .filter(|field| !field.is_empty())
        .map_or(Sex::Unknown, |field| field.parse().unwrap_or(Sex::Unknown));
    let occupation = fields.next().filter(|field| !field.is_empty());

    let mut tokens = name.split_whitespace();
    let first_name = tokens.next().unwrap_or("");
    let surname = tokens.collect::<Vec<&str>>().join(" ");

    let index = database.persons.len() + 1;
    let mut person = Person::new(first_name, &surname, sex, index);
    if let Some(occupation) = occupation {
        person = person.with_occupation(occupation);
    }

    let key = person.key();
    if database.persons.contains_key(&key) {
        database.consanguinity_warnings.push(pedigree::Warning {
            kind: WarningKind::DuplicateKey,
            message: format!("line {lineno}: duplicate individual '{key}'; keeping the first record"),
        });
        return Ok(());
    }
    database.key_to_index.insert(key.clone(), index);
    database.index_to_key.insert(index, key.clone());
    database.persons.insert(key, person);
    Ok(())
}

/// `<father> + <mother>|<kind>|<child>;<child>`; `?` is an unknown parent.
fn parse_family(database: &mut Database, line: &str, lineno: usize) -> Result<(), LoaderError> {
    let mut fields = line.split('|').map(str::trim);
    let parents = fields.next().unwrap_or("");
    let kind = fields
        .next()
        .filter(|field| !field.is_empty())
        .map_or(RelationKind::Unknown, |field| {
            field.parse().unwrap_or(RelationKind::Unknown)
        });
    let children_field = fields.next().unwrap_or("");

    let Some((father, mother)) = parents.split_once(" + ") else {
        return Err(LoaderError::MalformedFamily { lineno });
    };

    let index = database.families.len() + 1;
    let parent1 = resolve_reference(database, father.trim(), lineno, index);
    let parent2 = resolve_reference(database, mother.trim(), lineno, index);

    let children: Vec<usize> = children_field
        .split(';')
        .map(str::trim)
        .filter(|child| !child.is_empty())
        .filter_map(|child| {
            let resolved = resolve_reference(database, child, lineno, index);
            (resolved != UNKNOWN_INDEX).then_some(resolved)
        })
        .collect();

    database
        .families
        .push(Family::new(index, parent1, parent2, children).with_kind(kind));
    Ok(())
}

/// Resolve an individual name to its index; `?` and unknown names map to
/// the unknown sentinel, the latter with a warning.
fn resolve_reference(
    database: &mut Database,
    name: &str,
    lineno: usize,
    family_index: usize,
) -> usize {
    if name == "?" {
        return UNKNOWN_INDEX;
    }
    match database.index_of(name) {
        Some(index) => index,
        None => {
            database.consanguinity_warnings.push(pedigree::Warning {
                kind: WarningKind::MissingParent,
                message: format!(
                    "line {lineno}: family {family_index} references unknown individual '{name}'"
                ),
            });
            UNKNOWN_INDEX
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_fixture(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("Tempfile should be creatable");
        file.write_all(content.as_bytes()).expect("Fixture should be writable");
        file
    }

    const NUCLEAR: &str = "\
# fixture
INDIVIDUALS
John Smith|M|Engineer
Mary Smith|F|Teacher
Robert Smith|M
FAMILIES
John Smith + Mary Smith|married|Robert Smith
";

    #[test]
    fn loads_a_nuclear_family() {
        let file = write_fixture(NUCLEAR);
        let database = load_pedigree_file(file.path(), false).unwrap();

        assert_eq!(database.persons.len(), 3);
        assert_eq!(database.families.len(), 1);
        assert_eq!(database.index_of("John Smith"), Some(1));
        assert_eq!(database.index_of("Robert Smith"), Some(3));

        let family = &database.families[0];
        assert_eq!(family.parent1, 1);
        assert_eq!(family.parent2, 2);
        assert_eq!(family.children, vec![3]);
        assert_eq!(family.kind, RelationKind::Married);

        let john = &database.persons["John Smith"];
        assert_eq!(john.sex, Sex::Male);
        assert_eq!(john.occupation.as_deref(), Some("Engineer"));
    }

    #[test]
    fn compute_flag_runs_the_kernel() {
        let file = write_fixture(NUCLEAR);
        let database = load_pedigree_file(file.path(), true).unwrap();
        assert!(database.persons.values().all(|person| person.consanguinity_known));
    }

    #[test]
    fn unknown_references_warn_and_stay_absent() {
        let file = write_fixture(
            "INDIVIDUALS\nOnly Child|F\nFAMILIES\nGhost Father + ? |married|Only Child\n",
        );
        let database = load_pedigree_file(file.path(), false).unwrap();

        assert_eq!(database.families[0].parent1, UNKNOWN_INDEX);
        assert_eq!(database.families[0].parent2, UNKNOWN_INDEX);
        assert_eq!(database.families[0].children, vec![1]);
        assert_eq!(database.consanguinity_warnings.len(), 1);
        assert_eq!(database.consanguinity_warnings[0].kind, WarningKind::MissingParent);
    }

    #[test]
    fn duplicate_individuals_keep_the_first_record() {
        let file = write_fixture("INDIVIDUALS\nJohn Smith|M|Engineer\nJohn Smith|M|Baker\n");
        let database = load_pedigree_file(file.path(), false).unwrap();

        assert_eq!(database.persons.len(), 1);
        assert_eq!(database.persons["John Smith"].occupation.as_deref(), Some("Engineer"));
        assert_eq!(database.consanguinity_warnings[0].kind, WarningKind::DuplicateKey);
    }

    #[test]
    fn stray_lines_are_rejected() {
        let file = write_fixture("John Smith|M\n");
        assert!(load_pedigree_file(file.path(), false).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_pedigree_file("/nonexistent/pedigree.txt", false).is_err());
    }
}
