use std::process;

use clap::Parser;
use log::{error, info};

use located_error::prelude::*;

use consang_io::{Database, PedigreeEmitter, YamlSettings};
use parser::Cli;
use pedigree::PedigreeError;
use search::RelationshipSearchEngine;
use sosa::{SosaCacheManager, SosaError};

/// Parse command line arguments, run the refresh, and map failures onto
/// the exit-code contract: 0 success, 2 usage error, 1 runtime error.
fn main() {
    let cli = Cli::parse();
    logger::Logger::init(cli.verbosity());

    // ---- Usage errors: single diagnostic, exit 2.
    if let Err(err) = cli.check_input() {
        eprintln!("consang-rs: {err}");
        process::exit(2);
    }
    let settings = match &cli.settings {
        Some(path) => match YamlSettings::from_path(path) {
            Ok(settings) => settings,
            Err(err) => {
                eprintln!("consang-rs: {err}");
                process::exit(2);
            }
        },
        None => YamlSettings::empty(),
    };

    match run(&cli, &settings) {
        Ok(()) => (),
        Err(err) => {
            // ---- Configuration errors print one diagnostic line;
            //      anything else gets the full located chain.
            if err.downcast_ref::<SosaError>().is_some() {
                eprintln!("consang-rs: {err}");
            } else {
                error!("{err:?}");
            }
            process::exit(1);
        }
    }
}

fn run(cli: &Cli, settings: &YamlSettings) -> Result<()> {
    // ---- Load the pedigree.
    info!("Loading pedigree from {}", cli.input.display());
    let mut database = consang_io::load_pedigree_file(&cli.input, false)?;

    // ---- Refresh the consanguinity annotations.
    let mode = if cli.scratch { "scratch" } else { "incremental" };
    info!("Refreshing consanguinity coefficients ({mode} mode)");
    let outcome =
        consang::compute_for_domain(&mut database.persons, &database.families, cli.scratch);
    database.consanguinity_errors.extend(outcome.diagnostics.errors);
    database.consanguinity_warnings.extend(outcome.diagnostics.warnings);

    // ---- Canonical re-emission.
    if let Some(output) = &cli.output {
        PedigreeEmitter::new().export_to_path(&database, output)?;
        info!("Canonical pedigree written to {}", output.display());
    }

    // ---- Summary, then diagnostics.
    let computed = database
        .persons
        .values()
        .filter(|person| person.consanguinity_known)
        .count();
    if cli.quiet == 0 {
        println!("Consanguinity refreshed for {computed} persons ({mode} mode).");
    }
    if cli.quiet <= 1 {
        for message in &database.consanguinity_errors {
            eprintln!("ERROR: {message}");
        }
        for warning in &database.consanguinity_warnings {
            eprintln!("WARNING: {warning}");
        }
    }

    if let Some(pair) = &cli.relationship {
        print_relationship(&database, &pair[0], &pair[1])?;
    }
    if cli.with_sosa {
        print_sosa_navigation(&database, cli.sosa_root, settings)?;
    }
    Ok(())
}

/// Resolve both keys and print the classified shortest kinship path.
fn print_relationship(database: &Database, a: &str, b: &str) -> Result<()> {
    let (graph, _) = pedigree::adapt(database.persons.values(), &database.families);
    let a_index = database
        .index_of(a)
        .with_loc(|| PedigreeError::UnknownKey(a.to_string()))?;
    let b_index = database
        .index_of(b)
        .with_loc(|| PedigreeError::UnknownKey(b.to_string()))?;

    let relationship = RelationshipSearchEngine::new(&graph)
        .find_relationship(a_index, b_index)
        .loc("While searching for a kinship relationship")?;
    println!("{a} -> {b}: {relationship}");
    Ok(())
}

/// Print the ancestor numbering table for the configured root, ascending
/// by Sosa number.
fn print_sosa_navigation(
    database: &Database,
    root_override: Option<usize>,
    settings: &YamlSettings,
) -> Result<()> {
    let (graph, _) = pedigree::adapt(database.persons.values(), &database.families);
    let mut manager = SosaCacheManager::new(graph.persons, graph.families);
    let cache = manager.ensure_from_config(root_override, settings)?;

    let root_key = database.index_to_key.get(&cache.root_id).map_or("?", String::as_str);
    println!("Sosa navigation (root: {root_key})");

    let mut rows: Vec<(u64, usize)> =
        cache.min_number.iter().map(|(&person_id, &number)| (number, person_id)).collect();
    rows.sort_unstable();
    for (number, person_id) in rows {
        let key = database.index_to_key.get(&person_id).map_or("?", String::as_str);
        let generation = number.ilog2();
        println!("{number: >10}  {key: <30} generation {generation}");
    }
    if cache.overflowed {
        eprintln!("WARNING: [sosa_overflow] ancestor numbering truncated at generation {}", sosa::MAX_GENERATION);
    }
    Ok(())
}
