use std::path::PathBuf;

use clap::Parser;

mod error;
pub use error::ParserError;

/// Recompute pedigree consanguinity coefficients.
///
/// Loads a line-oriented pedigree file, refreshes every consanguinity
/// annotation, and optionally re-emits the canonical text, reports the
/// kinship relationship between two individuals, or prints a Sosa
/// navigation table for the configured root.
#[derive(Parser, Debug)]
#[clap(name = "consang-rs", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the input pedigree file.
    #[clap(parse(from_os_str))]
    pub input: PathBuf,

    /// Optional path where the refreshed canonical pedigree text should be
    /// written.
    #[clap(short = 'o', long, parse(from_os_str))]
    pub output: Option<PathBuf>,

    /// Reduce console output.
    ///
    /// -q suppresses the summary line; -qq also suppresses warnings.
    #[clap(short = 'q', long, parse(from_occurrences))]
    pub quiet: u8,

    /// Set the verbosity level (-v -vv -vvv).
    ///
    /// -v: Info  |  -vv: Debug  | -vvv: Trace
    ///
    /// Warnings are shown by default; use --quiet to silence them.
    #[clap(short = 'v', long, parse(from_occurrences))]
    pub verbose: u8,

    /// Recompute every coefficient from scratch instead of refreshing only
    /// the stale ones.
    #[clap(short = 's', long)]
    pub scratch: bool,

    /// Compatibility flag; accepted, no effect.
    #[clap(short = 'f', long)]
    pub fast: bool,

    /// After the refresh, print the shortest kinship relationship between
    /// two individuals, identified by their string keys.
    #[clap(long, number_of_values(2), value_names(&["A", "B"]))]
    pub relationship: Option<Vec<String>>,

    /// After the refresh, print a Sosa navigation table for the configured
    /// root.
    #[clap(long)]
    pub with_sosa: bool,

    /// Explicit Sosa root index. Takes precedence over the SOSA_ROOT
    /// environment variable and the settings entry 'sosa_root'.
    #[clap(long)]
    pub sosa_root: Option<usize>,

    /// Optional YAML settings mapping (e.g. 'sosa_root: 9').
    #[clap(long, parse(from_os_str))]
    pub settings: Option<PathBuf>,
}

impl Cli {
    /// Sanity check: the input pedigree file must exist before any work
    /// starts.
    pub fn check_input(&self) -> Result<(), ParserError> {
        if !self.input.is_file() {
            return Err(ParserError::MissingInput(self.input.clone()));
        }
        Ok(())
    }

    /// Console verbosity: warnings show by default, -v raises the level,
    /// -qq silences everything but errors.
    pub fn verbosity(&self) -> u8 {
        if self.quiet >= 2 {
            0
        } else {
            self.verbose + 1
        }
    }
}
