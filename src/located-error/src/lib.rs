use std::{fmt::Display, panic::Location};

use anyhow::{Context, Result};

/// Public prelude, re-exporting anyhow and thiserror alongside the location traits.
pub mod prelude {
    pub use anyhow::{anyhow, bail, Context, Result};
    pub use thiserror::Error;

    pub use super::{LocatedError, LocatedOption};
}

fn format_caller(caller: &Location) -> String {
    format!("[{}:{}:{}]", caller.file(), caller.line(), caller.column())
}

/// Extend [`Result`] with context carrying the location of the call site
/// (file, line and column).
///
/// # Example
/// ```should_panic
/// use anyhow::Result;
/// use located_error::LocatedError;
///
/// fn load_pedigree(path: &str) -> Result<String> {
///     std::fs::read_to_string(path)
///         .with_loc(|| format!("Failed to read pedigree file '{path}'"))
/// }
///
/// fn main() -> Result<()> {
///     let _text = load_pedigree("/missing-pedigree.txt").loc("While loading input")?;
///     Ok(())
/// }
/// ```
pub trait LocatedError<T> {
    /// Wrap the error value with additional context + the location at which it was called.
    fn loc<C>(self, context: C) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static;

    /// Wrap the error value with lazily evaluated context + the location at
    /// which it was called.
    fn with_loc<C, F>(self, f: F) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> LocatedError<T> for Result<T, E>
where
    E: Display + Send + Sync + 'static,
    Result<T, E>: Context<T, E>,
{
    #[track_caller]
    fn loc<C>(self, context: C) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static,
    {
        match self {
            Ok(ok) => Ok(ok),
            Err(_) => {
                let loc = format_caller(Location::caller());
                self.context(format!("{loc} {context}"))
            }
        }
    }

    #[track_caller]
    fn with_loc<C, F>(self, f: F) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        match self {
            Ok(ok) => Ok(ok),
            Err(_) => {
                let loc = format_caller(Location::caller());
                self.with_context(|| format!("{loc} {}", f()))
            }
        }
    }
}

/// [`LocatedError`], for [`Option`]. `None` values convert to located
/// anyhow errors.
pub trait LocatedOption<T> {
    /// Wrap the missing value with additional context + the location at which it was called.
    fn loc<C>(self, context: C) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static;

    /// Wrap the missing value with lazily evaluated context + the location
    /// at which it was called.
    fn with_loc<C, F>(self, f: F) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> LocatedOption<T> for Option<T> {
    #[track_caller]
    fn loc<C>(self, context: C) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static,
    {
        match self {
            Some(ok) => Ok(ok),
            None => {
                let loc = format_caller(Location::caller());
                self.context(format!("{loc} {context}"))
            }
        }
    }

    #[track_caller]
    fn with_loc<C, F>(self, f: F) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        match self {
            Some(ok) => Ok(ok),
            None => {
                let loc = format_caller(Location::caller());
                self.with_context(|| format!("{loc} {}", f()))
            }
        }
    }
}
