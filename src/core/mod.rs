//! Runtime: random choice, the dice and range grammars, table storage,
//! and recursive expansion.

pub mod choice;
pub mod config;
pub mod dice;
pub mod dice_registry;
pub mod engine;
pub mod expander;
pub mod range;
pub mod tables;

use thiserror::Error;

/// Why a dice or range spec did not match its grammar.
///
/// The expander treats every variant as "not this grammar" and moves on to
/// the next fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecParseError {
    #[error("empty spec")]
    Empty,
    #[error("'{0}' does not match the grammar")]
    NoMatch(String),
    #[error("number out of range in '{0}'")]
    NumberOutOfRange(String),
    #[error("a die needs at least one face")]
    ZeroFaces,
    #[error("empty range: {low} is not below {high}")]
    EmptyRange { low: i64, high: i64 },
}
