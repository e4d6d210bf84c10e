//! Table Engine — procedural text from weighted random tables.
//!
//! Expands bracketed references inside randomly chosen table entries until
//! plain text remains. Two small grammars ride along with the expander and
//! work on their own: dice specs (`2d6+3`, `4dF`) and range specs (`3-17`,
//! `1>>>20`).

pub mod core;
pub mod defaults;
pub mod schema;
