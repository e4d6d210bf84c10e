/// Built-in example tables, compiled into the library.
use crate::core::tables::{TableError, TableStore};

/// A deck of cards: `card`, `card.rank`, `card.suit`.
pub const CARD_TABLES: &str = include_str!("../table_data/card.txt");

/// Every built-in table file as `(file base name, contents)`.
pub const BUILTIN_FILES: &[(&str, &str)] = &[("card", CARD_TABLES)];

/// Parse the built-in tables into a fresh store.
pub fn default_tables() -> Result<TableStore, TableError> {
    let mut store = TableStore::new();
    for (name, contents) in BUILTIN_FILES {
        store.load_str(name, contents)?;
    }
    Ok(store)
}
