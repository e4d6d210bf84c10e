/// Table storage and the plain-text table file format.
///
/// A table file is a list of sections:
///
/// ```text
/// ;main
/// [rank] of [suit]
/// ;suit
/// # comments start with '#'
/// 3,Spades
/// Hearts
/// ```
///
/// Each `;name` line opens a section. `main` (any case) becomes the file's
/// own top-level table; every other section is stored as `<file>.<name>`.
/// Lines of the form `<digits>,<text>` carry an explicit weight.
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::schema::alternative::Alternative;
use crate::schema::table_name::{is_visible, section_key, MAIN_SECTION};

/// File extensions picked up by [`TableStore::load_dir`].
pub const TABLE_EXTENSIONS: &[&str] = &["txt", "tbl"];

const SECTION_MARKER: char = ';';
const COMMENT_MARKER: char = '#';

#[derive(Debug, Error)]
pub enum TableError {
    #[error("table file '{name}' has no ';' section header")]
    MalformedTableFile { name: String },
    #[error("cannot derive a table name from {0:?}")]
    InvalidFileName(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A named, ordered list of weighted alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub alternatives: Vec<Alternative>,
}

impl Table {
    pub fn new(name: impl Into<String>, alternatives: Vec<Alternative>) -> Self {
        Self {
            name: name.into(),
            alternatives,
        }
    }

    pub fn total_weight(&self) -> u64 {
        self.alternatives.iter().map(|a| u64::from(a.weight())).sum()
    }
}

/// All loaded tables, keyed by their full (possibly qualified) name.
///
/// Entries are only ever added or replaced, never removed.
#[derive(Debug, Clone, Default)]
pub struct TableStore {
    tables: FxHashMap<String, Table>,
}

impl TableStore {
    pub fn new() -> Self {
        Self {
            tables: FxHashMap::default(),
        }
    }

    /// Insert a table, replacing any table of the same name.
    pub fn insert(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Insert a table built from anything convertible into alternatives.
    pub fn insert_alternatives<I, A>(&mut self, name: &str, alternatives: I)
    where
        I: IntoIterator<Item = A>,
        A: Into<Alternative>,
    {
        let alternatives = alternatives.into_iter().map(Into::into).collect();
        self.insert(Table::new(name, alternatives));
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Every table name, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Names of top-level tables only (no qualifier), sorted. Sub-tables
    /// like `card.suit` stay hidden.
    pub fn visible_tables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .tables
            .keys()
            .map(String::as_str)
            .filter(|name| is_visible(name))
            .collect();
        names.sort_unstable();
        names
    }

    /// Merge another store into this one. Tables from `other` override
    /// tables in `self` with the same name.
    pub fn merge(&mut self, other: TableStore) {
        for (name, table) in other.tables {
            self.tables.insert(name, table);
        }
    }

    /// Parse the contents of one table file whose base name is `file_base`.
    pub fn parse_table_file(file_base: &str, contents: &str) -> Result<TableStore, TableError> {
        let mut sections: Vec<(String, Vec<Alternative>)> = Vec::new();
        let mut current: Option<usize> = None;

        for line in contents.lines() {
            let line = line.trim();

            if let Some(local) = line.strip_prefix(SECTION_MARKER) {
                let local = local.trim();
                let local = if local.is_empty() { MAIN_SECTION } else { local };
                let key = section_key(file_base, local);
                let index = match sections.iter().position(|(name, _)| *name == key) {
                    Some(index) => index,
                    None => {
                        sections.push((key, Vec::new()));
                        sections.len() - 1
                    }
                };
                current = Some(index);
                continue;
            }

            if line.is_empty() || line.starts_with(COMMENT_MARKER) {
                continue;
            }

            // Lines before the first header belong to no table.
            let Some(index) = current else {
                continue;
            };
            sections[index].1.push(parse_alternative(line));
        }

        if sections.is_empty() {
            return Err(TableError::MalformedTableFile {
                name: file_base.to_string(),
            });
        }

        let mut store = TableStore::new();
        for (name, alternatives) in sections {
            if alternatives.is_empty() {
                tracing::warn!(table = %name, "skipping table with no entries");
                continue;
            }
            store.insert(Table::new(name, alternatives));
        }
        tracing::debug!(file = file_base, tables = store.len(), "parsed table file");
        Ok(store)
    }

    /// Parse `contents` as the file `file_base` and merge the result in.
    /// A malformed file leaves the store untouched.
    pub fn load_str(&mut self, file_base: &str, contents: &str) -> Result<usize, TableError> {
        let parsed = Self::parse_table_file(file_base, contents)?;
        let count = parsed.len();
        self.merge(parsed);
        Ok(count)
    }

    /// Load one table file; its base name (no directory, no extension)
    /// becomes the top-level scope.
    pub fn load_file(&mut self, path: &Path) -> Result<usize, TableError> {
        let file_base = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TableError::InvalidFileName(path.to_path_buf()))?;
        let contents = std::fs::read_to_string(path)?;
        self.load_str(file_base, &contents)
    }

    /// Load every table file in `dir` (non-recursive), in name order.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, TableError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_table = path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| TABLE_EXTENSIONS.contains(&ext));
            if path.is_file() && is_table {
                paths.push(path);
            }
        }
        paths.sort();

        let mut count = 0;
        for path in &paths {
            count += self.load_file(path)?;
        }
        Ok(count)
    }
}

/// `3,Goblin` → weight 3; anything else is a weight-1 literal.
/// A zero weight is raised to 1.
fn parse_alternative(line: &str) -> Alternative {
    if let Some((digits, text)) = line.split_once(',') {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            let weight = digits.parse::<u32>().unwrap_or(u32::MAX);
            let weight = if weight == 0 {
                tracing::warn!(line, "zero weight raised to 1");
                1
            } else {
                weight
            };
            return Alternative::new(text.trim(), weight);
        }
    }
    Alternative::from(line)
}
