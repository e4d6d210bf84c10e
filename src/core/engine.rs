/// The top-level engine: owns tables, dice, settings and the random source.
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::choice;
use crate::core::config::{ConfigError, EngineConfig};
use crate::core::dice::{DiceRoll, DiceSpec};
use crate::core::dice_registry::DiceRegistry;
use crate::core::expander::{ExpandError, TableExpander};
use crate::core::range::{RangeRoll, RangeSpec};
use crate::core::tables::{TableError, TableStore};
use crate::core::SpecParseError;
use crate::defaults;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("table error: {0}")]
    Table(#[from] TableError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("expansion error: {0}")]
    Expand(#[from] ExpandError),
    #[error("spec error: {0}")]
    Spec(#[from] SpecParseError),
}

/// Built via `TableEngine::builder()`.
pub struct TableEngine {
    tables: TableStore,
    dice: DiceRegistry,
    config: EngineConfig,
    rng: StdRng,
    seed: Option<u64>,
}

/// Builder for constructing a `TableEngine`.
pub struct TableEngineBuilder {
    table_dirs: Vec<PathBuf>,
    table_files: Vec<PathBuf>,
    config_path: Option<PathBuf>,
    builtin_tables: bool,
    seed: Option<u64>,
    /// Directly provided tables (for testing without files).
    tables: Option<TableStore>,
    /// Directly provided dice (for testing without files).
    dice: Option<DiceRegistry>,
    /// Directly provided settings (for testing without files).
    config: Option<EngineConfig>,
}

impl TableEngine {
    pub fn builder() -> TableEngineBuilder {
        TableEngineBuilder {
            table_dirs: Vec::new(),
            table_files: Vec::new(),
            config_path: None,
            builtin_tables: true,
            seed: None,
            tables: None,
            dice: None,
            config: None,
        }
    }

    /// Expand a table by name (or resolve it as dice, range, or literal).
    pub fn expand(&mut self, table_name: &str) -> Result<String, EngineError> {
        self.expand_in(table_name, None)
    }

    /// Expand a table name, qualifying it against `scope` first.
    pub fn expand_in(
        &mut self,
        table_name: &str,
        scope: Option<&str>,
    ) -> Result<String, EngineError> {
        let expander = TableExpander::with_config(&self.tables, &self.dice, &self.config);
        Ok(expander.expand(table_name, scope, &mut self.rng)?)
    }

    /// Substitute every `[reference]` in free text.
    pub fn expand_text(&mut self, text: &str) -> Result<String, EngineError> {
        let expander = TableExpander::with_config(&self.tables, &self.dice, &self.config);
        Ok(expander.expand_text(text, None, &mut self.rng)?)
    }

    pub fn roll_dice(&mut self, spec: &str) -> Result<DiceRoll, EngineError> {
        let spec = DiceSpec::parse(spec, &self.config.default_faces())?;
        Ok(spec.roll(&self.dice, &mut self.rng))
    }

    pub fn roll_range(&mut self, spec: &str) -> Result<RangeRoll, EngineError> {
        let spec = RangeSpec::parse(spec)?;
        Ok(spec.roll(&mut self.rng))
    }

    /// Pick uniformly from `a, b, c`.
    pub fn choose_from_list(&mut self, list: &str) -> Option<String> {
        choice::choose_from_list(list, &mut self.rng)
    }

    /// Top-level table names for pickers.
    pub fn visible_tables(&self) -> Vec<&str> {
        self.tables.visible_tables()
    }

    /// Load another table file; it overrides tables of the same name.
    pub fn load_file(&mut self, path: &Path) -> Result<usize, EngineError> {
        Ok(self.tables.load_file(path)?)
    }

    /// Restart the random sequence from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = Some(seed);
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn tables(&self) -> &TableStore {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> &mut TableStore {
        &mut self.tables
    }

    pub fn dice(&self) -> &DiceRegistry {
        &self.dice
    }

    pub fn dice_mut(&mut self) -> &mut DiceRegistry {
        &mut self.dice
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl TableEngineBuilder {
    /// Load every table file in `path` (non-recursive).
    pub fn tables_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.table_dirs.push(path.into());
        self
    }

    /// Load a single table file.
    pub fn table_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.table_files.push(path.into());
        self
    }

    /// Read settings from a RON file.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Whether to include the built-in `card` tables (on by default).
    pub fn builtin_tables(mut self, enabled: bool) -> Self {
        self.builtin_tables = enabled;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Provide tables directly (for testing without files).
    pub fn with_tables(mut self, tables: TableStore) -> Self {
        self.tables = Some(tables);
        self
    }

    /// Provide custom dice directly (for testing without files).
    pub fn with_dice(mut self, dice: DiceRegistry) -> Self {
        self.dice = Some(dice);
        self
    }

    /// Provide settings directly (for testing without files).
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<TableEngine, EngineError> {
        let config = match (self.config, &self.config_path) {
            (Some(config), _) => {
                config.validate()?;
                config
            }
            (None, Some(path)) => EngineConfig::load_from_ron(path)?,
            (None, None) => EngineConfig::default(),
        };

        let mut dice = self.dice.unwrap_or_else(DiceRegistry::with_builtin);
        config.register_dice(&mut dice)?;

        // Built-ins first so loaded and provided tables override them
        let mut tables = if self.builtin_tables {
            defaults::default_tables()?
        } else {
            TableStore::new()
        };
        if let Some(provided) = self.tables {
            tables.merge(provided);
        }
        for dir in &self.table_dirs {
            let count = tables.load_dir(dir)?;
            tracing::debug!(dir = %dir.display(), tables = count, "loaded table directory");
        }
        for path in &self.table_files {
            tables.load_file(path)?;
        }

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(TableEngine {
            tables,
            dice,
            config,
            rng,
            seed: self.seed,
        })
    }
}
