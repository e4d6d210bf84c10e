/// Engine settings — default die faces, recursion bound, extra custom dice.
///
/// Loaded from RON:
///
/// ```ron
/// (
///     default_faces: Numeric(20),
///     max_depth: 32,
///     custom_dice: {
///         "coin": [(0, "tails"), (1, "heads")],
///     },
/// )
/// ```
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::core::dice_registry::DiceRegistry;
use crate::schema::die::{DefaultFaces, Face, FaceSpec};

/// Nesting limit for table expansion unless configured otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("custom die '{name}' has no faces")]
    InvalidDie { name: String },
    #[error("default faces must be at least 1")]
    ZeroDefaultFaces,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Faces used when a dice spec has no face token.
    pub default_faces: FaceSpec,
    /// Deepest allowed chain of nested table expansions.
    pub max_depth: usize,
    /// Custom dice registered on top of the built-in ones.
    pub custom_dice: HashMap<String, Vec<(i64, String)>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_faces: DefaultFaces::default().0,
            max_depth: DEFAULT_MAX_DEPTH,
            custom_dice: HashMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn load_from_ron(path: &Path) -> Result<EngineConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<EngineConfig, ConfigError> {
        let config: EngineConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        DefaultFaces::new(self.default_faces.clone())
            .map_err(|_| ConfigError::ZeroDefaultFaces)?;
        for (name, faces) in &self.custom_dice {
            if faces.is_empty() {
                return Err(ConfigError::InvalidDie { name: name.clone() });
            }
        }
        Ok(())
    }

    pub fn default_faces(&self) -> DefaultFaces {
        DefaultFaces(self.default_faces.clone())
    }

    /// Register the configured custom dice into `registry`.
    pub fn register_dice(&self, registry: &mut DiceRegistry) -> Result<(), ConfigError> {
        for (name, faces) in &self.custom_dice {
            let faces: Vec<Face> = faces
                .iter()
                .map(|(value, label)| Face::new(*value, label.as_str()))
                .collect();
            if !registry.register(name, faces) {
                return Err(ConfigError::InvalidDie { name: name.clone() });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.default_faces, FaceSpec::Numeric(6));
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.custom_dice.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let config = EngineConfig::parse_ron(
            r#"(
                default_faces: Named("F"),
                max_depth: 10,
                custom_dice: {
                    "coin": [(0, "tails"), (1, "heads")],
                },
            )"#,
        )
        .unwrap();
        assert_eq!(config.default_faces, FaceSpec::Named("F".to_string()));
        assert_eq!(config.max_depth, 10);
        assert_eq!(config.custom_dice["coin"].len(), 2);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config = EngineConfig::parse_ron("(max_depth: 5)").unwrap();
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.default_faces, FaceSpec::Numeric(6));
    }

    #[test]
    fn rejects_empty_die() {
        let err = EngineConfig::parse_ron(r#"(custom_dice: { "blank": [] })"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDie { name } if name == "blank"));
    }

    #[test]
    fn rejects_zero_default_faces() {
        assert!(matches!(
            EngineConfig::parse_ron("(default_faces: Numeric(0))"),
            Err(ConfigError::ZeroDefaultFaces)
        ));
    }

    #[test]
    fn rejects_bad_ron() {
        assert!(matches!(
            EngineConfig::parse_ron("(max_depth: \"deep\")"),
            Err(ConfigError::Ron(_))
        ));
    }

    #[test]
    fn registers_custom_dice() {
        let config = EngineConfig::parse_ron(
            r#"(custom_dice: { "Coin": [(0, "tails"), (1, "heads")] })"#,
        )
        .unwrap();
        let mut registry = DiceRegistry::with_builtin();
        config.register_dice(&mut registry).unwrap();
        assert!(registry.contains("coin"));
        assert!(registry.contains("F"));
    }
}
