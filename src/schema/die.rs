use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::SpecParseError;

/// One face of a die: the number it adds to a sum and the label shown for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Face {
    pub value: i64,
    pub label: String,
}

impl Face {
    pub fn new(value: i64, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }

    /// A plain numbered face, labelled with its own value.
    pub fn numbered(value: i64) -> Self {
        Self {
            value,
            label: value.to_string(),
        }
    }

    /// Rolled in place of a custom die that is not registered.
    pub fn unknown() -> Self {
        Self {
            value: 0,
            label: "?".to_string(),
        }
    }
}

impl From<(i64, &str)> for Face {
    fn from((value, label): (i64, &str)) -> Self {
        Self::new(value, label)
    }
}

/// What sits after the `d` in a dice spec.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceSpec {
    /// A numbered die with this many faces, 1 through n.
    Numeric(u32),
    /// A custom die looked up by name (case-insensitive).
    Named(String),
}

impl fmt::Display for FaceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

/// Face spec used when a dice spec leaves the face token empty (`2d`, `d+1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultFaces(pub FaceSpec);

impl DefaultFaces {
    /// Checked constructor: a numeric default needs at least one face.
    pub fn new(faces: FaceSpec) -> Result<Self, SpecParseError> {
        if faces == FaceSpec::Numeric(0) {
            return Err(SpecParseError::ZeroFaces);
        }
        Ok(Self(faces))
    }
}

impl Default for DefaultFaces {
    fn default() -> Self {
        Self(FaceSpec::Numeric(6))
    }
}
