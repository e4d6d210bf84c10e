use serde::{Deserialize, Serialize};

/// One entry of a table.
///
/// Entries written without an explicit weight count as weight 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alternative {
    /// Bare text, weight 1.
    Literal(String),
    /// Text with an explicit weight.
    Weighted(String, u32),
}

impl Alternative {
    /// Build an entry, collapsing weight 1 into `Literal`.
    pub fn new(text: impl Into<String>, weight: u32) -> Self {
        let text = text.into();
        if weight == 1 {
            Self::Literal(text)
        } else {
            Self::Weighted(text, weight)
        }
    }

    pub fn weight(&self) -> u32 {
        match self {
            Self::Literal(_) => 1,
            Self::Weighted(_, weight) => *weight,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Literal(text) | Self::Weighted(text, _) => text,
        }
    }
}

impl From<&str> for Alternative {
    fn from(text: &str) -> Self {
        Self::Literal(text.to_string())
    }
}

impl From<String> for Alternative {
    fn from(text: String) -> Self {
        Self::Literal(text)
    }
}

impl From<(&str, u32)> for Alternative {
    fn from((text, weight): (&str, u32)) -> Self {
        Self::new(text, weight)
    }
}
