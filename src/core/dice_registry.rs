/// Custom dice — named dice whose faces carry a label and a value.
use rand::Rng;
use rustc_hash::FxHashMap;

use crate::schema::die::Face;

/// Name of the built-in Fudge/Fate die.
pub const FUDGE_DIE: &str = "F";

/// Registry of custom dice, keyed case-insensitively by name.
#[derive(Debug, Clone, Default)]
pub struct DiceRegistry {
    dice: FxHashMap<String, Vec<Face>>,
}

impl DiceRegistry {
    /// An empty registry with no dice at all.
    pub fn new() -> Self {
        Self {
            dice: FxHashMap::default(),
        }
    }

    /// A registry holding the built-in Fudge die (`-`, `0`, `+`).
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            FUDGE_DIE,
            vec![Face::new(-1, "-"), Face::new(0, "0"), Face::new(1, "+")],
        );
        registry
    }

    /// Register or replace a die. Returns `false` and leaves the registry
    /// unchanged if `faces` is empty.
    pub fn register(&mut self, name: &str, faces: Vec<Face>) -> bool {
        if faces.is_empty() {
            return false;
        }
        self.dice.insert(normalize(name), faces);
        true
    }

    pub fn get(&self, name: &str) -> Option<&[Face]> {
        self.dice.get(&normalize(name)).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dice.contains_key(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.dice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    /// Registered die names (normalized), sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.dice.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Roll one die of the named type. An unregistered name rolls
    /// [`Face::unknown`].
    pub fn roll<R: Rng + ?Sized>(&self, name: &str, rng: &mut R) -> Face {
        match self.get(name) {
            Some(faces) => faces[rng.gen_range(0..faces.len())].clone(),
            None => {
                tracing::warn!(die = name, "unknown custom die");
                Face::unknown()
            }
        }
    }
}

fn normalize(name: &str) -> String {
    name.to_lowercase()
}
