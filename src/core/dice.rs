/// Dice specs — parsing `NdF+M` and rolling it.
///
/// Grammar: an optional count, a literal `d` (either case), an optional face
/// token and an optional signed modifier. The face token is either a number of
/// faces or the name of a custom die:
///
/// - `2d6+3` → two six-sided dice plus 3
/// - `d` / `1d` → one die with the configured default faces
/// - `4dF` → four Fudge dice
/// - `3d10-` → a bare sign counts as a zero modifier
use rand::Rng;
use std::fmt;
use std::str::FromStr;

use crate::core::dice_registry::DiceRegistry;
use crate::core::SpecParseError;
use crate::schema::die::{DefaultFaces, Face, FaceSpec};

/// Upper bound on the dice rolled for one spec.
pub const MAX_DICE: u32 = 10_000;

/// Upper bound on the size of a modifier.
pub const MAX_MODIFIER: i64 = 1_000_000_000;

/// A parsed dice spec. Built fresh from text and consumed by [`DiceSpec::roll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceSpec {
    pub count: u32,
    pub faces: FaceSpec,
    pub modifier: i64,
}

impl DiceSpec {
    pub fn new(count: u32, faces: FaceSpec, modifier: i64) -> Self {
        Self {
            count,
            faces,
            modifier,
        }
    }

    /// Parse a dice spec, filling an empty face token from `default_faces`.
    pub fn parse(input: &str, default_faces: &DefaultFaces) -> Result<DiceSpec, SpecParseError> {
        if input.is_empty() {
            return Err(SpecParseError::Empty);
        }
        let no_match = || SpecParseError::NoMatch(input.to_string());

        let count_end = input
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(no_match)?;
        let (count_str, rest) = input.split_at(count_end);
        let rest = rest
            .strip_prefix('d')
            .or_else(|| rest.strip_prefix('D'))
            .ok_or_else(no_match)?;

        let face_end = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        let (face_str, modifier_str) = rest.split_at(face_end);

        let modifier = parse_modifier(modifier_str).ok_or_else(no_match)?;
        if modifier.abs() > MAX_MODIFIER {
            return Err(SpecParseError::NumberOutOfRange(input.to_string()));
        }

        let count = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse::<u32>()
                .ok()
                .filter(|n| *n <= MAX_DICE)
                .ok_or_else(|| SpecParseError::NumberOutOfRange(input.to_string()))?
        };

        let faces = if face_str.is_empty() {
            if default_faces.0 == FaceSpec::Numeric(0) {
                return Err(SpecParseError::ZeroFaces);
            }
            default_faces.0.clone()
        } else if face_str.bytes().all(|b| b.is_ascii_digit()) {
            let n = face_str
                .parse::<u32>()
                .map_err(|_| SpecParseError::NumberOutOfRange(input.to_string()))?;
            if n == 0 {
                return Err(SpecParseError::ZeroFaces);
            }
            FaceSpec::Numeric(n)
        } else {
            FaceSpec::Named(face_str.to_string())
        };

        Ok(DiceSpec {
            count,
            faces,
            modifier,
        })
    }

    /// Roll every die. Custom dice come from `registry`; unknown ones roll
    /// the `?` face worth 0.
    pub fn roll<R: Rng + ?Sized>(&self, registry: &DiceRegistry, rng: &mut R) -> DiceRoll {
        let faces = (0..self.count)
            .map(|_| match &self.faces {
                FaceSpec::Numeric(n) => Face::numbered(i64::from(rng.gen_range(1..=*n))),
                FaceSpec::Named(name) => registry.roll(name, rng),
            })
            .collect();
        DiceRoll {
            spec: self.clone(),
            faces,
        }
    }

    /// Smallest and largest possible totals for a numeric die.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        match self.faces {
            FaceSpec::Numeric(n) => {
                let count = i64::from(self.count);
                let high = count.saturating_mul(i64::from(n));
                Some((
                    count.saturating_add(self.modifier),
                    high.saturating_add(self.modifier),
                ))
            }
            FaceSpec::Named(_) => None,
        }
    }
}

impl FromStr for DiceSpec {
    type Err = SpecParseError;

    /// Parse with the stock default of six faces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceSpec::parse(s, &DefaultFaces::default())
    }
}

impl fmt::Display for DiceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.faces)?;
        if self.modifier != 0 {
            write!(f, "{:+}", self.modifier)?;
        }
        Ok(())
    }
}

/// `+3`, `-2`, or a bare sign (worth 0). `None` for anything else. Digits
/// too large for `i64` saturate so the caller's range check rejects them.
fn parse_modifier(s: &str) -> Option<i64> {
    if s.is_empty() {
        return Some(0);
    }
    let (sign, digits) = match s.as_bytes()[0] {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    if digits.is_empty() {
        return Some(0);
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(sign * digits.parse::<i64>().unwrap_or(i64::MAX))
}

/// The outcome of rolling a [`DiceSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceRoll {
    pub spec: DiceSpec,
    /// Faces in roll order.
    pub faces: Vec<Face>,
}

impl DiceRoll {
    /// Modifier plus the value of every rolled face, saturating at the `i64`
    /// limits (custom faces may carry any value).
    pub fn total(&self) -> i64 {
        self.faces
            .iter()
            .fold(self.spec.modifier, |sum, face| sum.saturating_add(face.value))
    }

    /// Human-readable breakdown: `4 = 4`, `(3 5) = 8`, `(4) +3 = 7`, `(+ - 0 +) = 1`.
    pub fn description(&self) -> String {
        let labels: Vec<&str> = self.faces.iter().map(|f| f.label.as_str()).collect();
        let labels = labels.join(" ");
        let total = self.total();

        if self.spec.modifier != 0 {
            return format!("({}) {:+} = {}", labels, self.spec.modifier, total);
        }
        match self.faces.as_slice() {
            [] => total.to_string(),
            [_] => format!("{} = {}", labels, total),
            _ => format!("({}) = {}", labels, total),
        }
    }
}

impl fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}
