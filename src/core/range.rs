/// Range specs — `low<sep>high` with biased sampling.
///
/// The separator picks how several draws are combined, and its length is the
/// number of draws:
///
/// - `3-17`, `3---17` → average of 1 or 3 draws
/// - `3<<17` → lowest of 2 draws
/// - `3>>>17` → highest of 3 draws
///
/// `low` may be negative (`-3-5`); `high` is always an unsigned literal.
use rand::Rng;
use std::fmt;
use std::str::FromStr;

use crate::core::SpecParseError;

/// How the draws of a range spec are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Arithmetic mean, rounded half up.
    Average,
    /// Smallest draw.
    Min,
    /// Largest draw.
    Max,
}

impl Combinator {
    fn from_separator(c: char) -> Option<Self> {
        match c {
            '-' => Some(Self::Average),
            '<' => Some(Self::Min),
            '>' => Some(Self::Max),
            _ => None,
        }
    }

    pub fn separator(self) -> char {
        match self {
            Self::Average => '-',
            Self::Min => '<',
            Self::Max => '>',
        }
    }

    /// Word used in descriptions: "average", "lowest", "highest".
    pub fn describe(self) -> &'static str {
        match self {
            Self::Average => "average",
            Self::Min => "lowest",
            Self::Max => "highest",
        }
    }

    fn combine(self, draws: &[i64]) -> i64 {
        match self {
            Self::Min => draws.iter().copied().min().unwrap_or(0),
            Self::Max => draws.iter().copied().max().unwrap_or(0),
            Self::Average => {
                if draws.is_empty() {
                    return 0;
                }
                let n = draws.len() as i128;
                let sum: i128 = draws.iter().map(|&d| i128::from(d)).sum();
                // floor(mean + 1/2)
                ((2 * sum + n).div_euclid(2 * n)) as i64
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    pub low: i64,
    pub high: i64,
    pub combinator: Combinator,
    pub draws: u32,
}

impl RangeSpec {
    pub fn new(low: i64, high: i64, combinator: Combinator, draws: u32) -> Self {
        Self {
            low,
            high,
            combinator,
            draws,
        }
    }

    pub fn parse(input: &str) -> Result<RangeSpec, SpecParseError> {
        if input.is_empty() {
            return Err(SpecParseError::Empty);
        }
        let no_match = || SpecParseError::NoMatch(input.to_string());
        let out_of_range = || SpecParseError::NumberOutOfRange(input.to_string());

        let (negative, body) = match input.strip_prefix('-') {
            Some(body) => (true, body),
            None => (false, input),
        };

        let low_end = body
            .find(|c: char| !c.is_ascii_digit())
            .filter(|&i| i > 0)
            .ok_or_else(no_match)?;
        let (low_str, rest) = body.split_at(low_end);

        let sep = rest.chars().next().ok_or_else(no_match)?;
        let combinator = Combinator::from_separator(sep).ok_or_else(no_match)?;
        let high_str = rest.trim_start_matches(sep);
        let sep_len = rest.len() - high_str.len();

        if high_str.is_empty() || !high_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(no_match());
        }

        let low = low_str.parse::<i64>().map_err(|_| out_of_range())?;
        let low = if negative { -low } else { low };
        let high = high_str.parse::<i64>().map_err(|_| out_of_range())?;
        let draws = u32::try_from(sep_len).map_err(|_| out_of_range())?;

        if low >= high {
            return Err(SpecParseError::EmptyRange { low, high });
        }

        Ok(RangeSpec {
            low,
            high,
            combinator,
            draws,
        })
    }

    /// Draw `draws` times from `[low, high]` and combine.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> RangeRoll {
        let draws: Vec<i64> = (0..self.draws.max(1))
            .map(|_| rng.gen_range(self.low..=self.high))
            .collect();
        let value = self.combinator.combine(&draws);
        RangeRoll {
            spec: self.clone(),
            draws,
            value,
        }
    }

    /// `[3-17]` for a single draw, `[3-17 (highest of 3)]` otherwise.
    pub fn description(&self) -> String {
        if self.draws <= 1 {
            format!("[{}-{}]", self.low, self.high)
        } else {
            format!(
                "[{}-{} ({} of {})]",
                self.low,
                self.high,
                self.combinator.describe(),
                self.draws
            )
        }
    }
}

impl FromStr for RangeSpec {
    type Err = SpecParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RangeSpec::parse(s)
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// The outcome of rolling a [`RangeSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRoll {
    pub spec: RangeSpec,
    /// Individual draws in order.
    pub draws: Vec<i64>,
    /// The combined result.
    pub value: i64,
}

impl fmt::Display for RangeRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.spec.description(), self.value)
    }
}
