//! Dice formulas.
//!
//! Supports `NdM`, `NdM+K` and `NdM-K` (count may be omitted, `%` means 100),
//! plus inclusive ranges (`3-18`) and flat constants (`14`). Parsing ignores
//! case and whitespace.

use crate::random::{RandomSource, RngSource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound on the number of dice in one pool.
const MAX_DICE: u32 = 1_000;

/// Error type for dice parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("No dice specified")]
    Empty,
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid dice count in {0}")]
    InvalidCount(String),
    #[error("Invalid die size in {0}")]
    InvalidSides(String),
    #[error("Invalid modifier in {0}")]
    InvalidModifier(String),
    #[error("Invalid range in {0}")]
    InvalidRange(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiceKind {
    Pool { count: u32, sides: u32, modifier: i32 },
    Range { min: i32, max: i32 },
    Flat(i32),
}

/// A parsed dice formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dice {
    kind: DiceKind,
}

impl Dice {
    /// Parse a dice formula.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let normalized: String = notation
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if normalized.is_empty() {
            return Err(DiceError::Empty);
        }

        let kind = if let Some((count, rest)) = normalized.split_once('d') {
            Self::parse_pool(&normalized, count, rest)?
        } else if let Ok(value) = normalized.parse::<i32>() {
            DiceKind::Flat(value)
        } else if let Some((split, _)) = normalized
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '-')
        {
            let min: i32 = normalized[..split]
                .parse()
                .map_err(|_| DiceError::InvalidRange(normalized.clone()))?;
            let max: i32 = normalized[split + 1..]
                .parse()
                .map_err(|_| DiceError::InvalidRange(normalized.clone()))?;
            if min >= max {
                return Err(DiceError::InvalidRange(normalized));
            }
            DiceKind::Range { min, max }
        } else {
            return Err(DiceError::InvalidNotation(normalized));
        };

        Ok(Self { kind })
    }

    fn parse_pool(notation: &str, count: &str, rest: &str) -> Result<DiceKind, DiceError> {
        let count: u32 = if count.is_empty() {
            1
        } else if !count.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DiceError::InvalidCount(notation.to_string()));
        } else {
            count
                .parse()
                .map_err(|_| DiceError::InvalidCount(notation.to_string()))?
        };
        if count == 0 || count > MAX_DICE {
            return Err(DiceError::InvalidCount(notation.to_string()));
        }

        let (sides_str, modifier_str) = match rest.find(|c: char| c == '+' || c == '-') {
            Some(pos) => (&rest[..pos], Some(&rest[pos..])),
            None => (rest, None),
        };

        let sides: u32 = if sides_str == "%" {
            100
        } else {
            sides_str
                .parse()
                .map_err(|_| DiceError::InvalidSides(notation.to_string()))?
        };
        if sides == 0 || i32::try_from(sides).is_err() {
            return Err(DiceError::InvalidSides(notation.to_string()));
        }

        let modifier: i32 = match modifier_str {
            Some(m) => m
                .parse()
                .map_err(|_| DiceError::InvalidModifier(notation.to_string()))?,
            None => 0,
        };

        Ok(DiceKind::Pool {
            count,
            sides,
            modifier,
        })
    }

    /// A pool of `count` dice with `sides` faces plus `modifier`.
    pub fn pool(count: u32, sides: u32, modifier: i32) -> Result<Self, DiceError> {
        let notation = Self::format_pool(count, sides, modifier);
        if count == 0 || count > MAX_DICE {
            return Err(DiceError::InvalidCount(notation));
        }
        if sides == 0 || i32::try_from(sides).is_err() {
            return Err(DiceError::InvalidSides(notation));
        }
        Ok(Self {
            kind: DiceKind::Pool {
                count,
                sides,
                modifier,
            },
        })
    }

    /// A single twenty-sided die.
    pub fn d20() -> Self {
        Self {
            kind: DiceKind::Pool {
                count: 1,
                sides: 20,
                modifier: 0,
            },
        }
    }

    /// A formula that always yields `value`.
    pub fn flat(value: i32) -> Self {
        Self {
            kind: DiceKind::Flat(value),
        }
    }

    /// Number of dice rolled (0 for ranges and constants).
    pub fn count(&self) -> u32 {
        match self.kind {
            DiceKind::Pool { count, .. } => count,
            DiceKind::Range { .. } | DiceKind::Flat(_) => 0,
        }
    }

    /// Faces per die (0 for ranges and constants).
    pub fn sides(&self) -> u32 {
        match self.kind {
            DiceKind::Pool { sides, .. } => sides,
            DiceKind::Range { .. } | DiceKind::Flat(_) => 0,
        }
    }

    pub fn modifier(&self) -> i32 {
        match self.kind {
            DiceKind::Pool { modifier, .. } => modifier,
            DiceKind::Range { .. } => 0,
            DiceKind::Flat(value) => value,
        }
    }

    /// Smallest possible total.
    pub fn min(&self) -> i32 {
        match self.kind {
            DiceKind::Pool {
                count, modifier, ..
            } => (count as i32).saturating_add(modifier),
            DiceKind::Range { min, .. } => min,
            DiceKind::Flat(value) => value,
        }
    }

    /// Largest possible total.
    pub fn max(&self) -> i32 {
        match self.kind {
            DiceKind::Pool {
                count,
                sides,
                modifier,
            } => (count as i32)
                .saturating_mul(sides as i32)
                .saturating_add(modifier),
            DiceKind::Range { max, .. } => max,
            DiceKind::Flat(value) => value,
        }
    }

    /// The same formula with `bonus` added to its result.
    pub fn with_bonus(&self, bonus: i32) -> Self {
        let kind = match self.kind {
            DiceKind::Pool {
                count,
                sides,
                modifier,
            } => DiceKind::Pool {
                count,
                sides,
                modifier: modifier.saturating_add(bonus),
            },
            DiceKind::Range { min, max } => DiceKind::Range {
                min: min.saturating_add(bonus),
                max: max.saturating_add(bonus),
            },
            DiceKind::Flat(value) => DiceKind::Flat(value.saturating_add(bonus)),
        };
        Self { kind }
    }

    /// Roll with the thread-local generator.
    pub fn roll(&self) -> i32 {
        self.roll_with(&mut RngSource::thread())
    }

    /// Roll with a specific random source (useful for testing).
    pub fn roll_with<R: RandomSource + ?Sized>(&self, rng: &mut R) -> i32 {
        self.roll_detailed_with(rng).total
    }

    /// Roll and keep every individual die.
    pub fn roll_detailed_with<R: RandomSource + ?Sized>(&self, rng: &mut R) -> RollResult {
        let (rolls, modifier) = match self.kind {
            DiceKind::Pool {
                count,
                sides,
                modifier,
            } => {
                let rolls = (0..count)
                    .map(|_| rng.next_in_range(1, sides as i32))
                    .collect();
                (rolls, modifier)
            }
            DiceKind::Range { min, max } => (vec![rng.next_in_range(min, max)], 0),
            DiceKind::Flat(value) => (Vec::new(), value),
        };

        let total = rolls
            .iter()
            .fold(modifier, |acc: i32, roll| acc.saturating_add(*roll));

        RollResult {
            notation: self.to_string(),
            rolls,
            modifier,
            total,
        }
    }

    fn format_pool(count: u32, sides: u32, modifier: i32) -> String {
        match modifier {
            0 => format!("{count}d{sides}"),
            m if m > 0 => format!("{count}d{sides}+{m}"),
            m => format!("{count}d{sides}{m}"),
        }
    }
}

impl FromStr for Dice {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dice::parse(s)
    }
}

impl TryFrom<String> for Dice {
    type Error = DiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Dice::parse(&value)
    }
}

impl From<Dice> for String {
    fn from(dice: Dice) -> Self {
        dice.to_string()
    }
}

impl fmt::Display for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiceKind::Pool {
                count,
                sides,
                modifier,
            } => write!(f, "{}", Self::format_pool(count, sides, modifier)),
            DiceKind::Range { min, max } => write!(f, "{min}-{max}"),
            DiceKind::Flat(value) => write!(f, "{value}"),
        }
    }
}

/// Result of a single roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub notation: String,
    pub rolls: Vec<i32>,
    pub modifier: i32,
    pub total: i32,
}

impl RollResult {
    /// Format the individual dice results for display.
    pub fn dice_display(&self) -> String {
        if self.rolls.is_empty() {
            return self.modifier.to_string();
        }

        let dice_str = format!(
            "[{}]",
            self.rolls
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        match self.modifier {
            0 => dice_str,
            m if m > 0 => format!("{dice_str} + {m}"),
            m => format!("{dice_str} - {}", m.abs()),
        }
    }

    /// Check if the roll meets or exceeds a threshold.
    pub fn meets(&self, threshold: i32) -> bool {
        self.total >= threshold
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.dice_display(), self.total)
    }
}

/// Convenience function to roll dice from a notation string.
pub fn roll(notation: &str) -> Result<RollResult, DiceError> {
    let dice = Dice::parse(notation)?;
    Ok(dice.roll_detailed_with(&mut RngSource::thread()))
}
