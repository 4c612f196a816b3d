//! Attribute stores.
//!
//! Every world object carries an [`AttributeMap`]: a string-keyed store of
//! string values with numeric parsing on demand. Lookups are strict; callers
//! that want a fallback say so explicitly with [`AttributeMap::get_int_or`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Well-known attribute names.
pub mod keys {
    /// Comma-separated verbs an object offers.
    pub const ACTIONS: &str = "actions";
    /// Dice formula a weapon attacks with.
    pub const TO_HIT: &str = "to-hit";
    /// Value the to-hit roll must reach.
    pub const HIT_THRESHOLD: &str = "hit-threshold";
    /// Dice formula for damage dealt.
    pub const DAMAGE: &str = "damage";
    /// Condition flag set on a target when an action lands.
    pub const INFLICTS: &str = "inflicts";
    /// How hard an object is to find; positive means concealed.
    pub const CONCEALMENT: &str = "concealment";
    /// Set once a concealed object has been discovered.
    pub const FOUND: &str = "found";
    /// Minimum proficiency for a skill to be offered.
    pub const MINIMUM: &str = "minimum";
    /// Per-skill difficulty, as `dc.<skill>`.
    pub const DC: &str = "dc";
    /// Proficiency level carried on skill actions.
    pub const SKILL: &str = "skill";
    /// Attribute a target resists an action with.
    pub const SAVE: &str = "save";
    /// Initiator bonus to an attack's hit save.
    pub const ACCURACY: &str = "accuracy";
    /// Bonus to a condition action's saves.
    pub const POWER: &str = "power";
    /// Dice formula for condition stacks sent.
    pub const STACKS: &str = "stacks";

    /// `<base>.<sub>`, the per-mode override of `base`.
    pub fn qualified(base: &str, sub: &str) -> String {
        format!("{base}.{sub}")
    }
}

/// Error type for attribute lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("Attribute not found: {0}")]
    NotFound(String),
    #[error("Attribute {name} is not numeric: {value:?}")]
    NotNumeric { name: String, value: String },
}

/// String-keyed attribute store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap {
    values: BTreeMap<String, String>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict lookup.
    pub fn get(&self, name: &str) -> Result<&str, AttributeError> {
        self.get_opt(name)
            .ok_or_else(|| AttributeError::NotFound(name.to_string()))
    }

    pub fn get_opt(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Strict numeric lookup.
    pub fn get_int(&self, name: &str) -> Result<i32, AttributeError> {
        let value = self.get(name)?;
        value
            .trim()
            .parse()
            .map_err(|_| AttributeError::NotNumeric {
                name: name.to_string(),
                value: value.to_string(),
            })
    }

    /// Numeric lookup where absence means `default`; a malformed value is
    /// still an error.
    pub fn get_int_or(&self, name: &str, default: i32) -> Result<i32, AttributeError> {
        match self.get_int(name) {
            Err(AttributeError::NotFound(_)) => Ok(default),
            other => other,
        }
    }

    /// Numeric lookup that yields `None` when absent.
    pub fn get_int_opt(&self, name: &str) -> Result<Option<i32>, AttributeError> {
        match self.get_int(name) {
            Ok(value) => Ok(Some(value)),
            Err(AttributeError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// True for `true`, `yes` and nonzero integers.
    pub fn get_flag(&self, name: &str) -> bool {
        match self.get_opt(name).map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "true" || v == "yes" => true,
            Some(v) => v.parse::<i64>().map(|n| n != 0).unwrap_or(false),
            None => false,
        }
    }

    /// Insert or overwrite, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl ToString) -> Option<String> {
        self.values.insert(name.into(), value.to_string())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.set(k, v);
        }
        map
    }
}
