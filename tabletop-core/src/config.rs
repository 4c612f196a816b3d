//! Rules configuration.

use crate::dice::Dice;
use serde::{Deserialize, Serialize};

/// Tunable names and numbers the resolution rules consult.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Attribute damage is subtracted from.
    pub health_attribute: String,

    /// Attribute that reduces incoming damage.
    pub protection_attribute: String,

    /// Flag set when health drops to zero.
    pub incapacitated_attribute: String,

    /// Save name weapon attacks roll against.
    pub hit_save: String,

    /// Verb a context resolves itself by revealing concealed objects.
    pub search_verb: String,

    /// Attribute actors resist social verbs with when the action names no
    /// `save` of its own.
    pub resist_attribute: String,

    /// Threshold used when neither a condition nor a save names one.
    pub default_threshold: i32,

    /// Lowest skill level that is offered as an action.
    pub min_skill_proficiency: i32,

    /// Die rolled for skill checks, attacks without a to-hit formula and
    /// unscripted searches.
    pub skill_die: Dice,

    /// Seed for the world's generator; entropy when absent.
    pub seed: Option<u64>,
}

impl RulesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set the health attribute name.
    pub fn with_health_attribute(mut self, name: impl Into<String>) -> Self {
        self.health_attribute = name.into();
        self
    }

    /// Set the protection attribute name.
    pub fn with_protection_attribute(mut self, name: impl Into<String>) -> Self {
        self.protection_attribute = name.into();
        self
    }

    /// Set the incapacitated flag name.
    pub fn with_incapacitated_attribute(mut self, name: impl Into<String>) -> Self {
        self.incapacitated_attribute = name.into();
        self
    }

    /// Set the save name used by weapon attacks.
    pub fn with_hit_save(mut self, name: impl Into<String>) -> Self {
        self.hit_save = name.into();
        self
    }

    /// Set the verb contexts treat as a search.
    pub fn with_search_verb(mut self, verb: impl Into<String>) -> Self {
        self.search_verb = verb.into();
        self
    }

    /// Set the attribute social verbs are resisted with.
    pub fn with_resist_attribute(mut self, name: impl Into<String>) -> Self {
        self.resist_attribute = name.into();
        self
    }

    /// Set the fallback threshold.
    pub fn with_default_threshold(mut self, threshold: i32) -> Self {
        self.default_threshold = threshold;
        self
    }

    /// Set the minimum skill level offered.
    pub fn with_min_skill_proficiency(mut self, level: i32) -> Self {
        self.min_skill_proficiency = level;
        self
    }

    /// Set the die rolled for skill checks.
    pub fn with_skill_die(mut self, dice: Dice) -> Self {
        self.skill_die = dice;
        self
    }

    /// Seed the world's generator.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            health_attribute: "health".to_string(),
            protection_attribute: "protection".to_string(),
            incapacitated_attribute: "incapacitated".to_string(),
            hit_save: "hit".to_string(),
            search_verb: "SEARCH".to_string(),
            resist_attribute: "wisdom".to_string(),
            default_threshold: 10,
            min_skill_proficiency: 1,
            skill_die: Dice::d20(),
            seed: None,
        }
    }
}
