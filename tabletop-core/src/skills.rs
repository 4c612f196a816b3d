//! Skill sets.
//!
//! A [`Skills`] object maps skill names to proficiency levels and offers a
//! check for every skill at or above the minimum. The check rolls the
//! configured skill die plus the level and the actor's ability modifier.

use crate::action::{Action, Check, Offer};
use crate::attributes::keys;
use crate::config::RulesConfig;
use crate::object::{GameObject, ObjectBase};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

lazy_static! {
    /// Ability score each well-known skill draws on.
    static ref SKILL_ABILITIES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("LOCKPICK", "dexterity");
        m.insert("STEALTH", "dexterity");
        m.insert("INVESTIGATE", "intelligence");
        m.insert("SEARCH", "wisdom");
        m.insert("PERCEPTION", "wisdom");
        m.insert("PERSUADE", "charisma");
        m.insert("INTIMIDATE", "charisma");
        m.insert("ATHLETICS", "strength");
        m
    };
}

/// The ability governing `skill`, if it is a well-known one.
pub fn governing_ability(skill: &str) -> Option<&'static str> {
    SKILL_ABILITIES
        .get(skill.to_uppercase().as_str())
        .copied()
}

/// Modifier for an ability score: `(score - 10) / 2`, rounded down.
pub fn ability_modifier(score: i32) -> i32 {
    score.saturating_sub(10).div_euclid(2)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skills {
    base: ObjectBase,
    skill_map: BTreeMap<String, i32>,
}

impl Skills {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            base: ObjectBase::new(name, description),
            skill_map: BTreeMap::new(),
        }
    }

    pub fn with_skill(mut self, skill: impl Into<String>, level: i32) -> Self {
        self.set_skill(skill, level);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set(name, value);
        self
    }

    pub fn set_skill(&mut self, skill: impl Into<String>, level: i32) -> Option<i32> {
        self.skill_map.insert(skill.into(), level)
    }

    pub fn skill_level(&self, skill: &str) -> Option<i32> {
        self.skill_map.get(skill).copied()
    }

    pub fn skill_map(&self) -> &BTreeMap<String, i32> {
        &self.skill_map
    }

    /// Lowest level offered: the `minimum` attribute, else the config's.
    fn minimum(&self, config: &RulesConfig) -> i32 {
        match self
            .base
            .attributes
            .get_int_or(keys::MINIMUM, config.min_skill_proficiency)
        {
            Ok(minimum) => minimum,
            Err(e) => {
                warn!(skills = %self.base.name, error = %e, "ignoring malformed minimum");
                config.min_skill_proficiency
            }
        }
    }

    fn check_for(&self, skill: &str, level: i32, offer: &Offer<'_>) -> Check {
        let modifier = governing_ability(skill)
            .zip(offer.actor)
            .and_then(|(ability, actor)| actor.attributes.get_int_opt(ability).ok().flatten())
            .map(ability_modifier)
            .unwrap_or(0);
        let check = Check::new(offer.config.skill_die.with_bonus(level.saturating_add(modifier)));

        let dc = keys::qualified(keys::DC, skill);
        match self.base.attributes.get_int_opt(&dc) {
            Ok(Some(threshold)) => check.with_threshold(threshold),
            Ok(None) => check,
            Err(e) => {
                warn!(skills = %self.base.name, error = %e, "ignoring malformed difficulty");
                check
            }
        }
    }
}

impl GameObject for Skills {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn possible_actions(&self, offer: &Offer<'_>) -> Vec<Action> {
        let minimum = self.minimum(offer.config);
        self.skill_map
            .iter()
            .filter(|(_, level)| **level >= minimum)
            .map(|(skill, level)| {
                Action::new(&self.base, skill.as_str())
                    .with_save(skill.as_str(), self.check_for(skill, *level, offer))
                    .with_attribute(keys::SKILL, level)
            })
            .collect()
    }
}
