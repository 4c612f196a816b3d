//! Weapons.
//!
//! A weapon offers one attack per mode listed in its `actions` attribute.
//! Modes may carry a subtype (`ATTACK.slash`), and any of `to-hit`,
//! `hit-threshold` or `damage` can be overridden per subtype as
//! `damage.slash` and so on. Every attack carries a hit save; without a
//! `to-hit` formula it rolls the configured skill die.

use crate::action::{Action, Check, Offer};
use crate::attributes::{keys, AttributeError, AttributeMap};
use crate::config::RulesConfig;
use crate::dice::Dice;
use crate::object::{GameObject, ObjectBase};
use crate::world::WorldError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Verb offered when a weapon lists no modes.
pub const DEFAULT_MODE: &str = "ATTACK";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weapon {
    base: ObjectBase,
}

impl Weapon {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            base: ObjectBase::new(name, description),
        }
    }

    /// Attack modes, e.g. `["ATTACK.slash", "ATTACK.thrust"]`.
    pub fn with_modes<I, S>(mut self, modes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let modes: Vec<String> = modes.into_iter().map(|m| m.as_ref().to_string()).collect();
        self.set(keys::ACTIONS, modes.join(","));
        self
    }

    pub fn with_to_hit(mut self, formula: &str) -> Self {
        self.set(keys::TO_HIT, formula);
        self
    }

    pub fn with_threshold(mut self, threshold: i32) -> Self {
        self.set(keys::HIT_THRESHOLD, threshold);
        self
    }

    pub fn with_damage(mut self, formula: &str) -> Self {
        self.set(keys::DAMAGE, formula);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set(name, value);
        self
    }

    /// Declared modes, or the default attack when the weapon has damage or
    /// to-hit but lists none.
    pub fn modes(&self) -> Vec<String> {
        let attributes = &self.base.attributes;
        let declared: Vec<String> = attributes
            .get_opt(keys::ACTIONS)
            .map(|modes| {
                modes
                    .split(',')
                    .map(str::trim)
                    .filter(|mode| !mode.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if declared.is_empty()
            && (attributes.contains(keys::DAMAGE) || attributes.contains(keys::TO_HIT))
        {
            return vec![DEFAULT_MODE.to_string()];
        }
        declared
    }

    /// Build the attack for one mode.
    pub fn attack(&self, mode: &str, config: &RulesConfig) -> Result<Action, WorldError> {
        let attributes = &self.base.attributes;
        let sub = mode.split_once('.').map(|(_, sub)| sub);
        let mut action = Action::new(&self.base, mode);

        let mut check = match mode_attribute(attributes, keys::TO_HIT, sub) {
            Some((_, formula)) => Check::parse(formula)?,
            None => Check::new(config.skill_die.clone()),
        };
        if let Some((key, value)) = mode_attribute(attributes, keys::HIT_THRESHOLD, sub) {
            let threshold = value.trim().parse().map_err(|_| AttributeError::NotNumeric {
                name: key,
                value: value.to_string(),
            })?;
            check = check.with_threshold(threshold);
        }
        action = action.with_save(config.hit_save.clone(), check);
        if let Some((_, formula)) = mode_attribute(attributes, keys::DAMAGE, sub) {
            action = action.with_damage(Dice::parse(formula)?);
        }
        if let Some((_, condition)) = mode_attribute(attributes, keys::INFLICTS, sub) {
            action = action.with_inflicts(condition);
        }
        Ok(action)
    }
}

/// The subtype override of `key` if present, else `key` itself.
fn mode_attribute<'a>(
    attributes: &'a AttributeMap,
    key: &str,
    sub: Option<&str>,
) -> Option<(String, &'a str)> {
    if let Some(sub) = sub {
        let qualified = keys::qualified(key, sub);
        if let Some(value) = attributes.get_opt(&qualified) {
            return Some((qualified, value));
        }
    }
    attributes.get_opt(key).map(|value| (key.to_string(), value))
}

impl GameObject for Weapon {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn possible_actions(&self, offer: &Offer<'_>) -> Vec<Action> {
        self.modes()
            .iter()
            .filter_map(|mode| match self.attack(mode, offer.config) {
                Ok(action) => Some(action),
                Err(e) => {
                    warn!(weapon = %self.base.name, mode = %mode, error = %e, "skipping attack mode");
                    None
                }
            })
            .collect()
    }
}
