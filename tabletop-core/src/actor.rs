//! Actors: objects that resist and suffer actions.
//!
//! An actor carries two condition tables keyed by save name. A *fail*
//! condition lets the actor turn an action aside when its roll reaches the
//! threshold; a *make* condition is a check the action must pass before it
//! takes effect. Resolution runs in a fixed order so that the same random
//! source always replays the same outcome:
//!
//! 1. roll every save the action carries, in save-name order;
//! 2. roll every relevant fail condition, in name order; the first one that
//!    reaches its threshold ends resolution with a failure;
//! 3. roll every relevant make condition, in name order; the first one that
//!    misses ends resolution with a failure;
//! 4. apply damage, condition stacks and inflicted conditions.
//!
//! A fail condition without its own threshold is measured against the
//! matching save's total, so ties go to the defender.
//!
//! Actions no condition table covers can still be opposed by one of the
//! actor's attributes: the one named by the action's `save`, the `<attr>` of
//! a `SAVE.<attr>` verb, or the configured resist attribute for social
//! verbs. The actor resists when the attacking roll is at most its score.
//! Actions with nothing to oppose them land directly when they carry a
//! payload. Social verbs also leave a reaction flag behind either way.

use crate::action::{Action, Check, Effect, Outcome, OutcomeKind, Turn};
use crate::attributes::{keys, AttributeError};
use crate::config::RulesConfig;
use crate::dice::RollResult;
use crate::object::{refuse, GameObject, ObjectBase, ObjectId};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::warn;

/// Verb whose subtype names the attribute the target saves with.
pub const SAVE_VERB: &str = "SAVE";

lazy_static! {
    /// Flags a social verb leaves on its target: the first when the target
    /// resists, the second when it gives in.
    static ref REACTIONS: HashMap<&'static str, (&'static str, &'static str)> = {
        let mut m = HashMap::new();
        m.insert("PUSH", ("on-guard", "off-balance"));
        m.insert("CHEAT", ("suspicious", "fooled"));
        m.insert("PERSUADE", ("skeptical", "convinced"));
        m.insert("FLATTER", ("unsympathetic", "sympathetic"));
        m.insert("BEG", ("unsympathetic", "sympathetic"));
        m.insert("OUTRANK", ("hostile", "respectful"));
        m.insert("INTIMIDATE", ("hostile", "obedient"));
        m.insert("THREATEN", ("hostile", "frightened"));
        m
    };
}

/// The `(resisted, gave in)` flags for `action`, matched on its base verb
/// and then its subtype, so `VERBAL.PERSUADE` reacts like `PERSUADE`.
pub fn reaction_flags(action: &Action) -> Option<(&'static str, &'static str)> {
    std::iter::once(action.base_verb())
        .chain(action.sub_type())
        .find_map(|verb| REACTIONS.get(verb.to_uppercase().as_str()).copied())
}

/// The attribute a target opposes `action` with, if any.
fn opposed_by(action: &Action, config: &RulesConfig) -> Option<String> {
    if let Some(attribute) = action.attributes().get_opt(keys::SAVE) {
        return Some(attribute.to_string());
    }
    if action.base_verb().eq_ignore_ascii_case(SAVE_VERB) {
        return action.sub_type().map(str::to_string);
    }
    reaction_flags(action).map(|_| config.resist_attribute.clone())
}

/// A participant in the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    base: ObjectBase,
    make_conditions: BTreeMap<String, Check>,
    fail_conditions: BTreeMap<String, Check>,
    context: Option<ObjectId>,
}

impl Actor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            base: ObjectBase::new(name, description),
            make_conditions: BTreeMap::new(),
            fail_conditions: BTreeMap::new(),
            context: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set(name, value);
        self
    }

    /// A check actions with this save must pass.
    pub fn with_make_condition(mut self, name: impl Into<String>, check: Check) -> Self {
        self.add_make_condition(name, check);
        self
    }

    /// A check that turns actions with this save aside.
    pub fn with_fail_condition(mut self, name: impl Into<String>, check: Check) -> Self {
        self.add_fail_condition(name, check);
        self
    }

    pub fn add_make_condition(&mut self, name: impl Into<String>, check: Check) -> Option<Check> {
        self.make_conditions.insert(name.into(), check)
    }

    pub fn add_fail_condition(&mut self, name: impl Into<String>, check: Check) -> Option<Check> {
        self.fail_conditions.insert(name.into(), check)
    }

    pub fn make_conditions(&self) -> &BTreeMap<String, Check> {
        &self.make_conditions
    }

    pub fn fail_conditions(&self) -> &BTreeMap<String, Check> {
        &self.fail_conditions
    }

    /// The context this actor currently acts from.
    ///
    /// This is a back-reference only; membership is owned by the context.
    pub fn context(&self) -> Option<ObjectId> {
        self.context
    }

    /// Rebind the actor's context without touching any membership.
    pub fn set_context(&mut self, context: Option<ObjectId>) {
        self.context = context;
    }

    /// Flagged incapacitated, or health present and at most zero.
    pub fn is_incapacitated(&self, config: &RulesConfig) -> bool {
        let attributes = &self.base.attributes;
        attributes.get_flag(&config.incapacitated_attribute)
            || matches!(
                attributes.get_int_opt(&config.health_attribute),
                Ok(Some(health)) if health <= 0
            )
    }

    /// Save names this actor reacts to for `action`, in order.
    fn relevant_conditions(&self, action: &Action) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = action.saves().keys().cloned().collect();
        let verb = action.base_verb();
        if self.fail_conditions.contains_key(verb) || self.make_conditions.contains_key(verb) {
            names.insert(verb.to_string());
        }
        names
    }

    /// Protection against the action's subtype, falling back to the general
    /// value.
    fn protection(&self, action: &Action, config: &RulesConfig) -> Result<i32, AttributeError> {
        let attributes = &self.base.attributes;
        if let Some(sub) = action.sub_type() {
            let key = keys::qualified(&config.protection_attribute, sub);
            if let Some(value) = attributes.get_int_opt(&key)? {
                return Ok(value);
            }
        }
        attributes.get_int_or(&config.protection_attribute, 0)
    }

    fn record_change(&mut self, attribute: &str, value: impl ToString, effects: &mut Vec<Effect>) {
        let new = value.to_string();
        let old = self.base.attributes.set(attribute, &new);
        effects.push(Effect::AttributeChanged {
            object: self.base.id,
            attribute: attribute.to_string(),
            old,
            new,
        });
    }

    fn resists(
        &self,
        action: &Action,
        turn: &Turn<'_>,
        detail: &str,
        effects: Vec<Effect>,
    ) -> Outcome {
        Outcome::failure(format!(
            "{} resists {} from {} using {}{} ({detail})",
            self.base.name,
            action.verb(),
            turn.initiator,
            action.source_name(),
            turn.location()
        ))
        .with_effects(effects)
    }

    /// Resolve against the make and fail condition tables.
    fn resolve_conditions(
        &mut self,
        action: &Action,
        turn: &mut Turn<'_>,
        names: &BTreeSet<String>,
    ) -> Outcome {
        let default_threshold = turn.config.default_threshold;
        let mut effects = Vec::new();

        let mut offense: BTreeMap<&str, RollResult> = BTreeMap::new();
        for (name, check) in action.saves() {
            let roll = turn.roll_into(&check.dice, &format!("{} {name}", action.verb()), &mut effects);
            offense.insert(name.as_str(), roll);
        }

        for name in names {
            let Some(check) = self.fail_conditions.get(name) else {
                continue;
            };
            let threshold = check
                .threshold
                .or_else(|| offense.get(name.as_str()).map(|roll| roll.total))
                .unwrap_or(default_threshold);
            let roll = turn.roll_into(&check.dice, &format!("{} resists {name}", self.base.name), &mut effects);
            if roll.meets(threshold) {
                let detail = format!("{name} {} vs {threshold}", roll.total);
                return self.resists(action, turn, &detail, effects);
            }
        }

        let mut details = Vec::new();
        for name in names {
            let (made, detail) = if let Some(check) = self.make_conditions.get(name) {
                let threshold = check.threshold.unwrap_or(default_threshold);
                let roll = turn.roll_into(&check.dice, &format!("{} check {name}", action.verb()), &mut effects);
                (roll.meets(threshold), format!("{name} {} vs {threshold}", roll.total))
            } else if let Some(roll) = offense.get(name.as_str()) {
                let threshold = action
                    .save(name)
                    .and_then(|check| check.threshold)
                    .unwrap_or(default_threshold);
                (roll.meets(threshold), format!("{name} {} vs {threshold}", roll.total))
            } else {
                continue;
            };
            if !made {
                return Outcome::failure(format!(
                    "{}'s {} using {} misses {}{} ({detail})",
                    turn.initiator,
                    action.verb(),
                    action.source_name(),
                    self.base.name,
                    turn.location()
                ))
                .with_effects(effects);
            }
            details.push(detail);
        }

        self.land(action, turn, details, effects)
    }

    /// Resolve against one of this actor's attributes. The attacking roll is
    /// the action's first save, or the skill die plus the action's power.
    fn resolve_opposed(&mut self, action: &Action, turn: &mut Turn<'_>, attribute: &str) -> Outcome {
        let score = match self.base.attributes.get_int_or(attribute, 0) {
            Ok(score) => score,
            Err(e) => {
                warn!(actor = %self.base.name, error = %e, "cannot oppose action");
                return Outcome::refused(format!(
                    "{} cannot resist {}: {e}",
                    self.base.name,
                    action.verb()
                ));
            }
        };
        let check = action.saves().values().next().cloned().unwrap_or_else(|| {
            let power = action.attributes().get_int_or(keys::POWER, 0).unwrap_or(0);
            Check::new(turn.config.skill_die.with_bonus(power))
        });

        let mut effects = Vec::new();
        let roll = turn.roll_into(&check.dice, &format!("{} against {attribute}", action.verb()), &mut effects);
        let detail = format!("{} vs {attribute} {score}", roll.total);
        if roll.total <= score {
            return self.resists(action, turn, &detail, effects);
        }
        self.land(action, turn, vec![detail], effects)
    }

    /// Leave the reaction flags of a social verb on this actor.
    fn react(&mut self, action: &Action, mut outcome: Outcome) -> Outcome {
        let Some((resisted_flag, gave_in_flag)) = reaction_flags(action) else {
            return outcome;
        };
        let resisted = match outcome.kind {
            OutcomeKind::Success => false,
            OutcomeKind::Failure => true,
            OutcomeKind::Refused | OutcomeKind::TargetNotFound => return outcome,
        };
        self.record_change(resisted_flag, resisted, &mut outcome.effects);
        self.record_change(gave_in_flag, !resisted, &mut outcome.effects);
        let now = if resisted { resisted_flag } else { gave_in_flag };
        outcome
            .narrative
            .push_str(&format!("\n    {} is now {now}", self.base.name));
        outcome
    }

    fn land(
        &mut self,
        action: &Action,
        turn: &mut Turn<'_>,
        details: Vec<String>,
        mut effects: Vec<Effect>,
    ) -> Outcome {
        let config = turn.config;
        let mut narrative = format!(
            "{}'s {} using {} lands on {}{}",
            turn.initiator,
            action.verb(),
            action.source_name(),
            self.base.name,
            turn.location()
        );
        if !details.is_empty() {
            narrative.push_str(&format!(" ({})", details.join(", ")));
        }

        if let Some(damage) = action.damage() {
            let health = self
                .protection(action, config)
                .and_then(|protection| {
                    let health = self.base.attributes.get_int_opt(&config.health_attribute)?;
                    Ok((protection, health))
                });
            let (protection, health) = match health {
                Ok(values) => values,
                Err(e) => {
                    warn!(actor = %self.base.name, error = %e, "cannot apply damage");
                    return Outcome::refused(format!(
                        "{} cannot take damage: {e}",
                        self.base.name
                    ))
                    .with_effects(effects);
                }
            };

            let mut dealt = turn.roll_into(damage, "damage", &mut effects).total;
            for bonus in action.bonus_damage() {
                dealt = dealt.saturating_add(turn.roll_into(bonus, "bonus damage", &mut effects).total);
            }
            let taken = dealt.saturating_sub(protection).max(0);
            match health {
                None => narrative.push_str(&format!(
                    "\n    {} has no {} to lose",
                    self.base.name, config.health_attribute
                )),
                Some(_) if taken == 0 => narrative.push_str(&format!(
                    "\n    {}'s protection absorbs all {} damage",
                    self.base.name,
                    dealt.max(0)
                )),
                Some(old) => {
                    let remaining = old.saturating_sub(taken);
                    self.record_change(&config.health_attribute, remaining, &mut effects);
                    narrative.push_str(&format!(
                        "\n    {} {}: {old} - {taken} = {remaining}",
                        self.base.name, config.health_attribute
                    ));
                    if remaining <= 0 {
                        self.record_change(&config.incapacitated_attribute, true, &mut effects);
                        narrative.push_str(&format!(", and is {}", config.incapacitated_attribute));
                    }
                }
            }
        }

        if !action.stacks().is_empty() {
            let condition = action.inflicts().unwrap_or(action.verb()).to_string();
            let mut sent = 0i32;
            for stacks in action.stacks() {
                sent = sent.saturating_add(turn.roll_into(stacks, "stacks", &mut effects).total);
            }
            let sent = sent.max(0);
            let held = match self.base.attributes.get_int_or(&condition, 0) {
                Ok(held) => held,
                Err(e) => {
                    warn!(actor = %self.base.name, error = %e, "restarting condition count");
                    0
                }
            };
            let total = held.saturating_add(sent);
            self.record_change(&condition, total, &mut effects);
            narrative.push_str(&format!(
                "\n    {} {condition}: {held} + {sent} = {total}",
                self.base.name
            ));
        } else if let Some(condition) = action.inflicts() {
            self.record_change(condition, true, &mut effects);
            narrative.push_str(&format!("\n    {} is now {condition}", self.base.name));
        }

        Outcome::success(narrative).with_effects(effects)
    }
}

impl GameObject for Actor {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn accept_action(&mut self, action: &Action, turn: &mut Turn<'_>) -> Outcome {
        let names = self.relevant_conditions(action);
        let outcome = if !names.is_empty() {
            self.resolve_conditions(action, turn, &names)
        } else if let Some(attribute) = opposed_by(action, turn.config) {
            self.resolve_opposed(action, turn, &attribute)
        } else if action.has_payload() {
            self.land(action, turn, Vec::new(), Vec::new())
        } else {
            return refuse(&self.base, action, turn);
        };
        self.react(action, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::Dice;
    use crate::testing::ScriptedRolls;

    fn sword_attack() -> Action {
        Action::new(&ObjectBase::new("Sword", ""), "ATTACK")
            .with_save("hit", Check::parse("1d20+5").unwrap().with_threshold(10))
            .with_damage(Dice::parse("1d6").unwrap())
    }

    fn goblin() -> Actor {
        Actor::new("Goblin", "")
            .with_attribute("health", 7)
            .with_fail_condition("hit", Check::new(Dice::d20()).with_threshold(12))
    }

    fn resolve(target: &mut Actor, action: &Action, rolls: ScriptedRolls) -> Outcome {
        let config = RulesConfig::default();
        let mut rng = rolls;
        let mut turn = Turn {
            initiator: "Hero",
            context: Some("Room"),
            config: &config,
            rng: &mut rng,
        };
        target.accept_action(action, &mut turn)
    }

    #[test]
    fn test_hit_applies_damage() {
        let mut goblin = goblin();
        let outcome = resolve(&mut goblin, &sword_attack(), ScriptedRolls::new([13, 4, 3]));

        assert_eq!(outcome.kind, OutcomeKind::Success);
        assert_eq!(goblin.attributes().get_int("health"), Ok(4));
        assert_eq!(
            outcome.rolls().map(|r| r.total).collect::<Vec<_>>(),
            vec![18, 4, 3]
        );
        assert!(outcome.narrative.contains("Goblin health: 7 - 3 = 4"));
    }

    #[test]
    fn test_fail_condition_turns_aside() {
        let mut goblin = goblin();
        let outcome = resolve(&mut goblin, &sword_attack(), ScriptedRolls::new([13, 12]));

        assert_eq!(outcome.kind, OutcomeKind::Failure);
        assert_eq!(goblin.attributes().get_int("health"), Ok(7));
        assert_eq!(outcome.rolls().count(), 2);
    }

    #[test]
    fn test_missed_save_fails() {
        let mut goblin = goblin();
        let outcome = resolve(&mut goblin, &sword_attack(), ScriptedRolls::new([1, 1]));
        assert_eq!(outcome.kind, OutcomeKind::Failure);
        assert!(outcome.narrative.contains("hit 6 vs 10"));
    }

    #[test]
    fn test_fail_without_threshold_uses_offense_total() {
        let mut target = Actor::new("Duelist", "")
            .with_attribute("health", 5)
            .with_fail_condition("hit", Check::new(Dice::d20()));
        // 18 to hit, parry of exactly 18 wins the tie
        let outcome = resolve(&mut target, &sword_attack(), ScriptedRolls::new([13, 18]));
        assert_eq!(outcome.kind, OutcomeKind::Failure);

        let outcome = resolve(&mut target, &sword_attack(), ScriptedRolls::new([13, 17, 2]));
        assert_eq!(outcome.kind, OutcomeKind::Success);
        assert_eq!(target.attributes().get_int("health"), Ok(3));
    }

    #[test]
    fn test_make_condition_on_verb() {
        let mut door = Actor::new("Door", "")
            .with_make_condition("OPEN", Check::new(Dice::d20()).with_threshold(15));
        let open = Action::new(&ObjectBase::new("Hands", ""), "OPEN").with_inflicts("open");

        let outcome = resolve(&mut door, &open, ScriptedRolls::new([14]));
        assert_eq!(outcome.kind, OutcomeKind::Failure);
        assert!(!door.attributes().get_flag("open"));

        let outcome = resolve(&mut door, &open, ScriptedRolls::new([15]));
        assert_eq!(outcome.kind, OutcomeKind::Success);
        assert!(door.attributes().get_flag("open"));
    }

    #[test]
    fn test_unrelated_action_is_refused() {
        let mut goblin = goblin();
        let wave = Action::new(&ObjectBase::new("Hand", ""), "WAVE");
        let outcome = resolve(&mut goblin, &wave, ScriptedRolls::always_highest());
        assert_eq!(outcome.kind, OutcomeKind::Refused);
        assert_eq!(
            outcome.narrative,
            "Goblin cannot process WAVE from Hero using Hand in Room"
        );
    }

    #[test]
    fn test_protection_by_subtype() {
        let mut knight = Actor::new("Knight", "")
            .with_attribute("health", 10)
            .with_attribute("protection", 1)
            .with_attribute("protection.pierce", 5);
        let thrust = Action::new(&ObjectBase::new("Spear", ""), "ATTACK.pierce")
            .with_save("hit", Check::new(Dice::flat(20)))
            .with_damage(Dice::flat(4));
        let outcome = resolve(&mut knight, &thrust, ScriptedRolls::always_lowest());
        assert_eq!(outcome.kind, OutcomeKind::Success);
        assert_eq!(knight.attributes().get_int("health"), Ok(10));
        assert!(outcome.narrative.contains("absorbs"));

        let slash = Action::new(&ObjectBase::new("Axe", ""), "ATTACK.slash")
            .with_save("hit", Check::new(Dice::flat(20)))
            .with_damage(Dice::flat(4));
        resolve(&mut knight, &slash, ScriptedRolls::always_lowest());
        assert_eq!(knight.attributes().get_int("health"), Ok(7));
    }

    #[test]
    fn test_lethal_damage_incapacitates() {
        let mut goblin = goblin();
        let outcome = resolve(&mut goblin, &sword_attack(), ScriptedRolls::new([20, 1, 6]));
        assert!(outcome.is_success());
        assert_eq!(goblin.attributes().get_int("health"), Ok(1));

        resolve(&mut goblin, &sword_attack(), ScriptedRolls::new([20, 1, 6]));
        assert!(goblin.is_incapacitated(&RulesConfig::default()));
        assert!(goblin.attributes().get_flag("incapacitated"));
    }

    #[test]
    fn test_no_health_to_lose() {
        let mut statue = Actor::new("Statue", "");
        let outcome = resolve(&mut statue, &sword_attack(), ScriptedRolls::new([20, 3]));
        assert!(outcome.is_success());
        assert!(outcome.narrative.contains("has no health to lose"));
    }

    #[test]
    fn test_malformed_health_is_refused() {
        let mut ghost = Actor::new("Ghost", "").with_attribute("health", "plenty");
        let outcome = resolve(&mut ghost, &sword_attack(), ScriptedRolls::new([20, 3]));
        assert_eq!(outcome.kind, OutcomeKind::Refused);
        assert_eq!(ghost.attributes().get("health"), Ok("plenty"));
    }

    #[test]
    fn test_extreme_health_saturates() {
        let mut lich = goblin().with_attribute("health", i32::MIN);
        let outcome = resolve(&mut lich, &sword_attack(), ScriptedRolls::new([20, 1, 6]));
        assert!(outcome.is_success(), "{outcome}");
        assert_eq!(lich.attributes().get_int("health"), Ok(i32::MIN));
        assert!(lich.is_incapacitated(&RulesConfig::default()));

        let mut cursed = goblin().with_attribute("protection", i32::MIN);
        let outcome = resolve(&mut cursed, &sword_attack(), ScriptedRolls::new([20, 1, 6]));
        assert!(outcome.is_success(), "{outcome}");
        assert_eq!(cursed.attributes().get_int("health"), Ok(7 - i32::MAX));
    }

    #[test]
    fn test_bonus_damage_is_added() {
        let mut dummy = Actor::new("Dummy", "").with_attribute("health", 10);
        let attack = Action::new(&ObjectBase::new("Sword", ""), "ATTACK")
            .with_save("hit", Check::new(Dice::flat(20)))
            .with_damage(Dice::flat(3))
            .with_bonus_damage(Dice::flat(2));
        let outcome = resolve(&mut dummy, &attack, ScriptedRolls::always_lowest());
        assert!(outcome.narrative.contains("Dummy health: 10 - 5 = 5"), "{outcome}");
    }

    #[test]
    fn test_payload_without_saves_lands() {
        let mut goblin = goblin();
        let rock = Action::new(&ObjectBase::new("Rock", ""), "DROP").with_damage(Dice::flat(2));
        let outcome = resolve(&mut goblin, &rock, ScriptedRolls::always_highest());
        assert_eq!(outcome.kind, OutcomeKind::Success);
        assert_eq!(goblin.attributes().get_int("health"), Ok(5));
        assert_eq!(outcome.rolls().count(), 1);
    }

    #[test]
    fn test_stacks_accumulate() {
        let mut target = Actor::new("Target", "");
        let hex = Action::new(&ObjectBase::new("Wand", ""), "MENTAL.X")
            .with_stacks(Dice::flat(2))
            .with_stacks(Dice::parse("1d4").unwrap());

        let outcome = resolve(&mut target, &hex, ScriptedRolls::new([3]));
        assert!(outcome.is_success());
        assert!(outcome.narrative.ends_with("Target MENTAL.X: 0 + 5 = 5"), "{outcome}");
        resolve(&mut target, &hex, ScriptedRolls::new([1]));
        assert_eq!(target.attributes().get_int("MENTAL.X"), Ok(8));
    }

    #[test]
    fn test_save_verb_opposes_attribute() {
        let mut rogue = Actor::new("Rogue", "").with_attribute("dexterity", 12);
        let trap = Action::new(&ObjectBase::new("Pit", ""), "SAVE.dexterity").with_inflicts("prone");

        let outcome = resolve(&mut rogue, &trap, ScriptedRolls::new([12]));
        assert_eq!(outcome.kind, OutcomeKind::Failure);
        assert_eq!(
            outcome.narrative,
            "Rogue resists SAVE.dexterity from Hero using Pit in Room (12 vs dexterity 12)"
        );
        assert!(!rogue.attributes().get_flag("prone"));

        let outcome = resolve(&mut rogue, &trap, ScriptedRolls::new([13]));
        assert_eq!(outcome.kind, OutcomeKind::Success);
        assert!(rogue.attributes().get_flag("prone"));
    }

    #[test]
    fn test_social_verb_leaves_reaction_flags() {
        let mut guard = Actor::new("Guard", "").with_attribute("wisdom", 10);
        let plea = Action::new(&ObjectBase::new("Parley", ""), "VERBAL.PERSUADE");

        let outcome = resolve(&mut guard, &plea, ScriptedRolls::new([8]));
        assert_eq!(outcome.kind, OutcomeKind::Failure);
        assert!(outcome.narrative.ends_with("Guard is now skeptical"), "{outcome}");
        assert!(guard.attributes().get_flag("skeptical"));
        assert!(!guard.attributes().get_flag("convinced"));

        let outcome = resolve(&mut guard, &plea, ScriptedRolls::new([15]));
        assert_eq!(outcome.kind, OutcomeKind::Success);
        assert_eq!(
            outcome.narrative,
            "Hero's VERBAL.PERSUADE using Parley lands on Guard in Room (15 vs wisdom 10)\n    Guard is now convinced"
        );
        assert!(guard.attributes().get_flag("convinced"));
        assert!(!guard.attributes().get_flag("skeptical"));
    }

    #[test]
    fn test_save_attribute_names_the_defense() {
        let mut ogre = Actor::new("Ogre", "").with_attribute("strength", 14);
        let shove = Action::new(&ObjectBase::new("Hands", ""), "PUSH")
            .with_attribute("save", "strength")
            .with_attribute("power", 3);
        let outcome = resolve(&mut ogre, &shove, ScriptedRolls::new([12]));
        assert!(outcome.is_success(), "{outcome}");
        assert!(outcome.narrative.contains("(15 vs strength 14)"));
        assert!(ogre.attributes().get_flag("off-balance"));
        assert!(!ogre.attributes().get_flag("on-guard"));
    }

    #[test]
    fn test_malformed_defense_is_refused() {
        let mut ogre = Actor::new("Ogre", "").with_attribute("strength", "huge");
        let shove = Action::new(&ObjectBase::new("Hands", ""), "SAVE.strength");
        let outcome = resolve(&mut ogre, &shove, ScriptedRolls::always_highest());
        assert_eq!(outcome.kind, OutcomeKind::Refused);
        assert!(!ogre.attributes().get_flag("off-balance"));
    }

    #[test]
    fn test_context_is_back_reference() {
        let mut actor = Actor::new("Hero", "");
        assert_eq!(actor.context(), None);
        let room = ObjectId::new();
        actor.set_context(Some(room));
        assert_eq!(actor.context(), Some(room));
    }
}
