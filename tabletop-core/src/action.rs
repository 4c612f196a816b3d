//! Actions and their resolution results.
//!
//! An [`Action`] is a transient value an object offers: a verb, the saves a
//! target must beat, and what happens when it lands. Delivering it to a
//! target produces an [`Outcome`] carrying the narrative and the structured
//! [`Effect`]s applied along the way.

use crate::attributes::{keys, AttributeError, AttributeMap};
use crate::config::RulesConfig;
use crate::dice::{Dice, DiceError, RollResult};
use crate::object::{ObjectBase, ObjectId};
use crate::random::RandomSource;
use crate::world::World;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// A dice formula with an optional threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub dice: Dice,
    pub threshold: Option<i32>,
}

impl Check {
    pub fn new(dice: Dice) -> Self {
        Self {
            dice,
            threshold: None,
        }
    }

    pub fn parse(formula: &str) -> Result<Self, DiceError> {
        Ok(Self::new(Dice::parse(formula)?))
    }

    pub fn with_threshold(mut self, threshold: i32) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.threshold {
            Some(threshold) => write!(f, "{} vs {threshold}", self.dice),
            None => write!(f, "{}", self.dice),
        }
    }
}

/// A verb offered by a source object, ready to be delivered to a target.
#[derive(Debug, Clone)]
pub struct Action {
    source: ObjectId,
    source_name: String,
    verb: String,
    saves: BTreeMap<String, Check>,
    damage: Option<Dice>,
    bonus_damage: Vec<Dice>,
    stacks: Vec<Dice>,
    inflicts: Option<String>,
    attributes: AttributeMap,
}

impl Action {
    pub fn new(source: &ObjectBase, verb: impl Into<String>) -> Self {
        Self {
            source: source.id,
            source_name: source.name.clone(),
            verb: verb.into(),
            saves: BTreeMap::new(),
            damage: None,
            bonus_damage: Vec::new(),
            stacks: Vec::new(),
            inflicts: None,
            attributes: AttributeMap::new(),
        }
    }

    /// Add a named save the target must beat.
    pub fn with_save(mut self, name: impl Into<String>, check: Check) -> Self {
        self.saves.insert(name.into(), check);
        self
    }

    pub fn with_damage(mut self, damage: Dice) -> Self {
        self.damage = Some(damage);
        self
    }

    /// Extra damage dice rolled on top of the action's own.
    pub fn with_bonus_damage(mut self, damage: Dice) -> Self {
        self.bonus_damage.push(damage);
        self
    }

    /// Dice for the number of condition stacks sent. Repeated calls add
    /// more dice.
    pub fn with_stacks(mut self, stacks: Dice) -> Self {
        self.stacks.push(stacks);
        self
    }

    /// Condition flag set on the target when the action lands.
    pub fn with_inflicts(mut self, condition: impl Into<String>) -> Self {
        self.inflicts = Some(condition.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.set(name, value);
        self
    }

    pub fn source(&self) -> ObjectId {
        self.source
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// The verb up to the first `.`.
    pub fn base_verb(&self) -> &str {
        self.verb
            .split_once('.')
            .map_or(self.verb.as_str(), |(base, _)| base)
    }

    /// The verb after the first `.`, if any.
    pub fn sub_type(&self) -> Option<&str> {
        self.verb.split_once('.').map(|(_, sub)| sub)
    }

    /// Saves in name order.
    pub fn saves(&self) -> &BTreeMap<String, Check> {
        &self.saves
    }

    pub fn save(&self, name: &str) -> Option<&Check> {
        self.saves.get(name)
    }

    pub fn damage(&self) -> Option<&Dice> {
        self.damage.as_ref()
    }

    pub fn bonus_damage(&self) -> &[Dice] {
        &self.bonus_damage
    }

    pub fn stacks(&self) -> &[Dice] {
        &self.stacks
    }

    pub fn inflicts(&self) -> Option<&str> {
        self.inflicts.as_deref()
    }

    /// Whether landing this action changes anything on the target.
    pub fn has_payload(&self) -> bool {
        self.damage.is_some() || self.inflicts.is_some() || !self.stacks.is_empty()
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn get(&self, attribute: &str) -> Result<&str, AttributeError> {
        self.attributes.get(attribute)
    }

    pub fn set(&mut self, attribute: impl Into<String>, value: impl ToString) -> Option<String> {
        self.attributes.set(attribute, value)
    }

    /// This action with the initiator's own bonuses folded in.
    ///
    /// Attacks gain `accuracy` and `accuracy.<sub>` on the hit save, and
    /// `damage` and `damage.<sub>` as extra damage dice. Every other save
    /// gains the action's `power` plus the initiator's `power.<verb>` and
    /// `power.<verb>.<sub>`, where `<verb>` is the base verb. Stacks gain
    /// `stacks.<verb>` and `stacks.<verb>.<sub>` dice. Malformed values
    /// are skipped with a warning.
    pub fn prepared_for(&self, initiator: &ObjectBase, config: &RulesConfig) -> Action {
        let mut action = self.clone();
        let bonuses = &initiator.attributes;
        let sub = self.sub_type();
        let verb = Some(self.base_verb());

        if let Some(hit) = action.saves.get_mut(&config.hit_save) {
            let accuracy = sum_bonuses(bonuses, &scoped_keys(keys::ACCURACY, None, sub));
            if accuracy != 0 {
                hit.dice = hit.dice.with_bonus(accuracy);
            }
        }
        if action.damage.is_some() {
            action
                .bonus_damage
                .extend(bonus_dice(bonuses, &scoped_keys(keys::DAMAGE, None, sub)));
        }

        let own_power = match self.attributes.get_int_or(keys::POWER, 0) {
            Ok(power) => power,
            Err(e) => {
                warn!(action = %self.verb, error = %e, "ignoring malformed power");
                0
            }
        };
        let power =
            own_power.saturating_add(sum_bonuses(bonuses, &scoped_keys(keys::POWER, verb, sub)));
        if power != 0 {
            for (name, check) in action.saves.iter_mut() {
                if *name != config.hit_save {
                    check.dice = check.dice.with_bonus(power);
                }
            }
            action.attributes.set(keys::POWER, power);
        }

        if !action.stacks.is_empty() {
            action
                .stacks
                .extend(bonus_dice(bonuses, &scoped_keys(keys::STACKS, verb, sub)));
        }
        action
    }

    /// Deliver this action to `target` on behalf of `initiator`.
    ///
    /// When `context` is given the target must be reachable from it, either
    /// directly or through an ancestor.
    pub fn act(
        &self,
        world: &mut World,
        initiator: ObjectId,
        target: ObjectId,
        context: Option<ObjectId>,
    ) -> Outcome {
        world.deliver(self, initiator, target, context)
    }
}

/// `key`, optionally qualified by `verb`, then the same qualified by `sub`.
fn scoped_keys(key: &str, verb: Option<&str>, sub: Option<&str>) -> Vec<String> {
    let root = verb.map_or_else(|| key.to_string(), |verb| keys::qualified(key, verb));
    match sub {
        Some(sub) => {
            let qualified = keys::qualified(&root, sub);
            vec![root, qualified]
        }
        None => vec![root],
    }
}

fn sum_bonuses(attributes: &AttributeMap, names: &[String]) -> i32 {
    names.iter().fold(0, |total, name| match attributes.get_int_opt(name) {
        Ok(Some(bonus)) => total.saturating_add(bonus),
        Ok(None) => total,
        Err(e) => {
            warn!(error = %e, "ignoring malformed bonus");
            total
        }
    })
}

fn bonus_dice(attributes: &AttributeMap, names: &[String]) -> Vec<Dice> {
    names
        .iter()
        .filter_map(|name| {
            let formula = attributes.get_opt(name)?;
            match Dice::parse(formula) {
                Ok(dice) => Some(dice),
                Err(e) => {
                    warn!(attribute = %name, error = %e, "ignoring malformed bonus dice");
                    None
                }
            }
        })
        .collect()
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} via {}", self.verb, self.source_name)?;
        let mut details: Vec<String> = self
            .saves
            .iter()
            .map(|(name, check)| format!("{name}: {check}"))
            .collect();
        if let Some(damage) = &self.damage {
            details.push(format!("damage {}", join_dice(Some(damage), &self.bonus_damage)));
        }
        if !self.stacks.is_empty() {
            details.push(format!("stacks {}", join_dice(None, &self.stacks)));
        }
        if let Some(condition) = &self.inflicts {
            details.push(format!("inflicts {condition}"));
        }
        if !details.is_empty() {
            write!(f, " ({})", details.join(", "))?;
        }
        Ok(())
    }
}

fn join_dice(first: Option<&Dice>, rest: &[Dice]) -> String {
    first
        .into_iter()
        .chain(rest)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" + ")
}

/// How an action resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeKind {
    Success,
    Failure,
    /// The target has no way to process the action.
    Refused,
    /// The target could not be located from the given context.
    TargetNotFound,
}

/// A state change recorded during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    DiceRolled {
        purpose: String,
        roll: RollResult,
    },
    AttributeChanged {
        object: ObjectId,
        attribute: String,
        old: Option<String>,
        new: String,
    },
    ObjectRevealed {
        object: ObjectId,
    },
}

/// Result of delivering an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub narrative: String,
    pub effects: Vec<Effect>,
}

impl Outcome {
    pub fn new(kind: OutcomeKind, narrative: impl Into<String>) -> Self {
        Self {
            kind,
            narrative: narrative.into(),
            effects: Vec::new(),
        }
    }

    pub fn success(narrative: impl Into<String>) -> Self {
        Self::new(OutcomeKind::Success, narrative)
    }

    pub fn failure(narrative: impl Into<String>) -> Self {
        Self::new(OutcomeKind::Failure, narrative)
    }

    pub fn refused(narrative: impl Into<String>) -> Self {
        Self::new(OutcomeKind::Refused, narrative)
    }

    pub fn target_not_found(narrative: impl Into<String>) -> Self {
        Self::new(OutcomeKind::TargetNotFound, narrative)
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    pub fn is_success(&self) -> bool {
        self.kind == OutcomeKind::Success
    }

    /// Every roll made during resolution, in draw order.
    pub fn rolls(&self) -> impl Iterator<Item = &RollResult> {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::DiceRolled { roll, .. } => Some(roll),
            _ => None,
        })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.narrative)
    }
}

/// What an object sees when asked for its offerings.
#[derive(Debug, Clone, Copy)]
pub struct Offer<'a> {
    /// The object the offer is being made to.
    pub actor: Option<&'a ObjectBase>,
    pub config: &'a RulesConfig,
}

impl<'a> Offer<'a> {
    pub fn new(actor: Option<&'a ObjectBase>, config: &'a RulesConfig) -> Self {
        Self { actor, config }
    }
}

/// Resolution state handed to the object receiving an action.
pub struct Turn<'a> {
    pub initiator: &'a str,
    /// Name of the context the action is delivered in.
    pub context: Option<&'a str>,
    pub config: &'a RulesConfig,
    pub rng: &'a mut dyn RandomSource,
}

impl Turn<'_> {
    /// Roll `dice` from this turn's random source.
    pub fn roll(&mut self, dice: &Dice, purpose: &str) -> RollResult {
        let roll = dice.roll_detailed_with(&mut *self.rng);
        debug!(purpose, dice = %dice, total = roll.total, "rolled");
        roll
    }

    /// Roll and record the roll as an effect.
    pub fn roll_into(&mut self, dice: &Dice, purpose: &str, effects: &mut Vec<Effect>) -> RollResult {
        let roll = self.roll(dice, purpose);
        effects.push(Effect::DiceRolled {
            purpose: purpose.to_string(),
            roll: roll.clone(),
        });
        roll
    }

    /// Suffix naming the context, or nothing.
    pub fn location(&self) -> String {
        self.context
            .map(|context| format!(" in {context}"))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRolls;

    fn sword() -> ObjectBase {
        ObjectBase::new("Sword", "")
    }

    #[test]
    fn test_verb_parts() {
        let action = Action::new(&sword(), "ATTACK.slash");
        assert_eq!(action.base_verb(), "ATTACK");
        assert_eq!(action.sub_type(), Some("slash"));

        let action = Action::new(&sword(), "ATTACK");
        assert_eq!(action.base_verb(), "ATTACK");
        assert_eq!(action.sub_type(), None);
    }

    #[test]
    fn test_display() {
        let action = Action::new(&sword(), "ATTACK")
            .with_save("hit", Check::parse("1d20+5").unwrap().with_threshold(10))
            .with_damage(Dice::parse("1d6").unwrap());
        assert_eq!(
            action.to_string(),
            "ATTACK via Sword (hit: 1d20+5 vs 10, damage 1d6)"
        );
    }

    #[test]
    fn test_action_attributes() {
        let mut action = Action::new(&sword(), "LOCKPICK").with_attribute("skill", 3);
        assert_eq!(action.get("skill"), Ok("3"));
        action.set("skill", 4);
        assert_eq!(action.attributes().get_int("skill"), Ok(4));
        assert!(action.get("missing").is_err());
    }

    #[test]
    fn test_display_with_bonus_damage_and_stacks() {
        let action = Action::new(&sword(), "ATTACK")
            .with_damage(Dice::parse("1d6").unwrap())
            .with_bonus_damage(Dice::parse("1d4").unwrap());
        assert_eq!(action.to_string(), "ATTACK via Sword (damage 1d6 + 1d4)");

        let hex = Action::new(&ObjectBase::new("Wand", ""), "MENTAL.X")
            .with_stacks(Dice::flat(2))
            .with_stacks(Dice::parse("1d4").unwrap());
        assert_eq!(hex.to_string(), "MENTAL.X via Wand (stacks 2 + 1d4)");
        assert!(hex.has_payload());
        assert!(!Action::new(&sword(), "WAVE").has_payload());
    }

    #[test]
    fn test_unskilled_initiator_adds_nothing() {
        let config = RulesConfig::default();
        let attack = Action::new(&sword(), "ATTACK.ten")
            .with_save("hit", Check::parse("1d20+10").unwrap())
            .with_damage(Dice::flat(10));
        let prepared = attack.prepared_for(&ObjectBase::new("Lame attacker", ""), &config);
        assert_eq!(prepared.save("hit").unwrap().dice.to_string(), "1d20+10");
        assert!(prepared.bonus_damage().is_empty());
        assert!(prepared.get(keys::POWER).is_err());
    }

    #[test]
    fn test_skilled_initiator_adds_accuracy_and_damage() {
        let config = RulesConfig::default();
        let mut skilled = ObjectBase::new("Skilled attacker", "");
        skilled.attributes.set("accuracy", 10);
        skilled.attributes.set("damage", "10");
        skilled.attributes.set("accuracy.twenty", 20);
        skilled.attributes.set("damage.twenty", "20");

        let plain = Action::new(&sword(), "ATTACK")
            .with_save("hit", Check::parse("1d20").unwrap())
            .with_damage(Dice::flat(1))
            .prepared_for(&skilled, &config);
        assert_eq!(plain.save("hit").unwrap().dice.to_string(), "1d20+10");
        assert_eq!(plain.bonus_damage(), &[Dice::flat(10)]);

        let twenty = Action::new(&sword(), "ATTACK.twenty")
            .with_save("hit", Check::parse("1d20+20").unwrap())
            .with_damage(Dice::flat(20))
            .prepared_for(&skilled, &config);
        assert_eq!(twenty.save("hit").unwrap().dice.to_string(), "1d20+50");
        assert_eq!(twenty.bonus_damage(), &[Dice::flat(10), Dice::flat(20)]);
    }

    #[test]
    fn test_skilled_sender_adds_power_and_stacks() {
        let config = RulesConfig::default();
        let mut sender = ObjectBase::new("Skilled sender", "");
        sender.attributes.set("power.MENTAL", 10);
        sender.attributes.set("stacks.MENTAL", "10");
        sender.attributes.set("power.MENTAL.Y", 20);
        sender.attributes.set("stacks.MENTAL.Y", "20");
        sender.attributes.set("accuracy", 99);

        let wand = ObjectBase::new("Wand", "");
        let x = Action::new(&wand, "MENTAL.X")
            .with_attribute(keys::POWER, 10)
            .with_stacks(Dice::flat(10))
            .prepared_for(&sender, &config);
        assert_eq!(x.attributes().get_int(keys::POWER), Ok(20));
        assert_eq!(x.stacks(), &[Dice::flat(10), Dice::flat(10)]);

        let y = Action::new(&wand, "MENTAL.Y")
            .with_save("MENTAL", Check::parse("1d20").unwrap())
            .with_attribute(keys::POWER, 20)
            .with_stacks(Dice::flat(20))
            .prepared_for(&sender, &config);
        assert_eq!(y.save("MENTAL").unwrap().dice.to_string(), "1d20+50");
        assert_eq!(y.stacks(), &[Dice::flat(20), Dice::flat(10), Dice::flat(20)]);
    }

    #[test]
    fn test_malformed_bonuses_are_skipped() {
        let config = RulesConfig::default();
        let mut clumsy = ObjectBase::new("Clumsy", "");
        clumsy.attributes.set("accuracy", "lots");
        clumsy.attributes.set("damage", "a bit");
        let attack = Action::new(&sword(), "ATTACK")
            .with_save("hit", Check::parse("1d20").unwrap())
            .with_damage(Dice::flat(1))
            .prepared_for(&clumsy, &config);
        assert_eq!(attack.save("hit").unwrap().dice.to_string(), "1d20");
        assert!(attack.bonus_damage().is_empty());
    }

    #[test]
    fn test_outcome_display_is_narrative() {
        let outcome = Outcome::failure("The goblin dodges");
        assert_eq!(outcome.to_string(), "The goblin dodges");
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_turn_records_rolls() {
        let config = RulesConfig::default();
        let mut rng = ScriptedRolls::new([4, 2]);
        let mut turn = Turn {
            initiator: "Hero",
            context: Some("Room"),
            config: &config,
            rng: &mut rng,
        };
        let mut effects = Vec::new();
        let roll = turn.roll_into(&Dice::parse("2d6+1").unwrap(), "damage", &mut effects);
        assert_eq!(roll.total, 7);
        assert_eq!(turn.location(), " in Room");

        let outcome = Outcome::success("hit").with_effects(effects);
        assert_eq!(outcome.rolls().map(|r| r.total).collect::<Vec<_>>(), vec![7]);
    }
}
