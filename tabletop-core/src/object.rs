//! World objects.
//!
//! Every placeable thing composes an [`ObjectBase`] (identity, description,
//! attributes) and implements [`GameObject`], the two-hook capability
//! interface: offer actions, receive actions.

use crate::action::{Action, Offer, Outcome, Turn};
use crate::attributes::{keys, AttributeError, AttributeMap};
use crate::dice::Dice;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// Unique identifier for world objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity and attribute state shared by every object variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectBase {
    pub id: ObjectId,
    pub name: String,
    pub description: String,
    pub attributes: AttributeMap,
}

impl ObjectBase {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            description: description.into(),
            attributes: AttributeMap::new(),
        }
    }
}

impl fmt::Display for ObjectBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.description)
        }
    }
}

/// Capability interface every world object variant implements.
pub trait GameObject {
    fn base(&self) -> &ObjectBase;

    fn base_mut(&mut self) -> &mut ObjectBase;

    fn id(&self) -> ObjectId {
        self.base().id
    }

    fn name(&self) -> &str {
        &self.base().name
    }

    fn description(&self) -> &str {
        &self.base().description
    }

    fn attributes(&self) -> &AttributeMap {
        &self.base().attributes
    }

    /// Strict attribute lookup.
    fn get(&self, attribute: &str) -> Result<&str, AttributeError> {
        self.base().attributes.get(attribute)
    }

    /// Insert or overwrite an attribute on this object only.
    fn set(&mut self, attribute: impl Into<String>, value: impl ToString) -> Option<String>
    where
        Self: Sized,
    {
        self.base_mut().attributes.set(attribute, value)
    }

    /// Actions this object can currently offer.
    ///
    /// Recomputed on every call. The default offers one action per verb
    /// listed in the `actions` attribute.
    fn possible_actions(&self, _offer: &Offer<'_>) -> Vec<Action> {
        declared_actions(self.base())
    }

    /// Receive and process an action. The default refuses it.
    fn accept_action(&mut self, action: &Action, turn: &mut Turn<'_>) -> Outcome {
        refuse(self.base(), action, turn)
    }
}

/// One action per comma-separated verb in the `actions` attribute.
pub fn declared_actions(base: &ObjectBase) -> Vec<Action> {
    base.attributes
        .get_opt(keys::ACTIONS)
        .map(|verbs| {
            verbs
                .split(',')
                .map(str::trim)
                .filter(|verb| !verb.is_empty())
                .map(|verb| declared_action(base, verb))
                .collect()
        })
        .unwrap_or_default()
}

/// `verb` with whatever `save`, `power`, `stacks` and `inflicts` the object
/// declares for it, as `stacks.<verb>` or else plain `stacks`.
fn declared_action(base: &ObjectBase, verb: &str) -> Action {
    let attributes = &base.attributes;
    let lookup = |key: &str| {
        attributes
            .get_opt(&keys::qualified(key, verb))
            .or_else(|| attributes.get_opt(key))
    };

    let mut action = Action::new(base, verb);
    for key in [keys::SAVE, keys::POWER] {
        if let Some(value) = lookup(key) {
            action = action.with_attribute(key, value);
        }
    }
    if let Some(formula) = lookup(keys::STACKS) {
        match Dice::parse(formula) {
            Ok(stacks) => action = action.with_stacks(stacks),
            Err(e) => warn!(object = %base.name, verb, error = %e, "ignoring malformed stacks"),
        }
    }
    if let Some(condition) = lookup(keys::INFLICTS) {
        action = action.with_inflicts(condition);
    }
    action
}

/// The refusal every object falls back to.
pub fn refuse(base: &ObjectBase, action: &Action, turn: &Turn<'_>) -> Outcome {
    let mut narrative = format!(
        "{} cannot process {} from {} using {}",
        base.name,
        action.verb(),
        turn.initiator,
        action.source_name()
    );
    if let Some(context) = turn.context {
        narrative.push_str(&format!(" in {context}"));
    }
    Outcome::refused(narrative)
}

/// Verbal approaches offered by an interaction.
pub const INTERACTIONS: [&str; 7] = [
    "PERSUADE",
    "FLATTER",
    "BEG",
    "OUTRANK",
    "INTIMIDATE",
    "THREATEN",
    "CHEAT",
];

/// A plain object with no behaviour beyond the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thing {
    base: ObjectBase,
}

impl Thing {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            base: ObjectBase::new(name, description),
        }
    }

    /// An object offering the `VERBAL.*` approaches to an NPC.
    pub fn interaction(npc: &str) -> Self {
        let mut thing = Self::new(npc, format!("interaction with {npc}"));
        let verbs = INTERACTIONS
            .iter()
            .map(|verb| format!("VERBAL.{verb}"))
            .collect::<Vec<_>>()
            .join(",");
        thing.set(keys::ACTIONS, verbs);
        thing
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set(name, value);
        self
    }
}

impl GameObject for Thing {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }
}
