//! The world arena.
//!
//! Every object lives in one [`World`], keyed by [`ObjectId`]. Contexts hold
//! ids rather than objects, so the parent chain and an actor's current
//! context are plain lookups and never keep anything alive. Each object has
//! at most one owning context; moving it somewhere else releases it from the
//! old one.

use crate::action::{Action, Check, Effect, Offer, Outcome, Turn};
use crate::actor::Actor;
use crate::attributes::{keys, AttributeError, AttributeMap};
use crate::config::RulesConfig;
use crate::context::{Context, Role};
use crate::dice::DiceError;
use crate::object::{GameObject, ObjectBase, ObjectId, Thing};
use crate::random::{RandomSource, RngSource};
use crate::skills::Skills;
use crate::weapon::Weapon;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// Error type for world operations.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("Unknown object: {0}")]
    UnknownObject(ObjectId),

    #[error("{0} is not a context")]
    NotAContext(String),

    #[error("{0} is not an actor")]
    NotAnActor(String),

    #[error("{object} is not held by {context}")]
    NotInContext { object: String, context: String },

    #[error("{actor} is already a {existing} of {context}")]
    DuplicateMembership {
        actor: String,
        context: String,
        existing: Role,
    },

    #[error("Parenting {0} there would make it its own ancestor")]
    ParentCycle(String),

    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error(transparent)]
    Dice(#[from] DiceError),
}

/// Any object the world can hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorldObject {
    Thing(Thing),
    Actor(Actor),
    Weapon(Weapon),
    Skills(Skills),
    Context(Context),
}

impl WorldObject {
    pub fn as_object(&self) -> &dyn GameObject {
        match self {
            WorldObject::Thing(o) => o,
            WorldObject::Actor(o) => o,
            WorldObject::Weapon(o) => o,
            WorldObject::Skills(o) => o,
            WorldObject::Context(o) => o,
        }
    }

    pub fn as_object_mut(&mut self) -> &mut dyn GameObject {
        match self {
            WorldObject::Thing(o) => o,
            WorldObject::Actor(o) => o,
            WorldObject::Weapon(o) => o,
            WorldObject::Skills(o) => o,
            WorldObject::Context(o) => o,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WorldObject::Thing(_) => "thing",
            WorldObject::Actor(_) => "actor",
            WorldObject::Weapon(_) => "weapon",
            WorldObject::Skills(_) => "skills",
            WorldObject::Context(_) => "context",
        }
    }

    pub fn base(&self) -> &ObjectBase {
        self.as_object().base()
    }

    pub fn base_mut(&mut self) -> &mut ObjectBase {
        self.as_object_mut().base_mut()
    }

    pub fn id(&self) -> ObjectId {
        self.base().id
    }

    pub fn name(&self) -> &str {
        &self.base().name
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.base().attributes
    }

    pub fn as_actor(&self) -> Option<&Actor> {
        match self {
            WorldObject::Actor(actor) => Some(actor),
            _ => None,
        }
    }

    pub fn as_context(&self) -> Option<&Context> {
        match self {
            WorldObject::Context(context) => Some(context),
            _ => None,
        }
    }

    /// Positive concealment that has not been found yet.
    pub fn is_concealed(&self) -> bool {
        let attributes = self.attributes();
        !attributes.get_flag(keys::FOUND)
            && matches!(attributes.get_int_opt(keys::CONCEALMENT), Ok(Some(c)) if c > 0)
    }
}

impl From<Thing> for WorldObject {
    fn from(thing: Thing) -> Self {
        WorldObject::Thing(thing)
    }
}

impl From<Actor> for WorldObject {
    fn from(actor: Actor) -> Self {
        WorldObject::Actor(actor)
    }
}

impl From<Weapon> for WorldObject {
    fn from(weapon: Weapon) -> Self {
        WorldObject::Weapon(weapon)
    }
}

impl From<Skills> for WorldObject {
    fn from(skills: Skills) -> Self {
        WorldObject::Skills(skills)
    }
}

impl From<Context> for WorldObject {
    fn from(context: Context) -> Self {
        WorldObject::Context(context)
    }
}

struct Entry {
    object: WorldObject,
    owner: Option<ObjectId>,
}

/// Arena holding every object, the rules and the random source.
pub struct World {
    objects: HashMap<ObjectId, Entry>,
    rng: Box<dyn RandomSource>,
    config: RulesConfig,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("objects", &self.objects.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(RulesConfig::default())
    }
}

impl World {
    /// A world rolling from a generator seeded by `config.seed`, or from
    /// entropy when unset.
    pub fn new(config: RulesConfig) -> Self {
        let rng: Box<dyn RandomSource> = match config.seed {
            Some(seed) => Box::new(RngSource::seeded(seed)),
            None => Box::new(RngSource::from_entropy()),
        };
        Self {
            objects: HashMap::new(),
            rng,
            config,
        }
    }

    pub fn with_random_source(config: RulesConfig, rng: impl RandomSource + 'static) -> Self {
        Self {
            objects: HashMap::new(),
            rng: Box::new(rng),
            config,
        }
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Add an object to the arena, unplaced.
    pub fn insert(&mut self, object: impl Into<WorldObject>) -> ObjectId {
        let object = object.into();
        let id = object.id();
        debug!(id = %id, name = object.name(), kind = object.kind(), "object inserted");
        self.objects.insert(id, Entry { object, owner: None });
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&WorldObject> {
        self.objects.get(&id).map(|entry| &entry.object)
    }

    pub fn object(&self, id: ObjectId) -> Result<&WorldObject, WorldError> {
        self.get(id).ok_or(WorldError::UnknownObject(id))
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut WorldObject, WorldError> {
        self.objects
            .get_mut(&id)
            .map(|entry| &mut entry.object)
            .ok_or(WorldError::UnknownObject(id))
    }

    pub fn actor(&self, id: ObjectId) -> Result<&Actor, WorldError> {
        match self.object(id)? {
            WorldObject::Actor(actor) => Ok(actor),
            other => Err(WorldError::NotAnActor(other.name().to_string())),
        }
    }

    pub fn actor_mut(&mut self, id: ObjectId) -> Result<&mut Actor, WorldError> {
        match self.object_mut(id)? {
            WorldObject::Actor(actor) => Ok(actor),
            other => Err(WorldError::NotAnActor(other.name().to_string())),
        }
    }

    pub fn context(&self, id: ObjectId) -> Result<&Context, WorldError> {
        match self.object(id)? {
            WorldObject::Context(context) => Ok(context),
            other => Err(WorldError::NotAContext(other.name().to_string())),
        }
    }

    pub fn context_mut(&mut self, id: ObjectId) -> Result<&mut Context, WorldError> {
        match self.object_mut(id)? {
            WorldObject::Context(context) => Ok(context),
            other => Err(WorldError::NotAContext(other.name().to_string())),
        }
    }

    /// The context currently holding `id`.
    pub fn owner_of(&self, id: ObjectId) -> Option<ObjectId> {
        self.objects.get(&id).and_then(|entry| entry.owner)
    }

    fn name_of(&self, id: ObjectId) -> String {
        self.get(id)
            .map_or_else(|| id.to_string(), |object| object.name().to_string())
    }

    pub fn get_attribute(&self, id: ObjectId, name: &str) -> Result<&str, WorldError> {
        Ok(self.object(id)?.attributes().get(name)?)
    }

    pub fn set_attribute(
        &mut self,
        id: ObjectId,
        name: impl Into<String>,
        value: impl ToString,
    ) -> Result<Option<String>, WorldError> {
        Ok(self.object_mut(id)?.base_mut().attributes.set(name, value))
    }

    /// `context` followed by each of its ancestors.
    pub fn ancestors(&self, context: ObjectId) -> Result<Vec<ObjectId>, WorldError> {
        let mut chain = vec![context];
        let mut current = self.context(context)?.parent();
        while let Some(parent) = current {
            if chain.contains(&parent) {
                break;
            }
            match self.get(parent) {
                Some(WorldObject::Context(ctx)) => {
                    chain.push(parent);
                    current = ctx.parent();
                }
                _ => break,
            }
        }
        Ok(chain)
    }

    /// Look `name` up on `context`, then on each ancestor in turn.
    pub fn lookup_attribute(&self, context: ObjectId, name: &str) -> Result<&str, WorldError> {
        for scope in self.ancestors(context)? {
            if let Some(value) = self.context(scope)?.attributes().get_opt(name) {
                return Ok(value);
            }
        }
        Err(AttributeError::NotFound(name.to_string()).into())
    }

    /// Insert a new context, optionally nested in `parent`.
    pub fn create_context(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        parent: Option<ObjectId>,
    ) -> Result<ObjectId, WorldError> {
        if let Some(parent) = parent {
            self.context(parent)?;
        }
        let id = self.insert(Context::new(name, description));
        if parent.is_some() {
            self.set_parent(id, parent)?;
        }
        Ok(id)
    }

    /// Re-parent `context`, moving it out of its previous parent.
    ///
    /// Naming the current parent again changes nothing.
    pub fn set_parent(
        &mut self,
        context: ObjectId,
        parent: Option<ObjectId>,
    ) -> Result<(), WorldError> {
        if self.context(context)?.parent() == parent && self.owner_of(context) == parent {
            return Ok(());
        }
        if let Some(parent) = parent {
            if self.ancestors(parent)?.contains(&context) {
                return Err(WorldError::ParentCycle(self.name_of(context)));
            }
        }

        self.detach(context);
        self.context_mut(context)?.set_parent(parent);
        if let Some(parent) = parent {
            self.attach(parent, context, Role::Object)?;
        }
        debug!(
            context = %self.name_of(context),
            parent = ?parent.map(|p| self.name_of(p)),
            "context re-parented"
        );
        Ok(())
    }

    /// Place `object` in `context`. Contexts placed this way become
    /// children of `context`.
    pub fn add_object(&mut self, context: ObjectId, object: ObjectId) -> Result<(), WorldError> {
        if matches!(self.object(object)?, WorldObject::Context(_)) {
            return self.set_parent(object, Some(context));
        }
        self.place(context, object, Role::Object)
    }

    /// Place `actor` in `context` as a party member.
    pub fn add_member(&mut self, context: ObjectId, actor: ObjectId) -> Result<(), WorldError> {
        self.actor(actor)?;
        self.place(context, actor, Role::Member)
    }

    /// Place `actor` in `context` as an NPC.
    pub fn add_npc(&mut self, context: ObjectId, actor: ObjectId) -> Result<(), WorldError> {
        self.actor(actor)?;
        self.place(context, actor, Role::Npc)
    }

    fn place(&mut self, context: ObjectId, id: ObjectId, role: Role) -> Result<(), WorldError> {
        self.context(context)?;
        self.object(id)?;
        if self.owner_of(id) != Some(context) {
            self.detach(id);
        }
        self.attach(context, id, role)?;
        if let WorldObject::Actor(actor) = self.object_mut(id)? {
            actor.set_context(Some(context));
        }
        debug!(
            object = %self.name_of(id),
            context = %self.name_of(context),
            role = %role,
            "object placed"
        );
        Ok(())
    }

    fn attach(&mut self, context: ObjectId, id: ObjectId, role: Role) -> Result<(), WorldError> {
        let ctx = self.context_mut(context)?;
        if let Err(existing) = ctx.insert(id, role) {
            let context = ctx.name().to_string();
            return Err(WorldError::DuplicateMembership {
                actor: self.name_of(id),
                context,
                existing,
            });
        }
        if let Some(entry) = self.objects.get_mut(&id) {
            entry.owner = Some(context);
        }
        Ok(())
    }

    /// Release `id` from its owning context, if any.
    fn detach(&mut self, id: ObjectId) {
        let Some(owner) = self.objects.get_mut(&id).and_then(|entry| entry.owner.take()) else {
            return;
        };
        if let Some(WorldObject::Context(ctx)) = self.objects.get_mut(&owner).map(|e| &mut e.object) {
            ctx.remove(id);
        }
    }

    /// Remove `object` from `context` and from the world, along with
    /// everything it holds.
    pub fn remove_object(
        &mut self,
        context: ObjectId,
        object: ObjectId,
    ) -> Result<WorldObject, WorldError> {
        let ctx = self.context(context)?;
        if !ctx.contains(object) {
            return Err(WorldError::NotInContext {
                object: self.name_of(object),
                context: ctx.name().to_string(),
            });
        }
        self.context_mut(context)?.remove(object);
        self.destroy(object).ok_or(WorldError::UnknownObject(object))
    }

    fn destroy(&mut self, id: ObjectId) -> Option<WorldObject> {
        let mut object = self.objects.remove(&id)?.object;
        match &mut object {
            WorldObject::Context(ctx) => {
                for child in ctx.get_objects() {
                    if self.owner_of(child) == Some(id) {
                        self.destroy(child);
                    }
                    ctx.remove(child);
                }
                ctx.set_parent(None);
            }
            WorldObject::Actor(actor) => actor.set_context(None),
            _ => {}
        }
        debug!(id = %id, name = object.name(), "object removed");
        Some(object)
    }

    pub fn get_objects(&self, context: ObjectId) -> Result<Vec<ObjectId>, WorldError> {
        Ok(self.context(context)?.get_objects())
    }

    pub fn get_party(&self, context: ObjectId) -> Result<Vec<ObjectId>, WorldError> {
        Ok(self.context(context)?.get_party())
    }

    pub fn get_npcs(&self, context: ObjectId) -> Result<Vec<ObjectId>, WorldError> {
        Ok(self.context(context)?.get_npcs())
    }

    /// Objects that are not concealed, or have been found.
    pub fn visible_objects(&self, context: ObjectId) -> Result<Vec<ObjectId>, WorldError> {
        self.filter_objects(context, |object| !object.is_concealed())
    }

    /// Concealed objects nobody has found yet.
    pub fn hidden_objects(&self, context: ObjectId) -> Result<Vec<ObjectId>, WorldError> {
        self.filter_objects(context, WorldObject::is_concealed)
    }

    fn filter_objects(
        &self,
        context: ObjectId,
        keep: impl Fn(&WorldObject) -> bool,
    ) -> Result<Vec<ObjectId>, WorldError> {
        Ok(self
            .context(context)?
            .objects()
            .iter()
            .copied()
            .filter(|id| self.get(*id).is_some_and(&keep))
            .collect())
    }

    /// Whether `id` is held by `context` or anything nested in it.
    pub fn holds(&self, context: ObjectId, id: ObjectId) -> bool {
        let mut queue = VecDeque::from([context]);
        let mut seen = vec![context];
        while let Some(scope) = queue.pop_front() {
            let Some(ctx) = self.get(scope).and_then(WorldObject::as_context) else {
                continue;
            };
            for held in ctx.objects() {
                if *held == id {
                    return true;
                }
                if !seen.contains(held) {
                    seen.push(*held);
                    queue.push_back(*held);
                }
            }
        }
        false
    }

    /// Everything `actor` could do from `context`.
    ///
    /// Gathers the context's own declared actions, then the offerings of
    /// each visible object in insertion order, then the same from each
    /// ancestor for as long as the actor is still inside it. Contexts held
    /// along the way offer nothing: a context's own actions are only offered
    /// from inside it. Nothing is cached.
    pub fn possible_actions(
        &self,
        actor: ObjectId,
        context: ObjectId,
    ) -> Result<Vec<Action>, WorldError> {
        let offer = Offer::new(Some(self.object(actor)?.base()), &self.config);
        let mut actions = Vec::new();
        for (depth, scope) in self.ancestors(context)?.into_iter().enumerate() {
            if depth > 0 && !self.holds(scope, actor) {
                break;
            }
            let ctx = self.context(scope)?;
            actions.extend(ctx.possible_actions(&offer));
            for id in ctx.objects() {
                match self.get(*id) {
                    Some(WorldObject::Context(_)) => {}
                    Some(object) if !object.is_concealed() => {
                        actions.extend(object.as_object().possible_actions(&offer));
                    }
                    _ => {}
                }
            }
        }
        debug!(
            actor = %self.name_of(actor),
            context = %self.name_of(context),
            count = actions.len(),
            "actions gathered"
        );
        Ok(actions)
    }

    /// Have `actor` perform `action` on `target` from wherever it stands.
    ///
    /// An incapacitated actor is refused without rolling anything.
    pub fn take_action(
        &mut self,
        actor: ObjectId,
        action: &Action,
        target: ObjectId,
    ) -> Result<Outcome, WorldError> {
        let performer = self.actor(actor)?;
        if performer.is_incapacitated(&self.config) {
            return Ok(Outcome::refused(format!(
                "{} is {} and cannot {}",
                performer.name(),
                self.config.incapacitated_attribute,
                action.verb()
            )));
        }
        let context = performer.context().filter(|c| self.contains(*c));
        Ok(action.act(self, actor, target, context))
    }

    /// Deliver `action` from `initiator` to `target`.
    ///
    /// With a `context`, the target must be that context or one of its
    /// ancestors, or a non-context object held by one of them. The
    /// initiator's bonuses are folded into the action before the target
    /// sees it.
    pub fn deliver(
        &mut self,
        action: &Action,
        initiator: ObjectId,
        target: ObjectId,
        context: Option<ObjectId>,
    ) -> Outcome {
        let initiator_name = self.name_of(initiator);
        let Some(target_object) = self.get(target) else {
            return Outcome::target_not_found(format!(
                "{initiator_name} finds nothing to {}",
                action.verb()
            ));
        };
        let target_name = target_object.name().to_string();
        let target_is_context = target_object.as_context().is_some();
        let action = match self.get(initiator) {
            Some(object) => action.prepared_for(object.base(), &self.config),
            None => action.clone(),
        };
        let action = &action;

        let context_name = match context {
            None => None,
            Some(scope) => match self.ancestors(scope) {
                Err(e) => {
                    return Outcome::refused(format!(
                        "{initiator_name} cannot {} from there: {e}",
                        action.verb()
                    ))
                }
                Ok(chain) => {
                    let reachable = chain.iter().any(|s| {
                        *s == target
                            || (!target_is_context
                                && self
                                    .get(*s)
                                    .and_then(WorldObject::as_context)
                                    .is_some_and(|ctx| ctx.contains(target)))
                    });
                    if !reachable {
                        return Outcome::target_not_found(format!(
                            "{target_name} is not within reach of {initiator_name} in {}",
                            self.name_of(scope)
                        ));
                    }
                    Some(self.name_of(scope))
                }
            },
        };

        let outcome = if target_is_context && self.is_search(action) {
            self.search(target, action, &initiator_name)
        } else {
            let World {
                objects,
                rng,
                config,
            } = self;
            match objects.get_mut(&target) {
                Some(entry) => {
                    let mut turn = Turn {
                        initiator: &initiator_name,
                        context: context_name.as_deref(),
                        config,
                        rng: &mut **rng,
                    };
                    entry.object.as_object_mut().accept_action(action, &mut turn)
                }
                None => Outcome::target_not_found(format!("{target_name} is gone")),
            }
        };

        info!(
            initiator = %initiator_name,
            verb = action.verb(),
            target = %target_name,
            outcome = ?outcome.kind,
            "action resolved"
        );
        outcome
    }

    fn is_search(&self, action: &Action) -> bool {
        action.base_verb().eq_ignore_ascii_case(&self.config.search_verb)
    }

    /// Roll against each concealed object in `context`, revealing those
    /// whose concealment the roll reaches.
    ///
    /// The roll is the action's first save, or the skill die when it has
    /// none.
    fn search(&mut self, context: ObjectId, action: &Action, initiator: &str) -> Outcome {
        let check = action
            .saves()
            .values()
            .next()
            .cloned()
            .unwrap_or_else(|| Check::new(self.config.skill_die.clone()));
        let (context_name, concealed) = match self.context(context) {
            Ok(ctx) => {
                let concealed: Vec<(ObjectId, i32)> = ctx
                    .objects()
                    .iter()
                    .filter_map(|id| {
                        let object = self.get(*id)?;
                        if !object.is_concealed() {
                            return None;
                        }
                        let concealment = object.attributes().get_int(keys::CONCEALMENT).ok()?;
                        Some((*id, concealment))
                    })
                    .collect();
                (ctx.name().to_string(), concealed)
            }
            Err(e) => return Outcome::refused(e.to_string()),
        };

        let mut narrative = format!("{initiator} searches {context_name}");
        if concealed.is_empty() {
            narrative.push_str(" and finds nothing");
            return Outcome::failure(narrative);
        }

        let mut effects = Vec::new();
        let mut found_any = false;
        for (id, concealment) in concealed {
            let roll = check.dice.roll_detailed_with(&mut *self.rng);
            debug!(dice = %check.dice, total = roll.total, concealment, "search roll");
            let total = roll.total;
            effects.push(Effect::DiceRolled {
                purpose: format!("{} {context_name}", action.verb()),
                roll,
            });
            if total < concealment {
                narrative.push_str(&format!("\n    something stays hidden ({total} vs {concealment})"));
                continue;
            }
            let name = self.name_of(id);
            if let Some(entry) = self.objects.get_mut(&id) {
                let old = entry.object.base_mut().attributes.set(keys::FOUND, true);
                effects.push(Effect::AttributeChanged {
                    object: id,
                    attribute: keys::FOUND.to_string(),
                    old,
                    new: true.to_string(),
                });
                effects.push(Effect::ObjectRevealed { object: id });
                narrative.push_str(&format!("\n    finds {name} ({total} vs {concealment})"));
                found_any = true;
            }
        }

        let outcome = if found_any {
            Outcome::success(narrative)
        } else {
            Outcome::failure(narrative)
        };
        outcome.with_effects(effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::OutcomeKind;
    use crate::testing::{ScriptedRolls, Skirmish};

    fn world() -> World {
        World::with_random_source(RulesConfig::default(), ScriptedRolls::always_lowest())
    }

    #[test]
    fn test_create_nested_contexts() {
        let mut world = world();
        let keep = world.create_context("Keep", "", None).unwrap();
        let hall = world.create_context("Hall", "", Some(keep)).unwrap();

        assert_eq!(world.context(hall).unwrap().parent(), Some(keep));
        assert_eq!(world.get_objects(keep).unwrap(), vec![hall]);
        assert_eq!(world.owner_of(hall), Some(keep));
        assert_eq!(world.ancestors(hall).unwrap(), vec![hall, keep]);
    }

    #[test]
    fn test_same_parent_keeps_order() {
        let mut world = world();
        let keep = world.create_context("Keep", "", None).unwrap();
        let hall = world.create_context("Hall", "", Some(keep)).unwrap();
        let barrel = world.insert(Thing::new("Barrel", ""));
        world.add_object(keep, barrel).unwrap();

        world.set_parent(hall, Some(keep)).unwrap();
        world.add_object(keep, hall).unwrap();
        assert_eq!(world.get_objects(keep).unwrap(), vec![hall, barrel]);
        assert_eq!(world.owner_of(hall), Some(keep));
    }

    #[test]
    fn test_parent_cycle_rejected() {
        let mut world = world();
        let keep = world.create_context("Keep", "", None).unwrap();
        let hall = world.create_context("Hall", "", Some(keep)).unwrap();

        assert!(matches!(
            world.set_parent(keep, Some(hall)),
            Err(WorldError::ParentCycle(_))
        ));
        assert!(matches!(
            world.set_parent(keep, Some(keep)),
            Err(WorldError::ParentCycle(_))
        ));
        assert_eq!(world.context(keep).unwrap().parent(), None);
    }

    #[test]
    fn test_lookup_walks_parents() {
        let mut world = world();
        let keep = world.create_context("Keep", "", None).unwrap();
        let hall = world.create_context("Hall", "", Some(keep)).unwrap();
        world.set_attribute(keep, "lighting", "dim").unwrap();

        assert_eq!(world.lookup_attribute(hall, "lighting").unwrap(), "dim");
        world.set_attribute(hall, "lighting", "bright").unwrap();
        assert_eq!(world.lookup_attribute(hall, "lighting").unwrap(), "bright");
        assert!(matches!(
            world.lookup_attribute(hall, "weather"),
            Err(WorldError::Attribute(AttributeError::NotFound(_)))
        ));
    }

    #[test]
    fn test_moving_releases_old_owner() {
        let mut world = world();
        let hall = world.create_context("Hall", "", None).unwrap();
        let cellar = world.create_context("Cellar", "", None).unwrap();
        let barrel = world.insert(Thing::new("Barrel", ""));

        world.add_object(hall, barrel).unwrap();
        world.add_object(cellar, barrel).unwrap();
        assert!(world.get_objects(hall).unwrap().is_empty());
        assert_eq!(world.get_objects(cellar).unwrap(), vec![barrel]);
    }

    #[test]
    fn test_member_rebinds_actor_context() {
        let mut world = world();
        let hall = world.create_context("Hall", "", None).unwrap();
        let cellar = world.create_context("Cellar", "", None).unwrap();
        let hero = world.insert(Actor::new("Hero", ""));

        world.add_member(hall, hero).unwrap();
        assert_eq!(world.actor(hero).unwrap().context(), Some(hall));
        world.add_member(cellar, hero).unwrap();
        assert_eq!(world.actor(hero).unwrap().context(), Some(cellar));
        assert!(world.get_party(hall).unwrap().is_empty());
    }

    #[test]
    fn test_non_actor_cannot_join_party() {
        let mut world = world();
        let hall = world.create_context("Hall", "", None).unwrap();
        let barrel = world.insert(Thing::new("Barrel", ""));
        assert!(matches!(
            world.add_member(hall, barrel),
            Err(WorldError::NotAnActor(_))
        ));
        assert!(matches!(
            world.add_object(barrel, hall),
            Err(WorldError::NotAContext(_))
        ));
    }

    #[test]
    fn test_remove_object_is_recursive() {
        let mut world = world();
        let keep = world.create_context("Keep", "", None).unwrap();
        let hall = world.create_context("Hall", "", Some(keep)).unwrap();
        let hero = world.insert(Actor::new("Hero", ""));
        world.add_member(hall, hero).unwrap();

        let removed = world.remove_object(keep, hall).unwrap();
        assert_eq!(removed.name(), "Hall");
        assert!(!world.contains(hero));
        assert!(world.get_objects(keep).unwrap().is_empty());
        assert!(matches!(
            world.remove_object(keep, hall),
            Err(WorldError::NotInContext { .. })
        ));
    }

    #[test]
    fn test_deliver_without_context() {
        let mut skirmish = Skirmish::new(ScriptedRolls::new([13, 4, 3])).unwrap();
        let world = &mut skirmish.world;
        let attack = world.possible_actions(skirmish.hero, skirmish.room).unwrap()[0].clone();
        let outcome = attack.act(world, skirmish.hero, skirmish.goblin, None);
        assert_eq!(outcome.kind, OutcomeKind::Success);
        assert!(!outcome.narrative.contains(" in "));
    }

    #[test]
    fn test_unknown_target() {
        let mut skirmish = Skirmish::new(ScriptedRolls::always_highest()).unwrap();
        let world = &mut skirmish.world;
        let attack = world.possible_actions(skirmish.hero, skirmish.room).unwrap()[0].clone();
        let outcome = attack.act(world, skirmish.hero, ObjectId::new(), Some(skirmish.room));
        assert_eq!(outcome.kind, OutcomeKind::TargetNotFound);
    }

    #[test]
    fn test_initiator_bonuses_reach_the_target() {
        // 1 + 5 + 4 accuracy = 10 to hit, goblin rolls 1, damage 1 + 2
        let mut skirmish = Skirmish::new(ScriptedRolls::new([1, 1, 1, 2])).unwrap();
        let world = &mut skirmish.world;
        world.set_attribute(skirmish.hero, "accuracy", 4).unwrap();
        world.set_attribute(skirmish.hero, "damage", "1d4").unwrap();
        let attack = world.possible_actions(skirmish.hero, skirmish.room).unwrap()[0].clone();

        let outcome = world.take_action(skirmish.hero, &attack, skirmish.goblin).unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Success, "{outcome}");
        assert!(outcome.narrative.contains("(hit 10 vs 10)"), "{outcome}");
        assert_eq!(world.get_attribute(skirmish.goblin, "health").unwrap(), "4");
        assert_eq!(attack.save("hit").unwrap().dice.to_string(), "1d20+5");
    }

    #[test]
    fn test_context_refuses_other_verbs() {
        let mut skirmish = Skirmish::new(ScriptedRolls::always_highest()).unwrap();
        let world = &mut skirmish.world;
        let attack = world.possible_actions(skirmish.hero, skirmish.room).unwrap()[0].clone();
        let outcome = attack.act(world, skirmish.hero, skirmish.room, Some(skirmish.room));
        assert_eq!(outcome.kind, OutcomeKind::Refused);
        assert_eq!(
            outcome.narrative,
            "Room cannot process ATTACK from Hero using Sword in Room"
        );
    }
}
