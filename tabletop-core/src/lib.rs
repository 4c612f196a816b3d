//! Tabletop game-rules engine.
//!
//! This crate provides:
//! - Dice formulas (`2d6+1`, `d%`, `3-18`) rolled from an injectable source
//! - World objects with string attributes: things, actors, weapons, skills
//! - Nested contexts that scope which actions an actor can see
//! - Save-based action resolution with a fixed, replayable roll order
//!
//! # Quick Start
//!
//! ```ignore
//! use tabletop_core::{Actor, Check, Dice, RulesConfig, Weapon, World};
//!
//! let mut world = World::new(RulesConfig::default().with_seed(7));
//! let room = world.create_context("Room", "a damp cellar", None)?;
//! let hero = world.insert(Actor::new("Hero", "an adventurer"));
//! let goblin = world.insert(
//!     Actor::new("Goblin", "")
//!         .with_attribute("health", 7)
//!         .with_fail_condition("hit", Check::new(Dice::d20()).with_threshold(12)),
//! );
//! let sword = world.insert(Weapon::new("Sword", "").with_to_hit("1d20+5").with_damage("1d6"));
//! world.add_member(room, hero)?;
//! world.add_npc(room, goblin)?;
//! world.add_object(room, sword)?;
//!
//! for action in world.possible_actions(hero, room)? {
//!     let outcome = world.take_action(hero, &action, goblin)?;
//!     println!("{outcome}");
//! }
//! ```

pub mod action;
pub mod actor;
pub mod attributes;
pub mod config;
pub mod context;
pub mod dice;
pub mod object;
pub mod random;
pub mod skills;
pub mod testing;
pub mod weapon;
pub mod world;

// Primary public API
pub use action::{Action, Check, Effect, Offer, Outcome, OutcomeKind, Turn};
pub use actor::Actor;
pub use attributes::{AttributeError, AttributeMap};
pub use config::RulesConfig;
pub use context::{Context, Role};
pub use dice::{Dice, DiceError, RollResult};
pub use object::{GameObject, ObjectBase, ObjectId, Thing};
pub use random::{RandomSource, RngSource};
pub use skills::Skills;
pub use testing::{ScriptedRolls, Skirmish};
pub use weapon::Weapon;
pub use world::{World, WorldError, WorldObject};
