//! Testing utilities for deterministic resolution.
//!
//! [`ScriptedRolls`] replays a fixed sequence of draws so that every roll in
//! a test is known in advance, and [`Skirmish`] builds the small world most
//! resolution tests start from.

use crate::action::Check;
use crate::actor::Actor;
use crate::config::RulesConfig;
use crate::context::Context;
use crate::dice::Dice;
use crate::object::ObjectId;
use crate::random::RandomSource;
use crate::weapon::Weapon;
use crate::world::{World, WorldError};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum WhenExhausted {
    #[default]
    Lowest,
    Highest,
}

/// A random source that returns scripted values.
///
/// Each draw pops the next value and clamps it into the requested range.
/// Once the script runs out every draw returns the lowest value in range
/// (or the highest, see [`ScriptedRolls::then_highest`]).
#[derive(Debug, Clone, Default)]
pub struct ScriptedRolls {
    script: VecDeque<i32>,
    exhausted: WhenExhausted,
}

impl ScriptedRolls {
    pub fn new(values: impl IntoIterator<Item = i32>) -> Self {
        Self {
            script: values.into_iter().collect(),
            exhausted: WhenExhausted::Lowest,
        }
    }

    /// Every draw is the top of its range.
    pub fn always_highest() -> Self {
        Self::default().then_highest()
    }

    /// Every draw is the bottom of its range.
    pub fn always_lowest() -> Self {
        Self::default()
    }

    /// Return the highest value once the script is used up.
    pub fn then_highest(mut self) -> Self {
        self.exhausted = WhenExhausted::Highest;
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl RandomSource for ScriptedRolls {
    fn next_in_range(&mut self, low: i32, high: i32) -> i32 {
        if low >= high {
            return low;
        }
        match self.script.pop_front() {
            Some(value) => value.clamp(low, high),
            None => match self.exhausted {
                WhenExhausted::Lowest => low,
                WhenExhausted::Highest => high,
            },
        }
    }
}

/// A hero with a sword facing a goblin in a single room.
///
/// The sword attacks with `1d20+5` against threshold 10 for `1d6` damage.
/// The goblin has 7 health and resists `hit` with `1d20` against 12.
pub struct Skirmish {
    pub world: World,
    pub room: ObjectId,
    pub hero: ObjectId,
    pub goblin: ObjectId,
    pub sword: ObjectId,
}

impl Skirmish {
    pub fn new(rolls: ScriptedRolls) -> Result<Self, WorldError> {
        Self::with_config(RulesConfig::default(), rolls)
    }

    pub fn with_config(config: RulesConfig, rolls: ScriptedRolls) -> Result<Self, WorldError> {
        let mut world = World::with_random_source(config, rolls);
        let room = world.insert(Context::new("Room", "a damp stone room"));
        let hero = world.insert(Actor::new("Hero", "a hopeful adventurer"));
        let goblin = world.insert(
            Actor::new("Goblin", "a wary goblin")
                .with_attribute("health", 7)
                .with_fail_condition("hit", Check::new(Dice::d20()).with_threshold(12)),
        );
        let sword = world.insert(
            Weapon::new("Sword", "a short sword")
                .with_to_hit("1d20+5")
                .with_threshold(10)
                .with_damage("1d6"),
        );

        world.add_member(room, hero)?;
        world.add_npc(room, goblin)?;
        world.add_object(room, sword)?;

        Ok(Self {
            world,
            room,
            hero,
            goblin,
            sword,
        })
    }
}
