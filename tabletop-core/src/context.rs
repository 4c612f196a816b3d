//! Contexts: places that hold objects.
//!
//! A context owns an ordered list of objects and marks some of them as
//! party members or NPCs. The membership lists are private; the world
//! maintains them so that an actor is never a member and an NPC of the same
//! context at once.

use crate::object::{GameObject, ObjectBase, ObjectId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an object is held by a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Object,
    Member,
    Npc,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Object => write!(f, "object"),
            Role::Member => write!(f, "party member"),
            Role::Npc => write!(f, "NPC"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    base: ObjectBase,
    objects: Vec<ObjectId>,
    party: Vec<ObjectId>,
    npcs: Vec<ObjectId>,
    parent: Option<ObjectId>,
}

impl Context {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            base: ObjectBase::new(name, description),
            objects: Vec::new(),
            party: Vec::new(),
            npcs: Vec::new(),
            parent: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set(name, value);
        self
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Objects in insertion order.
    pub fn objects(&self) -> &[ObjectId] {
        &self.objects
    }

    pub fn party(&self) -> &[ObjectId] {
        &self.party
    }

    pub fn npcs(&self) -> &[ObjectId] {
        &self.npcs
    }

    /// Snapshot of the held objects.
    pub fn get_objects(&self) -> Vec<ObjectId> {
        self.objects.clone()
    }

    /// Snapshot of the party.
    pub fn get_party(&self) -> Vec<ObjectId> {
        self.party.clone()
    }

    /// Snapshot of the NPCs.
    pub fn get_npcs(&self) -> Vec<ObjectId> {
        self.npcs.clone()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains(&id)
    }

    /// The most specific role `id` holds here.
    pub fn role_of(&self, id: ObjectId) -> Option<Role> {
        if self.party.contains(&id) {
            Some(Role::Member)
        } else if self.npcs.contains(&id) {
            Some(Role::Npc)
        } else if self.objects.contains(&id) {
            Some(Role::Object)
        } else {
            None
        }
    }

    /// Hold `id` in `role`. Repeating a role is a no-op; asking for the
    /// opposite membership role fails with the role already held.
    pub(crate) fn insert(&mut self, id: ObjectId, role: Role) -> Result<(), Role> {
        match (self.role_of(id), role) {
            (Some(existing @ Role::Member), Role::Npc) | (Some(existing @ Role::Npc), Role::Member) => {
                return Err(existing);
            }
            _ => {}
        }
        if !self.objects.contains(&id) {
            self.objects.push(id);
        }
        let list = match role {
            Role::Object => return Ok(()),
            Role::Member => &mut self.party,
            Role::Npc => &mut self.npcs,
        };
        if !list.contains(&id) {
            list.push(id);
        }
        Ok(())
    }

    /// Drop `id` from every list. Returns whether it was held.
    pub(crate) fn remove(&mut self, id: ObjectId) -> bool {
        let held = self.contains(id);
        self.objects.retain(|o| *o != id);
        self.party.retain(|o| *o != id);
        self.npcs.retain(|o| *o != id);
        held
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ObjectId>) {
        self.parent = parent;
    }
}

impl GameObject for Context {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }
}
