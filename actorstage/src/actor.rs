//! Actors and their draw-order registry.

use crate::runtime::SkeletonRuntime;
use serde::Serialize;
use std::fmt;

/// Stable handle for one actor. Ids are never reused within a stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.0)
    }
}

/// Placement choices made at attach time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActorOptions {
    pub x: f32,
    pub y: f32,
    /// Insert position in draw order; `None` appends on top.
    pub z: Option<usize>,
    pub scale: Option<f32>,
}

/// One placed character. `runtime` is `None` until its asset load completes.
#[derive(Clone, Debug)]
pub struct Actor {
    pub id: ActorId,
    pub asset_id: String,
    pub runtime: Option<SkeletonRuntime>,
    pub visible: bool,
    /// Mirror of this actor's index in draw order, kept current by the
    /// registry after every reorder.
    pub z_index: usize,
    pub created_at: f64,
}

impl Actor {
    pub fn is_loaded(&self) -> bool {
        self.runtime.is_some()
    }
}

/// Ordered collection of actors. Vec order IS draw order: index 0 draws
/// first (back), the last index draws last (front).
#[derive(Debug, Default)]
pub struct ActorRegistry {
    actors: Vec<Actor>,
    next_id: u64,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an actor for `asset_id` and places it. Out-of-range `z`
    /// clamps to an append.
    pub fn attach_entry(&mut self, asset_id: &str, options: &ActorOptions, created_at: f64) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        let actor = Actor {
            id,
            asset_id: asset_id.to_string(),
            runtime: None,
            visible: true,
            z_index: 0,
            created_at,
        };
        match options.z {
            Some(z) if z < self.actors.len() => self.actors.insert(z, actor),
            _ => self.actors.push(actor),
        }
        self.update_z_indices();
        id
    }

    /// Removes the actor. Returns false when the id is unknown, which callers
    /// treat as already-detached rather than an error.
    pub fn detach(&mut self, id: ActorId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        self.actors.remove(index);
        self.update_z_indices();
        true
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id == id)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.id == id)
    }

    /// Moves the actor to the end of the vec, the topmost draw position.
    pub fn move_to_front(&mut self, id: ActorId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let actor = self.actors.remove(index);
        self.actors.push(actor);
        self.update_z_indices();
        true
    }

    /// Moves the actor to index 0, drawn before everything else.
    pub fn move_to_back(&mut self, id: ActorId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let actor = self.actors.remove(index);
        self.actors.insert(0, actor);
        self.update_z_indices();
        true
    }

    /// Snapshot of all actors in draw order. Cloned so callers can iterate
    /// while mutating the registry.
    pub fn all(&self) -> Vec<Actor> {
        self.actors.clone()
    }

    pub fn ids(&self) -> Vec<ActorId> {
        self.actors.iter().map(|a| a.id).collect()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn clear(&mut self) -> Vec<ActorId> {
        let ids = self.ids();
        self.actors.clear();
        ids
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.index_of(id).is_some()
    }

    fn index_of(&self, id: ActorId) -> Option<usize> {
        self.actors.iter().position(|a| a.id == id)
    }

    fn update_z_indices(&mut self) {
        for (index, actor) in self.actors.iter_mut().enumerate() {
            actor.z_index = index;
        }
    }
}
