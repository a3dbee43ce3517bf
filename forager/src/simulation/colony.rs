use glam::Vec2;
use shared::{AntId, ColonyId, ColonyView, ResourceKind};
use slotmap::SlotMap;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::ant::{Ant, AntKey};
use crate::error::RecordError;

/// A colony as tracked by the coordinator: its nest position, its storage
/// and the ants foraging for it.
pub struct Colony {
    pub colony_id: ColonyId,
    pub pos: Vec2,
    pub ants: SlotMap<AntKey, Ant>,
    index: HashMap<AntId, AntKey>,
    storage: BTreeMap<ResourceKind, u64>,
}

impl Colony {
    pub fn new(view: &ColonyView) -> Result<Self, RecordError> {
        if !(view.x.is_finite() && view.y.is_finite()) {
            return Err(RecordError::NonFinitePosition(view.id.to_string()));
        }
        Ok(Self {
            colony_id: view.id,
            pos: Vec2::new(view.x, view.y),
            ants: SlotMap::with_key(),
            index: HashMap::new(),
            storage: BTreeMap::new(),
        })
    }

    pub fn view(&self) -> ColonyView {
        ColonyView {
            id: self.colony_id,
            x: self.pos.x,
            y: self.pos.y,
        }
    }

    /// Starts tracking an ant. Returns `None` if the id is already tracked.
    pub fn spawn_ant(&mut self, ant: Ant) -> Option<AntKey> {
        if self.index.contains_key(&ant.id) {
            return None;
        }
        let id = ant.id;
        let key = self.ants.insert(ant);
        self.index.insert(id, key);
        debug!(ant = %id, colony = %self.colony_id, "Ant joined foraging");
        Some(key)
    }

    /// Stops tracking an ant and hands back its final state.
    pub fn despawn_ant(&mut self, id: AntId) -> Option<Ant> {
        let key = self.index.remove(&id)?;
        self.ants.remove(key)
    }

    pub fn key_of(&self, id: AntId) -> Option<AntKey> {
        self.index.get(&id).copied()
    }

    pub fn ant(&self, id: AntId) -> Option<&Ant> {
        self.key_of(id).and_then(|key| self.ants.get(key))
    }

    pub fn ant_mut(&mut self, id: AntId) -> Option<&mut Ant> {
        let key = self.key_of(id)?;
        self.ants.get_mut(key)
    }

    pub fn ant_count(&self) -> usize {
        self.ants.len()
    }

    /// Adds to storage. Returns the new total for that kind.
    pub fn store(&mut self, kind: ResourceKind, amount: u32) -> u64 {
        let bucket = self.storage.entry(kind).or_insert(0);
        *bucket = bucket.saturating_add(u64::from(amount));
        *bucket
    }

    pub fn stored(&self, kind: ResourceKind) -> u64 {
        self.storage.get(&kind).copied().unwrap_or(0)
    }

    pub fn storage(&self) -> &BTreeMap<ResourceKind, u64> {
        &self.storage
    }

    pub fn is_at_colony(&self, pos: Vec2, radius: f32) -> bool {
        self.pos.distance_squared(pos) <= radius * radius
    }
}
