//! The resource-persistence collaborator as seen from the foraging core.

use shared::{ColonyId, ResourceId, ResourceKind, ResourceView, StorageDeposit};
use std::collections::BTreeMap;

use crate::error::StoreError;

/// Owner of resource nodes and colony storage.
///
/// The core reads nearby nodes once per tick and reports every transfer it
/// applies. Calls are synchronous; an implementation backed by I/O should
/// answer from its own cache.
pub trait WorldStore {
    /// Resource nodes within `radius` of (x, y), depleted ones included.
    fn resources_near(&self, x: f32, y: f32, radius: f32) -> Result<Vec<ResourceView>, StoreError>;

    /// Removes `amount` units from a node.
    fn harvest(&mut self, resource: ResourceId, amount: u32) -> Result<(), StoreError>;

    /// Adds to a colony's storage.
    fn credit_colony(&mut self, deposit: StorageDeposit) -> Result<(), StoreError>;
}

/// `WorldStore` held entirely in memory. Used by the headless driver and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorld {
    resources: BTreeMap<ResourceId, ResourceView>,
    ledgers: BTreeMap<ColonyId, BTreeMap<ResourceKind, u64>>,
}

impl InMemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_resource(&mut self, view: ResourceView) {
        self.resources.insert(view.id, view);
    }

    pub fn remove_resource(&mut self, id: ResourceId) -> Option<ResourceView> {
        self.resources.remove(&id)
    }

    pub fn resource(&self, id: ResourceId) -> Option<&ResourceView> {
        self.resources.get(&id)
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceView> {
        self.resources.values()
    }

    /// Opens an empty storage ledger for a colony. Existing ledgers are kept.
    pub fn add_colony(&mut self, colony: ColonyId) {
        self.ledgers.entry(colony).or_default();
    }

    pub fn stored(&self, colony: ColonyId, kind: ResourceKind) -> u64 {
        self.ledgers
            .get(&colony)
            .and_then(|ledger| ledger.get(&kind))
            .copied()
            .unwrap_or(0)
    }

    pub fn ledger(&self, colony: ColonyId) -> Option<&BTreeMap<ResourceKind, u64>> {
        self.ledgers.get(&colony)
    }
}

impl WorldStore for InMemoryWorld {
    fn resources_near(&self, x: f32, y: f32, radius: f32) -> Result<Vec<ResourceView>, StoreError> {
        let radius_sq = radius * radius;
        Ok(self
            .resources
            .values()
            .filter(|r| {
                let (dx, dy) = (r.x - x, r.y - y);
                dx * dx + dy * dy <= radius_sq
            })
            .cloned()
            .collect())
    }

    fn harvest(&mut self, resource: ResourceId, amount: u32) -> Result<(), StoreError> {
        let node = self
            .resources
            .get_mut(&resource)
            .ok_or(StoreError::UnknownResource(resource))?;
        node.quantity = node.quantity.saturating_sub(amount);
        Ok(())
    }

    fn credit_colony(&mut self, deposit: StorageDeposit) -> Result<(), StoreError> {
        let ledger = self
            .ledgers
            .get_mut(&deposit.colony_id)
            .ok_or(StoreError::UnknownColony(deposit.colony_id))?;
        let bucket = ledger.entry(deposit.kind).or_insert(0);
        *bucket = bucket.saturating_add(u64::from(deposit.amount));
        Ok(())
    }
}
