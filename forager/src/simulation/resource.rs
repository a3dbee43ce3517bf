use glam::Vec2;
use shared::{ResourceId, ResourceKind, ResourceView};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use crate::error::RecordError;

/// A resource node as cached by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    pub id: ResourceId,
    pub pos: Vec2,
    pub kind: ResourceKind,
    pub quantity: u32,
}

impl ResourceNode {
    pub fn from_view(view: &ResourceView) -> Result<Self, RecordError> {
        if !(view.x.is_finite() && view.y.is_finite()) {
            return Err(RecordError::NonFinitePosition(view.id.to_string()));
        }
        Ok(Self {
            id: view.id,
            pos: Vec2::new(view.x, view.y),
            kind: view.kind,
            quantity: view.quantity,
        })
    }

    pub fn to_view(&self) -> ResourceView {
        ResourceView {
            id: self.id,
            x: self.pos.x,
            y: self.pos.y,
            kind: self.kind,
            quantity: self.quantity,
        }
    }

    /// Still on the map, but nothing left to pick up.
    pub fn is_depleted(&self) -> bool {
        self.quantity == 0
    }

    /// Removes up to `requested` units and returns how many were removed.
    pub fn take(&mut self, requested: u32) -> u32 {
        let taken = requested.min(self.quantity);
        self.quantity -= taken;
        taken
    }
}

/// Local copy of the resource nodes near tracked colonies.
#[derive(Debug, Clone, Default)]
pub struct ResourceCache {
    nodes: BTreeMap<ResourceId, ResourceNode>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: ResourceId) -> Option<&ResourceNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: ResourceId) -> Option<&mut ResourceNode> {
        self.nodes.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.values()
    }

    pub fn depleted_count(&self) -> usize {
        self.nodes.values().filter(|n| n.is_depleted()).count()
    }

    /// Inserts or overwrites nodes from fresh records. Invalid records are
    /// skipped. Returns the ids that were accepted.
    pub fn refresh<I>(&mut self, views: I) -> BTreeSet<ResourceId>
    where
        I: IntoIterator<Item = ResourceView>,
    {
        let mut seen = BTreeSet::new();
        for view in views {
            match ResourceNode::from_view(&view) {
                Ok(node) => {
                    seen.insert(node.id);
                    self.nodes.insert(node.id, node);
                }
                Err(e) => warn!(resource = %view.id, error = %e, "Skipping invalid resource record"),
            }
        }
        seen
    }

    /// Drops every node not in `keep`.
    pub fn retain_ids(&mut self, keep: &BTreeSet<ResourceId>) {
        self.nodes.retain(|id, _| keep.contains(id));
    }

    /// Drops depleted nodes and returns their ids.
    pub fn prune_depleted(&mut self) -> Vec<ResourceId> {
        let depleted: Vec<ResourceId> = self
            .nodes
            .values()
            .filter(|n| n.is_depleted())
            .map(|n| n.id)
            .collect();
        for id in &depleted {
            self.nodes.remove(id);
        }
        depleted
    }

    /// Nodes with something left within `radius` of `pos`, nearest first.
    pub fn harvestable_near(&self, pos: Vec2, radius: f32) -> Vec<&ResourceNode> {
        let radius_sq = radius * radius;
        let mut found: Vec<(f32, &ResourceNode)> = self
            .nodes
            .values()
            .filter(|n| !n.is_depleted())
            .map(|n| (n.pos.distance_squared(pos), n))
            .filter(|(d, _)| *d <= radius_sq)
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.id.cmp(&b.1.id)));
        found.into_iter().map(|(_, n)| n).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: u64, x: f32, y: f32, quantity: u32) -> ResourceView {
        ResourceView {
            id: ResourceId(id),
            x,
            y,
            kind: ResourceKind::Food,
            quantity,
        }
    }

    #[test]
    fn take_clamps_to_quantity() {
        let mut node = ResourceNode::from_view(&view(1, 0.0, 0.0, 3)).unwrap();
        assert_eq!(node.take(10), 3);
        assert_eq!(node.quantity, 0);
        assert!(node.is_depleted());
        assert_eq!(node.take(1), 0);
    }

    #[test]
    fn refresh_skips_invalid_records() {
        let mut cache = ResourceCache::new();
        let seen = cache.refresh(vec![view(1, 1.0, 1.0, 5), view(2, f32::NAN, 1.0, 5)]);
        assert_eq!(seen.len(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(ResourceId(2)).is_none());
    }

    #[test]
    fn refresh_overwrites_quantity() {
        let mut cache = ResourceCache::new();
        cache.refresh(vec![view(1, 1.0, 1.0, 5)]);
        cache.refresh(vec![view(1, 1.0, 1.0, 2)]);
        assert_eq!(cache.get(ResourceId(1)).unwrap().quantity, 2);
    }

    #[test]
    fn depleted_nodes_stay_visible_until_pruned() {
        let mut cache = ResourceCache::new();
        cache.refresh(vec![view(1, 1.0, 1.0, 0), view(2, 2.0, 1.0, 4)]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.depleted_count(), 1);
        let near = cache.harvestable_near(Vec2::new(1.0, 1.0), 5.0);
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].id, ResourceId(2));
        assert_eq!(cache.prune_depleted(), vec![ResourceId(1)]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn harvestable_near_sorts_by_distance() {
        let mut cache = ResourceCache::new();
        cache.refresh(vec![
            view(1, 9.0, 0.0, 1),
            view(2, 2.0, 0.0, 1),
            view(3, 50.0, 0.0, 1),
        ]);
        let ids: Vec<_> = cache
            .harvestable_near(Vec2::ZERO, 10.0)
            .iter()
            .map(|n| n.id.0)
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
