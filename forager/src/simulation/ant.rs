use glam::Vec2;
use shared::{AntId, AntRole, AntView, ColonyId, ForagingState, ResourceKind};
use slotmap::new_key_type;

use crate::error::{AgentError, RecordError};

new_key_type! {
    /// Key for ant slotmap.
    pub struct AntKey;
}

/// What an ant is holding. A load always has at least one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cargo {
    pub kind: ResourceKind,
    pub quantity: u32,
}

/// Foraging aspect of an ant.
#[derive(Debug, Clone, PartialEq)]
pub struct Ant {
    pub id: AntId,
    pub colony_id: ColonyId,
    pub role: AntRole,
    pub pos: Vec2,
    pub state: ForagingState,
    cargo: Option<Cargo>,
    capacity: u32,
}

impl Ant {
    /// Builds an ant from the record handed in by the population subsystem.
    pub fn from_view(view: &AntView) -> Result<Self, RecordError> {
        if !(view.x.is_finite() && view.y.is_finite()) {
            return Err(RecordError::NonFinitePosition(view.id.to_string()));
        }
        if view.capacity == 0 {
            return Err(RecordError::ZeroCapacity(view.id));
        }
        if view.carried_qty > view.capacity {
            return Err(RecordError::OverCapacity {
                ant: view.id,
                carried: view.carried_qty,
                capacity: view.capacity,
            });
        }
        let cargo = match (view.carried_type, view.carried_qty) {
            (Some(kind), quantity) if quantity > 0 => Some(Cargo { kind, quantity }),
            (None, 0) => None,
            _ => return Err(RecordError::CargoMismatch(view.id)),
        };

        Ok(Self {
            id: view.id,
            colony_id: view.colony_id,
            role: view.role,
            pos: Vec2::new(view.x, view.y),
            state: view.state,
            cargo,
            capacity: view.capacity,
        })
    }

    pub fn to_view(&self) -> AntView {
        AntView {
            id: self.id,
            x: self.pos.x,
            y: self.pos.y,
            state: self.state,
            role: self.role,
            carried_type: self.cargo.map(|c| c.kind),
            carried_qty: self.carried(),
            capacity: self.capacity,
            colony_id: self.colony_id,
        }
    }

    pub fn cargo(&self) -> Option<Cargo> {
        self.cargo
    }

    pub fn carried(&self) -> u32 {
        self.cargo.map_or(0, |c| c.quantity)
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn free_capacity(&self) -> u32 {
        self.capacity - self.carried()
    }

    pub fn is_full(&self) -> bool {
        self.carried() >= self.capacity
    }

    /// True if the ant has room and holds nothing, or holds the same kind.
    pub fn can_carry(&self, kind: ResourceKind) -> bool {
        !self.is_full() && self.cargo.is_none_or(|c| c.kind == kind)
    }

    /// Takes up to `offered` units of `kind`, clamped to free capacity.
    /// Returns the amount actually taken (0 for an incompatible kind).
    pub fn load(&mut self, kind: ResourceKind, offered: u32) -> u32 {
        if !self.can_carry(kind) {
            return 0;
        }
        let taken = offered.min(self.free_capacity());
        if taken > 0 {
            let quantity = self.carried() + taken;
            self.cargo = Some(Cargo { kind, quantity });
        }
        taken
    }

    /// Drops the whole load.
    pub fn unload(&mut self) -> Option<Cargo> {
        self.cargo.take()
    }

    /// Checks the record is still fit to be simulated this tick.
    pub fn check(&self) -> Result<(), AgentError> {
        if !self.pos.is_finite() {
            return Err(AgentError::InvalidPosition {
                x: self.pos.x,
                y: self.pos.y,
            });
        }
        if self.carried() > self.capacity {
            return Err(AgentError::InvalidCargo {
                carried: self.carried(),
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn view(carried_type: Option<ResourceKind>, carried_qty: u32, capacity: u32) -> AntView {
        AntView {
            id: AntId(1),
            x: 4.0,
            y: 5.0,
            state: ForagingState::Idle,
            role: AntRole::Worker,
            carried_type,
            carried_qty,
            capacity,
            colony_id: ColonyId(9),
        }
    }

    #[test]
    fn round_trips_through_view() {
        let v = view(Some(ResourceKind::Seeds), 3, 5);
        let ant = Ant::from_view(&v).unwrap();
        assert_eq!(ant.carried(), 3);
        assert_eq!(ant.to_view(), v);
    }

    #[test]
    fn rejects_inconsistent_records() {
        assert_eq!(
            Ant::from_view(&view(None, 0, 0)),
            Err(RecordError::ZeroCapacity(AntId(1)))
        );
        assert!(matches!(
            Ant::from_view(&view(Some(ResourceKind::Food), 6, 5)),
            Err(RecordError::OverCapacity { .. })
        ));
        assert_eq!(
            Ant::from_view(&view(None, 2, 5)),
            Err(RecordError::CargoMismatch(AntId(1)))
        );
        assert_eq!(
            Ant::from_view(&view(Some(ResourceKind::Food), 0, 5)),
            Err(RecordError::CargoMismatch(AntId(1)))
        );
        let mut bad = view(None, 0, 5);
        bad.x = f32::NAN;
        assert!(matches!(
            Ant::from_view(&bad),
            Err(RecordError::NonFinitePosition(_))
        ));
    }

    #[test]
    fn load_clamps_to_free_capacity() {
        let mut ant = Ant::from_view(&view(None, 0, 10)).unwrap();
        assert_eq!(ant.load(ResourceKind::Food, 3), 3);
        assert_eq!(ant.load(ResourceKind::Food, 30), 7);
        assert!(ant.is_full());
        assert_eq!(ant.load(ResourceKind::Food, 1), 0);
    }

    #[test]
    fn refuses_mixed_loads() {
        let mut ant = Ant::from_view(&view(Some(ResourceKind::Leaves), 1, 10)).unwrap();
        assert!(!ant.can_carry(ResourceKind::Nectar));
        assert_eq!(ant.load(ResourceKind::Nectar, 5), 0);
        assert_eq!(ant.carried(), 1);
    }

    #[test]
    fn unload_empties() {
        let mut ant = Ant::from_view(&view(Some(ResourceKind::Food), 4, 4)).unwrap();
        assert_eq!(
            ant.unload(),
            Some(Cargo {
                kind: ResourceKind::Food,
                quantity: 4
            })
        );
        assert_eq!(ant.carried(), 0);
        assert_eq!(ant.to_view().carried_type, None);
    }

    proptest! {
        #[test]
        fn carried_never_exceeds_capacity(
            capacity in 1u32..50,
            offers in proptest::collection::vec(0u32..100, 0..20),
        ) {
            let mut ant = Ant::from_view(&view(None, 0, capacity)).unwrap();
            for offer in offers {
                ant.load(ResourceKind::Food, offer);
                prop_assert!(ant.carried() <= ant.capacity());
                prop_assert_eq!(ant.cargo().is_some(), ant.carried() > 0);
            }
        }
    }
}
