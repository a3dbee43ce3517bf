use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

record_id!(
    /// Identifier of an ant, assigned by the population subsystem.
    AntId,
    "ant"
);
record_id!(
    /// Identifier of a colony.
    ColonyId,
    "colony"
);
record_id!(
    /// Identifier of a resource node on the map.
    ResourceId,
    "resource"
);

/// Foraging state of an ant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForagingState {
    #[default]
    Idle,
    Seeking,
    Returning,
}

/// Caste of an ant. Only used for statistics; capacity travels with the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntRole {
    #[default]
    Worker,
    Soldier,
    Scout,
    Nurse,
}

/// Kind of material a resource node yields and a colony stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Food,
    Seeds,
    Leaves,
    Nectar,
    Fungus,
    Minerals,
}

/// Pheromone channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailType {
    /// Leads back toward a colony.
    Home,
    /// Leads toward a recently found resource.
    Food,
    /// Repels foragers: danger, depleted nodes, player "keep out" markers.
    Alarm,
}

impl TrailType {
    pub const ALL: [TrailType; 3] = [TrailType::Home, TrailType::Food, TrailType::Alarm];
    pub const COUNT: usize = Self::ALL.len();

    /// Channel index of this trail type.
    #[inline(always)]
    pub const fn index(self) -> usize {
        match self {
            TrailType::Home => 0,
            TrailType::Food => 1,
            TrailType::Alarm => 2,
        }
    }
}

/// Ant record handed to (and returned by) the foraging core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntView {
    pub id: AntId,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub state: ForagingState,
    #[serde(default)]
    pub role: AntRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carried_type: Option<ResourceKind>,
    #[serde(default)]
    pub carried_qty: u32,
    pub capacity: u32,
    pub colony_id: ColonyId,
}

/// Resource node record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceView {
    pub id: ResourceId,
    pub x: f32,
    pub y: f32,
    pub kind: ResourceKind,
    pub quantity: u32,
}

/// Colony record, foraging-relevant fields only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColonyView {
    pub id: ColonyId,
    pub x: f32,
    pub y: f32,
}

/// Storage increment delegated to the resource-persistence collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageDeposit {
    pub colony_id: ColonyId,
    pub kind: ResourceKind,
    pub amount: u32,
}
