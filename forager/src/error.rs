use shared::{AntId, ColonyId, ResourceId};
use thiserror::Error;

/// Invalid configuration. Fatal: raised before any tick runs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("world dimensions must be positive and finite, got {width}x{height}")]
    WorldSize { width: f32, height: f32 },
    #[error("cell size must be positive and finite, got {0}")]
    CellSize(f32),
    #[error("decay rate for {trail} must lie in [0, 1], got {rate}")]
    DecayRate { trail: &'static str, rate: f32 },
    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[error("pheromone grid of {cols}x{rows} cells is too large")]
    GridTooLarge { cols: f32, rows: f32 },
    #[error("statistics history window must hold at least one entry")]
    EmptyHistory,
}

/// A record handed in by an external collaborator failed validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecordError {
    #[error("{0} has a non-finite position")]
    NonFinitePosition(String),
    #[error("{0} has zero carrying capacity")]
    ZeroCapacity(AntId),
    #[error("{ant} carries {carried} but can only hold {capacity}")]
    OverCapacity { ant: AntId, carried: u32, capacity: u32 },
    #[error("{0} carries a quantity without a resource type, or a type without a quantity")]
    CargoMismatch(AntId),
    #[error("{ant} belongs to unregistered {colony}")]
    UnknownColony { ant: AntId, colony: ColonyId },
}

/// Failure reported by a `WorldStore` implementation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("{0} is not known to the store")]
    UnknownResource(ResourceId),
    #[error("{0} has no storage ledger")]
    UnknownColony(ColonyId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A single agent could not act this tick. Recovered: the agent keeps its
/// pre-tick state and the tick continues for everybody else.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AgentError {
    #[error("colony {0} is no longer registered")]
    UnknownColony(ColonyId),
    #[error("{0} vanished between cache refresh and pickup")]
    ResourceVanished(ResourceId),
    #[error("position ({x}, {y}) is not finite")]
    InvalidPosition { x: f32, y: f32 },
    #[error("carried {carried} exceeds capacity {capacity}")]
    InvalidCargo { carried: u32, capacity: u32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure encoding or decoding a field snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to encode field snapshot: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("failed to decode field snapshot: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("snapshot is inconsistent: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
