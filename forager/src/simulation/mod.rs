pub mod ant;
pub mod behavior;
mod colony;
mod occupancy;
pub mod pheromone;
mod resource;
mod sim;
pub mod stats;

// Re-export key types for easier imports
pub use ant::{Ant, AntKey, Cargo};
pub use behavior::{BehaviorTuning, Intent, Perception, PickupRequest, ResourceSighting, decide};
pub use colony::Colony;
pub use occupancy::OccupancyGrid;
pub use pheromone::{
    GradientSample, PheromoneChannel, PheromoneField, TrailReading, TrailSummary, VisibleCell,
};
pub use resource::{ResourceCache, ResourceNode};
pub use sim::{AgentFailure, ForagingCoordinator, TickReport};
pub use stats::{StatsHistory, TickStatistics};

// Pheromone constants
pub const MAX_PHEROMONE: f32 = 255.0;
pub const PHEROMONE_FLOOR: f32 = 0.01; // Anything weaker decays straight to zero
pub const GRADIENT_HEADINGS: usize = 16;

// World defaults
pub const DEFAULT_WORLD_WIDTH: f32 = 360.0;
pub const DEFAULT_WORLD_HEIGHT: f32 = 200.0;
pub const DEFAULT_CELL_SIZE: f32 = 1.0;

// Decay defaults, fraction lost per tick
pub const DEFAULT_HOME_DECAY: f32 = 0.02;
pub const DEFAULT_FOOD_DECAY: f32 = 0.05; // Food moves, so its trail goes stale sooner
pub const DEFAULT_ALARM_DECAY: f32 = 0.10;

// Forager defaults
pub const ANT_SPEED: f32 = 1.0; // World units per tick
pub const ANT_SLOWNESS_WITH_LOAD: f32 = 0.9; // Ants are 10% slower when carrying
pub const SENSE_RADIUS: f32 = 10.0;
pub const PICKUP_RANGE: f32 = 1.5;
pub const COLONY_RADIUS: f32 = 4.0;
pub const GRADIENT_SAMPLE_RADIUS: f32 = 3.0;
pub const SEPARATION_RADIUS: f32 = 1.5;

// Coordinator defaults
pub const RESOURCE_SCAN_RADIUS: f32 = 60.0;
pub const STATS_HISTORY_LEN: usize = 120;
