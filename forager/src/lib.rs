pub mod config;
pub mod error;
pub mod events;
pub mod simulation;
pub mod store;

pub use config::SimulationConfig;
pub use error::{AgentError, ConfigError, RecordError, SnapshotError, StoreError};
pub use events::{ChannelSink, EventSink, ForagingEvent, TracingSink};
pub use simulation::{AgentFailure, ForagingCoordinator, PheromoneField, TickReport, TickStatistics};
pub use store::{InMemoryWorld, WorldStore};
