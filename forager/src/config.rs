use serde::{Deserialize, Serialize};
use shared::{ColonyId, ColonyView, ResourceId, ResourceKind, ResourceView, TrailType};

use crate::error::ConfigError;
use crate::simulation::{
    BehaviorTuning, DEFAULT_ALARM_DECAY, DEFAULT_CELL_SIZE, DEFAULT_FOOD_DECAY, DEFAULT_HOME_DECAY,
    DEFAULT_WORLD_HEIGHT, DEFAULT_WORLD_WIDTH, RESOURCE_SCAN_RADIUS, STATS_HISTORY_LEN,
};

// Scenario defaults
pub const DEFAULT_ANTS_PER_COLONY: u32 = 200;
pub const DEFAULT_ANT_CAPACITY: u32 = 5;

/// Everything the coordinator and the headless driver need. Every section
/// falls back to its defaults when missing from the TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seeds every random decision. Same seed, same run.
    pub seed: u64,
    pub world: WorldConfig,
    pub trails: TrailConfig,
    pub behavior: BehaviorTuning,
    pub coordinator: CoordinatorConfig,
    pub scenario: ScenarioConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    pub cell_size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    pub home_decay: f32,
    pub food_decay: f32,
    pub alarm_decay: f32,
    /// FOOD trail laid at a node when something is picked up from it.
    pub pickup_deposit: f32,
    /// HOME trail laid at the colony on every delivery.
    pub dropoff_deposit: f32,
    /// ALARM trail laid at a node once it runs dry.
    pub depleted_alarm: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Radius around each colony refreshed from the store every tick.
    pub resource_scan_radius: f32,
    pub stats_history_len: usize,
    /// Drop depleted nodes from the local cache instead of keeping them
    /// until the store stops reporting them.
    pub prune_depleted: bool,
    /// Compute decisions on the rayon pool.
    pub parallel: bool,
}

/// Initial world used by the headless driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub colonies: Vec<ColonyView>,
    pub resources: Vec<ResourceView>,
    pub ants_per_colony: u32,
    pub ant_capacity: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            world: WorldConfig::default(),
            trails: TrailConfig::default(),
            behavior: BehaviorTuning::default(),
            coordinator: CoordinatorConfig::default(),
            scenario: ScenarioConfig::default(),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WORLD_WIDTH,
            height: DEFAULT_WORLD_HEIGHT,
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            home_decay: DEFAULT_HOME_DECAY,
            food_decay: DEFAULT_FOOD_DECAY,
            alarm_decay: DEFAULT_ALARM_DECAY,
            pickup_deposit: 64.0,
            dropoff_deposit: 64.0,
            depleted_alarm: 48.0,
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            resource_scan_radius: RESOURCE_SCAN_RADIUS,
            stats_history_len: STATS_HISTORY_LEN,
            prune_depleted: false,
            parallel: true,
        }
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        let (cx, cy) = (DEFAULT_WORLD_WIDTH / 2.0, DEFAULT_WORLD_HEIGHT / 2.0);
        let food = |id: u64, x: f32, y: f32, kind: ResourceKind, quantity: u32| ResourceView {
            id: ResourceId(id),
            x,
            y,
            kind,
            quantity,
        };
        Self {
            colonies: vec![ColonyView {
                id: ColonyId(1),
                x: cx,
                y: cy,
            }],
            resources: vec![
                food(1, cx + 40.0, cy, ResourceKind::Food, 500),
                food(2, cx - 35.0, cy + 20.0, ResourceKind::Seeds, 300),
                food(3, cx + 10.0, cy - 45.0, ResourceKind::Leaves, 300),
                food(4, cx - 20.0, cy - 25.0, ResourceKind::Nectar, 150),
            ],
            ants_per_colony: DEFAULT_ANTS_PER_COLONY,
            ant_capacity: DEFAULT_ANT_CAPACITY,
        }
    }
}

impl TrailConfig {
    /// Decay rates indexed by `TrailType::index`.
    pub fn decay_rates(&self) -> [f32; TrailType::COUNT] {
        let mut rates = [0.0; TrailType::COUNT];
        rates[TrailType::Home.index()] = self.home_decay;
        rates[TrailType::Food.index()] = self.food_decay;
        rates[TrailType::Alarm.index()] = self.alarm_decay;
        rates
    }
}

impl SimulationConfig {
    /// Rejects anything the coordinator could not run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let WorldConfig {
            width,
            height,
            cell_size,
        } = self.world;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ConfigError::WorldSize { width, height });
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(ConfigError::CellSize(cell_size));
        }
        let decays = [
            ("home", self.trails.home_decay),
            ("food", self.trails.food_decay),
            ("alarm", self.trails.alarm_decay),
        ];
        for (trail, rate) in decays {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::DecayRate { trail, rate });
            }
        }
        for (name, value) in [
            ("pickup_deposit", self.trails.pickup_deposit),
            ("dropoff_deposit", self.trails.dropoff_deposit),
            ("depleted_alarm", self.trails.depleted_alarm),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Negative { name, value });
            }
        }
        let scan = self.coordinator.resource_scan_radius;
        if !(scan.is_finite() && scan > 0.0) {
            return Err(ConfigError::NonPositive {
                name: "resource_scan_radius",
                value: scan,
            });
        }
        if self.coordinator.stats_history_len == 0 {
            return Err(ConfigError::EmptyHistory);
        }
        self.behavior.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: SimulationConfig = toml::from_str(
            r#"
            seed = 42

            [world]
            width = 100.0

            [trails]
            food_decay = 0.2

            [behavior]
            crowd_threshold = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.world.width, 100.0);
        assert_eq!(config.world.height, DEFAULT_WORLD_HEIGHT);
        assert_eq!(config.trails.decay_rates()[TrailType::Food.index()], 0.2);
        assert_eq!(config.trails.home_decay, DEFAULT_HOME_DECAY);
        assert_eq!(config.behavior.crowd_threshold, 5);
        assert!(config.coordinator.parallel);
    }

    #[test]
    fn scenario_parses_records() {
        let config: SimulationConfig = toml::from_str(
            r#"
            [scenario]
            ants_per_colony = 3

            [[scenario.colonies]]
            id = 7
            x = 10.0
            y = 12.0

            [[scenario.resources]]
            id = 1
            x = 20.0
            y = 12.0
            kind = "seeds"
            quantity = 40
            "#,
        )
        .unwrap();
        assert_eq!(config.scenario.colonies[0].id, ColonyId(7));
        assert_eq!(config.scenario.resources[0].kind, ResourceKind::Seeds);
        assert_eq!(config.scenario.ant_capacity, DEFAULT_ANT_CAPACITY);
    }

    #[test]
    fn demo_config_is_valid() {
        let config: SimulationConfig = toml::from_str(include_str!("../demo.toml")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.scenario.colonies.len(), 2);
        assert!(config.coordinator.prune_depleted);
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = SimulationConfig::default();
        config.trails.alarm_decay = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DecayRate { trail: "alarm", .. })
        ));

        let mut config = SimulationConfig::default();
        config.coordinator.stats_history_len = 0;
        assert_eq!(config.validate(), Err(ConfigError::EmptyHistory));

        let mut config = SimulationConfig::default();
        config.world.cell_size = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::CellSize(0.0)));

        let mut config = SimulationConfig::default();
        config.behavior.pickup_range = -1.0;
        assert!(config.validate().is_err());
    }
}
