use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use forager::{ForagingCoordinator, InMemoryWorld, SimulationConfig, TracingSink};
use shared::{AntId, AntRole, AntView, ForagingState, TrailType};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the headless foraging driver.
#[derive(Parser)]
#[command(name = "forager", version, about = "Headless ant foraging simulation")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to run.
    #[arg(short, long, default_value_t = 500)]
    ticks: u64,

    /// Overrides the seed from the configuration.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Writes the statistics history as JSON.
    #[arg(long)]
    stats_out: Option<PathBuf>,

    /// Writes a binary snapshot of the final pheromone field.
    #[arg(long)]
    field_out: Option<PathBuf>,

    /// Cells weaker than this are left out of the final overlay summary.
    #[arg(long, default_value_t = 1.0)]
    min_strength: f32,
}

/// Loads the simulation configuration from a TOML file or uses defaults.
fn load_config(path: Option<&PathBuf>) -> Result<SimulationConfig> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?;
            let config = toml::from_str(&content)
                .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
            info!(path = %path.display(), "Loaded config");
            Ok(config)
        }
        None => {
            info!("No config file provided, using defaults");
            Ok(SimulationConfig::default())
        }
    }
}

/// Seeds the in-memory world and the coordinator from the scenario section.
fn build_world(config: SimulationConfig) -> Result<ForagingCoordinator<InMemoryWorld>> {
    let scenario = config.scenario.clone();
    let mut world = InMemoryWorld::new();
    for resource in &scenario.resources {
        world.add_resource(resource.clone());
    }
    for colony in &scenario.colonies {
        world.add_colony(colony.id);
    }

    let mut coordinator =
        ForagingCoordinator::new(config, world).context("invalid simulation configuration")?;
    coordinator.subscribe(TracingSink);

    let mut next_id = 1u64;
    for colony in &scenario.colonies {
        coordinator
            .register_colony(colony)
            .with_context(|| format!("cannot register {}", colony.id))?;
        for i in 0..scenario.ants_per_colony {
            // Every tenth ant scouts.
            let role = if i % 10 == 9 { AntRole::Scout } else { AntRole::Worker };
            let ant = AntView {
                id: AntId(next_id),
                x: colony.x,
                y: colony.y,
                state: ForagingState::Idle,
                role,
                carried_type: None,
                carried_qty: 0,
                capacity: scenario.ant_capacity,
                colony_id: colony.id,
            };
            coordinator
                .add_agent(&ant)
                .with_context(|| format!("cannot add {}", ant.id))?;
            next_id += 1;
        }
    }
    Ok(coordinator)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    // Keep the whole run available for export.
    if cli.stats_out.is_some() {
        config.coordinator.stats_history_len = config
            .coordinator
            .stats_history_len
            .max(usize::try_from(cli.ticks).unwrap_or(usize::MAX));
    }

    let mut coordinator = build_world(config)?;
    info!(
        colonies = coordinator.config().scenario.colonies.len(),
        ants = coordinator.agent_count(),
        ticks = cli.ticks,
        "Starting simulation"
    );

    let mut failures = 0usize;
    for tick in 1..=cli.ticks {
        let report = coordinator.tick(tick);
        failures += report.failures.len();
        if tick % 100 == 0 {
            if let Some(stats) = &report.statistics {
                info!(
                    tick,
                    idle = stats.by_state.idle,
                    seeking = stats.by_state.seeking,
                    returning = stats.by_state.returning,
                    carried = stats.carrying.current,
                    utilization = stats.carrying.utilization_pct,
                    "Progress"
                );
            }
        }
    }
    if failures > 0 {
        warn!(failures, "Some agents failed during the run");
    }

    for (colony, storage) in coordinator
        .config()
        .scenario
        .colonies
        .iter()
        .filter_map(|c| coordinator.colony_storage(c.id).map(|s| (c.id, s)))
    {
        info!(colony = %colony, storage = ?storage, "Final storage");
    }
    for trail in TrailType::ALL {
        let cells = coordinator
            .field()
            .visible_cells(cli.min_strength)
            .filter(|cell| cell.trail == trail)
            .count();
        info!(?trail, cells, min_strength = cli.min_strength, "Visible trail cells");
    }

    if let Some(path) = &cli.stats_out {
        let history: Vec<_> = coordinator.statistics_history(usize::MAX).collect();
        let json = serde_json::to_string_pretty(&history).context("failed to serialize statistics")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write statistics to '{}'", path.display()))?;
        info!(path = %path.display(), ticks = history.len(), "Statistics written");
    }
    if let Some(path) = &cli.field_out {
        let bytes = coordinator
            .field()
            .encode_snapshot()
            .context("failed to encode pheromone field")?;
        std::fs::write(path, &bytes)
            .with_context(|| format!("failed to write field snapshot to '{}'", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "Field snapshot written");
    }

    Ok(())
}
