use glam::Vec2;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha12Rng;
use rayon::prelude::*;
use shared::{
    AntId, AntView, ColonyId, ColonyView, ForagingState, ResourceId, ResourceKind, ResourceView,
    StorageDeposit, TrailType,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, warn};

use super::ant::Ant;
use super::behavior::{BehaviorTuning, Intent, Perception, ResourceSighting, decide};
use super::colony::Colony;
use super::occupancy::OccupancyGrid;
use super::pheromone::PheromoneField;
use super::resource::ResourceCache;
use super::stats::{StatsHistory, TickStatistics, TickTally};
use crate::config::SimulationConfig;
use crate::error::{AgentError, ConfigError, RecordError, StoreError};
use crate::events::{EventSink, ForagingEvent};
use crate::store::WorldStore;

/// One agent that could not act this tick. It kept its pre-tick state.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentFailure {
    pub ant: AntId,
    pub colony: ColonyId,
    pub error: AgentError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    /// The tick index was not newer than the last processed one.
    pub skipped: bool,
    pub statistics: Option<TickStatistics>,
    pub failures: Vec<AgentFailure>,
}

impl TickReport {
    fn skipped(tick: u64) -> Self {
        Self {
            tick,
            skipped: true,
            statistics: None,
            failures: Vec::new(),
        }
    }
}

/// Outcome of the decision phase for one agent.
struct Decision {
    colony: ColonyId,
    ant: AntId,
    outcome: Result<Intent, AgentError>,
}

/// Read-only view shared by every decision of one tick.
struct DecisionContext<'a> {
    field: &'a PheromoneField,
    cache: &'a ResourceCache,
    grid: &'a OccupancyGrid,
    tuning: &'a BehaviorTuning,
    seed: u64,
    tick: u64,
}

impl DecisionContext<'_> {
    fn perceive(&self, colony: &Colony, ant: &Ant) -> Result<Perception, AgentError> {
        ant.check()?;
        let (x, y) = (ant.pos.x, ant.pos.y);
        let radius = self.tuning.gradient_radius;
        let resources = self
            .cache
            .harvestable_near(ant.pos, self.tuning.sense_radius)
            .into_iter()
            .map(|node| ResourceSighting {
                id: node.id,
                pos: node.pos,
                kind: node.kind,
                quantity: node.quantity,
            })
            .collect();

        Ok(Perception {
            ant: ant.id,
            pos: ant.pos,
            state: ant.state,
            cargo: ant.cargo(),
            capacity: ant.capacity(),
            colony_pos: colony.pos,
            home_gradient: self.field.sample_gradient(x, y, TrailType::Home, radius),
            food_gradient: self.field.sample_gradient(x, y, TrailType::Food, radius),
            alarm_gradient: self.field.sample_gradient(x, y, TrailType::Alarm, radius),
            resources,
            peers: self
                .grid
                .neighbours(ant.pos, self.tuning.separation_radius, ant.id),
        })
    }

    fn decide(&self, colony: &Colony, ant: &Ant) -> Decision {
        let mut rng = ChaCha12Rng::seed_from_u64(mix_seed(self.seed, self.tick, ant.id.0));
        let outcome = self
            .perceive(colony, ant)
            .map(|perception| decide(&perception, self.tuning, &mut rng));
        Decision {
            colony: colony.colony_id,
            ant: ant.id,
            outcome,
        }
    }
}

/// Per-agent random stream. Identical whichever thread runs the agent.
fn mix_seed(seed: u64, tick: u64, salt: u64) -> u64 {
    let mut z = seed ^ tick.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ salt.rotate_left(32);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Drives the foraging simulation of one world.
///
/// The coordinator exclusively owns the pheromone field, the resource cache
/// and the foraging aspect of every registered ant. Each [`tick`] decays the
/// field, refreshes nearby resource nodes from the [`WorldStore`], lets every
/// ant decide from pre-tick state and applies the resulting intents one by one.
///
/// [`tick`]: ForagingCoordinator::tick
pub struct ForagingCoordinator<S: WorldStore> {
    config: SimulationConfig,
    store: S,
    field: PheromoneField,
    cache: ResourceCache,
    colonies: BTreeMap<ColonyId, Colony>,
    owners: HashMap<AntId, ColonyId>,
    history: StatsHistory,
    sinks: Vec<Box<dyn EventSink>>,
    last_tick: Option<u64>,
}

impl<S: WorldStore> ForagingCoordinator<S> {
    pub fn new(config: SimulationConfig, store: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let field = PheromoneField::new(
            config.world.width,
            config.world.height,
            config.world.cell_size,
            config.trails.decay_rates(),
        )?;
        let history = StatsHistory::new(config.coordinator.stats_history_len);
        info!(
            width = config.world.width,
            height = config.world.height,
            cell_size = config.world.cell_size,
            seed = config.seed,
            "Foraging coordinator ready"
        );

        Ok(Self {
            config,
            store,
            field,
            cache: ResourceCache::new(),
            colonies: BTreeMap::new(),
            owners: HashMap::new(),
            history,
            sinks: Vec::new(),
            last_tick: None,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn field(&self) -> &PheromoneField {
        &self.field
    }

    pub fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    pub fn subscribe<E: EventSink + 'static>(&mut self, sink: E) {
        self.sinks.push(Box::new(sink));
    }

    fn emit(&mut self, event: ForagingEvent) {
        for sink in &mut self.sinks {
            sink.emit(&event);
        }
    }

    // ---- Registration ----

    /// Starts tracking a colony. Returns `false` if it is already tracked.
    pub fn register_colony(&mut self, view: &ColonyView) -> Result<bool, RecordError> {
        if self.colonies.contains_key(&view.id) {
            debug!(colony = %view.id, "Colony already registered");
            return Ok(false);
        }
        let colony = Colony::new(view)?;
        self.colonies.insert(view.id, colony);
        info!(colony = %view.id, x = view.x, y = view.y, "Colony registered");
        self.emit(ForagingEvent::ColonyRegistered { colony: view.id });
        Ok(true)
    }

    /// Stops tracking a colony and releases its ants. Returns their final
    /// records, or `None` if the colony was not tracked.
    pub fn unregister_colony(&mut self, id: ColonyId) -> Option<Vec<AntView>> {
        let colony = self.colonies.remove(&id)?;
        let released: Vec<AntView> = colony.ants.values().map(Ant::to_view).collect();
        for ant in &released {
            self.owners.remove(&ant.id);
        }
        info!(colony = %id, ants = released.len(), "Colony unregistered");
        self.emit(ForagingEvent::ColonyUnregistered {
            colony: id,
            ants_released: released.len(),
        });
        Some(released)
    }

    /// Starts tracking an ant. Returns `false` if its id is already tracked.
    pub fn add_agent(&mut self, view: &AntView) -> Result<bool, RecordError> {
        if self.owners.contains_key(&view.id) {
            debug!(ant = %view.id, "Ant already tracked");
            return Ok(false);
        }
        let ant = Ant::from_view(view)?;
        let colony = self
            .colonies
            .get_mut(&view.colony_id)
            .ok_or(RecordError::UnknownColony {
                ant: view.id,
                colony: view.colony_id,
            })?;
        if colony.spawn_ant(ant).is_none() {
            return Ok(false);
        }
        self.owners.insert(view.id, view.colony_id);
        Ok(true)
    }

    /// Stops tracking an ant and returns its final record.
    pub fn remove_agent(&mut self, id: AntId) -> Option<AntView> {
        let colony_id = self.owners.remove(&id)?;
        let ant = self.colonies.get_mut(&colony_id)?.despawn_ant(id)?;
        debug!(ant = %id, colony = %colony_id, "Ant left foraging");
        Some(ant.to_view())
    }

    // ---- Queries ----

    pub fn agent(&self, id: AntId) -> Option<AntView> {
        let colony_id = self.owners.get(&id)?;
        self.colonies.get(colony_id)?.ant(id).map(Ant::to_view)
    }

    pub fn agents(&self) -> impl Iterator<Item = AntView> + '_ {
        self.colonies
            .values()
            .flat_map(|colony| colony.ants.values().map(Ant::to_view))
    }

    pub fn agent_count(&self) -> usize {
        self.owners.len()
    }

    pub fn colony(&self, id: ColonyId) -> Option<ColonyView> {
        self.colonies.get(&id).map(Colony::view)
    }

    pub fn colony_storage(&self, id: ColonyId) -> Option<&BTreeMap<ResourceKind, u64>> {
        self.colonies.get(&id).map(Colony::storage)
    }

    /// Cached copy of a resource node, as last refreshed and harvested.
    pub fn resource(&self, id: ResourceId) -> Option<ResourceView> {
        self.cache.get(id).map(|node| node.to_view())
    }

    pub fn statistics(&self) -> Option<&TickStatistics> {
        self.history.latest()
    }

    /// The newest `n` tick summaries, oldest first.
    pub fn statistics_history(&self, n: usize) -> impl Iterator<Item = &TickStatistics> {
        self.history.recent(n)
    }

    // ---- Player tools ----

    /// Lays `strength` of `trail` at (x, y). Returns `false` outside the world
    /// or for a non-positive strength.
    pub fn place_scent_marker(&mut self, x: f32, y: f32, trail: TrailType, strength: f32) -> bool {
        if !self.field.deposit(x, y, trail, strength) {
            return false;
        }
        self.emit(ForagingEvent::ScentMarkerPlaced {
            x,
            y,
            trail,
            strength,
        });
        true
    }

    /// Erases every trail within `radius` of (x, y). Returns `false` when the
    /// centre is outside the world or the radius is not a usable length.
    pub fn clear_pheromone_area(&mut self, x: f32, y: f32, radius: f32) -> bool {
        if !(radius.is_finite() && radius >= 0.0) || !self.field.contains(x, y) {
            return false;
        }
        let cells = self.field.clear_area(x, y, radius);
        debug!(x, y, radius, cells, "Pheromone area cleared");
        self.emit(ForagingEvent::PheromoneAreaCleared {
            x,
            y,
            radius,
            cells,
        });
        true
    }

    // ---- Tick ----

    /// Advances the world by one tick. A tick index not newer than the last
    /// processed one is skipped.
    pub fn tick(&mut self, tick: u64) -> TickReport {
        if let Some(last) = self.last_tick.filter(|last| tick <= *last) {
            warn!(tick, last, "Stale tick index, skipping");
            return TickReport::skipped(tick);
        }
        self.last_tick = Some(tick);

        self.field.decay_tick(tick);
        self.refresh_resources();

        let mut decisions = self.decide_all(tick);
        let mut order_rng = ChaCha12Rng::seed_from_u64(mix_seed(self.config.seed, tick, u64::MAX));
        decisions.shuffle(&mut order_rng);

        let mut tally = TickTally::default();
        let mut failures = Vec::new();
        let mut events = Vec::new();
        for decision in decisions {
            let result = decision.outcome.and_then(|intent| {
                self.apply(tick, decision.colony, decision.ant, intent, &mut tally, &mut events)
            });
            if let Err(error) = result {
                warn!(tick, ant = %decision.ant, colony = %decision.colony, error = %error, "Agent failed, keeping pre-tick state");
                events.push(ForagingEvent::AgentFailed {
                    tick,
                    ant: decision.ant,
                    reason: error.to_string(),
                });
                failures.push(AgentFailure {
                    ant: decision.ant,
                    colony: decision.colony,
                    error,
                });
            }
        }
        tally.failures = failures.len();

        let statistics = TickStatistics::collect(
            tick,
            self.colonies.len(),
            self.colonies.values().flat_map(|c| c.ants.values()),
            &self.cache,
            &self.field,
            tally,
        );
        self.history.push(statistics.clone());
        for event in events {
            self.emit(event);
        }
        debug!(
            tick,
            agents = statistics.agents_total,
            harvested = tally.harvested,
            delivered = tally.delivered,
            failures = tally.failures,
            "Tick complete"
        );

        TickReport {
            tick,
            skipped: false,
            statistics: Some(statistics),
            failures,
        }
    }

    /// Re-reads the nodes around every colony. Nodes the store no longer
    /// reports are forgotten, unless some query failed this tick.
    fn refresh_resources(&mut self) {
        let radius = self.config.coordinator.resource_scan_radius;
        let mut seen = BTreeSet::new();
        let mut complete = true;
        for colony in self.colonies.values() {
            match self.store.resources_near(colony.pos.x, colony.pos.y, radius) {
                Ok(views) => seen.extend(self.cache.refresh(views)),
                Err(e) => {
                    complete = false;
                    warn!(colony = %colony.colony_id, error = %e, "Resource refresh failed, keeping cached nodes");
                }
            }
        }
        if complete {
            self.cache.retain_ids(&seen);
        }
        if self.config.coordinator.prune_depleted {
            let pruned = self.cache.prune_depleted();
            if !pruned.is_empty() {
                debug!(count = pruned.len(), "Pruned depleted resource nodes");
            }
        }
    }

    /// Computes every intent from pre-tick state.
    fn decide_all(&self, tick: u64) -> Vec<Decision> {
        let tuning = &self.config.behavior;
        let bucket = tuning.separation_radius.max(self.field.cell_size());
        let mut grid = OccupancyGrid::new(self.field.width(), self.field.height(), bucket);
        for ant in self.colonies.values().flat_map(|c| c.ants.values()) {
            grid.register(ant.id, ant.pos);
        }

        let ctx = DecisionContext {
            field: &self.field,
            cache: &self.cache,
            grid: &grid,
            tuning,
            seed: self.config.seed,
            tick,
        };
        let jobs: Vec<(&Colony, &Ant)> = self
            .colonies
            .values()
            .flat_map(|colony| colony.ants.values().map(move |ant| (colony, ant)))
            .collect();

        if self.config.coordinator.parallel {
            jobs.par_iter()
                .map(|(colony, ant)| ctx.decide(colony, ant))
                .collect()
        } else {
            jobs.iter()
                .map(|(colony, ant)| ctx.decide(colony, ant))
                .collect()
        }
    }

    /// Applies one intent. Every fallible step runs before the ant, the cache,
    /// the colony or the field is touched, so an error leaves them as they were.
    fn apply(
        &mut self,
        tick: u64,
        colony_id: ColonyId,
        ant_id: AntId,
        intent: Intent,
        tally: &mut TickTally,
        events: &mut Vec<ForagingEvent>,
    ) -> Result<(), AgentError> {
        let colony = self
            .colonies
            .get_mut(&colony_id)
            .ok_or(AgentError::UnknownColony(colony_id))?;
        let Some(mut ant) = colony.ant(ant_id).cloned() else {
            return Err(AgentError::UnknownColony(colony_id));
        };

        let target = ant.pos + intent.movement;
        if !target.is_finite() {
            return Err(AgentError::InvalidPosition {
                x: target.x,
                y: target.y,
            });
        }
        let mut next_state = intent.next_state;

        if let Some(request) = intent.pickup {
            let node = self
                .cache
                .get_mut(request.resource)
                .ok_or(AgentError::ResourceVanished(request.resource))?;
            let amount = if ant.can_carry(node.kind) {
                request.amount.min(node.quantity).min(ant.free_capacity())
            } else {
                0
            };
            if amount > 0 {
                self.store
                    .harvest(node.id, amount)
                    .map_err(|e| match e {
                        StoreError::UnknownResource(id) => AgentError::ResourceVanished(id),
                        other => AgentError::Store(other),
                    })?;
                let taken = node.take(amount);
                ant.load(node.kind, taken);
                self.field.deposit(
                    node.pos.x,
                    node.pos.y,
                    TrailType::Food,
                    self.config.trails.pickup_deposit,
                );
                tally.harvested += u64::from(taken);
                events.push(ForagingEvent::ResourcePickedUp {
                    tick,
                    ant: ant.id,
                    resource: node.id,
                    kind: node.kind,
                    amount: taken,
                });
                if node.is_depleted() {
                    self.field.deposit(
                        node.pos.x,
                        node.pos.y,
                        TrailType::Alarm,
                        self.config.trails.depleted_alarm,
                    );
                    events.push(ForagingEvent::ResourceDepleted {
                        tick,
                        resource: node.id,
                    });
                }
                next_state = if ant.is_full() || node.is_depleted() {
                    ForagingState::Returning
                } else {
                    ForagingState::Seeking
                };
            }
        }

        if intent.dropoff {
            if let Some(cargo) = ant.cargo() {
                self.store.credit_colony(StorageDeposit {
                    colony_id,
                    kind: cargo.kind,
                    amount: cargo.quantity,
                })?;
                ant.unload();
                colony.store(cargo.kind, cargo.quantity);
                self.field.deposit(
                    colony.pos.x,
                    colony.pos.y,
                    TrailType::Home,
                    self.config.trails.dropoff_deposit,
                );
                tally.delivered += u64::from(cargo.quantity);
                events.push(ForagingEvent::ResourceDelivered {
                    tick,
                    ant: ant.id,
                    colony: colony_id,
                    kind: cargo.kind,
                    amount: cargo.quantity,
                });
            }
        }

        ant.pos = clamp_to_world(&self.field, target);
        ant.state = next_state;
        if let Some((trail, amount)) = intent.trail {
            self.field.deposit(ant.pos.x, ant.pos.y, trail, amount);
        }

        if let Some(slot) = colony.ant_mut(ant_id) {
            *slot = ant;
        }
        Ok(())
    }
}

fn clamp_to_world(field: &PheromoneField, pos: Vec2) -> Vec2 {
    let max = Vec2::new(below(field.width()), below(field.height()));
    pos.clamp(Vec2::ZERO, max)
}

/// Largest float strictly below a positive bound. Works at any magnitude,
/// where subtracting a fixed margin can round back to the bound itself.
fn below(bound: f32) -> f32 {
    if bound > 0.0 && bound.is_finite() {
        f32::from_bits(bound.to_bits() - 1)
    } else {
        0.0
    }
}
