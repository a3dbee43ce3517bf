//! Forager decision logic.
//!
//! [`decide`] is a pure function of an ant's [`Perception`] and a random
//! source. It never touches the field or the resource cache: it returns an
//! [`Intent`] that the coordinator validates and applies.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use shared::{AntId, ForagingState, ResourceId, ResourceKind, TrailType};
use std::f32::consts::TAU;

use super::ant::Cargo;
use super::pheromone::GradientSample;
use super::{
    ANT_SLOWNESS_WITH_LOAD, ANT_SPEED, COLONY_RADIUS, GRADIENT_SAMPLE_RADIUS, PICKUP_RANGE,
    SENSE_RADIUS, SEPARATION_RADIUS,
};
use crate::error::ConfigError;

/// Share of the strongest reading a heading needs to count as a tie.
const TIE_BAND: f32 = 0.95;
const MIN_STEER: f32 = 1e-4;

/// Tunable constants of the forager behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorTuning {
    /// World units moved per tick.
    pub speed: f32,
    /// Speed multiplier while carrying anything.
    pub loaded_speed_factor: f32,
    /// Resource nodes further than this are invisible.
    pub sense_radius: f32,
    pub pickup_range: f32,
    /// Distance from the colony centre that counts as "at colony".
    pub colony_radius: f32,
    /// Distance along each heading at which gradients are measured.
    pub gradient_radius: f32,
    /// Readings at or below this are treated as no signal.
    pub noise_floor: f32,
    pub trail_weight: f32,
    pub resource_weight: f32,
    pub colony_weight: f32,
    pub explore_weight: f32,
    pub alarm_weight: f32,
    pub separation_radius: f32,
    /// Peers within `separation_radius` needed before repulsion kicks in.
    pub crowd_threshold: usize,
    pub separation_weight: f32,
    /// Strength laid along the path every tick (home trail outbound, food
    /// trail inbound).
    pub path_deposit: f32,
}

impl Default for BehaviorTuning {
    fn default() -> Self {
        Self {
            speed: ANT_SPEED,
            loaded_speed_factor: ANT_SLOWNESS_WITH_LOAD,
            sense_radius: SENSE_RADIUS,
            pickup_range: PICKUP_RANGE,
            colony_radius: COLONY_RADIUS,
            gradient_radius: GRADIENT_SAMPLE_RADIUS,
            noise_floor: 0.5,
            trail_weight: 1.0,
            resource_weight: 1.5,
            colony_weight: 0.6,
            explore_weight: 0.15,
            alarm_weight: 0.8,
            separation_radius: SEPARATION_RADIUS,
            crowd_threshold: 3,
            separation_weight: 0.3,
            path_deposit: 8.0,
        }
    }
}

impl BehaviorTuning {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("speed", self.speed),
            ("loaded_speed_factor", self.loaded_speed_factor),
            ("sense_radius", self.sense_radius),
            ("pickup_range", self.pickup_range),
            ("colony_radius", self.colony_radius),
            ("gradient_radius", self.gradient_radius),
            ("separation_radius", self.separation_radius),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        let non_negative = [
            ("noise_floor", self.noise_floor),
            ("trail_weight", self.trail_weight),
            ("resource_weight", self.resource_weight),
            ("colony_weight", self.colony_weight),
            ("explore_weight", self.explore_weight),
            ("alarm_weight", self.alarm_weight),
            ("separation_weight", self.separation_weight),
            ("path_deposit", self.path_deposit),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Negative { name, value });
            }
        }
        Ok(())
    }
}

/// A harvestable node within sensing range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSighting {
    pub id: ResourceId,
    pub pos: Vec2,
    pub kind: ResourceKind,
    pub quantity: u32,
}

/// Everything an ant knows when it decides. Built by the coordinator from
/// pre-tick state.
#[derive(Debug, Clone, PartialEq)]
pub struct Perception {
    pub ant: AntId,
    pub pos: Vec2,
    pub state: ForagingState,
    pub cargo: Option<Cargo>,
    pub capacity: u32,
    pub colony_pos: Vec2,
    pub home_gradient: Vec<GradientSample>,
    pub food_gradient: Vec<GradientSample>,
    pub alarm_gradient: Vec<GradientSample>,
    /// Nearest first.
    pub resources: Vec<ResourceSighting>,
    pub peers: Vec<Vec2>,
}

impl Perception {
    fn carried(&self) -> u32 {
        self.cargo.map_or(0, |c| c.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickupRequest {
    pub resource: ResourceId,
    /// Requested units; the coordinator clamps to what the node holds.
    pub amount: u32,
}

/// What an ant wants to do this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intent {
    /// Never zero.
    pub movement: Vec2,
    pub pickup: Option<PickupRequest>,
    pub dropoff: bool,
    /// Trail to lay at the new position.
    pub trail: Option<(TrailType, f32)>,
    pub next_state: ForagingState,
}

/// Computes the intent of one ant.
pub fn decide<R: Rng + ?Sized>(p: &Perception, tuning: &BehaviorTuning, rng: &mut R) -> Intent {
    let full = p.carried() >= p.capacity;
    if p.state == ForagingState::Returning || full {
        return decide_returning(p, tuning, rng);
    }

    let target = p
        .resources
        .iter()
        .find(|r| p.cargo.is_none_or(|c| c.kind == r.kind));

    // Partial load and nothing more to gather in reach: bring it home.
    if target.is_none() && p.carried() > 0 {
        return decide_returning(p, tuning, rng);
    }

    decide_foraging(p, target, tuning, rng)
}

fn decide_foraging<R: Rng + ?Sized>(
    p: &Perception,
    target: Option<&ResourceSighting>,
    tuning: &BehaviorTuning,
    rng: &mut R,
) -> Intent {
    let away_from_colony = (p.pos - p.colony_pos).try_normalize();
    let food = pick_heading(&p.food_gradient, tuning.noise_floor, away_from_colony, rng);

    let mut steer = Vec2::ZERO;
    let mut sensed = false;
    if let Some(dir) = food {
        steer += dir * tuning.trail_weight;
        sensed = true;
    }

    let mut pickup = None;
    if let Some(node) = target {
        let offset = node.pos - p.pos;
        steer += offset.normalize_or_zero() * tuning.resource_weight;
        sensed = true;
        if offset.length_squared() <= tuning.pickup_range * tuning.pickup_range {
            pickup = Some(PickupRequest {
                resource: node.id,
                amount: p.capacity - p.carried(),
            });
        }
    }

    if let Some(alarm) = pick_heading(&p.alarm_gradient, tuning.noise_floor, None, rng) {
        steer -= alarm * tuning.alarm_weight;
    }
    steer += separation(p, tuning);

    // Without any lead the ant just wanders.
    let explore = if sensed { tuning.explore_weight } else { 1.0 };
    steer += random_unit(rng) * explore;

    let direction = steer.try_normalize().unwrap_or_else(|| random_unit(rng));
    let next_state = if target.is_some() {
        ForagingState::Seeking
    } else {
        ForagingState::Idle
    };

    Intent {
        movement: direction * speed_for(p, tuning),
        pickup,
        dropoff: false,
        trail: (p.carried() == 0 && tuning.path_deposit > 0.0)
            .then_some((TrailType::Home, tuning.path_deposit)),
        next_state,
    }
}

fn decide_returning<R: Rng + ?Sized>(p: &Perception, tuning: &BehaviorTuning, rng: &mut R) -> Intent {
    let to_colony = p.colony_pos - p.pos;
    if to_colony.length_squared() <= tuning.colony_radius * tuning.colony_radius {
        // Home: drop the load and head back out.
        return Intent {
            movement: random_unit(rng) * tuning.speed,
            pickup: None,
            dropoff: p.carried() > 0,
            trail: None,
            next_state: ForagingState::Idle,
        };
    }

    let direct = to_colony.normalize_or_zero();
    let mut steer = direct * tuning.colony_weight;
    if let Some(home) = pick_heading(&p.home_gradient, tuning.noise_floor, Some(direct), rng) {
        steer += home * tuning.trail_weight;
    } else {
        // No trail sensed: straight for the colony.
        steer = direct;
    }
    steer += separation(p, tuning);

    let direction = steer
        .try_normalize()
        .or_else(|| direct.try_normalize())
        .unwrap_or_else(|| random_unit(rng));

    Intent {
        movement: direction * speed_for(p, tuning),
        pickup: None,
        dropoff: false,
        trail: (p.carried() > 0 && tuning.path_deposit > 0.0)
            .then_some((TrailType::Food, tuning.path_deposit)),
        next_state: ForagingState::Returning,
    }
}

/// Picks the strongest heading above the noise floor. Headings within
/// `TIE_BAND` of the strongest are ties: the one best aligned with
/// `preferred` wins, or a random one when there is no preference.
fn pick_heading<R: Rng + ?Sized>(
    samples: &[GradientSample],
    noise_floor: f32,
    preferred: Option<Vec2>,
    rng: &mut R,
) -> Option<Vec2> {
    let top = samples.first()?.strength;
    if !(top > noise_floor) {
        return None;
    }
    let ties: Vec<&GradientSample> = samples
        .iter()
        .take_while(|s| s.strength >= top * TIE_BAND)
        .collect();
    let chosen = match preferred {
        Some(pref) => ties
            .iter()
            .max_by(|a, b| a.direction.dot(pref).total_cmp(&b.direction.dot(pref)))
            .copied(),
        None => ties.get(rng.random_range(0..ties.len())).copied(),
    }?;
    Some(chosen.direction)
}

/// Mild push away from peers, only once the spot is crowded.
fn separation(p: &Perception, tuning: &BehaviorTuning) -> Vec2 {
    if p.peers.len() < tuning.crowd_threshold.max(1) {
        return Vec2::ZERO;
    }
    let push: Vec2 = p
        .peers
        .iter()
        .map(|peer| (p.pos - *peer).normalize_or_zero())
        .sum();
    let push = push / p.peers.len() as f32;
    if push.length_squared() < MIN_STEER {
        return Vec2::ZERO;
    }
    push * tuning.separation_weight
}

fn speed_for(p: &Perception, tuning: &BehaviorTuning) -> f32 {
    if p.carried() > 0 {
        tuning.speed * tuning.loaded_speed_factor
    } else {
        tuning.speed
    }
}

fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    Vec2::from_angle(rng.random_range(0.0..TAU))
}
