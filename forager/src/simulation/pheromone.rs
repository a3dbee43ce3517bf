use bincode_derive::{Decode, Encode};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use shared::{TrailType, ring_direction};
use std::collections::BTreeMap;

use super::{GRADIENT_HEADINGS, MAX_PHEROMONE, PHEROMONE_FLOOR};
use crate::error::{ConfigError, SnapshotError};

/// One trail type's strengths over the whole grid, row-major.
#[derive(Encode, Decode, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PheromoneChannel {
    pub cols: u32,
    pub rows: u32,
    data: Vec<f32>,
    /// Fraction of strength lost per decay tick.
    pub decay_rate: f32,
}

impl PheromoneChannel {
    pub fn new(cols: u32, rows: u32, decay_rate: f32) -> Self {
        Self {
            cols,
            rows,
            data: vec![0.0; cols as usize * rows as usize],
            decay_rate,
        }
    }

    #[inline(always)]
    fn idx(&self, cx: usize, cy: usize) -> usize {
        cy * self.cols as usize + cx
    }

    /// Strength at a cell, 0 outside the grid.
    #[inline(always)]
    pub fn get(&self, cx: usize, cy: usize) -> f32 {
        if cx < self.cols as usize && cy < self.rows as usize {
            self.data[self.idx(cx, cy)]
        } else {
            0.0
        }
    }

    /// Additive, saturating at `MAX_PHEROMONE`.
    #[inline(always)]
    pub fn lay(&mut self, cx: usize, cy: usize, amount: f32) {
        let i = self.idx(cx, cy);
        let cell = &mut self.data[i];
        *cell = (*cell + amount).min(MAX_PHEROMONE);
    }

    #[inline(always)]
    fn zero(&mut self, cx: usize, cy: usize) {
        let i = self.idx(cx, cy);
        self.data[i] = 0.0;
    }

    pub fn decay(&mut self) {
        let retain = 1.0 - self.decay_rate;
        for cell in self.data.iter_mut().filter(|c| **c > 0.0) {
            *cell *= retain;
            if *cell < PHEROMONE_FLOOR {
                *cell = 0.0;
            }
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    pub fn summary(&self) -> TrailSummary {
        let mut summary = TrailSummary::default();
        for &strength in self.data.iter().filter(|s| **s > 0.0) {
            summary.active_cells += 1;
            summary.total_strength += f64::from(strength);
            summary.peak = summary.peak.max(strength);
        }
        summary
    }

    fn is_consistent(&self) -> bool {
        self.data.len() == self.cols as usize * self.rows as usize
            && (0.0..=1.0).contains(&self.decay_rate)
            && self
                .data
                .iter()
                .all(|s| s.is_finite() && (0.0..=MAX_PHEROMONE).contains(s))
    }
}

/// Aggregate of one channel, used by tick statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailSummary {
    pub active_cells: usize,
    pub total_strength: f64,
    pub peak: f32,
}

/// Strength measured along one heading of the sampling ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientSample {
    /// Index on the `GRADIENT_HEADINGS` ring, 0 = east, counter-clockwise.
    pub heading: usize,
    /// Unit vector of the heading.
    pub direction: Vec2,
    pub strength: f32,
}

/// Every trail's strength at a single cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrailReading {
    strengths: [f32; TrailType::COUNT],
}

impl TrailReading {
    pub fn get(&self, trail: TrailType) -> f32 {
        self.strengths[trail.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (TrailType, f32)> + '_ {
        TrailType::ALL.iter().map(|&t| (t, self.get(t)))
    }
}

/// A cell exported for map overlays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleCell {
    pub cell_x: u32,
    pub cell_y: u32,
    pub trail: TrailType,
    pub strength: f32,
}

#[derive(Encode, Decode)]
struct FieldSnapshot {
    width: f32,
    height: f32,
    cell_size: f32,
    last_decay_tick: Option<u64>,
    channels: Vec<PheromoneChannel>,
}

/// Bounded 2D grid of independently decaying trail channels.
///
/// World coordinates map to cells by division by `cell_size`. Every
/// operation is forgiving about coordinates: anything outside the world is a
/// silent no-op or an empty result.
#[derive(Debug, Clone, PartialEq)]
pub struct PheromoneField {
    width: f32,
    height: f32,
    cell_size: f32,
    cols: usize,
    rows: usize,
    channels: Vec<PheromoneChannel>,
    last_decay_tick: Option<u64>,
}

impl PheromoneField {
    /// `decay_rates` is indexed by `TrailType::index`.
    pub fn new(
        width: f32,
        height: f32,
        cell_size: f32,
        decay_rates: [f32; TrailType::COUNT],
    ) -> Result<Self, ConfigError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ConfigError::WorldSize { width, height });
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(ConfigError::CellSize(cell_size));
        }
        for trail in TrailType::ALL {
            let rate = decay_rates[trail.index()];
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::DecayRate {
                    trail: trail_name(trail),
                    rate,
                });
            }
        }

        let (cols, rows) = grid_dims(width, height, cell_size)?;
        let channels = TrailType::ALL
            .iter()
            .map(|t| PheromoneChannel::new(cols, rows, decay_rates[t.index()]))
            .collect();
        let (cols, rows) = (cols as usize, rows as usize);

        Ok(Self {
            width,
            height,
            cell_size,
            cols,
            rows,
            channels,
            last_decay_tick: None,
        })
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid dimensions in cells.
    pub fn grid_size(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    pub fn channel(&self, trail: TrailType) -> &PheromoneChannel {
        &self.channels[trail.index()]
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.cell_of(x, y).is_some()
    }

    #[inline(always)]
    fn cell_of(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }
        if x < 0.0 || y < 0.0 || x >= self.width || y >= self.height {
            return None;
        }
        let cx = ((x / self.cell_size) as usize).min(self.cols - 1);
        let cy = ((y / self.cell_size) as usize).min(self.rows - 1);
        Some((cx, cy))
    }

    #[inline(always)]
    fn cell_centre(&self, cx: usize, cy: usize) -> Vec2 {
        Vec2::new(
            (cx as f32 + 0.5) * self.cell_size,
            (cy as f32 + 0.5) * self.cell_size,
        )
    }

    /// Adds `amount` to the cell containing (x, y), saturating at 255.
    /// Returns false when nothing was laid (out of bounds, amount ≤ 0 or NaN).
    pub fn deposit(&mut self, x: f32, y: f32, trail: TrailType, amount: f32) -> bool {
        if !(amount > 0.0) {
            return false;
        }
        match self.cell_of(x, y) {
            Some((cx, cy)) => {
                self.channels[trail.index()].lay(cx, cy, amount);
                true
            }
            None => false,
        }
    }

    /// Decays every channel once for `tick`. A tick index at or before the
    /// last decayed one is ignored, so a tick never decays twice.
    pub fn decay_tick(&mut self, tick: u64) -> bool {
        if self.last_decay_tick.is_some_and(|last| tick <= last) {
            return false;
        }
        for channel in &mut self.channels {
            channel.decay();
        }
        self.last_decay_tick = Some(tick);
        true
    }

    pub fn last_decay_tick(&self) -> Option<u64> {
        self.last_decay_tick
    }

    /// Strength of `trail` at the cell containing (x, y), 0 out of bounds.
    pub fn strength_at(&self, x: f32, y: f32, trail: TrailType) -> f32 {
        self.cell_of(x, y)
            .map_or(0.0, |(cx, cy)| self.channels[trail.index()].get(cx, cy))
    }

    /// Measures `trail` at `radius` along each heading of the ring, strongest
    /// first (ties keep ring order). Empty only when (x, y) is outside the world.
    pub fn sample_gradient(
        &self,
        x: f32,
        y: f32,
        trail: TrailType,
        radius: f32,
    ) -> Vec<GradientSample> {
        if self.cell_of(x, y).is_none() {
            return Vec::new();
        }
        let radius = if radius.is_finite() { radius.max(0.0) } else { 0.0 };
        let origin = Vec2::new(x, y);

        let mut samples: Vec<GradientSample> = (0..GRADIENT_HEADINGS)
            .map(|heading| {
                let (dx, dy) = ring_direction(heading, GRADIENT_HEADINGS);
                let direction = Vec2::new(dx, dy);
                let probe = origin + direction * radius;
                GradientSample {
                    heading,
                    direction,
                    strength: self.strength_at(probe.x, probe.y, trail),
                }
            })
            .collect();
        samples.sort_by(|a, b| b.strength.total_cmp(&a.strength));
        samples
    }

    pub fn sample_all(&self, x: f32, y: f32) -> TrailReading {
        let mut reading = TrailReading::default();
        if let Some((cx, cy)) = self.cell_of(x, y) {
            for trail in TrailType::ALL {
                reading.strengths[trail.index()] = self.channels[trail.index()].get(cx, cy);
            }
        }
        reading
    }

    /// Lazily walks the grid and yields every (cell, trail) at or above
    /// `min_strength`. Empty cells are never yielded. Each call re-scans.
    pub fn visible_cells(&self, min_strength: f32) -> impl Iterator<Item = VisibleCell> + '_ {
        self.cells_in(0..self.cols, 0..self.rows, min_strength)
    }

    /// `visible_cells` restricted to cells whose centre lies within `radius`
    /// of (x, y).
    pub fn visible_cells_near(
        &self,
        x: f32,
        y: f32,
        radius: f32,
        min_strength: f32,
    ) -> impl Iterator<Item = VisibleCell> + '_ {
        let centre = Vec2::new(x, y);
        let (xs, ys) = self.cell_span(centre, radius);
        self.cells_in(xs, ys, min_strength).filter(move |cell| {
            self.cell_centre(cell.cell_x as usize, cell.cell_y as usize)
                .distance_squared(centre)
                <= radius * radius
        })
    }

    fn cells_in(
        &self,
        xs: std::ops::Range<usize>,
        ys: std::ops::Range<usize>,
        min_strength: f32,
    ) -> impl Iterator<Item = VisibleCell> + '_ {
        ys.flat_map(move |cy| xs.clone().map(move |cx| (cx, cy)))
            .flat_map(move |(cx, cy)| {
                TrailType::ALL.into_iter().filter_map(move |trail| {
                    let strength = self.channels[trail.index()].get(cx, cy);
                    (strength > 0.0 && strength >= min_strength).then_some(VisibleCell {
                        cell_x: cx as u32,
                        cell_y: cy as u32,
                        trail,
                        strength,
                    })
                })
            })
    }

    /// Grid ranges covering the square around a circle, clipped to the grid.
    /// Empty when the circle misses the world or the radius is invalid.
    fn cell_span(
        &self,
        centre: Vec2,
        radius: f32,
    ) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        if !(centre.is_finite() && radius.is_finite() && radius >= 0.0) {
            return (0..0, 0..0);
        }
        let to_cells = |lo: f32, hi: f32, limit: usize| {
            let lo = (lo / self.cell_size).floor().max(0.0) as usize;
            let hi = ((hi / self.cell_size).floor() + 1.0).clamp(0.0, limit as f32) as usize;
            lo.min(hi)..hi
        };
        (
            to_cells(centre.x - radius, centre.x + radius, self.cols),
            to_cells(centre.y - radius, centre.y + radius, self.rows),
        )
    }

    /// Zeroes every trail in cells whose centre lies within `radius` of
    /// (x, y). Returns the number of cells cleared.
    pub fn clear_area(&mut self, x: f32, y: f32, radius: f32) -> usize {
        let centre = Vec2::new(x, y);
        let (xs, ys) = self.cell_span(centre, radius);
        let mut cleared = 0;
        for cy in ys {
            for cx in xs.clone() {
                if self.cell_centre(cx, cy).distance_squared(centre) <= radius * radius {
                    for channel in &mut self.channels {
                        channel.zero(cx, cy);
                    }
                    cleared += 1;
                }
            }
        }
        cleared
    }

    pub fn clear_all(&mut self) {
        for channel in &mut self.channels {
            channel.clear();
        }
        self.last_decay_tick = None;
    }

    pub fn summary(&self) -> BTreeMap<TrailType, TrailSummary> {
        TrailType::ALL
            .iter()
            .map(|&t| (t, self.channels[t.index()].summary()))
            .collect()
    }

    pub fn encode_snapshot(&self) -> Result<Vec<u8>, SnapshotError> {
        let snapshot = FieldSnapshot {
            width: self.width,
            height: self.height,
            cell_size: self.cell_size,
            last_decay_tick: self.last_decay_tick,
            channels: self.channels.clone(),
        };
        Ok(bincode::encode_to_vec(
            &snapshot,
            bincode::config::standard(),
        )?)
    }

    pub fn decode_snapshot(data: &[u8]) -> Result<Self, SnapshotError> {
        let (snapshot, _len): (FieldSnapshot, _) =
            bincode::decode_from_slice(data, bincode::config::standard())?;

        if snapshot.channels.len() != TrailType::COUNT {
            return Err(SnapshotError::Corrupt(format!(
                "expected {} channels, found {}",
                TrailType::COUNT,
                snapshot.channels.len()
            )));
        }
        let mut decay_rates = [0.0; TrailType::COUNT];
        for (rate, channel) in decay_rates.iter_mut().zip(&snapshot.channels) {
            *rate = channel.decay_rate;
        }

        let mut field = Self::new(
            snapshot.width,
            snapshot.height,
            snapshot.cell_size,
            decay_rates,
        )?;
        for channel in &snapshot.channels {
            if channel.cols as usize != field.cols
                || channel.rows as usize != field.rows
                || !channel.is_consistent()
            {
                return Err(SnapshotError::Corrupt(
                    "channel does not match the grid it claims".to_string(),
                ));
            }
        }
        field.channels = snapshot.channels;
        field.last_decay_tick = snapshot.last_decay_tick;
        Ok(field)
    }
}

/// Cell counts per axis. Channels index cells with `u32`, so a grid needing
/// more columns or rows than that is refused.
fn grid_dims(width: f32, height: f32, cell_size: f32) -> Result<(u32, u32), ConfigError> {
    let cols = (width / cell_size).ceil().max(1.0);
    let rows = (height / cell_size).ceil().max(1.0);
    if !(cols.is_finite() && rows.is_finite())
        || cols >= u32::MAX as f32
        || rows >= u32::MAX as f32
    {
        return Err(ConfigError::GridTooLarge { cols, rows });
    }
    Ok((cols as u32, rows as u32))
}

fn trail_name(trail: TrailType) -> &'static str {
    match trail {
        TrailType::Home => "home",
        TrailType::Food => "food",
        TrailType::Alarm => "alarm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn field(decay: f32) -> PheromoneField {
        PheromoneField::new(40.0, 30.0, 1.0, [decay; TrailType::COUNT]).unwrap()
    }

    #[test]
    fn rejects_degenerate_worlds() {
        assert!(matches!(
            PheromoneField::new(0.0, 10.0, 1.0, [0.1; 3]),
            Err(ConfigError::WorldSize { .. })
        ));
        assert!(matches!(
            PheromoneField::new(10.0, 10.0, -2.0, [0.1; 3]),
            Err(ConfigError::CellSize(_))
        ));
        assert!(matches!(
            PheromoneField::new(10.0, 10.0, 1.0, [0.1, 1.5, 0.1]),
            Err(ConfigError::DecayRate { trail: "food", .. })
        ));
        assert!(matches!(
            PheromoneField::new(1.0e10, 10.0, 1.0, [0.1; 3]),
            Err(ConfigError::GridTooLarge { .. })
        ));
        assert!(matches!(
            PheromoneField::new(10.0, f32::MAX, 1.0e-30, [0.1; 3]),
            Err(ConfigError::GridTooLarge { .. })
        ));
    }

    #[test]
    fn deposit_saturates_at_cap() {
        let mut f = field(0.1);
        assert!(f.deposit(10.0, 10.0, TrailType::Food, 255.0));
        assert!(f.deposit(10.0, 10.0, TrailType::Food, 100.0));
        assert_eq!(f.strength_at(10.0, 10.0, TrailType::Food), 255.0);
        assert_eq!(f.strength_at(10.0, 10.0, TrailType::Home), 0.0);
    }

    #[test]
    fn repeated_deposits_reinforce() {
        let mut f = field(0.1);
        f.deposit(3.2, 4.7, TrailType::Home, 20.0);
        f.deposit(3.9, 4.1, TrailType::Home, 20.0);
        assert_eq!(f.strength_at(3.5, 4.5, TrailType::Home), 40.0);
    }

    #[test]
    fn cell_size_groups_coordinates() {
        let mut f = PheromoneField::new(40.0, 40.0, 4.0, [0.1; 3]).unwrap();
        assert_eq!(f.grid_size(), (10, 10));
        f.deposit(9.0, 1.0, TrailType::Food, 10.0);
        assert_eq!(f.strength_at(11.9, 3.9, TrailType::Food), 10.0);
        assert_eq!(f.strength_at(12.0, 3.9, TrailType::Food), 0.0);
    }

    #[test]
    fn ten_percent_decay_takes_100_to_90() {
        let mut f = field(0.1);
        f.deposit(5.0, 5.0, TrailType::Food, 100.0);
        assert!(f.decay_tick(1));
        assert!((f.strength_at(5.0, 5.0, TrailType::Food) - 90.0).abs() < 1e-4);
    }

    #[test]
    fn decay_is_idempotent_per_tick() {
        let mut f = field(0.5);
        f.deposit(5.0, 5.0, TrailType::Home, 100.0);
        assert!(f.decay_tick(7));
        assert!(!f.decay_tick(7));
        assert!(!f.decay_tick(3));
        assert_eq!(f.strength_at(5.0, 5.0, TrailType::Home), 50.0);
        assert!(f.decay_tick(8));
        assert_eq!(f.strength_at(5.0, 5.0, TrailType::Home), 25.0);
    }

    #[test]
    fn trails_decay_at_their_own_rate() {
        let mut f = PheromoneField::new(10.0, 10.0, 1.0, [0.0, 0.5, 1.0]).unwrap();
        for trail in TrailType::ALL {
            f.deposit(1.0, 1.0, trail, 100.0);
        }
        f.decay_tick(0);
        assert_eq!(f.strength_at(1.0, 1.0, TrailType::Home), 100.0);
        assert_eq!(f.strength_at(1.0, 1.0, TrailType::Food), 50.0);
        assert_eq!(f.strength_at(1.0, 1.0, TrailType::Alarm), 0.0);
    }

    #[test]
    fn faint_trails_snap_to_zero() {
        let mut f = field(0.5);
        f.deposit(1.0, 1.0, TrailType::Food, 0.015);
        f.decay_tick(0);
        assert_eq!(f.strength_at(1.0, 1.0, TrailType::Food), 0.0);
    }

    #[test]
    fn out_of_bounds_is_silent() {
        let mut f = field(0.1);
        let before = f.clone();
        assert!(!f.deposit(-1.0, 5.0, TrailType::Food, 50.0));
        assert!(!f.deposit(40.0, 5.0, TrailType::Food, 50.0));
        assert!(!f.deposit(f32::NAN, 5.0, TrailType::Food, 50.0));
        assert!(!f.deposit(5.0, 5.0, TrailType::Food, f32::NAN));
        assert!(!f.deposit(5.0, 5.0, TrailType::Food, -3.0));
        assert_eq!(f, before);
        assert!(f.sample_gradient(-5.0, -5.0, TrailType::Food, 3.0).is_empty());
        assert_eq!(f.sample_all(100.0, 100.0), TrailReading::default());
    }

    #[test]
    fn gradient_points_to_strongest_heading() {
        let mut f = field(0.1);
        // East of (10, 10) at distance 3
        f.deposit(13.0, 10.0, TrailType::Food, 200.0);
        let samples = f.sample_gradient(10.0, 10.0, TrailType::Food, 3.0);
        assert_eq!(samples.len(), GRADIENT_HEADINGS);
        assert_eq!(samples[0].heading, 0);
        assert_eq!(samples[0].strength, 200.0);
        assert!(samples[1..].iter().all(|s| s.strength == 0.0));
        assert!((samples[0].direction - Vec2::X).length() < 1e-5);
    }

    #[test]
    fn gradient_near_edge_reads_zero_outside() {
        let f = field(0.1);
        let samples = f.sample_gradient(0.5, 0.5, TrailType::Home, 3.0);
        assert_eq!(samples.len(), GRADIENT_HEADINGS);
        assert!(samples.iter().all(|s| s.strength == 0.0));
    }

    #[test]
    fn sample_all_reads_every_trail() {
        let mut f = field(0.1);
        f.deposit(2.0, 2.0, TrailType::Home, 5.0);
        f.deposit(2.0, 2.0, TrailType::Alarm, 7.0);
        let reading = f.sample_all(2.5, 2.5);
        assert_eq!(reading.get(TrailType::Home), 5.0);
        assert_eq!(reading.get(TrailType::Food), 0.0);
        assert_eq!(reading.get(TrailType::Alarm), 7.0);
    }

    #[test]
    fn visible_cells_filters_and_restarts() {
        let mut f = field(0.1);
        f.deposit(1.0, 1.0, TrailType::Food, 50.0);
        f.deposit(20.0, 20.0, TrailType::Home, 5.0);
        let strong: Vec<_> = f.visible_cells(10.0).collect();
        assert_eq!(
            strong,
            vec![VisibleCell {
                cell_x: 1,
                cell_y: 1,
                trail: TrailType::Food,
                strength: 50.0
            }]
        );
        assert_eq!(f.visible_cells(0.0).count(), 2);
        assert_eq!(f.visible_cells(0.0).count(), 2);
    }

    #[test]
    fn visible_cells_near_limits_radius() {
        let mut f = field(0.1);
        f.deposit(5.5, 5.5, TrailType::Food, 50.0);
        f.deposit(30.5, 5.5, TrailType::Food, 50.0);
        let near: Vec<_> = f.visible_cells_near(6.0, 6.0, 4.0, 1.0).collect();
        assert_eq!(near.len(), 1);
        assert_eq!((near[0].cell_x, near[0].cell_y), (5, 5));
    }

    #[test]
    fn clear_area_respects_radius() {
        let mut f = field(0.1);
        for y in 0..30 {
            for x in 0..40 {
                for trail in TrailType::ALL {
                    f.deposit(x as f32 + 0.5, y as f32 + 0.5, trail, 10.0);
                }
            }
        }
        let (cx, cy, r) = (20.0, 15.0, 5.0);
        let cleared = f.clear_area(cx, cy, r);
        assert!(cleared > 0);
        for y in 0..30 {
            for x in 0..40 {
                let centre = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let inside = centre.distance(Vec2::new(cx, cy)) <= r;
                for trail in TrailType::ALL {
                    let s = f.strength_at(centre.x, centre.y, trail);
                    if inside {
                        assert_eq!(s, 0.0, "cell ({x},{y}) should be cleared");
                    } else {
                        assert_eq!(s, 10.0, "cell ({x},{y}) should be untouched");
                    }
                }
            }
        }
    }

    #[test]
    fn clear_all_resets_decay_marker() {
        let mut f = field(0.1);
        f.deposit(1.0, 1.0, TrailType::Home, 10.0);
        f.decay_tick(5);
        f.clear_all();
        assert_eq!(f.visible_cells(0.0).count(), 0);
        assert_eq!(f.last_decay_tick(), None);
        assert!(f.decay_tick(0));
    }

    #[test]
    fn summary_counts_active_cells() {
        let mut f = field(0.1);
        f.deposit(1.0, 1.0, TrailType::Food, 10.0);
        f.deposit(2.0, 1.0, TrailType::Food, 30.0);
        let summary = f.summary();
        let food = summary[&TrailType::Food];
        assert_eq!(food.active_cells, 2);
        assert_eq!(food.total_strength, 40.0);
        assert_eq!(food.peak, 30.0);
        assert_eq!(summary[&TrailType::Home].active_cells, 0);
    }

    #[test]
    fn snapshot_restores_field() {
        let mut f = field(0.2);
        f.deposit(3.0, 4.0, TrailType::Food, 77.0);
        f.decay_tick(12);
        let bytes = f.encode_snapshot().unwrap();
        let restored = PheromoneField::decode_snapshot(&bytes).unwrap();
        assert_eq!(restored, f);
        assert!(PheromoneField::decode_snapshot(&bytes[..bytes.len() / 2]).is_err());
    }

    proptest! {
        #[test]
        fn decay_never_increases_or_goes_negative(
            deposits in proptest::collection::vec((0.0f32..40.0, 0.0f32..30.0, 0usize..3, 0.0f32..400.0), 1..40),
            rate in 0.0f32..=1.0,
        ) {
            let mut f = field(rate);
            for (x, y, t, amount) in deposits {
                f.deposit(x, y, TrailType::ALL[t], amount);
            }
            let before = f.clone();
            f.decay_tick(1);
            for trail in TrailType::ALL {
                let (b, a) = (before.channel(trail), f.channel(trail));
                for cy in 0..30 {
                    for cx in 0..40 {
                        prop_assert!(a.get(cx, cy) <= b.get(cx, cy));
                        prop_assert!(a.get(cx, cy) >= 0.0);
                    }
                }
            }
        }

        #[test]
        fn deposits_never_exceed_cap(
            amounts in proptest::collection::vec(0.0f32..1000.0, 1..50),
        ) {
            let mut f = field(0.1);
            for amount in amounts {
                f.deposit(7.0, 7.0, TrailType::Food, amount);
                prop_assert!(f.strength_at(7.0, 7.0, TrailType::Food) <= MAX_PHEROMONE);
            }
        }

        #[test]
        fn outside_coordinates_never_mutate(
            x in prop_oneof![-1000.0f32..-0.001, 40.0f32..1000.0],
            y in -1000.0f32..1000.0,
            amount in 0.0f32..500.0,
        ) {
            let mut f = field(0.1);
            let before = f.clone();
            prop_assert!(!f.deposit(x, y, TrailType::Home, amount));
            prop_assert!(f.sample_gradient(x, y, TrailType::Home, 3.0).is_empty());
            prop_assert_eq!(f, before);
        }
    }
}
