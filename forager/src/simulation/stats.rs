use serde::{Deserialize, Serialize};
use shared::{AntRole, ForagingState, TrailType};
use std::collections::{BTreeMap, VecDeque};

use super::ant::Ant;
use super::pheromone::{PheromoneField, TrailSummary};
use super::resource::ResourceCache;

/// Entries reserved up front; larger windows grow as ticks arrive.
const HISTORY_PREALLOC: usize = 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub idle: usize,
    pub seeking: usize,
    pub returning: usize,
}

impl StateCounts {
    fn record(&mut self, state: ForagingState) {
        match state {
            ForagingState::Idle => self.idle += 1,
            ForagingState::Seeking => self.seeking += 1,
            ForagingState::Returning => self.returning += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarryingStats {
    pub current: u64,
    pub capacity: u64,
    pub utilization_pct: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStats {
    pub map_nodes: usize,
    pub depleted_nodes: usize,
    /// Units picked up during the tick.
    pub harvested: u64,
    /// Units delivered to colony storage during the tick.
    pub delivered: u64,
}

/// Summary of one tick, as exported to observability and UI layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickStatistics {
    pub tick: u64,
    pub colonies: usize,
    pub agents_total: usize,
    pub by_state: StateCounts,
    #[serde(rename = "byType")]
    pub by_role: BTreeMap<AntRole, usize>,
    pub carrying: CarryingStats,
    pub resources: ResourceStats,
    pub pheromone_summary: BTreeMap<TrailType, TrailSummary>,
    pub failures: usize,
}

/// Per-tick counters the coordinator accumulates while applying intents.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TickTally {
    pub harvested: u64,
    pub delivered: u64,
    pub failures: usize,
}

impl TickStatistics {
    pub(crate) fn collect<'a, I>(
        tick: u64,
        colonies: usize,
        ants: I,
        cache: &ResourceCache,
        field: &PheromoneField,
        tally: TickTally,
    ) -> Self
    where
        I: IntoIterator<Item = &'a Ant>,
    {
        let mut stats = TickStatistics {
            tick,
            colonies,
            ..Default::default()
        };
        for ant in ants {
            stats.agents_total += 1;
            stats.by_state.record(ant.state);
            *stats.by_role.entry(ant.role).or_insert(0) += 1;
            stats.carrying.current += u64::from(ant.carried());
            stats.carrying.capacity += u64::from(ant.capacity());
        }
        if stats.carrying.capacity > 0 {
            stats.carrying.utilization_pct =
                (stats.carrying.current as f64 * 100.0 / stats.carrying.capacity as f64) as f32;
        }
        stats.resources = ResourceStats {
            map_nodes: cache.len(),
            depleted_nodes: cache.depleted_count(),
            harvested: tally.harvested,
            delivered: tally.delivered,
        };
        stats.pheromone_summary = field.summary();
        stats.failures = tally.failures;
        stats
    }
}

/// Rolling window of tick summaries; the oldest entry is evicted first.
#[derive(Debug, Clone)]
pub struct StatsHistory {
    window: usize,
    entries: VecDeque<TickStatistics>,
}

impl StatsHistory {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            entries: VecDeque::with_capacity(window.min(HISTORY_PREALLOC)),
        }
    }

    pub fn push(&mut self, stats: TickStatistics) {
        while self.entries.len() >= self.window {
            self.entries.pop_front();
        }
        self.entries.push_back(stats);
    }

    pub fn latest(&self) -> Option<&TickStatistics> {
        self.entries.back()
    }

    /// The newest `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &TickStatistics> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
