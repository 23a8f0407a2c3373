//! Aggregator: fold per-trial finishing orders into per-driver statistics.
//!
//! Everything is an integer count, so merging partial accumulators is exact,
//! associative and commutative. Workers can fold disjoint batches and the
//! result is identical to a sequential fold over all trials.

use std::cmp::Ordering;

use rp_core::{
    determinism::{StableOrd, StableReduce},
    ids::DriverId,
};
use serde::{Deserialize, Serialize};

use crate::evaluate::TrialRanking;

/// Counts for one driver across counted trials.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DriverStats {
    pub trials: u64,
    pub wins: u64,
    pub podiums: u64,
    pub sum_position: u64,
    pub sum_sq_position: u64,
    /// `histogram[k]` = number of trials finishing in position `k + 1`.
    pub histogram: Vec<u64>,
}

impl DriverStats {
    pub fn new(field_size: usize) -> Self {
        Self { histogram: vec![0; field_size], ..Self::default() }
    }

    pub fn record(&mut self, position: u32, podium_positions: u32) {
        let p = u64::from(position);
        self.trials += 1;
        self.sum_position += p;
        self.sum_sq_position += p * p;
        if position == 1 {
            self.wins += 1;
        }
        if position <= podium_positions {
            self.podiums += 1;
        }
        let slot = position.saturating_sub(1) as usize;
        if slot >= self.histogram.len() {
            self.histogram.resize(slot + 1, 0);
        }
        self.histogram[slot] += 1;
    }

    pub fn merge(&mut self, other: &DriverStats) {
        self.trials += other.trials;
        self.wins += other.wins;
        self.podiums += other.podiums;
        self.sum_position += other.sum_position;
        self.sum_sq_position += other.sum_sq_position;
        if other.histogram.len() > self.histogram.len() {
            self.histogram.resize(other.histogram.len(), 0);
        }
        for (a, b) in self.histogram.iter_mut().zip(&other.histogram) {
            *a += b;
        }
    }

    pub fn mean_position(&self) -> Option<f64> {
        (self.trials > 0).then(|| self.sum_position as f64 / self.trials as f64)
    }

    /// Population standard deviation of the finishing position.
    pub fn position_std(&self) -> Option<f64> {
        let mean = self.mean_position()?;
        let n = self.trials as f64;
        let var = (self.sum_sq_position as f64 / n - mean * mean).max(0.0);
        Some(var.sqrt())
    }
}

/// Statistics for a whole run (or one batch of it).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccumulatedStats {
    /// First trial index covered; only used to order partial results.
    origin: u64,
    drivers: Vec<DriverId>,
    stats: Vec<DriverStats>,
    trials_completed: u64,
    trials_skipped: u64,
    podium_positions: u32,
}

impl AccumulatedStats {
    /// Empty accumulator for `drivers` (table order).
    pub fn new(drivers: Vec<DriverId>, podium_positions: u32, origin: u64) -> Self {
        let n = drivers.len();
        Self {
            origin,
            stats: vec![DriverStats::new(n); n],
            drivers,
            trials_completed: 0,
            trials_skipped: 0,
            podium_positions,
        }
    }

    /// `accumulate(finishing_order)`.
    pub fn record(&mut self, ranking: &TrialRanking) {
        debug_assert_eq!(ranking.positions.len(), self.stats.len());
        for (s, &pos) in self.stats.iter_mut().zip(&ranking.positions) {
            s.record(pos, self.podium_positions);
        }
        self.trials_completed += 1;
    }

    /// A trial whose predictor failed under the skip-and-count policy.
    pub fn record_skipped(&mut self) {
        self.trials_skipped += 1;
    }

    /// `merge(stats_a, stats_b) -> stats`. An accumulator with no drivers acts
    /// as the identity.
    pub fn merge(mut self, other: AccumulatedStats) -> AccumulatedStats {
        if self.drivers.is_empty() {
            return AccumulatedStats {
                origin: self.origin.min(other.origin),
                trials_skipped: self.trials_skipped + other.trials_skipped,
                trials_completed: self.trials_completed + other.trials_completed,
                ..other
            };
        }
        if !other.drivers.is_empty() {
            debug_assert_eq!(self.drivers, other.drivers);
            for (a, b) in self.stats.iter_mut().zip(&other.stats) {
                a.merge(b);
            }
        }
        self.origin = self.origin.min(other.origin);
        self.trials_completed += other.trials_completed;
        self.trials_skipped += other.trials_skipped;
        self
    }

    pub fn drivers(&self) -> &[DriverId] {
        &self.drivers
    }

    pub fn stats(&self) -> &[DriverStats] {
        &self.stats
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DriverId, &DriverStats)> + '_ {
        self.drivers.iter().zip(&self.stats)
    }

    pub fn trials_completed(&self) -> u64 {
        self.trials_completed
    }

    pub fn trials_skipped(&self) -> u64 {
        self.trials_skipped
    }

    pub fn podium_positions(&self) -> u32 {
        self.podium_positions
    }
}

impl StableOrd for AccumulatedStats {
    fn stable_cmp(&self, other: &Self) -> Ordering {
        self.origin.cmp(&other.origin)
    }
}

impl StableReduce for AccumulatedStats {
    fn identity() -> Self {
        AccumulatedStats { origin: u64::MAX, ..Self::default() }
    }
}
