//! Summary Builder: probabilities, mean/std and percentile bounds per driver.

use rp_core::{errors::SimError, ids::DriverId};
use serde::{Deserialize, Serialize};

use crate::accumulate::AccumulatedStats;
use crate::percentile::{nearest_rank, P_BEST, P_WORST};

/// Positions that count as a podium finish.
pub const PODIUM_POSITIONS: u32 = 3;

/// Distribution summary of one driver's finishing position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSummary {
    pub driver: DriverId,
    /// Fraction of counted trials won, in `[0, 1]`.
    pub win_pct: f64,
    /// Fraction of counted trials finished in the top three, in `[0, 1]`.
    pub podium_pct: f64,
    pub mean_position: f64,
    pub position_std: f64,
    /// Nearest-rank 5th percentile, never above the mean.
    pub p5_position: f64,
    /// Nearest-rank 95th percentile, never below the mean.
    pub p95_position: f64,
    /// Unwidened nearest-rank 5th percentile (an observed position).
    pub p5_nearest_rank: u32,
    /// Unwidened nearest-rank 95th percentile (an observed position).
    pub p95_nearest_rank: u32,
}

/// `summarize(accumulated_statistics, trial_count) -> per-driver summaries`
/// (table order).
///
/// Errors with `InsufficientData` when `trial_count` is zero or does not
/// match the number of trials the statistics hold.
pub fn summarize(stats: &AccumulatedStats, trial_count: u64) -> Result<Vec<DriverSummary>, SimError> {
    if trial_count == 0 {
        return Err(SimError::InsufficientData("no counted trials to summarize".into()));
    }
    if stats.trials_completed() != trial_count {
        return Err(SimError::InsufficientData(format!(
            "statistics cover {} trials, summary requested for {trial_count}",
            stats.trials_completed()
        )));
    }

    let n = trial_count as f64;
    stats
        .iter()
        .map(|(driver, s)| {
            let missing = || SimError::InsufficientData(format!("no positions recorded for {driver}"));
            let mean = s.mean_position().ok_or_else(missing)?;
            let std = s.position_std().ok_or_else(missing)?;
            let p5 = nearest_rank(&s.histogram, P_BEST).ok_or_else(missing)?;
            let p95 = nearest_rank(&s.histogram, P_WORST).ok_or_else(missing)?;
            Ok(DriverSummary {
                driver: driver.clone(),
                win_pct: s.wins as f64 / n,
                podium_pct: s.podiums as f64 / n,
                mean_position: mean,
                position_std: std,
                p5_position: f64::from(p5).min(mean),
                p95_position: f64::from(p95).max(mean),
                p5_nearest_rank: p5,
                p95_nearest_rank: p95,
            })
        })
        .collect()
}
