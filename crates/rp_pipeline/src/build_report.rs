//! crates/rp_pipeline/src/build_report.rs
//! Assemble the Simulation Report from merged statistics.
//!
//! The report id is `SIM:` + sha256 over the canonical JSON of the body, so
//! two runs with the same inputs, seed and trial count carry the same id.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rp_algo::{
    evaluate::{evaluate, TrialRanking},
    percentile::PercentileRule,
    predictor::Predictor,
    summary::summarize,
};
use rp_core::features::FeatureTable;
use rp_io::hasher;

use crate::run::RunOutcome;
use crate::validate::ValidatedInputs;
use crate::{DriverOutcome, PipelineError, ReportBody, RunStatus, SimulationReport};

/// Score the unperturbed table once. Failures only drop the baseline columns.
pub fn baseline_ranking<P>(table: &FeatureTable, predictor: &P) -> Option<TrialRanking>
where
    P: Predictor + ?Sized,
{
    let values: Vec<Vec<f64>> = table.value_rows().iter().map(|r| r.to_vec()).collect();
    match evaluate(predictor, table, &values, 0) {
        Ok(r) => Some(r),
        Err(e) => {
            tracing::warn!(error = %e, "baseline scoring failed; report omits baseline columns");
            None
        }
    }
}

pub fn build_report<P>(
    race: Option<&str>,
    inputs: &ValidatedInputs,
    predictor: &P,
    outcome: &RunOutcome,
    seed: u64,
) -> Result<SimulationReport, PipelineError>
where
    P: Predictor + ?Sized,
{
    let table = &inputs.table;
    let stats = &outcome.stats;
    let summaries = summarize(stats, stats.trials_completed())?;
    let baseline = baseline_ranking(table, predictor);

    let mut drivers = BTreeMap::new();
    for (idx, (rec, s)) in table.drivers().iter().zip(&summaries).enumerate() {
        debug_assert_eq!(rec.driver, s.driver);
        drivers.insert(
            rec.driver.clone(),
            DriverOutcome {
                team: rec.team.clone(),
                grid: rec.grid,
                win_pct: s.win_pct,
                podium_pct: s.podium_pct,
                mean_position: s.mean_position,
                position_std: s.position_std,
                p5_position: s.p5_position,
                p95_position: s.p95_position,
                p5_nearest_rank: s.p5_nearest_rank,
                p95_nearest_rank: s.p95_nearest_rank,
                baseline_score: baseline.as_ref().map(|b| b.scores[idx]),
                baseline_rank: baseline.as_ref().and_then(|b| b.position_of(idx)),
            },
        );
    }

    // Table order is the tiebreak, so a stable sort on the mean is enough.
    let mut order: Vec<usize> = (0..summaries.len()).collect();
    order.sort_by(|&a, &b| {
        summaries[a]
            .mean_position
            .partial_cmp(&summaries[b].mean_position)
            .unwrap_or(Ordering::Equal)
    });
    let predicted_order = order.into_iter().map(|i| summaries[i].driver.clone()).collect();

    let body = ReportBody {
        race: race.map(str::to_string),
        status: if outcome.cancelled { RunStatus::Partial } else { RunStatus::Complete },
        seed,
        trials_requested: outcome.trials_requested,
        trials_completed: stats.trials_completed(),
        trials_skipped: stats.trials_skipped(),
        percentile_rule: PercentileRule::NearestRank,
        noise_std_by_feature: inputs.noise.active().map(|(k, s)| (k.to_string(), s)).collect(),
        drivers,
        predicted_order,
        feature_importance: predictor.feature_importance(),
    };
    let id = hasher::report_id_from_canonical(&body)?;
    Ok(SimulationReport { id, body })
}
