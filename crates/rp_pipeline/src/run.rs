//! crates/rp_pipeline/src/run.rs
//! Trial loop: split trials into batches, run batches on a rayon pool, merge
//! the per-batch accumulators deterministically.
//!
//! Determinism rules:
//! - A trial's noise depends only on `(seed, trial_index, driver)`.
//! - Batch accumulators merge in batch order via `reduce_or_identity`.
//! - Under `abort`, the reported failure is the one with the smallest trial
//!   index, whatever the worker count.

use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;
use rp_algo::{
    accumulate::AccumulatedStats, evaluate::evaluate, noise::NoiseModel, predictor::Predictor,
    summary::PODIUM_POSITIONS,
};
use rp_core::{
    determinism::reduce_or_identity,
    errors::SimError,
    features::FeatureTable,
    variables::FailurePolicy,
};

use crate::cancel::StopSignal;

/// Execution knobs for one run (resolved from `RunConfig`).
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub seed: u64,
    pub trial_count: u64,
    pub batch_size: u64,
    pub failure_policy: FailurePolicy,
    pub workers: Option<usize>,
}

/// Merged statistics plus whether the run stopped early.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub stats: AccumulatedStats,
    pub trials_requested: u64,
    pub cancelled: bool,
}

enum BatchOutcome {
    Finished(AccumulatedStats),
    Stopped(AccumulatedStats),
    Failed(SimError),
}

struct TrialRunner<'a, P: ?Sized> {
    table: &'a FeatureTable,
    predictor: &'a P,
    noise: &'a NoiseModel,
    opts: &'a RunOptions,
    stop: &'a StopSignal,
    /// Smallest failing trial index seen so far (`u64::MAX` = none).
    first_failure: AtomicU64,
}

impl<'a, P> TrialRunner<'a, P>
where
    P: Predictor + ?Sized,
{
    fn run_batch(&self, batch: u64) -> BatchOutcome {
        let start = batch * self.opts.batch_size;
        let end = (start + self.opts.batch_size).min(self.opts.trial_count);
        let drivers = self.table.drivers().iter().map(|d| d.driver.clone()).collect();
        let mut acc = AccumulatedStats::new(drivers, PODIUM_POSITIONS, start);

        if self.stop.should_stop() {
            return BatchOutcome::Stopped(acc);
        }
        for trial in start..end {
            if trial > self.first_failure.load(Ordering::Relaxed) {
                // an earlier trial already failed; this batch's result is discarded
                return BatchOutcome::Stopped(acc);
            }
            let values = self.noise.sample_table(self.table, trial, self.opts.seed);
            match evaluate(self.predictor, self.table, &values, trial) {
                Ok(ranking) => acc.record(&ranking),
                Err(e) => match self.opts.failure_policy {
                    FailurePolicy::Abort => {
                        self.first_failure.fetch_min(trial, Ordering::Relaxed);
                        return BatchOutcome::Failed(e);
                    }
                    FailurePolicy::SkipAndCount => {
                        tracing::warn!(trial, error = %e, "skipping failed trial");
                        acc.record_skipped();
                    }
                },
            }
            if self.stop.should_stop() {
                return BatchOutcome::Stopped(acc);
            }
        }
        tracing::debug!(batch, start, end, "batch finished");
        BatchOutcome::Finished(acc)
    }
}

/// `run(feature_table, predictor, trial_count, noise_model) -> accumulated_statistics`.
pub(crate) fn run_trials<P>(
    table: &FeatureTable,
    predictor: &P,
    noise: &NoiseModel,
    opts: &RunOptions,
    stop: &StopSignal,
) -> Result<RunOutcome, SimError>
where
    P: Predictor + ?Sized,
{
    if opts.trial_count == 0 || opts.batch_size == 0 {
        return Err(SimError::config("trial_count and batch_size must be >= 1"));
    }
    let runner = TrialRunner {
        table,
        predictor,
        noise,
        opts,
        stop,
        first_failure: AtomicU64::new(u64::MAX),
    };
    let n_batches = opts.trial_count.div_ceil(opts.batch_size);

    let outcomes: Vec<BatchOutcome> = match opts.workers {
        Some(1) => (0..n_batches).map(|b| runner.run_batch(b)).collect(),
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| SimError::config(format!("cannot start {n} workers: {e}")))?;
            pool.install(|| (0..n_batches).into_par_iter().map(|b| runner.run_batch(b)).collect())
        }
        None => (0..n_batches).into_par_iter().map(|b| runner.run_batch(b)).collect(),
    };

    let mut partials = Vec::with_capacity(outcomes.len());
    let mut cancelled = false;
    let mut failure: Option<SimError> = None;
    for o in outcomes {
        match o {
            BatchOutcome::Finished(acc) => partials.push(acc),
            BatchOutcome::Stopped(acc) => {
                cancelled = true;
                partials.push(acc);
            }
            BatchOutcome::Failed(e) => {
                if failure.as_ref().map_or(true, |f| failure_trial(&e) < failure_trial(f)) {
                    failure = Some(e);
                }
            }
        }
    }
    if let Some(e) = failure {
        return Err(e);
    }

    let stats = reduce_or_identity(partials, AccumulatedStats::merge);
    // Stopped batches only count as a cancellation when trials are actually missing.
    let counted = stats.trials_completed() + stats.trials_skipped();
    cancelled = cancelled && counted < opts.trial_count;
    Ok(RunOutcome { stats, trials_requested: opts.trial_count, cancelled })
}

fn failure_trial(e: &SimError) -> u64 {
    match e {
        SimError::PredictorFailure { trial, .. } => *trial,
        _ => u64::MAX,
    }
}
