//! Noise Model: additive Gaussian perturbation of configured features.
//!
//! Draws are reproducible per `(seed, trial_index)`: each driver gets its own
//! ChaCha20 stream from `TrialRng::for_trial`, and features are perturbed in
//! schema order. Features without an entry (or with a zero std) keep their
//! baseline value bit-for-bit.

use std::collections::BTreeMap;

use rand_distr::{Distribution, Normal};
use rp_core::{
    errors::SimError,
    features::{DriverFeatureRecord, FeatureSchema, FeatureTable},
    rng::TrialRng,
};

#[derive(Debug, Clone)]
struct NoiseTerm {
    index: usize,
    name: String,
    std: f64,
    dist: Normal<f64>,
}

/// Per-feature perturbation distributions bound to one feature schema.
#[derive(Debug, Clone, Default)]
pub struct NoiseModel {
    terms: Vec<NoiseTerm>,
}

impl NoiseModel {
    /// Build from `feature name -> std` against `schema`.
    ///
    /// Errors with `InvalidConfiguration` when a std is negative or not finite,
    /// or when an entry names a feature the schema does not have.
    pub fn new(std_by_feature: &BTreeMap<String, f64>, schema: &FeatureSchema) -> Result<Self, SimError> {
        let mut terms = Vec::new();
        for (name, &std) in std_by_feature {
            if !std.is_finite() || std < 0.0 {
                return Err(SimError::config(format!(
                    "noise std for '{name}' must be a finite value >= 0 (got {std})"
                )));
            }
            let index = schema.index_of(name).ok_or_else(|| {
                SimError::config(format!("noise configured for unknown feature '{name}'"))
            })?;
            if std == 0.0 {
                continue;
            }
            let dist = Normal::new(0.0, std)
                .map_err(|e| SimError::config(format!("noise std for '{name}': {e}")))?;
            terms.push(NoiseTerm { index, name: name.clone(), std, dist });
        }
        terms.sort_by_key(|t| t.index);
        Ok(Self { terms })
    }

    /// A model that never perturbs anything.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn is_silent(&self) -> bool {
        self.terms.is_empty()
    }

    /// Active `(feature, std)` pairs in schema order.
    pub fn active(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.terms.iter().map(|t| (t.name.as_str(), t.std))
    }

    /// Perturbed values of one driver for one trial.
    pub fn sample_values(&self, record: &DriverFeatureRecord, trial_index: u64, seed: u64) -> Vec<f64> {
        let mut values = record.values().to_vec();
        if self.terms.is_empty() {
            return values;
        }
        let mut rng = TrialRng::for_trial(seed, &record.driver, trial_index);
        for t in &self.terms {
            values[t.index] += t.dist.sample(&mut rng);
        }
        values
    }

    /// `sample(feature_record, trial_index, seed) -> perturbed_feature_record`.
    pub fn sample(&self, record: &DriverFeatureRecord, trial_index: u64, seed: u64) -> DriverFeatureRecord {
        record.with_values(self.sample_values(record, trial_index, seed))
    }

    /// Perturbed values of every driver for one trial, in table order.
    pub fn sample_table(&self, table: &FeatureTable, trial_index: u64, seed: u64) -> Vec<Vec<f64>> {
        table
            .drivers()
            .iter()
            .map(|d| self.sample_values(d, trial_index, seed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp_core::{features::DriverRecord, variables::Imputation};

    fn table() -> FeatureTable {
        let rec = |id: &str, grid: u16, pace: f64, quali: f64| DriverRecord {
            driver: id.parse().unwrap(),
            grid: Some(grid),
            team: None,
            features: [("pace".to_string(), Some(pace)), ("quali".to_string(), Some(quali))]
                .into_iter()
                .collect(),
        };
        FeatureTable::build(
            vec![rec("VER", 1, 93.2, 70.6), rec("NOR", 2, 93.4, 69.9)],
            Imputation::None,
        )
        .unwrap()
    }

    fn noise(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn same_seed_and_trial_reproduce() {
        let t = table();
        let m = NoiseModel::new(&noise(&[("pace", 0.5)]), t.schema()).unwrap();
        let a = m.sample_table(&t, 12, 99);
        let b = m.sample_table(&t, 12, 99);
        assert_eq!(a, b);
        assert_ne!(a, m.sample_table(&t, 13, 99));
    }

    #[test]
    fn only_configured_features_move() {
        let t = table();
        let m = NoiseModel::new(&noise(&[("pace", 0.5), ("quali", 0.0)]), t.schema()).unwrap();
        let d = &t.drivers()[0];
        let p = m.sample(d, 3, 1);
        let quali = t.schema().index_of("quali").unwrap();
        let pace = t.schema().index_of("pace").unwrap();
        assert_eq!(p.values()[quali].to_bits(), d.values()[quali].to_bits());
        assert_ne!(p.values()[pace], d.values()[pace]);
        assert_eq!(p.driver, d.driver);
    }

    #[test]
    fn zero_noise_is_silent_and_identity() {
        let t = table();
        let m = NoiseModel::new(&noise(&[("pace", 0.0)]), t.schema()).unwrap();
        assert!(m.is_silent());
        assert_eq!(m.sample_table(&t, 0, 5), t.value_rows().iter().map(|r| r.to_vec()).collect::<Vec<_>>());
    }

    #[test]
    fn negative_std_rejected() {
        let t = table();
        let err = NoiseModel::new(&noise(&[("pace", -1.0)]), t.schema()).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfiguration(_)));
    }

    #[test]
    fn unknown_feature_rejected() {
        let t = table();
        let err = NoiseModel::new(&noise(&[("tyre_deg", 0.1)]), t.schema()).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfiguration(ref m) if m.contains("tyre_deg")));
    }

    #[test]
    fn sample_mean_tracks_baseline() {
        let t = table();
        let m = NoiseModel::new(&noise(&[("pace", 0.3)]), t.schema()).unwrap();
        let d = &t.drivers()[0];
        let idx = t.schema().index_of("pace").unwrap();
        let n = 2000u64;
        let mean = (0..n).map(|i| m.sample_values(d, i, 11)[idx]).sum::<f64>() / n as f64;
        assert!((mean - d.values()[idx]).abs() < 0.05, "mean drifted: {mean}");
    }
}
