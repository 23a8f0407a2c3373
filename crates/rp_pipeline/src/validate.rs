//! crates/rp_pipeline/src/validate.rs
//! Structural & semantic validation before any trial runs.
//!
//! Every configuration and schema problem surfaces here, so a rejected
//! request never reaches the predictor.

use rp_algo::{noise::NoiseModel, predictor::Predictor};
use rp_core::{
    errors::SimError,
    features::{DriverRecord, FeatureTable},
    variables::{validate_config, RunConfig},
};

/// Inputs that passed validation, ready for the trial loop.
#[derive(Debug, Clone)]
pub struct ValidatedInputs {
    pub table: FeatureTable,
    pub noise: NoiseModel,
}

/// Config domains → table shape/imputation → predictor needs → noise bindings.
pub fn validate_inputs<P>(
    records: Vec<DriverRecord>,
    predictor: &P,
    cfg: &RunConfig,
) -> Result<ValidatedInputs, SimError>
where
    P: Predictor + ?Sized,
{
    validate_config(cfg)?;
    let table = FeatureTable::build(records, cfg.imputation)?;

    let missing: Vec<String> = predictor
        .required_features()
        .into_iter()
        .filter(|f| !table.schema().contains(f))
        .collect();
    if !missing.is_empty() {
        return Err(SimError::schema(format!(
            "{} requires features missing from the table: {}",
            predictor.name(),
            missing.join(", ")
        )));
    }

    let noise = NoiseModel::new(&cfg.noise_std_by_feature, table.schema())?;
    Ok(ValidatedInputs { table, noise })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp_algo::predictor::LinearPredictor;
    use std::collections::BTreeMap;

    fn rec(id: &str, feats: &[(&str, f64)]) -> DriverRecord {
        DriverRecord {
            driver: id.parse().unwrap(),
            grid: None,
            team: None,
            features: feats.iter().map(|(k, v)| (k.to_string(), Some(*v))).collect(),
        }
    }

    fn cfg(noise: &[(&str, f64)]) -> RunConfig {
        RunConfig {
            noise_std_by_feature: noise.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            ..RunConfig::default()
        }
    }

    fn model(names: &[&str]) -> LinearPredictor {
        let w: BTreeMap<String, f64> = names.iter().map(|n| (n.to_string(), 1.0)).collect();
        LinearPredictor::new(0.0, w).unwrap()
    }

    #[test]
    fn accepts_consistent_inputs() {
        let v = validate_inputs(
            vec![rec("A", &[("pace", 1.0)]), rec("B", &[("pace", 2.0)])],
            &model(&["pace"]),
            &cfg(&[("pace", 0.1)]),
        )
        .unwrap();
        assert_eq!(v.table.len(), 2);
        assert!(!v.noise.is_silent());
    }

    #[test]
    fn predictor_feature_missing_from_table() {
        let err = validate_inputs(vec![rec("A", &[("pace", 1.0)])], &model(&["pace", "quali"]), &cfg(&[]))
            .unwrap_err();
        assert!(matches!(err, SimError::SchemaMismatch(ref m) if m.contains("quali")));
    }

    #[test]
    fn config_checked_first() {
        let bad = RunConfig { trial_count: 0, ..cfg(&[]) };
        let err = validate_inputs(vec![], &model(&["pace"]), &bad).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfiguration(ref m) if m.contains("trial_count")));
    }

    #[test]
    fn noise_on_unknown_feature() {
        let err = validate_inputs(vec![rec("A", &[("pace", 1.0)])], &model(&["pace"]), &cfg(&[("rain", 0.2)]))
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidConfiguration(_)));
    }
}
