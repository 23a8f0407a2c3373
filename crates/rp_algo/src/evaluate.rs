//! Trial Evaluator: score every driver of one trial and produce a strict
//! finishing order.
//!
//! Ties on equal scores break by the table's canonical order (grid position,
//! then driver id), so the order is total and deterministic.

use std::cmp::Ordering;

use rp_core::{errors::SimError, features::FeatureTable};

use crate::predictor::Predictor;

/// Finishing order of one trial.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRanking {
    /// Table indices in finishing order (winner first).
    pub order: Vec<usize>,
    /// 1-based finishing position per table index.
    pub positions: Vec<u32>,
    /// Score per table index.
    pub scores: Vec<f64>,
}

impl TrialRanking {
    pub fn position_of(&self, table_index: usize) -> Option<u32> {
        self.positions.get(table_index).copied()
    }
}

/// Rank finite scores (lower is better). `scores[i]` belongs to table index `i`.
pub fn rank_scores(scores: Vec<f64>) -> TrialRanking {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    let mut positions = vec![0u32; scores.len()];
    for (pos, &idx) in order.iter().enumerate() {
        positions[idx] = pos as u32 + 1;
    }
    TrialRanking { order, positions, scores }
}

/// `evaluate(perturbed_records, predictor) -> finishing_order`.
///
/// `values` holds one value row per table driver (table order). A predictor
/// error or a NaN/infinite score becomes `PredictorFailure` naming the first
/// offending driver in table order.
pub fn evaluate<P>(
    predictor: &P,
    table: &FeatureTable,
    values: &[Vec<f64>],
    trial_index: u64,
) -> Result<TrialRanking, SimError>
where
    P: Predictor + ?Sized,
{
    if values.len() != table.len() {
        return Err(SimError::schema(format!(
            "trial {trial_index}: {} value rows for {} drivers",
            values.len(),
            table.len()
        )));
    }
    let results = predictor.score_batch(table.schema(), values);
    if results.len() != values.len() {
        return Err(SimError::PredictorFailure {
            trial: trial_index,
            driver: String::from("*"),
            reason: format!("returned {} scores for {} drivers", results.len(), values.len()),
        });
    }

    let mut scores = Vec::with_capacity(results.len());
    for (driver, res) in table.drivers().iter().zip(results) {
        let fail = |reason: String| SimError::PredictorFailure {
            trial: trial_index,
            driver: driver.driver.to_string(),
            reason,
        };
        match res {
            Ok(s) if s.is_finite() => scores.push(s),
            Ok(s) => return Err(fail(format!("non-finite score {s}"))),
            Err(e) => return Err(fail(e.to_string())),
        }
    }
    Ok(rank_scores(scores))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{FnPredictor, PredictError};
    use rp_core::{features::{DriverRecord, FeatureRow}, variables::Imputation};

    fn table(rows: &[(&str, Option<u16>, f64)]) -> FeatureTable {
        let recs = rows
            .iter()
            .map(|(id, grid, s)| DriverRecord {
                driver: id.parse().unwrap(),
                grid: *grid,
                team: None,
                features: [("score".to_string(), Some(*s))].into_iter().collect(),
            })
            .collect();
        FeatureTable::build(recs, Imputation::None).unwrap()
    }

    fn by_score() -> impl Predictor {
        FnPredictor::new(|row: FeatureRow<'_>| {
            row.get("score").ok_or_else(|| PredictError::MissingFeature("score".into()))
        })
    }

    fn ids(t: &FeatureTable, r: &TrialRanking) -> Vec<String> {
        r.order.iter().map(|&i| t.drivers()[i].driver.to_string()).collect()
    }

    fn rows(t: &FeatureTable) -> Vec<Vec<f64>> {
        t.value_rows().iter().map(|r| r.to_vec()).collect()
    }

    #[test]
    fn lower_score_finishes_ahead() {
        let t = table(&[("A", Some(3), 1.0), ("B", Some(1), 2.0), ("C", Some(2), 3.0)]);
        let r = evaluate(&by_score(), &t, &rows(&t), 0).unwrap();
        assert_eq!(ids(&t, &r), vec!["A", "B", "C"]);
        let a = t.position_of(&"A".parse().unwrap()).unwrap();
        assert_eq!(r.position_of(a), Some(1));
    }

    #[test]
    fn ties_break_by_grid_then_id() {
        let t = table(&[("ZED", Some(1), 5.0), ("ABE", Some(2), 5.0), ("MID", None, 5.0), ("AAA", None, 5.0)]);
        let r = evaluate(&by_score(), &t, &rows(&t), 0).unwrap();
        assert_eq!(ids(&t, &r), vec!["ZED", "ABE", "AAA", "MID"]);
    }

    #[test]
    fn positions_are_a_permutation() {
        let r = rank_scores(vec![0.3, -1.0, 0.3, 7.0, 2.5]);
        let mut p = r.positions.clone();
        p.sort_unstable();
        assert_eq!(p, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn nan_score_is_predictor_failure() {
        let t = table(&[("A", Some(1), 1.0), ("B", Some(2), 2.0)]);
        let p = FnPredictor::new(|row: FeatureRow<'_>| {
            let s = row.get("score").unwrap_or_default();
            Ok(if s > 1.5 { f64::NAN } else { s })
        });
        let err = evaluate(&p, &t, &rows(&t), 4).unwrap_err();
        match err {
            SimError::PredictorFailure { trial, driver, .. } => {
                assert_eq!(trial, 4);
                assert_eq!(driver, "B");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn predictor_error_is_predictor_failure() {
        let t = table(&[("A", Some(1), 1.0)]);
        let p = FnPredictor::new(|_row: FeatureRow<'_>| Err(PredictError::Model("boom".into())));
        let err = evaluate(&p, &t, &rows(&t), 0).unwrap_err();
        assert!(matches!(err, SimError::PredictorFailure { ref reason, .. } if reason.contains("boom")));
    }
}
