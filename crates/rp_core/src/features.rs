//! Feature schema, per-driver records, and the validated feature table.
//!
//! A `DriverRecord` is the loader-facing shape: every feature value is
//! optional so that "present but missing" (`null`) can be told apart from
//! "absent". `FeatureTable::build` turns records into immutable
//! `DriverFeatureRecord`s with finite values aligned to one `FeatureSchema`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::determinism::{sort_drivers_canonical, StableOrd};
use crate::errors::SimError;
use crate::ids::DriverId;
use crate::variables::Imputation;

/// Loader-facing driver record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverRecord {
    pub driver: DriverId,
    /// Qualifying (grid) position, used as the ranking tiebreaker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    pub features: BTreeMap<String, Option<f64>>,
}

/// Ordered feature names shared by every driver of a run (lexicographic order).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        Self { names: set.into_iter().collect() }
    }

    pub fn names(&self) -> &[String] { &self.names }

    pub fn len(&self) -> usize { self.names.len() }

    pub fn is_empty(&self) -> bool { self.names.is_empty() }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.binary_search_by(|n| n.as_str().cmp(name)).ok()
    }

    pub fn contains(&self, name: &str) -> bool { self.index_of(name).is_some() }
}

/// Immutable, model-ready driver record (values aligned to the table schema).
#[derive(Debug, Clone, PartialEq)]
pub struct DriverFeatureRecord {
    pub driver: DriverId,
    pub grid: Option<u16>,
    pub team: Option<String>,
    values: Vec<f64>,
}

impl DriverFeatureRecord {
    pub fn values(&self) -> &[f64] { &self.values }

    /// Copy of this record carrying different feature values (same schema).
    pub fn with_values(&self, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), self.values.len());
        Self {
            driver: self.driver.clone(),
            grid: self.grid,
            team: self.team.clone(),
            values,
        }
    }

    pub fn row<'a>(&'a self, schema: &'a FeatureSchema) -> FeatureRow<'a> {
        FeatureRow { schema, values: &self.values }
    }
}

/// Borrowed view of one driver's values together with the schema.
#[derive(Debug, Clone, Copy)]
pub struct FeatureRow<'a> {
    schema: &'a FeatureSchema,
    values: &'a [f64],
}

impl<'a> FeatureRow<'a> {
    pub fn new(schema: &'a FeatureSchema, values: &'a [f64]) -> Self {
        Self { schema, values }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.schema.index_of(name).and_then(|i| self.values.get(i).copied())
    }

    pub fn schema(&self) -> &'a FeatureSchema { self.schema }

    pub fn values(&self) -> &'a [f64] { self.values }
}

/// Validated feature table: one schema, unique drivers in canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    schema: FeatureSchema,
    drivers: Vec<DriverFeatureRecord>,
}

impl FeatureTable {
    /// Validate and normalize loader records.
    ///
    /// Errors:
    /// - `InvalidConfiguration` on an empty table
    /// - `SchemaMismatch` on duplicate drivers, differing feature sets,
    ///   missing values that cannot be imputed, or non-finite values
    pub fn build(records: Vec<DriverRecord>, imputation: Imputation) -> Result<Self, SimError> {
        let first = records
            .first()
            .ok_or_else(|| SimError::config("feature table is empty"))?;
        let schema = FeatureSchema::new(first.features.keys().cloned());
        if schema.is_empty() {
            return Err(SimError::schema(format!("driver {} has no features", first.driver)));
        }

        let mut seen = BTreeSet::new();
        for r in &records {
            if !seen.insert(r.driver.clone()) {
                return Err(SimError::schema(format!("duplicate driver {}", r.driver)));
            }
            check_same_keys(&schema, r)?;
        }

        let fills = match imputation {
            Imputation::None => vec![None; schema.len()],
            Imputation::Median => column_medians(&schema, &records),
        };

        let mut drivers = Vec::with_capacity(records.len());
        for r in records {
            let mut values = Vec::with_capacity(schema.len());
            for (i, name) in schema.names().iter().enumerate() {
                let v = match r.features.get(name).copied().flatten() {
                    Some(v) => v,
                    None => fills[i].ok_or_else(|| {
                        SimError::schema(format!("driver {}: feature '{name}' has no value", r.driver))
                    })?,
                };
                if !v.is_finite() {
                    return Err(SimError::schema(format!(
                        "driver {}: feature '{name}' is not finite",
                        r.driver
                    )));
                }
                values.push(v);
            }
            drivers.push(DriverFeatureRecord {
                driver: r.driver,
                grid: r.grid,
                team: r.team,
                values,
            });
        }
        sort_drivers_canonical(&mut drivers);

        Ok(Self { schema, drivers })
    }

    pub fn schema(&self) -> &FeatureSchema { &self.schema }

    pub fn drivers(&self) -> &[DriverFeatureRecord] { &self.drivers }

    pub fn len(&self) -> usize { self.drivers.len() }

    pub fn is_empty(&self) -> bool { self.drivers.is_empty() }

    pub fn position_of(&self, driver: &DriverId) -> Option<usize> {
        self.drivers.iter().position(|d| &d.driver == driver)
    }

    pub fn row(&self, index: usize) -> Option<FeatureRow<'_>> {
        self.drivers.get(index).map(|d| d.row(&self.schema))
    }

    /// Every driver's values, in table order.
    pub fn value_rows(&self) -> Vec<&[f64]> {
        self.drivers.iter().map(|d| d.values()).collect()
    }
}

impl StableOrd for DriverFeatureRecord {
    /// Canonical driver order is `(grid ascending, missing grid last, driver id)`.
    fn stable_cmp(&self, other: &Self) -> core::cmp::Ordering {
        let ga = self.grid.unwrap_or(u16::MAX);
        let gb = other.grid.unwrap_or(u16::MAX);
        ga.cmp(&gb).then_with(|| self.driver.stable_cmp(&other.driver))
    }
}

fn check_same_keys(schema: &FeatureSchema, r: &DriverRecord) -> Result<(), SimError> {
    let missing: Vec<&str> = schema
        .names()
        .iter()
        .filter(|n| !r.features.contains_key(n.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(SimError::schema(format!(
            "driver {} is missing feature(s): {}",
            r.driver,
            missing.join(", ")
        )));
    }
    let extra: Vec<&str> = r
        .features
        .keys()
        .filter(|k| !schema.contains(k))
        .map(String::as_str)
        .collect();
    if !extra.is_empty() {
        return Err(SimError::schema(format!(
            "driver {} has unexpected feature(s): {}",
            r.driver,
            extra.join(", ")
        )));
    }
    Ok(())
}

/// Median of the present, finite values of each column (`None` if none present).
fn column_medians(schema: &FeatureSchema, records: &[DriverRecord]) -> Vec<Option<f64>> {
    schema
        .names()
        .iter()
        .map(|name| {
            let mut xs: Vec<f64> = records
                .iter()
                .filter_map(|r| r.features.get(name).copied().flatten())
                .filter(|v| v.is_finite())
                .collect();
            median(&mut xs)
        })
        .collect()
}

fn median(xs: &mut [f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    xs.sort_by(f64::total_cmp);
    let mid = xs.len() / 2;
    if xs.len() % 2 == 1 {
        Some(xs[mid])
    } else {
        Some((xs[mid - 1] + xs[mid]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, grid: Option<u16>, feats: &[(&str, Option<f64>)]) -> DriverRecord {
        DriverRecord {
            driver: id.parse().unwrap(),
            grid,
            team: None,
            features: feats.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn builds_canonical_order_by_grid_then_id() {
        let t = FeatureTable::build(
            vec![
                rec("NOR", Some(2), &[("pace", Some(93.4))]),
                rec("ZZZ", None, &[("pace", Some(95.0))]),
                rec("VER", Some(1), &[("pace", Some(93.2))]),
                rec("AAA", None, &[("pace", Some(96.0))]),
            ],
            Imputation::None,
        )
        .unwrap();
        let ids: Vec<&str> = t.drivers().iter().map(|d| d.driver.as_str()).collect();
        assert_eq!(ids, vec!["VER", "NOR", "AAA", "ZZZ"]);
        assert_eq!(t.schema().names(), &["pace".to_string()]);
    }

    #[test]
    fn absent_feature_is_schema_mismatch() {
        let err = FeatureTable::build(
            vec![
                rec("VER", Some(1), &[("pace", Some(93.2)), ("quali", Some(70.6))]),
                rec("NOR", Some(2), &[("pace", Some(93.4))]),
            ],
            Imputation::Median,
        )
        .unwrap_err();
        assert!(matches!(err, SimError::SchemaMismatch(ref m) if m.contains("quali")));
    }

    #[test]
    fn extra_feature_is_schema_mismatch() {
        let err = FeatureTable::build(
            vec![
                rec("VER", Some(1), &[("pace", Some(93.2))]),
                rec("NOR", Some(2), &[("pace", Some(93.4)), ("quali", Some(70.0))]),
            ],
            Imputation::None,
        )
        .unwrap_err();
        assert!(matches!(err, SimError::SchemaMismatch(_)));
    }

    #[test]
    fn null_value_needs_imputation() {
        let records = vec![
            rec("VER", Some(1), &[("quali", Some(70.0))]),
            rec("RUS", Some(4), &[("quali", None)]),
            rec("NOR", Some(2), &[("quali", Some(69.0))]),
            rec("PIA", Some(3), &[("quali", Some(72.0))]),
        ];
        assert!(matches!(
            FeatureTable::build(records.clone(), Imputation::None),
            Err(SimError::SchemaMismatch(_))
        ));

        let t = FeatureTable::build(records, Imputation::Median).unwrap();
        let rus = t.position_of(&"RUS".parse().unwrap()).unwrap();
        assert_eq!(t.row(rus).unwrap().get("quali"), Some(70.0));
    }

    #[test]
    fn median_of_even_count_averages_middle_pair() {
        let mut xs = vec![4.0, 1.0, 3.0, 2.0];
        assert_eq!(median(&mut xs), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn duplicate_and_empty_rejected() {
        assert!(matches!(
            FeatureTable::build(vec![], Imputation::None),
            Err(SimError::InvalidConfiguration(_))
        ));
        let dup = vec![
            rec("VER", Some(1), &[("pace", Some(1.0))]),
            rec("VER", Some(2), &[("pace", Some(2.0))]),
        ];
        assert!(matches!(FeatureTable::build(dup, Imputation::None), Err(SimError::SchemaMismatch(_))));
    }

    #[test]
    fn non_finite_rejected() {
        let r = vec![rec("VER", Some(1), &[("pace", Some(f64::INFINITY))])];
        assert!(matches!(FeatureTable::build(r, Imputation::None), Err(SimError::SchemaMismatch(_))));
    }

    #[test]
    fn row_lookup_by_name() {
        let t = FeatureTable::build(
            vec![rec("VER", Some(1), &[("b", Some(2.0)), ("a", Some(1.0))])],
            Imputation::None,
        )
        .unwrap();
        let row = t.row(0).unwrap();
        assert_eq!(row.get("a"), Some(1.0));
        assert_eq!(row.get("b"), Some(2.0));
        assert_eq!(row.get("c"), None);
        assert_eq!(row.values(), &[1.0, 2.0]);
    }
}
