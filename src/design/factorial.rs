//! Design resolution: factor level specs expanded into a condition table.
//!
//! A design names each factor's levels either as an explicit list or as a
//! numeric range. Resolution either crosses all factor level lists
//! (full factorial) or zips them, trimming to the shortest list.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::design::table::ConditionTable;
use crate::design::DesignError;
use crate::value::FactorValue;

/// Levels of one factor: explicit values, or an inclusive numeric range
/// expanded at `step` spacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactorLevels {
    Values(Vec<FactorValue>),
    Range { start: f64, stop: f64, step: f64 },
}

impl FactorLevels {
    /// Expand to a concrete value list.
    pub fn expand(&self, name: &str) -> Result<Vec<FactorValue>, DesignError> {
        match self {
            FactorLevels::Values(values) => {
                if values.is_empty() {
                    return Err(DesignError::EmptyLevels(name.to_string()));
                }
                Ok(values.clone())
            }
            FactorLevels::Range { start, stop, step } => {
                if *step <= 0.0 || stop < start {
                    return Err(DesignError::BadRange {
                        name: name.to_string(),
                        start: *start,
                        stop: *stop,
                        step: *step,
                    });
                }
                // Tolerance keeps inexact steps like 0.2 from dropping the
                // endpoint.
                let n = ((stop - start) / step + 1e-6).floor() as usize + 1;
                Ok((0..n)
                    .map(|i| FactorValue::Float((start + i as f64 * step).min(*stop)))
                    .collect())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignSpec {
    pub factors: BTreeMap<String, FactorLevels>,
    /// Cross all level lists (full factorial). Off means zip-and-trim.
    #[serde(default = "DesignSpec::default_cross")]
    pub cross: bool,
}

impl DesignSpec {
    fn default_cross() -> bool {
        true
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DesignError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| DesignError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| DesignError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Resolve the design into a condition table.
    ///
    /// Crossing enumerates every combination of factor levels; the first
    /// factor (in name order) varies fastest. Zipping pairs the lists row by
    /// row and trims to the shortest list, warning when values are dropped.
    pub fn resolve(&self) -> Result<ConditionTable, DesignError> {
        if self.factors.is_empty() {
            return Ok(ConditionTable::empty());
        }

        let mut expanded: Vec<(String, Vec<FactorValue>)> = Vec::with_capacity(self.factors.len());
        for (name, levels) in &self.factors {
            expanded.push((name.clone(), levels.expand(name)?));
        }

        let columns = if self.cross {
            cross_levels(&expanded)
        } else {
            zip_levels(&expanded)
        };
        ConditionTable::new(columns)
    }
}

fn cross_levels(expanded: &[(String, Vec<FactorValue>)]) -> BTreeMap<String, Vec<FactorValue>> {
    let n_cond: usize = expanded.iter().map(|(_, levels)| levels.len()).product();
    let mut columns = BTreeMap::new();
    let mut stride = 1;
    for (name, levels) in expanded {
        let column = (0..n_cond)
            .map(|cond| levels[(cond / stride) % levels.len()].clone())
            .collect();
        columns.insert(name.clone(), column);
        stride *= levels.len();
    }
    columns
}

fn zip_levels(expanded: &[(String, Vec<FactorValue>)]) -> BTreeMap<String, Vec<FactorValue>> {
    let n_cond = expanded
        .iter()
        .map(|(_, levels)| levels.len())
        .min()
        .unwrap_or(0);
    for (name, levels) in expanded {
        if levels.len() > n_cond {
            warn!(
                factor = name.as_str(),
                kept = n_cond,
                dropped = levels.len() - n_cond,
                "trimming factor levels to shortest list"
            );
        }
    }
    expanded
        .iter()
        .map(|(name, levels)| (name.clone(), levels[..n_cond].to_vec()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_product_covers_all_combinations() {
        let mut factors = BTreeMap::new();
        factors.insert(
            "contrast".to_string(),
            FactorLevels::Values(vec![FactorValue::Float(0.5), FactorValue::Float(1.0)]),
        );
        factors.insert(
            "ori".to_string(),
            FactorLevels::Values(vec![
                FactorValue::Int(0),
                FactorValue::Int(90),
                FactorValue::Int(180),
            ]),
        );
        let spec = DesignSpec {
            factors,
            cross: true,
        };
        let table = spec.resolve().unwrap();
        assert_eq!(table.n_cond(), 6);

        // First factor in name order (contrast) varies fastest.
        assert_eq!(table.value("contrast", 0), Some(&FactorValue::Float(0.5)));
        assert_eq!(table.value("contrast", 1), Some(&FactorValue::Float(1.0)));
        assert_eq!(table.value("ori", 0), Some(&FactorValue::Int(0)));
        assert_eq!(table.value("ori", 2), Some(&FactorValue::Int(90)));

        // Every (contrast, ori) pair appears exactly once.
        let mut seen = Vec::new();
        for cond in 0..table.n_cond() {
            let pair = (
                table.value("contrast", cond).unwrap().clone(),
                table.value("ori", cond).unwrap().clone(),
            );
            assert!(!seen.contains(&pair), "duplicate combination {pair:?}");
            seen.push(pair);
        }
    }

    #[test]
    fn zip_trims_to_shortest() {
        let mut factors = BTreeMap::new();
        factors.insert(
            "a".to_string(),
            FactorLevels::Values(vec![FactorValue::Int(1), FactorValue::Int(2)]),
        );
        factors.insert(
            "b".to_string(),
            FactorLevels::Values(vec![
                FactorValue::Int(10),
                FactorValue::Int(20),
                FactorValue::Int(30),
            ]),
        );
        let spec = DesignSpec {
            factors,
            cross: false,
        };
        let table = spec.resolve().unwrap();
        assert_eq!(table.n_cond(), 2);
        assert_eq!(table.value("b", 1), Some(&FactorValue::Int(20)));
    }

    #[test]
    fn range_expansion_is_inclusive() {
        let levels = FactorLevels::Range {
            start: 0.0,
            stop: 1.0,
            step: 0.25,
        };
        let values = levels.expand("contrast").unwrap();
        assert_eq!(values.len(), 5);
        assert_eq!(values[0], FactorValue::Float(0.0));
        assert_eq!(values[4], FactorValue::Float(1.0));
    }

    #[test]
    fn bad_range_rejected() {
        let levels = FactorLevels::Range {
            start: 1.0,
            stop: 0.0,
            step: 0.5,
        };
        assert!(levels.expand("x").is_err());
    }

    #[test]
    fn design_parses_from_toml() {
        let spec: DesignSpec = toml::from_str(
            r#"
            [factors]
            ori = [0, 90, 180, 270]
            contrast = { start = 0.25, stop = 1.0, step = 0.25 }
            "#,
        )
        .unwrap();
        assert!(spec.cross);
        let table = spec.resolve().unwrap();
        assert_eq!(table.n_cond(), 16);
    }
}
