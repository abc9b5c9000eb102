use std::collections::BTreeMap;

use crate::design::DesignError;
use crate::value::FactorValue;

/// Resolved condition table: one ordered value list per factor, all lists
/// the same length. Row `i` across every factor is condition `i`.
///
/// Built once per session and never mutated afterwards; the scheduler only
/// reads it.
#[derive(Debug, Clone, Default)]
pub struct ConditionTable {
    factors: BTreeMap<String, Vec<FactorValue>>,
    n_cond: usize,
}

impl ConditionTable {
    /// Build a table from per-factor value lists. Every list must have the
    /// same length; an empty map yields the empty table.
    pub fn new(factors: BTreeMap<String, Vec<FactorValue>>) -> Result<Self, DesignError> {
        let n_cond = factors.values().next().map_or(0, Vec::len);
        for (name, values) in &factors {
            if values.len() != n_cond {
                return Err(DesignError::UnevenFactor {
                    name: name.clone(),
                    len: values.len(),
                    expected: n_cond,
                });
            }
        }
        Ok(Self { factors, n_cond })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of conditions (rows).
    #[inline]
    pub fn n_cond(&self) -> usize {
        self.n_cond
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_cond == 0
    }

    pub fn n_factors(&self) -> usize {
        self.factors.len()
    }

    pub fn factor_names(&self) -> impl Iterator<Item = &str> {
        self.factors.keys().map(String::as_str)
    }

    pub fn has_factor(&self, name: &str) -> bool {
        self.factors.contains_key(name)
    }

    /// Full value list of one factor.
    pub fn values(&self, name: &str) -> Option<&[FactorValue]> {
        self.factors.get(name).map(Vec::as_slice)
    }

    /// Value of one factor at one condition index.
    pub fn value(&self, name: &str, cond: usize) -> Option<&FactorValue> {
        self.factors.get(name).and_then(|values| values.get(cond))
    }

    /// Row view of one condition: factor name to value.
    pub fn condition(&self, cond: usize) -> BTreeMap<&str, &FactorValue> {
        self.factors
            .iter()
            .filter_map(|(name, values)| values.get(cond).map(|v| (name.as_str(), v)))
            .collect()
    }
}
