//! Block partition: conditions grouped by shared values on a factor subset.

use std::collections::BTreeMap;

use crate::design::table::ConditionTable;
use crate::value::FactorValue;

/// Conditions partitioned into blocks by distinct block-factor value
/// combinations, in first-occurrence order.
#[derive(Debug, Clone, Default)]
pub struct BlockPartition {
    factors: Vec<String>,
    table: BTreeMap<String, Vec<FactorValue>>,
    groups: Vec<Vec<usize>>,
}

impl BlockPartition {
    pub fn n_blocks(&self) -> usize {
        self.groups.len()
    }

    /// Block factors that actually participated in the partition.
    pub fn factors(&self) -> &[String] {
        &self.factors
    }

    /// Condition indices belonging to block `b`, in table order.
    pub fn group(&self, b: usize) -> Option<&[usize]> {
        self.groups.get(b).map(Vec::as_slice)
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// Representative block-factor value of block `b`.
    pub fn value(&self, name: &str, b: usize) -> Option<&FactorValue> {
        self.table.get(name).and_then(|values| values.get(b))
    }

    /// Row view of block `b`: block factor name to representative value.
    pub fn block(&self, b: usize) -> BTreeMap<&str, &FactorValue> {
        self.table
            .iter()
            .filter_map(|(name, values)| values.get(b).map(|v| (name.as_str(), v)))
            .collect()
    }
}

/// Group condition indices by their block-factor values.
///
/// Scans conditions in index order, comparing each one's block-factor values
/// against every discovered block by value equality; the first match wins,
/// otherwise the condition starts a new block. Block factors absent from the
/// table are ignored. No block factors, all factors as block factors, or a
/// table of at most one condition all collapse to a single block holding
/// every condition in original order.
pub fn partition(table: &ConditionTable, block_factors: &[String]) -> BlockPartition {
    let present: Vec<String> = block_factors
        .iter()
        .filter(|name| table.has_factor(name))
        .cloned()
        .collect();

    if present.is_empty() || present.len() == table.n_factors() || table.n_cond() <= 1 {
        let mut partition = BlockPartition {
            factors: present,
            table: BTreeMap::new(),
            groups: Vec::new(),
        };
        if table.n_cond() > 0 {
            partition.groups.push((0..table.n_cond()).collect());
            for name in &partition.factors {
                if let Some(first) = table.value(name, 0) {
                    partition
                        .table
                        .insert(name.clone(), vec![first.clone()]);
                }
            }
        }
        return partition;
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut rows: Vec<Vec<&FactorValue>> = Vec::new();
    for cond in 0..table.n_cond() {
        let key: Vec<&FactorValue> = present
            .iter()
            .filter_map(|name| table.value(name, cond))
            .collect();
        match rows.iter().position(|row| *row == key) {
            Some(b) => groups[b].push(cond),
            None => {
                rows.push(key);
                groups.push(vec![cond]);
            }
        }
    }
    debug_assert_eq!(
        groups.iter().map(Vec::len).sum::<usize>(),
        table.n_cond(),
        "groups must cover every condition exactly once"
    );

    let mut block_table = BTreeMap::new();
    for (fi, name) in present.iter().enumerate() {
        let column = rows.iter().map(|row| row[fi].clone()).collect();
        block_table.insert(name.clone(), column);
    }

    BlockPartition {
        factors: present,
        table: block_table,
        groups,
    }
}
