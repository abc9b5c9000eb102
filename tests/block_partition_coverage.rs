use std::collections::BTreeMap;

use condlab::design::block::partition;
use condlab::design::table::ConditionTable;
use condlab::value::FactorValue;

fn table(pairs: &[(&str, &[i64])]) -> ConditionTable {
    let factors: BTreeMap<String, Vec<FactorValue>> = pairs
        .iter()
        .map(|(name, values)| {
            (
                name.to_string(),
                values.iter().copied().map(FactorValue::Int).collect(),
            )
        })
        .collect();
    ConditionTable::new(factors).unwrap()
}

#[test]
fn every_condition_lands_in_exactly_one_block() {
    let t = table(&[
        ("ori", &[0, 90, 180, 270, 0, 90, 180, 270, 0, 90, 180, 270]),
        ("contrast", &[1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3]),
        ("sf", &[2, 4, 2, 4, 2, 4, 2, 4, 2, 4, 2, 4]),
    ]);

    for block_factors in [
        vec!["contrast".to_string()],
        vec!["sf".to_string()],
        vec!["contrast".to_string(), "sf".to_string()],
    ] {
        let p = partition(&t, &block_factors);
        let total: usize = p.groups().iter().map(Vec::len).sum();
        assert_eq!(total, t.n_cond(), "blocks {block_factors:?}");

        let mut seen = vec![0usize; t.n_cond()];
        for group in p.groups() {
            for &cond in group {
                seen[cond] += 1;
            }
        }
        assert!(
            seen.iter().all(|&count| count == 1),
            "each condition must appear exactly once, got {seen:?}"
        );
    }
}

#[test]
fn blocks_discovered_in_first_occurrence_order() {
    let t = table(&[
        ("ori", &[0, 90, 0, 90]),
        ("contrast", &[3, 1, 2, 1]),
    ]);
    let p = partition(&t, &["contrast".to_string()]);
    assert_eq!(p.n_blocks(), 3);
    assert_eq!(p.value("contrast", 0), Some(&FactorValue::Int(3)));
    assert_eq!(p.value("contrast", 1), Some(&FactorValue::Int(1)));
    assert_eq!(p.value("contrast", 2), Some(&FactorValue::Int(2)));
    assert_eq!(p.group(1), Some(&[1, 3][..]));
}

#[test]
fn float_vector_block_keys_compare_by_value() {
    let mut factors = BTreeMap::new();
    factors.insert(
        "pos".to_string(),
        vec![
            FactorValue::Vec2([0.0, 0.5]),
            FactorValue::Vec2([1.0, 0.5]),
            FactorValue::Vec2([0.0, 0.5]),
            FactorValue::Vec2([1.0, 0.5]),
        ],
    );
    factors.insert(
        "ori".to_string(),
        vec![
            FactorValue::Int(0),
            FactorValue::Int(0),
            FactorValue::Int(90),
            FactorValue::Int(90),
        ],
    );
    let t = ConditionTable::new(factors).unwrap();
    let p = partition(&t, &["pos".to_string()]);
    assert_eq!(p.n_blocks(), 2);
    assert_eq!(p.group(0), Some(&[0, 2][..]));
    assert_eq!(p.group(1), Some(&[1, 3][..]));
}
