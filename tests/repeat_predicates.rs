use std::collections::BTreeMap;

use condlab::design::table::ConditionTable;
use condlab::run::sampling::SampleMethod;
use condlab::run::scheduler::CondScheduler;
use condlab::value::FactorValue;

fn table(n_cond: usize) -> ConditionTable {
    let mut factors = BTreeMap::new();
    factors.insert(
        "ori".to_string(),
        (0..n_cond)
            .map(|i| FactorValue::Int((i * 45) as i64))
            .collect(),
    );
    ConditionTable::new(factors).unwrap()
}

fn ascending(n_cond: usize, seed: u64) -> CondScheduler {
    let mut s = CondScheduler::new(seed);
    s.initialize(
        table(n_cond),
        SampleMethod::Ascending,
        SampleMethod::Ascending,
        &[],
    );
    s
}

#[test]
fn composite_target_is_product_of_cond_and_block_targets() {
    let mut s = ascending(8, 1);
    // Target: 2 repeats per block entry, 3 block entries, so 6 per condition.
    let mut trials = 0;
    while !s.session_complete(2, 3) {
        s.next(2, None, None, true).unwrap();
        trials += 1;
        assert!(trials <= 8 * 6, "termination check never satisfied");
    }
    assert_eq!(trials, 8 * 6);
    for cond in 0..8 {
        assert_eq!(s.cond_repeat(cond), 6);
        assert!(s.is_cond_repeated(cond, 6));
        assert!(!s.is_cond_repeated(cond, 7));
    }
}

#[test]
fn repeat_counts_never_decrease() {
    let mut s = CondScheduler::new(3);
    s.initialize(
        table(5),
        SampleMethod::UniformWithoutReplacement,
        SampleMethod::Ascending,
        &[],
    );

    let mut prev_cond = vec![0u64; 5];
    let mut prev_block = s.block_repeat(0);
    for _ in 0..200 {
        s.next(2, None, None, true).unwrap();
        for cond in 0..5 {
            let now = s.cond_repeat(cond);
            assert!(now >= prev_cond[cond], "cond {cond} repeat decreased");
            prev_cond[cond] = now;
        }
        let now = s.block_repeat(0);
        assert!(now >= prev_block, "block repeat decreased");
        prev_block = now;
    }
}

#[test]
fn skip_count_holds_the_current_condition() {
    let mut s = ascending(4, 1);
    assert_eq!(s.next(u64::MAX, None, None, false).unwrap(), Some(0));

    s.set_skip_count(3);
    for _ in 0..3 {
        assert_eq!(s.next(u64::MAX, None, None, false).unwrap(), Some(0));
    }
    assert_eq!(s.cond_repeat(0), 1, "held draws must not recount");
    assert_eq!(s.next(u64::MAX, None, None, false).unwrap(), Some(1));
}

#[test]
fn all_in_block_predicate_tracks_block_entries() {
    let mut factors = BTreeMap::new();
    factors.insert(
        "ori".to_string(),
        vec![
            FactorValue::Int(0),
            FactorValue::Int(90),
            FactorValue::Int(0),
            FactorValue::Int(90),
        ],
    );
    factors.insert(
        "contrast".to_string(),
        vec![
            FactorValue::Int(1),
            FactorValue::Int(1),
            FactorValue::Int(2),
            FactorValue::Int(2),
        ],
    );
    let t = ConditionTable::new(factors).unwrap();

    let mut s = CondScheduler::new(1);
    s.initialize(
        t,
        SampleMethod::Ascending,
        SampleMethod::Ascending,
        &["contrast".to_string()],
    );

    // First block entered, both of its conditions drawn once.
    assert_eq!(s.next(1, None, None, true).unwrap(), Some(0));
    assert!(!s.all_in_block_repeated(0, 1));
    assert_eq!(s.next(1, None, None, true).unwrap(), Some(1));
    assert!(s.all_in_block_repeated(0, 1));
    assert!(!s.all_cond_repeated(1));

    // Target met, so the next draw advances to the second block.
    assert_eq!(s.next(1, None, None, true).unwrap(), Some(2));
    assert_eq!(s.current_block(), Some(1));
    assert!(s.is_block_repeated(0, 1));
    assert!(s.is_block_repeated(1, 1));

    assert_eq!(s.next(1, None, None, true).unwrap(), Some(3));
    assert!(s.all_cond_repeated(1));
    assert!(s.session_complete(1, 1));
}
