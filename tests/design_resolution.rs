use condlab::design::factorial::DesignSpec;
use condlab::value::FactorValue;

#[test]
fn crossed_design_from_toml_runs_full_factorial() {
    let spec: DesignSpec = toml::from_str(
        r#"
        [factors]
        ori = [0, 90, 180, 270]
        contrast = [0.25, 1.0]
        grating = [true, false]
        "#,
    )
    .unwrap();
    let table = spec.resolve().unwrap();
    assert_eq!(table.n_cond(), 16);
    assert_eq!(table.n_factors(), 3);

    // Each factor level appears equally often.
    let oris = table.values("ori").unwrap();
    let count_0 = oris.iter().filter(|v| **v == FactorValue::Int(0)).count();
    assert_eq!(count_0, 4);
    let gratings = table.values("grating").unwrap();
    let count_true = gratings
        .iter()
        .filter(|v| **v == FactorValue::Bool(true))
        .count();
    assert_eq!(count_true, 8);
}

#[test]
fn zipped_design_pairs_rows() {
    let spec: DesignSpec = toml::from_str(
        r#"
        cross = false

        [factors]
        ori = [0, 45, 90]
        pos = [[0.0, 0.0], [0.5, 0.0], [1.0, 0.0]]
        "#,
    )
    .unwrap();
    let table = spec.resolve().unwrap();
    assert_eq!(table.n_cond(), 3);
    assert_eq!(table.value("pos", 1), Some(&FactorValue::Vec2([0.5, 0.0])));
    assert_eq!(table.value("ori", 1), Some(&FactorValue::Int(45)));
}

#[test]
fn range_factor_expands_before_crossing() {
    let spec: DesignSpec = toml::from_str(
        r#"
        [factors]
        contrast = { start = 0.2, stop = 1.0, step = 0.2 }
        ori = [0, 90]
        "#,
    )
    .unwrap();
    let table = spec.resolve().unwrap();
    assert_eq!(table.n_cond(), 10);
    let contrasts = table.values("contrast").unwrap();
    assert!(contrasts
        .iter()
        .all(|v| matches!(v, FactorValue::Float(c) if (0.2..=1.0).contains(c))));
}

#[test]
fn empty_design_resolves_to_empty_table() {
    let spec: DesignSpec = toml::from_str("[factors]").unwrap();
    let table = spec.resolve().unwrap();
    assert!(table.is_empty());
}
