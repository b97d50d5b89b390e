use mlexp_core::{ExpError, Value};
use mlexp_store::{ConfigReader, DefinitionPart, ResultsPath};

fn qrc_results(temp: &tempfile::TempDir) -> ResultsPath {
    let results = ResultsPath::for_experiment(temp.path(), "dummy_experiment");
    let mut part = DefinitionPart::new("qrc", &results);
    part.add_sweepable_property("alpha", (3..8).map(|i| 2f64.powi(-i)), None)
        .add_sweepable_property("beta", [0.5, 1.0, 2.0], None);
    part.commit().expect("commit");
    results
}

#[test]
fn get_config_returns_committed_mapping() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let reader = ConfigReader::new(&qrc_results(&temp));
    let config = reader.get_config("qrc", 0, 0).expect("config");
    let map = config.to_map();
    assert_eq!(map.len(), 3);
    assert_eq!(map.get("alpha"), Some(&Value::Real(0.125)));
    assert_eq!(map.get("beta"), Some(&Value::Real(0.5)));
    assert_eq!(map.get("id"), Some(&Value::Int(0)));
}

#[test]
fn get_configs_preserves_order_and_repeats() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let reader = ConfigReader::new(&qrc_results(&temp));
    let configs = reader
        .get_configs("qrc", 0, &[2, 0, 2], Some(&[1, 2]))
        .expect("configs");
    let observed: Vec<(Option<u64>, Option<Value>)> = configs
        .iter()
        .map(|c| (c.id, c.get("seed").cloned()))
        .collect();
    assert_eq!(
        observed,
        vec![
            (Some(2), Some(Value::Int(1))),
            (Some(2), Some(Value::Int(2))),
            (Some(0), Some(Value::Int(1))),
            (Some(0), Some(Value::Int(2))),
            (Some(2), Some(Value::Int(1))),
            (Some(2), Some(Value::Int(2))),
        ]
    );
    assert_eq!(configs[0].get("beta"), Some(&Value::Real(2.0)));

    let plain = reader.get_configs("qrc", 0, &[1, 2, 3], None).expect("plain");
    let betas: Vec<_> = plain.iter().filter_map(|c| c.get("beta").cloned()).collect();
    assert_eq!(
        betas,
        vec![Value::Real(1.0), Value::Real(2.0), Value::Real(0.5)]
    );
    assert_eq!(plain[2].get("alpha"), Some(&Value::Real(0.0625)));
    assert!(plain.iter().all(|c| c.get("seed").is_none()));
}

#[test]
fn every_scalar_kind_round_trips() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let results = ResultsPath::explicit(temp.path());
    let mut part = DefinitionPart::new("kinds", &results);
    part.add_property("steps", 100_000)
        .add_property("rate", 0.5)
        .add_property("name", "sarsa \"lambda\"")
        .add_sweepable_property("greedy", [true, false], None)
        .add_sweepable_property("mixed", [Value::Int(1), Value::Real(2.5), Value::from("x")], None);
    part.commit().expect("commit");

    let reader = ConfigReader::new(&results);
    let configs = reader
        .get_configs("kinds", 0, &[0, 1, 2, 3, 4, 5], None)
        .expect("configs");
    assert_eq!(configs.len(), 6);
    assert_eq!(configs[0].get("steps"), Some(&Value::Int(100_000)));
    assert_eq!(configs[0].get("rate"), Some(&Value::Real(0.5)));
    assert_eq!(
        configs[0].get("name"),
        Some(&Value::Text("sarsa \"lambda\"".into()))
    );
    assert_eq!(configs[0].get("greedy"), Some(&Value::Bool(true)));
    assert_eq!(configs[3].get("greedy"), Some(&Value::Bool(false)));
    assert_eq!(configs[0].get("mixed"), Some(&Value::Int(1)));
    assert_eq!(configs[1].get("mixed"), Some(&Value::Real(2.5)));
    assert_eq!(configs[2].get("mixed"), Some(&Value::Text("x".into())));
}

#[test]
fn lookups_fail_with_typed_errors() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let reader = ConfigReader::new(&qrc_results(&temp));

    let err = reader.get_config("qrc", 1, 0).expect_err("version past latest");
    assert!(matches!(err, ExpError::UnknownVersion(_)));
    assert_eq!(err.info().context.get("version").map(String::as_str), Some("1"));

    let err = reader.get_config("missing", 0, 0).expect_err("unknown part");
    assert!(matches!(err, ExpError::UnknownVersion(_)));

    let err = reader
        .get_configs("qrc", 0, &[0, 99], Some(&[1]))
        .expect_err("unknown id");
    assert!(matches!(err, ExpError::UnknownConfiguration(_)));
    assert_eq!(err.code(), "store.unknown_configuration");
}
