use std::fs;

use mlexp_core::{ExpError, Value};
use mlexp_store::{commit_definition, load_definition, ConfigReader, ConfigStore, ResultsPath};

const DEFINITION: &str = r#"
parts:
  - name: esarsa-mc
    properties:
      alpha: [0.5, 0.25, 0.125]
      epsilon: [0.1, 0.05, 0.15]
      n_step: [2, 3]
      tiles: 4
      tilings: 16
      total_steps: 100000
      episode_cutoff: 5000
  - name: softmaxAC-mc
    properties:
      alpha: [0.05, 0.01]
      tau: [10.0, 20.0, 5.0]
      greedy: false
"#;

#[test]
fn definition_file_commits_every_part() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let path = temp.path().join("parts.yaml");
    fs::write(&path, DEFINITION).expect("write definition");
    let definition = load_definition(&path).expect("load");
    assert_eq!(definition.parts.len(), 2);

    let results = ResultsPath::explicit(temp.path().join("results"));
    let store = ConfigStore::at(&results);
    let versions = commit_definition(&store, &definition).expect("commit");
    assert_eq!(versions.get("esarsa-mc"), Some(&0));
    assert_eq!(versions.get("softmaxAC-mc"), Some(&0));

    let reader = ConfigReader::new(&results);
    assert_eq!(
        store.get_configuration_ids("esarsa-mc", 0).expect("ids").len(),
        18
    );
    let last = reader.get_config("esarsa-mc", 0, 17).expect("last");
    assert_eq!(last.get("alpha"), Some(&Value::Real(0.125)));
    assert_eq!(last.get("epsilon"), Some(&Value::Real(0.15)));
    assert_eq!(last.get("n_step"), Some(&Value::Int(3)));
    assert_eq!(last.get("episode_cutoff"), Some(&Value::Int(5000)));
    let softmax = reader.get_config("softmaxAC-mc", 0, 5).expect("softmax");
    assert_eq!(softmax.get("greedy"), Some(&Value::Bool(false)));

    // Same file again: nothing changes.
    let again = commit_definition(&store, &definition).expect("recommit");
    assert_eq!(again, versions);
}

#[test]
fn definition_rejects_unsupported_values_and_orphan_priors() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let path = temp.path().join("bad.yaml");
    fs::write(
        &path,
        "parts:\n  - name: bad\n    properties:\n      nested: [[1, 2]]\n",
    )
    .expect("write");
    let definition = load_definition(&path).expect("load");
    let err = definition.parts[0].to_property_set().expect_err("nested list");
    assert!(matches!(err, ExpError::UnsupportedValueType(_)));

    fs::write(
        &path,
        "parts:\n  - name: bad\n    properties:\n      a: 1\n    assume_prior:\n      d: 4\n",
    )
    .expect("write");
    let definition = load_definition(&path).expect("load");
    let err = definition.parts[0].to_property_set().expect_err("orphan prior");
    assert_eq!(err.code(), "definition.orphan_prior");

    let err = load_definition(temp.path().join("missing.yaml")).expect_err("missing file");
    assert!(matches!(err, ExpError::Io(_)));
}

#[test]
fn definition_priors_feed_identity_resolution() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let path = temp.path().join("parts.yaml");
    let store = ConfigStore::open(temp.path().join("metadata.db"));

    fs::write(&path, "parts:\n  - name: p\n    properties:\n      a: [1, 2]\n").expect("write");
    commit_definition(&store, &load_definition(&path).expect("load")).expect("v0");

    fs::write(
        &path,
        "parts:\n  - name: p\n    properties:\n      a: [1, 2]\n      d: [4, 5]\n    assume_prior:\n      d: 4\n",
    )
    .expect("write");
    let versions =
        commit_definition(&store, &load_definition(&path).expect("load")).expect("v1");
    assert_eq!(versions.get("p"), Some(&1));
    let v1 = store.get_configuration_ids("p", 1).expect("ids");
    assert!(v1.contains(&0) && v1.contains(&1));
    assert_eq!(v1.len(), 4);
}
