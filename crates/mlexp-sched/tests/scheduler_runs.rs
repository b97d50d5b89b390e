use std::collections::{BTreeMap, BTreeSet};

use mlexp_core::ExpError;
use mlexp_sched::{EntryPoint, RunSpec, Scheduler, VersionSpec};
use mlexp_store::{DefinitionPart, ResultsPath};

fn two_part_experiment(temp: &tempfile::TempDir) -> ResultsPath {
    let results = ResultsPath::for_experiment(temp.path(), "scheduled");
    let mut esarsa = DefinitionPart::new("esarsa", &results);
    esarsa
        .add_sweepable_property("alpha", [0.5, 0.25], None)
        .add_sweepable_property("epsilon", [0.1, 0.05], None);
    esarsa.commit().expect("commit esarsa");
    let mut qrc = DefinitionPart::new("qrc", &results);
    qrc.add_sweepable_property("beta", [0.5, 1.0, 2.0, 4.0], None);
    qrc.commit().expect("commit qrc");
    results
}

fn entry() -> EntryPoint {
    EntryPoint::new("python", ["experiments/scheduled/run.py"])
}

#[test]
fn enumerates_parts_configs_and_seeds() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let results = two_part_experiment(&temp);
    let scheduler = Scheduler::new(results, vec![0, 1, 2], entry(), VersionSpec::Latest)
        .expect("scheduler")
        .get_all_runs()
        .expect("enumerate");
    assert_eq!(scheduler.len(), 24);
    let parts: BTreeSet<&str> = scheduler.runs().iter().map(|r| r.part.as_str()).collect();
    assert_eq!(parts, BTreeSet::from(["esarsa", "qrc"]));
    assert!(scheduler.runs().contains(&RunSpec::new("qrc", 0, 3, 2)));
}

#[test]
fn filter_returns_an_independent_scheduler() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let results = two_part_experiment(&temp);
    let scheduler = Scheduler::new(results, vec![0, 1, 2], entry(), VersionSpec::Latest)
        .expect("scheduler")
        .get_all_runs()
        .expect("enumerate");

    let done: BTreeSet<RunSpec> = scheduler.runs().iter().take(10).cloned().collect();
    let remaining = scheduler.filter(|run| done.contains(run));
    assert_eq!(remaining.len(), 14);
    assert_eq!(scheduler.len(), 24);
    assert!(remaining.runs().is_disjoint(&done));
    assert_eq!(remaining.seeds(), scheduler.seeds());

    let nothing_left = remaining.filter(|_| true);
    assert!(nothing_left.is_empty());
    assert_eq!(remaining.len(), 14);
}

#[test]
fn version_spec_selects_versions_per_part() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let results = two_part_experiment(&temp);
    let mut qrc = DefinitionPart::new("qrc", &results);
    qrc.add_sweepable_property("beta", [0.5, 1.0, 2.0, 4.0], None)
        .add_property("lambda", 0.9);
    assert_eq!(qrc.commit().expect("qrc v1"), 1);

    let latest = Scheduler::new(results.clone(), vec![0], entry(), VersionSpec::Latest)
        .expect("scheduler");
    let resolved = latest.resolve_versions().expect("resolve");
    assert_eq!(resolved.get("esarsa"), Some(&0));
    assert_eq!(resolved.get("qrc"), Some(&1));
    let latest = latest.get_all_runs().expect("enumerate");
    let qrc_ids: BTreeSet<u64> = latest
        .runs()
        .iter()
        .filter(|r| r.part == "qrc")
        .map(|r| r.config_id)
        .collect();
    assert_eq!(qrc_ids, (4..8).collect::<BTreeSet<u64>>());

    let pinned = VersionSpec::PerPart(BTreeMap::from([
        ("qrc".to_string(), Some(0)),
        ("esarsa".to_string(), None),
    ]));
    let pinned = Scheduler::new(results.clone(), vec![0], entry(), pinned)
        .expect("scheduler")
        .get_all_runs()
        .expect("enumerate");
    assert!(pinned.runs().iter().all(|r| r.version == 0));
    assert_eq!(pinned.len(), 8);

    let err = Scheduler::new(results, vec![0], entry(), VersionSpec::Fixed(1))
        .expect("scheduler")
        .get_all_runs()
        .expect_err("esarsa has no v1");
    assert!(matches!(err, ExpError::UnknownVersion(_)));
}

#[test]
fn missing_store_is_rejected() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let results = ResultsPath::for_experiment(temp.path(), "never_committed");
    let err = Scheduler::new(results, vec![0], entry(), VersionSpec::Latest)
        .expect_err("no store");
    assert!(matches!(err, ExpError::Storage(_)));
    assert_eq!(err.code(), "scheduler.store_missing");
}
