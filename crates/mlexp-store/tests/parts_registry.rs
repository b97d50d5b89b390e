use std::collections::BTreeSet;

use mlexp_core::Value;
use mlexp_store::{ConfigStore, DefinitionPart};

fn parts(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn base_part(store: &ConfigStore, name: &str) -> DefinitionPart {
    let mut part = DefinitionPart::with_store(name, store.clone());
    part.add_property("a", 1)
        .add_property("b", 2)
        .add_property("c", 3)
        .add_sweepable_property("seed", [1, 2, 3], None);
    part
}

#[test]
fn get_parts_tracks_hyphenated_names() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let store = ConfigStore::open(temp.path().join("results/test/metadata.db"));
    assert!(store.get_parts().expect("empty store").is_empty());

    let mut test = base_part(&store, "test");
    test.commit().expect("commit test");
    assert_eq!(store.get_parts().expect("parts"), parts(&["test"]));

    test.add_sweepable_property("d", [4, 5, 6], Some(Value::Int(4)));
    assert_eq!(test.commit().expect("evolve test"), 1);
    assert_eq!(store.get_parts().expect("parts"), parts(&["test"]));

    base_part(&store, "test-2").commit().expect("commit test-2");
    assert_eq!(store.get_parts().expect("parts"), parts(&["test", "test-2"]));

    let mut hyphens = DefinitionPart::with_store("test-3-lot-of-hyphens-", store.clone());
    hyphens
        .add_property("a", 1)
        .add_sweepable_property("seed", [1, 2, 3], None);
    hyphens.commit().expect("commit hyphens");
    assert_eq!(
        store.get_parts().expect("parts"),
        parts(&["test", "test-2", "test-3-lot-of-hyphens-"])
    );
}

#[test]
fn versions_of_prefix_sharing_parts_stay_separate() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let store = ConfigStore::open(temp.path().join("metadata.db"));
    let mut test = base_part(&store, "test");
    test.commit().expect("v0");
    test.add_property("e", 7);
    test.commit().expect("v1");
    base_part(&store, "test-2").commit().expect("test-2 v0");

    assert_eq!(store.versions("test").expect("versions"), vec![0, 1]);
    assert_eq!(store.versions("test-2").expect("versions"), vec![0]);
    // test-2 numbers its ids independently of test.
    assert_eq!(
        store.get_configuration_ids("test-2", 0).expect("ids"),
        (0..3).collect::<BTreeSet<_>>()
    );

    let table = store.version_table("test", 1).expect("table");
    let columns: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, vec!["a", "b", "c", "seed", "e"]);
    assert_eq!(table.table_name(), "test-v1");
}
