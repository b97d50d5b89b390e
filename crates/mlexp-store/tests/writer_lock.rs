use mlexp_core::ExpError;
use mlexp_store::{ConfigStore, PropertySet};
use rusqlite::{Connection, TransactionBehavior};

#[test]
fn commit_fails_with_conflict_while_another_writer_holds_the_lock() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let store = ConfigStore::open(temp.path().join("metadata.db"));
    let mut props = PropertySet::new();
    props.add_sweepable_property("lr", [0.1, 0.2], None);
    assert_eq!(store.resolve_and_commit("p", &props).expect("first"), 0);

    let mut holder = Connection::open(store.path()).expect("open");
    let lock = holder
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .expect("take lock");

    props.add_property("lr", 0.3);
    let err = store.resolve_and_commit("p", &props).expect_err("locked");
    assert!(matches!(err, ExpError::ConcurrentWriteConflict(_)));
    assert_eq!(err.code(), "store.writer_busy");
    // Readers still see the committed state.
    assert_eq!(store.versions("p").expect("versions"), vec![0]);

    lock.rollback().expect("release");
    assert_eq!(store.resolve_and_commit("p", &props).expect("after release"), 1);
}
