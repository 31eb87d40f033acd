//! Dynamic route store behavior: updates over the channel, atomic swaps,
//! and whole-batch rejection of bad input.

use std::sync::Arc;

use tokio::sync::mpsc;

use routegate::filters::Registry;
use routegate::routex::parse;
use routegate::routing::{RouteStore, RouteUpdate};

fn new_store() -> Arc<RouteStore> {
    Arc::new(RouteStore::new(Arc::new(Registry::with_builtins())))
}

#[tokio::test]
async fn test_updates_over_channel() {
    let store = new_store();
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(store.clone().run_updates(rx));

    tx.send(RouteUpdate::Replace(
        parse("a: Path(\"/a\") -> <shunt>; b: * -> <loopback>").unwrap(),
    ))
    .unwrap();
    tx.send(RouteUpdate::Delete(vec!["b".to_string()])).unwrap();
    drop(tx);

    // The task drains the channel before finishing.
    task.await.unwrap();

    let table = store.table();
    assert_eq!(table.len(), 1);
    assert_eq!(table.routes().next().unwrap().id, "a");
}

#[tokio::test]
async fn test_upsert_preserves_definition_order() {
    let store = new_store();
    store.apply(RouteUpdate::Replace(
        parse("a: * -> <shunt>; b: * -> <shunt>").unwrap(),
    ));
    store.apply(RouteUpdate::Upsert(
        parse("a: Method(\"POST\") -> <shunt>; c: * -> <loopback>").unwrap(),
    ));

    let ids: Vec<String> = store.table().routes().map(|r| r.id.clone()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    let printed = store.print(false);
    assert!(printed.starts_with("a: Method(\"POST\") -> <shunt>"));
}

#[test]
fn test_snapshot_is_stable_across_swap() {
    let store = new_store();
    store.apply(RouteUpdate::Replace(parse("a: * -> <shunt>").unwrap()));

    let snapshot = store.table();
    store.apply(RouteUpdate::Replace(Vec::new()));

    assert_eq!(snapshot.len(), 1);
    assert_eq!(store.table().len(), 0);
}

#[test]
fn test_printed_table_reparses() {
    let store = new_store();
    let text = "a: Path(\"/a\") -> flowId() -> \"https://example.org\";\n\
                b: Host(/example/) -> <shunt>";
    store.apply(RouteUpdate::Replace(parse(text).unwrap()));

    assert_eq!(store.print(false), text);
    assert_eq!(parse(&store.print(true)).unwrap(), parse(text).unwrap());
}
