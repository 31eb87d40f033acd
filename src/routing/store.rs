//! Live route store with dynamic updates.
//!
//! # Data Flow
//! ```text
//! Route file watcher / admin API
//!     → RouteUpdate over an mpsc channel
//!     → RouteStore::apply (recompile definitions)
//!     → arc-swap of the compiled table
//!     → proxy handler loads the current table per request
//! ```
//!
//! # Design Decisions
//! - Readers never block: the handler grabs an Arc snapshot of the table
//! - Updates recompile the whole table; route counts are small enough that
//!   swap cost is dominated by regex compilation
//! - Upserts are keyed by route id; unnamed routes can only arrive via a
//!   full replacement

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use tokio::sync::mpsc;

use super::router::RouteTable;
use crate::filters::Registry;
use crate::routex::{print_routes, Route};

/// A change to the route table.
#[derive(Debug, Clone)]
pub enum RouteUpdate {
    /// Replace the whole table with this batch.
    Replace(Vec<Route>),
    /// Insert or overwrite routes by id.
    Upsert(Vec<Route>),
    /// Remove routes by id.
    Delete(Vec<String>),
}

/// Holds the current route definitions and their compiled table.
pub struct RouteStore {
    registry: Arc<Registry>,
    definitions: Mutex<Vec<Route>>,
    table: ArcSwap<RouteTable>,
}

impl RouteStore {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            definitions: Mutex::new(Vec::new()),
            table: ArcSwap::from_pointee(RouteTable::empty()),
        }
    }

    /// Current compiled table. Cheap; taken once per request.
    pub fn table(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    /// Applies one update and swaps in the recompiled table.
    pub fn apply(&self, update: RouteUpdate) {
        let mut definitions = self
            .definitions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match update {
            RouteUpdate::Replace(routes) => *definitions = routes,
            RouteUpdate::Upsert(routes) => {
                for route in routes {
                    match definitions
                        .iter_mut()
                        .find(|d| !d.id.is_empty() && d.id == route.id)
                    {
                        Some(existing) => *existing = route,
                        None => definitions.push(route),
                    }
                }
            }
            RouteUpdate::Delete(ids) => {
                definitions.retain(|d| d.id.is_empty() || !ids.contains(&d.id));
            }
        }

        let table = RouteTable::compile(definitions.clone(), &self.registry);
        tracing::info!(
            defined = definitions.len(),
            active = table.len(),
            "route table updated"
        );
        crate::observability::metrics::record_table_size(table.len());
        self.table.store(Arc::new(table));
    }

    /// Canonical serialization of the current definitions.
    pub fn print(&self, pretty: bool) -> String {
        let definitions = self
            .definitions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        print_routes(&definitions, pretty)
    }

    /// Consumes updates from `rx` until the channel closes.
    pub async fn run_updates(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<RouteUpdate>) {
        while let Some(update) = rx.recv().await {
            self.apply(update);
        }
        tracing::debug!("route update channel closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routex::parse;

    fn store_with(expr: &str) -> RouteStore {
        let store = RouteStore::new(Arc::new(Registry::with_builtins()));
        store.apply(RouteUpdate::Replace(parse(expr).unwrap()));
        store
    }

    #[test]
    fn test_replace_swaps_table() {
        let store = store_with("a: * -> <shunt>");
        assert_eq!(store.table().len(), 1);

        store.apply(RouteUpdate::Replace(
            parse("b: * -> <shunt>; c: * -> <loopback>").unwrap(),
        ));
        let table = store.table();
        assert_eq!(table.len(), 2);
        let ids: Vec<_> = table.routes().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_upsert_and_delete_by_id() {
        let store = store_with("a: Path(\"/a\") -> <shunt>; b: * -> <shunt>");

        store.apply(RouteUpdate::Upsert(
            parse("a: Path(\"/changed\") -> <shunt>; d: * -> <loopback>").unwrap(),
        ));
        let table = store.table();
        assert_eq!(table.len(), 3);
        let a = table.routes().find(|r| r.id == "a").unwrap();
        assert_eq!(a.path, "/changed");

        store.apply(RouteUpdate::Delete(vec!["b".to_string(), "d".to_string()]));
        assert_eq!(store.table().len(), 1);
    }

    #[test]
    fn test_print_round_trips() {
        let text = "a: Path(\"/a\") -> flowId() -> \"https://example.org\";\nb: * -> <shunt>";
        let store = store_with(text);
        assert_eq!(store.print(false), text);
        assert_eq!(parse(&store.print(false)).unwrap(), parse(text).unwrap());
    }

    #[test]
    fn test_old_table_snapshot_survives_swap() {
        let store = store_with("a: * -> <shunt>");
        let before = store.table();
        store.apply(RouteUpdate::Replace(Vec::new()));
        // A reader holding the old snapshot is unaffected by the swap.
        assert_eq!(before.len(), 1);
        assert_eq!(store.table().len(), 0);
    }
}
