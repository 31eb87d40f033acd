//! Route file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_routes;
use crate::routing::RouteUpdate;

/// Watches the route expression file and pushes reparsed batches over the
/// route update channel.
pub struct RouteWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RouteUpdate>,
}

impl RouteWatcher {
    pub fn new(path: &Path, update_tx: mpsc::UnboundedSender<RouteUpdate>) -> Self {
        Self {
            path: path.to_path_buf(),
            update_tx,
        }
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for events to fire. A route
    /// file that fails to parse keeps the current table; the whole batch is
    /// rejected, never applied partially.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = ?path, "route file change detected, reloading");
                        match load_routes(&path) {
                            Ok(routes) => {
                                let _ = tx.send(RouteUpdate::Replace(routes));
                            }
                            Err(e) => {
                                tracing::error!(
                                    path = ?path,
                                    error = %e,
                                    "failed to reload routes, keeping current table"
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "route file watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "route file watcher started");
        Ok(watcher)
    }
}
