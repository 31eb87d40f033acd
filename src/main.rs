//! Routegate gateway binary.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                  ROUTEGATE                    │
//!                      │                                               │
//!   Client Request     │  ┌─────────┐   ┌──────────┐   ┌───────────┐  │
//!   ───────────────────┼─▶│  http   │──▶│ routing  │──▶│  filters  │  │
//!                      │  │ server  │   │  table   │   │   chain   │  │
//!                      │  └─────────┘   └────┬─────┘   └─────┬─────┘  │
//!                      │                     │               │        │
//!                      │              arc-swap snapshot      ▼        │
//!                      │                     │        backend dispatch│
//!   Client Response    │                     │      network | shunt | │
//!   ◀──────────────────┼─────────────────────┘          loopback      │
//!                      │                                               │
//!                      │  route expression text is the source of truth:│
//!                      │  ┌───────────┐  ┌───────────┐  ┌───────────┐ │
//!                      │  │route file │  │  watcher  │  │ admin API │ │
//!                      │  │ (routex)  │─▶│ (reload)  │  │(print/push│ │
//!                      │  └───────────┘  └───────────┘  └───────────┘ │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use routegate::admin::{setup_admin_router, AdminState};
use routegate::config::{load_config, load_routes, GatewayConfig, RouteWatcher};
use routegate::filters::Registry;
use routegate::http::{AppState, HttpServer};
use routegate::observability::{logging, metrics};
use routegate::routing::{RouteStore, RouteUpdate};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => GatewayConfig::default(),
    };
    let config = Arc::new(config);

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "routegate starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "failed to parse metrics address"
            ),
        }
    }

    let registry = Arc::new(Registry::with_builtins());
    let store = Arc::new(RouteStore::new(registry));

    // Initial route table from the route file, if configured.
    if !config.routes.file.is_empty() {
        let routes = load_routes(Path::new(&config.routes.file))?;
        tracing::info!(
            file = %config.routes.file,
            routes = routes.len(),
            "route file loaded"
        );
        store.apply(RouteUpdate::Replace(routes));
    }

    // Update channel: watcher and admin API both push into it.
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    tokio::spawn(store.clone().run_updates(update_rx));

    // Watcher must stay alive for events to fire.
    let _watcher = if config.routes.watch && !config.routes.file.is_empty() {
        Some(RouteWatcher::new(Path::new(&config.routes.file), update_tx.clone()).run()?)
    } else {
        None
    };

    if config.admin.enabled {
        let admin_state = AdminState {
            store: store.clone(),
            update_tx: update_tx.clone(),
            api_key: Arc::new(config.admin.api_key.clone()),
        };
        let admin_router = setup_admin_router(admin_state);
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %config.admin.bind_address, "admin API starting");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(admin_listener, admin_router).await {
                tracing::error!(error = %e, "admin API stopped");
            }
        });
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %config.listener.bind_address, "listening for connections");

    let server = HttpServer::new(AppState::new(config, store));
    server.run(listener).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
