//! Admin API.
//!
//! Serves the live route table in its canonical textual form and accepts
//! route updates over the same format. Everything behind a bearer key.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get},
    Router,
};
use tokio::sync::mpsc;

use crate::routing::{RouteStore, RouteUpdate};
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State for the admin router.
#[derive(Clone)]
pub struct AdminState {
    pub store: Arc<RouteStore>,
    pub update_tx: mpsc::UnboundedSender<RouteUpdate>,
    pub api_key: Arc<String>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route(
            "/admin/routes",
            get(get_routes).put(put_routes).patch(patch_routes),
        )
        .route("/admin/routes/{id}", delete(delete_route))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .with_state(state)
}
