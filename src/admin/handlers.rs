use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AdminState;
use crate::routex::{self, ParseError};
use crate::routing::RouteUpdate;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub active_routes: usize,
}

#[derive(Deserialize, Default)]
pub struct PrintParams {
    #[serde(default)]
    pub pretty: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        active_routes: state.store.table().len(),
    })
}

/// The current route definitions in canonical textual form.
pub async fn get_routes(
    State(state): State<AdminState>,
    Query(params): Query<PrintParams>,
) -> String {
    state.store.print(params.pretty)
}

/// Replace the whole table with the posted batch.
pub async fn put_routes(State(state): State<AdminState>, body: String) -> Response {
    apply_batch(&state, &body, RouteUpdate::Replace)
}

/// Insert or overwrite routes by id.
pub async fn patch_routes(State(state): State<AdminState>, body: String) -> Response {
    apply_batch(&state, &body, RouteUpdate::Upsert)
}

pub async fn delete_route(State(state): State<AdminState>, Path(id): Path<String>) -> Response {
    if state.update_tx.send(RouteUpdate::Delete(vec![id])).is_err() {
        return (StatusCode::SERVICE_UNAVAILABLE, "update channel closed").into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

fn apply_batch(
    state: &AdminState,
    body: &str,
    update: impl FnOnce(Vec<routex::Route>) -> RouteUpdate,
) -> Response {
    match routex::parse(body) {
        Ok(routes) => {
            let count = routes.len();
            if state.update_tx.send(update(routes)).is_err() {
                return (StatusCode::SERVICE_UNAVAILABLE, "update channel closed")
                    .into_response();
            }
            tracing::info!(routes = count, "admin route update accepted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e @ ParseError::DuplicateId { .. }) => {
            (StatusCode::CONFLICT, e.to_string()).into_response()
        }
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}
