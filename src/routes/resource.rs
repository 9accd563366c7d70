//! Admin routes over every registered resource.
//! Paths are parameterized; handlers resolve the resource by name. Row identifiers are
//! the key values joined by `/`, so they are matched as a trailing wildcard.

use crate::handlers::resource::{
    create_post, create_view, delete_post, edit_post, edit_view, index, list_json, list_view,
};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};
use tower_http::limit::RequestBodyLimitLayer;

pub fn admin_routes(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/:resource", get(list_view))
        .route("/:resource/json", get(list_json))
        .route("/:resource/create", get(create_view).post(create_post))
        .route("/:resource/edit/*ids", get(edit_view).post(edit_post))
        .route("/:resource/delete/*ids", post(delete_post))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}
