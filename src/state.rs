//! Shared application state for all routes. The registry is built before serving and never changes.

use crate::config::ResourceRegistry;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub registry: Arc<ResourceRegistry>,
}
