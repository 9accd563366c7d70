//! Demo server: reads settings from the environment (and `.env`), loads resource files,
//! introspects each table, and serves the admin routes next to health/ready/version.

use axum::Router;
use std::sync::Arc;
use table_admin::{
    admin_routes, common_routes_with_ready, load_resource_files, AppState, ColumnTypeRegistry,
    ResourceRegistry, Settings,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("table_admin=info".parse()?))
        .init();

    let settings = Settings::from_env()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await?;

    let files = load_resource_files(&settings.config_path).await?;
    let registry = ResourceRegistry::load_postgres(&pool, &ColumnTypeRegistry::default(), &files).await?;
    tracing::info!(resources = registry.len(), "registry built");

    let state = AppState {
        pool,
        registry: Arc::new(registry),
    };
    let admin = admin_routes(state.clone(), settings.body_limit);
    let admin = if settings.prefix.is_empty() {
        Router::new().merge(admin)
    } else {
        Router::new().nest(&settings.prefix, admin)
    };
    let app = Router::new().merge(common_routes_with_ready(state)).merge(admin);

    let listener = TcpListener::bind(&settings.bind).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
