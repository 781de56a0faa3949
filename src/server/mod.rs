/// HTTP Server Module
///
/// This module wires the route surface onto the core executors: the router,
/// the shared application state, and the serve loop. Concurrent requests
/// each run their own strictly sequential execution with their own session;
/// nothing here shares a session between requests.

pub mod error;
pub mod handlers;

use crate::config::Config;
use crate::core::db::Driver;
use crate::core::{OralabError, Result};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    driver: Arc<dyn Driver>,
    sample_schema: String,
}

impl AppState {
    pub fn new(driver: Arc<dyn Driver>, sample_schema: impl Into<String>) -> Self {
        AppState {
            driver,
            sample_schema: sample_schema.into(),
        }
    }

    /// The gateway driver requests connect their sessions through.
    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    /// Schema whose tables the table routes expose.
    pub fn sample_schema(&self) -> &str {
        &self.sample_schema
    }
}

/// Builds the application router.
///
/// Kept separate from `serve` so handler tests can drive the router
/// directly with an in-memory driver.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/demos", get(handlers::list_demos))
        .route("/api/demos/{name}", get(handlers::run_demo))
        .route("/api/users/exists", get(handlers::user_exists))
        .route(
            "/api/users/{username}/privileges",
            get(handlers::user_privileges),
        )
        .route("/api/id-numbers/{id}/validate", get(handlers::validate_id))
        .route("/api/tables", get(handlers::list_tables))
        .route("/api/tables/{table}/columns", get(handlers::table_columns))
        .route("/api/tables/{table}/export", post(handlers::export_table))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves requests until the process is
/// stopped. The request timeout is transport-level; the core itself places
/// no timeout on database calls.
pub async fn serve(config: &Config, driver: Arc<dyn Driver>) -> Result<()> {
    let state = AppState::new(driver, config.database.sample_schema.clone());
    let app = router(state).layer(TimeoutLayer::new(Duration::from_secs(
        config.server.request_timeout_secs,
    )));

    let listener = TcpListener::bind(&config.server.bind_addr)
        .await
        .map_err(|e| {
            OralabError::Config(format!("cannot bind {}: {}", config.server.bind_addr, e))
        })?;
    info!(addr = %config.server.bind_addr, "oralab listening");

    axum::serve(listener, app).await?;
    Ok(())
}
