//! HTTP surface for the launch pipeline

mod error;
mod handlers;
pub mod responses;
mod routes;

pub use error::{ApiError, Caller, CALLER_HEADER};
pub use routes::*;

use crate::adapters::{ChainAdapter, StorageAdapter};
use crate::config::ApiConfig;
use crate::core::{ChainPort, LaunchStore};
use crate::domain::{LaunchService, PledgeLedger};
use crate::metrics::LaunchMetrics;
use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

pub type Ledger = PledgeLedger<StorageAdapter>;
pub type Launches = LaunchService<StorageAdapter, ChainAdapter>;

/// Start the API server
pub async fn start_server(state: ApiState, config: &ApiConfig) -> Result<tokio::task::JoinHandle<()>> {
    let app = create_app(state, config);

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("API server listening on {}", config.bind_address);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("API server error: {}", e);
        }
    });

    Ok(handle)
}

/// Start the metrics server
pub async fn start_metrics_server(port: u16, metrics: Arc<LaunchMetrics>) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(|| async { Json(json!({ "status": "healthy" })) }))
        .with_state(metrics);

    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Metrics server listening on {}", addr);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(handle)
}

/// Create the main API application
pub fn create_app(state: ApiState, config: &ApiConfig) -> Router {
    let app = create_router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));
    if config.enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// All routes bound to their state, without transport layers
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .merge(create_launch_routes())
        .merge(create_pledge_routes())
        .merge(create_admin_routes())
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<ApiState>) -> (StatusCode, Json<Value>) {
    let storage = state.store.health_check().await;
    let chain = state.chain.health_check().await;
    let healthy = storage.is_ok() && chain.is_ok();

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let check = |result: &crate::core::LaunchResult<()>| match result {
        Ok(()) => json!({ "status": "ok" }),
        Err(e) => json!({ "status": "error", "error": e.to_string() }),
    };

    (
        status,
        Json(json!({
            "status": if healthy { "healthy" } else { "degraded" },
            "timestamp": chrono::Utc::now().timestamp(),
            "service": "coinfluence-launcher",
            "storage": { "backend": state.store.backend_name(), "check": check(&storage) },
            "chain": { "backend": state.chain.backend_name(), "check": check(&chain) },
        })),
    )
}

async fn metrics_handler(State(metrics): State<Arc<LaunchMetrics>>) -> Result<String, StatusCode> {
    metrics.render().map_err(|e| {
        error!("Failed to render metrics: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Shared API state
#[derive(Clone)]
pub struct ApiState {
    pub ledger: Arc<Ledger>,
    pub launches: Arc<Launches>,
    pub store: Arc<StorageAdapter>,
    pub chain: Arc<ChainAdapter>,
}

impl ApiState {
    pub fn new(
        ledger: Arc<Ledger>,
        launches: Arc<Launches>,
        store: Arc<StorageAdapter>,
        chain: Arc<ChainAdapter>,
    ) -> Self {
        Self {
            ledger,
            launches,
            store,
            chain,
        }
    }
}
