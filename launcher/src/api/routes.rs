//! API route definitions

use super::{handlers::*, ApiState};
use axum::{
    routing::{get, post},
    Router,
};

/// Launch registration and read queries
pub fn create_launch_routes() -> Router<ApiState> {
    Router::new()
        .route("/launches", get(list_launches).post(register_launch))
        .route("/launches/:address", get(get_launch))
        .route("/launches/:address/pledges", get(get_launch_pledges))
        .route("/launches/:address/bootstrap", get(get_bootstrap))
        .route("/launches/:address/events", get(get_launch_events))
        .route("/stats", get(get_stats))
}

/// Pledge ledger mutations and pledger queries
pub fn create_pledge_routes() -> Router<ApiState> {
    Router::new()
        .route("/pledges", post(submit_pledge))
        .route("/pledges/:id", get(get_pledge))
        .route("/pledges/:id/withdraw", post(withdraw_pledge))
        .route("/pledgers/:address/pledges", get(get_pledger_pledges))
}

/// Administrative lifecycle actions
pub fn create_admin_routes() -> Router<ApiState> {
    Router::new()
        .route("/admin/approve", post(approve_launch))
        .route("/admin/launch", post(launch))
}
