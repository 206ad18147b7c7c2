//! Route definitions for the Bakehouse Inventory Platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Ingredient and batch stock
        .nest("/ingredients", ingredient_routes())
        // Production recording and history
        .nest("/production", production_routes())
        // Audit log
        .nest("/activities", activity_routes())
}

/// Ingredient and batch stock routes
fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_ingredients).post(handlers::create_ingredient),
        )
        .route("/low-stock", get(handlers::list_low_stock))
        .route("/:ingredient_id", get(handlers::get_ingredient))
        .route(
            "/:ingredient_id/batches",
            get(handlers::list_ingredient_batches),
        )
        .route(
            "/:ingredient_id/restock",
            post(handlers::restock_ingredient),
        )
}

/// Production recording and history routes
fn production_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_productions).post(handlers::record_production),
        )
        .route("/export", get(handlers::export_productions))
        .route("/:production_id", get(handlers::get_production))
}

/// Audit log routes
fn activity_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::list_activities))
}
