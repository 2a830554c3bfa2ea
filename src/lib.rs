//! Inventory item service.
//!
//! Manages a single `items` table: idempotent upsert keyed by item name,
//! date-range queries, and per-category aggregation.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod ident;
pub mod migrator;
pub mod services;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
}

impl AppState {
    pub fn item_service(&self) -> services::items::ItemService {
        services::items::ItemService::new(self.db.clone())
    }
}

/// Builds the application router with all routes and shared middleware.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::items::items_routes())
        .merge(handlers::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
