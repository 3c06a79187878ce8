//! JSON HTTP API for Tally.
//!
//! Exposes an axum [`Router`] over a [`SnapshotHandle`]. Every request reads
//! the snapshot published at the moment it arrives and answers entirely from
//! it, so a concurrent refresh never mixes two loads in one response.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tally_api::api_router(handle.clone()))
//! ```

pub mod error;
pub mod global;
pub mod regions;

use std::sync::Arc;

use axum::{Router, routing::get};
use tally_engine::SnapshotHandle;

pub use error::ApiError;

/// Build a fully-materialised API router for `handle`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router(handle: Arc<SnapshotHandle>) -> Router<()> {
  Router::new()
    // Global
    .route("/regions", get(global::regions))
    .route("/totals", get(global::totals))
    .route("/headline", get(global::headline))
    .route("/last-updated", get(global::last_updated))
    .route("/export.csv", get(global::export))
    // Per region
    .route("/regions/{region}/totals", get(regions::totals))
    .route("/regions/{region}/latest", get(regions::latest))
    .route("/regions/{region}/map", get(regions::map))
    .route("/regions/{region}/coordinates", get(regions::coordinates))
    .route("/regions/{region}/new", get(regions::new_cases))
    .route("/regions/{region}/daily", get(regions::daily))
    .with_state(handle)
}
