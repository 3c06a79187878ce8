//! Handlers for `/regions/{region}/…` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/regions/{region}/totals` | Daily totals summed over sub-regions |
//! | `GET`  | `/regions/{region}/latest` | Newest date, totals plus per-location points |
//! | `GET`  | `/regions/{region}/map` | Centre plus per-location peaks |
//! | `GET`  | `/regions/{region}/coordinates` | `null` when no row had any |
//! | `GET`  | `/regions/{region}/new` | `?metric=` (default `confirmed`) |
//! | `GET`  | `/regions/{region}/daily` | `?metric=&tail=` |
//!
//! Every route answers 404 for an unknown region. Region names are matched
//! exactly, after percent-decoding.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use tally_core::{
  location::Coordinates,
  observation::Metric,
  view::{DailyCasePoint, DailyTotals, NewCases, RegionMap, RegionSnapshot},
};
use tally_engine::{SnapshotHandle, query};

use crate::error::ApiError;

/// `GET /regions/{region}/totals`
pub async fn totals(
  State(handle): State<Arc<SnapshotHandle>>,
  Path(region): Path<String>,
) -> Result<Json<Vec<DailyTotals>>, ApiError> {
  Ok(Json(query::region_daily_totals(&handle.current(), &region)?))
}

/// `GET /regions/{region}/latest`
pub async fn latest(
  State(handle): State<Arc<SnapshotHandle>>,
  Path(region): Path<String>,
) -> Result<Json<RegionSnapshot>, ApiError> {
  Ok(Json(query::latest_snapshot(&handle.current(), &region)?))
}

/// `GET /regions/{region}/map`
pub async fn map(
  State(handle): State<Arc<SnapshotHandle>>,
  Path(region): Path<String>,
) -> Result<Json<RegionMap>, ApiError> {
  Ok(Json(query::region_map(&handle.current(), &region)?))
}

/// `GET /regions/{region}/coordinates`
pub async fn coordinates(
  State(handle): State<Arc<SnapshotHandle>>,
  Path(region): Path<String>,
) -> Result<Json<Option<Coordinates>>, ApiError> {
  Ok(Json(query::region_coordinates(&handle.current(), &region)?))
}

// ─── Metric series ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SeriesParams {
  pub metric: Option<String>,
  pub tail:   Option<String>,
}

impl SeriesParams {
  fn metric(&self) -> Result<Metric, ApiError> {
    match &self.metric {
      None => Ok(Metric::Confirmed),
      Some(m) => m.parse().map_err(ApiError::BadRequest),
    }
  }

  fn tail(&self) -> Result<Option<usize>, ApiError> {
    let Some(raw) = &self.tail else { return Ok(None) };
    match raw.parse::<usize>() {
      Ok(n) if n > 0 => Ok(Some(n)),
      _ => Err(ApiError::BadRequest(format!(
        "tail must be a positive integer, got {raw:?}"
      ))),
    }
  }
}

/// `GET /regions/{region}/new[?metric=<metric>]`
pub async fn new_cases(
  State(handle): State<Arc<SnapshotHandle>>,
  Path(region): Path<String>,
  Query(params): Query<SeriesParams>,
) -> Result<Json<NewCases>, ApiError> {
  let metric = params.metric()?;
  Ok(Json(query::new_cases(&handle.current(), &region, metric)?))
}

/// `GET /regions/{region}/daily[?metric=<metric>][&tail=<n>]`
pub async fn daily(
  State(handle): State<Arc<SnapshotHandle>>,
  Path(region): Path<String>,
  Query(params): Query<SeriesParams>,
) -> Result<Json<Vec<DailyCasePoint>>, ApiError> {
  let metric = params.metric()?;
  let tail = params.tail()?;
  Ok(Json(query::daily_cases(&handle.current(), &region, metric, tail)?))
}
