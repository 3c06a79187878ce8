//! Handlers for endpoints spanning every region.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/regions` | Region names in source order |
//! | `GET`  | `/totals` | Global daily totals, ascending by date |
//! | `GET`  | `/headline` | 422 with fewer than two dates |
//! | `GET`  | `/last-updated` | `{"date": null}` when empty |
//! | `GET`  | `/export.csv` | Long-form CSV of the whole snapshot |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::header,
  response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Serialize;
use tally_core::view::{DailyTotals, Headline};
use tally_engine::{SnapshotHandle, query};

use crate::error::ApiError;

/// `GET /regions`
pub async fn regions(State(handle): State<Arc<SnapshotHandle>>) -> Json<Vec<String>> {
  let snapshot = handle.current();
  Json(query::regions(&snapshot).into_iter().map(str::to_owned).collect())
}

/// `GET /totals`
pub async fn totals(State(handle): State<Arc<SnapshotHandle>>) -> Json<Vec<DailyTotals>> {
  Json(query::global_daily_totals(&handle.current()))
}

/// `GET /headline`
pub async fn headline(
  State(handle): State<Arc<SnapshotHandle>>,
) -> Result<Json<Headline>, ApiError> {
  Ok(Json(query::headline(&handle.current())?))
}

// ─── Last updated ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LastUpdated {
  pub date: Option<NaiveDate>,
}

/// `GET /last-updated`
pub async fn last_updated(State(handle): State<Arc<SnapshotHandle>>) -> Json<LastUpdated> {
  Json(LastUpdated { date: query::last_updated(&handle.current()) })
}

// ─── Export ───────────────────────────────────────────────────────────────────

/// `GET /export.csv`
pub async fn export(State(handle): State<Arc<SnapshotHandle>>) -> impl IntoResponse {
  let body = tally_csv::write_long(handle.current().set());
  ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body)
}
