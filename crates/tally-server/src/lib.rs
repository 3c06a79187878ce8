//! HTTP server for Tally.
//!
//! Wraps the query API from `tally-api` with operational routes and the
//! machinery that keeps the published snapshot fresh:
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/health` | Generation and load time of the current snapshot |
//! | `POST` | `/refresh` | Reload from the configured source now |
//! | `GET`  | `/api/…` | Query API |

pub mod error;
pub mod source;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Json, Router,
  extract::State,
  routing::{get, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tally_core::source::TableSource;
use tally_engine::{Snapshot, SnapshotHandle, query};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `TALLY_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  pub confirmed_path:        PathBuf,
  pub deaths_path:           PathBuf,
  pub recovered_path:        PathBuf,
  /// Seconds between automatic refreshes; `0` disables them.
  #[serde(default)]
  pub refresh_interval_secs: u64,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

impl ServerConfig {
  pub fn refresh_interval(&self) -> Option<Duration> {
    (self.refresh_interval_secs > 0)
      .then(|| Duration::from_secs(self.refresh_interval_secs))
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the server's own handlers.
pub struct AppState<S: TableSource> {
  pub handle: Arc<SnapshotHandle>,
  pub source: Arc<S>,
}

impl<S: TableSource> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { handle: self.handle.clone(), source: self.source.clone() }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: operational routes plus the query API
/// under `/api`, with request tracing.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: TableSource + 'static,
{
  let api = tally_api::api_router(state.handle.clone());
  Router::new()
    .route("/health", get(health::<S>))
    .route("/refresh", post(refresh::<S>))
    .with_state(state)
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

/// What a published snapshot contains, for operators.
#[derive(Debug, Serialize)]
pub struct SnapshotSummary {
  pub generation:   u64,
  pub loaded_at:    DateTime<Utc>,
  pub last_updated: Option<NaiveDate>,
  pub regions:      usize,
  pub locations:    usize,
  pub observations: usize,
}

impl SnapshotSummary {
  pub fn new(snapshot: &Snapshot) -> Self {
    Self {
      generation: snapshot.generation(),
      loaded_at: snapshot.loaded_at(),
      last_updated: query::last_updated(snapshot),
      regions: snapshot.index().regions().len(),
      locations: snapshot.set().locations().len(),
      observations: snapshot.set().len(),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct Health {
  pub status:   &'static str,
  pub snapshot: SnapshotSummary,
}

/// `GET /health`
async fn health<S: TableSource>(State(state): State<AppState<S>>) -> Json<Health> {
  Json(Health {
    status:   "ok",
    snapshot: SnapshotSummary::new(&state.handle.current()),
  })
}

/// `POST /refresh`
async fn refresh<S: TableSource>(
  State(state): State<AppState<S>>,
) -> Result<Json<SnapshotSummary>, Error> {
  let snapshot = state.handle.refresh(state.source.as_ref()).await?;
  Ok(Json(SnapshotSummary::new(&snapshot)))
}

// ─── Scheduled refresh ────────────────────────────────────────────────────────

/// Refresh from `state.source` every `every`, starting one period from now.
///
/// Failures are logged by [`SnapshotHandle::refresh`] and leave the current
/// snapshot published; the loop keeps going.
pub fn spawn_refresh_loop<S>(state: AppState<S>, every: Duration) -> JoinHandle<()>
where
  S: TableSource + 'static,
{
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
      ticker.tick().await;
      if let Ok(snapshot) = state.handle.refresh(state.source.as_ref()).await {
        tracing::debug!(generation = snapshot.generation(), "scheduled refresh done");
      }
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Mutex;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use serde_json::Value;
  use tally_core::table::RawTables;
  use tally_engine::load_tables;
  use tower::ServiceExt as _;

  const DATES: &str = "Province/State,Country/Region,Lat,Long,1/22/20,1/23/20\n";

  fn tables(confirmed_row: &str, deaths_row: &str) -> RawTables {
    RawTables {
      confirmed: tally_csv::parse_table(&format!("{DATES}{confirmed_row}\n")).unwrap(),
      deaths:    tally_csv::parse_table(&format!("{DATES}{deaths_row}\n")).unwrap(),
      recovered: tally_csv::parse_table(DATES).unwrap(),
    }
  }

  /// Serves whatever tables a test last put into it.
  struct MemorySource(Mutex<RawTables>);

  impl TableSource for MemorySource {
    type Error = std::io::Error;

    async fn fetch(&self) -> Result<RawTables, Self::Error> {
      Ok(self.0.lock().unwrap().clone())
    }
  }

  fn make_state() -> AppState<MemorySource> {
    let initial = tables(",Testland,0,0,0,1", ",Testland,0,0,0,0");
    let snapshot = load_tables(&initial).unwrap();
    AppState {
      handle: Arc::new(SnapshotHandle::new(snapshot)),
      source: Arc::new(MemorySource(Mutex::new(initial))),
    }
  }

  async fn send(state: AppState<MemorySource>, method: &str, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[tokio::test]
  async fn health_reports_current_snapshot() {
    let (status, body) = send(make_state(), "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["snapshot"]["generation"], 1);
    assert_eq!(body["snapshot"]["last_updated"], "2020-01-23");
    assert_eq!(body["snapshot"]["observations"], 2);
  }

  #[tokio::test]
  async fn api_is_nested() {
    let (status, body) = send(make_state(), "GET", "/api/regions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!(["Testland"]));
  }

  #[tokio::test]
  async fn refresh_publishes_source_changes() {
    let state = make_state();
    *state.source.0.lock().unwrap() = tables(",Testland,0,0,0,5", ",Testland,0,0,0,2");

    let (status, body) = send(state.clone(), "POST", "/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["generation"], 2);

    let (_, body) = send(state, "GET", "/api/totals").await;
    assert_eq!(body[1]["confirmed"], 5);
    assert_eq!(body[1]["active"], 3);
  }

  #[test]
  fn summary_describes_the_snapshot_it_was_given() {
    let state = make_state();
    let held = state.handle.current();
    state.handle.publish(load_tables(&tables(",Testland,0,0,0,5", ",Testland,0,0,0,2")).unwrap());

    assert_eq!(SnapshotSummary::new(&held).generation, 1);
    assert_eq!(SnapshotSummary::new(&state.handle.current()).generation, 2);
  }

  #[tokio::test]
  async fn failed_refresh_is_500_and_keeps_snapshot() {
    let state = make_state();
    // Deaths row for a location confirmed never mentions.
    *state.source.0.lock().unwrap() = tables(",Testland,0,0,0,5", ",Elsewhere,0,0,0,2");

    let (status, body) = send(state.clone(), "POST", "/refresh").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("load failed: "));

    assert_eq!(state.handle.generation(), 1);
    let (_, body) = send(state, "GET", "/api/totals").await;
    assert_eq!(body[1]["confirmed"], 1);
  }

  #[tokio::test]
  async fn refresh_loop_reloads_on_interval() {
    let state = make_state();
    let task = spawn_refresh_loop(state.clone(), Duration::from_millis(20));

    for _ in 0..250 {
      if state.handle.generation() >= 2 {
        break;
      }
      tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(state.handle.generation() >= 2);
    task.abort();
  }

  #[test]
  fn config_defaults() {
    let cfg: ServerConfig = serde_json::from_value(serde_json::json!({
      "confirmed_path": "c.csv",
      "deaths_path": "d.csv",
      "recovered_path": "r.csv",
    }))
    .unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.refresh_interval(), None);
  }
}
