//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use tally_core::QueryError;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The region exists but has too little history for the query.
  #[error("{0}")]
  Unprocessable(String),
}

impl From<QueryError> for ApiError {
  fn from(e: QueryError) -> Self {
    match e {
      QueryError::UnknownRegion(_) => ApiError::NotFound(e.to_string()),
      QueryError::InsufficientHistory { .. } => ApiError::Unprocessable(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
