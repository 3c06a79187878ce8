//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use tally_core::LoadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("load failed: {0}")]
  Load(#[from] LoadError),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match self {
      Error::Load(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
