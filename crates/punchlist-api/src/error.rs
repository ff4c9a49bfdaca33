//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      // A store failure caused by a missing referenced entity is a 404,
      // not a server fault.
      ApiError::Store(e) => match core_not_found(e.as_ref()) {
        Some(m) => (StatusCode::NOT_FOUND, m),
        None => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
      },
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

/// Walk the source chain looking for a core not-found error.
fn core_not_found(
  err: &(dyn std::error::Error + 'static),
) -> Option<String> {
  let mut current = Some(err);
  while let Some(e) = current {
    if let Some(core) = e.downcast_ref::<punchlist_core::Error>()
      && core.is_not_found()
    {
      return Some(core.to_string());
    }
    current = e.source();
  }
  None
}
