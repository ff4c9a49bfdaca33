//! Handlers for `/improvements` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/improvements` | `?defect_id=` required |
//! | `POST` | `/improvements` | Body: [`NewImprovementBody`]; returns 201. Moves the owning defect to `pending_confirmation`. |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use punchlist_core::{
  followup::{Improvement, NewImprovement},
  store::DefectStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub defect_id: Uuid,
}

/// `GET /improvements?defect_id=<id>`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Improvement>>, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let improvements = store
    .list_improvements(params.defect_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(improvements))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NewImprovementBody {
  pub defect_id:        Uuid,
  pub submitter_id:     Uuid,
  pub content:          String,
  pub improvement_date: NaiveDate,
}

impl From<NewImprovementBody> for NewImprovement {
  fn from(b: NewImprovementBody) -> Self {
    NewImprovement {
      defect_id:        b.defect_id,
      submitter_id:     b.submitter_id,
      content:          b.content,
      improvement_date: b.improvement_date,
    }
  }
}

/// `POST /improvements` — returns 201 + the stored [`Improvement`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewImprovementBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let improvement = store
    .create_improvement(NewImprovement::from(body))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(improvement)))
}
