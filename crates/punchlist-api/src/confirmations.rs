//! Handlers for `/confirmations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/confirmations` | `?improvement_id=` required |
//! | `POST` | `/confirmations` | Body: [`NewConfirmationBody`]; returns 201. Resolves the owning defect per the verdict. |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use punchlist_core::{
  followup::{Confirmation, NewConfirmation, Verdict},
  store::DefectStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub improvement_id: Uuid,
}

/// `GET /confirmations?improvement_id=<id>`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Confirmation>>, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let confirmations = store
    .list_confirmations(params.improvement_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(confirmations))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NewConfirmationBody {
  pub improvement_id:    Uuid,
  pub confirmer_id:      Uuid,
  pub verdict:           Verdict,
  pub comment:           Option<String>,
  pub confirmation_date: NaiveDate,
}

impl From<NewConfirmationBody> for NewConfirmation {
  fn from(b: NewConfirmationBody) -> Self {
    NewConfirmation {
      improvement_id:    b.improvement_id,
      confirmer_id:      b.confirmer_id,
      verdict:           b.verdict,
      comment:           b.comment,
      confirmation_date: b.confirmation_date,
    }
  }
}

/// `POST /confirmations` — returns 201 + the stored [`Confirmation`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewConfirmationBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let confirmation = store
    .create_confirmation(NewConfirmation::from(body))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(confirmation)))
}
