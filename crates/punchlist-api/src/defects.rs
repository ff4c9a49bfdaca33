//! Handlers for `/defects` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/defects` | Optional filters, see [`ListParams`] |
//! | `POST`   | `/defects` | Body: [`NewDefectBody`]; returns 201 |
//! | `GET`    | `/defects/:id` | Joined detail view; 404 if not found |
//! | `GET`    | `/defects/:id/full` | Detail plus marks, photos, improvements |
//! | `PUT`    | `/defects/:id` | Body: partial [`DefectPatch`] |
//! | `DELETE` | `/defects/:id` | 204; cascades to owned rows |
//! | `GET`    | `/defects/code/:code` | Unauthenticated unique-code lookup |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use punchlist_core::{
  defect::{Defect, DefectPatch, DefectQuery, NewDefect},
  detail::{DefectDetail, DefectDetailFull},
  status::DefectStatus,
  store::DefectStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub project_id:         Option<Uuid>,
  pub submitted_id:       Option<Uuid>,
  pub defect_category_id: Option<Uuid>,
  pub assigned_vendor_id: Option<Uuid>,
  pub status:             Option<DefectStatus>,
  pub limit:              Option<usize>,
  pub offset:             Option<usize>,
}

/// `GET /defects[?project_id=...][&status=waiting][&limit=...]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Defect>>, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let query = DefectQuery {
    project_id:         params.project_id,
    submitted_id:       params.submitted_id,
    defect_category_id: params.defect_category_id,
    assigned_vendor_id: params.assigned_vendor_id,
    status:             params.status,
    limit:              params.limit,
    offset:             params.offset,
  };
  let defects = store
    .list_defects(&query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(defects))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /defects`.
#[derive(Debug, Deserialize)]
pub struct NewDefectBody {
  pub project_id:             Uuid,
  pub submitted_id:           Uuid,
  pub location:               String,
  pub defect_category_id:     Option<Uuid>,
  pub defect_description:     String,
  pub assigned_vendor_id:     Option<Uuid>,
  pub repair_description:     Option<String>,
  pub expected_completion_day: Option<NaiveDate>,
  pub responsible_vendor_id:  Option<Uuid>,
  pub previous_defect_id:     Option<Uuid>,
  /// Omit to let the store infer the initial status.
  pub status:                 Option<DefectStatus>,
  pub confirmer_id:           Option<Uuid>,
}

impl From<NewDefectBody> for NewDefect {
  fn from(b: NewDefectBody) -> Self {
    NewDefect {
      project_id:             b.project_id,
      submitted_id:           b.submitted_id,
      location:               b.location,
      defect_category_id:     b.defect_category_id,
      defect_description:     b.defect_description,
      assigned_vendor_id:     b.assigned_vendor_id,
      repair_description:     b.repair_description,
      expected_completion_day: b.expected_completion_day,
      responsible_vendor_id:  b.responsible_vendor_id,
      previous_defect_id:     b.previous_defect_id,
      status:                 b.status,
      confirmer_id:           b.confirmer_id,
    }
  }
}

/// `POST /defects` — returns 201 + the stored [`Defect`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewDefectBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let defect = store
    .create_defect(NewDefect::from(body))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(defect)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /defects/:id` — the joined detail view.
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<DefectDetail>, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let detail = store
    .get_defect_detail(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("defect {id} not found")))?;
  Ok(Json(detail))
}

/// `GET /defects/:id/full`
pub async fn get_full<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<DefectDetailFull>, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let full = store
    .get_defect_detail_full(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("defect {id} not found")))?;
  Ok(Json(full))
}

/// `GET /defects/code/:code` — lookup by public unique code.
pub async fn get_by_code<S>(
  State(store): State<Arc<S>>,
  Path(code): Path<String>,
) -> Result<Json<Defect>, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let defect = store
    .get_defect_by_unique_code(&code)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!("defect with code {code:?} not found"))
    })?;
  Ok(Json(defect))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /defects/:id` — body is a partial [`DefectPatch`].
pub async fn update_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(patch): Json<DefectPatch>,
) -> Result<Json<Defect>, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let defect = store
    .update_defect(id, patch)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(defect))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /defects/:id` — returns 204.
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  store
    .delete_defect(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(StatusCode::NO_CONTENT)
}
