//! Handlers for `/defect-marks` and `/photos` endpoints.
//!
//! Marks and photos are created against an existing defect; the binary
//! content of a photo lives in external storage and only its URL is
//! recorded here.

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use punchlist_core::{
  attachment::{NewDefectMark, NewPhoto, PhotoType},
  store::DefectStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── Defect marks ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NewDefectMarkBody {
  pub defect_id:    Uuid,
  pub base_map_id:  Uuid,
  pub coordinate_x: f64,
  pub coordinate_y: f64,
  pub scale:        f64,
}

/// `POST /defect-marks` — returns 201 + the stored mark.
pub async fn create_mark<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewDefectMarkBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let mark = store
    .create_defect_mark(NewDefectMark {
      defect_id:    body.defect_id,
      base_map_id:  body.base_map_id,
      coordinate_x: body.coordinate_x,
      coordinate_y: body.coordinate_y,
      scale:        body.scale,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(mark)))
}

// ─── Photos ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NewPhotoBody {
  pub defect_id:   Uuid,
  pub description: Option<String>,
  pub photo_type:  PhotoType,
  pub image_url:   String,
}

/// `POST /photos` — returns 201 + the stored photo row.
pub async fn create_photo<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewPhotoBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let photo = store
    .create_photo(NewPhoto {
      defect_id:   body.defect_id,
      description: body.description,
      photo_type:  body.photo_type,
      image_url:   body.image_url,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(photo)))
}
