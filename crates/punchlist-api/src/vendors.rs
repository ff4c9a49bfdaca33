//! Handlers for `/vendors` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/vendors` | |
//! | `POST` | `/vendors` | Body: [`NewVendorBody`] |
//! | `GET`  | `/vendors/:id` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use punchlist_core::{
  registry::{NewVendor, Vendor},
  store::DefectStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /vendors`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Vendor>>, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let vendors = store
    .list_vendors()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(vendors))
}

#[derive(Debug, Deserialize)]
pub struct NewVendorBody {
  pub vendor_name:      String,
  pub contact_person:   Option<String>,
  pub phone:            Option<String>,
  pub responsibilities: Option<String>,
  pub email:            Option<String>,
  pub line_id:          Option<String>,
}

/// `POST /vendors` — returns 201 + the stored [`Vendor`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewVendorBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let vendor = store
    .create_vendor(NewVendor {
      vendor_name:      body.vendor_name,
      contact_person:   body.contact_person,
      phone:            body.phone,
      responsibilities: body.responsibilities,
      email:            body.email,
      line_id:          body.line_id,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(vendor)))
}

/// `GET /vendors/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vendor>, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let vendor = store
    .get_vendor(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("vendor {id} not found")))?;
  Ok(Json(vendor))
}
