//! Handlers for `/categories` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use punchlist_core::{
  registry::{DefectCategory, NewCategory},
  store::DefectStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /categories`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<DefectCategory>>, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let categories = store
    .list_categories()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(categories))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub category_name: String,
}

/// `POST /categories` — body: `{"category_name":"..."}`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let category = store
    .create_category(NewCategory {
      category_name: body.category_name,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(category)))
}

/// `GET /categories/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<DefectCategory>, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let category = store
    .get_category(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("category {id} not found")))?;
  Ok(Json(category))
}
