//! Handlers for `/users` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use punchlist_core::{
  registry::{NewUser, User},
  store::DefectStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /users`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let users = store
    .list_users()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(users))
}

#[derive(Debug, Deserialize)]
pub struct NewUserBody {
  pub name:         String,
  pub email:        Option<String>,
  pub line_id:      Option<String>,
  pub company_name: Option<String>,
}

/// `POST /users` — returns 201 + the stored [`User`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewUserBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let user = store
    .create_user(NewUser {
      name:         body.name,
      email:        body.email,
      line_id:      body.line_id,
      company_name: body.company_name,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /users/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let user = store
    .get_user(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  Ok(Json(user))
}
