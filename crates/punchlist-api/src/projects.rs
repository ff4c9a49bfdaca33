//! Handlers for `/projects` and `/base-maps` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/projects` | |
//! | `POST`   | `/projects` | Body: `{"project_name":"..."}` |
//! | `GET`    | `/projects/:id` | 404 if not found |
//! | `DELETE` | `/projects/:id` | 204; cascades to base maps and defects |
//! | `GET`    | `/projects/:id/base-maps` | |
//! | `POST`   | `/base-maps` | Body: [`NewBaseMapBody`] |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use punchlist_core::{
  attachment::{BaseMap, NewBaseMap},
  registry::{NewProject, Project},
  store::DefectStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /projects`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Project>>, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let projects = store
    .list_projects()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(projects))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub project_name: String,
}

/// `POST /projects` — body: `{"project_name":"..."}`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let project = store
    .create_project(NewProject {
      project_name: body.project_name,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(project)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /projects/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Project>, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let project = store
    .get_project(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("project {id} not found")))?;
  Ok(Json(project))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /projects/:id` — returns 204.
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  store
    .delete_project(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Base maps ────────────────────────────────────────────────────────────────

/// `GET /projects/:id/base-maps`
pub async fn list_base_maps<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<BaseMap>>, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let maps = store
    .list_base_maps(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(maps))
}

#[derive(Debug, Deserialize)]
pub struct NewBaseMapBody {
  pub project_id: Uuid,
  pub map_name:   String,
  pub file_path:  String,
}

/// `POST /base-maps` — returns 201 + the stored [`BaseMap`].
pub async fn create_base_map<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewBaseMapBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DefectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let map = store
    .create_base_map(NewBaseMap {
      project_id: body.project_id,
      map_name:   body.map_name,
      file_path:  body.file_path,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(map)))
}
