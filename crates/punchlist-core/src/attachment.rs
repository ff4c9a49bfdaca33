//! Rows attached to projects and defects: base maps, marks, and photos.
//!
//! No binary data lives in the database — base maps and photos store a
//! path/URL only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── BaseMap ─────────────────────────────────────────────────────────────────

/// A floor plan or site drawing that defects are marked on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseMap {
  pub base_map_id: Uuid,
  pub project_id:  Uuid,
  pub map_name:    String,
  pub file_path:   String,
}

#[derive(Debug, Clone)]
pub struct NewBaseMap {
  pub project_id: Uuid,
  pub map_name:   String,
  pub file_path:  String,
}

// ─── DefectMark ──────────────────────────────────────────────────────────────

/// The position of a defect on a base map, in map coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectMark {
  pub defect_mark_id: Uuid,
  pub defect_id:      Uuid,
  pub base_map_id:    Uuid,
  pub coordinate_x:   f64,
  pub coordinate_y:   f64,
  pub scale:          f64,
}

#[derive(Debug, Clone)]
pub struct NewDefectMark {
  pub defect_id:    Uuid,
  pub base_map_id:  Uuid,
  pub coordinate_x: f64,
  pub coordinate_y: f64,
  pub scale:        f64,
}

// ─── Photo ───────────────────────────────────────────────────────────────────

/// Whether a photo documents the defect or the completed repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoType {
  Before,
  After,
}

/// A photo attached to a defect. The image itself lives in external storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
  pub photo_id:    Uuid,
  pub defect_id:   Uuid,
  pub description: Option<String>,
  pub photo_type:  PhotoType,
  pub image_url:   String,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPhoto {
  pub defect_id:   Uuid,
  pub description: Option<String>,
  pub photo_type:  PhotoType,
  pub image_url:   String,
}
