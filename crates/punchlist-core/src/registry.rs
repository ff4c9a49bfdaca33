//! Lookup entities: projects, vendors, defect categories, and users.
//!
//! These are the collaborators the lifecycle engine reads when validating
//! references; none of them carries lifecycle logic of its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Project ─────────────────────────────────────────────────────────────────

/// A construction project. Owns base maps and defects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
  pub project_id:   Uuid,
  pub project_name: String,
  /// Random public token, see [`crate::defect::Defect::unique_code`].
  pub unique_code:  String,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
  pub project_name: String,
}

// ─── Vendor ──────────────────────────────────────────────────────────────────

/// A contractor that defects are assigned to for repair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
  pub vendor_id:        Uuid,
  pub vendor_name:      String,
  pub contact_person:   Option<String>,
  pub phone:            Option<String>,
  pub responsibilities: Option<String>,
  pub email:            Option<String>,
  pub line_id:          Option<String>,
  /// Random public token used for unauthenticated vendor-side access.
  pub unique_code:      String,
}

#[derive(Debug, Clone)]
pub struct NewVendor {
  pub vendor_name:      String,
  pub contact_person:   Option<String>,
  pub phone:            Option<String>,
  pub responsibilities: Option<String>,
  pub email:            Option<String>,
  pub line_id:          Option<String>,
}

// ─── DefectCategory ──────────────────────────────────────────────────────────

/// A classification label for defects (e.g. waterproofing, electrical).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectCategory {
  pub defect_category_id: Uuid,
  pub category_name:      String,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
  pub category_name: String,
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A person who reports defects or confirms improvements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:      Uuid,
  pub name:         String,
  pub email:        Option<String>,
  pub line_id:      Option<String>,
  pub company_name: Option<String>,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:         String,
  pub email:        Option<String>,
  pub line_id:      Option<String>,
  pub company_name: Option<String>,
}
