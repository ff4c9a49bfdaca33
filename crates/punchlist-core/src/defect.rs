//! Defect — the central entity of the tracker.
//!
//! A defect's `defect_id`, `unique_code`, `created_at`, and (absent an
//! explicit override) `status` are assigned by the store; they are never
//! accepted from callers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::DefectStatus;

// ─── Defect ──────────────────────────────────────────────────────────────────

/// A reported construction issue, tracked through the repair lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defect {
  pub defect_id:              Uuid,
  /// Random public token for unauthenticated lookup, distinct from the
  /// primary key. Globally unique across defects.
  pub unique_code:            String,
  pub project_id:             Uuid,
  /// The user who reported the defect.
  pub submitted_id:           Uuid,
  pub location:               String,
  pub defect_category_id:     Option<Uuid>,
  pub defect_description:     String,
  pub assigned_vendor_id:     Option<Uuid>,
  pub repair_description:     Option<String>,
  pub expected_completion_day: Option<NaiveDate>,
  pub responsible_vendor_id:  Option<Uuid>,
  /// The defect this one supersedes, if any. Successors of a defect are
  /// found by querying this field, never by an embedded graph.
  pub previous_defect_id:     Option<Uuid>,
  pub status:                 DefectStatus,
  pub confirmer_id:           Option<Uuid>,
  pub created_at:             DateTime<Utc>,
}

// ─── NewDefect ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::DefectStore::create_defect`].
#[derive(Debug, Clone)]
pub struct NewDefect {
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
  /// Explicit status override. When `None` the store infers the initial
  /// status via [`crate::status::initial_status`].
  pub status:                 Option<DefectStatus>,
  pub confirmer_id:           Option<Uuid>,
}

impl NewDefect {
  /// Convenience constructor with all optional fields unset.
  pub fn new(
    project_id: Uuid,
    submitted_id: Uuid,
    location: impl Into<String>,
    defect_description: impl Into<String>,
  ) -> Self {
    Self {
      project_id,
      submitted_id,
      location: location.into(),
      defect_category_id: None,
      defect_description: defect_description.into(),
      assigned_vendor_id: None,
      repair_description: None,
      expected_completion_day: None,
      responsible_vendor_id: None,
      previous_defect_id: None,
      status: None,
      confirmer_id: None,
    }
  }
}

// ─── DefectPatch ─────────────────────────────────────────────────────────────

/// Partial update applied by [`crate::store::DefectStore::update_defect`].
///
/// `None` means "leave unchanged"; a patch cannot clear an already-set
/// optional column. Setting `status` to a resolved state triggers successor
/// propagation as a side effect.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefectPatch {
  pub location:               Option<String>,
  pub defect_category_id:     Option<Uuid>,
  pub defect_description:     Option<String>,
  pub assigned_vendor_id:     Option<Uuid>,
  pub repair_description:     Option<String>,
  pub expected_completion_day: Option<NaiveDate>,
  pub responsible_vendor_id:  Option<Uuid>,
  pub previous_defect_id:     Option<Uuid>,
  pub status:                 Option<DefectStatus>,
  pub confirmer_id:           Option<Uuid>,
}

// ─── DefectQuery ─────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::DefectStore::list_defects`].
/// Results are ordered newest-first.
#[derive(Debug, Clone, Default)]
pub struct DefectQuery {
  pub project_id:         Option<Uuid>,
  pub submitted_id:       Option<Uuid>,
  pub defect_category_id: Option<Uuid>,
  pub assigned_vendor_id: Option<Uuid>,
  pub status:             Option<DefectStatus>,
  pub limit:              Option<usize>,
  pub offset:             Option<usize>,
}
