//! Composed read models for defects — never stored, always derived.
//!
//! The detail composer joins a defect with the display names of its related
//! entities. It is a pure projection; no lifecycle logic runs here.

use serde::{Deserialize, Serialize};

use crate::{
  attachment::{DefectMark, Photo},
  defect::Defect,
  followup::Improvement,
};

/// A defect joined with the names of its related entities.
///
/// Name fields are `None` when the underlying reference is unset, or when
/// the referenced row has since been removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectDetail {
  pub defect:         Defect,
  pub project_name:   String,
  pub submitter_name: Option<String>,
  pub category_name:  Option<String>,
  pub vendor_name:    Option<String>,
  pub confirmer_name: Option<String>,
}

/// [`DefectDetail`] plus everything attached to the defect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectDetailFull {
  #[serde(flatten)]
  pub detail:       DefectDetail,
  pub defect_marks: Vec<DefectMark>,
  pub photos:       Vec<Photo>,
  pub improvements: Vec<Improvement>,
}
