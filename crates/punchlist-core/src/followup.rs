//! Improvement and confirmation records — the follow-up trail of a defect.
//!
//! A defect accumulates improvements (repair attempts over time); each
//! improvement may accumulate confirmations (reviewer judgements). Both are
//! append-only from the caller's point of view; their creation side effects
//! on the owning defect's status are the two system-enforced transitions of
//! the state machine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Improvement ─────────────────────────────────────────────────────────────

/// A submitted repair/remediation record against a defect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Improvement {
  pub improvement_id:   Uuid,
  pub defect_id:        Uuid,
  pub submitter_id:     Uuid,
  pub content:          String,
  /// The day the repair work was carried out, as reported by the vendor.
  pub improvement_date: NaiveDate,
  pub created_at:       DateTime<Utc>,
}

/// Input to [`crate::store::DefectStore::create_improvement`].
#[derive(Debug, Clone)]
pub struct NewImprovement {
  pub defect_id:        Uuid,
  pub submitter_id:     Uuid,
  pub content:          String,
  pub improvement_date: NaiveDate,
}

// ─── Confirmation ────────────────────────────────────────────────────────────

/// A reviewer's judgement on an improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
  Accept,
  Reject,
}

/// An accept/reject judgement recorded against an improvement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Confirmation {
  pub confirmation_id:   Uuid,
  pub improvement_id:    Uuid,
  pub confirmer_id:      Uuid,
  pub verdict:           Verdict,
  pub comment:           Option<String>,
  pub confirmation_date: NaiveDate,
  pub created_at:        DateTime<Utc>,
}

/// Input to [`crate::store::DefectStore::create_confirmation`].
#[derive(Debug, Clone)]
pub struct NewConfirmation {
  pub improvement_id:    Uuid,
  pub confirmer_id:      Uuid,
  pub verdict:           Verdict,
  pub comment:           Option<String>,
  pub confirmation_date: NaiveDate,
}
