//! The defect status state machine.
//!
//! Only two transitions are system-enforced: an improvement submission moves
//! the owning defect to [`DefectStatus::PendingConfirmation`], and a
//! confirmation resolves it per [`Verdict::resolves_to`]. Every other
//! transition is caller-driven through a defect patch and is accepted
//! verbatim — the enum validates membership, not transition legality.

use serde::{Deserialize, Serialize};

use crate::followup::Verdict;

// ─── Status ──────────────────────────────────────────────────────────────────

/// The lifecycle status of a defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectStatus {
  /// Newly reported, or blocked behind an unresolved previous defect.
  Waiting,
  /// Repair work can proceed.
  Improving,
  /// An improvement has been submitted and awaits review.
  PendingConfirmation,
  /// A submitted improvement was accepted.
  Completed,
  /// The defect was returned/abandoned.
  Rejected,
}

impl DefectStatus {
  /// `Completed` and `Rejected` are terminal for the defect itself, but act
  /// as the unblocking trigger for its successors.
  pub fn is_resolved(self) -> bool {
    matches!(self, Self::Completed | Self::Rejected)
  }
}

// ─── Decision functions ──────────────────────────────────────────────────────

/// The status a newly created defect starts in.
///
/// An explicitly supplied status always wins. Otherwise the status is
/// inferred from the previous defect in the chain: a defect superseding a
/// resolved one is immediately actionable (`Improving`); one superseding a
/// still-open defect is blocked (`Waiting`). `predecessor` is `None` when no
/// previous defect was named, and also when the named one does not exist —
/// a dangling reference is treated the same as no reference.
pub fn initial_status(
  explicit: Option<DefectStatus>,
  predecessor: Option<DefectStatus>,
) -> DefectStatus {
  if let Some(status) = explicit {
    return status;
  }
  match predecessor {
    Some(prev) if prev.is_resolved() => DefectStatus::Improving,
    _ => DefectStatus::Waiting,
  }
}

/// Whether a caller-driven status change on a defect unblocks its direct
/// successors.
///
/// True only when the stored status actually changed and the new status is
/// resolved. The successors that advance are those still `Waiting`; they
/// move to `Improving`. Successors in any other state are left untouched —
/// propagation only unblocks, it never forces a state.
pub fn unblocks_successors(old: DefectStatus, new: DefectStatus) -> bool {
  old != new && new.is_resolved()
}

impl Verdict {
  /// The status a confirmation puts the owning defect in.
  pub fn resolves_to(self) -> DefectStatus {
    match self {
      Self::Accept => DefectStatus::Completed,
      Self::Reject => DefectStatus::Improving,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn explicit_status_wins_over_inference() {
    let status = initial_status(
      Some(DefectStatus::Completed),
      Some(DefectStatus::Waiting),
    );
    assert_eq!(status, DefectStatus::Completed);
  }

  #[test]
  fn no_predecessor_starts_waiting() {
    assert_eq!(initial_status(None, None), DefectStatus::Waiting);
  }

  #[test]
  fn resolved_predecessor_starts_improving() {
    for prev in [DefectStatus::Completed, DefectStatus::Rejected] {
      assert_eq!(initial_status(None, Some(prev)), DefectStatus::Improving);
    }
  }

  #[test]
  fn open_predecessor_starts_waiting() {
    for prev in [
      DefectStatus::Waiting,
      DefectStatus::Improving,
      DefectStatus::PendingConfirmation,
    ] {
      assert_eq!(initial_status(None, Some(prev)), DefectStatus::Waiting);
    }
  }

  #[test]
  fn unblocking_requires_a_change_to_a_resolved_status() {
    assert!(unblocks_successors(
      DefectStatus::PendingConfirmation,
      DefectStatus::Completed
    ));
    assert!(unblocks_successors(
      DefectStatus::Waiting,
      DefectStatus::Rejected
    ));
    // no change
    assert!(!unblocks_successors(
      DefectStatus::Completed,
      DefectStatus::Completed
    ));
    // not a resolved status
    assert!(!unblocks_successors(
      DefectStatus::Waiting,
      DefectStatus::Improving
    ));
  }

  #[test]
  fn verdicts_resolve_per_the_machine() {
    assert_eq!(Verdict::Accept.resolves_to(), DefectStatus::Completed);
    assert_eq!(Verdict::Reject.resolves_to(), DefectStatus::Improving);
  }
}
