//! Error types for `punchlist-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("defect not found: {0}")]
  DefectNotFound(Uuid),

  #[error("improvement not found: {0}")]
  ImprovementNotFound(Uuid),

  #[error("project not found: {0}")]
  ProjectNotFound(Uuid),

  #[error("vendor not found: {0}")]
  VendorNotFound(Uuid),

  #[error("defect category not found: {0}")]
  CategoryNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("base map not found: {0}")]
  BaseMapNotFound(Uuid),

  #[error("a defect cannot name itself as its previous defect")]
  SelfReference,

  #[error("could not generate a unique code after repeated collisions")]
  UniqueCodeExhausted,
}

impl Error {
  /// True for the variants that report a missing referenced entity.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::DefectNotFound(_)
        | Self::ImprovementNotFound(_)
        | Self::ProjectNotFound(_)
        | Self::VendorNotFound(_)
        | Self::CategoryNotFound(_)
        | Self::UserNotFound(_)
        | Self::BaseMapNotFound(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
