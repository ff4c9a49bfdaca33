//! The `DefectStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `punchlist-store-sqlite`). Higher layers (`punchlist-api`,
//! `punchlist-server`) depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  attachment::{BaseMap, DefectMark, NewBaseMap, NewDefectMark, NewPhoto, Photo},
  defect::{Defect, DefectPatch, DefectQuery, NewDefect},
  detail::{DefectDetail, DefectDetailFull},
  followup::{Confirmation, Improvement, NewConfirmation, NewImprovement},
  registry::{
    DefectCategory, NewCategory, NewProject, NewUser, NewVendor, Project,
    User, Vendor,
  },
};

/// Abstraction over a Punchlist entity store backend.
///
/// The lifecycle side effects — creation-time status inference, the
/// improvement and confirmation transitions, and successor propagation —
/// are part of this contract: an implementation must apply them atomically
/// with the write that triggers them.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DefectStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Projects ──────────────────────────────────────────────────────────

  /// Create a project with a freshly generated unique code.
  fn create_project(
    &self,
    input: NewProject,
  ) -> impl Future<Output = Result<Project, Self::Error>> + Send + '_;

  /// Retrieve a project by id. Returns `None` if not found.
  fn get_project(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Project>, Self::Error>> + Send + '_;

  fn list_projects(
    &self,
  ) -> impl Future<Output = Result<Vec<Project>, Self::Error>> + Send + '_;

  /// Delete a project and everything it owns: base maps, defects, and the
  /// defects' marks, photos, improvements, and confirmations.
  fn delete_project(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Vendors ───────────────────────────────────────────────────────────

  /// Create a vendor with a freshly generated unique code.
  fn create_vendor(
    &self,
    input: NewVendor,
  ) -> impl Future<Output = Result<Vendor, Self::Error>> + Send + '_;

  fn get_vendor(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Vendor>, Self::Error>> + Send + '_;

  fn list_vendors(
    &self,
  ) -> impl Future<Output = Result<Vec<Vendor>, Self::Error>> + Send + '_;

  // ── Defect categories ─────────────────────────────────────────────────

  fn create_category(
    &self,
    input: NewCategory,
  ) -> impl Future<Output = Result<DefectCategory, Self::Error>> + Send + '_;

  fn get_category(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DefectCategory>, Self::Error>>
  + Send
  + '_;

  fn list_categories(
    &self,
  ) -> impl Future<Output = Result<Vec<DefectCategory>, Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  // ── Base maps ─────────────────────────────────────────────────────────

  /// Create a base map under an existing project.
  fn create_base_map(
    &self,
    input: NewBaseMap,
  ) -> impl Future<Output = Result<BaseMap, Self::Error>> + Send + '_;

  fn list_base_maps(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Vec<BaseMap>, Self::Error>> + Send + '_;

  // ── Defects ───────────────────────────────────────────────────────────

  /// Create a defect. Referenced project, submitter, and (when provided)
  /// category and vendors must exist. The stored status is the explicit one
  /// when given, otherwise inferred from the previous defect's state via
  /// [`crate::status::initial_status`].
  fn create_defect(
    &self,
    input: NewDefect,
  ) -> impl Future<Output = Result<Defect, Self::Error>> + Send + '_;

  fn get_defect(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Defect>, Self::Error>> + Send + '_;

  /// Unauthenticated lookup path: resolve a defect by its public token.
  fn get_defect_by_unique_code<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Option<Defect>, Self::Error>> + Send + 'a;

  /// List defects matching `query`, newest first.
  fn list_defects<'a>(
    &'a self,
    query: &'a DefectQuery,
  ) -> impl Future<Output = Result<Vec<Defect>, Self::Error>> + Send + 'a;

  /// Apply a partial patch to a defect. When the patch moves the stored
  /// status to a resolved state, direct successors still `Waiting` advance
  /// to `Improving` within the same transaction.
  fn update_defect(
    &self,
    id: Uuid,
    patch: DefectPatch,
  ) -> impl Future<Output = Result<Defect, Self::Error>> + Send + '_;

  /// Delete a defect and its marks, photos, improvements, and
  /// confirmations. Successors keep existing; their `previous_defect_id`
  /// is cleared.
  fn delete_defect(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Marks and photos ──────────────────────────────────────────────────

  fn create_defect_mark(
    &self,
    input: NewDefectMark,
  ) -> impl Future<Output = Result<DefectMark, Self::Error>> + Send + '_;

  fn create_photo(
    &self,
    input: NewPhoto,
  ) -> impl Future<Output = Result<Photo, Self::Error>> + Send + '_;

  // ── Improvements ──────────────────────────────────────────────────────

  /// Record an improvement and move the owning defect to
  /// `PendingConfirmation` in the same transaction.
  fn create_improvement(
    &self,
    input: NewImprovement,
  ) -> impl Future<Output = Result<Improvement, Self::Error>> + Send + '_;

  /// All improvements for a defect, newest first.
  fn list_improvements(
    &self,
    defect_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Improvement>, Self::Error>> + Send + '_;

  // ── Confirmations ─────────────────────────────────────────────────────

  /// Record a confirmation and resolve the owning defect's status per the
  /// verdict in the same transaction.
  fn create_confirmation(
    &self,
    input: NewConfirmation,
  ) -> impl Future<Output = Result<Confirmation, Self::Error>> + Send + '_;

  /// All confirmations for an improvement, newest first.
  fn list_confirmations(
    &self,
    improvement_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Confirmation>, Self::Error>> + Send + '_;

  // ── Composed reads ────────────────────────────────────────────────────

  /// Materialise a [`DefectDetail`] — the joined read model for a defect.
  /// Returns `None` if the defect does not exist.
  fn get_defect_detail(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DefectDetail>, Self::Error>>
  + Send
  + '_;

  /// [`Self::get_defect_detail`] plus marks, photos, and improvements.
  fn get_defect_detail_full(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DefectDetailFull>, Self::Error>>
  + Send
  + '_;
}
