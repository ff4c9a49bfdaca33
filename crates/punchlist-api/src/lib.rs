//! JSON REST API for Punchlist.
//!
//! Exposes an axum [`Router`] backed by any
//! [`punchlist_core::store::DefectStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", punchlist_api::api_router(store.clone()))
//! ```

pub mod attachments;
pub mod categories;
pub mod confirmations;
pub mod defects;
pub mod error;
pub mod improvements;
pub mod projects;
pub mod users;
pub mod vendors;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use punchlist_core::store::DefectStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: DefectStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Defects
    .route("/defects", get(defects::list::<S>).post(defects::create::<S>))
    .route(
      "/defects/{id}",
      get(defects::get_one::<S>)
        .put(defects::update_one::<S>)
        .delete(defects::delete_one::<S>),
    )
    .route("/defects/{id}/full", get(defects::get_full::<S>))
    .route("/defects/code/{code}", get(defects::get_by_code::<S>))
    // Improvements
    .route(
      "/improvements",
      get(improvements::list::<S>).post(improvements::create::<S>),
    )
    // Confirmations
    .route(
      "/confirmations",
      get(confirmations::list::<S>).post(confirmations::create::<S>),
    )
    // Projects and base maps
    .route("/projects", get(projects::list::<S>).post(projects::create::<S>))
    .route(
      "/projects/{id}",
      get(projects::get_one::<S>).delete(projects::delete_one::<S>),
    )
    .route("/projects/{id}/base-maps", get(projects::list_base_maps::<S>))
    .route("/base-maps", post(projects::create_base_map::<S>))
    // Vendors
    .route("/vendors", get(vendors::list::<S>).post(vendors::create::<S>))
    .route("/vendors/{id}", get(vendors::get_one::<S>))
    // Defect categories
    .route(
      "/categories",
      get(categories::list::<S>).post(categories::create::<S>),
    )
    .route("/categories/{id}", get(categories::get_one::<S>))
    // Users
    .route("/users", get(users::list::<S>).post(users::create::<S>))
    .route("/users/{id}", get(users::get_one::<S>))
    // Marks and photos
    .route("/defect-marks", post(attachments::create_mark::<S>))
    .route("/photos", post(attachments::create_photo::<S>))
    .with_state(store)
}
