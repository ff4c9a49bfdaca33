//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use punchlist_core::{
  attachment::{NewBaseMap, NewDefectMark, NewPhoto, PhotoType},
  defect::{DefectPatch, DefectQuery, NewDefect},
  followup::{NewConfirmation, NewImprovement, Verdict},
  registry::{NewCategory, NewProject, NewUser, NewVendor, Project, User},
  status::DefectStatus,
  store::DefectStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// A project and a submitter — the minimum referenced entities a defect
/// needs.
async fn seed(s: &SqliteStore) -> (Project, User) {
  let project = s
    .create_project(NewProject {
      project_name: "Riverside Tower".into(),
    })
    .await
    .unwrap();
  let user = s
    .create_user(NewUser {
      name:         "Chen Wei".into(),
      email:        Some("chen@example.com".into()),
      line_id:      None,
      company_name: None,
    })
    .await
    .unwrap();
  (project, user)
}

fn defect_input(project: &Project, user: &User) -> NewDefect {
  NewDefect::new(
    project.project_id,
    user.user_id,
    "B1 parking, column 14",
    "Hairline crack in column finish",
  )
}

fn day(s: &str) -> NaiveDate { s.parse().expect("date literal") }

fn improvement_input(
  defect_id: Uuid,
  submitter_id: Uuid,
) -> NewImprovement {
  NewImprovement {
    defect_id,
    submitter_id,
    content: "Ground out and refilled the crack".into(),
    improvement_date: day("2024-05-01"),
  }
}

fn confirmation_input(
  improvement_id: Uuid,
  confirmer_id: Uuid,
  verdict: Verdict,
) -> NewConfirmation {
  NewConfirmation {
    improvement_id,
    confirmer_id,
    verdict,
    comment: None,
    confirmation_date: day("2024-05-03"),
  }
}

// ─── Unique codes ────────────────────────────────────────────────────────────

#[tokio::test]
async fn unique_codes_are_nonempty_and_pairwise_distinct() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let mut codes = vec![project.unique_code.clone()];
  for name in ["North Annex", "South Annex"] {
    let p = s
      .create_project(NewProject {
        project_name: name.into(),
      })
      .await
      .unwrap();
    codes.push(p.unique_code);
  }
  for name in ["Hsin Cheng Waterproofing", "Da An Electrical"] {
    let v = s
      .create_vendor(NewVendor {
        vendor_name:      name.into(),
        contact_person:   None,
        phone:            None,
        responsibilities: None,
        email:            None,
        line_id:          None,
      })
      .await
      .unwrap();
    codes.push(v.unique_code);
  }
  for _ in 0..3 {
    let d = s.create_defect(defect_input(&project, &user)).await.unwrap();
    codes.push(d.unique_code);
  }

  assert!(codes.iter().all(|c| !c.is_empty()));
  let mut deduped = codes.clone();
  deduped.sort();
  deduped.dedup();
  assert_eq!(deduped.len(), codes.len());
}

#[tokio::test]
async fn get_defect_by_unique_code_roundtrip() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let defect = s.create_defect(defect_input(&project, &user)).await.unwrap();

  let fetched = s
    .get_defect_by_unique_code(&defect.unique_code)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(fetched.defect_id, defect.defect_id);

  let missing = s.get_defect_by_unique_code("no-such-code").await.unwrap();
  assert!(missing.is_none());
}

// ─── Creation-time status inference ──────────────────────────────────────────

#[tokio::test]
async fn defect_without_predecessor_starts_waiting() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let defect = s.create_defect(defect_input(&project, &user)).await.unwrap();
  assert_eq!(defect.status, DefectStatus::Waiting);

  let stored = s.get_defect(defect.defect_id).await.unwrap().unwrap();
  assert_eq!(stored.status, DefectStatus::Waiting);
}

#[tokio::test]
async fn defect_with_resolved_predecessor_starts_improving() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  for resolved in [DefectStatus::Completed, DefectStatus::Rejected] {
    let mut prev_input = defect_input(&project, &user);
    prev_input.status = Some(resolved);
    let prev = s.create_defect(prev_input).await.unwrap();

    let mut input = defect_input(&project, &user);
    input.previous_defect_id = Some(prev.defect_id);
    let successor = s.create_defect(input).await.unwrap();

    assert_eq!(successor.status, DefectStatus::Improving);
  }
}

#[tokio::test]
async fn defect_with_open_predecessor_starts_waiting() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let prev = s.create_defect(defect_input(&project, &user)).await.unwrap();
  assert_eq!(prev.status, DefectStatus::Waiting);

  let mut input = defect_input(&project, &user);
  input.previous_defect_id = Some(prev.defect_id);
  let successor = s.create_defect(input).await.unwrap();

  assert_eq!(successor.status, DefectStatus::Waiting);
}

#[tokio::test]
async fn dangling_predecessor_reads_as_no_predecessor() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let mut input = defect_input(&project, &user);
  input.previous_defect_id = Some(Uuid::new_v4());
  let defect = s.create_defect(input).await.unwrap();

  assert_eq!(defect.status, DefectStatus::Waiting);
}

#[tokio::test]
async fn explicit_status_overrides_inference() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let mut input = defect_input(&project, &user);
  input.status = Some(DefectStatus::Improving);
  let defect = s.create_defect(input).await.unwrap();

  assert_eq!(defect.status, DefectStatus::Improving);
}

#[tokio::test]
async fn create_defect_with_unknown_references_errors() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let mut input = defect_input(&project, &user);
  input.project_id = Uuid::new_v4();
  let err = s.create_defect(input).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(punchlist_core::Error::ProjectNotFound(_))
  ));

  let mut input = defect_input(&project, &user);
  input.submitted_id = Uuid::new_v4();
  let err = s.create_defect(input).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(punchlist_core::Error::UserNotFound(_))
  ));

  let mut input = defect_input(&project, &user);
  input.defect_category_id = Some(Uuid::new_v4());
  let err = s.create_defect(input).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(punchlist_core::Error::CategoryNotFound(_))
  ));

  let mut input = defect_input(&project, &user);
  input.assigned_vendor_id = Some(Uuid::new_v4());
  let err = s.create_defect(input).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(punchlist_core::Error::VendorNotFound(_))
  ));
}

// ─── Improvement side effect ─────────────────────────────────────────────────

#[tokio::test]
async fn improvement_moves_defect_to_pending_confirmation() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  // The transition applies from any starting state.
  for start in [
    DefectStatus::Waiting,
    DefectStatus::Improving,
    DefectStatus::Completed,
  ] {
    let mut input = defect_input(&project, &user);
    input.status = Some(start);
    let defect = s.create_defect(input).await.unwrap();

    s.create_improvement(improvement_input(defect.defect_id, user.user_id))
      .await
      .unwrap();

    let stored = s.get_defect(defect.defect_id).await.unwrap().unwrap();
    assert_eq!(stored.status, DefectStatus::PendingConfirmation);
  }
}

#[tokio::test]
async fn improvement_against_unknown_defect_errors() {
  let s = store().await;
  let (_, user) = seed(&s).await;

  let err = s
    .create_improvement(improvement_input(Uuid::new_v4(), user.user_id))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(punchlist_core::Error::DefectNotFound(_))
  ));
}

// ─── Confirmation side effect ────────────────────────────────────────────────

#[tokio::test]
async fn accepting_confirmation_completes_the_defect() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let defect = s.create_defect(defect_input(&project, &user)).await.unwrap();
  let improvement = s
    .create_improvement(improvement_input(defect.defect_id, user.user_id))
    .await
    .unwrap();

  s.create_confirmation(confirmation_input(
    improvement.improvement_id,
    user.user_id,
    Verdict::Accept,
  ))
  .await
  .unwrap();

  let stored = s.get_defect(defect.defect_id).await.unwrap().unwrap();
  assert_eq!(stored.status, DefectStatus::Completed);
}

#[tokio::test]
async fn rejecting_confirmation_returns_defect_to_improving() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let defect = s.create_defect(defect_input(&project, &user)).await.unwrap();
  let improvement = s
    .create_improvement(improvement_input(defect.defect_id, user.user_id))
    .await
    .unwrap();

  s.create_confirmation(confirmation_input(
    improvement.improvement_id,
    user.user_id,
    Verdict::Reject,
  ))
  .await
  .unwrap();

  let stored = s.get_defect(defect.defect_id).await.unwrap().unwrap();
  assert_eq!(stored.status, DefectStatus::Improving);
}

#[tokio::test]
async fn confirmation_against_unknown_improvement_errors() {
  let s = store().await;
  let (_, user) = seed(&s).await;

  let err = s
    .create_confirmation(confirmation_input(
      Uuid::new_v4(),
      user.user_id,
      Verdict::Accept,
    ))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(punchlist_core::Error::ImprovementNotFound(_))
  ));
}

// ─── Successor propagation ───────────────────────────────────────────────────

#[tokio::test]
async fn resolving_a_predecessor_advances_waiting_successors() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  for resolved in [DefectStatus::Completed, DefectStatus::Rejected] {
    let prev = s.create_defect(defect_input(&project, &user)).await.unwrap();

    let mut input = defect_input(&project, &user);
    input.previous_defect_id = Some(prev.defect_id);
    input.status = Some(DefectStatus::Waiting);
    let successor = s.create_defect(input).await.unwrap();

    s.update_defect(prev.defect_id, DefectPatch {
      status: Some(resolved),
      ..Default::default()
    })
    .await
    .unwrap();

    let stored = s.get_defect(successor.defect_id).await.unwrap().unwrap();
    assert_eq!(stored.status, DefectStatus::Improving);
  }
}

#[tokio::test]
async fn propagation_leaves_non_waiting_successors_alone() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let prev = s.create_defect(defect_input(&project, &user)).await.unwrap();

  let mut input = defect_input(&project, &user);
  input.previous_defect_id = Some(prev.defect_id);
  input.status = Some(DefectStatus::PendingConfirmation);
  let successor = s.create_defect(input).await.unwrap();

  s.update_defect(prev.defect_id, DefectPatch {
    status: Some(DefectStatus::Completed),
    ..Default::default()
  })
  .await
  .unwrap();

  let stored = s.get_defect(successor.defect_id).await.unwrap().unwrap();
  assert_eq!(stored.status, DefectStatus::PendingConfirmation);
}

#[tokio::test]
async fn unchanged_status_does_not_propagate() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let mut prev_input = defect_input(&project, &user);
  prev_input.status = Some(DefectStatus::Completed);
  let prev = s.create_defect(prev_input).await.unwrap();

  let mut input = defect_input(&project, &user);
  input.previous_defect_id = Some(prev.defect_id);
  input.status = Some(DefectStatus::Waiting);
  let successor = s.create_defect(input).await.unwrap();

  // Re-asserting the same resolved status is a no-op for successors.
  s.update_defect(prev.defect_id, DefectPatch {
    status: Some(DefectStatus::Completed),
    ..Default::default()
  })
  .await
  .unwrap();

  let stored = s.get_defect(successor.defect_id).await.unwrap().unwrap();
  assert_eq!(stored.status, DefectStatus::Waiting);
}

#[tokio::test]
async fn non_resolved_update_does_not_propagate() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let prev = s.create_defect(defect_input(&project, &user)).await.unwrap();

  let mut input = defect_input(&project, &user);
  input.previous_defect_id = Some(prev.defect_id);
  input.status = Some(DefectStatus::Waiting);
  let successor = s.create_defect(input).await.unwrap();

  s.update_defect(prev.defect_id, DefectPatch {
    status: Some(DefectStatus::Improving),
    ..Default::default()
  })
  .await
  .unwrap();

  let stored = s.get_defect(successor.defect_id).await.unwrap().unwrap();
  assert_eq!(stored.status, DefectStatus::Waiting);
}

#[tokio::test]
async fn propagation_is_single_hop() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let a = s.create_defect(defect_input(&project, &user)).await.unwrap();

  let mut b_input = defect_input(&project, &user);
  b_input.previous_defect_id = Some(a.defect_id);
  let b = s.create_defect(b_input).await.unwrap();

  let mut c_input = defect_input(&project, &user);
  c_input.previous_defect_id = Some(b.defect_id);
  let c = s.create_defect(c_input).await.unwrap();

  s.update_defect(a.defect_id, DefectPatch {
    status: Some(DefectStatus::Completed),
    ..Default::default()
  })
  .await
  .unwrap();

  // B advanced, but B itself did not resolve, so C stays blocked.
  let b_stored = s.get_defect(b.defect_id).await.unwrap().unwrap();
  let c_stored = s.get_defect(c.defect_id).await.unwrap().unwrap();
  assert_eq!(b_stored.status, DefectStatus::Improving);
  assert_eq!(c_stored.status, DefectStatus::Waiting);
}

#[tokio::test]
async fn confirmation_resolution_does_not_advance_successors() {
  // Only the explicit update path propagates; resolving a predecessor
  // through an accepted improvement leaves its successors untouched.
  let s = store().await;
  let (project, user) = seed(&s).await;

  let prev = s.create_defect(defect_input(&project, &user)).await.unwrap();

  let mut input = defect_input(&project, &user);
  input.previous_defect_id = Some(prev.defect_id);
  input.status = Some(DefectStatus::Waiting);
  let successor = s.create_defect(input).await.unwrap();

  let improvement = s
    .create_improvement(improvement_input(prev.defect_id, user.user_id))
    .await
    .unwrap();
  s.create_confirmation(confirmation_input(
    improvement.improvement_id,
    user.user_id,
    Verdict::Accept,
  ))
  .await
  .unwrap();

  let prev_stored = s.get_defect(prev.defect_id).await.unwrap().unwrap();
  assert_eq!(prev_stored.status, DefectStatus::Completed);

  let stored = s.get_defect(successor.defect_id).await.unwrap().unwrap();
  assert_eq!(stored.status, DefectStatus::Waiting);
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_patches_only_the_given_fields() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let defect = s.create_defect(defect_input(&project, &user)).await.unwrap();

  let updated = s
    .update_defect(defect.defect_id, DefectPatch {
      repair_description: Some("Repaint after curing".into()),
      expected_completion_day: Some(day("2024-06-15")),
      ..Default::default()
    })
    .await
    .unwrap();

  assert_eq!(updated.repair_description.as_deref(), Some("Repaint after curing"));
  assert_eq!(updated.expected_completion_day, Some(day("2024-06-15")));
  // untouched fields survive
  assert_eq!(updated.location, defect.location);
  assert_eq!(updated.status, defect.status);
  assert_eq!(updated.unique_code, defect.unique_code);
}

#[tokio::test]
async fn update_unknown_defect_errors() {
  let s = store().await;
  seed(&s).await;

  let err = s
    .update_defect(Uuid::new_v4(), DefectPatch::default())
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(punchlist_core::Error::DefectNotFound(_))
  ));
}

#[tokio::test]
async fn update_rejects_self_reference() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let defect = s.create_defect(defect_input(&project, &user)).await.unwrap();

  let err = s
    .update_defect(defect.defect_id, DefectPatch {
      previous_defect_id: Some(defect.defect_id),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(punchlist_core::Error::SelfReference)
  ));
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_defects_filters_by_project_and_status() {
  let s = store().await;
  let (project, user) = seed(&s).await;
  let other = s
    .create_project(NewProject {
      project_name: "East Wing".into(),
    })
    .await
    .unwrap();

  s.create_defect(defect_input(&project, &user)).await.unwrap();
  s.create_defect(defect_input(&project, &user)).await.unwrap();
  let mut input = defect_input(&other, &user);
  input.status = Some(DefectStatus::Improving);
  s.create_defect(input).await.unwrap();

  let in_project = s
    .list_defects(&DefectQuery {
      project_id: Some(project.project_id),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(in_project.len(), 2);
  assert!(in_project.iter().all(|d| d.project_id == project.project_id));

  let improving = s
    .list_defects(&DefectQuery {
      status: Some(DefectStatus::Improving),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(improving.len(), 1);
  assert_eq!(improving[0].project_id, other.project_id);

  let all = s.list_defects(&DefectQuery::default()).await.unwrap();
  assert_eq!(all.len(), 3);
}

// ─── Deletes ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_defect_cascades_and_unlinks_successors() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let defect = s.create_defect(defect_input(&project, &user)).await.unwrap();
  let improvement = s
    .create_improvement(improvement_input(defect.defect_id, user.user_id))
    .await
    .unwrap();
  s.create_confirmation(confirmation_input(
    improvement.improvement_id,
    user.user_id,
    Verdict::Reject,
  ))
  .await
  .unwrap();
  s.create_photo(NewPhoto {
    defect_id:   defect.defect_id,
    description: None,
    photo_type:  PhotoType::Before,
    image_url:   "https://img.example.com/crack.jpg".into(),
  })
  .await
  .unwrap();

  let mut succ_input = defect_input(&project, &user);
  succ_input.previous_defect_id = Some(defect.defect_id);
  let successor = s.create_defect(succ_input).await.unwrap();

  s.delete_defect(defect.defect_id).await.unwrap();

  assert!(s.get_defect(defect.defect_id).await.unwrap().is_none());
  assert!(
    s.list_improvements(defect.defect_id)
      .await
      .unwrap()
      .is_empty()
  );

  let stored = s.get_defect(successor.defect_id).await.unwrap().unwrap();
  assert!(stored.previous_defect_id.is_none());
}

#[tokio::test]
async fn delete_unknown_defect_errors() {
  let s = store().await;

  let err = s.delete_defect(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(punchlist_core::Error::DefectNotFound(_))
  ));
}

#[tokio::test]
async fn delete_project_takes_its_defects_along() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let defect = s.create_defect(defect_input(&project, &user)).await.unwrap();
  s.create_improvement(improvement_input(defect.defect_id, user.user_id))
    .await
    .unwrap();

  s.delete_project(project.project_id).await.unwrap();

  assert!(s.get_project(project.project_id).await.unwrap().is_none());
  assert!(s.get_defect(defect.defect_id).await.unwrap().is_none());
}

// ─── Attachments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn base_map_requires_existing_project() {
  let s = store().await;

  let err = s
    .create_base_map(NewBaseMap {
      project_id: Uuid::new_v4(),
      map_name:   "3F plan".into(),
      file_path:  "maps/3f.png".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(punchlist_core::Error::ProjectNotFound(_))
  ));
}

#[tokio::test]
async fn defect_mark_requires_existing_base_map() {
  let s = store().await;
  let (project, user) = seed(&s).await;
  let defect = s.create_defect(defect_input(&project, &user)).await.unwrap();

  let err = s
    .create_defect_mark(NewDefectMark {
      defect_id:    defect.defect_id,
      base_map_id:  Uuid::new_v4(),
      coordinate_x: 0.41,
      coordinate_y: 0.77,
      scale:        1.0,
    })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(punchlist_core::Error::BaseMapNotFound(_))
  ));
}

// ─── Detail composition ──────────────────────────────────────────────────────

#[tokio::test]
async fn detail_joins_related_names() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let category = s
    .create_category(NewCategory {
      category_name: "Waterproofing".into(),
    })
    .await
    .unwrap();
  let vendor = s
    .create_vendor(NewVendor {
      vendor_name:      "Hsin Cheng Waterproofing".into(),
      contact_person:   Some("Lin".into()),
      phone:            None,
      responsibilities: None,
      email:            None,
      line_id:          None,
    })
    .await
    .unwrap();

  let mut input = defect_input(&project, &user);
  input.defect_category_id = Some(category.defect_category_id);
  input.assigned_vendor_id = Some(vendor.vendor_id);
  let defect = s.create_defect(input).await.unwrap();

  let detail = s
    .get_defect_detail(defect.defect_id)
    .await
    .unwrap()
    .unwrap();

  assert_eq!(detail.project_name, "Riverside Tower");
  assert_eq!(detail.submitter_name.as_deref(), Some("Chen Wei"));
  assert_eq!(detail.category_name.as_deref(), Some("Waterproofing"));
  assert_eq!(
    detail.vendor_name.as_deref(),
    Some("Hsin Cheng Waterproofing")
  );
  assert!(detail.confirmer_name.is_none());
}

#[tokio::test]
async fn detail_of_unknown_defect_is_none() {
  let s = store().await;
  let detail = s.get_defect_detail(Uuid::new_v4()).await.unwrap();
  assert!(detail.is_none());
}

#[tokio::test]
async fn full_detail_includes_marks_photos_and_improvements() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  let base_map = s
    .create_base_map(NewBaseMap {
      project_id: project.project_id,
      map_name:   "B1 plan".into(),
      file_path:  "maps/b1.png".into(),
    })
    .await
    .unwrap();
  let defect = s.create_defect(defect_input(&project, &user)).await.unwrap();

  s.create_defect_mark(NewDefectMark {
    defect_id:    defect.defect_id,
    base_map_id:  base_map.base_map_id,
    coordinate_x: 0.32,
    coordinate_y: 0.58,
    scale:        1.5,
  })
  .await
  .unwrap();
  s.create_photo(NewPhoto {
    defect_id:   defect.defect_id,
    description: Some("Crack before repair".into()),
    photo_type:  PhotoType::Before,
    image_url:   "https://img.example.com/before.jpg".into(),
  })
  .await
  .unwrap();
  s.create_improvement(improvement_input(defect.defect_id, user.user_id))
    .await
    .unwrap();

  let full = s
    .get_defect_detail_full(defect.defect_id)
    .await
    .unwrap()
    .unwrap();

  assert_eq!(full.defect_marks.len(), 1);
  assert_eq!(full.photos.len(), 1);
  assert_eq!(full.improvements.len(), 1);
  assert_eq!(full.detail.defect.defect_id, defect.defect_id);
}

// ─── End-to-end rework chain ─────────────────────────────────────────────────

#[tokio::test]
async fn chained_rework_scenario() {
  let s = store().await;
  let (project, user) = seed(&s).await;

  // Defect A is reported and later closed out by hand.
  let a = s.create_defect(defect_input(&project, &user)).await.unwrap();
  assert_eq!(a.status, DefectStatus::Waiting);

  s.update_defect(a.defect_id, DefectPatch {
    status: Some(DefectStatus::Completed),
    ..Default::default()
  })
  .await
  .unwrap();

  // Defect B supersedes A; A is resolved, so B is immediately actionable.
  let mut b_input = defect_input(&project, &user);
  b_input.previous_defect_id = Some(a.defect_id);
  let b = s.create_defect(b_input).await.unwrap();
  assert_eq!(b.status, DefectStatus::Improving);

  // A repair is submitted against B and then rejected by the reviewer.
  let improvement = s
    .create_improvement(improvement_input(b.defect_id, user.user_id))
    .await
    .unwrap();
  let b_stored = s.get_defect(b.defect_id).await.unwrap().unwrap();
  assert_eq!(b_stored.status, DefectStatus::PendingConfirmation);

  s.create_confirmation(confirmation_input(
    improvement.improvement_id,
    user.user_id,
    Verdict::Reject,
  ))
  .await
  .unwrap();
  let b_stored = s.get_defect(b.defect_id).await.unwrap().unwrap();
  assert_eq!(b_stored.status, DefectStatus::Improving);
}
