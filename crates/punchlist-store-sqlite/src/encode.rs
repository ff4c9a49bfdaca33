//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as ISO 8601
//! (`YYYY-MM-DD`). Enums are stored under their serde snake_case names.
//! UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use punchlist_core::{
  attachment::{BaseMap, DefectMark, Photo, PhotoType},
  defect::Defect,
  detail::DefectDetail,
  followup::{Confirmation, Improvement, Verdict},
  registry::{DefectCategory, Project, User, Vendor},
  status::DefectStatus,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_uuid_opt(s: Option<&str>) -> Result<Option<Uuid>> {
  s.map(decode_uuid).transpose()
}

// ─── DateTime<Utc> / NaiveDate ───────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  s.parse().map_err(|_| Error::DateParse(format!("bad date: {s:?}")))
}

// ─── DefectStatus ────────────────────────────────────────────────────────────

pub fn encode_status(s: DefectStatus) -> &'static str {
  match s {
    DefectStatus::Waiting => "waiting",
    DefectStatus::Improving => "improving",
    DefectStatus::PendingConfirmation => "pending_confirmation",
    DefectStatus::Completed => "completed",
    DefectStatus::Rejected => "rejected",
  }
}

pub fn decode_status(s: &str) -> Result<DefectStatus> {
  match s {
    "waiting" => Ok(DefectStatus::Waiting),
    "improving" => Ok(DefectStatus::Improving),
    "pending_confirmation" => Ok(DefectStatus::PendingConfirmation),
    "completed" => Ok(DefectStatus::Completed),
    "rejected" => Ok(DefectStatus::Rejected),
    other => Err(Error::Decode(format!("unknown defect status: {other:?}"))),
  }
}

// ─── Verdict ─────────────────────────────────────────────────────────────────

pub fn encode_verdict(v: Verdict) -> &'static str {
  match v {
    Verdict::Accept => "accept",
    Verdict::Reject => "reject",
  }
}

pub fn decode_verdict(s: &str) -> Result<Verdict> {
  match s {
    "accept" => Ok(Verdict::Accept),
    "reject" => Ok(Verdict::Reject),
    other => Err(Error::Decode(format!("unknown verdict: {other:?}"))),
  }
}

// ─── PhotoType ───────────────────────────────────────────────────────────────

pub fn encode_photo_type(t: PhotoType) -> &'static str {
  match t {
    PhotoType::Before => "before",
    PhotoType::After => "after",
  }
}

pub fn decode_photo_type(s: &str) -> Result<PhotoType> {
  match s {
    "before" => Ok(PhotoType::Before),
    "after" => Ok(PhotoType::After),
    other => Err(Error::Decode(format!("unknown photo type: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `defects` row, in column order.
pub struct RawDefect {
  pub defect_id:              String,
  pub unique_code:            String,
  pub project_id:             String,
  pub submitted_id:           String,
  pub location:               String,
  pub defect_category_id:     Option<String>,
  pub defect_description:     String,
  pub assigned_vendor_id:     Option<String>,
  pub repair_description:     Option<String>,
  pub expected_completion_day: Option<String>,
  pub responsible_vendor_id:  Option<String>,
  pub previous_defect_id:     Option<String>,
  pub status:                 String,
  pub confirmer_id:           Option<String>,
  pub created_at:             String,
}

impl RawDefect {
  /// Map a rusqlite row whose SELECT lists the defect columns in schema
  /// order, starting at index `base`.
  pub fn from_row(row: &rusqlite::Row<'_>, base: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      defect_id:              row.get(base)?,
      unique_code:            row.get(base + 1)?,
      project_id:             row.get(base + 2)?,
      submitted_id:           row.get(base + 3)?,
      location:               row.get(base + 4)?,
      defect_category_id:     row.get(base + 5)?,
      defect_description:     row.get(base + 6)?,
      assigned_vendor_id:     row.get(base + 7)?,
      repair_description:     row.get(base + 8)?,
      expected_completion_day: row.get(base + 9)?,
      responsible_vendor_id:  row.get(base + 10)?,
      previous_defect_id:     row.get(base + 11)?,
      status:                 row.get(base + 12)?,
      confirmer_id:           row.get(base + 13)?,
      created_at:             row.get(base + 14)?,
    })
  }

  pub fn into_defect(self) -> Result<Defect> {
    Ok(Defect {
      defect_id:              decode_uuid(&self.defect_id)?,
      unique_code:            self.unique_code,
      project_id:             decode_uuid(&self.project_id)?,
      submitted_id:           decode_uuid(&self.submitted_id)?,
      location:               self.location,
      defect_category_id:     decode_uuid_opt(self.defect_category_id.as_deref())?,
      defect_description:     self.defect_description,
      assigned_vendor_id:     decode_uuid_opt(self.assigned_vendor_id.as_deref())?,
      repair_description:     self.repair_description,
      expected_completion_day: self
        .expected_completion_day
        .as_deref()
        .map(decode_date)
        .transpose()?,
      responsible_vendor_id:  decode_uuid_opt(self.responsible_vendor_id.as_deref())?,
      previous_defect_id:     decode_uuid_opt(self.previous_defect_id.as_deref())?,
      status:                 decode_status(&self.status)?,
      confirmer_id:           decode_uuid_opt(self.confirmer_id.as_deref())?,
      created_at:             decode_dt(&self.created_at)?,
    })
  }
}

/// The column list matching [`RawDefect::from_row`], for embedding in
/// SELECT statements.
pub const DEFECT_COLUMNS: &str = "defect_id, unique_code, project_id, \
   submitted_id, location, defect_category_id, defect_description, \
   assigned_vendor_id, repair_description, expected_completion_day, \
   responsible_vendor_id, previous_defect_id, status, confirmer_id, \
   created_at";

/// [`DEFECT_COLUMNS`] qualified with the `d` table alias, for joins where
/// bare column names would be ambiguous.
pub const DEFECT_COLUMNS_PREFIXED: &str = "d.defect_id, d.unique_code, \
   d.project_id, d.submitted_id, d.location, d.defect_category_id, \
   d.defect_description, d.assigned_vendor_id, d.repair_description, \
   d.expected_completion_day, d.responsible_vendor_id, \
   d.previous_defect_id, d.status, d.confirmer_id, d.created_at";

/// A defect row joined with related display names.
pub struct RawDefectDetail {
  pub defect:         RawDefect,
  pub project_name:   String,
  pub submitter_name: Option<String>,
  pub category_name:  Option<String>,
  pub vendor_name:    Option<String>,
  pub confirmer_name: Option<String>,
}

impl RawDefectDetail {
  pub fn into_detail(self) -> Result<DefectDetail> {
    Ok(DefectDetail {
      defect:         self.defect.into_defect()?,
      project_name:   self.project_name,
      submitter_name: self.submitter_name,
      category_name:  self.category_name,
      vendor_name:    self.vendor_name,
      confirmer_name: self.confirmer_name,
    })
  }
}

/// Raw strings read directly from a `projects` row.
pub struct RawProject {
  pub project_id:   String,
  pub project_name: String,
  pub unique_code:  String,
  pub created_at:   String,
}

impl RawProject {
  pub fn into_project(self) -> Result<Project> {
    Ok(Project {
      project_id:   decode_uuid(&self.project_id)?,
      project_name: self.project_name,
      unique_code:  self.unique_code,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `vendors` row.
pub struct RawVendor {
  pub vendor_id:        String,
  pub vendor_name:      String,
  pub contact_person:   Option<String>,
  pub phone:            Option<String>,
  pub responsibilities: Option<String>,
  pub email:            Option<String>,
  pub line_id:          Option<String>,
  pub unique_code:      String,
}

impl RawVendor {
  pub fn into_vendor(self) -> Result<Vendor> {
    Ok(Vendor {
      vendor_id:        decode_uuid(&self.vendor_id)?,
      vendor_name:      self.vendor_name,
      contact_person:   self.contact_person,
      phone:            self.phone,
      responsibilities: self.responsibilities,
      email:            self.email,
      line_id:          self.line_id,
      unique_code:      self.unique_code,
    })
  }
}

/// Raw strings read directly from a `defect_categories` row.
pub struct RawCategory {
  pub defect_category_id: String,
  pub category_name:      String,
}

impl RawCategory {
  pub fn into_category(self) -> Result<DefectCategory> {
    Ok(DefectCategory {
      defect_category_id: decode_uuid(&self.defect_category_id)?,
      category_name:      self.category_name,
    })
  }
}

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:      String,
  pub name:         String,
  pub email:        Option<String>,
  pub line_id:      Option<String>,
  pub company_name: Option<String>,
  pub created_at:   String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:      decode_uuid(&self.user_id)?,
      name:         self.name,
      email:        self.email,
      line_id:      self.line_id,
      company_name: self.company_name,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `base_maps` row.
pub struct RawBaseMap {
  pub base_map_id: String,
  pub project_id:  String,
  pub map_name:    String,
  pub file_path:   String,
}

impl RawBaseMap {
  pub fn into_base_map(self) -> Result<BaseMap> {
    Ok(BaseMap {
      base_map_id: decode_uuid(&self.base_map_id)?,
      project_id:  decode_uuid(&self.project_id)?,
      map_name:    self.map_name,
      file_path:   self.file_path,
    })
  }
}

/// Raw values read directly from a `defect_marks` row.
pub struct RawDefectMark {
  pub defect_mark_id: String,
  pub defect_id:      String,
  pub base_map_id:    String,
  pub coordinate_x:   f64,
  pub coordinate_y:   f64,
  pub scale:          f64,
}

impl RawDefectMark {
  pub fn into_mark(self) -> Result<DefectMark> {
    Ok(DefectMark {
      defect_mark_id: decode_uuid(&self.defect_mark_id)?,
      defect_id:      decode_uuid(&self.defect_id)?,
      base_map_id:    decode_uuid(&self.base_map_id)?,
      coordinate_x:   self.coordinate_x,
      coordinate_y:   self.coordinate_y,
      scale:          self.scale,
    })
  }
}

/// Raw strings read directly from a `photos` row.
pub struct RawPhoto {
  pub photo_id:    String,
  pub defect_id:   String,
  pub description: Option<String>,
  pub photo_type:  String,
  pub image_url:   String,
  pub created_at:  String,
}

impl RawPhoto {
  pub fn into_photo(self) -> Result<Photo> {
    Ok(Photo {
      photo_id:    decode_uuid(&self.photo_id)?,
      defect_id:   decode_uuid(&self.defect_id)?,
      description: self.description,
      photo_type:  decode_photo_type(&self.photo_type)?,
      image_url:   self.image_url,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `improvements` row.
pub struct RawImprovement {
  pub improvement_id:   String,
  pub defect_id:        String,
  pub submitter_id:     String,
  pub content:          String,
  pub improvement_date: String,
  pub created_at:       String,
}

impl RawImprovement {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      improvement_id:   row.get(0)?,
      defect_id:        row.get(1)?,
      submitter_id:     row.get(2)?,
      content:          row.get(3)?,
      improvement_date: row.get(4)?,
      created_at:       row.get(5)?,
    })
  }

  pub fn into_improvement(self) -> Result<Improvement> {
    Ok(Improvement {
      improvement_id:   decode_uuid(&self.improvement_id)?,
      defect_id:        decode_uuid(&self.defect_id)?,
      submitter_id:     decode_uuid(&self.submitter_id)?,
      content:          self.content,
      improvement_date: decode_date(&self.improvement_date)?,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `confirmations` row.
pub struct RawConfirmation {
  pub confirmation_id:   String,
  pub improvement_id:    String,
  pub confirmer_id:      String,
  pub verdict:           String,
  pub comment:           Option<String>,
  pub confirmation_date: String,
  pub created_at:        String,
}

impl RawConfirmation {
  pub fn into_confirmation(self) -> Result<Confirmation> {
    Ok(Confirmation {
      confirmation_id:   decode_uuid(&self.confirmation_id)?,
      improvement_id:    decode_uuid(&self.improvement_id)?,
      confirmer_id:      decode_uuid(&self.confirmer_id)?,
      verdict:           decode_verdict(&self.verdict)?,
      comment:           self.comment,
      confirmation_date: decode_date(&self.confirmation_date)?,
      created_at:        decode_dt(&self.created_at)?,
    })
  }
}
