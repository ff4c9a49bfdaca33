//! [`SqliteStore`] — the SQLite implementation of [`DefectStore`].

use std::path::Path;

use chrono::Utc;
use rand_core::{OsRng, RngCore as _};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use punchlist_core::{
  Error as CoreError,
  attachment::{BaseMap, DefectMark, NewBaseMap, NewDefectMark, NewPhoto, Photo},
  defect::{Defect, DefectPatch, DefectQuery, NewDefect},
  detail::{DefectDetail, DefectDetailFull},
  followup::{Confirmation, Improvement, NewConfirmation, NewImprovement},
  registry::{
    DefectCategory, NewCategory, NewProject, NewUser, NewVendor, Project,
    User, Vendor,
  },
  status::{DefectStatus, initial_status, unblocks_successors},
  store::DefectStore,
};

use crate::{
  Error, Result,
  encode::{
    DEFECT_COLUMNS, DEFECT_COLUMNS_PREFIXED, RawBaseMap, RawCategory,
    RawConfirmation, RawDefect, RawDefectDetail, RawDefectMark,
    RawImprovement, RawPhoto, RawProject, RawUser, RawVendor, decode_status,
    encode_date, encode_dt, encode_photo_type, encode_status, encode_uuid,
    encode_verdict,
  },
  schema::SCHEMA,
};

/// How many fresh codes to try before giving up on a UNIQUE collision.
/// With 128 bits of randomness a single retry is already unobservable.
const UNIQUE_CODE_ATTEMPTS: usize = 4;

/// 16 random bytes from the OS generator, hex-encoded (32 chars).
fn generate_unique_code() -> String {
  let mut bytes = [0u8; 16];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// True when an insert failed on the `unique_code` UNIQUE constraint.
fn is_unique_code_collision(err: &tokio_rusqlite::Error) -> bool {
  match err {
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
      e,
      Some(msg),
    )) => {
      e.code == rusqlite::ErrorCode::ConstraintViolation
        && msg.contains("unique_code")
    }
    _ => false,
  }
}

/// Lift a decode error raised inside a `conn.call` closure.
fn to_call_error(e: Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

/// `SELECT 1`-style existence probe for a single-id query.
fn row_exists(
  conn: &rusqlite::Connection,
  sql: &str,
  id: &str,
) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(sql, rusqlite::params![id], |_| Ok(true))
      .optional()?
      .unwrap_or(false),
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Punchlist entity store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch one defect row by an arbitrary single-column key.
  async fn defect_row(
    &self,
    sql: String,
    key: String,
  ) -> Result<Option<RawDefect>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![key], |row| {
              RawDefect::from_row(row, 0)
            })
            .optional()?,
        )
      })
      .await?;
    Ok(raw)
  }
}

// ─── DefectStore impl ────────────────────────────────────────────────────────

impl DefectStore for SqliteStore {
  type Error = Error;

  // ── Projects ──────────────────────────────────────────────────────────────

  async fn create_project(&self, input: NewProject) -> Result<Project> {
    let project_id = Uuid::new_v4();
    let created_at = Utc::now();

    for _ in 0..UNIQUE_CODE_ATTEMPTS {
      let unique_code = generate_unique_code();
      let id_str = encode_uuid(project_id);
      let at_str = encode_dt(created_at);
      let name = input.project_name.clone();
      let code = unique_code.clone();

      let outcome = self
        .conn
        .call(move |conn| {
          conn.execute(
            "INSERT INTO projects (project_id, project_name, unique_code, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![id_str, name, code, at_str],
          )?;
          Ok(())
        })
        .await;

      match outcome {
        Ok(()) => {
          return Ok(Project {
            project_id,
            project_name: input.project_name,
            unique_code,
            created_at,
          });
        }
        Err(e) if is_unique_code_collision(&e) => continue,
        Err(e) => return Err(e.into()),
      }
    }
    Err(CoreError::UniqueCodeExhausted.into())
  }

  async fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawProject> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT project_id, project_name, unique_code, created_at
               FROM projects WHERE project_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawProject {
                  project_id:   row.get(0)?,
                  project_name: row.get(1)?,
                  unique_code:  row.get(2)?,
                  created_at:   row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProject::into_project).transpose()
  }

  async fn list_projects(&self) -> Result<Vec<Project>> {
    let raws: Vec<RawProject> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT project_id, project_name, unique_code, created_at
           FROM projects ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawProject {
              project_id:   row.get(0)?,
              project_name: row.get(1)?,
              unique_code:  row.get(2)?,
              created_at:   row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProject::into_project).collect()
  }

  async fn delete_project(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let existed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !row_exists(
          &tx,
          "SELECT 1 FROM projects WHERE project_id = ?1",
          &id_str,
        )? {
          return Ok(false);
        }

        // Store-level cascade over everything the project owns. Chains into
        // other projects survive with their predecessor reference cleared.
        tx.execute(
          "UPDATE defects SET previous_defect_id = NULL
           WHERE previous_defect_id IN
             (SELECT defect_id FROM defects WHERE project_id = ?1)",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM confirmations WHERE improvement_id IN
             (SELECT improvement_id FROM improvements WHERE defect_id IN
               (SELECT defect_id FROM defects WHERE project_id = ?1))",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM improvements WHERE defect_id IN
             (SELECT defect_id FROM defects WHERE project_id = ?1)",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM photos WHERE defect_id IN
             (SELECT defect_id FROM defects WHERE project_id = ?1)",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM defect_marks WHERE defect_id IN
             (SELECT defect_id FROM defects WHERE project_id = ?1)",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM defects WHERE project_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM base_maps WHERE project_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM projects WHERE project_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if existed {
      Ok(())
    } else {
      Err(CoreError::ProjectNotFound(id).into())
    }
  }

  // ── Vendors ───────────────────────────────────────────────────────────────

  async fn create_vendor(&self, input: NewVendor) -> Result<Vendor> {
    let vendor_id = Uuid::new_v4();

    for _ in 0..UNIQUE_CODE_ATTEMPTS {
      let unique_code = generate_unique_code();
      let id_str = encode_uuid(vendor_id);
      let code = unique_code.clone();
      let v = input.clone();

      let outcome = self
        .conn
        .call(move |conn| {
          conn.execute(
            "INSERT INTO vendors (
               vendor_id, vendor_name, contact_person, phone,
               responsibilities, email, line_id, unique_code
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
              id_str,
              v.vendor_name,
              v.contact_person,
              v.phone,
              v.responsibilities,
              v.email,
              v.line_id,
              code,
            ],
          )?;
          Ok(())
        })
        .await;

      match outcome {
        Ok(()) => {
          return Ok(Vendor {
            vendor_id,
            vendor_name: input.vendor_name,
            contact_person: input.contact_person,
            phone: input.phone,
            responsibilities: input.responsibilities,
            email: input.email,
            line_id: input.line_id,
            unique_code,
          });
        }
        Err(e) if is_unique_code_collision(&e) => continue,
        Err(e) => return Err(e.into()),
      }
    }
    Err(CoreError::UniqueCodeExhausted.into())
  }

  async fn get_vendor(&self, id: Uuid) -> Result<Option<Vendor>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawVendor> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT vendor_id, vendor_name, contact_person, phone,
                      responsibilities, email, line_id, unique_code
               FROM vendors WHERE vendor_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawVendor {
                  vendor_id:        row.get(0)?,
                  vendor_name:      row.get(1)?,
                  contact_person:   row.get(2)?,
                  phone:            row.get(3)?,
                  responsibilities: row.get(4)?,
                  email:            row.get(5)?,
                  line_id:          row.get(6)?,
                  unique_code:      row.get(7)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVendor::into_vendor).transpose()
  }

  async fn list_vendors(&self) -> Result<Vec<Vendor>> {
    let raws: Vec<RawVendor> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT vendor_id, vendor_name, contact_person, phone,
                  responsibilities, email, line_id, unique_code
           FROM vendors ORDER BY vendor_name",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawVendor {
              vendor_id:        row.get(0)?,
              vendor_name:      row.get(1)?,
              contact_person:   row.get(2)?,
              phone:            row.get(3)?,
              responsibilities: row.get(4)?,
              email:            row.get(5)?,
              line_id:          row.get(6)?,
              unique_code:      row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVendor::into_vendor).collect()
  }

  // ── Defect categories ─────────────────────────────────────────────────────

  async fn create_category(&self, input: NewCategory) -> Result<DefectCategory> {
    let defect_category_id = Uuid::new_v4();
    let id_str = encode_uuid(defect_category_id);
    let name = input.category_name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO defect_categories (defect_category_id, category_name)
           VALUES (?1, ?2)",
          rusqlite::params![id_str, name],
        )?;
        Ok(())
      })
      .await?;

    Ok(DefectCategory {
      defect_category_id,
      category_name: input.category_name,
    })
  }

  async fn get_category(&self, id: Uuid) -> Result<Option<DefectCategory>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCategory> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT defect_category_id, category_name
               FROM defect_categories WHERE defect_category_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawCategory {
                  defect_category_id: row.get(0)?,
                  category_name:      row.get(1)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCategory::into_category).transpose()
  }

  async fn list_categories(&self) -> Result<Vec<DefectCategory>> {
    let raws: Vec<RawCategory> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT defect_category_id, category_name
           FROM defect_categories ORDER BY category_name",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawCategory {
              defect_category_id: row.get(0)?,
              category_name:      row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCategory::into_category).collect()
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user_id = Uuid::new_v4();
    let created_at = Utc::now();
    let id_str = encode_uuid(user_id);
    let at_str = encode_dt(created_at);
    let u = input.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, name, email, line_id, company_name, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, u.name, u.email, u.line_id, u.company_name, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(User {
      user_id,
      name: input.name,
      email: input.email,
      line_id: input.line_id,
      company_name: input.company_name,
      created_at,
    })
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, name, email, line_id, company_name, created_at
               FROM users WHERE user_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawUser {
                  user_id:      row.get(0)?,
                  name:         row.get(1)?,
                  email:        row.get(2)?,
                  line_id:      row.get(3)?,
                  company_name: row.get(4)?,
                  created_at:   row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, name, email, line_id, company_name, created_at
           FROM users ORDER BY name",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawUser {
              user_id:      row.get(0)?,
              name:         row.get(1)?,
              email:        row.get(2)?,
              line_id:      row.get(3)?,
              company_name: row.get(4)?,
              created_at:   row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  // ── Base maps ─────────────────────────────────────────────────────────────

  async fn create_base_map(&self, input: NewBaseMap) -> Result<BaseMap> {
    let base_map_id = Uuid::new_v4();
    let id_str = encode_uuid(base_map_id);
    let project_id = input.project_id;
    let project_str = encode_uuid(project_id);
    let map_name = input.map_name.clone();
    let file_path = input.file_path.clone();

    self
      .conn
      .call(move |conn| {
        if !row_exists(
          conn,
          "SELECT 1 FROM projects WHERE project_id = ?1",
          &project_str,
        )? {
          return Ok(Err(CoreError::ProjectNotFound(project_id)));
        }
        conn.execute(
          "INSERT INTO base_maps (base_map_id, project_id, map_name, file_path)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, project_str, map_name, file_path],
        )?;
        Ok(Ok(()))
      })
      .await??;

    Ok(BaseMap {
      base_map_id,
      project_id: input.project_id,
      map_name: input.map_name,
      file_path: input.file_path,
    })
  }

  async fn list_base_maps(&self, project_id: Uuid) -> Result<Vec<BaseMap>> {
    let project_str = encode_uuid(project_id);

    let raws: Vec<RawBaseMap> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT base_map_id, project_id, map_name, file_path
           FROM base_maps WHERE project_id = ?1 ORDER BY map_name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![project_str], |row| {
            Ok(RawBaseMap {
              base_map_id: row.get(0)?,
              project_id:  row.get(1)?,
              map_name:    row.get(2)?,
              file_path:   row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBaseMap::into_base_map).collect()
  }

  // ── Defects ───────────────────────────────────────────────────────────────

  async fn create_defect(&self, input: NewDefect) -> Result<Defect> {
    let defect_id = Uuid::new_v4();
    let created_at = Utc::now();

    for _ in 0..UNIQUE_CODE_ATTEMPTS {
      let unique_code = generate_unique_code();
      let code = unique_code.clone();
      let id_str = encode_uuid(defect_id);
      let at_str = encode_dt(created_at);
      let d = input.clone();

      let outcome = self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;

          // Referenced entities must exist before the defect is accepted.
          let project_str = encode_uuid(d.project_id);
          if !row_exists(
            &tx,
            "SELECT 1 FROM projects WHERE project_id = ?1",
            &project_str,
          )? {
            return Ok(Err(CoreError::ProjectNotFound(d.project_id)));
          }
          let submitter_str = encode_uuid(d.submitted_id);
          if !row_exists(
            &tx,
            "SELECT 1 FROM users WHERE user_id = ?1",
            &submitter_str,
          )? {
            return Ok(Err(CoreError::UserNotFound(d.submitted_id)));
          }
          if let Some(category_id) = d.defect_category_id
            && !row_exists(
              &tx,
              "SELECT 1 FROM defect_categories WHERE defect_category_id = ?1",
              &encode_uuid(category_id),
            )?
          {
            return Ok(Err(CoreError::CategoryNotFound(category_id)));
          }
          for vendor_id in [d.assigned_vendor_id, d.responsible_vendor_id]
            .into_iter()
            .flatten()
          {
            if !row_exists(
              &tx,
              "SELECT 1 FROM vendors WHERE vendor_id = ?1",
              &encode_uuid(vendor_id),
            )? {
              return Ok(Err(CoreError::VendorNotFound(vendor_id)));
            }
          }

          // Read the predecessor's status for the inference step. A dangling
          // reference reads as no predecessor at all.
          let predecessor_status = match d.previous_defect_id {
            Some(prev) => tx
              .query_row(
                "SELECT status FROM defects WHERE defect_id = ?1",
                rusqlite::params![encode_uuid(prev)],
                |row| row.get::<_, String>(0),
              )
              .optional()?
              .as_deref()
              .map(decode_status)
              .transpose()
              .map_err(to_call_error)?,
            None => None,
          };
          let status = initial_status(d.status, predecessor_status);

          tx.execute(
            "INSERT INTO defects (
               defect_id, unique_code, project_id, submitted_id, location,
               defect_category_id, defect_description, assigned_vendor_id,
               repair_description, expected_completion_day,
               responsible_vendor_id, previous_defect_id, status,
               confirmer_id, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            rusqlite::params![
              id_str,
              code,
              project_str,
              submitter_str,
              d.location,
              d.defect_category_id.map(encode_uuid),
              d.defect_description,
              d.assigned_vendor_id.map(encode_uuid),
              d.repair_description,
              d.expected_completion_day.map(encode_date),
              d.responsible_vendor_id.map(encode_uuid),
              d.previous_defect_id.map(encode_uuid),
              encode_status(status),
              d.confirmer_id.map(encode_uuid),
              at_str,
            ],
          )?;
          tx.commit()?;
          Ok(Ok(status))
        })
        .await;

      match outcome {
        Ok(domain) => {
          let status = domain.map_err(Error::Core)?;
          return Ok(Defect {
            defect_id,
            unique_code,
            project_id: input.project_id,
            submitted_id: input.submitted_id,
            location: input.location,
            defect_category_id: input.defect_category_id,
            defect_description: input.defect_description,
            assigned_vendor_id: input.assigned_vendor_id,
            repair_description: input.repair_description,
            expected_completion_day: input.expected_completion_day,
            responsible_vendor_id: input.responsible_vendor_id,
            previous_defect_id: input.previous_defect_id,
            status,
            confirmer_id: input.confirmer_id,
            created_at,
          });
        }
        Err(e) if is_unique_code_collision(&e) => continue,
        Err(e) => return Err(e.into()),
      }
    }
    Err(CoreError::UniqueCodeExhausted.into())
  }

  async fn get_defect(&self, id: Uuid) -> Result<Option<Defect>> {
    let sql =
      format!("SELECT {DEFECT_COLUMNS} FROM defects WHERE defect_id = ?1");
    let raw = self.defect_row(sql, encode_uuid(id)).await?;
    raw.map(RawDefect::into_defect).transpose()
  }

  async fn get_defect_by_unique_code(
    &self,
    code: &str,
  ) -> Result<Option<Defect>> {
    let sql =
      format!("SELECT {DEFECT_COLUMNS} FROM defects WHERE unique_code = ?1");
    let raw = self.defect_row(sql, code.to_owned()).await?;
    raw.map(RawDefect::into_defect).transpose()
  }

  async fn list_defects(&self, query: &DefectQuery) -> Result<Vec<Defect>> {
    let project_str = query.project_id.map(encode_uuid);
    let submitted_str = query.submitted_id.map(encode_uuid);
    let category_str = query.defect_category_id.map(encode_uuid);
    let vendor_str = query.assigned_vendor_id.map(encode_uuid);
    let status_str =
      query.status.map(encode_status).map(str::to_owned);
    let limit_val = query.limit.unwrap_or(1000) as i64;
    let offset_val = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawDefect> = self
      .conn
      .call(move |conn| {
        // Build WHERE clause dynamically; parameter positions are fixed.
        let mut conds: Vec<&'static str> = vec![];
        if project_str.is_some() {
          conds.push("project_id = ?1");
        }
        if submitted_str.is_some() {
          conds.push("submitted_id = ?2");
        }
        if category_str.is_some() {
          conds.push("defect_category_id = ?3");
        }
        if vendor_str.is_some() {
          conds.push("assigned_vendor_id = ?4");
        }
        if status_str.is_some() {
          conds.push("status = ?5");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {DEFECT_COLUMNS} FROM defects
           {where_clause}
           ORDER BY created_at DESC
           LIMIT ?6 OFFSET ?7"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              project_str.as_deref(),
              submitted_str.as_deref(),
              category_str.as_deref(),
              vendor_str.as_deref(),
              status_str.as_deref(),
              limit_val,
              offset_val,
            ],
            |row| RawDefect::from_row(row, 0),
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDefect::into_defect).collect()
  }

  async fn update_defect(&self, id: Uuid, patch: DefectPatch) -> Result<Defect> {
    if patch.previous_defect_id == Some(id) {
      return Err(CoreError::SelfReference.into());
    }

    let id_str = encode_uuid(id);
    let patch_status = patch.status;

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let current = tx
          .query_row(
            &format!(
              "SELECT {DEFECT_COLUMNS} FROM defects WHERE defect_id = ?1"
            ),
            rusqlite::params![id_str],
            |row| RawDefect::from_row(row, 0),
          )
          .optional()?;
        let Some(mut raw) = current else {
          return Ok(Err(CoreError::DefectNotFound(id)));
        };
        let old_status = decode_status(&raw.status).map_err(to_call_error)?;

        // Apply the patch at the raw-row level; None leaves a field alone.
        if let Some(v) = patch.location {
          raw.location = v;
        }
        if let Some(v) = patch.defect_category_id {
          raw.defect_category_id = Some(encode_uuid(v));
        }
        if let Some(v) = patch.defect_description {
          raw.defect_description = v;
        }
        if let Some(v) = patch.assigned_vendor_id {
          raw.assigned_vendor_id = Some(encode_uuid(v));
        }
        if let Some(v) = patch.repair_description {
          raw.repair_description = Some(v);
        }
        if let Some(v) = patch.expected_completion_day {
          raw.expected_completion_day = Some(encode_date(v));
        }
        if let Some(v) = patch.responsible_vendor_id {
          raw.responsible_vendor_id = Some(encode_uuid(v));
        }
        if let Some(v) = patch.previous_defect_id {
          raw.previous_defect_id = Some(encode_uuid(v));
        }
        if let Some(v) = patch_status {
          raw.status = encode_status(v).to_owned();
        }
        if let Some(v) = patch.confirmer_id {
          raw.confirmer_id = Some(encode_uuid(v));
        }

        tx.execute(
          "UPDATE defects SET
             location = ?2, defect_category_id = ?3, defect_description = ?4,
             assigned_vendor_id = ?5, repair_description = ?6,
             expected_completion_day = ?7, responsible_vendor_id = ?8,
             previous_defect_id = ?9, status = ?10, confirmer_id = ?11
           WHERE defect_id = ?1",
          rusqlite::params![
            raw.defect_id,
            raw.location,
            raw.defect_category_id,
            raw.defect_description,
            raw.assigned_vendor_id,
            raw.repair_description,
            raw.expected_completion_day,
            raw.responsible_vendor_id,
            raw.previous_defect_id,
            raw.status,
            raw.confirmer_id,
          ],
        )?;

        // Resolving this defect unblocks its direct successors: every
        // successor still waiting advances to improving, in the same
        // transaction as the triggering update.
        if let Some(new_status) = patch_status
          && unblocks_successors(old_status, new_status)
        {
          let advanced = tx.execute(
            "UPDATE defects SET status = ?1
             WHERE previous_defect_id = ?2 AND status = ?3",
            rusqlite::params![
              encode_status(DefectStatus::Improving),
              raw.defect_id,
              encode_status(DefectStatus::Waiting),
            ],
          )?;
          if advanced > 0 {
            tracing::debug!(
              defect_id = %raw.defect_id,
              advanced,
              "successor defects unblocked"
            );
          }
        }

        tx.commit()?;
        Ok(Ok(raw))
      })
      .await??;

    raw.into_defect()
  }

  async fn delete_defect(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let existed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !row_exists(
          &tx,
          "SELECT 1 FROM defects WHERE defect_id = ?1",
          &id_str,
        )? {
          return Ok(false);
        }

        tx.execute(
          "DELETE FROM confirmations WHERE improvement_id IN
             (SELECT improvement_id FROM improvements WHERE defect_id = ?1)",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM improvements WHERE defect_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM photos WHERE defect_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM defect_marks WHERE defect_id = ?1",
          rusqlite::params![id_str],
        )?;
        // Successors outlive their predecessor with the reference cleared.
        tx.execute(
          "UPDATE defects SET previous_defect_id = NULL
           WHERE previous_defect_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM defects WHERE defect_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if existed {
      Ok(())
    } else {
      Err(CoreError::DefectNotFound(id).into())
    }
  }

  // ── Marks and photos ──────────────────────────────────────────────────────

  async fn create_defect_mark(
    &self,
    input: NewDefectMark,
  ) -> Result<DefectMark> {
    let defect_mark_id = Uuid::new_v4();
    let id_str = encode_uuid(defect_mark_id);
    let defect_id = input.defect_id;
    let base_map_id = input.base_map_id;
    let defect_str = encode_uuid(defect_id);
    let map_str = encode_uuid(base_map_id);
    let (x, y, scale) = (input.coordinate_x, input.coordinate_y, input.scale);

    self
      .conn
      .call(move |conn| {
        if !row_exists(
          conn,
          "SELECT 1 FROM defects WHERE defect_id = ?1",
          &defect_str,
        )? {
          return Ok(Err(CoreError::DefectNotFound(defect_id)));
        }
        if !row_exists(
          conn,
          "SELECT 1 FROM base_maps WHERE base_map_id = ?1",
          &map_str,
        )? {
          return Ok(Err(CoreError::BaseMapNotFound(base_map_id)));
        }
        conn.execute(
          "INSERT INTO defect_marks (
             defect_mark_id, defect_id, base_map_id,
             coordinate_x, coordinate_y, scale
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, defect_str, map_str, x, y, scale],
        )?;
        Ok(Ok(()))
      })
      .await??;

    Ok(DefectMark {
      defect_mark_id,
      defect_id: input.defect_id,
      base_map_id: input.base_map_id,
      coordinate_x: input.coordinate_x,
      coordinate_y: input.coordinate_y,
      scale: input.scale,
    })
  }

  async fn create_photo(&self, input: NewPhoto) -> Result<Photo> {
    let photo_id = Uuid::new_v4();
    let created_at = Utc::now();
    let id_str = encode_uuid(photo_id);
    let at_str = encode_dt(created_at);
    let defect_id = input.defect_id;
    let defect_str = encode_uuid(defect_id);
    let description = input.description.clone();
    let photo_type = encode_photo_type(input.photo_type).to_owned();
    let image_url = input.image_url.clone();

    self
      .conn
      .call(move |conn| {
        if !row_exists(
          conn,
          "SELECT 1 FROM defects WHERE defect_id = ?1",
          &defect_str,
        )? {
          return Ok(Err(CoreError::DefectNotFound(defect_id)));
        }
        conn.execute(
          "INSERT INTO photos (
             photo_id, defect_id, description, photo_type, image_url, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str, defect_str, description, photo_type, image_url, at_str
          ],
        )?;
        Ok(Ok(()))
      })
      .await??;

    Ok(Photo {
      photo_id,
      defect_id: input.defect_id,
      description: input.description,
      photo_type: input.photo_type,
      image_url: input.image_url,
      created_at,
    })
  }

  // ── Improvements ──────────────────────────────────────────────────────────

  async fn create_improvement(
    &self,
    input: NewImprovement,
  ) -> Result<Improvement> {
    let improvement_id = Uuid::new_v4();
    let created_at = Utc::now();
    let id_str = encode_uuid(improvement_id);
    let at_str = encode_dt(created_at);
    let defect_id = input.defect_id;
    let submitter_id = input.submitter_id;
    let defect_str = encode_uuid(defect_id);
    let submitter_str = encode_uuid(submitter_id);
    let content = input.content.clone();
    let date_str = encode_date(input.improvement_date);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !row_exists(
          &tx,
          "SELECT 1 FROM defects WHERE defect_id = ?1",
          &defect_str,
        )? {
          return Ok(Err(CoreError::DefectNotFound(defect_id)));
        }
        if !row_exists(
          &tx,
          "SELECT 1 FROM users WHERE user_id = ?1",
          &submitter_str,
        )? {
          return Ok(Err(CoreError::UserNotFound(submitter_id)));
        }

        tx.execute(
          "INSERT INTO improvements (
             improvement_id, defect_id, submitter_id, content,
             improvement_date, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str, defect_str, submitter_str, content, date_str, at_str
          ],
        )?;
        // A submitted improvement always puts the defect up for review.
        tx.execute(
          "UPDATE defects SET status = ?1 WHERE defect_id = ?2",
          rusqlite::params![
            encode_status(DefectStatus::PendingConfirmation),
            defect_str,
          ],
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    Ok(Improvement {
      improvement_id,
      defect_id: input.defect_id,
      submitter_id: input.submitter_id,
      content: input.content,
      improvement_date: input.improvement_date,
      created_at,
    })
  }

  async fn list_improvements(&self, defect_id: Uuid) -> Result<Vec<Improvement>> {
    let defect_str = encode_uuid(defect_id);

    let raws: Vec<RawImprovement> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT improvement_id, defect_id, submitter_id, content,
                  improvement_date, created_at
           FROM improvements WHERE defect_id = ?1
           ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![defect_str], |row| {
            RawImprovement::from_row(row)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawImprovement::into_improvement)
      .collect()
  }

  // ── Confirmations ─────────────────────────────────────────────────────────

  async fn create_confirmation(
    &self,
    input: NewConfirmation,
  ) -> Result<Confirmation> {
    let confirmation_id = Uuid::new_v4();
    let created_at = Utc::now();
    let id_str = encode_uuid(confirmation_id);
    let at_str = encode_dt(created_at);
    let improvement_id = input.improvement_id;
    let confirmer_id = input.confirmer_id;
    let improvement_str = encode_uuid(improvement_id);
    let confirmer_str = encode_uuid(confirmer_id);
    let verdict_str = encode_verdict(input.verdict).to_owned();
    let resolved_str = encode_status(input.verdict.resolves_to()).to_owned();
    let comment = input.comment.clone();
    let date_str = encode_date(input.confirmation_date);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let defect_str: Option<String> = tx
          .query_row(
            "SELECT defect_id FROM improvements WHERE improvement_id = ?1",
            rusqlite::params![improvement_str],
            |row| row.get(0),
          )
          .optional()?;
        let Some(defect_str) = defect_str else {
          return Ok(Err(CoreError::ImprovementNotFound(improvement_id)));
        };
        if !row_exists(
          &tx,
          "SELECT 1 FROM users WHERE user_id = ?1",
          &confirmer_str,
        )? {
          return Ok(Err(CoreError::UserNotFound(confirmer_id)));
        }

        tx.execute(
          "INSERT INTO confirmations (
             confirmation_id, improvement_id, confirmer_id, verdict,
             comment, confirmation_date, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            improvement_str,
            confirmer_str,
            verdict_str,
            comment,
            date_str,
            at_str,
          ],
        )?;
        // The verdict resolves the defect the improvement belongs to.
        tx.execute(
          "UPDATE defects SET status = ?1 WHERE defect_id = ?2",
          rusqlite::params![resolved_str, defect_str],
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    Ok(Confirmation {
      confirmation_id,
      improvement_id: input.improvement_id,
      confirmer_id: input.confirmer_id,
      verdict: input.verdict,
      comment: input.comment,
      confirmation_date: input.confirmation_date,
      created_at,
    })
  }

  async fn list_confirmations(
    &self,
    improvement_id: Uuid,
  ) -> Result<Vec<Confirmation>> {
    let improvement_str = encode_uuid(improvement_id);

    let raws: Vec<RawConfirmation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT confirmation_id, improvement_id, confirmer_id, verdict,
                  comment, confirmation_date, created_at
           FROM confirmations WHERE improvement_id = ?1
           ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![improvement_str], |row| {
            Ok(RawConfirmation {
              confirmation_id:   row.get(0)?,
              improvement_id:    row.get(1)?,
              confirmer_id:      row.get(2)?,
              verdict:           row.get(3)?,
              comment:           row.get(4)?,
              confirmation_date: row.get(5)?,
              created_at:        row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawConfirmation::into_confirmation)
      .collect()
  }

  // ── Composed reads ────────────────────────────────────────────────────────

  async fn get_defect_detail(&self, id: Uuid) -> Result<Option<DefectDetail>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawDefectDetail> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {DEFECT_COLUMNS_PREFIXED},
             p.project_name, su.name, c.category_name, v.vendor_name, cu.name
           FROM defects d
           JOIN projects p            ON p.project_id = d.project_id
           LEFT JOIN users su         ON su.user_id = d.submitted_id
           LEFT JOIN defect_categories c
             ON c.defect_category_id = d.defect_category_id
           LEFT JOIN vendors v        ON v.vendor_id = d.assigned_vendor_id
           LEFT JOIN users cu         ON cu.user_id = d.confirmer_id
           WHERE d.defect_id = ?1"
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], |row| {
              Ok(RawDefectDetail {
                defect:         RawDefect::from_row(row, 0)?,
                project_name:   row.get(15)?,
                submitter_name: row.get(16)?,
                category_name:  row.get(17)?,
                vendor_name:    row.get(18)?,
                confirmer_name: row.get(19)?,
              })
            })
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDefectDetail::into_detail).transpose()
  }

  async fn get_defect_detail_full(
    &self,
    id: Uuid,
  ) -> Result<Option<DefectDetailFull>> {
    let detail = match self.get_defect_detail(id).await? {
      Some(d) => d,
      None => return Ok(None),
    };

    let id_str = encode_uuid(id);
    let raw_marks: Vec<RawDefectMark> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT defect_mark_id, defect_id, base_map_id,
                  coordinate_x, coordinate_y, scale
           FROM defect_marks WHERE defect_id = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawDefectMark {
              defect_mark_id: row.get(0)?,
              defect_id:      row.get(1)?,
              base_map_id:    row.get(2)?,
              coordinate_x:   row.get(3)?,
              coordinate_y:   row.get(4)?,
              scale:          row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    let defect_marks = raw_marks
      .into_iter()
      .map(RawDefectMark::into_mark)
      .collect::<Result<Vec<_>>>()?;

    let id_str = encode_uuid(id);
    let raw_photos: Vec<RawPhoto> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT photo_id, defect_id, description, photo_type, image_url,
                  created_at
           FROM photos WHERE defect_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawPhoto {
              photo_id:    row.get(0)?,
              defect_id:   row.get(1)?,
              description: row.get(2)?,
              photo_type:  row.get(3)?,
              image_url:   row.get(4)?,
              created_at:  row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    let photos = raw_photos
      .into_iter()
      .map(RawPhoto::into_photo)
      .collect::<Result<Vec<_>>>()?;

    let improvements = self.list_improvements(id).await?;

    Ok(Some(DefectDetailFull {
      detail,
      defect_marks,
      photos,
      improvements,
    }))
  }
}
