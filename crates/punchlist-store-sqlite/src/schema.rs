//! SQL schema for the Punchlist SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS projects (
    project_id   TEXT PRIMARY KEY,
    project_name TEXT NOT NULL,
    unique_code  TEXT NOT NULL UNIQUE,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vendors (
    vendor_id        TEXT PRIMARY KEY,
    vendor_name      TEXT NOT NULL,
    contact_person   TEXT,
    phone            TEXT,
    responsibilities TEXT,
    email            TEXT,
    line_id          TEXT,
    unique_code      TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS defect_categories (
    defect_category_id TEXT PRIMARY KEY,
    category_name      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    user_id      TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    email        TEXT,
    line_id      TEXT,
    company_name TEXT,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS base_maps (
    base_map_id TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL REFERENCES projects(project_id),
    map_name    TEXT NOT NULL,
    file_path   TEXT NOT NULL
);

-- previous_defect_id carries no FOREIGN KEY on purpose: a dangling
-- predecessor is legal (the defect simply starts in 'waiting') and deleting
-- a predecessor clears the field explicitly inside the delete transaction.
CREATE TABLE IF NOT EXISTS defects (
    defect_id               TEXT PRIMARY KEY,
    unique_code             TEXT NOT NULL UNIQUE,
    project_id              TEXT NOT NULL REFERENCES projects(project_id),
    submitted_id            TEXT NOT NULL REFERENCES users(user_id),
    location                TEXT NOT NULL,
    defect_category_id      TEXT REFERENCES defect_categories(defect_category_id),
    defect_description      TEXT NOT NULL,
    assigned_vendor_id      TEXT REFERENCES vendors(vendor_id),
    repair_description      TEXT,
    expected_completion_day TEXT,            -- ISO 8601 calendar date
    responsible_vendor_id   TEXT REFERENCES vendors(vendor_id),
    previous_defect_id      TEXT,
    status                  TEXT NOT NULL,   -- see encode::encode_status
    confirmer_id            TEXT REFERENCES users(user_id),
    created_at              TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS defect_marks (
    defect_mark_id TEXT PRIMARY KEY,
    defect_id      TEXT NOT NULL REFERENCES defects(defect_id),
    base_map_id    TEXT NOT NULL REFERENCES base_maps(base_map_id),
    coordinate_x   REAL NOT NULL,
    coordinate_y   REAL NOT NULL,
    scale          REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS photos (
    photo_id    TEXT PRIMARY KEY,
    defect_id   TEXT NOT NULL REFERENCES defects(defect_id),
    description TEXT,
    photo_type  TEXT NOT NULL,   -- 'before' | 'after'
    image_url   TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS improvements (
    improvement_id   TEXT PRIMARY KEY,
    defect_id        TEXT NOT NULL REFERENCES defects(defect_id),
    submitter_id     TEXT NOT NULL REFERENCES users(user_id),
    content          TEXT NOT NULL,
    improvement_date TEXT NOT NULL,
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS confirmations (
    confirmation_id   TEXT PRIMARY KEY,
    improvement_id    TEXT NOT NULL REFERENCES improvements(improvement_id),
    confirmer_id      TEXT NOT NULL REFERENCES users(user_id),
    verdict           TEXT NOT NULL,   -- 'accept' | 'reject'
    comment           TEXT,
    confirmation_date TEXT NOT NULL,
    created_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS defects_project_idx      ON defects(project_id);
CREATE INDEX IF NOT EXISTS defects_previous_idx     ON defects(previous_defect_id);
CREATE INDEX IF NOT EXISTS defects_status_idx       ON defects(status);
CREATE INDEX IF NOT EXISTS defects_created_idx      ON defects(created_at);
CREATE INDEX IF NOT EXISTS base_maps_project_idx    ON base_maps(project_id);
CREATE INDEX IF NOT EXISTS marks_defect_idx         ON defect_marks(defect_id);
CREATE INDEX IF NOT EXISTS photos_defect_idx        ON photos(defect_id);
CREATE INDEX IF NOT EXISTS improvements_defect_idx  ON improvements(defect_id);
CREATE INDEX IF NOT EXISTS confirmations_impr_idx   ON confirmations(improvement_id);

PRAGMA user_version = 1;
";
