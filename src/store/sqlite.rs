use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use super::ProfileStore;
use crate::model::{DataQualityMetrics, FormatProfile, StructureDescriptor};

pub const DB_SCHEMA_VERSION: &str = "0.2.0";

const PROFILE_COLUMNS: &str = "
  owner_scope_id,
  signature,
  headers_json,
  column_patterns_json,
  column_samples_json,
  column_count,
  typical_row_count,
  has_header_row,
  completeness,
  duplicate_row_ratio,
  field_mapping_json,
  corrections_json,
  confidence,
  usage_count,
  last_used,
  created_at,
  updated_at
";

pub struct SqliteProfileStore {
    connection: Mutex<Connection>,
}

impl SqliteProfileStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        configure_connection(&connection)?;
        Self::from_connection(connection)
    }

    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().context("failed to open in-memory profile store")?;
        Self::from_connection(connection)
    }

    pub(crate) fn from_connection(connection: Connection) -> Result<Self> {
        ensure_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| anyhow!("profile store connection lock poisoned"))
    }

    pub fn count_profiles(&self, owner_scope_id: Option<&str>) -> Result<i64> {
        let connection = self.lock()?;
        let count = match owner_scope_id {
            Some(owner) => connection.query_row(
                "SELECT COUNT(*) FROM format_profiles WHERE owner_scope_id = ?1",
                [owner],
                |row| row.get(0),
            )?,
            None => connection.query_row("SELECT COUNT(*) FROM format_profiles", [], |row| {
                row.get(0)
            })?,
        };
        Ok(count)
    }

    pub fn schema_version(&self) -> Result<Option<String>> {
        let connection = self.lock()?;
        let version = connection
            .query_row(
                "SELECT value FROM metadata WHERE key = 'db_schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version)
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS format_profiles (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              owner_scope_id TEXT NOT NULL,
              signature TEXT NOT NULL,
              headers_json TEXT NOT NULL,
              column_patterns_json TEXT NOT NULL,
              column_samples_json TEXT NOT NULL,
              column_count INTEGER NOT NULL,
              typical_row_count INTEGER NOT NULL,
              has_header_row INTEGER NOT NULL,
              completeness REAL NOT NULL,
              duplicate_row_ratio REAL NOT NULL,
              field_mapping_json TEXT NOT NULL,
              confidence REAL NOT NULL,
              usage_count INTEGER NOT NULL DEFAULT 1,
              last_used TEXT NOT NULL,
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL,
              UNIQUE(owner_scope_id, signature)
            );

            CREATE INDEX IF NOT EXISTS idx_format_profiles_owner_created
              ON format_profiles(owner_scope_id, created_at, id);
            ",
        )
        .context("failed to initialize profile store schema")?;

    // Added in 0.2.0; older stores have no corrections column.
    ensure_column_exists(
        connection,
        "format_profiles",
        "corrections_json TEXT NOT NULL DEFAULT 'null'",
    )?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;

    Ok(())
}

fn ensure_column_exists(
    connection: &Connection,
    table_name: &str,
    column_definition: &str,
) -> Result<()> {
    let Some(column_name) = column_definition.split_whitespace().next() else {
        bail!("invalid column definition: {column_definition}");
    };

    let pragma_sql = format!("PRAGMA table_info({table_name})");
    let mut statement = connection
        .prepare(&pragma_sql)
        .with_context(|| format!("failed to inspect schema for table {table_name}"))?;

    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        let existing_name: String = row.get(1)?;
        if existing_name == column_name {
            return Ok(());
        }
    }

    let alter_sql = format!("ALTER TABLE {table_name} ADD COLUMN {column_definition}");
    connection
        .execute(&alter_sql, [])
        .with_context(|| format!("failed to add column {column_name} on {table_name}"))?;

    Ok(())
}

struct ProfileRow {
    owner_scope_id: String,
    signature: String,
    headers_json: String,
    column_patterns_json: String,
    column_samples_json: String,
    column_count: i64,
    typical_row_count: i64,
    has_header_row: bool,
    completeness: f64,
    duplicate_row_ratio: f64,
    field_mapping_json: String,
    corrections_json: String,
    confidence: f64,
    usage_count: i64,
    last_used: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProfileRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            owner_scope_id: row.get(0)?,
            signature: row.get(1)?,
            headers_json: row.get(2)?,
            column_patterns_json: row.get(3)?,
            column_samples_json: row.get(4)?,
            column_count: row.get(5)?,
            typical_row_count: row.get(6)?,
            has_header_row: row.get(7)?,
            completeness: row.get(8)?,
            duplicate_row_ratio: row.get(9)?,
            field_mapping_json: row.get(10)?,
            corrections_json: row.get(11)?,
            confidence: row.get(12)?,
            usage_count: row.get(13)?,
            last_used: row.get(14)?,
            created_at: row.get(15)?,
            updated_at: row.get(16)?,
        })
    }

    fn into_profile(self) -> Result<FormatProfile> {
        let context = || format!("corrupt stored profile {}", self.signature);
        Ok(FormatProfile {
            headers: serde_json::from_str(&self.headers_json).with_context(context)?,
            column_patterns: serde_json::from_str(&self.column_patterns_json)
                .with_context(context)?,
            column_samples: serde_json::from_str(&self.column_samples_json)
                .with_context(context)?,
            structure: StructureDescriptor {
                column_count: self.column_count.max(0) as usize,
                typical_row_count: self.typical_row_count.max(0) as usize,
                has_header_row: self.has_header_row,
            },
            quality: DataQualityMetrics {
                completeness: self.completeness,
                duplicate_row_ratio: self.duplicate_row_ratio,
            },
            field_mapping: serde_json::from_str(&self.field_mapping_json)
                .with_context(context)?,
            corrections: serde_json::from_str(&self.corrections_json).with_context(context)?,
            confidence: self.confidence,
            usage_count: self.usage_count.max(1) as u64,
            last_used: self.last_used,
            created_at: self.created_at,
            updated_at: self.updated_at,
            owner_scope_id: self.owner_scope_id,
            signature: self.signature,
        })
    }
}

fn select_by_signature(
    connection: &Connection,
    owner_scope_id: &str,
    signature: &str,
) -> Result<Option<FormatProfile>> {
    let sql = format!(
        "SELECT {PROFILE_COLUMNS} FROM format_profiles
         WHERE owner_scope_id = ?1 AND signature = ?2
         LIMIT 1"
    );
    let row = connection
        .query_row(&sql, params![owner_scope_id, signature], ProfileRow::from_row)
        .optional()
        .with_context(|| format!("failed to load profile {signature} for {owner_scope_id}"))?;

    row.map(ProfileRow::into_profile).transpose()
}

impl ProfileStore for SqliteProfileStore {
    fn upsert(&self, owner_scope_id: &str, profile: &FormatProfile) -> Result<FormatProfile> {
        let mut connection = self.lock()?;
        let tx = connection.transaction()?;

        let now = Utc::now();
        tx.execute(
            "
            INSERT INTO format_profiles(
              owner_scope_id, signature, headers_json, column_patterns_json, column_samples_json,
              column_count, typical_row_count, has_header_row, completeness, duplicate_row_ratio,
              field_mapping_json, corrections_json, confidence, usage_count,
              last_used, created_at, updated_at
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            ON CONFLICT(owner_scope_id, signature) DO UPDATE SET
              headers_json=excluded.headers_json,
              column_patterns_json=excluded.column_patterns_json,
              column_samples_json=excluded.column_samples_json,
              column_count=excluded.column_count,
              typical_row_count=excluded.typical_row_count,
              has_header_row=excluded.has_header_row,
              completeness=excluded.completeness,
              duplicate_row_ratio=excluded.duplicate_row_ratio,
              field_mapping_json=excluded.field_mapping_json,
              corrections_json=CASE
                WHEN excluded.corrections_json = 'null' THEN format_profiles.corrections_json
                ELSE excluded.corrections_json
              END,
              confidence=excluded.confidence,
              usage_count=format_profiles.usage_count + 1,
              last_used=excluded.last_used,
              updated_at=?18
            ",
            params![
                owner_scope_id,
                profile.signature,
                serde_json::to_string(&profile.headers)?,
                serde_json::to_string(&profile.column_patterns)?,
                serde_json::to_string(&profile.column_samples)?,
                profile.structure.column_count as i64,
                profile.structure.typical_row_count as i64,
                profile.structure.has_header_row,
                profile.quality.completeness,
                profile.quality.duplicate_row_ratio,
                serde_json::to_string(&profile.field_mapping)?,
                serde_json::to_string(&profile.corrections)?,
                profile.confidence,
                profile.usage_count.max(1) as i64,
                profile.last_used,
                profile.created_at,
                profile.updated_at,
                now,
            ],
        )
        .with_context(|| {
            format!(
                "failed to upsert profile {} for {owner_scope_id}",
                profile.signature
            )
        })?;

        let stored = select_by_signature(&tx, owner_scope_id, &profile.signature)?
            .with_context(|| format!("profile {} vanished after upsert", profile.signature))?;
        tx.commit()?;

        debug!(
            owner = owner_scope_id,
            signature = %stored.signature,
            usage_count = stored.usage_count,
            "upserted format profile"
        );
        Ok(stored)
    }

    fn list(&self, owner_scope_id: &str) -> Result<Vec<FormatProfile>> {
        let connection = self.lock()?;
        let sql = format!(
            "SELECT {PROFILE_COLUMNS} FROM format_profiles
             WHERE owner_scope_id = ?1
             ORDER BY created_at ASC, id ASC"
        );
        let mut statement = connection.prepare(&sql)?;
        let mut rows = statement.query([owner_scope_id])?;

        let mut out = Vec::<FormatProfile>::new();
        while let Some(row) = rows.next()? {
            out.push(ProfileRow::from_row(row)?.into_profile()?);
        }

        Ok(out)
    }

    fn get_by_signature(
        &self,
        owner_scope_id: &str,
        signature: &str,
    ) -> Result<Option<FormatProfile>> {
        let connection = self.lock()?;
        select_by_signature(&connection, owner_scope_id, signature)
    }
}
