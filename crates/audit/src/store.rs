//! SQLite audit store implementation.

use crate::{DecisionRecord, RecordId, Result};
use access::Role;
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;
use rusqlite::{Connection, params};
use std::path::Path;

/// SQLite-backed decision log.
pub struct AuditStore {
    conn: Connection,
}

impl AuditStore {
    /// Open or create an audit store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory audit store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS decisions (
                id TEXT PRIMARY KEY,
                timestamp TEXT NOT NULL,
                subject_id TEXT NOT NULL,
                role TEXT NOT NULL,
                resource TEXT NOT NULL,
                action TEXT NOT NULL,
                allowed INTEGER NOT NULL,
                data TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_decisions_subject
                ON decisions(subject_id, timestamp);
            "#,
        )?;
        Ok(())
    }

    /// Append a record to the log.
    pub fn append(&self, record: &DecisionRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO decisions
                 (id, timestamp, subject_id, role, resource, action, allowed, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id.to_string(),
                record.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
                record.subject_id,
                record.role.as_str(),
                record.resource,
                record.action,
                record.outcome.is_allowed(),
                serde_json::to_string(&record.outcome)?,
            ],
        )?;
        tracing::trace!(id = %record.id, subject = %record.subject_id, "audit record appended");
        Ok(())
    }

    /// The most recent records, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<DecisionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, subject_id, role, resource, action, data FROM decisions
             ORDER BY timestamp DESC, rowid DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([sql_limit(limit)], read_row)?;
        Ok(collect_records(rows))
    }

    /// The most recent records for one subject, newest first.
    pub fn for_subject(&self, subject_id: &str, limit: usize) -> Result<Vec<DecisionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, subject_id, role, resource, action, data FROM decisions
             WHERE subject_id = ?1 ORDER BY timestamp DESC, rowid DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![subject_id, sql_limit(limit)], read_row)?;
        Ok(collect_records(rows))
    }

    /// Number of denied decisions on record.
    pub fn denied_count(&self) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM decisions WHERE allowed = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

type Row = (String, String, String, String, String, String, String);

/// SQLite treats a negative LIMIT as unbounded, so clamp instead of wrapping.
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn collect_records(rows: impl Iterator<Item = rusqlite::Result<Row>>) -> Vec<DecisionRecord> {
    rows.filter_map(|row| match row {
        Ok(row) => decode(row),
        Err(e) => {
            tracing::warn!(error = %e, "skipping unreadable audit row");
            None
        }
    })
    .collect()
}

fn decode(row: Row) -> Option<DecisionRecord> {
    let (id, timestamp, subject_id, role, resource, action, data) = row;
    let parsed = (
        id.parse::<Uuid>(),
        timestamp.parse::<DateTime<Utc>>(),
        role.parse::<Role>(),
        serde_json::from_str(&data),
    );
    match parsed {
        (Ok(uuid), Ok(timestamp), Ok(role), Ok(outcome)) => Some(DecisionRecord {
            id: RecordId(uuid),
            timestamp,
            subject_id,
            role,
            resource,
            action,
            outcome,
        }),
        _ => {
            tracing::warn!(%id, "skipping undecodable audit row");
            None
        }
    }
}
