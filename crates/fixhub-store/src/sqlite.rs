//! SQLite sink for the append-only side-effect records: activity log and
//! email history. WAL mode so readers never block the writer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Mutex;

use fixhub_core::error::{FixHubError, Result};
use fixhub_core::traits::{AuditSink, EmailHistoryStore};
use fixhub_core::types::{ActivityLogEntry, EmailHistoryRecord, NewActivity};

/// Embedded append-only store for audit and email history rows.
pub struct SqliteAuditLog {
    conn: Mutex<Connection>,
}

impl SqliteAuditLog {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| FixHubError::Store(format!("DB open error: {e}")))?;

        // WAL mode allows concurrent readers and prevents "database is locked"
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(|e| FixHubError::Store(format!("DB pragma error: {e}")))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// In-memory database, for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| FixHubError::Store(format!("DB open error: {e}")))?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .lock()
            .unwrap()
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS activity_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                business_id TEXT NOT NULL,
                actor_id INTEGER,
                activity_type TEXT NOT NULL,
                description TEXT NOT NULL,
                entity_type TEXT NOT NULL,
                entity_id TEXT NOT NULL,
                metadata TEXT DEFAULT '{}',
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_activity_business
                ON activity_log(business_id, created_at);

            CREATE TABLE IF NOT EXISTS email_history (
                id TEXT PRIMARY KEY,
                business_id TEXT NOT NULL,
                recipient TEXT NOT NULL,
                subject TEXT NOT NULL,
                body TEXT NOT NULL,
                kind TEXT NOT NULL,
                sender TEXT NOT NULL,
                entity_type TEXT,
                entity_id TEXT,
                delivered INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_email_business
                ON email_history(business_id, created_at);
            ",
            )
            .map_err(|e| FixHubError::Store(format!("DB migrate error: {e}")))?;
        Ok(())
    }
}

fn parse_ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

fn row_to_activity(row: &rusqlite::Row) -> rusqlite::Result<ActivityLogEntry> {
    let metadata: String = row.get(7)?;
    let created_at: String = row.get(8)?;
    Ok(ActivityLogEntry {
        id: row.get(0)?,
        business_id: row.get(1)?,
        actor_id: row.get(2)?,
        activity_type: row.get(3)?,
        description: row.get(4)?,
        entity_type: row.get(5)?,
        entity_id: row.get(6)?,
        metadata: serde_json::from_str(&metadata).unwrap_or(serde_json::Value::Null),
        created_at: parse_ts(&created_at),
    })
}

#[async_trait]
impl AuditSink for SqliteAuditLog {
    async fn append(&self, activity: NewActivity) -> Result<ActivityLogEntry> {
        let created_at = Utc::now();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO activity_log
                (business_id, actor_id, activity_type, description, entity_type, entity_id, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                activity.business_id,
                activity.actor_id,
                activity.activity_type,
                activity.description,
                activity.entity_type,
                activity.entity_id,
                activity.metadata.to_string(),
                created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| FixHubError::Store(format!("Audit insert: {e}")))?;

        Ok(ActivityLogEntry {
            id: conn.last_insert_rowid(),
            business_id: activity.business_id,
            actor_id: activity.actor_id,
            activity_type: activity.activity_type,
            description: activity.description,
            entity_type: activity.entity_type,
            entity_id: activity.entity_id,
            metadata: activity.metadata,
            created_at,
        })
    }

    async fn find_all(&self, business_id: &str) -> Result<Vec<ActivityLogEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, business_id, actor_id, activity_type, description, entity_type, entity_id, metadata, created_at
                 FROM activity_log WHERE business_id = ?1 ORDER BY id",
            )
            .map_err(|e| FixHubError::Store(format!("Audit query: {e}")))?;
        let rows = stmt
            .query_map(params![business_id], row_to_activity)
            .map_err(|e| FixHubError::Store(format!("Audit query: {e}")))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let conn = self.conn.lock().unwrap();
        let removed = conn
            .execute(
                "DELETE FROM activity_log WHERE created_at < ?1",
                params![cutoff.to_rfc3339()],
            )
            .map_err(|e| FixHubError::Store(format!("Audit cleanup: {e}")))?;
        Ok(removed as u64)
    }
}

#[async_trait]
impl EmailHistoryStore for SqliteAuditLog {
    async fn record(&self, record: EmailHistoryRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO email_history
                (id, business_id, recipient, subject, body, kind, sender, entity_type, entity_id, delivered, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                record.id,
                record.business_id,
                record.recipient,
                record.subject,
                record.body,
                record.kind,
                record.sender,
                record.entity_type,
                record.entity_id,
                record.delivered as i64,
                record.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| FixHubError::Store(format!("Email history insert: {e}")))?;
        Ok(())
    }

    async fn find_all(&self, business_id: &str) -> Result<Vec<EmailHistoryRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, business_id, recipient, subject, body, kind, sender, entity_type, entity_id, delivered, created_at
                 FROM email_history WHERE business_id = ?1 ORDER BY created_at",
            )
            .map_err(|e| FixHubError::Store(format!("Email history query: {e}")))?;
        let rows = stmt
            .query_map(params![business_id], |row| {
                let delivered: i64 = row.get(9)?;
                let created_at: String = row.get(10)?;
                Ok(EmailHistoryRecord {
                    id: row.get(0)?,
                    business_id: row.get(1)?,
                    recipient: row.get(2)?,
                    subject: row.get(3)?,
                    body: row.get(4)?,
                    kind: row.get(5)?,
                    sender: row.get(6)?,
                    entity_type: row.get(7)?,
                    entity_id: row.get(8)?,
                    delivered: delivered != 0,
                    created_at: parse_ts(&created_at),
                })
            })
            .map_err(|e| FixHubError::Store(format!("Email history query: {e}")))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}
