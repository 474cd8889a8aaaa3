use crate::store::{Snapshot, SnapshotStore};
use anyhow::Context;
use rusqlite::Connection;
use std::path::Path;

pub const DB_FILE: &str = "hangman.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.to_string_lossy()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshot_entries(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;
    Ok(())
}

/// Snapshot persistence backed by one SQLite row per collection key.
pub struct SqliteSnapshots {
    conn: Connection,
}

impl SqliteSnapshots {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(open_db(workspace)?))
    }
}

impl SnapshotStore for SqliteSnapshots {
    fn load(&self) -> anyhow::Result<Option<Snapshot>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM snapshot_entries ORDER BY key")?;
        let rows = stmt
            .query_map([], |row| {
                let key: String = row.get(0)?;
                let value: String = row.get(1)?;
                Ok((key, value))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        if rows.is_empty() {
            return Ok(None);
        }

        let mut snap = Snapshot::default();
        for (key, text) in rows {
            // Unparseable text is handed on as null so the store treats it as empty.
            let value = serde_json::from_str(&text).unwrap_or_else(|e| {
                log::warn!("stored value for {key} is not JSON: {e}");
                serde_json::Value::Null
            });
            snap.insert(key, value);
        }
        Ok(Some(snap))
    }

    fn save(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let now = chrono::Utc::now().to_rfc3339();
        tx.execute("DELETE FROM snapshot_entries", [])?;
        for (key, value) in snapshot.iter() {
            tx.execute(
                "INSERT INTO snapshot_entries(key, value, updated_at) VALUES(?, ?, ?)",
                (key, serde_json::to_string(value)?, &now),
            )
            .with_context(|| format!("failed to write snapshot key {key}"))?;
        }
        tx.commit()?;
        Ok(())
    }
}
