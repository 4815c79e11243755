use crate::error::{GroupStatError, Result};
use crate::model::{LineStats, SCHEMA_VERSION};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;

const CACHE_FILE: &str = "commit_stats.db";

/// Persistent commit id to line statistics map.
///
/// Commit ids are content hashes, so one database can serve every group.
pub struct StatsCache {
    conn: Connection,
}

impl StatsCache {
    pub fn open(cache_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(cache_dir)?;
        let conn = Connection::open(cache_dir.join(CACHE_FILE))?;
        // Groups running in parallel share the file.
        conn.busy_timeout(Duration::from_secs(10))?;
        let mut cache = Self { conn };
        cache.initialize()?;
        Ok(cache)
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS commit_stats (
                id TEXT PRIMARY KEY,
                insertions INTEGER NOT NULL,
                deletions INTEGER NOT NULL
            );
            ",
        )?;
        self.check_schema_version()
    }

    fn check_schema_version(&mut self) -> Result<()> {
        let user_version: i64 = self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if user_version == 0 {
            let set_stmt = format!("PRAGMA user_version = {SCHEMA_VERSION};");
            self.conn.execute_batch(&set_stmt)?;
        } else if user_version != i64::from(SCHEMA_VERSION) {
            return Err(GroupStatError::Cache(format!(
                "Schema version mismatch: expected {SCHEMA_VERSION}, found {user_version}"
            )));
        }
        Ok(())
    }

    pub fn get(&self, commit_id: &str) -> Result<Option<LineStats>> {
        let stats = self
            .conn
            .query_row(
                "SELECT insertions, deletions FROM commit_stats WHERE id = ?",
                params![commit_id],
                |row| {
                    Ok(LineStats {
                        insertions: row.get::<_, i64>(0)? as u64,
                        deletions: row.get::<_, i64>(1)? as u64,
                    })
                },
            )
            .optional()?;
        Ok(stats)
    }

    pub fn store(&mut self, entries: &[(String, LineStats)]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO commit_stats (id, insertions, deletions) VALUES (?, ?, ?)",
            )?;
            for (id, stats) in entries {
                stmt.execute(params![id, stats.insertions as i64, stats.deletions as i64])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
