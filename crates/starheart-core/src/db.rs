//! SQLite persistence for story progress.

use crate::{Result, StoryError};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension};
use starheart_types::{NewProgress, ProgressPatch, SessionProgress, StoryPath};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const SELECT_COLUMNS: &str = r#"
    SELECT id, session_id, current_chapter, minigame_attempts, clues_found,
           is_complete, has_failed_heart, love_meter, story_path, last_updated
    FROM story_progress
"#;

/// SQLite-based progress store, one row per session.
pub struct ProgressStore {
    conn: Mutex<Connection>,
}

impl ProgressStore {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        store.migrate()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoryError::LockPoisoned)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS story_progress (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL UNIQUE,
                current_chapter INTEGER NOT NULL DEFAULT 0,
                minigame_attempts INTEGER NOT NULL DEFAULT 0,
                clues_found TEXT NOT NULL DEFAULT '[]',
                is_complete INTEGER NOT NULL DEFAULT 0,
                last_updated TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_story_progress_last_updated
                ON story_progress(last_updated);
            "#,
        )?;
        Ok(())
    }

    /// Add the branch columns to databases created before they existed.
    fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;

        let has_story_path: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM pragma_table_info('story_progress') WHERE name = 'story_path'",
                [],
                |row| row.get(0),
            )
            .unwrap_or(false);

        if !has_story_path {
            debug!(target: "starheart::store", "Adding branch columns to story_progress");
            conn.execute_batch(
                r#"
                ALTER TABLE story_progress ADD COLUMN has_failed_heart INTEGER NOT NULL DEFAULT 0;
                ALTER TABLE story_progress ADD COLUMN love_meter INTEGER NOT NULL DEFAULT 0;
                ALTER TABLE story_progress ADD COLUMN story_path TEXT NOT NULL DEFAULT 'standard';
                "#,
            )?;
        }

        Ok(())
    }

    /// Get the progress row for a session.
    pub fn get(&self, session_id: &str) -> Result<Option<SessionProgress>> {
        let conn = self.lock()?;
        Ok(select_by_session(&conn, session_id)?)
    }

    /// Insert a new row, filling defaults for omitted fields.
    pub fn create(&self, new: &NewProgress) -> Result<SessionProgress> {
        let clues = new.clues_found.as_deref().unwrap_or(&[]);
        let clues_json = serde_json::to_string(clues)?;

        let conn = self.lock()?;
        let inserted = conn.execute(
            r#"
            INSERT INTO story_progress (
                session_id, current_chapter, minigame_attempts, clues_found,
                is_complete, has_failed_heart, love_meter, story_path, last_updated
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                new.session_id,
                new.current_chapter.unwrap_or(0),
                new.minigame_attempts.unwrap_or(0),
                clues_json,
                new.is_complete.unwrap_or(false),
                new.has_failed_heart.unwrap_or(false),
                new.love_meter.unwrap_or(0),
                new.story_path.unwrap_or_default().as_str(),
                timestamp(Utc::now()),
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                return Err(StoryError::SessionAlreadyExists(new.session_id.clone()));
            }
            Err(e) => return Err(e.into()),
        }

        select_by_session(&conn, &new.session_id)?
            .ok_or_else(|| StoryError::SessionNotFound(new.session_id.clone()))
    }

    /// Write the present fields of `patch` and stamp `last_updated`.
    ///
    /// The stamp is taken while holding the connection, so the row's
    /// `last_updated` always belongs to the write that landed last.
    pub fn update(&self, session_id: &str, patch: &ProgressPatch) -> Result<SessionProgress> {
        let conn = self.lock()?;

        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(chapter) = patch.current_chapter {
            assignments.push("current_chapter = ?");
            values.push(Value::Integer(chapter.into()));
        }
        if let Some(attempts) = patch.minigame_attempts {
            assignments.push("minigame_attempts = ?");
            values.push(Value::Integer(attempts.into()));
        }
        if let Some(clues) = &patch.clues_found {
            assignments.push("clues_found = ?");
            values.push(Value::Text(serde_json::to_string(clues)?));
        }
        if let Some(complete) = patch.is_complete {
            assignments.push("is_complete = ?");
            values.push(Value::Integer(complete.into()));
        }
        if let Some(failed) = patch.has_failed_heart {
            assignments.push("has_failed_heart = ?");
            values.push(Value::Integer(failed.into()));
        }
        if let Some(meter) = patch.love_meter {
            assignments.push("love_meter = ?");
            values.push(Value::Integer(meter.into()));
        }
        if let Some(path) = patch.story_path {
            assignments.push("story_path = ?");
            values.push(Value::Text(path.as_str().to_string()));
        }
        assignments.push("last_updated = ?");
        values.push(Value::Text(timestamp(Utc::now())));
        values.push(Value::Text(session_id.to_string()));

        let sql = format!(
            "UPDATE story_progress SET {} WHERE session_id = ?",
            assignments.join(", ")
        );

        let changed = conn.execute(&sql, params_from_iter(values.iter()))?;
        if changed == 0 {
            return Err(StoryError::SessionNotFound(session_id.to_string()));
        }

        select_by_session(&conn, session_id)?
            .ok_or_else(|| StoryError::SessionNotFound(session_id.to_string()))
    }

    /// Delete rows not updated since `cutoff`. Returns the number removed.
    pub fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM story_progress WHERE last_updated < ?1",
            params![timestamp(cutoff)],
        )?;
        Ok(removed)
    }

    /// Number of stored sessions.
    pub fn count(&self) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM story_progress", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Fixed-width UTC timestamps so that text comparison orders them.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn select_by_session(conn: &Connection, session_id: &str) -> rusqlite::Result<Option<SessionProgress>> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE session_id = ?1"),
        params![session_id],
        row_to_progress,
    )
    .optional()
}

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

fn row_to_progress(row: &rusqlite::Row) -> rusqlite::Result<SessionProgress> {
    let clues_json: String = row.get("clues_found")?;
    let clues_found: Vec<String> =
        serde_json::from_str(&clues_json).map_err(|e| conversion_error(4, e))?;

    let story_path: String = row.get("story_path")?;
    let story_path: StoryPath = story_path.parse().map_err(|e| conversion_error(8, e))?;

    let last_updated: String = row.get("last_updated")?;
    let last_updated = DateTime::parse_from_rfc3339(&last_updated)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(9, e))?;

    Ok(SessionProgress {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        current_chapter: row.get("current_chapter")?,
        minigame_attempts: row.get("minigame_attempts")?,
        clues_found,
        is_complete: row.get("is_complete")?,
        has_failed_heart: row.get("has_failed_heart")?,
        love_meter: row.get("love_meter")?,
        story_path,
        last_updated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn create_test_store() -> (ProgressStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = ProgressStore::open(&temp_dir.path().join("story.db")).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_create_fills_defaults() {
        let (store, _dir) = create_test_store();
        let progress = store
            .create(&NewProgress {
                session_id: "s1".to_string(),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(progress.session_id, "s1");
        assert_eq!(progress.current_chapter, 0);
        assert_eq!(progress.minigame_attempts, 0);
        assert!(progress.clues_found.is_empty());
        assert!(!progress.is_complete);
        assert!(!progress.has_failed_heart);
        assert_eq!(progress.love_meter, 0);
        assert_eq!(progress.story_path, StoryPath::Standard);
    }

    #[test]
    fn test_create_duplicate_session_fails() {
        let (store, _dir) = create_test_store();
        store.create(&NewProgress::starting("dup")).unwrap();

        let err = store.create(&NewProgress::starting("dup")).unwrap_err();
        assert!(matches!(err, StoryError::SessionAlreadyExists(id) if id == "dup"));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_get_missing_session() {
        let (store, _dir) = create_test_store();
        assert!(store.get("nobody").unwrap().is_none());
    }

    #[test]
    fn test_update_only_touches_present_fields() {
        let (store, _dir) = create_test_store();
        let created = store
            .create(&NewProgress {
                session_id: "s1".to_string(),
                minigame_attempts: Some(2),
                clues_found: Some(vec!["bamboo".to_string()]),
                ..Default::default()
            })
            .unwrap();

        let updated = store.update("s1", &ProgressPatch::chapter(3)).unwrap();

        assert_eq!(updated.current_chapter, 3);
        assert_eq!(updated.minigame_attempts, 2);
        assert_eq!(updated.clues_found, vec!["bamboo".to_string()]);
        assert_eq!(updated.id, created.id);
        assert!(updated.last_updated >= created.last_updated);
    }

    #[test]
    fn test_update_replaces_clues() {
        let (store, _dir) = create_test_store();
        store
            .create(&NewProgress {
                session_id: "s1".to_string(),
                clues_found: Some(vec!["letter".to_string(), "feather".to_string()]),
                ..Default::default()
            })
            .unwrap();

        let clues = vec!["bamboo".to_string(), "stone".to_string()];
        store.update("s1", &ProgressPatch::clues(clues.clone())).unwrap();

        assert_eq!(store.get("s1").unwrap().unwrap().clues_found, clues);
    }

    #[test]
    fn test_update_branch_fields() {
        let (store, _dir) = create_test_store();
        store.create(&NewProgress::starting("s1")).unwrap();

        let patch = ProgressPatch {
            has_failed_heart: Some(true),
            love_meter: Some(7),
            story_path: Some(StoryPath::Sadness),
            ..Default::default()
        };
        let updated = store.update("s1", &patch).unwrap();

        assert!(updated.has_failed_heart);
        assert_eq!(updated.love_meter, 7);
        assert_eq!(updated.story_path, StoryPath::Sadness);
    }

    #[test]
    fn test_update_unknown_session_creates_nothing() {
        let (store, _dir) = create_test_store();
        let err = store.update("ghost", &ProgressPatch::chapter(1)).unwrap_err();

        assert!(matches!(err, StoryError::SessionNotFound(_)));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_prune_older_than() {
        let (store, _dir) = create_test_store();
        store.create(&NewProgress::starting("old")).unwrap();
        store.create(&NewProgress::starting("new")).unwrap();

        assert_eq!(store.prune_older_than(Utc::now() - Duration::days(1)).unwrap(), 0);
        assert_eq!(store.count().unwrap(), 2);

        assert_eq!(store.prune_older_than(Utc::now() + Duration::seconds(1)).unwrap(), 2);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("story.db");

        {
            let store = ProgressStore::open(&path).unwrap();
            store.create(&NewProgress::starting("s1")).unwrap();
            store.update("s1", &ProgressPatch::complete()).unwrap();
        }

        let store = ProgressStore::open(&path).unwrap();
        let progress = store.get("s1").unwrap().unwrap();
        assert!(progress.is_complete);
    }

    #[test]
    fn test_migrates_schema_without_branch_columns() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("story.db");

        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE story_progress (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL UNIQUE,
                current_chapter INTEGER NOT NULL DEFAULT 0,
                minigame_attempts INTEGER NOT NULL DEFAULT 0,
                clues_found TEXT NOT NULL DEFAULT '[]',
                is_complete INTEGER NOT NULL DEFAULT 0,
                last_updated TEXT NOT NULL
            );
            INSERT INTO story_progress (session_id, current_chapter, last_updated)
                VALUES ('legacy', 2, '2024-01-01T00:00:00.000000Z');
            "#,
        )
        .unwrap();
        drop(conn);

        let store = ProgressStore::open(&path).unwrap();
        let progress = store.get("legacy").unwrap().unwrap();
        assert_eq!(progress.current_chapter, 2);
        assert_eq!(progress.story_path, StoryPath::Standard);
        assert!(!progress.has_failed_heart);
    }
}
