//! Session persistence
//!
//! Each session row holds the whole conversation state as JSON. The
//! engine never sees this layer; the session manager loads before a turn
//! and saves after a successful one.

mod schema;

pub use schema::*;

use crate::state_machine::ConversationState;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Session already exists: {0}")]
    SessionExists(String),
    #[error("Stored state for session {id} is unreadable: {source}")]
    CorruptState {
        id: String,
        source: serde_json::Error,
    },
    #[error("State serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        self.conn()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Session Operations ====================

    /// Insert a new session holding `state`
    pub fn create_session(&self, id: &str, state: &ConversationState) -> DbResult<Session> {
        let conn = self.conn()?;
        let now = Utc::now();
        let state_json = serde_json::to_string(state)?;

        conn.execute(
            "INSERT INTO sessions (id, state, last_stage, message_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                id,
                state_json,
                state.last_stage.map(|s| s.name()),
                state.messages.len(),
                now.to_rfc3339()
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DbError::SessionExists(id.to_string())
            }
            other => DbError::Sqlite(other),
        })?;

        Ok(Session {
            id: id.to_string(),
            state: state.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Get session by ID
    pub fn get_session(&self, id: &str) -> DbResult<Session> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, state, created_at, updated_at FROM sessions WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, state_json, created_at, updated_at)) = row else {
            return Err(DbError::SessionNotFound(id.to_string()));
        };
        let state = serde_json::from_str(&state_json).map_err(|source| DbError::CorruptState {
            id: id.clone(),
            source,
        })?;

        Ok(Session {
            id,
            state,
            created_at: parse_datetime(&created_at),
            updated_at: parse_datetime(&updated_at),
        })
    }

    /// Overwrite the stored state of an existing session
    pub fn update_session_state(&self, id: &str, state: &ConversationState) -> DbResult<()> {
        let conn = self.conn()?;
        let state_json = serde_json::to_string(state)?;
        let updated = conn.execute(
            "UPDATE sessions SET state = ?1, last_stage = ?2, message_count = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                state_json,
                state.last_stage.map(|s| s.name()),
                state.messages.len(),
                Utc::now().to_rfc3339(),
                id
            ],
        )?;
        if updated == 0 {
            return Err(DbError::SessionNotFound(id.to_string()));
        }
        Ok(())
    }

    /// List sessions, most recently updated first
    pub fn list_sessions(&self) -> DbResult<Vec<SessionSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, last_stage, message_count, created_at, updated_at
             FROM sessions
             ORDER BY updated_at DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(SessionSummary {
                id: row.get(0)?,
                last_stage: parse_stage(row.get(1)?),
                message_count: row.get(2)?,
                created_at: parse_datetime(&row.get::<_, String>(3)?),
                updated_at: parse_datetime(&row.get::<_, String>(4)?),
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Delete a session
    pub fn delete_session(&self, id: &str) -> DbResult<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(DbError::SessionNotFound(id.to_string()));
        }
        Ok(())
    }
}
