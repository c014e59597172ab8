//! Document store for mediation cases
//!
//! Provides persistence for the case registry and the per-session
//! append-only message logs.

mod schema;

pub use schema::*;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Case not found: {0}")]
    CaseNotFound(String),
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Case already exists: {0}")]
    CaseExists(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Thread-safe store handle
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open or create the store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Case Registry ====================

    /// Create a new case with two empty sessions.
    ///
    /// Session identifiers are derived deterministically from the case
    /// id, the role tag is stored on each session row, and the case
    /// starts with `waiting_for = party2`. A duplicate case id fails
    /// with `CaseExists`.
    pub fn create_case(
        &self,
        case_id: &str,
        party1_name: &str,
        party2_name: &str,
    ) -> StoreResult<Case> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        let party1_session = SessionCode::compose(case_id, Party::Party1);
        let party2_session = SessionCode::compose(case_id, Party::Party2);

        conn.execute(
            "INSERT INTO cases (case_id, party1_session, party2_session, party1_name, party2_name, waiting_for, created_at, last_update)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                case_id,
                party1_session,
                party2_session,
                party1_name,
                party2_name,
                Party::Party2.as_str(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::CaseExists(case_id.to_string())
            }
            other => StoreError::Sqlite(other),
        })?;

        for (session_id, role) in [
            (&party1_session, Party::Party1),
            (&party2_session, Party::Party2),
        ] {
            conn.execute(
                "INSERT INTO sessions (session_id, case_id, role, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![session_id, case_id, role.as_str(), now.to_rfc3339()],
            )?;
        }

        Ok(Case {
            case_id: case_id.to_string(),
            party1_session,
            party2_session,
            names: PartyNames::new(party1_name, party2_name),
            waiting_for: Party::Party2,
            created_at: now,
            last_update: now,
        })
    }

    /// Get a case by id
    pub fn get_case(&self, case_id: &str) -> StoreResult<Case> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT case_id, party1_session, party2_session, party1_name, party2_name,
                    waiting_for, created_at, last_update
             FROM cases WHERE case_id = ?1",
        )?;

        stmt.query_row(params![case_id], parse_case_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StoreError::CaseNotFound(case_id.to_string())
                }
                other => StoreError::Sqlite(other),
            })
    }

    /// Get a session row by id
    pub fn get_session(&self, session_id: &str) -> StoreResult<Session> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT session_id, case_id, role, created_at FROM sessions WHERE session_id = ?1",
        )?;

        stmt.query_row(params![session_id], |row| {
            let role_str: String = row.get(2)?;
            Ok(Session {
                session_id: row.get(0)?,
                case_id: row.get(1)?,
                // Role tags are written by create_case only; an unknown
                // value means the row was tampered with outside this code.
                role: Party::parse(&role_str).unwrap_or(Party::Party1),
                created_at: parse_datetime(&row.get::<_, String>(3)?),
            })
        })
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                StoreError::SessionNotFound(session_id.to_string())
            }
            other => StoreError::Sqlite(other),
        })
    }

    /// Conditionally flip `waiting_for`.
    ///
    /// The update applies only while `waiting_for` still holds the
    /// value the caller observed; a zero-row update means another
    /// writer got there first and the caller lost the race. Returns
    /// whether the update applied. This is the only mutator of
    /// `waiting_for` and `last_update`.
    pub fn update_turn_if(
        &self,
        case_id: &str,
        expected: Party,
        next: Party,
    ) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        let updated = conn.execute(
            "UPDATE cases SET waiting_for = ?1, last_update = ?2
             WHERE case_id = ?3 AND waiting_for = ?4",
            params![next.as_str(), now.to_rfc3339(), case_id, expected.as_str()],
        )?;

        if updated == 0 {
            // Distinguish a lost race from a missing case.
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM cases WHERE case_id = ?1)",
                params![case_id],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(StoreError::CaseNotFound(case_id.to_string()));
            }
        }

        Ok(updated > 0)
    }

    // ==================== Session Log ====================

    /// Append a message to a session's log.
    ///
    /// The timestamp is server-assigned; the per-session sequence id
    /// breaks timestamp ties by insertion order. Messages are never
    /// updated or deleted.
    pub fn append_message(
        &self,
        session_id: &str,
        user_id: &str,
        content: &str,
    ) -> StoreResult<Message> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        let message_id = uuid::Uuid::new_v4().to_string();

        let sequence_id: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sequence_id), 0) + 1 FROM messages WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;

        conn.execute(
            "INSERT INTO messages (message_id, session_id, sequence_id, user_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                message_id,
                session_id,
                sequence_id,
                user_id,
                content,
                now.to_rfc3339(),
            ],
        )?;

        Ok(Message {
            message_id,
            session_id: session_id.to_string(),
            sequence_id,
            user_id: user_id.to_string(),
            content: content.to_string(),
            created_at: now,
        })
    }

    /// List all messages for a session, oldest first
    pub fn list_messages(&self, session_id: &str) -> StoreResult<Vec<Message>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT message_id, session_id, sequence_id, user_id, content, created_at
             FROM messages WHERE session_id = ?1 ORDER BY sequence_id ASC",
        )?;

        let rows = stmt.query_map(params![session_id], parse_message_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }
}

fn parse_case_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Case> {
    let waiting_str: String = row.get(5)?;
    Ok(Case {
        case_id: row.get(0)?,
        party1_session: row.get(1)?,
        party2_session: row.get(2)?,
        names: PartyNames::new(row.get::<_, String>(3)?, row.get::<_, String>(4)?),
        waiting_for: Party::parse(&waiting_str).unwrap_or(Party::Party2),
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        last_update: parse_datetime(&row.get::<_, String>(7)?),
    })
}

fn parse_message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        message_id: row.get(0)?,
        session_id: row.get(1)?,
        sequence_id: row.get(2)?,
        user_id: row.get(3)?,
        content: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
