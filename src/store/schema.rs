//! Storage schema and domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL schema for initialization
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cases (
    case_id TEXT PRIMARY KEY,
    party1_session TEXT NOT NULL,
    party2_session TEXT NOT NULL,
    party1_name TEXT NOT NULL,
    party2_name TEXT NOT NULL,
    waiting_for TEXT NOT NULL,
    created_at TEXT NOT NULL,
    last_update TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    session_id TEXT PRIMARY KEY,
    case_id TEXT NOT NULL,
    role TEXT NOT NULL,
    created_at TEXT NOT NULL,

    FOREIGN KEY (case_id) REFERENCES cases(case_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_case ON sessions(case_id);

CREATE TABLE IF NOT EXISTS messages (
    message_id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    sequence_id INTEGER NOT NULL,
    user_id TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,

    FOREIGN KEY (session_id) REFERENCES sessions(session_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, sequence_id);
"#;

/// Reserved `user_id` for mediator-authored messages.
pub const MEDIATOR_USER_ID: &str = "mediator";

/// Which side of a case a session belongs to.
///
/// Stored as an explicit column on the session row, derived once at
/// case creation; the string suffix on the session code is only parsed
/// at the wire boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Party1,
    Party2,
}

impl Party {
    pub fn other(self) -> Party {
        match self {
            Party::Party1 => Party::Party2,
            Party::Party2 => Party::Party1,
        }
    }

    /// Suffix used in session identifiers and stored in the role column.
    pub fn as_str(self) -> &'static str {
        match self {
            Party::Party1 => "party1",
            Party::Party2 => "party2",
        }
    }

    pub fn parse(s: &str) -> Option<Party> {
        match s {
            "party1" => Some(Party::Party1),
            "party2" => Some(Party::Party2),
            _ => None,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Participant names, keyed by role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyNames {
    pub party1: String,
    pub party2: String,
}

impl PartyNames {
    pub fn new(party1: impl Into<String>, party2: impl Into<String>) -> Self {
        Self {
            party1: party1.into(),
            party2: party2.into(),
        }
    }

    pub fn name_of(&self, party: Party) -> &str {
        match party {
            Party::Party1 => &self.party1,
            Party::Party2 => &self.party2,
        }
    }

    /// Both names must be present for a case to accept messages.
    pub fn is_complete(&self) -> bool {
        !self.party1.trim().is_empty() && !self.party2.trim().is_empty()
    }
}

/// One mediation engagement between exactly two parties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub case_id: String,
    pub party1_session: String,
    pub party2_session: String,
    pub names: PartyNames,
    pub waiting_for: Party,
    pub created_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

impl Case {
    pub fn session_for(&self, party: Party) -> &str {
        match party {
            Party::Party1 => &self.party1_session,
            Party::Party2 => &self.party2_session,
        }
    }
}

/// One party's private view into a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub case_id: String,
    pub role: Party,
    pub created_at: DateTime<Utc>,
}

/// An immutable entry in a session's log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: String,
    pub session_id: String,
    pub sequence_id: i64,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_mediator(&self) -> bool {
        self.user_id == MEDIATOR_USER_ID
    }
}

/// Parsed form of the shareable session code `"<case_id>_party<1|2>"`.
///
/// The trailing underscore-delimited token determines the role; the
/// case id is everything before it. This format is part of the wire
/// contract handed to end users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCode {
    pub case_id: String,
    pub role: Party,
}

impl SessionCode {
    pub fn parse(session_id: &str) -> Option<SessionCode> {
        let (case_id, suffix) = session_id.rsplit_once('_')?;
        if case_id.is_empty() {
            return None;
        }
        Some(SessionCode {
            case_id: case_id.to_string(),
            role: Party::parse(suffix)?,
        })
    }

    /// Derive the session identifier for one role of a case.
    pub fn compose(case_id: &str, role: Party) -> String {
        format!("{case_id}_{role}")
    }
}
