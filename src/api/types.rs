//! API request and response types

use crate::store::{Case, Message, Party};
use serde::{Deserialize, Serialize};

/// Request to create a new mediation case
#[derive(Debug, Deserialize)]
pub struct CreateCaseRequest {
    /// Generated server-side when absent
    pub case_id: Option<String>,
    pub party1_name: String,
    pub party2_name: String,
}

/// Response for case creation, including the shareable session codes
#[derive(Debug, Serialize)]
pub struct CreateCaseResponse {
    pub case: Case,
    pub party1_session: String,
    pub party2_session: String,
}

/// Response with current case status (the poll target)
#[derive(Debug, Serialize)]
pub struct CaseResponse {
    pub case: Case,
}

/// Response with one session's ordered transcript
#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<Message>,
}

/// Request to submit a message to a session
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub user_id: String,
    pub content: String,
}

/// Response for a handled message
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub message: Message,
    pub reply: Message,
    pub waiting_for: Party,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
