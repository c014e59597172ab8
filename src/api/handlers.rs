//! HTTP request handlers

use super::types::{
    CaseResponse, CreateCaseRequest, CreateCaseResponse, ErrorResponse, MessageListResponse,
    SendMessageRequest, SendMessageResponse,
};
use super::AppState;
use crate::coordinator::CoordinatorError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Case creation
        .route("/api/cases", post(create_case))
        // Case status (poll target)
        .route("/api/cases/:case_id", get(case_status))
        // Session transcript
        .route("/api/sessions/:session_id/messages", get(list_messages))
        // Message submission
        .route("/api/sessions/:session_id/messages", post(send_message))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Case Creation
// ============================================================

async fn create_case(
    State(state): State<AppState>,
    Json(req): Json<CreateCaseRequest>,
) -> Result<Json<CreateCaseResponse>, AppError> {
    let case_id = req.case_id.unwrap_or_else(generate_case_id);

    let case = state
        .coordinator
        .create_case(&case_id, &req.party1_name, &req.party2_name)?;

    let party1_session = case.party1_session.clone();
    let party2_session = case.party2_session.clone();

    Ok(Json(CreateCaseResponse {
        case,
        party1_session,
        party2_session,
    }))
}

// ============================================================
// Case Status
// ============================================================

async fn case_status(
    State(state): State<AppState>,
    Path(case_id): Path<String>,
) -> Result<Json<CaseResponse>, AppError> {
    let case = state.coordinator.case_status(&case_id)?;
    Ok(Json(CaseResponse { case }))
}

// ============================================================
// Session Transcript
// ============================================================

async fn list_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<MessageListResponse>, AppError> {
    let messages = state.coordinator.list_messages(&session_id)?;
    Ok(Json(MessageListResponse { messages }))
}

// ============================================================
// Message Submission
// ============================================================

async fn send_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    let receipt = state
        .coordinator
        .handle_message(&session_id, &req.user_id, &req.content)
        .await?;

    Ok(Json(SendMessageResponse {
        message: receipt.message,
        reply: receipt.reply,
        waiting_for: receipt.waiting_for,
    }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("accord ", env!("CARGO_PKG_VERSION"))
}

/// Case ids default to a timestamp-derived code, matching the codes
/// users already know how to share.
fn generate_case_id() -> String {
    format!("case_{}", Utc::now().timestamp())
}

// ============================================================
// Error Handling
// ============================================================

struct AppError(CoordinatorError);

impl From<CoordinatorError> for AppError {
    fn from(e: CoordinatorError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CoordinatorError::CaseNotFound(_) => StatusCode::NOT_FOUND,
            CoordinatorError::CaseExists(_) | CoordinatorError::StaleTurn(_) => {
                StatusCode::CONFLICT
            }
            CoordinatorError::IncompleteCase(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CoordinatorError::Mediator(_) => StatusCode::BAD_GATEWAY,
            CoordinatorError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.0.to_string()));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_case_id_parses_as_wire_code() {
        use crate::store::{Party, SessionCode};

        let case_id = generate_case_id();
        assert!(case_id.starts_with("case_"));

        let session = SessionCode::compose(&case_id, Party::Party1);
        let parsed = SessionCode::parse(&session).unwrap();
        assert_eq!(parsed.case_id, case_id);
        assert_eq!(parsed.role, Party::Party1);
    }
}
