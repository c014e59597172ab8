//! Turn coordinator
//!
//! The state machine at the heart of a case. A case is always in one
//! of two states, `waiting_for(party1)` or `waiting_for(party2)`, and
//! `handle_message` is the only transition: append the sender's
//! message, obtain the mediator relay, deliver it to the other party's
//! log, then flip turn ownership. The write ordering is load-bearing:
//! the sender's message lands before the fallible mediator call, so a
//! failed relay never loses what the sender wrote; it leaves the
//! message persisted with no counterpart and the turn un-flipped.

#[cfg(test)]
mod proptests;

use crate::mediator::{MediatorError, MediatorService};
use crate::store::{Case, Message, Party, Store, StoreError, MEDIATOR_USER_ID};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("Case not found: {0}")]
    CaseNotFound(String),
    #[error("Case already exists: {0}")]
    CaseExists(String),
    #[error("Participant names are missing for case: {0}")]
    IncompleteCase(String),
    #[error("Turn changed concurrently for case: {0}")]
    StaleTurn(String),
    #[error("Mediator failure: {0}")]
    Mediator(#[from] MediatorError),
    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for CoordinatorError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::CaseNotFound(id) => CoordinatorError::CaseNotFound(id),
            // An unknown session code resolves to no case.
            StoreError::SessionNotFound(id) => CoordinatorError::CaseNotFound(id),
            StoreError::CaseExists(id) => CoordinatorError::CaseExists(id),
            other => CoordinatorError::Storage(other),
        }
    }
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Outcome of a successfully handled message
#[derive(Debug)]
pub struct TurnReceipt {
    /// The sender's message as persisted in their own log
    pub message: Message,
    /// The mediator relay as persisted in the other party's log
    pub reply: Message,
    /// Who holds the turn after the flip
    pub waiting_for: Party,
}

/// Coordinates the strictly alternating exchange for all cases
pub struct Coordinator {
    store: Store,
    mediator: Arc<dyn MediatorService>,
}

impl Coordinator {
    pub fn new(store: Store, mediator: Arc<dyn MediatorService>) -> Self {
        Self { store, mediator }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Register a new case and its two sessions.
    pub fn create_case(
        &self,
        case_id: &str,
        party1_name: &str,
        party2_name: &str,
    ) -> CoordinatorResult<Case> {
        let case = self.store.create_case(case_id, party1_name, party2_name)?;
        tracing::info!(
            case_id = %case.case_id,
            party1_session = %case.party1_session,
            party2_session = %case.party2_session,
            "Case created"
        );
        Ok(case)
    }

    /// Current status of a case (the poll target for clients).
    pub fn case_status(&self, case_id: &str) -> CoordinatorResult<Case> {
        Ok(self.store.get_case(case_id)?)
    }

    /// Ordered transcript of one session. Read-only.
    pub fn list_messages(&self, session_id: &str) -> CoordinatorResult<Vec<Message>> {
        // Resolve the session first so an unknown code is a clean
        // not-found instead of an empty transcript.
        self.store.get_session(session_id)?;
        Ok(self.store.list_messages(session_id)?)
    }

    /// Handle one message from one party.
    ///
    /// Turn gating is deliberately not enforced here; the caller's
    /// presentation layer disables input while not holding the turn.
    /// What is enforced is lost-update protection: the final flip is
    /// conditional on the `waiting_for` value observed at load, and a
    /// lost race surfaces as `StaleTurn` with all prior writes kept.
    pub async fn handle_message(
        &self,
        session_id: &str,
        user_id: &str,
        content: &str,
    ) -> CoordinatorResult<TurnReceipt> {
        let session = self.store.get_session(session_id)?;
        let case = self.store.get_case(&session.case_id)?;

        if !case.names.is_complete() {
            return Err(CoordinatorError::IncompleteCase(case.case_id));
        }

        let speaker = session.role;

        // The sender's own message lands before anything fallible.
        let message = self.store.append_message(session_id, user_id, content)?;

        let reply_text = self
            .mediator
            .generate_reply(content, speaker, &case.names)
            .await?;

        let reply = self.store.append_message(
            case.session_for(speaker.other()),
            MEDIATOR_USER_ID,
            &reply_text,
        )?;

        let next = speaker.other();
        let flipped = self
            .store
            .update_turn_if(&case.case_id, case.waiting_for, next)?;
        if !flipped {
            tracing::warn!(
                case_id = %case.case_id,
                speaker = %speaker,
                "Turn flip lost a race; rejecting as stale"
            );
            return Err(CoordinatorError::StaleTurn(case.case_id));
        }

        tracing::info!(
            case_id = %case.case_id,
            speaker = %speaker,
            waiting_for = %next,
            "Turn completed"
        );

        Ok(TurnReceipt {
            message,
            reply,
            waiting_for: next,
        })
    }
}
