//! Mock mediator for testing
//!
//! Returns queued replies without real I/O and records every request.

use super::{MediatorError, MediatorService};
use crate::store::{Party, PartyNames};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

type CallHook = Box<dyn Fn() + Send + Sync>;

pub struct MockMediator {
    replies: Mutex<VecDeque<Result<String, MediatorError>>>,
    /// Record of (message, speaker) for every call made
    pub requests: Mutex<Vec<(String, Party)>>,
    /// Invoked at the start of each call, before the reply is taken.
    /// Lets tests interleave writes while a turn is mid-flight.
    on_call: Mutex<Option<CallHook>>,
}

impl MockMediator {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            on_call: Mutex::new(None),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    /// Queue an error
    pub fn queue_error(&self, error: MediatorError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn set_call_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_call.lock().unwrap() = Some(Box::new(hook));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<(String, Party)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockMediator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediatorService for MockMediator {
    async fn generate_reply(
        &self,
        message: &str,
        speaker: Party,
        _names: &PartyNames,
    ) -> Result<String, MediatorError> {
        if let Some(hook) = self.on_call.lock().unwrap().as_ref() {
            hook();
        }
        self.requests
            .lock()
            .unwrap()
            .push((message.to_string(), speaker));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MediatorError::network("No mock reply queued")))
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}
