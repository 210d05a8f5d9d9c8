//! Conversation with the finance assistant.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::ApiClient;
use crate::clock::{Clock, SystemClock};

pub const GREETING: &str = "Hello! I'm your AI finance assistant. I can help you with financial insights, budgeting advice, and answer questions about your money. What would you like to know?";
pub const ERROR_REPLY: &str = "I'm sorry, I encountered an error. Please try again.";
pub const MAX_SUGGESTIONS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// Set on the canned reply that replaces a failed request.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Replied(ChatMessage),
    /// Blank input; nothing was sent.
    Ignored,
    /// Another message is still waiting for its reply.
    Busy,
}

pub struct ChatSession {
    client: ApiClient,
    clock: Arc<dyn Clock>,
    transcript: Mutex<Vec<ChatMessage>>,
    pending: AtomicBool,
}

struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ChatSession {
    pub fn new(client: ApiClient) -> Self {
        Self::with_clock(client, Arc::new(SystemClock))
    }

    pub fn with_clock(client: ApiClient, clock: Arc<dyn Clock>) -> Self {
        let greeting = ChatMessage {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            text: GREETING.to_string(),
            timestamp: clock.now(),
            suggestions: Vec::new(),
            failed: false,
        };
        Self {
            client,
            clock,
            transcript: Mutex::new(vec![greeting]),
            pending: AtomicBool::new(false),
        }
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.lock().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ChatMessage>> {
        self.transcript
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn push(&self, role: Role, text: String, suggestions: Vec<String>, failed: bool) -> ChatMessage {
        let message = ChatMessage {
            id: Uuid::new_v4(),
            role,
            text,
            timestamp: self.clock.now(),
            suggestions,
            failed,
        };
        self.lock().push(message.clone());
        message
    }

    /// Sends `text` and appends both sides of the exchange to the transcript.
    ///
    /// Server failures never surface as errors: the assistant answers with
    /// [`ERROR_REPLY`] instead.
    pub async fn send(&self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Ignored;
        }
        if self
            .pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Chat request already pending");
            return SendOutcome::Busy;
        }
        let _pending = PendingGuard(&self.pending);

        self.push(Role::User, text.to_string(), Vec::new(), false);
        let reply = match self.client.send_chat_message(text).await {
            Ok(reply) => self.push(Role::Assistant, reply.response, reply.suggestions, false),
            Err(err) => {
                warn!(error = %err, "Chat request failed");
                self.push(Role::Assistant, ERROR_REPLY.to_string(), Vec::new(), true)
            }
        };
        SendOutcome::Replied(reply)
    }

    /// Starter prompts, at most [`MAX_SUGGESTIONS`]. Failures yield none.
    pub async fn suggestions(&self) -> Vec<String> {
        match self.client.chat_suggestions().await {
            Ok(mut suggestions) => {
                suggestions.truncate(MAX_SUGGESTIONS);
                suggestions
            }
            Err(err) => {
                warn!(error = %err, "Failed to load chat suggestions");
                Vec::new()
            }
        }
    }
}
