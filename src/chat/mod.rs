//! Chat flow
//!
//! Owns the session's message log and the chat panel state. One request per
//! sent message; the user's message is appended before the request leaves,
//! and exactly one bot message (reply or error) follows once it resolves.

use crate::error::ErrorKind;
use crate::models::{chat_reply_text, ChatMessage, ChatRequest, Sender};
use crate::state::{FlowLifecycle, RequestState};
use crate::transport::Transport;
use crate::Result;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, warn};

pub mod log;
pub use log::ChatLog;

/// Shown when the service answers without a usable `response`
pub const NO_RESPONSE_TEXT: &str = "No response from model";
/// Shown in place of a reply when the exchange fails
pub const BACKEND_ERROR_TEXT: &str = "⚠️ Error: could not reach backend.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Replied,
    /// Transport failed; an error message was appended to the log
    Failed(ErrorKind),
    /// Blank input; nothing happened
    Empty,
    /// A message is already in flight; nothing happened
    Busy,
    /// Flow was disposed; the reply was dropped
    Detached,
}

/// Render-ready copy of the chat panel
#[derive(Debug, Clone)]
pub struct ChatView {
    pub log: ChatLog,
    pub input: String,
    pub is_open: bool,
    pub request_state: RequestState,
}

#[derive(Default)]
struct ChatState {
    log: ChatLog,
    input: String,
    is_open: bool,
}

struct ChatInner {
    transport: Arc<dyn Transport>,
    endpoint: String,
    lifecycle: FlowLifecycle,
    state: RwLock<ChatState>,
}

/// Cheap to clone; clones drive the same session
#[derive(Clone)]
pub struct ChatFlow {
    inner: Arc<ChatInner>,
}

impl ChatFlow {
    pub fn new(transport: Arc<dyn Transport>, endpoint: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ChatInner {
                transport,
                endpoint: endpoint.into(),
                lifecycle: FlowLifecycle::new(),
                state: RwLock::new(ChatState::default()),
            }),
        }
    }

    pub async fn snapshot(&self) -> ChatView {
        let state = self.inner.state.read().await;
        ChatView {
            log: state.log.clone(),
            input: state.input.clone(),
            is_open: state.is_open,
            request_state: self.request_state(),
        }
    }

    pub fn request_state(&self) -> RequestState {
        self.inner.lifecycle.request_state()
    }

    /// Revision counter bumped on every visible change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.lifecycle.subscribe()
    }

    pub async fn set_input(&self, text: impl Into<String>) {
        self.inner.state.write().await.input = text.into();
        self.inner.lifecycle.notify();
    }

    // =============================
    // Panel visibility
    // =============================

    pub async fn open(&self) {
        self.set_open(true).await;
    }

    pub async fn close(&self) {
        self.set_open(false).await;
    }

    pub async fn toggle(&self) -> bool {
        let is_open = {
            let mut state = self.inner.state.write().await;
            state.is_open = !state.is_open;
            state.is_open
        };
        self.inner.lifecycle.notify();
        is_open
    }

    pub async fn is_open(&self) -> bool {
        self.inner.state.read().await.is_open
    }

    async fn set_open(&self, is_open: bool) {
        self.inner.state.write().await.is_open = is_open;
        self.inner.lifecycle.notify();
    }

    // =============================
    // Sending
    // =============================

    /// Send whatever is in the input buffer
    pub async fn send_input(&self) -> SendOutcome {
        self.send(None).await
    }

    pub async fn send_message(&self, text: impl Into<String>) -> SendOutcome {
        self.send(Some(text.into())).await
    }

    /// `None` takes the input buffer under the same guard that appends it
    async fn send(&self, text: Option<String>) -> SendOutcome {
        if matches!(&text, Some(text) if text.trim().is_empty()) {
            return SendOutcome::Empty;
        }

        let lifecycle = &self.inner.lifecycle;
        if lifecycle.is_detached() {
            return SendOutcome::Detached;
        }

        let Some(_pending) = lifecycle.try_begin() else {
            warn!("Chat message ignored: previous message still in flight");
            return SendOutcome::Busy;
        };

        let text = {
            let mut state = self.inner.state.write().await;
            let text = match text {
                Some(text) => {
                    state.input.clear();
                    text
                }
                None if state.input.trim().is_empty() => return SendOutcome::Empty,
                None => std::mem::take(&mut state.input),
            };
            state.log.append(ChatMessage::user(text.clone()));
            text
        };
        lifecycle.notify();

        info!(endpoint = %self.inner.endpoint, "Sending chat message");
        let result = self.exchange(text).await;

        let (reply, outcome) = match result {
            Ok(body) => {
                let text = chat_reply_text(&body).unwrap_or_else(|| {
                    warn!("Chat response carried no reply text");
                    NO_RESPONSE_TEXT
                });
                (ChatMessage::bot(text), SendOutcome::Replied)
            }
            Err(e) => {
                error!(endpoint = %self.inner.endpoint, "Chat request failed: {}", e);
                (ChatMessage::bot(BACKEND_ERROR_TEXT), SendOutcome::Failed(e.kind()))
            }
        };

        {
            let mut state = self.inner.state.write().await;
            // dispose() may land while waiting for the lock
            if lifecycle.is_detached() {
                debug!("Chat panel disposed mid-request; dropping reply");
                return SendOutcome::Detached;
            }
            state.log.append(reply);
        }
        lifecycle.notify();
        info!(outcome = ?outcome, "Chat exchange finished");

        outcome
    }

    async fn exchange(&self, message: String) -> Result<Value> {
        let body = serde_json::to_value(ChatRequest { message })?;
        self.inner.transport.send(&self.inner.endpoint, body).await
    }

    /// Unmount: late replies are dropped instead of applied
    pub fn dispose(&self) {
        self.inner.lifecycle.detach();
    }
}

/// One line per message, as the terminal shows it
pub fn render_message(message: &ChatMessage) -> String {
    match message.sender {
        Sender::User => format!("you> {}", message.text),
        Sender::Bot => format!("bot> {}", message.text),
    }
}

pub fn send_button_label(state: RequestState) -> &'static str {
    match state {
        RequestState::Pending => "...",
        RequestState::Idle => "Send",
    }
}
