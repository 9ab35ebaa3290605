//! Chat session state machine.
//!
//! A [`ChatSession`] mediates one conversation about one case. History is
//! append-only, at most one request is in flight at a time, and every failure
//! ends up in [`ChatSession::last_error`] instead of being returned.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{SecondsFormat, Utc};
use lexdesk_core::chat::{CaseSummaryReply, ChatReply};
use lexdesk_core::{CaseId, ChatMessage};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{ChatBackend, ClientError};

/// Shown for transport failures: unreachable server, timeout, bad status,
/// undecodable body.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error: could not reach the AI assistant. Please try again.";
/// Fallback when a chat reply reports failure without saying why.
pub const REPLY_FAILED_MESSAGE: &str = "The AI assistant could not answer your message.";
/// Fallback when a summary reply reports failure without saying why.
pub const SUMMARY_FAILED_MESSAGE: &str = "Failed to generate a case summary.";

const EVENT_CAPACITY: usize = 64;

/// Server-side identity of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Conversation {
    /// No exchange has succeeded yet; the next message opens a session.
    #[default]
    NotStarted,
    /// Pinned to `session_id` until the session is reset.
    Started { session_id: String },
}

impl Conversation {
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::NotStarted => None,
            Self::Started { session_id } => Some(session_id),
        }
    }

    /// `NotStarted -> Started`. Returns false if already started; the existing
    /// id is kept.
    fn start(&mut self, session_id: String) -> bool {
        match self {
            Self::NotStarted => {
                *self = Self::Started { session_id };
                true
            }
            Self::Started { .. } => false,
        }
    }
}

/// Change notifications for views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The history grew; views scroll to the bottom on this.
    MessagesChanged { len: usize },
    PendingChanged(bool),
    ErrorChanged(Option<String>),
    Reset,
}

/// What happened to a call on [`ChatSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input or a request already in flight. Nothing was sent.
    Ignored,
    /// An assistant message was appended.
    Replied,
    /// The attempt failed; see [`ChatSession::last_error`].
    Failed,
    /// The session was reset while the request was in flight; the reply was
    /// dropped.
    Discarded,
}

/// Point-in-time copy of the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub case_id: CaseId,
    pub session_id: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub pending: bool,
    pub last_error: Option<String>,
}

#[derive(Default)]
struct State {
    conversation: Conversation,
    messages: Vec<ChatMessage>,
    pending: bool,
    last_error: Option<String>,
    /// Bumped by `reset` so replies to a discarded conversation are dropped.
    generation: u64,
}

/// One conversation thread about one case.
///
/// All methods take `&self`. The state lock is never held across an
/// `.await`, so a view can read state while a request is in flight.
pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    case_id: CaseId,
    state: Mutex<State>,
    events: broadcast::Sender<SessionEvent>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, case_id: impl Into<CaseId>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            case_id: case_id.into(),
            state: Mutex::new(State::default()),
            events,
        }
    }

    /// Send `text` as the next user message.
    ///
    /// Blank text, or a call while another request is in flight, is dropped
    /// without an HTTP call. Otherwise the user message is appended at once and
    /// exactly one request goes out: to the start endpoint until a session id
    /// is known, to the continue endpoint afterwards.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }

        let echo = ChatMessage::user(text, now());
        let Some((generation, conversation)) = self.begin(Some(echo)) else {
            return SendOutcome::Ignored;
        };

        let result = match &conversation {
            Conversation::NotStarted => {
                info!(case_id = %self.case_id, "starting chat session");
                self.backend.start_session(&self.case_id, text).await
            }
            Conversation::Started { session_id } => {
                debug!(session_id = %session_id, "continuing chat session");
                self.backend.continue_session(session_id, text).await
            }
        };

        self.finish(generation, |session, state| match result {
            Ok(reply) => session.apply_chat_reply(state, reply),
            Err(e) => session.transport_failure(state, &e),
        })
    }

    /// Ask the backend for a summary of this case and append it as an
    /// assistant message. Independent of the session id.
    pub async fn generate_case_summary(&self) -> SendOutcome {
        let Some((generation, _)) = self.begin(None) else {
            return SendOutcome::Ignored;
        };

        info!(case_id = %self.case_id, "requesting case summary");
        let result = self.backend.case_summary(&self.case_id).await;

        self.finish(generation, |session, state| match result {
            Ok(reply) => session.apply_summary_reply(state, reply),
            Err(e) => session.transport_failure(state, &e),
        })
    }

    /// Forget the conversation: history, session id, error, and in-flight
    /// flag. A reply still in flight will be discarded when it lands.
    pub fn reset(&self) {
        let mut state = self.state();
        let was_pending = state.pending;
        let generation = state.generation.wrapping_add(1);
        *state = State {
            generation,
            ..State::default()
        };
        info!(case_id = %self.case_id, "chat session reset");
        if was_pending {
            self.emit(SessionEvent::PendingChanged(false));
        }
        self.emit(SessionEvent::Reset);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn case_id(&self) -> &CaseId {
        &self.case_id
    }

    pub fn session_id(&self) -> Option<String> {
        self.state().conversation.session_id().map(str::to_string)
    }

    pub fn conversation(&self) -> Conversation {
        self.state().conversation.clone()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state().messages.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.state().pending
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            case_id: self.case_id.clone(),
            session_id: state.conversation.session_id().map(str::to_string),
            messages: state.messages.clone(),
            pending: state.pending,
            last_error: state.last_error.clone(),
        }
    }

    // ── Transitions ──

    /// Claim the in-flight slot. Returns `None` if a request is already
    /// pending, leaving the state untouched.
    fn begin(&self, echo: Option<ChatMessage>) -> Option<(u64, Conversation)> {
        let mut state = self.state();
        if state.pending {
            debug!(case_id = %self.case_id, "request already in flight, dropping");
            return None;
        }

        if let Some(message) = echo {
            state.messages.push(message);
            self.emit(SessionEvent::MessagesChanged {
                len: state.messages.len(),
            });
        }
        state.pending = true;
        self.emit(SessionEvent::PendingChanged(true));
        if state.last_error.take().is_some() {
            self.emit(SessionEvent::ErrorChanged(None));
        }

        Some((state.generation, state.conversation.clone()))
    }

    /// Apply the outcome of a request and release the in-flight slot, unless
    /// the session was reset in the meantime.
    fn finish<F>(&self, generation: u64, apply: F) -> SendOutcome
    where
        F: FnOnce(&Self, &mut State) -> SendOutcome,
    {
        let mut state = self.state();
        if state.generation != generation {
            debug!(case_id = %self.case_id, "session reset during request, dropping reply");
            return SendOutcome::Discarded;
        }

        let outcome = apply(self, &mut state);
        state.pending = false;
        self.emit(SessionEvent::PendingChanged(false));
        outcome
    }

    fn apply_chat_reply(&self, state: &mut State, reply: ChatReply) -> SendOutcome {
        if !reply.success {
            return self.application_failure(state, reply.error, REPLY_FAILED_MESSAGE);
        }
        let Some(payload) = reply.message else {
            warn!(case_id = %self.case_id, "successful chat reply without a message");
            return self.application_failure(state, None, REPLY_FAILED_MESSAGE);
        };

        if let Some(session_id) = reply.session_id {
            if state.conversation.start(session_id.clone()) {
                info!(session_id = %session_id, case_id = %self.case_id, "chat session started");
            }
        } else if state.conversation == Conversation::NotStarted {
            warn!(case_id = %self.case_id, "start reply carried no session id");
        }

        let timestamp = payload.timestamp.unwrap_or_else(now);
        self.append(state, ChatMessage::assistant(payload.content, timestamp));
        SendOutcome::Replied
    }

    fn apply_summary_reply(&self, state: &mut State, reply: CaseSummaryReply) -> SendOutcome {
        match reply.summary {
            Some(summary) if reply.success => {
                let content = format!("Case Summary:\n\n{summary}");
                self.append(state, ChatMessage::assistant(content, now()));
                SendOutcome::Replied
            }
            _ => self.application_failure(state, reply.error, SUMMARY_FAILED_MESSAGE),
        }
    }

    fn transport_failure(&self, state: &mut State, error: &ClientError) -> SendOutcome {
        warn!(case_id = %self.case_id, error = %error, "AI chat request failed");
        self.set_error(state, NETWORK_ERROR_MESSAGE.to_string());
        SendOutcome::Failed
    }

    fn application_failure(
        &self,
        state: &mut State,
        error: Option<String>,
        fallback: &str,
    ) -> SendOutcome {
        let message = error
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        info!(case_id = %self.case_id, error = %message, "AI chat request rejected");
        self.set_error(state, message);
        SendOutcome::Failed
    }

    fn append(&self, state: &mut State, message: ChatMessage) {
        state.messages.push(message);
        self.emit(SessionEvent::MessagesChanged {
            len: state.messages.len(),
        });
    }

    fn set_error(&self, state: &mut State, message: String) {
        state.last_error = Some(message.clone());
        self.emit(SessionEvent::ErrorChanged(Some(message)));
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
