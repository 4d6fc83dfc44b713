//! Chat session controller: the active conversation, the pending reply, and the list of
//! archived sessions.
//!
//! The controller exclusively owns its message list and recent sessions; callers read
//! slices. Every mutating operation takes `&mut self`, so archival, session loading and
//! sends can never interleave on one controller.

use std::sync::Arc;

use crate::core::credentials::CredentialStore;
use crate::core::markdown::normalize_response;
use crate::core::message::{ChatMessage, ChatSession, Sender};
use crate::core::notify::Notifier;
use crate::core::title::extract_title;
use crate::core::transport::{ChatReply, ErrorKind, Transport, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    /// No messages, empty draft.
    Idle,
    /// No messages yet, draft being typed.
    Composing,
    /// A message was sent; the loading placeholder is showing.
    AwaitingResponse,
    /// At least one exchange completed; ready for the next message.
    Conversing,
}

/// Ticket for a send that has been submitted but not completed.
#[derive(Debug)]
pub struct PendingSend {
    generation: u64,
    text: String,
}

impl PendingSend {
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing was sent: blank draft, or a reply is still pending.
    Ignored,
    Delivered,
    Failed(ErrorKind),
    /// The conversation was reset while the reply was in flight; the reply was dropped.
    Stale,
}

pub struct SessionController {
    messages: Vec<ChatMessage>,
    draft: String,
    recent: Vec<ChatSession>,
    awaiting: bool,
    /// Bumped whenever the active conversation is replaced.
    generation: u64,
    login_required: bool,
    credentials: Arc<dyn CredentialStore>,
    notifier: Arc<dyn Notifier>,
}

impl SessionController {
    pub fn new(credentials: Arc<dyn CredentialStore>, notifier: Arc<dyn Notifier>) -> Self {
        SessionController {
            messages: Vec::new(),
            draft: String::new(),
            recent: Vec::new(),
            awaiting: false,
            generation: 0,
            login_required: false,
            credentials,
            notifier,
        }
    }

    pub fn state(&self) -> ChatState {
        if self.awaiting {
            ChatState::AwaitingResponse
        } else if !self.messages.is_empty() {
            ChatState::Conversing
        } else if !self.draft.trim().is_empty() {
            ChatState::Composing
        } else {
            ChatState::Idle
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Archived sessions, oldest first.
    pub fn recent_sessions(&self) -> &[ChatSession] {
        &self.recent
    }

    /// Set after an authentication failure; the front end should send the user to log in.
    pub fn login_required(&self) -> bool {
        self.login_required
    }

    pub fn acknowledge_login(&mut self) {
        self.login_required = false;
    }

    fn log_transition(&self, before: ChatState) {
        let after = self.state();
        if before != after {
            log::debug!("session {:?} -> {:?}", before, after);
        }
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        let before = self.state();
        self.draft = text.into();
        self.log_transition(before);
    }

    /// Submit the draft: append it with a loading placeholder and clear the draft.
    ///
    /// Returns `None` without touching anything when the draft is blank or a reply is
    /// already pending.
    pub fn begin_send(&mut self) -> Option<PendingSend> {
        if self.awaiting {
            log::debug!("send ignored: a reply is still pending");
            return None;
        }
        let text = self.draft.trim();
        if text.is_empty() {
            return None;
        }
        let text = text.to_string();
        let before = self.state();
        let message = ChatMessage::user(text.clone());
        log::debug!("message {} submitted", message.id);
        self.messages.push(message);
        self.messages.push(ChatMessage::loading());
        self.draft.clear();
        self.awaiting = true;
        self.log_transition(before);
        Some(PendingSend {
            generation: self.generation,
            text,
        })
    }

    /// Replace the loading placeholder with the reply, or with exactly one error message.
    pub fn complete_send(
        &mut self,
        pending: PendingSend,
        result: Result<ChatReply, TransportError>,
    ) -> SendOutcome {
        if pending.generation != self.generation {
            log::debug!("dropping reply for a conversation that was reset");
            return SendOutcome::Stale;
        }
        let before = self.state();
        self.messages.retain(|m| !m.is_loading);
        self.awaiting = false;
        let outcome = match result {
            Ok(reply) => {
                self.messages
                    .push(ChatMessage::bot(normalize_response(&reply.response)));
                SendOutcome::Delivered
            }
            Err(e) => {
                log::warn!("message not delivered: {}", e);
                let message = e.user_message().to_string();
                self.messages.push(ChatMessage::error(message.clone()));
                self.notifier.notify_error(&message);
                if e.kind == ErrorKind::Authentication {
                    self.require_login();
                }
                SendOutcome::Failed(e.kind)
            }
        };
        self.log_transition(before);
        outcome
    }

    /// Submit the draft and wait for the reply.
    pub async fn send(&mut self, transport: &dyn Transport) -> SendOutcome {
        let Some(pending) = self.begin_send() else {
            return SendOutcome::Ignored;
        };
        let result = transport.send_message(pending.text()).await;
        self.complete_send(pending, result)
    }

    /// Archive the current conversation and start an empty one.
    ///
    /// Returns whether a new archive entry was added; empty conversations and duplicates of
    /// an existing entry are not archived.
    pub fn new_chat(&mut self) -> bool {
        let before = self.state();
        let history = std::mem::take(&mut self.messages);
        let archived = self.archive(history);
        self.draft.clear();
        self.reset_pending();
        self.log_transition(before);
        archived
    }

    /// Make an archived session the active conversation. Out-of-range indexes change nothing.
    pub fn load_session(&mut self, index: usize) -> bool {
        let Some(session) = self.recent.get(index) else {
            log::debug!("no archived session at index {}", index);
            return false;
        };
        let (title, history) = (session.title.clone(), session.history.clone());
        let before = self.state();
        self.messages = history;
        self.reset_pending();
        log::info!("loaded session \"{}\"", title);
        self.log_transition(before);
        true
    }

    /// Fetch the backend's conversation history and archive it as a session.
    ///
    /// Failures are logged and notified, never returned.
    pub async fn load_remote_history(&mut self, transport: &dyn Transport) -> bool {
        match transport.fetch_history().await {
            Ok(history) => {
                log::info!("fetched {} history messages", history.len());
                let archived = self.archive(history);
                if archived {
                    self.notifier.notify_success("Conversation history loaded.");
                }
                archived
            }
            Err(e) => {
                log::warn!("history not loaded: {}", e);
                self.notifier.notify_error(e.user_message());
                if e.kind == ErrorKind::Authentication {
                    self.require_login();
                }
                false
            }
        }
    }

    fn reset_pending(&mut self) {
        self.awaiting = false;
        self.generation += 1;
    }

    fn require_login(&mut self) {
        if let Err(e) = self.credentials.remove_token() {
            log::error!("could not clear credentials: {}", e);
        }
        self.login_required = true;
    }

    fn archive(&mut self, history: Vec<ChatMessage>) -> bool {
        let history: Vec<ChatMessage> = history
            .into_iter()
            .filter(|m| !m.is_loading)
            .map(|mut m| {
                if m.sender == Sender::Bot && !m.is_error {
                    m.text = normalize_response(&m.text);
                }
                m
            })
            .collect();
        if history.is_empty() {
            return false;
        }
        let session = ChatSession::new(extract_title(&history), history);
        let fingerprint = session.content_fingerprint();
        let duplicate = self
            .recent
            .iter()
            .any(|s| s.title == session.title && s.content_fingerprint() == fingerprint);
        if duplicate {
            log::debug!("session \"{}\" already archived", session.title);
            return false;
        }
        log::info!(
            "archived session \"{}\" ({} messages)",
            session.title,
            session.history.len()
        );
        self.recent.push(session);
        true
    }
}
