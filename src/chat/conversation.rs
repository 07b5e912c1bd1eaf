//! Conversation controller.
//!
//! The transcript is append-only and always opens with a greeting from the
//! assistant. Questions are single-flight: [`ChatPhase::Pending`] rejects any
//! further question until the outstanding one has been answered or has
//! failed.

use std::time::Instant;

use crate::client::QaService;
use crate::error::{FailureKind, Result};
use crate::observability::{CHAT_DURATION, CHAT_FAILURES, CHAT_REJECTED, CHAT_REQUESTS};
use crate::types::{ChatRequest, ChatResponse, Message};

/// Greeting placed at the top of every transcript.
pub const DEFAULT_GREETING: &str =
    "Hello! Upload a PDF or DOCX document and ask me anything about it.";

/// Assistant reply appended when a question fails for any reason.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Whether a question is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatPhase {
    /// Input is enabled.
    #[default]
    Idle,
    /// A question has been sent and its answer has not arrived.
    Pending,
}

/// A question accepted by the conversation and not yet answered.
///
/// There is at most one of these alive per conversation; it must come back
/// through [`Conversation::complete`] to re-enable input.
#[derive(Debug)]
pub struct PendingQuestion {
    number: u64,
    request: ChatRequest,
    started: Instant,
}

impl PendingQuestion {
    /// Returns which question of its conversation this is, starting at 1.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Returns the request to send.
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    /// Sends the question to `service`.
    pub async fn send<S: QaService + ?Sized>(self, service: &S) -> ChatCompletion {
        CHAT_REQUESTS.click();
        let outcome = service.chat(&self.request).await;
        ChatCompletion {
            question: self,
            outcome,
        }
    }
}

/// The answer (or failure) for a pending question.
#[derive(Debug)]
pub struct ChatCompletion {
    question: PendingQuestion,
    outcome: Result<ChatResponse>,
}

impl ChatCompletion {
    /// Pairs a pending question with an outcome obtained some other way.
    pub fn new(question: PendingQuestion, outcome: Result<ChatResponse>) -> Self {
        Self { question, outcome }
    }

    /// Returns true if the service answered.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// The message transcript and the single-flight question state.
#[derive(Debug)]
pub struct Conversation {
    transcript: Vec<Message>,
    phase: ChatPhase,
    asked: u64,
}

impl Conversation {
    /// Starts a transcript containing only `greeting`.
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            transcript: vec![Message::assistant(greeting)],
            phase: ChatPhase::Idle,
            asked: 0,
        }
    }

    /// Accepts a question.
    ///
    /// Returns `None` without touching the transcript if `text` is blank or
    /// another question is pending. Otherwise the user message is appended
    /// right away, the conversation becomes pending, and the untrimmed text is
    /// returned as the request to send.
    pub fn begin(&mut self, text: &str) -> Option<PendingQuestion> {
        if text.trim().is_empty() {
            return None;
        }
        if self.phase == ChatPhase::Pending {
            CHAT_REJECTED.click();
            tracing::debug!("question rejected while another is pending");
            return None;
        }
        self.transcript.push(Message::user(text));
        self.phase = ChatPhase::Pending;
        self.asked += 1;
        Some(PendingQuestion {
            number: self.asked,
            request: ChatRequest::new(text),
            started: Instant::now(),
        })
    }

    /// Appends the answer for the pending question and re-enables input.
    ///
    /// A failure of any kind becomes [`FALLBACK_REPLY`]. Returns the appended
    /// assistant message, or `None` if `completion` does not answer the
    /// outstanding question; such a completion leaves the conversation as it
    /// was.
    pub fn complete(&mut self, completion: ChatCompletion) -> Option<&Message> {
        let ChatCompletion { question, outcome } = completion;
        if self.phase != ChatPhase::Pending || question.number != self.asked {
            tracing::debug!(
                question = question.number,
                outstanding = self.asked,
                pending = self.is_pending(),
                "ignoring completion for a question that is not outstanding"
            );
            return None;
        }
        CHAT_DURATION.add(question.started.elapsed().as_secs_f64());
        let message = match outcome {
            Ok(response) => Message::answer(response.response, response.source_docs),
            Err(err) => {
                CHAT_FAILURES.click();
                tracing::warn!(
                    kind = %FailureKind::ChatFailed,
                    error = %err,
                    "question failed"
                );
                Message::assistant(FALLBACK_REPLY)
            }
        };
        self.phase = ChatPhase::Idle;
        self.transcript.push(message);
        self.transcript.last()
    }

    /// Returns the transcript, greeting first.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Returns the current phase.
    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    /// Returns true while a question is outstanding.
    pub fn is_pending(&self) -> bool {
        self.phase == ChatPhase::Pending
    }

    /// Returns the most recent assistant message.
    pub fn last_assistant_message(&self) -> Option<&Message> {
        self.transcript.iter().rev().find(|message| !message.is_user())
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_GREETING)
    }
}
