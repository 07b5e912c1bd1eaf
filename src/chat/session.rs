//! Core chat session management.
//!
//! `ChatSession` owns the upload and conversation controllers together with
//! the service they talk to. Every state change goes through one of its
//! transition methods; rendering code only ever reads.

use std::path::Path;
use std::sync::Arc;

use crate::chat::config::ChatConfig;
use crate::chat::conversation::{ChatCompletion, ChatPhase, Conversation, PendingQuestion};
use crate::chat::upload::{UploadCompletion, UploadState, UploadTicket};
use crate::client::{DocumentQa, QaService};
use crate::error::Result;
use crate::picker::FilePicker;
use crate::types::{Message, SelectedFile, UploadReceipt, UploadStatus};

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// Number of messages in the transcript, greeting included.
    pub message_count: usize,
    /// Questions the user has sent.
    pub questions_sent: u64,
    /// Questions that ended with the fallback reply.
    pub questions_failed: u64,
    /// Questions refused because another one was pending.
    pub questions_rejected: u64,
    /// Files selected for upload.
    pub uploads_started: u64,
    /// Uploads that ended in failure.
    pub uploads_failed: u64,
    /// Whether a question is outstanding.
    pub pending: bool,
    /// Current upload status.
    pub upload_status: UploadStatus,
    /// Name of the active file, if any.
    pub active_file: Option<String>,
}

/// A chat session against a document Q&A service.
pub struct ChatSession<S: QaService = DocumentQa> {
    service: Arc<S>,
    picker: FilePicker,
    conversation: Conversation,
    upload: UploadState,
    questions_sent: u64,
    questions_failed: u64,
    questions_rejected: u64,
    uploads_failed: u64,
}

impl ChatSession<DocumentQa> {
    /// Creates a session talking HTTP to the service named in `config`.
    pub fn connect(config: &ChatConfig) -> Result<Self> {
        let client = DocumentQa::new(&config.base_url, config.timeout)?;
        Ok(Self::new(client, config))
    }
}

impl<S: QaService> ChatSession<S> {
    /// Creates a new chat session with the given service and configuration.
    pub fn new(service: S, config: &ChatConfig) -> Self {
        Self::with_service(Arc::new(service), config)
    }

    /// Creates a new chat session sharing an existing service handle.
    pub fn with_service(service: Arc<S>, config: &ChatConfig) -> Self {
        Self {
            service,
            picker: FilePicker::new(&config.accepted_extensions),
            conversation: Conversation::new(config.greeting.clone()),
            upload: UploadState::new(),
            questions_sent: 0,
            questions_failed: 0,
            questions_rejected: 0,
            uploads_failed: 0,
        }
    }

    /// Returns a handle to the service for running requests off the session.
    pub fn service(&self) -> Arc<S> {
        Arc::clone(&self.service)
    }

    /// Returns the file picker.
    pub fn picker(&self) -> &FilePicker {
        &self.picker
    }

    ////////////////////////////////////// Conversation //////////////////////////////////////

    /// Accepts a question and returns the request to send, or `None` if the
    /// input was blank or a question is already pending.
    pub fn begin_question(&mut self, text: &str) -> Option<PendingQuestion> {
        let was_pending = self.conversation.is_pending();
        let pending = self.conversation.begin(text);
        match pending {
            Some(_) => self.questions_sent += 1,
            None if was_pending && !text.trim().is_empty() => self.questions_rejected += 1,
            None => {}
        }
        pending
    }

    /// Applies the answer to the pending question and returns the appended
    /// assistant message.
    ///
    /// Returns `None`, changing nothing, if `completion` does not belong to
    /// the outstanding question.
    pub fn finish_question(&mut self, completion: ChatCompletion) -> Option<&Message> {
        let failed = !completion.is_success();
        let message = self.conversation.complete(completion)?;
        if failed {
            self.questions_failed += 1;
        }
        Some(message)
    }

    /// Sends a question and waits for the answer.
    ///
    /// Returns `None` if the question was not accepted. A failed request is
    /// not an error here: the fallback reply is appended and returned.
    pub async fn send_message(&mut self, text: &str) -> Option<&Message> {
        let pending = self.begin_question(text)?;
        let completion = pending.send(self.service.as_ref()).await;
        self.finish_question(completion)
    }

    /// Returns the transcript, greeting first.
    pub fn transcript(&self) -> &[Message] {
        self.conversation.transcript()
    }

    /// Returns the chat phase.
    pub fn phase(&self) -> ChatPhase {
        self.conversation.phase()
    }

    /// Returns true while a question is outstanding.
    pub fn is_pending(&self) -> bool {
        self.conversation.is_pending()
    }

    /// Returns the most recent assistant message.
    pub fn last_answer(&self) -> Option<&Message> {
        self.conversation.last_assistant_message()
    }

    //////////////////////////////////////// Uploads ////////////////////////////////////////

    /// Runs the file picker on `path`.
    ///
    /// Refusals and read errors are returned to the caller; the upload state
    /// is left untouched in that case.
    pub async fn pick_file(&self, path: impl AsRef<Path>) -> Result<SelectedFile> {
        self.picker.pick(path).await
    }

    /// Makes `file` the active file and returns the upload to perform.
    pub fn select_file(&mut self, file: SelectedFile) -> UploadTicket {
        self.upload.select_file(file)
    }

    /// Applies the outcome of an upload and returns the new status.
    pub fn finish_upload(&mut self, completion: UploadCompletion) -> UploadStatus {
        if !completion.is_success() {
            self.uploads_failed += 1;
        }
        self.upload.complete(completion)
    }

    /// Selects `file`, uploads it, and waits for the outcome.
    pub async fn upload(&mut self, file: SelectedFile) -> UploadStatus {
        let ticket = self.select_file(file);
        let completion = ticket.send(self.service.as_ref()).await;
        self.finish_upload(completion)
    }

    /// Returns the current upload status.
    pub fn upload_status(&self) -> UploadStatus {
        self.upload.status()
    }

    /// Returns the active file, if any.
    pub fn active_file(&self) -> Option<&SelectedFile> {
        self.upload.file()
    }

    /// Returns the receipt of the last successful upload, if it had one.
    pub fn upload_receipt(&self) -> Option<&UploadReceipt> {
        self.upload.receipt()
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            message_count: self.transcript().len(),
            questions_sent: self.questions_sent,
            questions_failed: self.questions_failed,
            questions_rejected: self.questions_rejected,
            uploads_started: self.upload.generation(),
            uploads_failed: self.uploads_failed,
            pending: self.is_pending(),
            upload_status: self.upload.status(),
            active_file: self.upload.file().map(|f| f.file_name().to_string()),
        }
    }
}
