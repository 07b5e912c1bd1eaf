//! Upload controller.
//!
//! Holds the single active file and the visible upload status. Uploads are
//! not single-flight: selecting another file while one is on its way simply
//! replaces the state, and whichever request finishes last decides the final
//! status.

use std::sync::Arc;
use std::time::Instant;

use crate::client::QaService;
use crate::error::{FailureKind, Result};
use crate::observability::{UPLOAD_DURATION, UPLOAD_FAILURES, UPLOAD_REQUESTS};
use crate::types::{SelectedFile, UploadReceipt, UploadStatus};

/// An upload that has been started but whose request has not been sent.
///
/// Produced by [`UploadState::select_file`]; turning it into an
/// [`UploadCompletion`] performs the request.
#[derive(Debug)]
pub struct UploadTicket {
    generation: u64,
    file: Arc<SelectedFile>,
    started: Instant,
}

impl UploadTicket {
    /// Returns the selection number this upload belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the file being uploaded.
    pub fn file(&self) -> &SelectedFile {
        &self.file
    }

    /// Performs the upload against `service`.
    pub async fn send<S: QaService + ?Sized>(self, service: &S) -> UploadCompletion {
        UPLOAD_REQUESTS.click();
        let outcome = service.upload(&self.file).await;
        UploadCompletion {
            ticket: self,
            outcome,
        }
    }
}

/// The result of an upload request, waiting to be applied to the state.
#[derive(Debug)]
pub struct UploadCompletion {
    ticket: UploadTicket,
    outcome: Result<Option<UploadReceipt>>,
}

impl UploadCompletion {
    /// Pairs a ticket with an outcome obtained some other way.
    pub fn new(ticket: UploadTicket, outcome: Result<Option<UploadReceipt>>) -> Self {
        Self { ticket, outcome }
    }

    /// Returns the selection number this completion belongs to.
    pub fn generation(&self) -> u64 {
        self.ticket.generation
    }

    /// Returns true if the request succeeded.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Current file and status of the upload controller.
#[derive(Debug, Default)]
pub struct UploadState {
    file: Option<Arc<SelectedFile>>,
    status: UploadStatus,
    generation: u64,
    receipt: Option<UploadReceipt>,
}

impl UploadState {
    /// Creates an idle upload state with no file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the active file and marks the upload as in progress.
    ///
    /// The returned ticket carries the request to make; the previous file is
    /// dropped from the state even if its upload is still running.
    pub fn select_file(&mut self, file: SelectedFile) -> UploadTicket {
        self.generation += 1;
        let file = Arc::new(file);
        self.file = Some(Arc::clone(&file));
        self.status = UploadStatus::Uploading;
        self.receipt = None;
        tracing::debug!(
            generation = self.generation,
            file = file.file_name(),
            bytes = file.len(),
            "upload started"
        );
        UploadTicket {
            generation: self.generation,
            file,
            started: Instant::now(),
        }
    }

    /// Applies the outcome of an upload request and returns the new status.
    ///
    /// Failures are absorbed here: the status becomes `Failed` and the error
    /// only reaches the log.
    pub fn complete(&mut self, completion: UploadCompletion) -> UploadStatus {
        let UploadCompletion { ticket, outcome } = completion;
        UPLOAD_DURATION.add(ticket.started.elapsed().as_secs_f64());
        if ticket.generation != self.generation {
            tracing::debug!(
                generation = ticket.generation,
                current = self.generation,
                "applying completion of a superseded upload"
            );
        }
        match outcome {
            Ok(receipt) => {
                if let Some(message) = receipt.as_ref().and_then(|r| r.error.as_deref()) {
                    tracing::warn!(
                        file = ticket.file.file_name(),
                        error = message,
                        "service reported an error in a successful upload response"
                    );
                }
                self.status = UploadStatus::Success;
                self.receipt = receipt;
            }
            Err(err) => {
                UPLOAD_FAILURES.click();
                tracing::warn!(
                    kind = %FailureKind::UploadFailed,
                    file = ticket.file.file_name(),
                    error = %err,
                    "upload failed"
                );
                self.status = UploadStatus::Failed;
                self.receipt = None;
            }
        }
        self.status
    }

    /// Returns the current status.
    pub fn status(&self) -> UploadStatus {
        self.status
    }

    /// Returns the status line shown to the user.
    pub fn display_text(&self) -> &'static str {
        self.status.display_text()
    }

    /// Returns the active file, if one was selected.
    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_deref()
    }

    /// Returns the receipt of the last successful upload, if it had one.
    pub fn receipt(&self) -> Option<&UploadReceipt> {
        self.receipt.as_ref()
    }

    /// Returns how many files have been selected so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn file(name: &str) -> SelectedFile {
        SelectedFile::new(name, b"%PDF".to_vec())
    }

    #[test]
    fn starts_idle() {
        let state = UploadState::new();
        assert_eq!(state.status(), UploadStatus::Idle);
        assert_eq!(state.display_text(), "");
        assert!(state.file().is_none());
        assert_eq!(state.generation(), 0);
    }

    #[test]
    fn select_file_marks_uploading() {
        let mut state = UploadState::new();
        let ticket = state.select_file(file("a.pdf"));
        assert_eq!(ticket.generation(), 1);
        assert_eq!(ticket.file().file_name(), "a.pdf");
        assert_eq!(state.status(), UploadStatus::Uploading);
        assert_eq!(state.file().map(SelectedFile::file_name), Some("a.pdf"));
    }

    #[test]
    fn success_sets_literal_text_and_keeps_receipt() {
        let mut state = UploadState::new();
        let ticket = state.select_file(file("a.pdf"));
        let receipt = UploadReceipt {
            status: Some("success".to_string()),
            chunks: Some(7),
            error: None,
        };
        let status = state.complete(UploadCompletion::new(ticket, Ok(Some(receipt))));
        assert_eq!(status, UploadStatus::Success);
        assert_eq!(state.display_text(), "File processed successfully!");
        assert_eq!(state.receipt().and_then(|r| r.chunks), Some(7));
    }

    #[test]
    fn failure_sets_literal_text() {
        let mut state = UploadState::new();
        let ticket = state.select_file(file("a.pdf"));
        let status = state.complete(UploadCompletion::new(
            ticket,
            Err(Error::api(500, "boom")),
        ));
        assert_eq!(status, UploadStatus::Failed);
        assert_eq!(state.display_text(), "Failed to upload file.");
        assert!(state.receipt().is_none());
        assert_eq!(state.file().map(SelectedFile::file_name), Some("a.pdf"));
    }

    #[test]
    fn new_selection_replaces_file() {
        let mut state = UploadState::new();
        let first = state.select_file(file("a.pdf"));
        let status = state.complete(UploadCompletion::new(first, Ok(None)));
        assert_eq!(status, UploadStatus::Success);

        let _second = state.select_file(file("b.docx"));
        assert_eq!(state.status(), UploadStatus::Uploading);
        assert_eq!(state.file().map(SelectedFile::file_name), Some("b.docx"));
        assert!(state.receipt().is_none());
        assert_eq!(state.generation(), 2);
    }

    #[test]
    fn last_completion_wins_even_when_stale() {
        let mut state = UploadState::new();
        let first = state.select_file(file("a.pdf"));
        let second = state.select_file(file("b.pdf"));

        state.complete(UploadCompletion::new(second, Ok(None)));
        assert_eq!(state.status(), UploadStatus::Success);

        // The older request finishing later still decides the visible status.
        state.complete(UploadCompletion::new(first, Err(Error::api(502, ""))));
        assert_eq!(state.status(), UploadStatus::Failed);
        assert_eq!(state.file().map(SelectedFile::file_name), Some("b.pdf"));
    }
}
