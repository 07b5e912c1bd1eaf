use std::fmt;

/// Visible state of the current upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadStatus {
    /// No file has been selected yet.
    #[default]
    Idle,
    /// The file is on its way to the service.
    Uploading,
    /// The service accepted the file.
    Success,
    /// The request failed or the service rejected it.
    Failed,
}

impl UploadStatus {
    /// Returns the status line shown to the user.
    pub fn display_text(self) -> &'static str {
        match self {
            UploadStatus::Idle => "",
            UploadStatus::Uploading => "Uploading...",
            UploadStatus::Success => "File processed successfully!",
            UploadStatus::Failed => "Failed to upload file.",
        }
    }

    /// Returns true while a request is outstanding.
    pub fn is_uploading(self) -> bool {
        self == UploadStatus::Uploading
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_text())
    }
}
