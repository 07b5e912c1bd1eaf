//! File selection for uploads.
//!
//! The picker only filters by extension, the way an OS file dialog would. It
//! never inspects content; whether a file is usable is the service's call.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::SelectedFile;

/// Extensions offered by the picker when none are configured.
pub const DEFAULT_EXTENSIONS: [&str; 2] = [".pdf", ".docx"];

/// Chooses files for upload, restricted to a set of extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePicker {
    accepted: Vec<String>,
}

impl FilePicker {
    /// Creates a picker accepting the given extensions.
    ///
    /// Extensions may be written with or without the leading dot and are
    /// matched case-insensitively.
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        let accepted = extensions
            .iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .filter(|ext| ext.len() > 1)
            .collect();
        Self { accepted }
    }

    /// Returns the accepted extensions, each with a leading dot.
    pub fn accepted(&self) -> &[String] {
        &self.accepted
    }

    /// Returns true if the picker would offer this path.
    pub fn accepts(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        let ext = normalize_extension(ext);
        self.accepted.iter().any(|accepted| *accepted == ext)
    }

    /// Selects `path` and reads it into memory.
    pub async fn pick(&self, path: impl AsRef<Path>) -> Result<SelectedFile> {
        let path = path.as_ref();
        if !self.accepts(path) {
            return Err(Error::unsupported_file(
                path.display().to_string(),
                &self.accepted,
            ));
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;
        Ok(SelectedFile::new(path, bytes))
    }
}

impl Default for FilePicker {
    fn default() -> Self {
        Self::new(&DEFAULT_EXTENSIONS)
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().trim_start_matches('.').to_lowercase();
    format!(".{ext}")
}
