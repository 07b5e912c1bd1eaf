use std::path::{Path, PathBuf};

/// A document chosen through the file picker, ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    path: PathBuf,
    file_name: String,
    bytes: Vec<u8>,
}

impl SelectedFile {
    /// Creates a new SelectedFile from its path and contents.
    ///
    /// The file name sent to the service is the last component of `path`.
    pub fn new(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            path,
            file_name,
            bytes,
        }
    }

    /// Returns the path the file was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the file name used for the multipart part.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the file contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the size of the file in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the file is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_last_component() {
        let file = SelectedFile::new("/tmp/docs/report.pdf", b"%PDF".to_vec());
        assert_eq!(file.file_name(), "report.pdf");
        assert_eq!(file.path(), Path::new("/tmp/docs/report.pdf"));
        assert_eq!(file.len(), 4);
        assert!(!file.is_empty());
    }
}
