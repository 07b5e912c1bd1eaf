use serde::{Deserialize, Serialize};

/// Optional body of a successful upload response.
///
/// The service may report how many chunks it indexed, or an error it hit
/// while still answering with a success status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UploadReceipt {
    /// Free-form status, usually `"success"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Number of chunks added to the index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<u64>,

    /// Error reported by the service inside a success response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadReceipt {
    /// Parses a response body, returning `None` if it is not a receipt.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }
}
