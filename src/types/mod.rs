// Public modules
pub mod chat_request;
pub mod chat_response;
pub mod message;
pub mod message_role;
pub mod selected_file;
pub mod source;
pub mod upload_receipt;
pub mod upload_status;

// Re-exports
pub use chat_request::ChatRequest;
pub use chat_response::ChatResponse;
pub use message::Message;
pub use message_role::MessageRole;
pub use selected_file::SelectedFile;
pub use source::Source;
pub use upload_receipt::UploadReceipt;
pub use upload_status::UploadStatus;
