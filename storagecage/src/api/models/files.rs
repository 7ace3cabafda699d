use crate::storage::StoredFile;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stored file as returned to clients.
///
/// Files are identified by name, so `id` and `name` always hold the same value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileResponse {
    #[schema(example = "report.pdf")]
    pub id: String,
    #[schema(example = "report.pdf")]
    pub name: String,
    /// Size in bytes
    #[schema(example = 1024)]
    pub size: u64,
}

impl From<StoredFile> for FileResponse {
    fn from(file: StoredFile) -> Self {
        Self {
            id: file.name.clone(),
            name: file.name,
            size: file.size_bytes,
        }
    }
}

/// Acknowledgement returned by operations with nothing else to report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = "file deleted successfully")]
    pub message: String,
}

impl StatusResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
