//! File storage boundary: the three operations the API exposes, confined to one directory.
//!
//! - [`path`]: reduces client-supplied names to a direct child of the storage root
//! - [`local`]: [`LocalFileStore`], the filesystem-backed implementation
//! - [`errors`]: [`StorageError`] and the storage `Result` alias
//!
//! The filesystem is the source of truth on every call: nothing is cached and no index is kept.
//! Concurrent uploads and deletes of the same name are not coordinated.

pub mod errors;
pub mod local;
pub mod models;
pub mod path;

pub use errors::{Result, StorageError};
pub use local::LocalFileStore;
pub use models::StoredFile;
pub use path::{ResolvedName, StorageRoot};

use async_trait::async_trait;
use std::pin::Pin;
use tokio::io::AsyncRead;

/// Content stream handed to [`FileStore::put`].
pub type UploadStream<'a> = Pin<Box<dyn AsyncRead + Send + 'a>>;

/// Trait for file storage backends
#[async_trait]
pub trait FileStore: Send + Sync {
    /// List files directly under the root, in the order the backend enumerates them.
    ///
    /// Entries that cannot be read are skipped; only an unreadable root fails the call.
    async fn list(&self) -> Result<Vec<StoredFile>>;

    /// Create or overwrite the file `name` resolves to with the whole of `content`.
    ///
    /// Fails with [`StorageError::BadInput`] when no content stream is supplied.
    async fn put(&self, name: &str, content: Option<UploadStream<'_>>) -> Result<StoredFile>;

    /// Remove the file `name` resolves to.
    async fn delete(&self, name: &str) -> Result<()>;
}
