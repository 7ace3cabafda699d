use super::{
    FileStore, UploadStream,
    errors::{Result, StorageError},
    models::StoredFile,
    path::StorageRoot,
};
use async_trait::async_trait;
use std::io;
use tokio::fs;
use tracing::{debug, instrument, warn};

// ============================================================================
// Local Filesystem Storage Implementation
// ============================================================================

/// Local filesystem storage backend - keeps every file directly inside one directory
pub struct LocalFileStore {
    root: StorageRoot,
}

impl LocalFileStore {
    pub fn new(root: StorageRoot) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &StorageRoot {
        &self.root
    }

    /// Create the root directory (and its parents) if it does not exist yet
    pub async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(self.root.path())
            .await
            .map_err(StorageError::unavailable("create storage directory"))
    }
}

/// Read one directory entry. Directories yield `Ok(None)`.
async fn read_entry(entry: &fs::DirEntry) -> io::Result<Option<StoredFile>> {
    if entry.file_type().await?.is_dir() {
        return Ok(None);
    }

    let metadata = entry.metadata().await?;
    let name = entry
        .file_name()
        .into_string()
        .map_err(|raw| io::Error::new(io::ErrorKind::InvalidData, format!("file name {raw:?} is not valid UTF-8")))?;

    Ok(Some(StoredFile {
        name,
        size_bytes: metadata.len(),
    }))
}

#[async_trait]
impl FileStore for LocalFileStore {
    #[instrument(skip(self), fields(root = %self.root.path().display()))]
    async fn list(&self) -> Result<Vec<StoredFile>> {
        let mut entries = fs::read_dir(self.root.path())
            .await
            .map_err(StorageError::unavailable("list files"))?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(StorageError::unavailable("list files"))? {
            match read_entry(&entry).await {
                Ok(Some(file)) => files.push(file),
                Ok(None) => {}
                Err(e) => {
                    warn!(entry = ?entry.file_name(), error = %e, "Skipping unreadable entry in storage directory");
                }
            }
        }

        debug!(count = files.len(), "Listed storage directory");
        Ok(files)
    }

    #[instrument(skip(self, content), fields(root = %self.root.path().display()))]
    async fn put(&self, name: &str, content: Option<UploadStream<'_>>) -> Result<StoredFile> {
        let target = self.root.resolve(name)?;
        let mut content = content.ok_or_else(|| StorageError::BadInput {
            message: "No file content supplied".to_string(),
        })?;

        // A symlink in the root could point anywhere, so never write through one
        if let Ok(existing) = fs::symlink_metadata(&target.path).await
            && existing.file_type().is_symlink()
        {
            return Err(StorageError::Unavailable {
                operation: "create file".to_string(),
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} is a symbolic link", target.path.display()),
                ),
            });
        }

        // An existing file with the same name is replaced
        let mut file = fs::File::create(&target.path)
            .await
            .map_err(StorageError::unavailable("create file"))?;

        // No rollback: a failed copy leaves whatever was written so far
        let written = tokio::io::copy(&mut content, &mut file)
            .await
            .map_err(StorageError::unavailable("save file content"))?;
        file.sync_all().await.map_err(StorageError::unavailable("save file content"))?;

        debug!(file = %target.name, bytes = written, "Stored file");

        Ok(StoredFile {
            name: target.name,
            size_bytes: written,
        })
    }

    #[instrument(skip(self), fields(root = %self.root.path().display()))]
    async fn delete(&self, name: &str) -> Result<()> {
        let target = self.root.resolve(name)?;

        // remove_file refuses directories, so nothing is ever removed recursively
        match fs::remove_file(&target.path).await {
            Ok(()) => {
                debug!(file = %target.name, "Deleted file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StorageError::NotFound { name: target.name }),
            Err(source) => Err(StorageError::Unavailable {
                operation: "delete file".to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tempfile::TempDir;
    use tokio::io::{AsyncRead, ReadBuf};

    fn store_in(dir: &TempDir) -> LocalFileStore {
        LocalFileStore::new(StorageRoot::new(dir.path()))
    }

    fn stream(content: &'static [u8]) -> Option<UploadStream<'static>> {
        let reader: UploadStream<'static> = Box::pin(content);
        Some(reader)
    }

    /// Yields some bytes, then fails like a dropped connection.
    struct FailingReader {
        sent: bool,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
            if self.sent {
                Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "client went away")))
            } else {
                self.sent = true;
                buf.put_slice(b"partial");
                Poll::Ready(Ok(()))
            }
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_list_empty_root() {
        let dir = TempDir::new().unwrap();
        let files = store_in(&dir).list().await.unwrap();
        assert!(files.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_list_skips_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("testfile.txt"), "hello world").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("inner.txt"), "not listed").unwrap();

        let files = store_in(&dir).list().await.unwrap();
        assert_eq!(
            files,
            vec![StoredFile {
                name: "testfile.txt".to_string(),
                size_bytes: 11,
            }]
        );
    }

    #[cfg(unix)]
    #[test_log::test(tokio::test)]
    async fn test_list_skips_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(OsStr::from_bytes(b"bad\xffname")), "x").unwrap();
        std::fs::write(dir.path().join("good.txt"), "abc").unwrap();

        let files = store_in(&dir).list().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "good.txt");
    }

    #[test_log::test(tokio::test)]
    async fn test_list_missing_root_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(StorageRoot::new(dir.path().join("does-not-exist")));

        let err = store.list().await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }), "unexpected error: {err:?}");
    }

    #[test_log::test(tokio::test)]
    async fn test_put_then_list() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let stored = store.put("test-upload.txt", stream(b"this is a test file content\n")).await.unwrap();
        assert_eq!(stored.name, "test-upload.txt");
        assert_eq!(stored.size_bytes, 28);

        let on_disk = std::fs::read(dir.path().join("test-upload.txt")).unwrap();
        assert_eq!(on_disk, b"this is a test file content\n");

        let listed = store.list().await.unwrap();
        assert_eq!(listed, vec![stored]);
    }

    #[test_log::test(tokio::test)]
    async fn test_put_strips_directory_components() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let stored = store.put("../../escape.txt", stream(b"contained")).await.unwrap();
        assert_eq!(stored.name, "escape.txt");
        assert!(dir.path().join("escape.txt").is_file());
        assert!(!dir.path().parent().unwrap().join("escape.txt").exists());
    }

    #[test_log::test(tokio::test)]
    async fn test_put_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.put("notes.txt", stream(b"first version, quite long")).await.unwrap();
        let stored = store.put("notes.txt", stream(b"second")).await.unwrap();
        assert_eq!(stored.size_bytes, 6);

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].size_bytes, 6);
        assert_eq!(std::fs::read(dir.path().join("notes.txt")).unwrap(), b"second");
    }

    #[test_log::test(tokio::test)]
    async fn test_put_without_stream_is_bad_input() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let err = store.put("empty.txt", None).await.unwrap_err();
        assert!(matches!(err, StorageError::BadInput { .. }), "unexpected error: {err:?}");
        assert!(!dir.path().join("empty.txt").exists());
    }

    #[test_log::test(tokio::test)]
    async fn test_put_invalid_name() {
        let dir = TempDir::new().unwrap();
        let err = store_in(&dir).put("../", stream(b"data")).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidName { .. }), "unexpected error: {err:?}");
    }

    #[test_log::test(tokio::test)]
    async fn test_put_onto_directory_is_unavailable() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("taken")).unwrap();

        let err = store_in(&dir).put("taken", stream(b"data")).await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }), "unexpected error: {err:?}");
        assert!(dir.path().join("taken").is_dir());
    }

    #[test_log::test(tokio::test)]
    async fn test_put_failed_copy_leaves_file_in_place() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let reader: UploadStream<'static> = Box::pin(FailingReader { sent: false });
        let err = store.put("broken.bin", Some(reader)).await.unwrap_err();
        match err {
            StorageError::Unavailable { operation, source } => {
                assert_eq!(operation, "save file content");
                assert_eq!(source.kind(), io::ErrorKind::ConnectionReset);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(dir.path().join("broken.bin").exists());
    }

    #[test_log::test(tokio::test)]
    async fn test_delete_then_delete_again() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.put("file-to-delete.txt", stream(b"delete me")).await.unwrap();

        store.delete("file-to-delete.txt").await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(!dir.path().join("file-to-delete.txt").exists());

        match store.delete("file-to-delete.txt").await {
            Err(StorageError::NotFound { name }) => assert_eq!(name, "file-to-delete.txt"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_delete_never_removes_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("keep")).unwrap();
        std::fs::write(dir.path().join("keep").join("inner.txt"), "x").unwrap();

        let err = store_in(&dir).delete("keep").await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }), "unexpected error: {err:?}");
        assert!(dir.path().join("keep").join("inner.txt").is_file());
    }

    #[test_log::test(tokio::test)]
    async fn test_delete_traversal_cannot_reach_outside_root() {
        let outer = TempDir::new().unwrap();
        let root = outer.path().join("root");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(outer.path().join("victim.txt"), "precious").unwrap();

        let store = LocalFileStore::new(StorageRoot::new(&root));
        let err = store.delete("../victim.txt").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }), "unexpected error: {err:?}");
        assert!(outer.path().join("victim.txt").is_file());
    }

    #[cfg(unix)]
    #[test_log::test(tokio::test)]
    async fn test_put_refuses_to_write_through_symlink() {
        let outer = TempDir::new().unwrap();
        let root = outer.path().join("root");
        std::fs::create_dir(&root).unwrap();
        let victim = outer.path().join("victim.txt");
        std::fs::write(&victim, "precious").unwrap();
        std::os::unix::fs::symlink(&victim, root.join("link.txt")).unwrap();

        let store = LocalFileStore::new(StorageRoot::new(&root));
        let err = store.put("link.txt", stream(b"pwned")).await.unwrap_err();

        assert!(matches!(err, StorageError::Unavailable { .. }), "unexpected error: {err:?}");
        assert_eq!(std::fs::read_to_string(&victim).unwrap(), "precious");
        assert!(std::fs::symlink_metadata(root.join("link.txt")).unwrap().file_type().is_symlink());
    }

    #[test_log::test(tokio::test)]
    async fn test_ensure_root_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(StorageRoot::new(dir.path().join("a").join("b")));

        store.ensure_root().await.unwrap();
        assert!(store.root().path().is_dir());
        assert!(store.list().await.unwrap().is_empty());
    }
}
