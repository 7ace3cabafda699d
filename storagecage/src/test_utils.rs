//! Shared helpers for handler and router tests.

use crate::{
    AppState, build_router,
    config::Config,
    storage::{LocalFileStore, StorageRoot},
};
use axum_test::TestServer;
use std::{path::Path, sync::Arc};
use tempfile::TempDir;

/// Default config pointed at `storage_dir`, which the caller is expected to have created
pub fn create_test_config(storage_dir: &Path) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        storage_dir: storage_dir.to_path_buf(),
        create_storage_dir: false,
        ..Default::default()
    }
}

pub fn create_test_server(config: Config) -> TestServer {
    let store = LocalFileStore::new(StorageRoot::new(&config.storage_dir));
    let state = AppState::builder().config(config).store(Arc::new(store)).build();
    let router = build_router(&state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// Test server backed by a fresh temporary storage directory.
///
/// Keep the returned `TempDir` alive for as long as the server is used.
pub fn create_test_app() -> (TestServer, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let server = create_test_server(create_test_config(dir.path()));
    (server, dir)
}
