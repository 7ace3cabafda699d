//! HTTP request handlers for all API endpoints.
//!
//! Each handler is responsible for:
//! - Request validation and extraction
//! - Calling the file store held in [`crate::AppState`]
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`files`]: File listing, upload and deletion
//! - [`health`]: Root greeting and health probe
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which converts to the matching HTTP status code and a
//! plain text message.

pub mod files;
pub mod health;
