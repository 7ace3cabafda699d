//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Response bodies
//!
//! # API Structure
//!
//! - `GET /`: liveness text
//! - `GET /healthz`: health probe
//! - `GET /api/v1/files`: list stored files
//! - `POST /api/v1/files`: upload a file (multipart, field `file`)
//! - `DELETE /api/v1/files/{name}`: delete a file by name
//!
//! # OpenAPI Documentation
//!
//! Endpoints are annotated with `utoipa`. The document is served at `/api-docs/openapi.json`
//! and rendered at `/docs`.

pub mod handlers;
pub mod models;
