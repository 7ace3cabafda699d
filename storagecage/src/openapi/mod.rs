//! OpenAPI/Swagger documentation configuration.
//!
//! The generated document is served at `/api-docs/openapi.json` and rendered with RapiDoc at
//! `/docs`.

use utoipa::OpenApi;

use crate::api::{handlers, models};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "StorageCage API",
        description = "List, upload and delete files in a single storage directory."
    ),
    paths(
        handlers::health::root,
        handlers::health::healthz,
        handlers::files::list_files,
        handlers::files::upload_file,
        handlers::files::delete_file,
    ),
    components(schemas(models::files::FileResponse, models::files::StatusResponse)),
    tags(
        (name = "files", description = "Stored file operations"),
        (name = "health", description = "Liveness checks"),
    )
)]
pub struct ApiDoc;
