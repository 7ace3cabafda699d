//! Liveness endpoints.

/// Greeting served at the root path
pub const ROOT_MESSAGE: &str = "StorageCage API server is running! 👋";

#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    summary = "Liveness",
    responses(
        (status = 200, description = "Server is running", body = String, content_type = "text/plain")
    )
)]
pub async fn root() -> &'static str {
    ROOT_MESSAGE
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    summary = "Health probe",
    responses(
        (status = 200, description = "Always `OK`", body = String, content_type = "text/plain")
    )
)]
pub async fn healthz() -> &'static str {
    "OK"
}
