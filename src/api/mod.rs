//! HTTP surface: route wiring and handlers.

pub mod handlers;
pub mod routes;

use axum::Json;
use utoipa::OpenApi;

/// OpenAPI description of the HTTP surface.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh_token,
        handlers::auth::logout,
        handlers::auth::me,
    ),
    components(schemas(
        crate::types::RegisterRequest,
        crate::types::LoginRequest,
        crate::types::RefreshTokenRequest,
        crate::types::LoginResponse,
        crate::types::User,
        crate::types::UserRole,
    )),
    tags(
        (name = "auth", description = "Authentication and session management"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI document as JSON.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
