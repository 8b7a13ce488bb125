use crate::auth::service::AuthService;
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn create_router(auth_service: Arc<AuthService>) -> Router<AppState> {
    let public_routes = Router::new()
        // Public routes (no auth required)
        .route("/api/health", get(crate::api::handlers::health::health))
        .route("/api/docs/openapi.json", get(crate::api::openapi_json))
        .route(
            "/api/auth/register",
            post(crate::api::handlers::auth::register),
        )
        .route("/api/auth/login", post(crate::api::handlers::auth::login))
        .route(
            "/api/auth/refresh",
            post(crate::api::handlers::auth::refresh_token),
        );

    let protected_routes = Router::new()
        // Protected routes (auth required)
        .route("/api/auth/logout", post(crate::api::handlers::auth::logout))
        .route("/api/auth/me", get(crate::api::handlers::auth::me))
        .layer(middleware::from_fn(move |req, next| {
            let auth_service = auth_service.clone();
            async move { crate::auth::middleware::auth_middleware(auth_service, req, next).await }
        }));

    public_routes.merge(protected_routes)
}
