use crate::auth::service::AuthService;
use crate::types::{Claims, User};
use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Identity attached to a request after successful validation.
///
/// `user` is the directory's current snapshot; `claims` carries the raw
/// token data (notably `jti`) for handlers that need it, such as logout;
/// `token` is the presented compact JWS.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    pub claims: Claims,
    pub token: String,
}

/// Request-boundary enforcement.
///
/// Extracts the bearer token, asks [`AuthService::validate`] for the current
/// identity, and inserts an [`AuthContext`] into request extensions. Any
/// failure stops the request with 401 before the wrapped handler runs.
pub async fn auth_middleware(
    auth_service: Arc<AuthService>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_string();

    let (user, claims) = auth_service
        .validate(&token)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(AuthContext {
        user,
        claims,
        token,
    });

    Ok(next.run(req).await)
}

/// Extractor for the authenticated identity in protected handlers.
pub struct AuthUser(pub AuthContext);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthUser)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
