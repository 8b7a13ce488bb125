use crate::{
    auth::middleware::AuthUser,
    types::{
        AppError, LoginRequest, LoginResponse, RefreshTokenRequest, RegisterRequest, Result, User,
    },
    AppState,
};
use axum::{extract::State, http::StatusCode, Json};

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = User),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    if payload.email.is_empty() || payload.first_name.is_empty() || payload.last_name.is_empty() {
        return Err(AppError::Validation("All fields are required".to_string()));
    }
    if payload.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let user = state.auth_service.register(payload).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let response = state.auth_service.login(payload).await?;

    Ok(Json(response))
}

/// Mint a new access token from a refresh session
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Token refreshed", body = LoginResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Invalid or expired refresh token")
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<Json<LoginResponse>> {
    if payload.refresh_token.is_empty() {
        return Err(AppError::Validation("Refresh token is required".to_string()));
    }

    let response = state.auth_service.refresh(payload).await?;

    Ok(Json(response))
}

/// Terminate the caller's sessions
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Unauthenticated")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> Result<Json<serde_json::Value>> {
    state
        .auth_service
        .logout(&ctx.token, &ctx.user.id, ctx.user.role)
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Successfully logged out"
    })))
}

/// Current authenticated user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthenticated")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(AuthUser(ctx): AuthUser) -> Json<User> {
    Json(ctx.user)
}
