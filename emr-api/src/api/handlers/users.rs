use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};

use emr_domain::auth::{LoginRequest, LoginResponse, UserInfo};
use emr_domain::entities::{CreateUserRequest, User};
use emr_domain::services::UserServiceTrait;

use super::error::{service_error, ErrorResponse};
use super::extract::JsonBody;

/// Service type for dependency injection
pub type UserService = Arc<dyn UserServiceTrait + Send + Sync>;

/// Exchange username and password for a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login succeeded", body = LoginResponse),
        (status = 400, description = "Username or password missing", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(service, request), fields(username = %request.username))]
pub async fn login(
    State(service): State<UserService>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ErrorResponse> {
    let response = service.login(request).await.map_err(service_error)?;
    Ok(Json(response))
}

/// Register a user account
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Username or password missing", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse),
    ),
    tag = "users"
)]
#[instrument(skip(service, request), fields(username = %request.username))]
pub async fn register_user(
    State(service): State<UserService>,
    JsonBody(request): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ErrorResponse> {
    let user = service.register(request).await.map_err(service_error)?;
    info!("User {} registered", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

/// List user accounts
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users", body = [User]),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip(service))]
pub async fn list_users(State(service): State<UserService>) -> Result<Json<Vec<User>>, ErrorResponse> {
    let users = service.list_users().await.map_err(service_error)?;
    Ok(Json(users))
}

/// The user the bearer token belongs to
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip(service, user_info), fields(user_id = user_info.user_id))]
pub async fn current_user(
    State(service): State<UserService>,
    Extension(user_info): Extension<UserInfo>,
) -> Result<Json<User>, ErrorResponse> {
    // A valid token for a deleted account is still unauthorized
    let user = service.get_user(user_info.user_id).await.map_err(|e| match e {
        emr_domain::errors::ServiceError::NotFound(_) => ErrorResponse::unauthorized("user no longer exists"),
        other => service_error(other),
    })?;
    Ok(Json(user))
}
