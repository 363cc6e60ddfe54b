//! Authentication module for the EMR API
//!
//! Provides bearer-JWT middleware for securing API endpoints and the
//! security headers applied to every response.

use axum::{
    extract::{FromRef, State},
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
    body::Body,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::auth::logging::{log_auth_event, AuthEvent, AuthEventType};
use crate::config::AppConfig;
use crate::entities::user::User;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

// Token signing and validation
pub mod token;

// Structured authentication event logging
pub mod logging;

/// Authentication claims for JSON Web Tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Login name
    pub username: String,
    /// Issuer
    pub iss: String,
    /// Issued at (as timestamp)
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// User information extracted from authenticated requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct UserInfo {
    /// User ID
    pub user_id: i64,
    /// Login name
    pub username: String,
    /// Authentication source, always "jwt" for now
    pub auth_source: String,
}

/// Login request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Login response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct LoginResponse {
    /// JWT access token
    pub token: String,
    /// The authenticated user
    pub user: User,
}

/// Key material and policy for access tokens
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub expiration_hours: i64,
}

impl From<&AppConfig> for JwtSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            issuer: config.jwt_issuer.clone(),
            expiration_hours: config.token_expiration_hours,
        }
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "unauthorized", "message": message })),
    )
        .into_response()
}

/// Authentication middleware for protected routes
///
/// On success the request carries `UserInfo` and `Claims` extensions.
pub async fn auth_middleware<S>(
    State(state): State<S>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    JwtSettings: FromRef<S>,
{
    let settings = JwtSettings::from_ref(&state);
    let request_path = req.uri().path().to_string();
    let start_time = std::time::Instant::now();

    let failure = |details: &str, user: Option<&str>| {
        let event = AuthEvent::new(AuthEventType::TokenValidation, user, false)
            .with_details(details)
            .with_resource(request_path.clone())
            .with_duration(start_time.elapsed().as_millis() as u64)
            .with_auth_method("jwt");
        log_auth_event(event);
    };

    let auth_header = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => match value.to_str() {
            Ok(auth_str) => auth_str.to_string(),
            Err(_) => {
                warn!("Invalid Authorization header format");
                failure("Invalid Authorization header format", None);
                return unauthorized("invalid authorization header");
            }
        },
        None => {
            debug!("Missing Authorization header");
            failure("Missing Authorization header", None);
            return unauthorized("missing bearer token");
        }
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        warn!("Authorization header does not contain Bearer token");
        failure("Authorization header does not contain Bearer token", None);
        return unauthorized("missing bearer token");
    };

    match token::validate_token(&settings, token.trim()) {
        Ok(claims) => {
            let Ok(user_id) = claims.sub.parse::<i64>() else {
                failure("Token subject is not a user id", Some(&claims.sub));
                return unauthorized("invalid token");
            };

            let event = AuthEvent::new(AuthEventType::TokenValidation, Some(&claims.sub), true)
                .with_resource(request_path.clone())
                .with_duration(start_time.elapsed().as_millis() as u64)
                .with_auth_method("jwt");
            log_auth_event(event);

            let user_info = UserInfo {
                user_id,
                username: claims.username.clone(),
                auth_source: "jwt".to_string(),
            };

            req.extensions_mut().insert(user_info);
            req.extensions_mut().insert(claims);

            next.run(req).await
        },
        Err(token::SecurityError::TokenExpired) => {
            warn!("Expired token");
            failure("JWT token has expired", None);
            unauthorized("token expired")
        },
        Err(e) => {
            debug!("JWT validation failed: {}", e);
            failure(&e.to_string(), None);
            unauthorized("invalid token")
        }
    }
}

/// Apply CORS and security headers to the application
pub fn configure_security(app: axum::Router) -> axum::Router {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::set_header::SetResponseHeaderLayer;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600));

    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            header::HeaderValue::from_static("max-age=63072000; includeSubDomains; preload")
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            header::HeaderValue::from_static("nosniff")
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            header::HeaderValue::from_static("DENY")
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            axum::http::HeaderName::from_static("referrer-policy"),
            header::HeaderValue::from_static("strict-origin-when-cross-origin")
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            axum::http::HeaderName::from_static("permissions-policy"),
            header::HeaderValue::from_static("camera=(), microphone=(), geolocation=()")
        ));

    app.layer(cors).layer(security_headers)
}
