use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tracing::{info, warn};

/// Types of authentication events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEventType {
    /// Successful login
    Login,
    /// Rejected login attempt
    FailedLogin,
    /// New account created
    Registration,
    /// Bearer token checked by the middleware
    TokenValidation,
}

impl std::fmt::Display for AuthEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthEventType::Login => write!(f, "LOGIN"),
            AuthEventType::FailedLogin => write!(f, "FAILED_LOGIN"),
            AuthEventType::Registration => write!(f, "REGISTRATION"),
            AuthEventType::TokenValidation => write!(f, "TOKEN_VALIDATION"),
        }
    }
}

/// Authentication event record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEvent {
    pub event_type: AuthEventType,
    /// User id or login name, if known
    pub user: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub details: Option<String>,
    /// Request path being accessed
    pub resource: Option<String>,
    pub duration_ms: Option<u64>,
    /// password, jwt
    pub auth_method: Option<String>,
}

impl AuthEvent {
    /// Create a new authentication event
    pub fn new(event_type: AuthEventType, user: Option<&str>, success: bool) -> Self {
        Self {
            event_type,
            user: user.map(String::from),
            timestamp: Utc::now(),
            success,
            details: None,
            resource: None,
            duration_ms: None,
            auth_method: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_auth_method(mut self, auth_method: impl Into<String>) -> Self {
        self.auth_method = Some(auth_method.into());
        self
    }
}

/// Log an authentication event
pub fn log_auth_event(event: AuthEvent) {
    let user = event.user.as_deref().unwrap_or("anonymous");
    let details = event.details.as_deref().unwrap_or("");
    let resource = event.resource.as_deref().unwrap_or("-");

    if event.success {
        info!(
            event_type = %event.event_type,
            duration_ms = event.duration_ms,
            "AUTH-LOG [{}] [{}] [SUCCESS] [{}] {}",
            event.event_type, user, resource, details
        );
    } else {
        warn!(
            event_type = %event.event_type,
            duration_ms = event.duration_ms,
            "AUTH-LOG [{}] [{}] [FAILURE] [{}] {}",
            event.event_type, user, resource, details
        );
    }
}

/// Log a successful password login
pub fn log_successful_login(user_id: &str) {
    let event = AuthEvent::new(AuthEventType::Login, Some(user_id), true)
        .with_auth_method("password");
    log_auth_event(event);
}

/// Log a rejected login attempt
pub fn log_failed_login(username: &str, reason: &str) {
    let event = AuthEvent::new(AuthEventType::FailedLogin, Some(username), false)
        .with_details(reason)
        .with_auth_method("password");
    log_auth_event(event);
}

/// Log an account registration
pub fn log_registration(username: &str, success: bool, details: Option<&str>) {
    let mut event = AuthEvent::new(AuthEventType::Registration, Some(username), success);
    if let Some(d) = details {
        event = event.with_details(d);
    }
    log_auth_event(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_auth_event() {
        let event = AuthEvent::new(AuthEventType::TokenValidation, Some("7"), false)
            .with_details("JWT token has expired")
            .with_resource("/api/patients")
            .with_duration(3)
            .with_auth_method("jwt");

        assert_eq!(event.event_type, AuthEventType::TokenValidation);
        assert_eq!(event.user, Some("7".to_string()));
        assert!(!event.success);
        assert_eq!(event.resource, Some("/api/patients".to_string()));
        assert_eq!(event.duration_ms, Some(3));
        assert_eq!(event.auth_method, Some("jwt".to_string()));
    }

    #[test]
    fn test_event_type_display() {
        assert_eq!(AuthEventType::Login.to_string(), "LOGIN");
        assert_eq!(AuthEventType::FailedLogin.to_string(), "FAILED_LOGIN");
        assert_eq!(AuthEventType::Registration.to_string(), "REGISTRATION");
    }
}
