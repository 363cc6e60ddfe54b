use thiserror::Error;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Algorithm, Validation};
use tracing::{debug, error};
use chrono::{Duration, Utc};

use crate::auth::{Claims, JwtSettings};

/// Security errors for authentication and token operations
#[derive(Debug, Error)]
pub enum SecurityError {
    /// JWT validation error
    #[error("Token validation error: {0}")]
    TokenValidation(String),

    /// Expired token
    #[error("Token has expired")]
    TokenExpired,

    /// Invalid token structure
    #[error("Invalid token format")]
    InvalidToken,

    /// Token issued by someone else
    #[error("Invalid token issuer")]
    InvalidIssuer,
}

/// Sign an access token for a user
pub fn generate_token(
    settings: &JwtSettings,
    user_id: i64,
    username: &str,
) -> Result<String, SecurityError> {
    let now = Utc::now();
    let expiration = now + Duration::hours(settings.expiration_hours);

    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        iss: settings.issuer.clone(),
        iat: now.timestamp(),
        exp: expiration.timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    ).map_err(|e| {
        error!("Failed to encode JWT token: {}", e);
        SecurityError::TokenValidation(e.to_string())
    })?;

    debug!("Generated access token for user {} expiring at {}", user_id, expiration);
    Ok(token)
}

/// Validate a JWT token and return the decoded claims
pub fn validate_token(settings: &JwtSettings, token: &str) -> Result<Claims, SecurityError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.set_issuer(&[settings.issuer.as_str()]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_bytes()),
        &validation,
    ).map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => SecurityError::TokenExpired,
            jsonwebtoken::errors::ErrorKind::InvalidToken => SecurityError::InvalidToken,
            jsonwebtoken::errors::ErrorKind::InvalidIssuer => SecurityError::InvalidIssuer,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => SecurityError::TokenValidation("Invalid signature".to_string()),
            _ => SecurityError::TokenValidation(e.to_string()),
        }
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> JwtSettings {
        JwtSettings {
            secret: "test_secret_key_for_testing_only".to_string(),
            issuer: "test-issuer".to_string(),
            expiration_hours: 12,
        }
    }

    #[test]
    fn test_generate_and_validate_token() {
        let settings = settings();
        let token = generate_token(&settings, 42, "doctor1").unwrap();
        assert!(!token.is_empty());

        let claims = validate_token(&settings, &token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.username, "doctor1");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.exp - claims.iat, 12 * 3600);
    }

    #[test]
    fn test_token_expiration() {
        let settings = settings();
        let claims = Claims {
            sub: "42".to_string(),
            username: "doctor1".to_string(),
            iss: settings.issuer.clone(),
            iat: Utc::now().timestamp() - 7200,
            exp: Utc::now().timestamp() - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(settings.secret.as_bytes()),
        ).unwrap();

        match validate_token(&settings, &token) {
            Err(SecurityError::TokenExpired) => {},
            other => panic!("Expected TokenExpired error but got: {:?}", other),
        }
    }

    #[test]
    fn test_wrong_secret_and_issuer() {
        let settings = settings();
        let token = generate_token(&settings, 1, "nurse").unwrap();

        let other_secret = JwtSettings { secret: "another".to_string(), ..settings.clone() };
        assert!(validate_token(&other_secret, &token).is_err());

        let other_issuer = JwtSettings { issuer: "someone-else".to_string(), ..settings };
        assert!(matches!(validate_token(&other_issuer, &token), Err(SecurityError::InvalidIssuer)));
    }

    #[test]
    fn test_invalid_token() {
        let result = validate_token(&settings(), "invalid.token.format");
        match result {
            Err(SecurityError::InvalidToken) | Err(SecurityError::TokenValidation(_)) => {},
            _ => panic!("Expected InvalidToken or TokenValidation error"),
        }
    }
}
