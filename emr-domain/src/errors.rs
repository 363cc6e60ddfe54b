use thiserror::Error;
use validator::ValidationErrors;

use emr_data::repository::RepositoryError;

/// Errors returned by domain services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Request failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write conflicts with existing data
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or bad credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Storage failure
    #[error("Repository error: {0}")]
    Repository(String),

    /// Downstream service could not be reached
    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => ServiceError::NotFound(msg),
            RepositoryError::Validation(msg) => ServiceError::Validation(msg),
            RepositoryError::Duplicate(msg) => ServiceError::Conflict(msg),
            RepositoryError::ForeignKey(msg) => ServiceError::Validation(format!("unknown reference: {}", msg)),
            other => ServiceError::Repository(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Internal(format!("malformed stored document: {}", err))
    }
}

/// Flatten `validator` field errors into a single message
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let error_msgs: Vec<String> = errors
                .iter()
                .map(|err| {
                    if let Some(msg) = &err.message {
                        msg.to_string()
                    } else {
                        format!("Invalid {}", field)
                    }
                })
                .collect();
            format!("{}: {}", field, error_msgs.join(", "))
        })
        .collect();
    fields.sort();
    fields.join("; ")
}

/// Run `validator` checks and convert failures into `ServiceError::Validation`
pub fn validate_request<T: validator::Validate>(request: &T) -> Result<(), ServiceError> {
    request
        .validate()
        .map_err(|errors| ServiceError::Validation(validation_message(&errors)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_errors_map_to_service_errors() {
        let err: ServiceError = RepositoryError::Duplicate("patients.mrn".into()).into();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err: ServiceError = RepositoryError::ForeignKey("FOREIGN KEY constraint failed".into()).into();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err: ServiceError = RepositoryError::NotFound("encounter 4".into()).into();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
