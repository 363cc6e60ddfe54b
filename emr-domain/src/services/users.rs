use async_trait::async_trait;
use tracing::{error, info};

use emr_data::models::NewUserRecord;
use emr_data::repository::{RepositoryError, UserRepositoryTrait};

use crate::auth::logging::{log_failed_login, log_registration, log_successful_login};
use crate::auth::token::generate_token;
use crate::auth::{JwtSettings, LoginRequest, LoginResponse};
use crate::database::DatabasePool;
use crate::entities::conversions;
use crate::entities::user::{CreateUserRequest, User};
use crate::errors::{validate_request, ServiceError};

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Trait for user and login operations
#[async_trait]
pub trait UserServiceTrait {
    /// Register a user with a bcrypt-hashed password
    async fn register(&self, request: CreateUserRequest) -> Result<User, ServiceError>;

    async fn list_users(&self) -> Result<Vec<User>, ServiceError>;

    async fn get_user(&self, id: i64) -> Result<User, ServiceError>;

    /// Check credentials and issue an access token
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ServiceError>;
}

/// User service backed by a user repository
pub struct UserService<R: UserRepositoryTrait> {
    repository: R,
    jwt: JwtSettings,
    salt_rounds: u32,
}

impl<R: UserRepositoryTrait> UserService<R> {
    pub fn new(repository: R, jwt: JwtSettings, salt_rounds: u32) -> Self {
        Self { repository, jwt, salt_rounds }
    }

    fn map_repo_error(&self, err: RepositoryError) -> ServiceError {
        match err {
            RepositoryError::Duplicate(_) => ServiceError::Conflict("username already exists".to_string()),
            other => ServiceError::from(other),
        }
    }
}

pub(crate) async fn hash_password(password: String, cost: u32) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?
        .map_err(|e| ServiceError::Internal(format!("failed to hash password: {}", e)))
}

async fn verify_password(password: String, hash: String) -> bool {
    match tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await {
        Ok(Ok(valid)) => valid,
        Ok(Err(e)) => {
            error!("Stored password hash is unreadable: {}", e);
            false
        },
        Err(e) => {
            error!("Password verification task failed: {}", e);
            false
        },
    }
}

#[async_trait]
impl<R: UserRepositoryTrait + Send + Sync> UserServiceTrait for UserService<R> {
    async fn register(&self, request: CreateUserRequest) -> Result<User, ServiceError> {
        if let Err(err) = validate_request(&request) {
            log_registration(&request.username, false, Some(&err.to_string()));
            return Err(err);
        }

        let password_hash = hash_password(request.password, self.salt_rounds).await?;

        let record = self.repository
            .create(NewUserRecord {
                username: request.username.clone(),
                email: request.email,
                password_hash,
                status: "active".to_string(),
            })
            .await
            .map_err(|e| {
                let err = self.map_repo_error(e);
                log_registration(&request.username, false, Some(&err.to_string()));
                err
            })?;

        log_registration(&record.username, true, None);
        Ok(conversions::convert_to_domain_user(record))
    }

    async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        let records = self.repository.list().await.map_err(|e| self.map_repo_error(e))?;
        Ok(records.into_iter().map(conversions::convert_to_domain_user).collect())
    }

    async fn get_user(&self, id: i64) -> Result<User, ServiceError> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .map(conversions::convert_to_domain_user)
            .ok_or_else(|| ServiceError::NotFound(format!("user {} not found", id)))
    }

    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ServiceError> {
        if request.username.trim().is_empty() || request.password.is_empty() {
            return Err(ServiceError::Validation("username and password are required".to_string()));
        }

        let record = match self.repository
            .find_by_username(&request.username)
            .await
            .map_err(|e| self.map_repo_error(e))?
        {
            Some(record) => record,
            None => {
                log_failed_login(&request.username, "unknown user");
                return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            },
        };

        if !verify_password(request.password, record.password_hash.clone()).await {
            log_failed_login(&request.username, "wrong password");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let token = generate_token(&self.jwt, record.id, &record.username)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        log_successful_login(&record.id.to_string());
        info!("User {} logged in", record.username);

        Ok(LoginResponse {
            token,
            user: conversions::convert_to_domain_user(record),
        })
    }
}

/// Create a user service using the SQLite repository
pub fn create_default_user_service(
    pool: DatabasePool,
    jwt: JwtSettings,
    salt_rounds: u32,
) -> impl UserServiceTrait + Send + Sync {
    let repository = emr_data::repository::UserRepository::new(pool);
    UserService::new(repository, jwt, salt_rounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::validate_token;
    use chrono::Utc;
    use emr_data::models::UserRecord;
    use mockall::mock;

    mock! {
        UserRepo {}

        #[async_trait]
        impl UserRepositoryTrait for UserRepo {
            async fn create(&self, user: NewUserRecord) -> Result<UserRecord, RepositoryError>;
            async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepositoryError>;
            async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepositoryError>;
            async fn list(&self) -> Result<Vec<UserRecord>, RepositoryError>;
            async fn link_practitioner(&self, user_id: i64, practitioner_id: i64) -> Result<(), RepositoryError>;
        }
    }

    fn settings() -> JwtSettings {
        JwtSettings {
            secret: "test-secret".to_string(),
            issuer: "emr-backend".to_string(),
            expiration_hours: 12,
        }
    }

    fn stored_user(password: &str) -> UserRecord {
        UserRecord {
            id: 1,
            username: "doctor1".to_string(),
            email: None,
            password_hash: bcrypt::hash(password, 4).unwrap(),
            status: "active".to_string(),
            practitioner_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let mut repo = MockUserRepo::new();
        repo.expect_create()
            .withf(|user| user.username == "nurse" && user.password_hash != "secret" && user.password_hash.starts_with("$2"))
            .times(1)
            .returning(|user| Ok(UserRecord {
                id: 2,
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
                status: user.status,
                practitioner_id: None,
                created_at: Utc::now(),
            }));

        let service = UserService::new(repo, settings(), 4);
        let user = service
            .register(CreateUserRequest {
                username: "nurse".to_string(),
                email: None,
                password: "secret".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(user.id, 2);
        assert_eq!(user.status, "active");
    }

    #[tokio::test]
    async fn test_register_requires_username_and_password() {
        let repo = MockUserRepo::new();
        let service = UserService::new(repo, settings(), 4);

        let result = service.register(CreateUserRequest::default()).await;
        assert!(matches!(result, Err(ServiceError::Validation(msg)) if msg.contains("username and password are required")));
    }

    #[tokio::test]
    async fn test_register_rejects_blank_username_and_password() {
        let repo = MockUserRepo::new();
        let service = UserService::new(repo, settings(), 4);

        let blank_username = CreateUserRequest {
            username: "   ".to_string(),
            password: "secret".to_string(),
            ..Default::default()
        };
        assert!(matches!(service.register(blank_username).await, Err(ServiceError::Validation(_))));

        let blank_password = CreateUserRequest {
            username: "nurse1".to_string(),
            password: " \t ".to_string(),
            ..Default::default()
        };
        assert!(matches!(service.register(blank_password).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_duplicate_is_conflict() {
        let mut repo = MockUserRepo::new();
        repo.expect_create()
            .returning(|_| Err(RepositoryError::Duplicate("users.username".to_string())));

        let service = UserService::new(repo, settings(), 4);
        let result = service
            .register(CreateUserRequest {
                username: "doctor1".to_string(),
                email: None,
                password: "x".to_string(),
            })
            .await;

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_login_issues_valid_token() {
        let mut repo = MockUserRepo::new();
        repo.expect_find_by_username()
            .withf(|username| username == "doctor1")
            .returning(|_| Ok(Some(stored_user("password123"))));

        let service = UserService::new(repo, settings(), 4);
        let response = service
            .login(LoginRequest {
                username: "doctor1".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap();

        let claims = validate_token(&settings(), &response.token).unwrap();
        assert_eq!(claims.sub, "1");
        assert_eq!(claims.username, "doctor1");
        assert_eq!(response.user.username, "doctor1");
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password_and_unknown_user() {
        let mut repo = MockUserRepo::new();
        repo.expect_find_by_username()
            .withf(|username| username == "doctor1")
            .returning(|_| Ok(Some(stored_user("password123"))));
        repo.expect_find_by_username()
            .withf(|username| username == "ghost")
            .returning(|_| Ok(None));

        let service = UserService::new(repo, settings(), 4);

        let wrong = service
            .login(LoginRequest { username: "doctor1".to_string(), password: "nope".to_string() })
            .await;
        assert!(matches!(wrong, Err(ServiceError::Unauthorized(_))));

        let unknown = service
            .login(LoginRequest { username: "ghost".to_string(), password: "nope".to_string() })
            .await;
        assert!(matches!(unknown, Err(ServiceError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let repo = MockUserRepo::new();
        let service = UserService::new(repo, settings(), 4);

        let result = service.login(LoginRequest::default()).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }
}
