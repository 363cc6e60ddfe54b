use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use crate::database::DatabasePool;
use crate::models::user::{NewUserRecord, UserRecord};
use super::errors::RepositoryError;

/// Repository trait for application users
#[async_trait]
pub trait UserRepositoryTrait {
    /// Insert a user; a taken username yields `RepositoryError::Duplicate`
    async fn create(&self, user: NewUserRecord) -> Result<UserRecord, RepositoryError>;

    /// Look a user up by login name
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepositoryError>;

    /// Look a user up by id
    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepositoryError>;

    /// All users ordered by id
    async fn list(&self) -> Result<Vec<UserRecord>, RepositoryError>;

    /// Attach a practitioner to a login
    async fn link_practitioner(&self, user_id: i64, practitioner_id: i64) -> Result<(), RepositoryError>;
}

/// SQLite-backed user repository
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: DatabasePool,
}

impl UserRepository {
    /// Create a new repository
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, status, practitioner_id, created_at";

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        status: row.get(4)?,
        practitioner_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn create(&self, user: NewUserRecord) -> Result<UserRecord, RepositoryError> {
        debug!("Storing user in database: username={}", user.username);
        let conn = self.pool.get()?;
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO users (username, email, password_hash, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user.username, user.email, user.password_hash, user.status, created_at],
        )?;

        Ok(UserRecord {
            id: conn.last_insert_rowid(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            status: user.status,
            practitioner_id: None,
            created_at,
        })
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
                [username],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                [id],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<UserRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))?;
        let users = stmt
            .query_map([], map_user)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    async fn link_practitioner(&self, user_id: i64, practitioner_id: i64) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let updated = conn.execute(
            "UPDATE users SET practitioner_id = ?1 WHERE id = ?2",
            params![practitioner_id, user_id],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound(format!("user {}", user_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str) -> NewUserRecord {
        NewUserRecord {
            username: username.to_string(),
            email: Some(format!("{}@clinic.test", username)),
            password_hash: "hash".to_string(),
            status: "active".to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_find_user() {
        let repo = UserRepository::new(DatabasePool::in_memory().unwrap());
        let created = repo.create(new_user("doctor1")).await.unwrap();

        let found = repo.find_by_username("doctor1").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.email.as_deref(), Some("doctor1@clinic.test"));

        assert!(repo.find_by_id(created.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let repo = UserRepository::new(DatabasePool::in_memory().unwrap());
        repo.create(new_user("nurse")).await.unwrap();

        let err = repo.create(new_user("nurse")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Duplicate(_)));
    }

    #[test]
    fn link_unknown_user_is_not_found() {
        let repo = UserRepository::new(DatabasePool::in_memory().unwrap());
        let err = tokio_test::block_on(repo.link_practitioner(7, 1)).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }
}
