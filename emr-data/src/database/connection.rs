//! Database connection module for the EMR backend
//!
//! SQLite is the only supported backend. Every pooled connection has
//! foreign key enforcement switched on, and the schema is migrated as soon
//! as a pool is built.

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use thiserror::Error;
use tracing::{error, info, warn};

use super::migrations::run_sqlite_migrations;

/// Global database pool used by health checks and the server binary
static DB_POOL: OnceCell<DatabasePool> = OnceCell::new();

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    /// SQLite database (file-based or in-memory)
    Sqlite,
}

impl DatabaseType {
    /// Convert from string to database type
    pub fn from_str(s: &str) -> Result<Self, DatabaseError> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(DatabaseType::Sqlite),
            _ => Err(DatabaseError::UnsupportedDatabaseType(s.to_string())),
        }
    }
}

/// Database error
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// SQLite connection pool error
    #[error("SQLite connection pool error: {0}")]
    SqlitePoolError(#[from] r2d2::Error),

    /// Database pool already initialized
    #[error("Database pool is already initialized")]
    PoolAlreadyInitialized,

    /// Database pool not initialized
    #[error("Database pool is not initialized")]
    PoolNotInitialized,

    /// Unsupported database type
    #[error("Unsupported database type: {0}")]
    UnsupportedDatabaseType(String),

    /// Migration error
    #[error("Database migration error: {0}")]
    MigrationError(String),

    /// Generic database error
    #[error("Database error: {0}")]
    GenericError(String),
}

impl From<String> for DatabaseError {
    fn from(error: String) -> Self {
        DatabaseError::GenericError(error)
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database type
    pub db_type: DatabaseType,
    /// Path to SQLite database file, `None` for an in-memory database
    pub sqlite_path: Option<String>,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DatabaseType::Sqlite,
            sqlite_path: Some("./data/emr.db".to_string()),
            max_connections: 10,
            timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration from environment variables
    pub fn from_env() -> Result<Self, DatabaseError> {
        let db_type_str = env::var("DB_TYPE").unwrap_or_else(|_| "sqlite".to_string());
        let db_type = DatabaseType::from_str(&db_type_str)?;

        let sqlite_path = match env::var("DB_SQLITE_PATH") {
            Ok(path) if path == ":memory:" => None,
            Ok(path) => Some(path),
            Err(_) => DatabaseConfig::default().sqlite_path,
        };

        match sqlite_path {
            Some(ref path) => info!("Using SQLite database at: {}", path),
            None => info!("Using in-memory SQLite database"),
        }

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(10);

        let timeout_seconds = env::var("DB_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        info!("Database configuration: max_connections={}, timeout={}s",
            max_connections, timeout_seconds);

        Ok(DatabaseConfig {
            db_type,
            sqlite_path,
            max_connections,
            timeout_seconds,
        })
    }

    /// Configuration for a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            sqlite_path: None,
            ..Self::default()
        }
    }
}

/// SQLite connection pool shared by all repositories
#[derive(Debug, Clone)]
pub struct DatabasePool {
    inner: Arc<r2d2::Pool<SqliteConnectionManager>>,
    in_memory: bool,
}

impl DatabasePool {
    /// Build a pool from configuration and migrate the schema
    pub fn from_config(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = match config.db_type {
            DatabaseType::Sqlite => match &config.sqlite_path {
                Some(path) => initialize_sqlite_pool(path, config)?,
                None => initialize_in_memory_sqlite_pool(config)?,
            },
        };

        pool.migrate()?;
        Ok(pool)
    }

    /// Build a fresh, migrated in-memory database
    pub fn in_memory() -> Result<Self, DatabaseError> {
        Self::from_config(&DatabaseConfig::in_memory())
    }

    /// Check out a connection
    pub fn get(&self) -> Result<PooledConnection<SqliteConnectionManager>, r2d2::Error> {
        self.inner.get()
    }

    /// Whether this pool points at an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.in_memory
    }

    /// Pool statistics as (connections, idle connections)
    pub fn state(&self) -> (u32, u32) {
        let state = self.inner.state();
        (state.connections, state.idle_connections)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        info!("Running database migrations");
        let conn = self.get()?;
        run_sqlite_migrations(&conn).map_err(DatabaseError::MigrationError)?;
        info!("Database migrations completed successfully");
        Ok(())
    }
}

fn enable_foreign_keys(conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

/// Initialize the global database connection pool
pub fn initialize_database_pool() -> Result<DatabasePool, DatabaseError> {
    if DB_POOL.get().is_some() {
        return Err(DatabaseError::PoolAlreadyInitialized);
    }

    let config = DatabaseConfig::from_env()?;
    info!("Initializing database pool with type: {:?}", config.db_type);

    let pool = DatabasePool::from_config(&config)?;

    DB_POOL
        .set(pool.clone())
        .map_err(|_| DatabaseError::PoolAlreadyInitialized)?;

    Ok(pool)
}

/// Get the global database connection pool
pub fn get_db_pool() -> Result<DatabasePool, DatabaseError> {
    DB_POOL.get()
        .cloned()
        .ok_or(DatabaseError::PoolNotInitialized)
}

/// Initialize a file-backed SQLite pool, falling back to memory when the file is unusable
fn initialize_sqlite_pool(sqlite_path: &str, config: &DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    info!("Initializing SQLite database at: {}", sqlite_path);

    if let Some(parent) = Path::new(sqlite_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            info!("Creating parent directory: {:?}", parent);
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Failed to create directory: {}, falling back to in-memory database", e);
                return initialize_in_memory_sqlite_pool(config);
            }
        }
    }

    let manager = SqliteConnectionManager::file(sqlite_path)
        .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE)
        .with_init(enable_foreign_keys);

    match r2d2::Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(Duration::from_secs(config.timeout_seconds))
        .build(manager) {
            Ok(pool) => {
                info!("SQLite connection pool created successfully");
                Ok(DatabasePool { inner: Arc::new(pool), in_memory: false })
            },
            Err(e) => {
                error!("Failed to create SQLite connection pool: {}", e);
                warn!("Falling back to in-memory SQLite database");
                initialize_in_memory_sqlite_pool(config)
            }
        }
}

/// Initialize an in-memory SQLite database
///
/// Each SQLite memory connection is its own database, so the pool keeps
/// exactly one connection alive for its whole lifetime.
fn initialize_in_memory_sqlite_pool(config: &DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    info!("Initializing in-memory SQLite database");

    let manager = SqliteConnectionManager::memory().with_init(enable_foreign_keys);

    let pool = r2d2::Pool::builder()
        .max_size(1)
        .min_idle(Some(1))
        .idle_timeout(None)
        .max_lifetime(None)
        .connection_timeout(Duration::from_secs(config.timeout_seconds))
        .build(manager)?;

    Ok(DatabasePool { inner: Arc::new(pool), in_memory: true })
}

/// Get information about the current database connection
pub fn get_connection_info() -> Option<String> {
    let pool = DB_POOL.get()?;
    Some(describe_pool(pool))
}

/// Human readable description of a pool and its health
pub fn describe_pool(pool: &DatabasePool) -> String {
    match pool.get() {
        Ok(conn) => {
            let location = match conn.query_row(
                "PRAGMA database_list",
                [],
                |row| row.get::<_, String>(2),
            ) {
                Ok(path) if path.is_empty() || path == ":memory:" => "SQLite in-memory database".to_string(),
                Ok(path) => format!("SQLite database at {}", path),
                Err(_) => "SQLite database (path unknown)".to_string(),
            };
            drop(conn);

            let (connections, idle) = pool.state();
            format!("{} healthy (connections: active={}, idle={})", location, connections, idle)
        },
        Err(e) => {
            error!("Failed to get SQLite connection: {}", e);
            format!("SQLite connection error: {}", e)
        }
    }
}
