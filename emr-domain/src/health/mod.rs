//! Domain layer health check functionality
//! Reports the state of the database and the drug reference data

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use emr_data::database::{self, DatabasePool};

use crate::services::drugs::DrugDatabase;

/// System health status
#[derive(Debug, Clone, PartialEq)]
pub enum SystemStatus {
    /// All components are healthy
    Healthy,
    /// Some components are degraded but the system is functional
    Degraded,
    /// System is not functioning properly
    Unhealthy,
}

/// Component health status
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Represents a health component with status and optional details
#[derive(Debug, Clone)]
pub struct HealthComponent {
    pub status: ComponentStatus,
    pub details: Option<String>,
}

impl HealthComponent {
    pub fn healthy(details: Option<String>) -> Self {
        Self { status: ComponentStatus::Healthy, details }
    }
}

/// Represents the overall health of the system
#[derive(Debug, Clone)]
pub struct SystemHealth {
    pub status: SystemStatus,
    /// database, api, drug_database
    pub components: HashMap<String, HealthComponent>,
}

/// Trait for health services
#[async_trait]
pub trait HealthServiceTrait: Send + Sync + std::fmt::Debug {
    /// Get the overall system health
    async fn get_system_health(&self) -> SystemHealth;

    /// Check the status of the database
    /// Returns true if the database is healthy, false if not
    /// Returns an error if the check could not be performed
    async fn check_database_status(&self) -> Result<bool, String>;
}

/// Worst component status wins
pub fn overall_status(components: &HashMap<String, HealthComponent>) -> SystemStatus {
    if components.values().any(|c| c.status == ComponentStatus::Unhealthy) {
        SystemStatus::Unhealthy
    } else if components.values().any(|c| c.status == ComponentStatus::Degraded) {
        SystemStatus::Degraded
    } else {
        SystemStatus::Healthy
    }
}

/// Health of the live database pool and the loaded drug data
#[derive(Debug, Clone)]
pub struct HealthService {
    pool: DatabasePool,
    drugs: Arc<DrugDatabase>,
}

impl HealthService {
    pub fn new(pool: DatabasePool, drugs: Arc<DrugDatabase>) -> Self {
        Self { pool, drugs }
    }

    fn drug_component(&self) -> HealthComponent {
        if self.drugs.is_empty() {
            HealthComponent {
                status: ComponentStatus::Degraded,
                details: Some("Drug database is empty".to_string()),
            }
        } else {
            HealthComponent::healthy(Some(format!("{} drugs from {}", self.drugs.len(), self.drugs.source())))
        }
    }
}

#[async_trait]
impl HealthServiceTrait for HealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let database = match self.check_database_status().await {
            Ok(true) => HealthComponent::healthy(None),
            Ok(false) => HealthComponent {
                status: ComponentStatus::Degraded,
                details: Some("Database answered but reported a problem".to_string()),
            },
            Err(e) => {
                warn!("Database health check failed: {}", e);
                HealthComponent {
                    status: ComponentStatus::Unhealthy,
                    details: Some(e),
                }
            },
        };

        let components: HashMap<String, HealthComponent> = vec![
            ("database".to_string(), database),
            ("api".to_string(), HealthComponent::healthy(None)),
            ("drug_database".to_string(), self.drug_component()),
        ]
        .into_iter()
        .collect();

        SystemHealth {
            status: overall_status(&components),
            components,
        }
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        let conn = self.pool.get().map_err(|e| format!("Database connection error: {}", e))?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map(|one| one == 1)
            .map_err(|e| format!("Database query failed: {}", e))
    }
}

/// Description of the global pool, if the server initialized one
pub fn connection_info() -> Option<String> {
    database::get_connection_info()
}

pub fn create_health_service(pool: DatabasePool, drugs: Arc<DrugDatabase>) -> impl HealthServiceTrait {
    HealthService::new(pool, drugs)
}
