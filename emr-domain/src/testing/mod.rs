// Testing utilities and stand-ins for external dependencies
// Available in unit tests and with the "mock" feature

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::health::{overall_status, ComponentStatus, HealthComponent, HealthServiceTrait, SystemHealth};
use crate::services::ai_gateway::{AiGatewayError, AiGatewayTrait, AiResponse, AiRoute};

/// Health service with configurable component states
#[derive(Debug)]
pub struct MockHealthService {
    database_status: ComponentStatus,
    components: HashMap<String, HealthComponent>,
}

impl Default for MockHealthService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHealthService {
    /// All components healthy
    pub fn new() -> Self {
        Self {
            database_status: ComponentStatus::Healthy,
            components: HashMap::new(),
        }
    }

    pub fn with_degraded_database(mut self) -> Self {
        self.database_status = ComponentStatus::Degraded;
        self
    }

    pub fn with_unhealthy_database(mut self) -> Self {
        self.database_status = ComponentStatus::Unhealthy;
        self
    }

    pub fn with_component(mut self, name: &str, status: ComponentStatus, details: Option<String>) -> Self {
        self.components.insert(name.to_string(), HealthComponent { status, details });
        self
    }
}

#[async_trait]
impl HealthServiceTrait for MockHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let mut components = HashMap::new();

        components.insert(
            "database".to_string(),
            HealthComponent {
                status: self.database_status.clone(),
                details: match self.database_status {
                    ComponentStatus::Healthy => None,
                    ComponentStatus::Degraded => Some("Database is experiencing high load".to_string()),
                    ComponentStatus::Unhealthy => Some("Database connection failed".to_string()),
                },
            },
        );
        components.insert("api".to_string(), HealthComponent::healthy(None));
        components.insert("drug_database".to_string(), HealthComponent::healthy(None));

        for (name, component) in &self.components {
            components.insert(name.clone(), component.clone());
        }

        SystemHealth {
            status: overall_status(&components),
            components,
        }
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        match self.database_status {
            ComponentStatus::Healthy | ComponentStatus::Degraded => Ok(true),
            ComponentStatus::Unhealthy => Err("Database connection failed".to_string()),
        }
    }
}

/// A forwarded call as seen by the stub
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedAiCall {
    pub route: AiRoute,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// AI gateway that answers from memory and records every call
#[derive(Debug, Default)]
pub struct StubAiGateway {
    reply: Option<AiResponse>,
    calls: Mutex<Vec<RecordedAiCall>>,
}

impl StubAiGateway {
    /// Answer every call with `status` and `body`
    pub fn replying(status: u16, body: Value) -> Self {
        Self {
            reply: Some(AiResponse { status, body }),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Behave like a gateway that cannot be reached
    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RecordedAiCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AiGatewayTrait for StubAiGateway {
    async fn forward(
        &self,
        route: AiRoute,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<AiResponse, AiGatewayError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedAiCall { route, query, body });
        }
        self.reply
            .clone()
            .ok_or_else(|| AiGatewayError::Unavailable("connection refused".to_string()))
    }
}

pub fn create_mock_health_service() -> impl HealthServiceTrait {
    MockHealthService::new()
}
