use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::AppConfig;
use crate::services::retry::{with_retry, RetryPolicy};

/// The gateway could not be reached
#[derive(Debug, Error)]
pub enum AiGatewayError {
    #[error("AI gateway unavailable: {0}")]
    Unavailable(String),
}

/// Endpoints exposed by the AI gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiRoute {
    Health,
    ModelsStatus,
    ClinicalNote,
    LabSummary,
    SymptomAnalysis,
    PrescriptionGuide,
    TestAnalysis,
}

impl AiRoute {
    pub fn path(&self) -> &'static str {
        match self {
            AiRoute::Health => "/health",
            AiRoute::ModelsStatus => "/models/status",
            AiRoute::ClinicalNote => "/insight/clinical-note",
            AiRoute::LabSummary => "/insight/lab-summary",
            AiRoute::SymptomAnalysis => "/insight/symptom-analysis",
            AiRoute::PrescriptionGuide => "/insight/prescription-guide",
            AiRoute::TestAnalysis => "/insight/test-analysis",
        }
    }

    /// Insight routes are POSTed with a JSON body
    pub fn is_post(&self) -> bool {
        !matches!(self, AiRoute::Health | AiRoute::ModelsStatus)
    }
}

/// Status and JSON body as returned by the gateway
#[derive(Debug, Clone, PartialEq)]
pub struct AiResponse {
    pub status: u16,
    pub body: Value,
}

#[async_trait]
pub trait AiGatewayTrait {
    /// Forward a call; any HTTP status from the gateway is a successful forward
    async fn forward(
        &self,
        route: AiRoute,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<AiResponse, AiGatewayError>;
}

/// Keep JSON bodies, wrap anything else
pub fn parse_gateway_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or_else(|_| json!({ "raw": String::from_utf8_lossy(bytes) }))
}

/// Upper bound for one gateway call, response body included
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        warn!("Could not build AI gateway client with timeout: {}", e);
        reqwest::Client::new()
    })
}

pub struct HttpAiGateway {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpAiGateway {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(REQUEST_TIMEOUT),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl AiGatewayTrait for HttpAiGateway {
    async fn forward(
        &self,
        route: AiRoute,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<AiResponse, AiGatewayError> {
        let url = format!("{}{}", self.base_url, route.path());
        let body = body.unwrap_or_else(|| json!({}));

        // Only transport failures are retried; HTTP statuses are passed on.
        let is_transient = |e: &reqwest::Error| e.is_connect() || e.is_timeout() || e.is_request();
        let response = with_retry(&self.retry, is_transient, || {
            let request = if route.is_post() {
                self.client.post(&url).json(&body)
            } else {
                self.client.get(&url)
            };
            request.query(&query).send()
        })
        .await
        .map_err(|e| {
            error!("AI gateway call to {} failed: {}", url, e);
            AiGatewayError::Unavailable(e.to_string())
        })?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| {
            error!("Reading AI gateway response from {} failed: {}", url, e);
            AiGatewayError::Unavailable(e.to_string())
        })?;

        debug!("AI gateway {} answered {}", url, status);
        Ok(AiResponse { status, body: parse_gateway_body(&bytes) })
    }
}

pub fn create_default_ai_gateway(config: &AppConfig) -> impl AiGatewayTrait + Send + Sync {
    HttpAiGateway::new(&config.ai_gateway_url)
}
