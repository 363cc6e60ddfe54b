//! Application settings loaded from environment variables

use std::env;
use std::str::FromStr;

use tracing::warn;

/// Cost range bcrypt accepts
const MIN_SALT_ROUNDS: u32 = 4;
const MAX_SALT_ROUNDS: u32 = 31;

/// Runtime configuration for the EMR backend
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listen port
    pub port: u16,
    /// HMAC secret for signing access tokens
    pub jwt_secret: String,
    /// `iss` claim written to and required from tokens
    pub jwt_issuer: String,
    /// Access token lifetime
    pub token_expiration_hours: i64,
    /// bcrypt cost factor
    pub salt_rounds: u32,
    /// Base URL of the AI gateway
    pub ai_gateway_url: String,
    /// Optional JSON drug dataset
    pub drug_database_path: Option<String>,
    /// Hospital name printed on generated documents
    pub hospital_name: String,
    /// Doctor name used when a request names none
    pub default_doctor: String,
    /// Populate the database with demo records on startup
    pub seed_demo_data: bool,
    /// Directory holding the SQLite file
    pub data_dir: String,
    /// Deployment environment label
    pub app_env: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            jwt_secret: "dev-secret".to_string(),
            jwt_issuer: "emr-backend".to_string(),
            token_expiration_hours: 12,
            salt_rounds: 10,
            ai_gateway_url: "http://localhost:5001".to_string(),
            drug_database_path: None,
            hospital_name: "EMR Hospital".to_string(),
            default_doctor: "Dr. Kim".to_string(),
            seed_demo_data: false,
            data_dir: "data".to_string(),
            app_env: "development".to_string(),
        }
    }
}

impl AppConfig {
    /// Read the configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            port: parse_var("PORT", defaults.port),
            jwt_secret: env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or(defaults.jwt_issuer),
            token_expiration_hours: parse_var("TOKEN_EXPIRATION_HOURS", defaults.token_expiration_hours),
            salt_rounds: clamp_salt_rounds(parse_var("SALT_ROUNDS", defaults.salt_rounds)),
            ai_gateway_url: env::var("AI_GATEWAY_URL").unwrap_or(defaults.ai_gateway_url),
            drug_database_path: env::var("DRUG_DATABASE_PATH").ok().filter(|p| !p.trim().is_empty()),
            hospital_name: env::var("HOSPITAL_NAME").unwrap_or(defaults.hospital_name),
            default_doctor: env::var("DEFAULT_DOCTOR").unwrap_or(defaults.default_doctor),
            seed_demo_data: env::var("SEED_DEMO_DATA")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(defaults.seed_demo_data),
            data_dir: env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            app_env: env::var("APP_ENV").unwrap_or(defaults.app_env),
        }
    }
}

fn parse_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={}, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// Keep the bcrypt cost inside the range bcrypt accepts
fn clamp_salt_rounds(rounds: u32) -> u32 {
    let clamped = rounds.clamp(MIN_SALT_ROUNDS, MAX_SALT_ROUNDS);
    if clamped != rounds {
        warn!("SALT_ROUNDS={} is outside {}..={}, using {}", rounds, MIN_SALT_ROUNDS, MAX_SALT_ROUNDS, clamped);
    }
    clamped
}
