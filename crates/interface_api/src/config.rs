//! API configuration

use serde::Deserialize;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Sales tax rate as a percentage (e.g. 8.0 for 8%)
    pub tax_rate_percent: f64,
    /// FBO location served by this deployment
    pub fbo_location_id: Option<uuid::Uuid>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/fbo".to_string(),
            log_level: "info".to_string(),
            tax_rate_percent: 8.0,
            fbo_location_id: None,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment variables with the `API_`
    /// prefix
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
