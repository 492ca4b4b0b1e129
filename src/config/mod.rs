pub mod lambda;
pub mod toml_config;

use crate::domain::model::TableNames;
use crate::domain::ports::WarehouseSettings;
use crate::utils::error::{ApiError, Result};
use std::net::SocketAddr;

#[cfg(feature = "cli")]
use crate::domain::ports::{DEFAULT_API_BASE_URL, DEFAULT_METADATA_TOKEN_URL};
#[cfg(feature = "cli")]
use crate::utils::validation::Validate;
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "store-traffic-api")]
#[command(about = "GraphQL API over store traffic and sales aggregates in BigQuery")]
pub struct ServeConfig {
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "PORT", default_value = "4000")]
    pub port: u16,

    #[arg(long, env = "BIGQUERY_PROJECT_ID", default_value = "")]
    pub project_id: String,

    #[arg(long, env = "BIGQUERY_LOCATION")]
    pub location: Option<String>,

    #[arg(long, env = "BIGQUERY_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    #[arg(long, env = "BIGQUERY_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    #[arg(long, help = "Fetch access tokens from the GCE metadata server")]
    pub use_metadata_server: bool,

    #[arg(long, default_value = "30")]
    pub timeout_seconds: u64,

    #[arg(long, default_value = "30")]
    pub max_poll_attempts: u32,

    #[arg(long, default_value = "1000")]
    pub poll_interval_ms: u64,

    #[arg(short, long, help = "Load settings from a TOML file instead of flags")]
    pub config: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(skip)]
    pub tables: TableNames,
}

#[cfg(feature = "cli")]
impl ServeConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        bind_addr(&self.host, self.port)
    }
}

pub(crate) fn bind_addr(host: &str, port: u16) -> Result<SocketAddr> {
    format!("{}:{}", host, port)
        .parse()
        .map_err(|e| ApiError::InvalidConfigValueError {
            field: "server.host".to_string(),
            value: host.to_string(),
            reason: format!("Invalid listen address: {}", e),
        })
}

#[cfg(feature = "cli")]
impl WarehouseSettings for ServeConfig {
    fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    fn project_id(&self) -> &str {
        &self.project_id
    }

    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    fn metadata_token_url(&self) -> Option<&str> {
        self.use_metadata_server.then_some(DEFAULT_METADATA_TOKEN_URL)
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    fn max_poll_attempts(&self) -> u32 {
        self.max_poll_attempts
    }

    fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    fn tables(&self) -> &TableNames {
        &self.tables
    }
}

#[cfg(feature = "cli")]
impl Validate for ServeConfig {
    fn validate(&self) -> Result<()> {
        validate_warehouse_settings(self)?;
        self.bind_addr()?;
        Ok(())
    }
}

/// 三種設定來源共用的檢查
pub fn validate_warehouse_settings<S: WarehouseSettings + ?Sized>(settings: &S) -> Result<()> {
    use crate::utils::validation::*;

    if settings.project_id().trim().is_empty() {
        return Err(ApiError::MissingConfigError {
            field: "project_id".to_string(),
        });
    }
    validate_project_id("project_id", settings.project_id())?;
    validate_url("api_base_url", settings.api_base_url())?;
    if let Some(url) = settings.metadata_token_url() {
        validate_url("metadata_token_url", url)?;
    }
    if let Some(location) = settings.location() {
        validate_non_empty_string("location", location)?;
    }

    validate_range("timeout_seconds", settings.timeout_seconds(), 1, 600)?;
    validate_positive_number("max_poll_attempts", settings.max_poll_attempts() as usize, 1)?;
    validate_range("poll_interval_ms", settings.poll_interval_ms(), 10, 60_000)?;

    for (field, table) in settings.tables().entries() {
        validate_table_identifier(field, table)?;
    }

    Ok(())
}
