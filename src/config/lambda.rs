use crate::config::validate_warehouse_settings;
use crate::domain::model::TableNames;
use crate::domain::ports::{WarehouseSettings, DEFAULT_API_BASE_URL, DEFAULT_METADATA_TOKEN_URL};
use crate::utils::error::{ApiError, Result};
use crate::utils::validation::Validate;
use std::env;

#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub project_id: String,
    pub location: Option<String>,
    pub api_base_url: String,
    pub access_token: Option<String>,
    pub metadata_token_url: Option<String>,
    pub timeout_seconds: u64,
    pub max_poll_attempts: u32,
    pub poll_interval_ms: u64,
    pub tables: TableNames,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 以任意查詢函式取代環境變數，方便測試
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_or = |key: &str, default: u64| -> Result<u64> {
            match lookup(key) {
                Some(raw) => raw.trim().parse().map_err(|_| ApiError::InvalidConfigValueError {
                    field: key.to_string(),
                    value: raw.clone(),
                    reason: "Value must be a non-negative integer".to_string(),
                }),
                None => Ok(default),
            }
        };

        let defaults = TableNames::default();
        let tables = TableNames {
            placements_daily: lookup("TABLE_PLACEMENTS_DAILY").unwrap_or(defaults.placements_daily),
            placements_hourly: lookup("TABLE_PLACEMENTS_HOURLY")
                .unwrap_or(defaults.placements_hourly),
            store_traffic_daily: lookup("TABLE_STORE_TRAFFIC_DAILY")
                .unwrap_or(defaults.store_traffic_daily),
            sales_daily: lookup("TABLE_SALES_DAILY").unwrap_or(defaults.sales_daily),
            store_transactions_daily: lookup("TABLE_STORE_TRANSACTIONS_DAILY")
                .unwrap_or(defaults.store_transactions_daily),
        };

        let max_poll_attempts = parse_or("BIGQUERY_MAX_POLL_ATTEMPTS", 30)?;
        let max_poll_attempts =
            u32::try_from(max_poll_attempts).map_err(|_| ApiError::InvalidConfigValueError {
                field: "BIGQUERY_MAX_POLL_ATTEMPTS".to_string(),
                value: max_poll_attempts.to_string(),
                reason: format!("Value must not exceed {}", u32::MAX),
            })?;

        let metadata_token_url = match lookup("BIGQUERY_METADATA_TOKEN_URL") {
            Some(url) => Some(url),
            None if lookup("BIGQUERY_USE_METADATA_SERVER").as_deref() == Some("true") => {
                Some(DEFAULT_METADATA_TOKEN_URL.to_string())
            }
            None => None,
        };

        Ok(Self {
            project_id: lookup("BIGQUERY_PROJECT_ID").ok_or_else(|| {
                ApiError::MissingConfigError {
                    field: "BIGQUERY_PROJECT_ID".to_string(),
                }
            })?,
            location: lookup("BIGQUERY_LOCATION"),
            api_base_url: lookup("BIGQUERY_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            access_token: lookup("BIGQUERY_ACCESS_TOKEN"),
            metadata_token_url,
            timeout_seconds: parse_or("BIGQUERY_TIMEOUT_SECONDS", 30)?,
            max_poll_attempts,
            poll_interval_ms: parse_or("BIGQUERY_POLL_INTERVAL_MS", 1000)?,
            tables,
        })
    }
}

impl WarehouseSettings for LambdaConfig {
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
        self.metadata_token_url.as_deref()
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

impl Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        validate_warehouse_settings(self)?;

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}
