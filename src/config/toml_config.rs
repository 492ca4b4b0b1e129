use crate::config::{bind_addr, validate_warehouse_settings};
use crate::domain::model::TableNames;
use crate::domain::ports::{WarehouseSettings, DEFAULT_API_BASE_URL, DEFAULT_METADATA_TOKEN_URL};
use crate::utils::error::{ApiError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub tables: TableNames,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    pub project_id: String,
    pub location: Option<String>,
    pub api_base_url: Option<String>,
    pub access_token: Option<String>,
    pub use_metadata_server: Option<bool>,
    pub metadata_token_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_poll_attempts: Option<u32>,
    pub poll_interval_ms: Option<u64>,
}

fn env_placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ApiError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ApiError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BIGQUERY_ACCESS_TOKEN})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        env_placeholder()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        // 未替換的 ${VAR} 代表環境變數沒設定
        let mut unresolved = vec![
            ("server.host", Some(self.server.host.as_str())),
            ("warehouse.project_id", Some(self.warehouse.project_id.as_str())),
            ("warehouse.location", self.warehouse.location.as_deref()),
            ("warehouse.api_base_url", self.warehouse.api_base_url.as_deref()),
            ("warehouse.access_token", self.warehouse.access_token.as_deref()),
            ("warehouse.metadata_token_url", self.warehouse.metadata_token_url.as_deref()),
        ];
        unresolved.extend(self.tables.entries().map(|(field, value)| (field, Some(value))));
        for (field, value) in unresolved {
            if let Some(value) = value {
                if let Some(caps) = env_placeholder().captures(value) {
                    return Err(ApiError::ConfigValidationError {
                        field: field.to_string(),
                        message: format!("environment variable {} is not set", &caps[1]),
                    });
                }
            }
        }

        validate_warehouse_settings(self)?;
        self.bind_addr()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        bind_addr(&self.server.host, self.server.port)
    }
}

impl WarehouseSettings for TomlConfig {
    fn api_base_url(&self) -> &str {
        self.warehouse
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
    }

    fn project_id(&self) -> &str {
        &self.warehouse.project_id
    }

    fn location(&self) -> Option<&str> {
        self.warehouse.location.as_deref()
    }

    fn access_token(&self) -> Option<&str> {
        self.warehouse.access_token.as_deref()
    }

    fn metadata_token_url(&self) -> Option<&str> {
        match (
            self.warehouse.use_metadata_server.unwrap_or(false),
            self.warehouse.metadata_token_url.as_deref(),
        ) {
            (_, Some(url)) => Some(url),
            (true, None) => Some(DEFAULT_METADATA_TOKEN_URL),
            (false, None) => None,
        }
    }

    fn timeout_seconds(&self) -> u64 {
        self.warehouse.timeout_seconds.unwrap_or(30)
    }

    fn max_poll_attempts(&self) -> u32 {
        self.warehouse.max_poll_attempts.unwrap_or(30)
    }

    fn poll_interval_ms(&self) -> u64 {
        self.warehouse.poll_interval_ms.unwrap_or(1000)
    }

    fn tables(&self) -> &TableNames {
        &self.tables
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
