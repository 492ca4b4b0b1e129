use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid argument '{argument}': {message}")]
    ValidationError { argument: String, message: String },

    #[error("Warehouse returned {status}: {message}")]
    WarehouseError { status: u16, message: String },

    #[error("Query job {job_id} did not complete after {attempts} polls")]
    JobTimeout { job_id: String, attempts: u32 },

    #[error("Authentication failed: {message}")]
    AuthError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Network,
    Warehouse,
    Authentication,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ApiError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::ConfigValidationError { .. }
            | ApiError::InvalidConfigValueError { .. }
            | ApiError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ApiError::ValidationError { .. } => ErrorCategory::Input,
            ApiError::HttpError(_) => ErrorCategory::Network,
            ApiError::WarehouseError { .. } | ApiError::JobTimeout { .. } => {
                ErrorCategory::Warehouse
            }
            ApiError::AuthError { .. } => ErrorCategory::Authentication,
            ApiError::IoError(_) | ApiError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Warehouse => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Authentication => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 是否值得稍後重試
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::HttpError(e) => e.is_timeout() || e.is_connect(),
            ApiError::WarehouseError { status, .. } => *status == 429 || *status >= 500,
            ApiError::JobTimeout { .. } => true,
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ApiError::HttpError(_) => "無法連線到資料倉儲服務".to_string(),
            ApiError::WarehouseError { status, .. } => {
                format!("資料倉儲查詢失敗 (HTTP {})", status)
            }
            ApiError::JobTimeout { .. } => "查詢工作逾時，尚未完成".to_string(),
            ApiError::AuthError { .. } => "無法取得資料倉儲存取憑證".to_string(),
            ApiError::ValidationError { argument, message } => {
                format!("參數 {} 無效: {}", argument, message)
            }
            ApiError::MissingConfigError { field } => format!("缺少必要設定: {}", field),
            ApiError::ConfigValidationError { .. } | ApiError::InvalidConfigValueError { .. } => {
                format!("設定錯誤: {}", self)
            }
            ApiError::IoError(_) | ApiError::SerializationError(_) => {
                format!("系統錯誤: {}", self)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "檢查設定檔與環境變數 (BIGQUERY_PROJECT_ID 等)",
            ErrorCategory::Input => "日期請使用 YYYYMMDD 或 YYYY-MM-DD 格式",
            ErrorCategory::Network => "確認網路連線與 API 端點後重試",
            ErrorCategory::Warehouse => "檢查查詢的資料表是否存在，或稍後重試",
            ErrorCategory::Authentication => {
                "設定 BIGQUERY_ACCESS_TOKEN，或在具備 metadata server 的環境中執行"
            }
            ErrorCategory::System => "查看日誌以取得詳細資訊",
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = ApiError::ValidationError {
            argument: "dates".to_string(),
            message: "bad".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(!err.is_retryable());

        let err = ApiError::MissingConfigError {
            field: "project_id".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("project_id"));
    }

    #[test]
    fn test_warehouse_errors_are_retryable_on_server_side_status() {
        let throttled = ApiError::WarehouseError {
            status: 429,
            message: "rate limited".to_string(),
        };
        let not_found = ApiError::WarehouseError {
            status: 404,
            message: "Not found: Table".to_string(),
        };
        assert!(throttled.is_retryable());
        assert!(!not_found.is_retryable());
        assert_eq!(not_found.severity(), ErrorSeverity::Medium);
        assert_eq!(not_found.to_string(), "Warehouse returned 404: Not found: Table");
    }
}
