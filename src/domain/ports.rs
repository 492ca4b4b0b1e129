use crate::domain::model::{Row, TableNames};
use crate::utils::error::Result;
use async_trait::async_trait;

pub const DEFAULT_API_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";
pub const DEFAULT_METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// 遠端查詢引擎：執行一段 SQL，回傳結果列
#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn run_query(&self, sql: &str) -> Result<Vec<Row>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// 不帶 Authorization header (模擬器、測試)
    Anonymous,
    Static(String),
    /// 從 GCE / Cloud Functions metadata server 取得
    Metadata(String),
}

pub trait WarehouseSettings: Send + Sync {
    fn api_base_url(&self) -> &str;
    fn project_id(&self) -> &str;
    fn location(&self) -> Option<&str>;
    fn access_token(&self) -> Option<&str>;
    fn metadata_token_url(&self) -> Option<&str>;
    fn timeout_seconds(&self) -> u64;
    fn max_poll_attempts(&self) -> u32;
    fn poll_interval_ms(&self) -> u64;
    fn tables(&self) -> &TableNames;

    fn token_source(&self) -> TokenSource {
        match (self.access_token(), self.metadata_token_url()) {
            (Some(token), _) if !token.trim().is_empty() => TokenSource::Static(token.to_string()),
            (_, Some(url)) => TokenSource::Metadata(url.to_string()),
            _ => TokenSource::Anonymous,
        }
    }
}
