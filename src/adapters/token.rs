use crate::domain::ports::TokenSource;
use crate::utils::error::{ApiError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// 提前刷新，避免 token 在請求途中過期
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

pub struct AccessTokens {
    source: TokenSource,
    client: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl AccessTokens {
    pub fn new(source: TokenSource, client: Client) -> Self {
        Self {
            source,
            client,
            cached: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &TokenSource {
        &self.source
    }

    /// `None` 表示不帶 Authorization header
    pub async fn bearer(&self) -> Result<Option<String>> {
        match &self.source {
            TokenSource::Anonymous => Ok(None),
            TokenSource::Static(token) => Ok(Some(token.clone())),
            TokenSource::Metadata(url) => {
                let mut cached = self.cached.lock().await;
                if let Some(token) = cached.as_ref() {
                    if Instant::now() < token.refresh_at {
                        return Ok(Some(token.value.clone()));
                    }
                }

                let fresh = self.fetch_metadata_token(url).await?;
                let value = fresh.value.clone();
                *cached = Some(fresh);
                Ok(Some(value))
            }
        }
    }

    async fn fetch_metadata_token(&self, url: &str) -> Result<CachedToken> {
        tracing::debug!("Requesting access token from metadata server: {}", url);
        let response = self
            .client
            .get(url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| ApiError::AuthError {
                message: format!("metadata server unreachable: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::AuthError {
                message: format!("metadata server returned {}: {}", status, body),
            });
        }

        let token: MetadataToken = response.json().await.map_err(|e| ApiError::AuthError {
            message: format!("invalid token response: {}", e),
        })?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        tracing::debug!("🔑 Access token acquired, refresh in {:?}", lifetime);

        Ok(CachedToken {
            value: token.access_token,
            refresh_at: Instant::now() + lifetime,
        })
    }
}
