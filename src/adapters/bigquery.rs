use crate::adapters::token::AccessTokens;
use crate::domain::model::Row;
use crate::domain::ports::{TokenSource, Warehouse, WarehouseSettings};
use crate::utils::error::{ApiError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// jobs.query / getQueryResults 在伺服器端等待完成的時間
const SERVER_WAIT_MS: u64 = 10_000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: &'a str,
    use_legacy_sql: bool,
    timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    job_id: String,
    location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TableSchema {
    #[serde(default)]
    fields: Vec<FieldSchema>,
}

#[derive(Debug, Clone, Deserialize)]
struct FieldSchema {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    #[serde(default)]
    f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    #[serde(default)]
    v: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    job_reference: Option<JobReference>,
    #[serde(default)]
    job_complete: bool,
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Vec<TableRow>,
    page_token: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorProto>,
}

#[derive(Debug, Deserialize)]
struct ErrorProto {
    reason: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// BigQuery v2 REST 客戶端 (jobs.query + getQueryResults)
pub struct BigQueryClient {
    client: Client,
    tokens: AccessTokens,
    api_base_url: String,
    project_id: String,
    location: Option<String>,
    max_poll_attempts: u32,
    poll_interval: Duration,
}

impl BigQueryClient {
    pub fn from_settings<S: WarehouseSettings + ?Sized>(settings: &S) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds()))
            .build()?;
        let tokens = AccessTokens::new(settings.token_source(), client.clone());
        tracing::debug!(
            "BigQuery client for project {} ({} credentials)",
            settings.project_id(),
            match tokens.source() {
                TokenSource::Anonymous => "anonymous",
                TokenSource::Static(_) => "static",
                TokenSource::Metadata(_) => "metadata server",
            }
        );

        Ok(Self {
            client,
            tokens,
            api_base_url: settings.api_base_url().trim_end_matches('/').to_string(),
            project_id: settings.project_id().to_string(),
            location: settings.location().map(str::to_string),
            max_poll_attempts: settings.max_poll_attempts(),
            poll_interval: Duration::from_millis(settings.poll_interval_ms()),
        })
    }

    fn queries_url(&self) -> String {
        format!("{}/projects/{}/queries", self.api_base_url, self.project_id)
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(match self.tokens.bearer().await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn submit(&self, sql: &str) -> Result<QueryResponse> {
        let body = QueryRequest {
            query: sql,
            use_legacy_sql: false,
            timeout_ms: SERVER_WAIT_MS,
            location: self.location.as_deref(),
        };

        let request = self.authorized(self.client.post(self.queries_url()).json(&body)).await?;
        read_response(request.send().await?).await
    }

    async fn fetch_results(
        &self,
        job: &JobReference,
        page_token: Option<&str>,
    ) -> Result<QueryResponse> {
        let url = format!("{}/{}", self.queries_url(), job.job_id);
        let mut params = vec![("timeoutMs", SERVER_WAIT_MS.to_string())];
        if let Some(location) = job.location.as_deref().or(self.location.as_deref()) {
            params.push(("location", location.to_string()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let request = self.authorized(self.client.get(url).query(&params)).await?;
        read_response(request.send().await?).await
    }
}

#[async_trait]
impl Warehouse for BigQueryClient {
    async fn run_query(&self, sql: &str) -> Result<Vec<Row>> {
        let mut response = self.submit(sql).await?;
        let job = response
            .job_reference
            .clone()
            .ok_or_else(|| ApiError::WarehouseError {
                status: 200,
                message: "query response is missing jobReference".to_string(),
            })?;
        tracing::info!("Job {} started.", job.job_id);

        let mut attempts = 0;
        while !response.job_complete {
            if attempts >= self.max_poll_attempts {
                return Err(ApiError::JobTimeout {
                    job_id: job.job_id.clone(),
                    attempts,
                });
            }
            attempts += 1;
            tokio::time::sleep(self.poll_interval).await;
            tracing::debug!("Polling job {} (attempt {})", job.job_id, attempts);
            response = self.fetch_results(&job, None).await?;
        }

        let schema = response.schema.take().unwrap_or(TableSchema { fields: Vec::new() });
        let mut rows = decode_rows(&schema, std::mem::take(&mut response.rows));
        let mut page_token = response.page_token.take();

        while let Some(token) = page_token {
            let page = self.fetch_results(&job, Some(&token)).await?;
            rows.extend(decode_rows(&schema, page.rows));
            page_token = page.page_token;
        }

        for warning in &response.errors {
            tracing::warn!(
                "Job {} reported {}: {}",
                job.job_id,
                warning.reason.as_deref().unwrap_or("error"),
                warning.message.as_deref().unwrap_or("")
            );
        }

        tracing::info!("Job {} returned {} rows", job.job_id, rows.len());
        Ok(rows)
    }
}

async fn read_response(response: Response) -> Result<QueryResponse> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or(body);
        return Err(ApiError::WarehouseError {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response.json().await?)
}

fn decode_rows(schema: &TableSchema, rows: Vec<TableRow>) -> Vec<Row> {
    rows.into_iter()
        .map(|row| {
            schema
                .fields
                .iter()
                .zip(row.f)
                .map(|(field, cell)| (field.name.clone(), decode_cell(field, cell.v)))
                .collect()
        })
        .collect()
}

fn decode_cell(field: &FieldSchema, value: Value) -> Value {
    if field.mode.as_deref() == Some("REPEATED") {
        return match value {
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(mut cell) => {
                            decode_scalar(&field.field_type, cell.remove("v").unwrap_or(Value::Null))
                        }
                        other => decode_scalar(&field.field_type, other),
                    })
                    .collect(),
            ),
            other => other,
        };
    }

    decode_scalar(&field.field_type, value)
}

/// REST API 把所有純量都編成字串，依欄位型別還原
fn decode_scalar(field_type: &str, value: Value) -> Value {
    let Value::String(raw) = value else {
        return value;
    };

    match field_type {
        "INTEGER" | "INT64" => raw.parse::<i64>().map(Value::from).unwrap_or(Value::String(raw)),
        "FLOAT" | "FLOAT64" | "NUMERIC" | "BIGNUMERIC" => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::String(raw)),
        "BOOLEAN" | "BOOL" => match raw.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw),
        },
        _ => Value::String(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(name: &str, field_type: &str) -> FieldSchema {
        FieldSchema {
            name: name.to_string(),
            field_type: field_type.to_string(),
            mode: Some("NULLABLE".to_string()),
        }
    }

    #[test]
    fn test_decode_rows_by_schema() {
        let schema = TableSchema {
            fields: vec![
                field("date", "STRING"),
                field("traffic", "FLOAT"),
                field("store_id", "INTEGER"),
                field("open", "BOOLEAN"),
            ],
        };
        let rows: Vec<TableRow> = serde_json::from_value(json!([
            {"f": [{"v": "20210901"}, {"v": "553.0"}, {"v": "12"}, {"v": "true"}]},
            {"f": [{"v": "20210902"}, {"v": null}, {"v": "13"}, {"v": "false"}]}
        ]))
        .unwrap();

        let decoded = decode_rows(&schema, rows);

        assert_eq!(
            Value::Object(decoded[0].clone()),
            json!({"date": "20210901", "traffic": 553.0, "store_id": 12, "open": true})
        );
        assert_eq!(decoded[1]["traffic"], Value::Null);
        assert_eq!(decoded[1]["open"], json!(false));
    }

    #[test]
    fn test_decode_repeated_and_odd_values() {
        let repeated = FieldSchema {
            name: "product_ids".to_string(),
            field_type: "INTEGER".to_string(),
            mode: Some("REPEATED".to_string()),
        };
        let value = json!([{"v": "1"}, {"v": "2"}]);
        assert_eq!(decode_cell(&repeated, value), json!([1, 2]));

        assert_eq!(decode_scalar("FLOAT", json!("NaN")), json!("NaN"));
        assert_eq!(decode_scalar("DATE", json!("2021-09-01")), json!("2021-09-01"));
        assert_eq!(decode_scalar("INTEGER", json!("oops")), json!("oops"));
    }
}
