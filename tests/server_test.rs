#![cfg(feature = "cli")]

use async_trait::async_trait;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use store_traffic_api::adapters::http;
use store_traffic_api::core::{Row, TableNames, Warehouse};
use store_traffic_api::{build_schema, ReportService, Result};
use tokio::net::TcpListener;

/// 記錄收到的 SQL，並回傳固定的結果列
struct CannedWarehouse {
    rows: Vec<Row>,
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl Warehouse for CannedWarehouse {
    async fn run_query(&self, sql: &str) -> Result<Vec<Row>> {
        self.queries.lock().unwrap().push(sql.to_string());
        Ok(self.rows.clone())
    }
}

async fn start_server(warehouse: Arc<CannedWarehouse>) -> anyhow::Result<String> {
    let schema = build_schema(ReportService::new(warehouse, TableNames::default()));
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, http::router(schema)).await {
            eprintln!("server error: {}", e);
        }
    });

    Ok(format!("http://{}", addr))
}

fn canned(rows: serde_json::Value) -> Arc<CannedWarehouse> {
    let rows = rows
        .as_array()
        .map(|items| items.iter().filter_map(|v| v.as_object().cloned()).collect())
        .unwrap_or_default();
    Arc::new(CannedWarehouse {
        rows,
        queries: Mutex::new(Vec::new()),
    })
}

#[tokio::test]
async fn test_health() -> anyhow::Result<()> {
    let base_url = start_server(canned(json!([]))).await?;

    let res = reqwest::get(format!("{}/health", base_url)).await?;

    assert!(res.status().is_success());
    assert_eq!(res.json::<serde_json::Value>().await?, json!({"status": "ok"}));
    Ok(())
}

#[tokio::test]
async fn test_post_graphql_query() -> anyhow::Result<()> {
    let warehouse = canned(json!([
        {"date": "2021-09-01", "units": 4, "revenue": 39.96}
    ]));
    let base_url = start_server(warehouse.clone()).await?;

    let res = reqwest::Client::new()
        .post(format!("{}{}", base_url, http::GRAPHQL_PATH))
        .json(&json!({
            "query": "query Sales($d: [String]!) { sales(dates: $d, storeIds: [1], productIds: [9]) { date units revenue } }",
            "variables": {"d": ["20210901"]}
        }))
        .send()
        .await?;

    assert!(res.status().is_success());
    let body: serde_json::Value = res.json().await?;
    assert_eq!(
        body["data"],
        json!({"sales": [{"date": "2021-09-01", "units": 4, "revenue": 39.96}]})
    );

    let queries = warehouse.queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].contains("FROM pos.sales_daily"));
    assert!(queries[0].contains("DATE '2021-09-01'"));
    Ok(())
}

#[tokio::test]
async fn test_non_json_post_is_rejected() -> anyhow::Result<()> {
    let warehouse = canned(json!([]));
    let base_url = start_server(warehouse.clone()).await?;

    let res = reqwest::Client::new()
        .post(format!("{}{}", base_url, http::GRAPHQL_PATH))
        .header("Content-Type", "text/plain")
        .body(r#"{"query": "{ conversions(dates: [\"20210901\"], storeIds: [1]) { date } }"}"#)
        .send()
        .await?;

    assert_eq!(res.status().as_u16(), 415);
    assert!(warehouse.queries.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_graphiql_page() -> anyhow::Result<()> {
    let base_url = start_server(canned(json!([]))).await?;

    let res = reqwest::get(format!("{}{}", base_url, http::GRAPHQL_PATH)).await?;

    assert!(res.status().is_success());
    assert!(res.text().await?.to_lowercase().contains("graphiql"));
    Ok(())
}
