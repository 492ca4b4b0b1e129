#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use std::sync::Arc;
#[cfg(feature = "lambda")]
use store_traffic_api::domain::ports::WarehouseSettings;
#[cfg(feature = "lambda")]
use store_traffic_api::utils::{logger, validation::Validate};
#[cfg(feature = "lambda")]
use store_traffic_api::{build_schema, BigQueryClient, LambdaConfig, ReportSchema, ReportService};

/// 事件內容就是 GraphQL 請求 `{query, variables, operationName}`
#[cfg(feature = "lambda")]
async fn function_handler(
    schema: &ReportSchema,
    event: LambdaEvent<async_graphql::Request>,
) -> Result<async_graphql::Response, Error> {
    tracing::info!(request_id = %event.context.request_id, "Handling GraphQL request");

    let response = schema.execute(event.payload).await;
    if response.is_err() {
        for error in &response.errors {
            tracing::error!("❌ GraphQL error: {}", error.message);
        }
    }
    Ok(response)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    let config = LambdaConfig::from_env()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
    config
        .validate()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;

    let client = BigQueryClient::from_settings(&config)
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
    let schema = build_schema(ReportService::new(Arc::new(client), config.tables().clone()));

    let schema = &schema;
    run(service_fn(move |event| async move {
        function_handler(schema, event).await
    }))
    .await
}
