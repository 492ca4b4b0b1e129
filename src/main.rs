use clap::Parser;
use std::sync::Arc;
use store_traffic_api::adapters::http;
use store_traffic_api::domain::ports::WarehouseSettings;
use store_traffic_api::utils::error::{ApiError, ErrorSeverity};
use store_traffic_api::utils::{logger, validation::Validate};
use store_traffic_api::{build_schema, BigQueryClient, ReportService, ServeConfig, TomlConfig};

fn exit_with(error: &ApiError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?}, Retryable: {})",
        error,
        error.category(),
        error.severity(),
        error.is_retryable()
    );
    tracing::error!("💡 Recovery suggestion: {}", error.recovery_suggestion());
    eprintln!("❌ {}", error.user_friendly_message());
    eprintln!("💡 建議: {}", error.recovery_suggestion());

    let exit_code = match error.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn report_service<S: WarehouseSettings + Validate>(settings: &S) -> Result<ReportService, ApiError> {
    settings.validate()?;
    let client = BigQueryClient::from_settings(settings)?;
    Ok(ReportService::new(Arc::new(client), settings.tables().clone()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServeConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting store-traffic-api");

    let loaded = match &config.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            TomlConfig::from_file(path).and_then(|toml_config| {
                let addr = toml_config.bind_addr()?;
                Ok((addr, report_service(&toml_config)?))
            })
        }
        None => config
            .bind_addr()
            .and_then(|addr| Ok((addr, report_service(&config)?))),
    };

    let (addr, service) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => exit_with(&e),
    };
    if config.verbose {
        tracing::debug!("Backing tables: {:?}", service.tables());
    }

    let schema = build_schema(service);
    if let Err(e) = http::serve(addr, schema).await {
        exit_with(&e);
    }

    Ok(())
}
