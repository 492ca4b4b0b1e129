pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::ServeConfig;

pub use adapters::bigquery::BigQueryClient;
pub use config::{lambda::LambdaConfig, toml_config::TomlConfig};
pub use crate::core::{
    reports::ReportService,
    schema::{build_schema, ReportSchema},
};
pub use utils::error::{ApiError, Result};
