// Adapters layer: concrete implementations for external systems (warehouse REST API, token source, http).

pub mod bigquery;
pub mod token;

#[cfg(feature = "cli")]
pub mod http;
