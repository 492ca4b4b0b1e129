pub mod queries;
pub mod reports;
pub mod schema;
pub mod sql;

pub use crate::domain::model::{ReportFilters, Row, TableNames};
pub use crate::domain::ports::{TokenSource, Warehouse, WarehouseSettings};
pub use crate::utils::error::Result;
