use crate::core::queries::ReportKind;
use crate::core::sql::{normalize_dates, normalize_ids};
use crate::domain::model::{
    Conversion, HourlyTraffic, ReportFilters, Row, Sales, StoreTraffic, TableNames, Traffic,
};
use crate::domain::ports::Warehouse;
use crate::utils::error::Result;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// GraphQL 參數 -> SQL -> 倉儲 -> 結果列，每次呼叫互不相干
#[derive(Clone)]
pub struct ReportService {
    warehouse: Arc<dyn Warehouse>,
    tables: TableNames,
}

impl ReportService {
    pub fn new(warehouse: Arc<dyn Warehouse>, tables: TableNames) -> Self {
        Self { warehouse, tables }
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    pub async fn traffics(
        &self,
        dates: &[Option<String>],
        store_ids: &[Option<i32>],
        product_ids: &[Option<i32>],
    ) -> Result<Vec<Traffic>> {
        let filters = Self::filters(dates, store_ids, product_ids)?;
        self.run(ReportKind::Traffic, &filters).await
    }

    pub async fn store_traffics(
        &self,
        dates: &[Option<String>],
        store_ids: &[Option<i32>],
    ) -> Result<Vec<StoreTraffic>> {
        let filters = Self::filters(dates, store_ids, &[])?;
        self.run(ReportKind::StoreTraffic, &filters).await
    }

    pub async fn hourly_traffics(
        &self,
        dates: &[Option<String>],
        store_ids: &[Option<i32>],
        product_ids: &[Option<i32>],
    ) -> Result<Vec<HourlyTraffic>> {
        let filters = Self::filters(dates, store_ids, product_ids)?;
        self.run(ReportKind::HourlyTraffic, &filters).await
    }

    pub async fn sales(
        &self,
        dates: &[Option<String>],
        store_ids: &[Option<i32>],
        product_ids: &[Option<i32>],
    ) -> Result<Vec<Sales>> {
        let filters = Self::filters(dates, store_ids, product_ids)?;
        self.run(ReportKind::Sales, &filters).await
    }

    pub async fn conversions(
        &self,
        dates: &[Option<String>],
        store_ids: &[Option<i32>],
    ) -> Result<Vec<Conversion>> {
        let filters = Self::filters(dates, store_ids, &[])?;
        self.run(ReportKind::Conversion, &filters).await
    }

    fn filters(
        dates: &[Option<String>],
        store_ids: &[Option<i32>],
        product_ids: &[Option<i32>],
    ) -> Result<ReportFilters> {
        Ok(ReportFilters {
            dates: normalize_dates(dates)?,
            store_ids: normalize_ids(store_ids),
            product_ids: normalize_ids(product_ids),
        })
    }

    async fn run<T: DeserializeOwned>(
        &self,
        kind: ReportKind,
        filters: &ReportFilters,
    ) -> Result<Vec<T>> {
        tracing::info!(
            report = kind.name(),
            dates = filters.dates.len(),
            stores = ?filters.store_ids,
            products = ?filters.product_ids,
            "Resolving report"
        );

        if !kind.has_required_filters(filters) {
            tracing::info!(report = kind.name(), "⚠️ Missing required filters, returning empty result");
            return Ok(Vec::new());
        }

        let sql = kind.build_sql(filters, &self.tables);
        tracing::debug!(report = kind.name(), "Generated SQL:\n{}", sql);

        let rows = self.warehouse.run_query(&sql).await?;
        tracing::debug!(report = kind.name(), "Warehouse returned {} rows", rows.len());

        rows.into_iter().map(decode_row).collect()
    }
}

fn decode_row<T: DeserializeOwned>(row: Row) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::Object(row))?)
}
