use crate::core::sql::{date_list, int_list, DateFormat};
use crate::domain::model::{ReportFilters, TableNames};

/// 五個查詢操作，各自對應一張 (或兩張) 倉儲資料表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Traffic,
    StoreTraffic,
    HourlyTraffic,
    Sales,
    Conversion,
}

impl ReportKind {
    pub fn name(self) -> &'static str {
        match self {
            ReportKind::Traffic => "traffics",
            ReportKind::StoreTraffic => "storeTraffics",
            ReportKind::HourlyTraffic => "hourlyTraffics",
            ReportKind::Sales => "sales",
            ReportKind::Conversion => "conversions",
        }
    }

    /// placement 表的 date 是 STRING，其餘是 DATE
    pub fn date_format(self) -> DateFormat {
        match self {
            ReportKind::Traffic | ReportKind::HourlyTraffic => DateFormat::Compact,
            ReportKind::StoreTraffic | ReportKind::Sales | ReportKind::Conversion => {
                DateFormat::Iso
            }
        }
    }

    pub fn requires_products(self) -> bool {
        matches!(
            self,
            ReportKind::Traffic | ReportKind::HourlyTraffic | ReportKind::Sales
        )
    }

    /// 必要條件有任何一個是空的就不查詢
    pub fn has_required_filters(self, filters: &ReportFilters) -> bool {
        !filters.dates.is_empty()
            && !filters.store_ids.is_empty()
            && (!self.requires_products() || !filters.product_ids.is_empty())
    }

    pub fn build_sql(self, filters: &ReportFilters, tables: &TableNames) -> String {
        let dates = date_list(&filters.dates, self.date_format());
        let store_ids = int_list(&filters.store_ids);
        let product_ids = int_list(&filters.product_ids);

        match self {
            ReportKind::Traffic => apportioned_placements_sql(
                &tables.placements_daily,
                &[],
                &dates,
                &store_ids,
                &product_ids,
            ),
            ReportKind::HourlyTraffic => apportioned_placements_sql(
                &tables.placements_hourly,
                &["hour"],
                &dates,
                &store_ids,
                &product_ids,
            ),
            ReportKind::StoreTraffic => format!(
                "SELECT date, store_id, SUM(traffic) traffic
        FROM {table}
        WHERE date IN ({dates})
        AND store_id IN ({store_ids})
        GROUP BY 1, 2
        ORDER BY 1, 2",
                table = tables.store_traffic_daily,
            ),
            ReportKind::Sales => format!(
                "SELECT date, SUM(units) units, SUM(revenue) revenue
        FROM {table}
        WHERE date IN ({dates})
        AND store_id IN ({store_ids})
        AND product_id IN ({product_ids})
        GROUP BY 1
        ORDER BY 1",
                table = tables.sales_daily,
            ),
            ReportKind::Conversion => format!(
                "WITH t AS (
          SELECT date, SUM(traffic) traffic
          FROM {traffic_table}
          WHERE date IN ({dates})
          AND store_id IN ({store_ids})
          GROUP BY 1
        ), s AS (
          SELECT date, SUM(transactions) transactions
          FROM {transactions_table}
          WHERE date IN ({dates})
          AND store_id IN ({store_ids})
          GROUP BY 1
        )
        SELECT t.date date, t.traffic traffic, s.transactions transactions,
          SAFE_DIVIDE(s.transactions, t.traffic) conversion_rate
        FROM t
        LEFT JOIN s ON s.date = t.date
        ORDER BY 1",
                traffic_table = tables.store_traffic_daily,
                transactions_table = tables.store_transactions_daily,
            ),
        }
    }
}

/// 一筆 placement 可能同時涵蓋多個商品，指標依 `product_ids` 長度平均分攤
fn apportioned_placements_sql(
    table: &str,
    extra_keys: &[&str],
    dates: &str,
    store_ids: &str,
    product_ids: &str,
) -> String {
    let keys = std::iter::once("date")
        .chain(extra_keys.iter().copied())
        .collect::<Vec<_>>();
    let key_columns = keys.join(", ");
    let ordinals = (1..=keys.len())
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "SELECT {key_columns}, SUM(traffic) traffic, SUM(dwells) dwells, SUM(total_dwell_time) total_dwell_time
        FROM (
          SELECT
          {key_columns}, product_id, (traffic/ARRAY_LENGTH(product_ids)) traffic, (dwells/ARRAY_LENGTH(product_ids)) dwells, (total_dwell_time/ARRAY_LENGTH(product_ids)) total_dwell_time
          FROM {table}
          JOIN UNNEST(product_ids) AS product_id
          WHERE EXISTS (SELECT *
                        FROM UNNEST(product_ids) AS x
                        WHERE x IN ({product_ids}))
          AND date IN ({dates})
          AND store_id IN ({store_ids})
        ) t1
        WHERE t1.product_id IN ({product_ids})
        GROUP BY {ordinals}
        ORDER BY {ordinals}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn filters() -> ReportFilters {
        ReportFilters {
            dates: vec![
                NaiveDate::from_ymd_opt(2021, 9, 1).unwrap(),
                NaiveDate::from_ymd_opt(2021, 9, 2).unwrap(),
            ],
            store_ids: vec![101, 102],
            product_ids: vec![7],
        }
    }

    #[test]
    fn test_traffic_query_apportions_by_product() {
        let sql = ReportKind::Traffic.build_sql(&filters(), &TableNames::default());

        assert!(sql.contains("FROM retail_next.placements_daily"));
        assert!(sql.contains("JOIN UNNEST(product_ids) AS product_id"));
        assert!(sql.contains("(traffic/ARRAY_LENGTH(product_ids)) traffic"));
        assert!(sql.contains("AND date IN ('20210901', '20210902')"));
        assert!(sql.contains("AND store_id IN (101, 102)"));
        assert!(sql.contains("WHERE x IN (7)"));
        assert!(sql.contains("WHERE t1.product_id IN (7)"));
        assert!(sql.contains("GROUP BY 1\n"));
    }

    #[test]
    fn test_hourly_query_groups_by_hour() {
        let sql = ReportKind::HourlyTraffic.build_sql(&filters(), &TableNames::default());

        assert!(sql.starts_with("SELECT date, hour, SUM(traffic) traffic"));
        assert!(sql.contains("FROM retail_next.placements_hourly"));
        assert!(sql.contains("GROUP BY 1, 2"));
        assert!(sql.contains("'20210901'"));
    }

    #[test]
    fn test_date_tables_use_date_literals() {
        let tables = TableNames::default();
        for kind in [ReportKind::StoreTraffic, ReportKind::Sales, ReportKind::Conversion] {
            let sql = kind.build_sql(&filters(), &tables);
            assert!(
                sql.contains("date IN (DATE '2021-09-01', DATE '2021-09-02')"),
                "{} should use DATE literals:\n{}",
                kind.name(),
                sql
            );
            assert!(!sql.contains("'20210901'"));
        }
    }

    #[test]
    fn test_conversion_query_joins_traffic_and_transactions() {
        let sql = ReportKind::Conversion.build_sql(&filters(), &TableNames::default());

        assert!(sql.contains("FROM retail_next.store_traffic_daily"));
        assert!(sql.contains("FROM pos.store_transactions_daily"));
        assert!(sql.contains("SAFE_DIVIDE(s.transactions, t.traffic) conversion_rate"));
        assert!(!sql.contains("product_id"));
    }

    #[test]
    fn test_custom_table_names_are_used() {
        let tables = TableNames {
            sales_daily: "analytics-prod.pos.sales_daily_v2".to_string(),
            ..TableNames::default()
        };
        let sql = ReportKind::Sales.build_sql(&filters(), &tables);
        assert!(sql.contains("FROM analytics-prod.pos.sales_daily_v2"));
        assert!(sql.contains("AND product_id IN (7)"));

        let tables = TableNames {
            store_transactions_daily: "pos_v2.transactions".to_string(),
            ..TableNames::default()
        };
        let sql = ReportKind::Conversion.build_sql(&filters(), &tables);
        assert!(sql.contains("FROM pos_v2.transactions"));
        assert!(!sql.contains("pos.sales_daily"));
    }

    #[test]
    fn test_required_filters() {
        let full = filters();
        let no_products = ReportFilters {
            product_ids: vec![],
            ..filters()
        };
        let no_dates = ReportFilters {
            dates: vec![],
            ..filters()
        };

        assert!(ReportKind::Traffic.has_required_filters(&full));
        assert!(!ReportKind::Traffic.has_required_filters(&no_products));
        assert!(!ReportKind::Sales.has_required_filters(&no_products));
        assert!(ReportKind::StoreTraffic.has_required_filters(&no_products));
        assert!(ReportKind::Conversion.has_required_filters(&no_products));
        assert!(!ReportKind::Conversion.has_required_filters(&no_dates));
    }
}
