use async_graphql::SimpleObject;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// 倉儲回傳的一列資料，欄位名稱 -> 依 schema 轉型後的值
pub type Row = serde_json::Map<String, serde_json::Value>;

/// 正規化後的查詢條件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilters {
    pub dates: Vec<NaiveDate>,
    pub store_ids: Vec<i64>,
    pub product_ids: Vec<i64>,
}

/// 每個報表對應的倉儲資料表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub placements_daily: String,
    pub placements_hourly: String,
    pub store_traffic_daily: String,
    pub sales_daily: String,
    pub store_transactions_daily: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            placements_daily: "retail_next.placements_daily".to_string(),
            placements_hourly: "retail_next.placements_hourly".to_string(),
            store_traffic_daily: "retail_next.store_traffic_daily".to_string(),
            sales_daily: "pos.sales_daily".to_string(),
            store_transactions_daily: "pos.store_transactions_daily".to_string(),
        }
    }
}

impl TableNames {
    pub fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("tables.placements_daily", self.placements_daily.as_str()),
            ("tables.placements_hourly", self.placements_hourly.as_str()),
            ("tables.store_traffic_daily", self.store_traffic_daily.as_str()),
            ("tables.sales_daily", self.sales_daily.as_str()),
            ("tables.store_transactions_daily", self.store_transactions_daily.as_str()),
        ]
    }
}

/// 計數欄位：NUMERIC / FLOAT 加總回傳的 `4.0` 也接受，帶小數的值則拒絕
fn deserialize_count<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Number>::deserialize(deserializer)? {
        None => Ok(None),
        Some(number) => {
            if let Some(value) = number.as_i64() {
                return Ok(Some(value));
            }
            match number.as_f64() {
                Some(value)
                    if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 =>
                {
                    Ok(Some(value as i64))
                }
                _ => Err(serde::de::Error::custom(format!(
                    "expected an integral count, got {}",
                    number
                ))),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct Traffic {
    pub date: Option<String>,
    pub traffic: Option<f64>,
    pub dwells: Option<f64>,
    pub total_dwell_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct StoreTraffic {
    pub date: Option<String>,
    pub store_id: Option<i64>,
    pub traffic: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct HourlyTraffic {
    pub date: Option<String>,
    pub hour: Option<i64>,
    pub traffic: Option<f64>,
    pub dwells: Option<f64>,
    pub total_dwell_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct Sales {
    pub date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub units: Option<i64>,
    pub revenue: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct Conversion {
    pub date: Option<String>,
    pub traffic: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub transactions: Option<i64>,
    pub conversion_rate: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_counts_accept_integral_floats() {
        let sales: Sales =
            serde_json::from_value(json!({"date": "2021-09-01", "units": 4.0, "revenue": 39.96}))
                .unwrap();
        assert_eq!(sales.units, Some(4));

        let conversion: Conversion =
            serde_json::from_value(json!({"date": "2021-09-01", "transactions": 7, "traffic": 70.0}))
                .unwrap();
        assert_eq!(conversion.transactions, Some(7));
        assert_eq!(conversion.conversion_rate, None);
    }

    #[test]
    fn test_counts_reject_fractions() {
        let result = serde_json::from_value::<Sales>(json!({"units": 4.5}));
        assert!(result.is_err());

        let sales: Sales = serde_json::from_value(json!({"units": null})).unwrap();
        assert_eq!(sales.units, None);
    }
}
