//! SQL 字面值格式化：把 GraphQL 參數轉成可直接嵌入查詢的清單

use crate::utils::error::{ApiError, Result};
use chrono::NaiveDate;

/// 各資料表 `date` 欄位的慣例
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// STRING 欄位，`'20210901'`
    Compact,
    /// DATE 欄位，`DATE '2021-09-01'`
    Iso,
}

impl DateFormat {
    pub fn literal(self, date: NaiveDate) -> String {
        match self {
            DateFormat::Compact => format!("'{}'", date.format("%Y%m%d")),
            DateFormat::Iso => format!("DATE '{}'", date.format("%Y-%m-%d")),
        }
    }
}

/// 接受 `YYYYMMDD` 或 `YYYY-MM-DD`
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let format = if trimmed.len() == 8 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        "%Y%m%d"
    } else {
        "%Y-%m-%d"
    };

    NaiveDate::parse_from_str(trimmed, format).map_err(|e| ApiError::ValidationError {
        argument: "dates".to_string(),
        message: format!("'{}' is not a valid date ({})", raw, e),
    })
}

/// 去掉 null 項目後解析每個日期
pub fn normalize_dates(dates: &[Option<String>]) -> Result<Vec<NaiveDate>> {
    dates.iter().flatten().map(|raw| parse_date(raw)).collect()
}

pub fn normalize_ids(ids: &[Option<i32>]) -> Vec<i64> {
    ids.iter().flatten().map(|&id| i64::from(id)).collect()
}

pub fn date_list(dates: &[NaiveDate], format: DateFormat) -> String {
    dates
        .iter()
        .map(|&date| format.literal(date))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn int_list(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_both_date_spellings() {
        assert_eq!(parse_date("20210901").unwrap(), ymd(2021, 9, 1));
        assert_eq!(parse_date("2021-09-01").unwrap(), ymd(2021, 9, 1));
        assert_eq!(parse_date(" 20211231 ").unwrap(), ymd(2021, 12, 31));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_date("20210931").is_err());
        assert!(parse_date("2021/09/01").is_err());
        assert!(parse_date("").is_err());

        let err = parse_date("20210901') OR 1=1 --").unwrap_err();
        assert!(matches!(err, ApiError::ValidationError { ref argument, .. } if argument == "dates"));
    }

    #[test]
    fn test_date_literals_follow_table_convention() {
        let date = ymd(2021, 9, 1);
        assert_eq!(DateFormat::Compact.literal(date), "'20210901'");
        assert_eq!(DateFormat::Iso.literal(date), "DATE '2021-09-01'");

        let dates = vec![ymd(2021, 9, 1), ymd(2021, 9, 2)];
        assert_eq!(date_list(&dates, DateFormat::Compact), "'20210901', '20210902'");
        assert_eq!(
            date_list(&dates, DateFormat::Iso),
            "DATE '2021-09-01', DATE '2021-09-02'"
        );
    }

    #[test]
    fn test_null_items_are_dropped() {
        let dates = vec![Some("20210901".to_string()), None];
        assert_eq!(normalize_dates(&dates).unwrap(), vec![ymd(2021, 9, 1)]);

        let ids = vec![Some(12), None, Some(7)];
        assert_eq!(normalize_ids(&ids), vec![12, 7]);
        assert_eq!(int_list(&normalize_ids(&ids)), "12, 7");
        assert_eq!(int_list(&[]), "");
    }
}
