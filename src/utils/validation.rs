use crate::utils::error::{ApiError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ApiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ApiError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(ApiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(ApiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ApiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 資料表名稱會直接拼進 SQL，只允許 `dataset.table` 類的安全字元
pub fn validate_table_identifier(field_name: &str, identifier: &str) -> Result<()> {
    validate_non_empty_string(field_name, identifier)?;

    let valid = identifier
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-');
    if !valid || identifier.starts_with('.') || identifier.ends_with('.') {
        return Err(ApiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: identifier.to_string(),
            reason: "Table identifier may only contain letters, digits, '_', '-' and '.'"
                .to_string(),
        });
    }

    Ok(())
}

/// GCP project id: 小寫字母開頭，只含小寫字母、數字與連字號
pub fn validate_project_id(field_name: &str, project_id: &str) -> Result<()> {
    validate_non_empty_string(field_name, project_id)?;

    let starts_with_letter = project_id
        .chars()
        .next()
        .map(|c| c.is_ascii_lowercase())
        .unwrap_or(false);
    let valid_chars = project_id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == ':' || c == '.');

    if !starts_with_letter || !valid_chars || project_id.ends_with('-') {
        return Err(ApiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: project_id.to_string(),
            reason: "Project id must start with a lowercase letter and contain only lowercase letters, digits and hyphens"
                .to_string(),
        });
    }

    Ok(())
}
