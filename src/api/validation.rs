use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

use super::ApiError;
use crate::config::PaginationConfig;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10}$").expect("valid phone regex"));

pub fn validate_id(id: i32, what: &str) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {what} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

/// Comma-separated id lists, e.g. `?cities=1,2,3`.
pub fn parse_id_list(raw: Option<&str>, what: &str) -> Result<Vec<i32>, ApiError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let mut ids = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let id: i32 = part.parse().map_err(|_| {
            ApiError::validation(format!("Invalid {what} filter: '{part}' is not a number"))
        })?;
        ids.push(validate_id(id, what)?);
    }
    Ok(ids)
}

/// Parses an ISO `YYYY-MM-DD` query parameter, defaulting to today.
pub fn parse_date_or_today(raw: Option<&str>) -> Result<NaiveDate, ApiError> {
    match raw {
        None => Ok(Utc::now().date_naive()),
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|_| ApiError::validation("Invalid date format. Use YYYY-MM-DD.")),
    }
}

/// The UTC half-open window covering one calendar date.
#[must_use]
pub fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let day_start = date.and_time(NaiveTime::MIN).and_utc();
    (day_start, day_start + chrono::Duration::days(1))
}

/// The single normalization applied to lookup names and emails at the API
/// boundary. Nothing is mutated on save anywhere else.
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn validate_required_name(raw: &str, what: &str) -> Result<String, ApiError> {
    let normalized = normalize_name(raw);
    if normalized.is_empty() {
        return Err(ApiError::validation(format!("{what} name cannot be empty")));
    }
    if normalized.len() > 50 {
        return Err(ApiError::validation(format!(
            "{what} name must be 50 characters or less"
        )));
    }
    Ok(normalized)
}

pub fn validate_email(raw: &str) -> Result<String, ApiError> {
    let normalized = normalize_name(raw);
    if !EMAIL_RE.is_match(&normalized) {
        return Err(ApiError::validation("Enter a valid email address"));
    }
    Ok(normalized)
}

pub fn validate_phone(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim();
    if !PHONE_RE.is_match(trimmed) {
        return Err(ApiError::validation(
            "Phone number must be exactly 10 digits",
        ));
    }
    Ok(trimmed.to_string())
}

pub fn validate_password(raw: &str) -> Result<(), ApiError> {
    if raw.len() < 8 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters",
        ));
    }
    Ok(())
}

/// Clamps `page`/`page_size` query parameters against the configured
/// bounds. Pages are 1-based.
#[must_use]
pub fn pagination(
    page: Option<u64>,
    page_size: Option<u64>,
    config: &PaginationConfig,
) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size
        .unwrap_or(config.default_page_size)
        .clamp(1, config.max_page_size);
    (page, page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id(1, "city").is_ok());
        assert!(validate_id(12345, "city").is_ok());
        assert!(validate_id(0, "city").is_err());
        assert!(validate_id(-1, "city").is_err());
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list(None, "city").unwrap(), Vec::<i32>::new());
        assert_eq!(parse_id_list(Some("1,2,3"), "city").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_id_list(Some(" 4 , 5 "), "city").unwrap(), vec![4, 5]);
        assert!(parse_id_list(Some("1,x"), "city").is_err());
        assert!(parse_id_list(Some("0"), "city").is_err());
    }

    #[test]
    fn test_parse_date_or_today() {
        assert_eq!(
            parse_date_or_today(Some("2026-03-01")).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
        assert!(parse_date_or_today(Some("01-03-2026")).is_err());
        assert!(parse_date_or_today(Some("not-a-date")).is_err());
        assert!(parse_date_or_today(None).is_ok());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  New York "), "new york");
        assert_eq!(normalize_name("ACTION"), "action");
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(
            validate_email("  User@Example.COM ").unwrap(),
            "user@example.com"
        );
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("123").is_err());
        assert!(validate_phone("98765432101").is_err());
        assert!(validate_phone("98765abc10").is_err());
    }

    #[test]
    fn test_pagination_bounds() {
        let config = PaginationConfig {
            default_page_size: 20,
            max_page_size: 100,
        };
        assert_eq!(pagination(None, None, &config), (1, 20));
        assert_eq!(pagination(Some(0), Some(500), &config), (1, 100));
        assert_eq!(pagination(Some(3), Some(10), &config), (3, 10));
    }
}
