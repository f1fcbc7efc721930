//! Request filters and their validation.
//!
//! Raw query strings are checked here, before anything reaches the query
//! layer. Blank values count as absent.

use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::{AppError, ValidationErrors};
use crate::helpers::non_blank_owned;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 50;
pub const MIN_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;
const COUNTRY_CODE_LEN: usize = 2;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validated filters for observation and statistics queries.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSet {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub station_id: Option<String>,
    /// Substring of the station name
    pub region: Option<String>,
    /// Two-letter station id prefix
    pub country: Option<String>,
    /// 1-based page number
    pub page: u32,
    pub per_page: u32,
}

impl Default for FilterSet {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            station_id: None,
            region: None,
            country: None,
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl FilterSet {
    /// Number of rows skipped before the current page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

/// Query parameters of the observation data endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WeatherDataQuery {
    /// First day to include (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// Last day to include (YYYY-MM-DD), not before `start_date`
    pub end_date: Option<String>,
    /// Exact station identifier
    pub station_id: Option<String>,
    /// Case-sensitive substring of the station name
    pub region: Option<String>,
    /// Two-letter country code (station id prefix)
    pub country: Option<String>,
    /// Page number, at least 1 (default 1)
    #[param(value_type = Option<u32>)]
    pub page: Option<String>,
    /// Rows per page, 10 to 100 (default 50)
    #[param(value_type = Option<u32>)]
    pub per_page: Option<String>,
}

/// Query parameters of the statistics endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatisticsQuery {
    /// First day to include (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// Last day to include (YYYY-MM-DD), not before `start_date`
    pub end_date: Option<String>,
    /// Two-letter country code (station id prefix)
    pub country: Option<String>,
}

impl WeatherDataQuery {
    pub fn validate(self) -> Result<FilterSet, AppError> {
        let mut errors = ValidationErrors::default();

        let (start_date, end_date) = validate_dates(self.start_date, self.end_date, &mut errors);
        let country = validate_country(self.country, &mut errors);
        let page = validate_integer(self.page, "page", DEFAULT_PAGE, &mut errors, |v| {
            (v >= 1).then_some(()).ok_or("The page must be at least 1.")
        });
        let per_page = validate_integer(self.per_page, "per_page", DEFAULT_PER_PAGE, &mut errors, |v| {
            (MIN_PER_PAGE..=MAX_PER_PAGE)
                .contains(&v)
                .then_some(())
                .ok_or("The per page must be between 10 and 100.")
        });

        errors.into_result()?;

        Ok(FilterSet {
            start_date,
            end_date,
            station_id: non_blank_owned(self.station_id),
            region: non_blank_owned(self.region),
            country,
            page,
            per_page,
        })
    }
}

impl StatisticsQuery {
    pub fn validate(self) -> Result<FilterSet, AppError> {
        WeatherDataQuery {
            start_date: self.start_date,
            end_date: self.end_date,
            country: self.country,
            ..WeatherDataQuery::default()
        }
        .validate()
    }
}

fn validate_dates(
    start: Option<String>,
    end: Option<String>,
    errors: &mut ValidationErrors,
) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let start = parse_date(start, "start_date", "start date", errors);
    let end = parse_date(end, "end_date", "end date", errors);

    if let (Some(s), Some(e)) = (start, end) {
        if e < s {
            errors.add(
                "end_date",
                "The end date must be a date after or equal to start date.",
            );
        }
    }

    (start, end)
}

fn parse_date(
    value: Option<String>,
    field: &str,
    label: &str,
    errors: &mut ValidationErrors,
) -> Option<NaiveDate> {
    let value = non_blank_owned(value)?;
    match NaiveDate::parse_from_str(&value, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(
                field,
                format!("The {} is not a valid date (expected YYYY-MM-DD).", label),
            );
            None
        }
    }
}

fn validate_country(value: Option<String>, errors: &mut ValidationErrors) -> Option<String> {
    let country = non_blank_owned(value)?;
    if country.chars().count() != COUNTRY_CODE_LEN {
        errors.add("country", "The country must be 2 characters.");
        return None;
    }
    Some(country)
}

fn validate_integer<F>(
    value: Option<String>,
    field: &str,
    default: u32,
    errors: &mut ValidationErrors,
    check: F,
) -> u32
where
    F: Fn(u32) -> Result<(), &'static str>,
{
    let Some(raw) = non_blank_owned(value) else {
        return default;
    };
    let label = field.replace('_', " ");

    let parsed = match raw.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            errors.add(field, format!("The {} must be an integer.", label));
            return default;
        }
    };

    // Negatives fail the range check as 0; anything past u32 is rejected outright.
    let value = match u32::try_from(parsed) {
        Ok(v) => v,
        Err(_) if parsed < 0 => 0,
        Err(_) => {
            errors.add(field, format!("The {} must be an integer.", label));
            return default;
        }
    };
    match check(value) {
        Ok(()) => value,
        Err(message) => {
            errors.add(field, message);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_query(pairs: &[(&str, &str)]) -> WeatherDataQuery {
        let mut q = WeatherDataQuery::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "start_date" => q.start_date = v,
                "end_date" => q.end_date = v,
                "station_id" => q.station_id = v,
                "region" => q.region = v,
                "country" => q.country = v,
                "page" => q.page = v,
                "per_page" => q.per_page = v,
                other => panic!("unknown field {}", other),
            }
        }
        q
    }

    fn validation_fields(result: Result<FilterSet, AppError>) -> ValidationErrors {
        match result {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let filters = data_query(&[]).validate().unwrap();
        assert_eq!(filters, FilterSet::default());
        assert_eq!(filters.page, 1);
        assert_eq!(filters.per_page, 50);
        assert_eq!(filters.offset(), 0);
    }

    #[test]
    fn test_full_valid_query() {
        let filters = data_query(&[
            ("start_date", "2024-01-01"),
            ("end_date", "2024-01-31"),
            ("station_id", "USW00023062"),
            ("region", "Denver"),
            ("country", "US"),
            ("page", "3"),
            ("per_page", "10"),
        ])
        .validate()
        .unwrap();

        assert_eq!(filters.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(filters.end_date, NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(filters.station_id.as_deref(), Some("USW00023062"));
        assert_eq!(filters.region.as_deref(), Some("Denver"));
        assert_eq!(filters.country.as_deref(), Some("US"));
        assert_eq!(filters.offset(), 20);
    }

    #[test]
    fn test_blank_values_are_absent() {
        let filters = data_query(&[
            ("start_date", ""),
            ("station_id", ""),
            ("region", "  "),
            ("country", ""),
            ("page", ""),
        ])
        .validate()
        .unwrap();
        assert_eq!(filters, FilterSet::default());
    }

    #[test]
    fn test_country_must_be_two_characters() {
        for bad in ["U", "USA"] {
            let errors = validation_fields(data_query(&[("country", bad)]).validate());
            assert!(errors.contains("country"), "country {:?} accepted", bad);
        }
    }

    #[test]
    fn test_country_counts_characters_not_bytes() {
        let filters = data_query(&[("country", "ÅÄ")]).validate().unwrap();
        assert_eq!(filters.country.as_deref(), Some("ÅÄ"));
    }

    #[test]
    fn test_end_before_start_rejected() {
        let errors = validation_fields(
            data_query(&[("start_date", "2024-02-01"), ("end_date", "2024-01-31")]).validate(),
        );
        assert!(errors.contains("end_date"));
    }

    #[test]
    fn test_end_equal_to_start_accepted() {
        let filters = data_query(&[("start_date", "2024-02-01"), ("end_date", "2024-02-01")])
            .validate()
            .unwrap();
        assert_eq!(filters.start_date, filters.end_date);
    }

    #[test]
    fn test_end_without_start_accepted() {
        let filters = data_query(&[("end_date", "2024-02-01")]).validate().unwrap();
        assert!(filters.start_date.is_none());
        assert!(filters.end_date.is_some());
    }

    #[test]
    fn test_invalid_date_rejected() {
        let errors = validation_fields(data_query(&[("start_date", "2024-13-01")]).validate());
        assert!(errors.contains("start_date"));
        let errors = validation_fields(data_query(&[("end_date", "yesterday")]).validate());
        assert!(errors.contains("end_date"));
    }

    #[test]
    fn test_page_bounds() {
        for bad in ["0", "-1", "abc", "1.5"] {
            let errors = validation_fields(data_query(&[("page", bad)]).validate());
            assert!(errors.contains("page"), "page {:?} accepted", bad);
        }
    }

    #[test]
    fn test_page_beyond_u32_rejected() {
        let errors = validation_fields(data_query(&[("page", "99999999999")]).validate());
        assert!(errors.contains("page"));
        assert_eq!(errors.to_string(), "The page must be an integer.");

        let filters = data_query(&[("page", "4294967295")]).validate().unwrap();
        assert_eq!(filters.page, u32::MAX);
    }

    #[test]
    fn test_per_page_bounds() {
        for bad in ["9", "101", "-50", "ten"] {
            let errors = validation_fields(data_query(&[("per_page", bad)]).validate());
            assert!(errors.contains("per_page"), "per_page {:?} accepted", bad);
        }
        for good in ["10", "100"] {
            assert!(data_query(&[("per_page", good)]).validate().is_ok());
        }
    }

    #[test]
    fn test_collects_all_errors() {
        let errors = validation_fields(
            data_query(&[("country", "USA"), ("page", "0"), ("per_page", "500")]).validate(),
        );
        assert!(errors.contains("country"));
        assert!(errors.contains("page"));
        assert!(errors.contains("per_page"));
    }

    #[test]
    fn test_huge_page_offset_does_not_overflow() {
        let filters = FilterSet {
            page: u32::MAX,
            per_page: MAX_PER_PAGE,
            ..FilterSet::default()
        };
        assert_eq!(filters.offset(), u64::from(u32::MAX - 1) * 100);
    }

    #[test]
    fn test_statistics_query_validation() {
        let filters = StatisticsQuery {
            start_date: Some("2024-01-01".to_string()),
            end_date: None,
            country: Some("DE".to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(filters.country.as_deref(), Some("DE"));
        assert!(filters.station_id.is_none());

        let errors = validation_fields(
            StatisticsQuery {
                country: Some("DEU".to_string()),
                ..StatisticsQuery::default()
            }
            .validate(),
        );
        assert!(errors.contains("country"));
    }
}
