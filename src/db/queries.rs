//! SQL construction for the observation table.
//!
//! Only the validated table reference and integer LIMIT/OFFSET values are
//! written into the SQL text. Every filter value is bound as a parameter.

use std::fmt;

use super::client::{Statement, StoreError};
use crate::helpers::non_blank;
use crate::services::filters::FilterSet;

/// Unit-scaled projection of one observation row.
const OBSERVATION_COLUMNS: &str = "station_id,
    date,
    tempAvg / 10.0 AS temp_avg_celsius,
    tempMax / 10.0 AS temp_max_celsius,
    tempMin / 10.0 AS temp_min_celsius,
    precipitation / 10.0 AS precipitation_mm,
    snowfall AS snowfall_mm,
    snowDepth AS snow_depth_mm,
    percentDailySun AS percent_daily_sun,
    averageWindSpeed / 10.0 AS avg_wind_speed_ms,
    maxWindSpeed / 10.0 AS max_wind_speed_ms,
    weatherType AS weather_type,
    tupleElement(location, 1) AS longitude,
    tupleElement(location, 2) AS latitude,
    elevation,
    name AS station_name";

const STATISTICS_COLUMNS: &str = "name AS station_name,
    count() AS total_measurements,
    avg(tempAvg / 10.0) AS avg_temperature,
    max(tempMax / 10.0) AS max_temperature,
    min(tempMin / 10.0) AS min_temperature,
    sum(precipitation / 10.0) AS total_precipitation,
    tupleElement(location, 1) AS longitude,
    tupleElement(location, 2) AS latitude";

const STATION_COLUMNS: &str = "station_id,
    name AS station_name,
    substring(station_id, 1, 2) AS country_code,
    tupleElement(location, 1) AS longitude,
    tupleElement(location, 2) AS latitude";

/// A `database.table` reference whose parts are plain identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    database: String,
    table: String,
}

impl TableRef {
    pub fn new(database: &str, table: &str) -> Result<Self, StoreError> {
        for part in [database, table] {
            if !is_identifier(part) {
                return Err(StoreError::InvalidIdentifier(part.to_string()));
            }
        }
        Ok(Self {
            database: database.to_string(),
            table: table.to_string(),
        })
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Which filters a query honours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterScope {
    /// All filters: dates, station id, region and country.
    Observations,
    /// Dates and country only; station-level filters do not apply to a per-station aggregate.
    Statistics,
}

/// AND-combined conditions with their bound values.
#[derive(Debug, Default)]
struct Predicates {
    conditions: Vec<&'static str>,
    binds: Vec<(&'static str, String)>,
}

impl Predicates {
    fn from_filters(filters: &FilterSet, scope: FilterScope) -> Self {
        let mut p = Predicates::default();

        if let Some(start) = filters.start_date {
            p.push("date >= {start_date:Date32}", "start_date", start.to_string());
        }
        if let Some(end) = filters.end_date {
            p.push("date <= {end_date:Date32}", "end_date", end.to_string());
        }
        if scope == FilterScope::Observations {
            if let Some(station_id) = non_blank(filters.station_id.as_deref()) {
                p.push(
                    "station_id = {station_id:String}",
                    "station_id",
                    station_id.to_string(),
                );
            }
            if let Some(region) = non_blank(filters.region.as_deref()) {
                p.push(
                    "name LIKE {region:String}",
                    "region",
                    format!("%{}%", escape_like(region)),
                );
            }
        }
        if let Some(country) = non_blank(filters.country.as_deref()) {
            p.push(
                "substring(station_id, 1, 2) = {country:String}",
                "country",
                country.to_string(),
            );
        }

        p
    }

    fn push(&mut self, condition: &'static str, name: &'static str, value: String) {
        self.conditions.push(condition);
        self.binds.push((name, value));
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("\nWHERE {}", self.conditions.join(" AND "))
        }
    }

    fn bind_to(&self, statement: Statement) -> Statement {
        self.binds
            .iter()
            .fold(statement, |stmt, (name, value)| stmt.bind(name, value))
    }
}

/// Escape LIKE wildcards so the region is matched as a literal substring.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// One page of observations, newest first.
pub fn weather_data_page(table: &TableRef, filters: &FilterSet) -> Statement {
    let predicates = Predicates::from_filters(filters, FilterScope::Observations);
    let sql = format!(
        "SELECT\n    {}\nFROM {}{}\nORDER BY date DESC, station_id ASC\nLIMIT {} OFFSET {}",
        OBSERVATION_COLUMNS,
        table,
        predicates.where_clause(),
        filters.per_page,
        filters.offset()
    );
    predicates.bind_to(Statement::new(sql))
}

/// Total number of observations matching the same predicates as [`weather_data_page`].
pub fn weather_data_count(table: &TableRef, filters: &FilterSet) -> Statement {
    let predicates = Predicates::from_filters(filters, FilterScope::Observations);
    let sql = format!(
        "SELECT count() AS total\nFROM {}{}",
        table,
        predicates.where_clause()
    );
    predicates.bind_to(Statement::new(sql))
}

/// Per-station aggregates, busiest stations first.
pub fn weather_statistics(table: &TableRef, filters: &FilterSet) -> Statement {
    let predicates = Predicates::from_filters(filters, FilterScope::Statistics);
    let sql = format!(
        "SELECT\n    {}\nFROM {}{}\nGROUP BY station_name, longitude, latitude\nORDER BY total_measurements DESC",
        STATISTICS_COLUMNS,
        table,
        predicates.where_clause()
    );
    predicates.bind_to(Statement::new(sql))
}

/// Distinct stations ordered by name.
pub fn available_stations(table: &TableRef) -> Statement {
    Statement::new(format!(
        "SELECT DISTINCT\n    {}\nFROM {}\nORDER BY station_name",
        STATION_COLUMNS, table
    ))
}

/// Overall first and last observation date.
pub fn date_range(table: &TableRef) -> Statement {
    Statement::new(format!(
        "SELECT count() AS total, min(date) AS min_date, max(date) AS max_date\nFROM {}",
        table
    ))
}

/// Trivial liveness query.
pub fn connection_probe() -> Statement {
    Statement::new("SELECT 1 AS test")
}
