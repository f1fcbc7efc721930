use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::helpers::deserialize_u64_lenient;

/// One station-day observation.
///
/// Temperature, precipitation and wind columns are stored as tenths and are
/// already scaled to physical units by the query.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct WeatherRecord {
    /// Station identifier, e.g. "USW00023062"
    pub station_id: String,
    /// Observation date
    pub date: NaiveDate,
    /// Average temperature in °C
    pub temp_avg_celsius: f64,
    /// Maximum temperature in °C
    pub temp_max_celsius: f64,
    /// Minimum temperature in °C
    pub temp_min_celsius: f64,
    /// Precipitation in mm
    pub precipitation_mm: f64,
    /// Snowfall in mm
    pub snowfall_mm: i64,
    /// Snow depth in mm
    pub snow_depth_mm: i64,
    /// Percentage of possible sunshine
    pub percent_daily_sun: i64,
    /// Average wind speed in m/s
    pub avg_wind_speed_ms: f64,
    /// Maximum wind speed in m/s
    pub max_wind_speed_ms: f64,
    /// Weather type code
    pub weather_type: String,
    pub longitude: f64,
    pub latitude: f64,
    /// Elevation in metres
    pub elevation: f64,
    pub station_name: String,
}

/// A distinct station.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct StationSummary {
    pub station_id: String,
    pub station_name: String,
    /// First two characters of the station id
    pub country_code: String,
    pub longitude: f64,
    pub latitude: f64,
}

/// Per-station aggregate over the filtered observations.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct StatisticsRow {
    pub station_name: String,
    /// Number of observations for the station
    #[serde(deserialize_with = "deserialize_u64_lenient")]
    pub total_measurements: u64,
    /// Mean of daily average temperatures in °C
    pub avg_temperature: f64,
    /// Highest daily maximum in °C
    pub max_temperature: f64,
    /// Lowest daily minimum in °C
    pub min_temperature: f64,
    /// Summed precipitation in mm
    pub total_precipitation: f64,
    pub longitude: f64,
    pub latitude: f64,
}

/// Result row of a `count()` query.
#[derive(Debug, Clone, Deserialize)]
pub struct CountRow {
    #[serde(deserialize_with = "deserialize_u64_lenient")]
    pub total: u64,
}

/// Result row of the date range query.
///
/// `min`/`max` over an empty table yield the column default rather than NULL,
/// so the row count is selected alongside to tell the two apart.
#[derive(Debug, Clone, Deserialize)]
pub struct DateRangeRow {
    #[serde(deserialize_with = "deserialize_u64_lenient")]
    pub total: u64,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

/// Result row of the liveness probe.
#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)] // Only the row count matters
pub struct ProbeRow {
    pub test: u8,
}
