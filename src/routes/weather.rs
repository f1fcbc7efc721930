//! Weather query HTTP endpoints.
//!
//! - GET /api/v1/weather
//! - GET /api/v1/weather/data?start_date&end_date&station_id&region&country&page&per_page
//! - GET /api/v1/weather/statistics?start_date&end_date&country
//! - GET /api/v1/weather/stations
//! - GET /api/v1/weather/date-range
//!
//! Successful envelopes are served with 200. Store failures are served with 502
//! rather than 200, carrying the same envelope body with `success: false`, so
//! clients can branch on either the status or the `success` flag.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::models::{StationSummary, StatisticsRow, WeatherRecord};
use crate::errors::{AppError, ErrorResponse};
use crate::services::filters::{StatisticsQuery, WeatherDataQuery};
use crate::services::weather::{DateRange, Envelope, WeatherService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub weather: WeatherService,
}

/// Initial data for the dashboard view.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub date_range: DateRange,
    /// Empty when the station query failed
    pub stations: Vec<StationSummary>,
}

fn envelope_status<T>(envelope: &Envelope<T>) -> StatusCode {
    if envelope.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    }
}

fn bad_query(rejection: QueryRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

/// Dashboard bootstrap: available date range and station list.
#[utoipa::path(
    get,
    path = "/api/v1/weather",
    tag = "Weather",
    responses(
        (status = 200, description = "Date range and stations", body = DashboardResponse),
    )
)]
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let date_range = state.weather.get_date_range().await;
    let stations = state.weather.get_available_stations().await;

    Json(DashboardResponse {
        date_range,
        stations: stations.data,
    })
}

/// Get a page of daily observations.
///
/// Filters are AND-combined; absent or blank filters are ignored. Results are
/// ordered by date (newest first), then station id.
#[utoipa::path(
    get,
    path = "/api/v1/weather/data",
    tag = "Weather",
    params(WeatherDataQuery),
    responses(
        (status = 200, description = "Observations with pagination", body = Envelope<WeatherRecord>),
        (status = 400, description = "Malformed query string", body = ErrorResponse),
        (status = 422, description = "Invalid filter values", body = ErrorResponse),
        (status = 502, description = "Store query failed", body = Envelope<WeatherRecord>),
    )
)]
pub async fn get_weather_data(
    State(state): State<AppState>,
    query: Result<Query<WeatherDataQuery>, QueryRejection>,
) -> Result<(StatusCode, Json<Envelope<WeatherRecord>>), AppError> {
    let Query(params) = query.map_err(bad_query)?;
    let filters = params.validate()?;

    let envelope = state.weather.get_weather_data(&filters).await;
    Ok((envelope_status(&envelope), Json(envelope)))
}

/// Get per-station statistics.
///
/// Honours the date range and country filters only.
#[utoipa::path(
    get,
    path = "/api/v1/weather/statistics",
    tag = "Weather",
    params(StatisticsQuery),
    responses(
        (status = 200, description = "Per-station aggregates", body = Envelope<StatisticsRow>),
        (status = 400, description = "Malformed query string", body = ErrorResponse),
        (status = 422, description = "Invalid filter values", body = ErrorResponse),
        (status = 502, description = "Store query failed", body = Envelope<StatisticsRow>),
    )
)]
pub async fn get_statistics(
    State(state): State<AppState>,
    query: Result<Query<StatisticsQuery>, QueryRejection>,
) -> Result<(StatusCode, Json<Envelope<StatisticsRow>>), AppError> {
    let Query(params) = query.map_err(bad_query)?;
    let filters = params.validate()?;

    let envelope = state.weather.get_weather_statistics(&filters).await;
    Ok((envelope_status(&envelope), Json(envelope)))
}

/// List all stations.
#[utoipa::path(
    get,
    path = "/api/v1/weather/stations",
    tag = "Weather",
    responses(
        (status = 200, description = "Distinct stations ordered by name", body = Envelope<StationSummary>),
        (status = 502, description = "Store query failed", body = Envelope<StationSummary>),
    )
)]
pub async fn get_stations(
    State(state): State<AppState>,
) -> (StatusCode, Json<Envelope<StationSummary>>) {
    let envelope = state.weather.get_available_stations().await;
    (envelope_status(&envelope), Json(envelope))
}

/// Get the first and last available observation date.
#[utoipa::path(
    get,
    path = "/api/v1/weather/date-range",
    tag = "Weather",
    responses(
        (status = 200, description = "Available date range", body = DateRange),
        (status = 502, description = "Store query failed", body = DateRange),
    )
)]
pub async fn get_date_range(State(state): State<AppState>) -> (StatusCode, Json<DateRange>) {
    let range = state.weather.get_date_range().await;
    let status = if range.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    (status, Json(range))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::weather::tests::{record, service_for};
    use axum::response::IntoResponse;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn state(server: &MockServer) -> State<AppState> {
        State(AppState {
            weather: service_for(server),
        })
    }

    fn rows(data: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "data": data }))
    }

    #[tokio::test]
    async fn test_data_endpoint_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("SELECT count() AS total"))
            .respond_with(rows(json!([{ "total": 1 }])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("LIMIT 50 OFFSET 0"))
            .respond_with(rows(json!([record("USW00023062", "2024-01-05")])))
            .mount(&server)
            .await;

        let (status, Json(body)) = get_weather_data(
            state(&server),
            Ok(Query(WeatherDataQuery::default())),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::OK);
        assert!(body.success);
        assert_eq!(body.count, 1);
        assert_eq!(body.pagination.unwrap().to, 1);
    }

    #[tokio::test]
    async fn test_data_endpoint_rejects_bad_country_before_store() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(rows(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let query = WeatherDataQuery {
            country: Some("USA".to_string()),
            ..WeatherDataQuery::default()
        };
        let err = get_weather_data(state(&server), Ok(Query(query)))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_data_endpoint_store_failure_is_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("DB::Exception"))
            .mount(&server)
            .await;

        let (status, Json(body)) = get_weather_data(
            state(&server),
            Ok(Query(WeatherDataQuery::default())),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body.success);
        assert_eq!(body.count, 0);
    }

    #[tokio::test]
    async fn test_statistics_endpoint_rejects_reversed_dates() {
        let server = MockServer::start().await;
        let query = StatisticsQuery {
            start_date: Some("2024-03-01".to_string()),
            end_date: Some("2024-02-01".to_string()),
            country: None,
        };
        let err = get_statistics(state(&server), Ok(Query(query)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_dashboard_tolerates_station_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("min(date) AS min_date"))
            .respond_with(rows(json!([
                { "total": 10, "min_date": "2020-01-01", "max_date": "2020-12-31" }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("SELECT DISTINCT"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let Json(body) = get_dashboard(state(&server)).await;
        assert!(body.date_range.success);
        assert!(body.stations.is_empty());
    }

    #[tokio::test]
    async fn test_date_range_endpoint_failure_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (status, Json(range)) = get_date_range(state(&server)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(range.min_date.is_none());
    }
}
