// Weather Query API v0.1
use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod db;
mod errors;
mod helpers;
mod routes;
mod services;

use config::AppConfig;
use db::client::ClickHouseClient;
use db::queries::TableRef;
use routes::weather::AppState;
use services::weather::WeatherService;

/// Weather Query API OpenAPI document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Weather Query API",
        version = "0.1.0",
        description = "Filtered, paginated and aggregated daily weather-station observations \
            served from a ClickHouse table. Temperatures, precipitation and wind speeds are \
            returned in physical units (°C, mm, m/s).",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Weather", description = "Weather observation queries"),
    ),
    paths(
        routes::health::health_check,
        routes::health::test_connection,
        routes::weather::get_dashboard,
        routes::weather::get_weather_data,
        routes::weather::get_statistics,
        routes::weather::get_stations,
        routes::weather::get_date_range,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::health::ConnectionStatus,
            routes::weather::DashboardResponse,
            db::models::WeatherRecord,
            db::models::StationSummary,
            db::models::StatisticsRow,
            services::pagination::PaginationMeta,
            services::weather::DateRange,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "weather_query_api=debug,tower_http=debug".into());
    if config.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let ch = &config.clickhouse;
    let table = TableRef::new(&ch.database, &ch.table).expect("Invalid ClickHouse table name");
    let client = ClickHouseClient::new(ch).expect("Failed to build ClickHouse client");
    let weather = WeatherService::new(client, table);

    if weather.test_connection().await {
        tracing::info!("Connected to ClickHouse at {}", ch.url);
    } else {
        tracing::warn!(
            "ClickHouse at {} is not reachable yet; requests will fail until it is",
            ch.url
        );
    }

    let app_state = AppState { weather };

    // CORS: read-only API, GET only
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    let weather_routes = Router::new()
        .route("/api/v1/weather", get(routes::weather::get_dashboard))
        .route("/api/v1/weather/data", get(routes::weather::get_weather_data))
        .route(
            "/api/v1/weather/statistics",
            get(routes::weather::get_statistics),
        )
        .route("/api/v1/weather/stations", get(routes::weather::get_stations))
        .route(
            "/api/v1/weather/date-range",
            get(routes::weather::get_date_range),
        )
        .route(
            "/api/v1/weather/test-connection",
            get(routes::health::test_connection),
        )
        .route("/api/v1/health", get(routes::health::health_check))
        .with_state(app_state);

    let app = Router::new()
        .merge(weather_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
