use std::time::Duration;

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Emit logs as JSON lines (`LOG_FORMAT=json`) instead of the human-readable format.
    pub json_logs: bool,
    pub clickhouse: ClickHouseConfig,
}

/// Connection settings for the ClickHouse HTTP interface.
#[derive(Debug, Clone)]
pub struct ClickHouseConfig {
    /// Base URL of the HTTP interface, e.g. `http://localhost:8123`.
    pub url: String,
    pub username: String,
    pub password: String,
    pub database: String,
    /// Observation table inside `database`.
    pub table: String,
    pub connect_timeout: Duration,
    /// Upper bound for a whole request, including reading the response body.
    pub request_timeout: Duration,
    /// Server-side `max_execution_time` setting, in seconds.
    pub max_execution_time: u64,
    /// Server-side `max_block_size` setting.
    pub max_block_size: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Panics on values that are present but unparsable, the same way a
    /// missing required variable aborts startup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let number = |key: &str, default: u64| -> u64 {
            lookup(key)
                .map(|v| {
                    v.parse()
                        .unwrap_or_else(|_| panic!("{} must be a non-negative integer", key))
                })
                .unwrap_or(default)
        };

        let url = lookup("CLICKHOUSE_URL").unwrap_or_else(|| {
            format!(
                "http://{}:{}",
                var("CLICKHOUSE_HOST", "localhost"),
                var("CLICKHOUSE_PORT", "8123")
            )
        });

        Self {
            port: var("PORT", "8080")
                .parse()
                .expect("PORT must be a valid u16"),
            json_logs: var("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
            clickhouse: ClickHouseConfig {
                url,
                username: var("CLICKHOUSE_USERNAME", "default"),
                password: var("CLICKHOUSE_PASSWORD", "clickhouse"),
                database: var("CLICKHOUSE_DATABASE", "weather"),
                table: var("CLICKHOUSE_TABLE", "noaa"),
                connect_timeout: Duration::from_secs(number("CLICKHOUSE_CONNECT_TIMEOUT_SECS", 5)),
                request_timeout: Duration::from_secs(number("CLICKHOUSE_TIMEOUT_SECS", 10)),
                max_execution_time: number("CLICKHOUSE_MAX_EXECUTION_TIME", 60),
                max_block_size: number("CLICKHOUSE_MAX_BLOCK_SIZE", 10_000),
            },
        }
    }
}
