//! ClickHouse HTTP interface client.
//!
//! Statements are POSTed as the request body with `FORMAT JSON` appended.
//! Bound values travel as `param_<name>` URL parameters and are referenced in
//! SQL as `{name:Type}` placeholders, so filter values never become part of the
//! SQL text.
//! See: https://clickhouse.com/docs/en/interfaces/http

use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ClickHouseConfig;

const USER_HEADER: &str = "X-ClickHouse-User";
const KEY_HEADER: &str = "X-ClickHouse-Key";

/// Longest store error message passed on to callers.
const MAX_ERROR_MESSAGE_LEN: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("ClickHouse request timed out: {0}")]
    Timeout(String),

    #[error("ClickHouse connection failed: {0}")]
    Connection(String),

    #[error("ClickHouse request failed: {0}")]
    Request(String),

    #[error("ClickHouse returned HTTP {status}: {message}")]
    Query { status: u16, message: String },

    #[error("Failed to decode ClickHouse response: {0}")]
    Decode(String),

    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout(err.to_string())
        } else if err.is_connect() {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Request(err.to_string())
        }
    }
}

/// A SQL statement together with its bound parameter values.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<(String, String)>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Bind a value to the `{name:Type}` placeholder of the same name.
    pub fn bind(mut self, name: &str, value: impl ToString) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Value bound to `name`, if any.
    #[cfg(test)]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Body of a `FORMAT JSON` response; only the rows are of interest.
#[derive(Debug, Deserialize)]
struct JsonOutput<T> {
    data: Vec<T>,
}

/// Client for the ClickHouse HTTP interface.
///
/// Built once at startup; cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ClickHouseClient {
    client: reqwest::Client,
    url: String,
    database: String,
    settings: Vec<(&'static str, String)>,
}

impl ClickHouseClient {
    pub fn new(config: &ClickHouseConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_HEADER,
            HeaderValue::from_str(&config.username)
                .map_err(|e| StoreError::Request(format!("Invalid username header: {}", e)))?,
        );
        let mut key = HeaderValue::from_str(&config.password)
            .map_err(|e| StoreError::Request(format!("Invalid password header: {}", e)))?;
        key.set_sensitive(true);
        headers.insert(KEY_HEADER, key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            database: config.database.clone(),
            settings: vec![
                ("max_execution_time", config.max_execution_time.to_string()),
                ("max_block_size", config.max_block_size.to_string()),
                ("output_format_json_quote_64bit_integers", "0".to_string()),
            ],
        })
    }

    /// Run a statement and decode every returned row.
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        statement: &Statement,
    ) -> Result<Vec<T>, StoreError> {
        tracing::debug!(
            sql = statement.sql(),
            params = ?statement.params(),
            "Executing ClickHouse query"
        );

        let mut query: Vec<(String, &str)> = Vec::with_capacity(
            1 + self.settings.len() + statement.params().len(),
        );
        query.push(("database".to_string(), self.database.as_str()));
        for (name, value) in &self.settings {
            query.push((name.to_string(), value.as_str()));
        }
        let escaped: Vec<String> = statement
            .params()
            .iter()
            .map(|(_, value)| escape_param_value(value))
            .collect();
        for ((name, _), value) in statement.params().iter().zip(&escaped) {
            query.push((format!("param_{}", name), value.as_str()));
        }

        let response = self
            .client
            .post(format!("{}/", self.url))
            .query(&query)
            .body(format!("{} FORMAT JSON", statement.sql()))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(StoreError::Query {
                status: status.as_u16(),
                message: truncate_message(body.trim()),
            });
        }

        let output: JsonOutput<T> =
            serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(output.data)
    }

    /// Run a statement and return its first row, if any.
    pub async fn fetch_optional<T: DeserializeOwned>(
        &self,
        statement: &Statement,
    ) -> Result<Option<T>, StoreError> {
        Ok(self.fetch_all(statement).await?.into_iter().next())
    }
}

/// Parameter values are read by the server in TSV-escaped form.
fn escape_param_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn truncate_message(message: &str) -> String {
    match message.char_indices().nth(MAX_ERROR_MESSAGE_LEN) {
        Some((idx, _)) => format!("{}...", &message[..idx]),
        None => message.to_string(),
    }
}
