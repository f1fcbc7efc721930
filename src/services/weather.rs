//! Weather query service.
//!
//! Every data operation returns an envelope. Store failures are logged and
//! turned into `success: false` envelopes instead of being propagated, so
//! callers branch on `success` rather than on errors.

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use super::filters::FilterSet;
use super::pagination::PaginationMeta;
use crate::db::client::{ClickHouseClient, StoreError};
use crate::db::models::{
    CountRow, DateRangeRow, ProbeRow, StationSummary, StatisticsRow, WeatherRecord,
};
use crate::db::queries::{self, TableRef};

/// Uniform response envelope for row-returning operations.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Vec<T>,
    /// Number of rows in `data`
    pub count: usize,
    /// Present on successful paginated responses only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
    /// Present on failures only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
            pagination: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            count: 0,
            pagination: None,
            error: Some(message.into()),
        }
    }

    fn with_pagination(mut self, pagination: PaginationMeta) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

/// First and last available observation date.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DateRange {
    pub success: bool,
    /// Earliest observation date; null when the store is empty or unreachable
    pub min_date: Option<NaiveDate>,
    /// Latest observation date; null when the store is empty or unreachable
    pub max_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Read-only queries over the observation table.
#[derive(Debug, Clone)]
pub struct WeatherService {
    client: ClickHouseClient,
    table: TableRef,
}

impl WeatherService {
    pub fn new(client: ClickHouseClient, table: TableRef) -> Self {
        Self { client, table }
    }

    /// One page of observations matching `filters`, newest first.
    pub async fn get_weather_data(&self, filters: &FilterSet) -> Envelope<WeatherRecord> {
        self.fetch_weather_data(filters)
            .await
            .unwrap_or_else(|e| failure("ClickHouse query failed", e))
    }

    async fn fetch_weather_data(
        &self,
        filters: &FilterSet,
    ) -> Result<Envelope<WeatherRecord>, StoreError> {
        let total = self
            .client
            .fetch_optional::<CountRow>(&queries::weather_data_count(&self.table, filters))
            .await?
            .map_or(0, |row| row.total);

        let pagination = PaginationMeta::new(total, filters.page, filters.per_page);

        let rows = if pagination.is_beyond_end() {
            Vec::new()
        } else {
            self.client
                .fetch_all(&queries::weather_data_page(&self.table, filters))
                .await?
        };

        Ok(Envelope::ok(rows).with_pagination(pagination))
    }

    /// Per-station aggregates, honouring only the date range and country filters.
    pub async fn get_weather_statistics(&self, filters: &FilterSet) -> Envelope<StatisticsRow> {
        self.client
            .fetch_all(&queries::weather_statistics(&self.table, filters))
            .await
            .map(Envelope::ok)
            .unwrap_or_else(|e| failure("ClickHouse statistics query failed", e))
    }

    /// Distinct stations ordered by name.
    pub async fn get_available_stations(&self) -> Envelope<StationSummary> {
        self.client
            .fetch_all(&queries::available_stations(&self.table))
            .await
            .map(Envelope::ok)
            .unwrap_or_else(|e| failure("ClickHouse stations query failed", e))
    }

    pub async fn get_date_range(&self) -> DateRange {
        match self
            .client
            .fetch_optional::<DateRangeRow>(&queries::date_range(&self.table))
            .await
        {
            Ok(Some(row)) if row.total > 0 => DateRange {
                success: true,
                min_date: row.min_date,
                max_date: row.max_date,
                error: None,
            },
            Ok(_) => DateRange {
                success: true,
                min_date: None,
                max_date: None,
                error: None,
            },
            Err(e) => {
                tracing::error!("ClickHouse date range query failed: {}", e);
                DateRange {
                    success: false,
                    min_date: None,
                    max_date: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// `true` only if the liveness probe returns at least one row.
    pub async fn test_connection(&self) -> bool {
        match self
            .client
            .fetch_all::<ProbeRow>(&queries::connection_probe())
            .await
        {
            Ok(rows) => !rows.is_empty(),
            Err(e) => {
                tracing::error!("ClickHouse connection failed: {}", e);
                false
            }
        }
    }
}

fn failure<T>(context: &str, err: StoreError) -> Envelope<T> {
    tracing::error!("{}: {}", context, err);
    Envelope::failure(err.to_string())
}
