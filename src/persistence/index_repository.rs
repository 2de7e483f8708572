use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::entities::index::{IndexId, IndexReading, Provenance};
use crate::domain::errors::SourceError;
use crate::domain::repositories::index_source::IndexSource;

/// Locally stored index values.
///
/// The primary lookup only trusts values published within `max_age_days`;
/// the alternate lookup accepts the latest value of any age.
#[derive(Clone)]
pub struct SqliteIndexRepository {
    pool: SqlitePool,
    max_age_days: i64,
}

impl SqliteIndexRepository {
    pub fn new(pool: SqlitePool, max_age_days: i64) -> Self {
        SqliteIndexRepository { pool, max_age_days }
    }

    /// Store a published value
    pub async fn insert_value(
        &self,
        index: IndexId,
        value: f64,
        change: Option<f64>,
        index_date: NaiveDate,
    ) -> Result<i64, sqlx::Error> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO index_values (index_code, value, change, index_date)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(index.code())
        .bind(value)
        .bind(change)
        .bind(index_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn latest(&self, index: IndexId, not_before: Option<NaiveDate>) -> Result<Option<IndexReading>, SourceError> {
        let row = sqlx::query(
            r#"
            SELECT value, change, index_date
            FROM index_values
            WHERE index_code = ? AND (? IS NULL OR index_date >= ?)
            ORDER BY index_date DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(index.code())
        .bind(not_before)
        .bind(not_before)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SourceError::Unavailable(format!("index_values query failed: {}", e)))?;

        Ok(row.map(|row| {
            IndexReading::new(
                index,
                row.get::<f64, _>("value"),
                row.get::<Option<f64>, _>("change"),
                row.get::<NaiveDate, _>("index_date"),
            )
        }))
    }
}

#[async_trait]
impl IndexSource for SqliteIndexRepository {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn fetch_current(&self, index: IndexId) -> Result<IndexReading, SourceError> {
        let cutoff = Utc::now().date_naive() - Duration::days(self.max_age_days);
        self.latest(index, Some(cutoff)).await?.ok_or(SourceError::Empty)
    }

    async fn search_fallback(&self, index: IndexId) -> Result<IndexReading, SourceError> {
        self.latest(index, None)
            .await?
            .map(|reading| reading.with_provenance(Provenance::FallbackSearch))
            .ok_or(SourceError::Empty)
    }
}
