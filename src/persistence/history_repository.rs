use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::domain::entities::estimate::{RateEstimate, RateRequest};
use crate::domain::errors::ProviderError;
use crate::domain::repositories::history_recorder::HistoryRecorder;
use crate::persistence::DatabaseError;

/// A served estimate as stored in `rate_history`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateHistoryRecord {
    pub id: i64,
    pub origin_port_id: String,
    pub destination_port_id: String,
    pub container_type: String,
    pub weight: Option<f64>,
    pub rate: f64,
    pub min_rate: f64,
    pub max_rate: f64,
    pub fuel_surcharge: f64,
    pub final_rate: f64,
    pub reliability: f64,
    pub source_count: i64,
    pub sources_used: Vec<String>,
    pub seasonality_factor: f64,
    pub fallback: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Repository for persisting and retrieving served estimates
#[derive(Clone)]
pub struct RateHistoryRepository {
    pool: SqlitePool,
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, origin_port_id, destination_port_id, container_type, weight, rate,
           min_rate, max_rate, fuel_surcharge, final_rate, reliability, source_count,
           sources_used, seasonality_factor, fallback, error, created_at
    FROM rate_history
"#;

impl RateHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RateHistoryRepository { pool }
    }

    pub async fn save(&self, request: &RateRequest, estimate: &RateEstimate) -> Result<i64, DatabaseError> {
        let sources_used = serde_json::to_string(&estimate.sources_used)
            .map_err(|e| DatabaseError::QueryError(format!("sources_used: {}", e)))?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO rate_history
            (origin_port_id, destination_port_id, container_type, weight, rate, min_rate,
             max_rate, fuel_surcharge, final_rate, reliability, source_count, sources_used,
             seasonality_factor, fallback, error, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&request.origin_port_id)
        .bind(&request.destination_port_id)
        .bind(request.container_type.code())
        .bind(request.weight)
        .bind(estimate.rate)
        .bind(estimate.min_rate)
        .bind(estimate.max_rate)
        .bind(estimate.fuel_surcharge)
        .bind(estimate.final_rate)
        .bind(estimate.reliability)
        .bind(estimate.source_count as i64)
        .bind(sources_used)
        .bind(estimate.seasonality_factor)
        .bind(estimate.fallback)
        .bind(&estimate.error)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(id)
    }

    /// Most recent estimates, newest first
    pub async fn get_recent(&self, limit: i64) -> Result<Vec<RateHistoryRecord>, DatabaseError> {
        let rows = sqlx::query(&format!("{} ORDER BY id DESC LIMIT ?", SELECT_COLUMNS))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;

        Ok(rows.iter().map(map_record).collect())
    }

    /// Most recent estimates for one route, newest first
    pub async fn get_by_route(
        &self,
        origin_port_id: &str,
        destination_port_id: &str,
        limit: i64,
    ) -> Result<Vec<RateHistoryRecord>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "{} WHERE origin_port_id = ? AND destination_port_id = ? ORDER BY id DESC LIMIT ?",
            SELECT_COLUMNS
        ))
        .bind(origin_port_id)
        .bind(destination_port_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(rows.iter().map(map_record).collect())
    }
}

fn query_error(e: sqlx::Error) -> DatabaseError {
    DatabaseError::QueryError(e.to_string())
}

fn map_record(row: &SqliteRow) -> RateHistoryRecord {
    let sources_used = serde_json::from_str(&row.get::<String, _>("sources_used")).unwrap_or_default();

    RateHistoryRecord {
        id: row.get::<i64, _>("id"),
        origin_port_id: row.get::<String, _>("origin_port_id"),
        destination_port_id: row.get::<String, _>("destination_port_id"),
        container_type: row.get::<String, _>("container_type"),
        weight: row.get::<Option<f64>, _>("weight"),
        rate: row.get::<f64, _>("rate"),
        min_rate: row.get::<f64, _>("min_rate"),
        max_rate: row.get::<f64, _>("max_rate"),
        fuel_surcharge: row.get::<f64, _>("fuel_surcharge"),
        final_rate: row.get::<f64, _>("final_rate"),
        reliability: row.get::<f64, _>("reliability"),
        source_count: row.get::<i64, _>("source_count"),
        sources_used,
        seasonality_factor: row.get::<f64, _>("seasonality_factor"),
        fallback: row.get::<bool, _>("fallback"),
        error: row.get::<Option<String>, _>("error"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    }
}

#[async_trait]
impl HistoryRecorder for RateHistoryRepository {
    async fn record(&self, request: &RateRequest, estimate: &RateEstimate) -> Result<i64, ProviderError> {
        self.save(request, estimate)
            .await
            .map_err(|e| ProviderError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::container::ContainerType;
    use crate::domain::entities::estimate::FALLBACK_SOURCE;
    use crate::persistence::init_database;

    fn estimate(rate: f64, fallback: bool) -> RateEstimate {
        RateEstimate {
            rate,
            min_rate: rate * 0.9,
            max_rate: rate * 1.1,
            fuel_surcharge: 50.0,
            final_rate: rate + 50.0,
            reliability: if fallback { 0.5 } else { 0.8 },
            source_count: if fallback { 0 } else { 2 },
            sources_used: if fallback {
                vec![FALLBACK_SOURCE.to_string()]
            } else {
                vec!["SCFI".to_string(), "CCFI".to_string()]
            },
            seasonality_factor: 1.0,
            fallback,
            error: None,
            debug_log: None,
        }
    }

    #[tokio::test]
    async fn test_record_and_read_back() {
        let repo = RateHistoryRepository::new(init_database("sqlite::memory:").await.unwrap());
        let request = RateRequest::new("CNSHA", "NLRTM", ContainerType::HighCube40).with_weight(18_500.0);

        let id = repo.record(&request, &estimate(1077.0, false)).await.unwrap();
        assert!(id > 0);

        let recent = repo.get_recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        let row = &recent[0];
        assert_eq!(row.id, id);
        assert_eq!(row.container_type, "40HC");
        assert_eq!(row.weight, Some(18_500.0));
        assert_eq!(row.final_rate, 1127.0);
        assert_eq!(row.sources_used, vec!["SCFI", "CCFI"]);
        assert!(!row.fallback);
    }

    #[tokio::test]
    async fn test_history_by_route_and_limit() {
        let repo = RateHistoryRepository::new(init_database("sqlite::memory:").await.unwrap());
        let asia_europe = RateRequest::new("CNSHA", "NLRTM", ContainerType::Dry40);
        let transpacific = RateRequest::new("CNSHA", "USLAX", ContainerType::Dry40);

        repo.save(&asia_europe, &estimate(1000.0, false)).await.unwrap();
        repo.save(&transpacific, &estimate(2100.0, true)).await.unwrap();
        repo.save(&asia_europe, &estimate(1050.0, false)).await.unwrap();

        let route = repo.get_by_route("CNSHA", "NLRTM", 10).await.unwrap();
        assert_eq!(route.len(), 2);
        assert_eq!(route[0].rate, 1050.0);

        assert_eq!(repo.get_recent(2).await.unwrap().len(), 2);

        let fallback = repo.get_by_route("CNSHA", "USLAX", 10).await.unwrap();
        assert!(fallback[0].fallback);
        assert_eq!(fallback[0].sources_used, vec![FALLBACK_SOURCE]);
    }

    #[tokio::test]
    async fn test_failed_write_surfaces_as_provider_error() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let repo = RateHistoryRepository::new(pool.clone());
        pool.close().await;

        let request = RateRequest::new("CNSHA", "NLRTM", ContainerType::Dry20);
        assert!(matches!(
            repo.save(&request, &estimate(1000.0, false)).await,
            Err(DatabaseError::QueryError(_))
        ));
        assert!(matches!(
            repo.record(&request, &estimate(1000.0, false)).await,
            Err(ProviderError::Database(_))
        ));
        assert!(matches!(repo.get_recent(5).await, Err(DatabaseError::QueryError(_))));
    }
}
