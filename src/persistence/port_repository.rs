use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::domain::entities::region::Region;
use crate::domain::errors::ProviderError;
use crate::domain::repositories::route_data::PortRegionLookup;
use crate::domain::services::fuel_model::Coordinates;

/// A row of the ports table
#[derive(Debug, Clone, PartialEq)]
pub struct PortRecord {
    pub id: String,
    pub code: Option<String>,
    pub name: Option<String>,
    pub region: Region,
    pub coordinates: Option<Coordinates>,
}

/// Repository for port metadata (region and position)
#[derive(Clone)]
pub struct SqlitePortRepository {
    pool: SqlitePool,
}

impl SqlitePortRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SqlitePortRepository { pool }
    }

    /// Insert or replace a port
    pub async fn upsert(&self, port: &PortRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO ports (id, code, name, region, latitude, longitude, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(id) DO UPDATE SET
                code = excluded.code,
                name = excluded.name,
                region = excluded.region,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(&port.id)
        .bind(port.code.as_ref().map(|c| c.to_uppercase()))
        .bind(&port.name)
        .bind(port.region.name())
        .bind(port.coordinates.map(|c| c.latitude))
        .bind(port.coordinates.map(|c| c.longitude))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find a port by id, or by UN/LOCODE when no id matches
    pub async fn find(&self, port_id: &str) -> Result<Option<PortRecord>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, code, name, region, latitude, longitude
            FROM ports
            WHERE id = ? OR code = UPPER(?)
            ORDER BY (id = ?) DESC
            LIMIT 1
            "#,
        )
        .bind(port_id)
        .bind(port_id.trim())
        .bind(port_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| map_port(&row)))
    }

    pub async fn coordinates_of(&self, port_id: &str) -> Result<Option<Coordinates>, ProviderError> {
        Ok(self.find(port_id).await?.and_then(|port| port.coordinates))
    }
}

fn map_port(row: &SqliteRow) -> PortRecord {
    let latitude = row.get::<Option<f64>, _>("latitude");
    let longitude = row.get::<Option<f64>, _>("longitude");

    PortRecord {
        id: row.get::<String, _>("id"),
        code: row.get::<Option<String>, _>("code"),
        name: row.get::<Option<String>, _>("name"),
        region: Region::parse(&row.get::<String, _>("region")),
        coordinates: match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
            _ => None,
        },
    }
}

#[async_trait]
impl PortRegionLookup for SqlitePortRepository {
    async fn region_of(&self, port_id: &str) -> Result<Option<Region>, ProviderError> {
        Ok(self.find(port_id).await?.map(|port| port.region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::init_database;

    async fn repository() -> SqlitePortRepository {
        let pool = init_database("sqlite::memory:").await.unwrap();
        SqlitePortRepository::new(pool)
    }

    fn shanghai() -> PortRecord {
        PortRecord {
            id: "port-1".to_string(),
            code: Some("cnsha".to_string()),
            name: Some("Shanghai".to_string()),
            region: Region::China,
            coordinates: Some(Coordinates {
                latitude: 31.23,
                longitude: 121.47,
            }),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_and_code() {
        let repo = repository().await;
        repo.upsert(&shanghai()).await.unwrap();

        let by_id = repo.find("port-1").await.unwrap().unwrap();
        assert_eq!(by_id.code.as_deref(), Some("CNSHA"));
        assert_eq!(by_id.region, Region::China);

        let by_code = repo.find("cnsha").await.unwrap().unwrap();
        assert_eq!(by_code.id, "port-1");
    }

    #[tokio::test]
    async fn test_region_lookup_misses_return_none() {
        let repo = repository().await;
        assert_eq!(repo.region_of("nowhere").await, Ok(None));
    }

    #[tokio::test]
    async fn test_upsert_replaces_region() {
        let repo = repository().await;
        repo.upsert(&shanghai()).await.unwrap();
        repo.upsert(&PortRecord {
            region: Region::Asia,
            coordinates: None,
            ..shanghai()
        })
        .await
        .unwrap();

        assert_eq!(repo.region_of("port-1").await, Ok(Some(Region::Asia)));
        assert_eq!(repo.coordinates_of("port-1").await, Ok(None));
    }
}
