use chrono::{Duration, Utc};
use freight_rates::config::RateEngineConfig;
use freight_rates::domain::entities::container::ContainerType;
use freight_rates::domain::entities::estimate::{DebugStep, RateRequest, StepStatus, FALLBACK_SOURCE};
use freight_rates::domain::entities::index::{IndexId, Provenance};
use freight_rates::domain::entities::region::Region;
use freight_rates::domain::repositories::route_data::{FuelSurchargeCalculator, SeasonalityFactor};
use freight_rates::domain::services::fuel_model::Coordinates;
use freight_rates::infrastructure::index_source_factory::IndexSourceFactory;
use freight_rates::persistence::fuel_repository::SqliteFuelSurcharge;
use freight_rates::persistence::index_repository::SqliteIndexRepository;
use freight_rates::persistence::port_repository::{PortRecord, SqlitePortRepository};
use freight_rates::persistence::seasonality_repository::SqliteSeasonalityRepository;
use freight_rates::persistence::{init_database, DbPool};

async fn seeded_pool() -> DbPool {
    let pool = init_database("sqlite::memory:").await.unwrap();

    let ports = SqlitePortRepository::new(pool.clone());
    for (id, region, latitude, longitude) in [
        ("CNSHA", Region::China, 31.23, 121.47),
        ("NLRTM", Region::Europe, 51.95, 4.14),
        ("port-17", Region::Asia, 1.26, 103.84),
    ] {
        ports
            .upsert(&PortRecord {
                id: id.to_string(),
                code: None,
                name: None,
                region,
                coordinates: Some(Coordinates { latitude, longitude }),
            })
            .await
            .unwrap();
    }

    let fuel = SqliteFuelSurcharge::new(pool.clone(), RateEngineConfig::default().fuel);
    fuel.insert_price("VLSFO", 600.0, Utc::now().date_naive()).await.unwrap();

    pool
}

async fn seed_indices(pool: &DbPool, values: &[(IndexId, f64, i64)]) {
    let repo = SqliteIndexRepository::new(pool.clone(), 14);
    for (index, value, age_days) in values {
        repo.insert_value(*index, *value, None, Utc::now().date_naive() - Duration::days(*age_days))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_end_to_end_estimate_from_stored_data() {
    let pool = seeded_pool().await;
    seed_indices(&pool, &[(IndexId::Scfi, 1100.0, 1), (IndexId::Ccfi, 1050.0, 2)]).await;
    SqliteSeasonalityRepository::new(pool.clone())
        .upsert(
            Region::China,
            Some(Region::Europe),
            6,
            SeasonalityFactor {
                factor: 1.1,
                confidence: 0.8,
            },
        )
        .await
        .unwrap();

    let engine = IndexSourceFactory::create_engine(RateEngineConfig::default(), &pool).unwrap();
    let request = RateRequest::new("CNSHA", "NLRTM", ContainerType::Dry40).with_month(6);
    let estimate = engine.compute(&request).await;

    let expected_surcharge = SqliteFuelSurcharge::new(pool.clone(), RateEngineConfig::default().fuel)
        .surcharge_for("CNSHA", "NLRTM", ContainerType::Dry40)
        .await
        .unwrap()
        .unwrap()
        .surcharge
        .round();

    // (1100 * 1.2 + 1050 * 1.0) / 2.2 * 1.1
    assert_eq!(estimate.rate, 1185.0);
    assert_eq!(estimate.seasonality_factor, 1.1);
    assert!(expected_surcharge > 0.0);
    assert_eq!(estimate.fuel_surcharge, expected_surcharge);
    assert_eq!(estimate.final_rate, estimate.rate + expected_surcharge);
    assert_eq!(estimate.source_count, 2);
    assert!(!estimate.fallback);
    assert!(estimate.min_rate <= estimate.rate && estimate.rate <= estimate.max_rate);
    assert!(estimate.reliability >= 0.4 && estimate.reliability <= 1.0);
}

#[tokio::test]
async fn test_stale_index_reached_through_alternate_lookup() {
    let pool = seeded_pool().await;
    seed_indices(&pool, &[(IndexId::Scfi, 1000.0, 1), (IndexId::Wci, 1000.0, 90)]).await;

    let engine = IndexSourceFactory::create_engine(RateEngineConfig::default(), &pool).unwrap();
    let estimate = engine
        .compute(&RateRequest::new("CNSHA", "NLRTM", ContainerType::Dry20).with_month(3).with_debug(true))
        .await;

    assert_eq!(estimate.rate, 1000.0);
    assert_eq!(estimate.source_count, 2);

    let wci = estimate
        .debug_log
        .unwrap()
        .into_iter()
        .find(|step| matches!(step, DebugStep::SourceFetch { index: IndexId::Wci, .. }))
        .unwrap();
    assert!(matches!(
        wci,
        DebugStep::SourceFetch {
            status: StepStatus::Fallback,
            provenance: Some(Provenance::FallbackSearch),
            ..
        }
    ));
}

#[tokio::test]
async fn test_region_gate_uses_ports_table() {
    let pool = seeded_pool().await;
    seed_indices(&pool, &[(IndexId::Scfi, 1000.0, 1), (IndexId::Iacfi, 1600.0, 1)]).await;

    let engine = IndexSourceFactory::create_engine(RateEngineConfig::default(), &pool).unwrap();

    // port-17 is only known to the ports table
    let intra_asia = engine
        .compute(&RateRequest::new("CNSHA", "port-17", ContainerType::Dry40).with_month(3))
        .await;
    assert_eq!(intra_asia.rate, 1200.0);
    assert!(intra_asia.sources_used.contains(&"IACFI".to_string()));

    let unplaced = engine
        .compute(&RateRequest::new("CNSHA", "port-99", ContainerType::Dry40).with_month(3))
        .await;
    assert_eq!(unplaced.rate, 1000.0);
    assert_eq!(unplaced.fuel_surcharge, 0.0);
}

#[tokio::test]
async fn test_fallback_is_stable_across_engines() {
    let first_pool = seeded_pool().await;
    let second_pool = seeded_pool().await;
    let request = RateRequest::new("CNSHA", "NLRTM", ContainerType::Reefer40).with_month(11);

    let first = IndexSourceFactory::create_engine(RateEngineConfig::default(), &first_pool)
        .unwrap()
        .compute(&request)
        .await;
    let second = IndexSourceFactory::create_engine(RateEngineConfig::default(), &second_pool)
        .unwrap()
        .compute(&request)
        .await;

    assert!(first.fallback);
    assert_eq!(first.rate.to_bits(), second.rate.to_bits());
    assert!((1500.0..=3000.0).contains(&first.rate));
    assert_eq!(first.sources_used, vec![FALLBACK_SOURCE]);
    assert_eq!(first.source_count, 0);
    assert_eq!(first.reliability, 0.5);
    assert!(first.fuel_surcharge > 0.0);
    assert!(first.error.is_none());
}
