//! Test utilities: app construction, a seeded fleet and in-memory integrations.

use crate::config::{Config, DatabaseConfig, PoolSettings, UploadsConfig};
use crate::db::handlers::{Customers, Drivers, Repository, Subcontractors, Vehicles};
use crate::db::models::{
    customers::CustomerCreateDBRequest, drivers::DriverCreateDBRequest, evaluations::EvaluationCreateDBRequest,
    subcontractors::SubcontractorCreateDBRequest, trip_records::TripRecordCreateDBRequest, vehicles::VehicleCreateDBRequest,
};
use crate::images::ImageStore;
use crate::legacy::{LegacyCustomer, LegacyCustomerSource, LegacyError};
use crate::mapping::MappingProvider;
use crate::rates::RateBand;
use crate::types::{CustomerId, DriverId, SubcontractorId, VehicleId, normalize_code};
use crate::{AppState, build_router};
use async_trait::async_trait;
use axum_test::TestServer;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;

/// Distance stored on the seeded customer
pub const SEED_CUSTOMER_DISTANCE_KM: f64 = 42.0;

pub fn create_test_config() -> Config {
    Config {
        database: DatabaseConfig {
            // Replaced by the pool sqlx::test hands us
            url: "sqlite::memory:".to_string(),
            pool: PoolSettings {
                max_connections: 1,
                min_connections: 0,
                ..Default::default()
            },
        },
        host: "127.0.0.1".to_string(),
        port: 0,
        uploads: UploadsConfig {
            dir: std::env::temp_dir().join(format!("fleetctl-test-uploads-{}", std::process::id())),
            public_base_url: "/files/images".to_string(),
            max_file_size: 1024,
        },
        distance_rates: vec![
            RateBand {
                max_km: 50.0,
                rate: 1000.0,
            },
            RateBand {
                max_km: 100.0,
                rate: 1800.0,
            },
            RateBand {
                max_km: 200.0,
                rate: 3000.0,
            },
        ],
        ..Default::default()
    }
}

fn server(pool: SqlitePool, config: Config, legacy: Option<Arc<dyn LegacyCustomerSource>>, mapping: Option<Arc<dyn MappingProvider>>) -> TestServer {
    let state = AppState::builder()
        .db(pool)
        .images(ImageStore::new(&config.uploads))
        .config(config)
        .maybe_legacy(legacy)
        .maybe_mapping(mapping)
        .build();
    let router = build_router(state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

pub async fn create_test_app(pool: SqlitePool) -> TestServer {
    server(pool, create_test_config(), None, None)
}

pub async fn create_test_app_with(
    pool: SqlitePool,
    legacy: Option<Arc<dyn LegacyCustomerSource>>,
    mapping: Option<Arc<dyn MappingProvider>>,
) -> TestServer {
    server(pool, create_test_config(), legacy, mapping)
}

pub async fn create_test_app_with_config(pool: SqlitePool, config: Config) -> TestServer {
    server(pool, config, None, None)
}

/// App whose uploads land in `uploads_dir`
pub async fn create_test_app_in(pool: SqlitePool, uploads_dir: &Path) -> TestServer {
    let mut config = create_test_config();
    config.uploads.dir = uploads_dir.to_path_buf();
    server(pool, config, None, None)
}

/// Ids of the rows created by [`seed_fleet`].
#[derive(Debug, Clone, Copy)]
pub struct Fixtures {
    pub subcontractor_id: SubcontractorId,
    pub driver_id: DriverId,
    pub vehicle_id: VehicleId,
    pub customer_id: CustomerId,
}

/// One subcontractor with a driver and a vehicle, plus a customer with a stored distance.
pub async fn seed_fleet(pool: &SqlitePool) -> Fixtures {
    let mut conn = pool.acquire().await.unwrap();

    let subcontractor = Subcontractors::new(&mut conn)
        .create(&SubcontractorCreateDBRequest {
            code: "SUB01".to_string(),
            name: "Northline Haulage".to_string(),
            contact_name: Some("Priya Raman".to_string()),
            phone: None,
            is_active: true,
        })
        .await
        .unwrap();

    let driver = Drivers::new(&mut conn)
        .create(&DriverCreateDBRequest {
            code: "D001".to_string(),
            name: "Sam Okafor".to_string(),
            phone: Some("555-0101".to_string()),
            license_number: None,
            image_path: None,
            subcontractor_id: Some(subcontractor.id),
            is_active: true,
        })
        .await
        .unwrap();

    let vehicle = Vehicles::new(&mut conn)
        .create(&VehicleCreateDBRequest {
            plate_number: "KX-1001".to_string(),
            vehicle_type: "Truck".to_string(),
            brand: None,
            capacity_kg: Some(8000.0),
            image_path: None,
            driver_id: Some(driver.id),
            subcontractor_id: Some(subcontractor.id),
            is_active: true,
        })
        .await
        .unwrap();

    let customer = Customers::new(&mut conn)
        .create(&CustomerCreateDBRequest {
            code: "HF001".to_string(),
            name: "Harbour Foods".to_string(),
            address: Some("4 Wharf Street".to_string()),
            phone: None,
            tax_id: None,
            latitude: None,
            longitude: None,
            distance_km: Some(SEED_CUSTOMER_DISTANCE_KM),
            is_active: true,
        })
        .await
        .unwrap();

    Fixtures {
        subcontractor_id: subcontractor.id,
        driver_id: driver.id,
        vehicle_id: vehicle.id,
        customer_id: customer.id,
    }
}

fn date(value: &str) -> NaiveDate {
    value.parse().unwrap()
}

/// A trip for the seeded vehicle and customer; expenses add up to 350.
pub fn trip_request(fixtures: &Fixtures, trip_date: &str) -> TripRecordCreateDBRequest {
    TripRecordCreateDBRequest {
        trip_date: date(trip_date),
        vehicle_id: fixtures.vehicle_id,
        driver_id: fixtures.driver_id,
        customer_id: fixtures.customer_id,
        item_id: None,
        origin: Some("Depot".to_string()),
        destination: Some("Harbour Foods".to_string()),
        distance_km: SEED_CUSTOMER_DISTANCE_KM,
        distance_rate: 1000.0,
        fuel_expense: 200.0,
        toll_expense: 50.0,
        other_expense: 0.0,
        allowance: 100.0,
        notes: None,
    }
}

/// Full cooperation and condition scores; `damage` marks the evaluation as a damage incident.
pub fn evaluation_request(fixtures: &Fixtures, evaluation_date: &str, damage: Option<f64>) -> EvaluationCreateDBRequest {
    EvaluationCreateDBRequest {
        evaluation_date: date(evaluation_date),
        subcontractor_id: fixtures.subcontractor_id,
        vehicle_id: fixtures.vehicle_id,
        driver_id: Some(fixtures.driver_id),
        trip_record_id: None,
        driver_cooperation: 30,
        vehicle_condition: 30,
        damage_found: damage.is_some(),
        damage_value: damage.unwrap_or(0.0),
        remarks: None,
    }
}

/// Legacy source backed by a fixed list of rows.
pub struct InMemoryCustomerSource {
    rows: Vec<LegacyCustomer>,
    unavailable: bool,
}

impl InMemoryCustomerSource {
    pub fn new(rows: Vec<LegacyCustomer>) -> Self {
        Self { rows, unavailable: false }
    }

    /// Fails every call as if the server could not be reached
    pub fn unavailable() -> Self {
        Self {
            rows: vec![],
            unavailable: true,
        }
    }

    fn check(&self) -> Result<(), LegacyError> {
        if self.unavailable {
            Err(LegacyError::Connection("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LegacyCustomerSource for InMemoryCustomerSource {
    async fn customers_in_range(&self, from_code: &str, to_code: &str) -> Result<Vec<LegacyCustomer>, LegacyError> {
        self.check()?;
        let (from, to) = (normalize_code(from_code), normalize_code(to_code));
        Ok(self
            .rows
            .iter()
            .filter(|row| {
                let code = normalize_code(&row.code);
                code >= from && code <= to
            })
            .cloned()
            .collect())
    }

    async fn customer_by_code(&self, code: &str) -> Result<Option<LegacyCustomer>, LegacyError> {
        self.check()?;
        let code = normalize_code(code);
        Ok(self.rows.iter().find(|row| normalize_code(&row.code) == code).cloned())
    }
}
