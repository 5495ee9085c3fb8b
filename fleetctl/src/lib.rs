//! # fleetctl: Back office for a logistics operation
//!
//! `fleetctl` is the HTTP back end behind a delivery company's back-office screens. It keeps the
//! master data the dispatch staff work with (customers, subcontractors, drivers, vehicles, items),
//! records day-to-day operations (delivery trips and fuel purchases), scores subcontractors every
//! month, and renders the PDF reports management asks for.
//!
//! ## Overview
//!
//! Most of the API is plain CRUD over SQLite, but a few flows carry business rules:
//!
//! - **Trips** resolve their distance from the customer when the request omits it, and price the
//!   trip from the configured distance rate bands ([`rates`]).
//! - **Evaluations** are scored per trip and rolled up per vehicle and month. Damage on a vehicle
//!   reduces or zeroes its damage score depending on incident count and value ([`scoring`]).
//! - **Customer imports** copy a code range out of a legacy SQL Server system ([`legacy`]),
//!   skipping codes that already exist, and can geocode each address and measure the driving
//!   distance from the depot ([`mapping`], [`imports`]).
//! - **Uploads** store driver, vehicle and item photos on local disk ([`images`]).
//! - **Reports** render evaluation, fuel and trip listings as PDF ([`reports`]).
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum). Requests to `/admin/api/v1/*` go
//! through handlers in [`api::handlers`], which validate the request models, open a pooled SQLite
//! connection and call the repositories in [`db::handlers`]. Repository failures are typed as
//! [`db::errors::DbError`] and converted to HTTP responses by [`errors::Error`].
//!
//! Integrations sit behind traits so they can be swapped in tests:
//! [`legacy::LegacyCustomerSource`] for the legacy system and [`mapping::MappingProvider`] for
//! geocoding. Both are optional; without configuration the endpoints that need them answer
//! `503 Service Unavailable`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use fleetctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = fleetctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     fleetctl::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! The SQLite file is created if missing and migrations run on startup:
//!
//! ```no_run
//! # use sqlx::SqlitePool;
//! # async fn example(pool: SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
//! fleetctl::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod images;
pub mod imports;
pub mod legacy;
pub mod mapping;
mod openapi;
pub mod rates;
pub mod reports;
pub mod scoring;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::config::CorsOrigin;
use crate::images::ImageStore;
use crate::legacy::{LegacyCustomerSource, SqlServerSource};
use crate::mapping::{GoogleMapsProvider, MappingProvider};
use crate::openapi::ApiDoc;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::{
    Router, http,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Room for multipart boundaries and the `category` field on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `db`: SQLite connection pool
/// - `config`: Application configuration loaded from file and environment
/// - `images`: Local image storage for uploads
/// - `legacy`: Legacy master-data source, when configured
/// - `mapping`: Geocoding / distance provider, when configured
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .images(ImageStore::new(&config.uploads))
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub images: ImageStore,
    pub legacy: Option<Arc<dyn LegacyCustomerSource>>,
    pub mapping: Option<Arc<dyn MappingProvider>>,
}

/// Get the fleetctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open the SQLite pool described by the config and bring the schema up to date.
async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let settings = &config.database.pool;
    let options = SqliteConnectOptions::from_str(&config.database.url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let secs = |s: u64| (s > 0).then(|| Duration::from_secs(s));
    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(secs(settings.idle_timeout_secs))
        .max_lifetime(secs(settings.max_lifetime_secs))
        .connect_with(options)
        .await?;

    migrator().run(&pool).await?;
    info!("Database ready");
    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allow_origin = if config.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::PATCH,
            http::Method::DELETE,
        ])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(config.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION, http::header::CONTENT_DISPOSITION]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// - `/admin/api/v1/*`: the back-office API
/// - `/files/images/{category}/{filename}`: uploaded images
/// - `/docs`: API reference
/// - `/healthz`: liveness
///
/// # Errors
///
/// Returns an error if the CORS configuration is invalid.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    use api::handlers::{customers, drivers, evaluations, fuel_records, items, legacy, rates, reports, subcontractors, trip_records, uploads, vehicles};

    let upload_limit = usize::try_from(state.config.uploads.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let api_routes = Router::new()
        // Customers
        .route("/customers", get(customers::list_customers).post(customers::create_customer))
        .route(
            "/customers/{id}",
            get(customers::get_customer)
                .put(customers::update_customer)
                .patch(customers::update_customer)
                .delete(customers::delete_customer),
        )
        .route("/customers/bulk-delete", post(customers::bulk_delete_customers))
        .route("/customers/import", post(customers::import_customers))
        // Subcontractors
        .route(
            "/subcontractors",
            get(subcontractors::list_subcontractors).post(subcontractors::create_subcontractor),
        )
        .route(
            "/subcontractors/{id}",
            get(subcontractors::get_subcontractor)
                .put(subcontractors::update_subcontractor)
                .patch(subcontractors::update_subcontractor)
                .delete(subcontractors::delete_subcontractor),
        )
        // Drivers
        .route("/drivers", get(drivers::list_drivers).post(drivers::create_driver))
        .route(
            "/drivers/{id}",
            get(drivers::get_driver)
                .put(drivers::update_driver)
                .patch(drivers::update_driver)
                .delete(drivers::delete_driver),
        )
        // Vehicles
        .route("/vehicles", get(vehicles::list_vehicles).post(vehicles::create_vehicle))
        .route(
            "/vehicles/{id}",
            get(vehicles::get_vehicle)
                .put(vehicles::update_vehicle)
                .patch(vehicles::update_vehicle)
                .delete(vehicles::delete_vehicle),
        )
        // Items
        .route("/items", get(items::list_items).post(items::create_item))
        .route(
            "/items/{id}",
            get(items::get_item).put(items::update_item).patch(items::update_item).delete(items::delete_item),
        )
        // Trips
        .route(
            "/trip-records",
            get(trip_records::list_trip_records).post(trip_records::create_trip_record),
        )
        .route(
            "/trip-records/{id}",
            get(trip_records::get_trip_record)
                .put(trip_records::update_trip_record)
                .patch(trip_records::update_trip_record)
                .delete(trip_records::delete_trip_record),
        )
        // Fuel
        .route(
            "/fuel-records",
            get(fuel_records::list_fuel_records).post(fuel_records::create_fuel_record),
        )
        .route(
            "/fuel-records/{id}",
            get(fuel_records::get_fuel_record)
                .put(fuel_records::update_fuel_record)
                .patch(fuel_records::update_fuel_record)
                .delete(fuel_records::delete_fuel_record),
        )
        // Evaluations
        .route("/evaluations/summary", get(evaluations::evaluation_summary))
        .route("/evaluations/scores", get(evaluations::evaluation_scores))
        .route(
            "/evaluations",
            get(evaluations::list_evaluations).post(evaluations::create_evaluation),
        )
        .route(
            "/evaluations/{id}",
            get(evaluations::get_evaluation)
                .put(evaluations::update_evaluation)
                .patch(evaluations::update_evaluation)
                .delete(evaluations::delete_evaluation),
        )
        // Legacy master data
        .route("/legacy/customers", get(legacy::list_legacy_customers))
        .route("/legacy/customers/{code}", get(legacy::get_legacy_customer))
        // Business rules
        .route("/distance-rates", get(rates::get_distance_rates))
        // Reports
        .route("/reports/evaluations.pdf", get(reports::evaluation_report))
        .route("/reports/fuel.pdf", get(reports::fuel_report))
        .route("/reports/trips.pdf", get(reports::trip_report))
        // Uploads
        .route(
            "/uploads/images",
            post(uploads::upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/files/images/{category}/{filename}", get(uploads::serve_image))
        .with_state(state.clone())
        .nest("/admin/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let cors_layer = create_cors_layer(&state.config)?;
    let router = router.layer(cors_layer);

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Build the optional integrations named in the config.
fn setup_integrations(config: &Config) -> anyhow::Result<(Option<Arc<dyn LegacyCustomerSource>>, Option<Arc<dyn MappingProvider>>)> {
    let legacy: Option<Arc<dyn LegacyCustomerSource>> = match &config.legacy {
        Some(legacy_config) => {
            info!(host = %legacy_config.host, database = %legacy_config.database, "Legacy master-data source configured");
            Some(Arc::new(SqlServerSource::new(legacy_config.clone())))
        }
        None => {
            warn!("No legacy source configured; customer imports are unavailable");
            None
        }
    };

    let mapping: Option<Arc<dyn MappingProvider>> = match &config.mapping {
        Some(mapping_config) => {
            info!(base_url = %mapping_config.base_url, "Mapping provider configured");
            Some(Arc::new(GoogleMapsProvider::new(mapping_config)?))
        }
        None => None,
    };

    Ok((legacy, mapping))
}

/// The HTTP server together with the resources it owns.
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting fleetctl with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;
        tokio::fs::create_dir_all(&config.uploads.dir).await?;
        let (legacy, mapping) = setup_integrations(&config)?;

        let app_state = AppState::builder()
            .db(pool.clone())
            .images(ImageStore::new(&config.uploads))
            .config(config.clone())
            .maybe_legacy(legacy)
            .maybe_mapping(mapping)
            .build();

        let router = build_router(app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "fleetctl listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::config::CorsOrigin;
    use crate::test_utils::*;
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_health_and_docs(pool: SqlitePool) {
        let server = create_test_app(pool).await;

        let health = server.get("/healthz").await;
        health.assert_status_ok();
        assert_eq!(health.text(), "OK");

        server.get("/docs").await.assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_route_is_not_found(pool: SqlitePool) {
        let server = create_test_app(pool).await;
        server.get("/admin/api/v1/invoices").await.assert_status_not_found();
    }

    #[test_log::test(tokio::test)]
    async fn test_application_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = create_test_config();
        config.database.url = format!("sqlite://{}", dir.path().join("fleet.db").display());
        config.uploads.dir = dir.path().join("uploads");

        let server = crate::Application::new(config).await.unwrap().into_test_server();
        server.get("/healthz").await.assert_status_ok();
        server.get("/admin/api/v1/customers").await.assert_status_ok();

        assert!(dir.path().join("fleet.db").exists());
        assert!(dir.path().join("uploads").is_dir());
    }

    #[test]
    fn test_cors_layer_accepts_configured_origins() {
        let mut config = create_test_config();
        config.cors.allowed_origins = vec![CorsOrigin::Url("https://backoffice.example.com".parse().unwrap())];
        assert!(super::create_cors_layer(&config).is_ok());

        config.cors.allowed_origins = vec![CorsOrigin::Wildcard];
        assert!(super::create_cors_layer(&config).is_ok());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_cors_preflight_allows_configured_origin(pool: SqlitePool) {
        let server = create_test_app(pool).await;
        let response = server
            .method(axum::http::Method::OPTIONS, "/admin/api/v1/customers")
            .add_header("origin", "http://localhost:5173")
            .add_header("access-control-request-method", "POST")
            .await;
        assert_eq!(response.header("access-control-allow-origin"), "http://localhost:5173");
    }
}
