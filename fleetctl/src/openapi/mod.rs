//! OpenAPI documentation for the back-office API served at `/admin/api/v1/*`.
//!
//! The generated document is served by Scalar at `/docs`.

use utoipa::OpenApi;

use crate::{api, legacy, mapping, rates, scoring};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "fleetctl",
        description = "Back-office API for a logistics operation: master data, trips, fuel, subcontractor evaluations and reports."
    ),
    servers(
        (url = "/admin/api/v1", description = "Back-office API")
    ),
    paths(
        // Master data
        api::handlers::customers::list_customers,
        api::handlers::customers::get_customer,
        api::handlers::customers::create_customer,
        api::handlers::customers::update_customer,
        api::handlers::customers::delete_customer,
        api::handlers::customers::bulk_delete_customers,
        api::handlers::customers::import_customers,
        api::handlers::subcontractors::list_subcontractors,
        api::handlers::subcontractors::get_subcontractor,
        api::handlers::subcontractors::create_subcontractor,
        api::handlers::subcontractors::update_subcontractor,
        api::handlers::subcontractors::delete_subcontractor,
        api::handlers::drivers::list_drivers,
        api::handlers::drivers::get_driver,
        api::handlers::drivers::create_driver,
        api::handlers::drivers::update_driver,
        api::handlers::drivers::delete_driver,
        api::handlers::vehicles::list_vehicles,
        api::handlers::vehicles::get_vehicle,
        api::handlers::vehicles::create_vehicle,
        api::handlers::vehicles::update_vehicle,
        api::handlers::vehicles::delete_vehicle,
        api::handlers::items::list_items,
        api::handlers::items::get_item,
        api::handlers::items::create_item,
        api::handlers::items::update_item,
        api::handlers::items::delete_item,
        // Operations
        api::handlers::trip_records::list_trip_records,
        api::handlers::trip_records::get_trip_record,
        api::handlers::trip_records::create_trip_record,
        api::handlers::trip_records::update_trip_record,
        api::handlers::trip_records::delete_trip_record,
        api::handlers::fuel_records::list_fuel_records,
        api::handlers::fuel_records::get_fuel_record,
        api::handlers::fuel_records::create_fuel_record,
        api::handlers::fuel_records::update_fuel_record,
        api::handlers::fuel_records::delete_fuel_record,
        api::handlers::evaluations::list_evaluations,
        api::handlers::evaluations::get_evaluation,
        api::handlers::evaluations::create_evaluation,
        api::handlers::evaluations::update_evaluation,
        api::handlers::evaluations::delete_evaluation,
        api::handlers::evaluations::evaluation_summary,
        api::handlers::evaluations::evaluation_scores,
        // Supporting
        api::handlers::legacy::list_legacy_customers,
        api::handlers::legacy::get_legacy_customer,
        api::handlers::rates::get_distance_rates,
        api::handlers::reports::evaluation_report,
        api::handlers::reports::fuel_report,
        api::handlers::reports::trip_report,
        api::handlers::uploads::upload_image,
    ),
    components(
        schemas(
            api::models::customers::CustomerCreate,
            api::models::customers::CustomerUpdate,
            api::models::customers::CustomerResponse,
            api::models::customers::BulkDeleteRequest,
            api::models::customers::BulkRowError,
            api::models::customers::BulkDeleteResponse,
            api::models::imports::CustomerImportRequest,
            api::models::imports::ImportSummary,
            api::models::subcontractors::SubcontractorCreate,
            api::models::subcontractors::SubcontractorUpdate,
            api::models::subcontractors::SubcontractorResponse,
            api::models::drivers::DriverCreate,
            api::models::drivers::DriverUpdate,
            api::models::drivers::DriverResponse,
            api::models::vehicles::VehicleCreate,
            api::models::vehicles::VehicleUpdate,
            api::models::vehicles::VehicleResponse,
            api::models::items::ItemCreate,
            api::models::items::ItemUpdate,
            api::models::items::ItemResponse,
            api::models::trip_records::TripRecordCreate,
            api::models::trip_records::TripRecordUpdate,
            api::models::trip_records::TripRecordResponse,
            api::models::fuel_records::FuelRecordCreate,
            api::models::fuel_records::FuelRecordUpdate,
            api::models::fuel_records::FuelRecordResponse,
            api::models::evaluations::EvaluationCreate,
            api::models::evaluations::EvaluationUpdate,
            api::models::evaluations::EvaluationResponse,
            api::models::evaluations::EvaluationSummaryResponse,
            api::models::evaluations::EvaluationScoresResponse,
            api::models::rates::DistanceRateResponse,
            api::models::uploads::UploadResponse,
            legacy::LegacyCustomer,
            mapping::Coordinates,
            rates::RateBand,
            scoring::Grade,
            scoring::TripScore,
        )
    ),
    tags(
        (name = "customers", description = "Customer master data and legacy imports"),
        (name = "subcontractors", description = "Haulage subcontractors"),
        (name = "drivers", description = "Drivers"),
        (name = "vehicles", description = "Vehicles"),
        (name = "items", description = "Goods carried on trips"),
        (name = "trip-records", description = "Delivery trips"),
        (name = "fuel-records", description = "Fuel purchases"),
        (name = "evaluations", description = "Subcontractor evaluations and monthly scoring"),
        (name = "legacy", description = "Read-only view of the legacy master-data system"),
        (name = "distance-rates", description = "Distance rate table"),
        (name = "reports", description = "PDF reports"),
        (name = "uploads", description = "Image uploads"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::ApiDoc;
    use utoipa::OpenApi;

    #[test]
    fn test_document_lists_every_resource() {
        let doc = ApiDoc::openapi();
        for path in [
            "/customers",
            "/customers/{id}",
            "/customers/import",
            "/trip-records",
            "/evaluations/summary",
            "/reports/trips.pdf",
            "/uploads/images",
            "/distance-rates",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
