//! Bulk customer import from the legacy master-data system.
//!
//! Rows are pulled by code range, codes that already exist (or repeat within the batch) are
//! skipped, and the rest are optionally enriched with coordinates and the driving distance from
//! the depot before insert. Enrichment problems never fail a row; insert problems fail only
//! that row.

use std::collections::HashSet;

use sqlx::SqliteConnection;
use tracing::{info, instrument, warn};

use crate::api::models::customers::BulkRowError;
use crate::api::models::imports::ImportSummary;
use crate::db::handlers::{Customers, Repository};
use crate::db::models::customers::CustomerCreateDBRequest;
use crate::errors::{Error, Result};
use crate::legacy::{LegacyCustomer, LegacyCustomerSource};
use crate::mapping::{Coordinates, MappingProvider};
use crate::types::normalize_code;

/// Geocoding provider plus the origin distances are measured from
pub struct Enrichment<'a> {
    pub provider: &'a dyn MappingProvider,
    pub depot: Coordinates,
}

/// Validate an inclusive code range, returning it trimmed.
pub fn check_code_range<'a>(from_code: &'a str, to_code: &'a str) -> Result<(&'a str, &'a str)> {
    let (from, to) = (from_code.trim(), to_code.trim());
    if from.is_empty() || to.is_empty() {
        return Err(Error::bad_request("from_code and to_code are required"));
    }
    if from > to {
        return Err(Error::bad_request(format!("from_code '{from}' is after to_code '{to}'")));
    }
    Ok((from, to))
}

#[derive(Debug, Default, PartialEq)]
struct Enriched {
    latitude: Option<f64>,
    longitude: Option<f64>,
    distance_km: Option<f64>,
}

async fn enrich(code: &str, address: Option<&str>, enrichment: &Enrichment<'_>) -> Enriched {
    let Some(address) = address else {
        return Enriched::default();
    };

    let coords = match enrichment.provider.geocode(address).await {
        Ok(Some(coords)) => coords,
        Ok(None) => {
            warn!(%code, "Address could not be geocoded");
            return Enriched::default();
        }
        Err(e) => {
            warn!(%code, error = %e, "Geocoding failed");
            return Enriched::default();
        }
    };

    let distance_km = match enrichment.provider.driving_distance_km(enrichment.depot, coords).await {
        Ok(distance) => distance,
        Err(e) => {
            warn!(%code, error = %e, "Distance lookup failed");
            None
        }
    };

    Enriched {
        latitude: Some(coords.latitude),
        longitude: Some(coords.longitude),
        distance_km,
    }
}

fn create_request(row: LegacyCustomer, code: String, enriched: Enriched) -> CustomerCreateDBRequest {
    CustomerCreateDBRequest {
        code,
        name: row.name.trim().to_string(),
        address: row.address,
        phone: row.phone,
        tax_id: row.tax_id,
        latitude: enriched.latitude,
        longitude: enriched.longitude,
        distance_km: enriched.distance_km,
        is_active: true,
    }
}

/// Import the legacy customers in `from_code..=to_code`.
#[instrument(skip(db, source, enrichment), fields(geocode = enrichment.is_some()), err)]
pub async fn import_customers(
    db: &mut SqliteConnection,
    source: &dyn LegacyCustomerSource,
    enrichment: Option<&Enrichment<'_>>,
    from_code: &str,
    to_code: &str,
) -> Result<ImportSummary> {
    let (from, to) = check_code_range(from_code, to_code)?;
    let rows = source.customers_in_range(from, to).await?;

    let mut summary = ImportSummary {
        total: rows.len(),
        ..Default::default()
    };

    let codes: Vec<String> = rows.iter().map(|row| normalize_code(&row.code)).collect();
    let existing = Customers::new(&mut *db).existing_codes(&codes).await?;
    let mut seen = HashSet::new();

    for (row, code) in rows.into_iter().zip(codes) {
        if existing.contains(&code) || !seen.insert(code.clone()) {
            summary.skipped += 1;
            summary.skipped_codes.push(code);
            continue;
        }

        let enriched = match enrichment {
            Some(enrichment) => enrich(&code, row.address.as_deref(), enrichment).await,
            None => Enriched::default(),
        };

        let request = create_request(row, code.clone(), enriched);
        match Customers::new(&mut *db).create(&request).await {
            Ok(_) => summary.succeeded += 1,
            Err(e) => {
                warn!(%code, error = %e, "Failed to import customer");
                summary.failed += 1;
                summary.errors.push(BulkRowError {
                    key: code,
                    message: Error::Database(e).user_message(),
                });
            }
        }
    }

    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        skipped = summary.skipped,
        failed = summary.failed,
        "Customer import finished"
    );
    Ok(summary)
}
