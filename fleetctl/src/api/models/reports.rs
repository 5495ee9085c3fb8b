//! Query parameters for PDF reports.

use crate::types::VehicleId;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::IntoParams;

/// Date-range report filter
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ReportRangeQuery {
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,

    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub vehicle_id: Option<VehicleId>,
}
