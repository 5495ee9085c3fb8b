//! Distance-rate lookup.
//!
//! Rates are configured as bands ordered by their upper bound. A distance takes the rate of the
//! first band whose `max_km` covers it; anything beyond the last band pays the last band's rate.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RateBand {
    /// Inclusive upper bound of the band in kilometres
    pub max_km: f64,
    pub rate: f64,
}

/// Rate for `distance_km`, or `None` for an empty table or a negative/NaN distance.
pub fn lookup_rate(bands: &[RateBand], distance_km: f64) -> Option<f64> {
    if distance_km.is_nan() || distance_km < 0.0 {
        return None;
    }
    bands
        .iter()
        .find(|band| band.max_km >= distance_km)
        .or_else(|| bands.last())
        .map(|band| band.rate)
}

/// Check a rate table: strictly increasing bounds, non-negative finite values.
pub fn validate_bands(bands: &[RateBand]) -> Result<(), String> {
    for (i, band) in bands.iter().enumerate() {
        if !band.max_km.is_finite() || band.max_km < 0.0 {
            return Err(format!("distance rate band {i}: max_km must be a non-negative number"));
        }
        if !band.rate.is_finite() || band.rate < 0.0 {
            return Err(format!("distance rate band {i}: rate must be a non-negative number"));
        }
        if i > 0 && band.max_km <= bands[i - 1].max_km {
            return Err(format!(
                "distance rate bands must be ordered by increasing max_km (band {i}: {} after {})",
                band.max_km,
                bands[i - 1].max_km
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<RateBand> {
        vec![
            RateBand { max_km: 50.0, rate: 300.0 },
            RateBand { max_km: 100.0, rate: 500.0 },
            RateBand { max_km: 200.0, rate: 800.0 },
        ]
    }

    #[test]
    fn test_band_edges_are_inclusive() {
        let bands = table();
        assert_eq!(lookup_rate(&bands, 0.0), Some(300.0));
        assert_eq!(lookup_rate(&bands, 50.0), Some(300.0));
        assert_eq!(lookup_rate(&bands, 50.1), Some(500.0));
        assert_eq!(lookup_rate(&bands, 200.0), Some(800.0));
    }

    #[test]
    fn test_beyond_last_band_uses_last_rate() {
        assert_eq!(lookup_rate(&table(), 1_250.0), Some(800.0));
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(lookup_rate(&table(), -1.0), None);
        assert_eq!(lookup_rate(&table(), f64::NAN), None);
        assert_eq!(lookup_rate(&[], 10.0), None);
    }

    #[test]
    fn test_validate_bands() {
        assert!(validate_bands(&table()).is_ok());
        assert!(validate_bands(&[]).is_ok());

        let unordered = vec![RateBand { max_km: 100.0, rate: 1.0 }, RateBand { max_km: 50.0, rate: 2.0 }];
        assert!(validate_bands(&unordered).is_err());

        let negative = vec![RateBand { max_km: 10.0, rate: -1.0 }];
        assert!(validate_bands(&negative).is_err());
    }
}
