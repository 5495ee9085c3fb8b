//! Field checks shared by the request models' `validate` methods.

use crate::errors::{Error, Result};

/// Reject a required string that is empty after trimming.
pub fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::bad_request(format!("{field} is required")));
    }
    Ok(())
}

/// Reject an optional string that was supplied but is blank.
pub fn not_blank(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) => required(field, v),
        None => Ok(()),
    }
}

/// Reject negative or non-finite amounts.
pub fn non_negative(field: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(Error::bad_request(format!("{field} must be zero or greater"))),
        _ => Ok(()),
    }
}

/// Reject an integer score outside `0..=max`.
pub fn score_in_range(field: &str, value: Option<i64>, max: i64) -> Result<()> {
    match value {
        Some(v) if !(0..=max).contains(&v) => Err(Error::bad_request(format!("{field} must be between 0 and {max}"))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_whitespace() {
        assert!(required("name", "  ").is_err());
        assert!(required("name", "Acme").is_ok());
        assert!(not_blank("name", None).is_ok());
        assert!(not_blank("name", Some("")).is_err());
    }

    #[test]
    fn test_amount_and_score_bounds() {
        assert!(non_negative("liters", Some(-0.5)).is_err());
        assert!(non_negative("liters", Some(f64::NAN)).is_err());
        assert!(non_negative("liters", Some(0.0)).is_ok());
        assert!(non_negative("liters", None).is_ok());

        assert!(score_in_range("driver_cooperation", Some(36), 35).is_err());
        assert!(score_in_range("driver_cooperation", Some(-1), 35).is_err());
        assert!(score_in_range("driver_cooperation", Some(35), 35).is_ok());

        let err = score_in_range("vehicle_condition", Some(40), 35).unwrap_err();
        assert_eq!(err.user_message(), "vehicle_condition must be between 0 and 35");
    }
}
