//! Common validation utilities.

use chrono::{NaiveDate, NaiveTime};
use validator::ValidationError;

/// Smallest search radius accepted by the nearby search, in kilometers.
pub const MIN_SEARCH_DISTANCE_KM: f64 = 1.0;

/// Largest search radius accepted by the nearby search, in kilometers.
pub const MAX_SEARCH_DISTANCE_KM: f64 = 500.0;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        Err(error("latitude_range", "Latitude must be between -90 and 90"))
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        Err(error(
            "longitude_range",
            "Longitude must be between -180 and 180",
        ))
    }
}

/// Validates a nearby-search radius.
pub fn validate_search_distance(km: f64) -> Result<(), ValidationError> {
    if (MIN_SEARCH_DISTANCE_KM..=MAX_SEARCH_DISTANCE_KM).contains(&km) {
        Ok(())
    } else {
        Err(error(
            "distance_range",
            "Distance must be between 1 and 500 km",
        ))
    }
}

/// Validates that a string has at least one non-whitespace character.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(error("blank", "Value must not be blank"))
    } else {
        Ok(())
    }
}

/// Validates that `end` is strictly after `start`.
pub fn validate_time_range(start: NaiveTime, end: NaiveTime) -> Result<(), ValidationError> {
    if end > start {
        Ok(())
    } else {
        Err(error("time_range", "End time must be after start time"))
    }
}

/// Validates that `date` is today or later.
pub fn validate_not_in_past(date: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
    if date >= today {
        Ok(())
    } else {
        Err(error(
            "date_in_past",
            "Event date must be today or in the future",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_latitude() {
        assert!(validate_latitude(0.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(90.1).is_err());
        assert!(validate_latitude(-90.1).is_err());
    }

    #[test]
    fn test_validate_latitude_error_message() {
        let err = validate_latitude(100.0).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Latitude must be between -90 and 90"
        );
    }

    #[test]
    fn test_validate_longitude() {
        assert!(validate_longitude(0.0).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(180.1).is_err());
        assert!(validate_longitude(-180.1).is_err());
    }

    #[test]
    fn test_validate_search_distance() {
        assert!(validate_search_distance(1.0).is_ok());
        assert!(validate_search_distance(50.0).is_ok());
        assert!(validate_search_distance(500.0).is_ok());
        assert!(validate_search_distance(0.5).is_err());
        assert!(validate_search_distance(500.1).is_err());
        assert!(validate_search_distance(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("hello").is_ok());
        assert!(validate_not_blank("  x ").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" \n\t").is_err());
    }

    #[test]
    fn test_validate_time_range() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        assert!(validate_time_range(nine, ten).is_ok());
        assert!(validate_time_range(ten, nine).is_err());
        assert_eq!(
            validate_time_range(ten, ten).unwrap_err().code,
            "time_range"
        );
    }

    #[test]
    fn test_validate_not_in_past() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(validate_not_in_past(today, today).is_ok());
        assert!(validate_not_in_past(today.succ_opt().unwrap(), today).is_ok());
        assert!(validate_not_in_past(today.pred_opt().unwrap(), today).is_err());
    }
}
