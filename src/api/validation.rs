use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use super::ApiError;

const LOCAL_DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parses an optional expiry from a form field.
///
/// Accepts RFC 3339, or an ISO local date-time read in the server's time zone.
/// A blank value means no expiry.
pub fn parse_expiry_date(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }

    for format in LOCAL_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            // Ambiguous wall-clock times (DST fall-back) take the earlier instant
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|ts| Some(ts.with_timezone(&Utc)))
                .ok_or_else(|| {
                    ApiError::validation(format!("Expiry date does not exist locally: {value}"))
                });
        }
    }

    Err(ApiError::validation(format!(
        "Invalid expiry date: {value}. Expected an ISO date-time such as 2030-01-31T18:00:00"
    )))
}

/// Parses an optional download limit from a form field. A blank value means unlimited.
pub fn parse_download_limit(raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    value.parse::<i64>().map(Some).map_err(|_| {
        ApiError::validation(format!(
            "Invalid download limit: {value}. Limit must be a whole number"
        ))
    })
}
