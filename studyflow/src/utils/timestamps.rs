//! Timestamp helpers for stage and event records.

use chrono::{DateTime, Utc};

/// UTC timestamp used on stage results and learning events.
pub type Timestamp = DateTime<Utc>;

/// Returns the current UTC time as an ISO 8601 formatted string.
///
/// Format: `YYYY-MM-DDTHH:MM:SS.ffffff+00:00`
///
/// # Examples
///
/// ```
/// use studyflow::utils::iso_timestamp;
///
/// let ts = iso_timestamp();
/// assert!(ts.contains('T'));
/// assert!(ts.ends_with("+00:00"));
/// ```
#[must_use]
pub fn iso_timestamp() -> String {
    format_iso8601(&now_utc())
}

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}

/// Formats a timestamp as ISO 8601 string.
#[must_use]
pub fn format_iso8601(dt: &Timestamp) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}

/// Milliseconds between two timestamps, clamped at zero.
#[must_use]
pub fn elapsed_ms(start: &Timestamp, end: &Timestamp) -> f64 {
    let micros = (*end - *start).num_microseconds().unwrap_or(0).max(0);
    micros as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_iso_timestamp_format() {
        let ts = iso_timestamp();
        assert!(ts.contains('T'));
        assert!(ts.ends_with("+00:00"));
    }

    #[test]
    fn test_format_iso8601_fixed() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(format_iso8601(&dt), "2024-03-09T07:05:01.000000+00:00");
    }

    #[test]
    fn test_elapsed_ms() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = start + chrono::Duration::milliseconds(1500);
        assert!((elapsed_ms(&start, &end) - 1500.0).abs() < f64::EPSILON);
        assert!(elapsed_ms(&end, &start).abs() < f64::EPSILON);
    }
}
