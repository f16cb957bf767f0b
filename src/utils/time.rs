//! Time helpers for on-chain timestamps and API output

use chrono::{DateTime, TimeZone, Utc};

use crate::core::error::AppError;
use crate::core::result::AppResult;

/// ISO 8601 with millisecond precision, as served to chart clients
pub const ISO_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Current Unix timestamp in seconds
pub fn unix_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Convert Unix seconds to a UTC datetime
pub fn from_unix_timestamp(timestamp: i64) -> AppResult<DateTime<Utc>> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .ok_or_else(|| AppError::validation(format!("Invalid timestamp: {}", timestamp)))
}

/// Format Unix seconds as `YYYY-MM-DDTHH:MM:SS.sssZ`
pub fn format_iso_millis(timestamp: i64) -> AppResult<String> {
    Ok(from_unix_timestamp(timestamp)?.format(ISO_TIME_FORMAT).to_string())
}

/// Human-readable uptime, e.g. `2d 3h 4m 5s`
pub fn format_uptime(duration: std::time::Duration) -> String {
    let total = duration.as_secs();
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        (total % 86_400) / 3_600,
        (total % 3_600) / 60,
        total % 60,
    );

    match (days, hours, minutes) {
        (0, 0, 0) => format!("{}s", seconds),
        (0, 0, _) => format!("{}m {}s", minutes, seconds),
        (0, _, _) => format!("{}h {}m {}s", hours, minutes, seconds),
        _ => format!("{}d {}h {}m {}s", days, hours, minutes, seconds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_iso_millis() {
        assert_eq!(format_iso_millis(0).unwrap(), "1970-01-01T00:00:00.000Z");
        assert_eq!(
            format_iso_millis(1_700_000_000).unwrap(),
            "2023-11-14T22:13:20.000Z"
        );
    }

    #[test]
    fn test_out_of_range_timestamp() {
        assert!(from_unix_timestamp(i64::MAX).is_err());
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(5)), "5s");
        assert_eq!(format_uptime(Duration::from_secs(65)), "1m 5s");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 1h 1m 1s");
    }

    #[test]
    fn test_unix_timestamp_is_recent() {
        assert!(unix_timestamp() > 1_700_000_000);
    }
}
