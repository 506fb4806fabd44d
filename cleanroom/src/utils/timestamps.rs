//! Timestamp helpers for naming imported output.

use chrono::{DateTime, Local, TimeZone};

const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Formats a time as a local ISO 8601 string with microseconds and no offset,
/// e.g. `2024-05-01T13:45:12.123456`.
#[must_use]
pub fn format_local_timestamp<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    time.format(OUTPUT_TIMESTAMP_FORMAT).to_string()
}

/// Current local time in the output timestamp format.
#[must_use]
pub fn local_iso_timestamp() -> String {
    format_local_timestamp(&Local::now())
}

/// Workspace path results are imported to:
/// `/Users/<owner>/clean_room_output_<timestamp>`.
#[must_use]
pub fn output_notebook_path(owner: &str, timestamp: &str) -> String {
    format!("/Users/{owner}/clean_room_output_{timestamp}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_format_has_microseconds_and_no_offset() {
        let time = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_micro_opt(13, 45, 12, 123_456)
            .unwrap()
            .and_utc();
        assert_eq!(format_local_timestamp(&time), "2024-05-01T13:45:12.123456");
    }

    #[test]
    fn test_local_timestamp_shape() {
        let ts = local_iso_timestamp();
        assert_eq!(ts.len(), "2024-05-01T13:45:12.123456".len());
        assert_eq!(&ts[10..11], "T");
    }

    #[test]
    fn test_output_notebook_path() {
        assert_eq!(
            output_notebook_path("alice@example.com", "2024-05-01T13:45:12.123456"),
            "/Users/alice@example.com/clean_room_output_2024-05-01T13:45:12.123456"
        );
    }
}
