// Date/time parsing and the two display formats used for labels and range inputs

use chrono::{NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a date/time string as typed by a user or stored in a text cell.
///
/// Accepts `YYYY-MM-DDTHH:mm[:ss]`, `YYYY-MM-DD HH:mm[:ss]`, the slash-separated
/// label form, and bare dates (midnight). Surrounding whitespace is ignored.
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Chart label form: `YYYY/MM/DD HH:mm`.
pub fn format_label(value: &NaiveDateTime) -> String {
    value.format("%Y/%m/%d %H:%M").to_string()
}

/// Range input form: `YYYY-MM-DDTHH:mm`.
pub fn format_input(value: &NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use proptest::prelude::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_input_form() {
        assert_eq!(parse_datetime("2024-01-02T03:04"), Some(dt(2024, 1, 2, 3, 4)));
    }

    #[test]
    fn test_parse_space_and_seconds() {
        let parsed = parse_datetime("2024-01-02 03:04:59").unwrap();
        assert_eq!(parsed.second(), 59);
        assert_eq!(parsed.minute(), 4);
    }

    #[test]
    fn test_parse_label_form() {
        assert_eq!(parse_datetime("2024/12/31 23:59"), Some(dt(2024, 12, 31, 23, 59)));
    }

    #[test]
    fn test_parse_bare_date_is_midnight() {
        assert_eq!(parse_datetime(" 2024-01-05 "), Some(dt(2024, 1, 5, 0, 0)));
        assert_eq!(parse_datetime("2024/01/05"), Some(dt(2024, 1, 5, 0, 0)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_datetime(""), None);
        assert_eq!(parse_datetime("   "), None);
        assert_eq!(parse_datetime("yesterday"), None);
        assert_eq!(parse_datetime("2024-13-01"), None);
    }

    #[test]
    fn test_format_zero_padding() {
        let value = dt(2024, 1, 2, 3, 4);
        assert_eq!(format_label(&value), "2024/01/02 03:04");
        assert_eq!(format_input(&value), "2024-01-02T03:04");
    }

    proptest! {
        #[test]
        fn format_then_parse_recovers_minute(
            y in 1900i32..2200,
            m in 1u32..=12,
            d in 1u32..=28,
            h in 0u32..24,
            min in 0u32..60,
            s in 0u32..60,
        ) {
            let original = NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap();
            for text in [format_label(&original), format_input(&original)] {
                let parsed = parse_datetime(&text).unwrap();
                prop_assert_eq!(parsed.year(), y);
                prop_assert_eq!(parsed.month(), m);
                prop_assert_eq!(parsed.day(), d);
                prop_assert_eq!(parsed.hour(), h);
                prop_assert_eq!(parsed.minute(), min);
                prop_assert_eq!(parsed.second(), 0);
            }
        }
    }
}
