// Date-Range Filter

use crate::datetime::{format_input, parse_datetime};
use crate::error::{ChartError, ChartResult};
use crate::table::Dataset;
use chrono::NaiveDateTime;
use std::fmt;

/// Inclusive date/time interval; `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> ChartResult<Self> {
        if start > end {
            return Err(ChartError::InvalidRangeOrder {
                start: format_input(&start),
                end: format_input(&end),
            });
        }
        Ok(DateRange { start, end })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn contains(&self, value: &NaiveDateTime) -> bool {
        *value >= self.start && *value <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", format_input(&self.start), format_input(&self.end))
    }
}

/// Validate the two range inputs the way they arrive from the user.
pub fn parse_range_input(start: &str, end: &str) -> ChartResult<DateRange> {
    if start.trim().is_empty() || end.trim().is_empty() {
        return Err(ChartError::MissingRangeInput);
    }
    let parse = |input: &str| {
        parse_datetime(input).ok_or_else(|| ChartError::InvalidDateTime {
            input: input.to_string(),
        })
    };
    DateRange::new(parse(start)?, parse(end)?)
}

/// `[min, max]` of the X column's date/time values. Cells that are not dates are skipped.
pub fn compute_default_range(dataset: &Dataset, x_axis: &str) -> ChartResult<DateRange> {
    let values = dataset.column(x_axis)?;
    let mut dates = values.iter().filter_map(|cell| cell.as_datetime());

    let first = dates.next().ok_or_else(|| ChartError::NoDateValues {
        column: x_axis.to_string(),
    })?;
    let (min, max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    DateRange::new(min, max)
}

/// Rows whose X value falls inside `range`, in their original order.
///
/// May return an empty dataset; callers decide whether that is an error.
pub fn apply_range(dataset: &Dataset, x_axis: &str, range: &DateRange) -> ChartResult<Dataset> {
    let idx = dataset.column_index(x_axis)?;
    let rows = dataset.retain_rows(|row| {
        row[idx]
            .as_datetime()
            .map(|d| range.contains(&d))
            .unwrap_or(false)
    });
    Ok(dataset.with_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn scenario_dataset() -> Dataset {
        Dataset::new(
            "scenario.csv",
            vec!["t".into(), "v".into()],
            vec![
                vec![CellValue::Text("2024-01-01 00:00".into()), CellValue::Number(1.0)],
                vec![CellValue::Text("2024-01-02 00:00".into()), CellValue::Number(2.0)],
                vec![CellValue::Text("2024-01-03 00:00".into()), CellValue::Number(3.0)],
            ],
        )
        .unwrap()
    }

    // DateRange / parse_range_input (5 tests)

    #[test]
    fn test_range_rejects_reversed() {
        let err = DateRange::new(day(2), day(1)).unwrap_err();
        assert!(matches!(err, ChartError::InvalidRangeOrder { .. }));
    }

    #[test]
    fn test_range_single_instant() {
        let range = DateRange::new(day(2), day(2)).unwrap();
        assert!(range.contains(&day(2)));
        assert!(!range.contains(&day(3)));
    }

    #[test]
    fn test_parse_range_missing() {
        assert!(matches!(parse_range_input("", "2024-01-01"), Err(ChartError::MissingRangeInput)));
        assert!(matches!(parse_range_input("2024-01-01", "  "), Err(ChartError::MissingRangeInput)));
    }

    #[test]
    fn test_parse_range_unparseable() {
        let err = parse_range_input("2024-01-01T00:00", "soon").unwrap_err();
        assert!(matches!(err, ChartError::InvalidDateTime { ref input } if input == "soon"));
    }

    #[test]
    fn test_parse_range_order() {
        let err = parse_range_input("2024-01-02T00:00", "2024-01-01T00:00").unwrap_err();
        assert!(matches!(err, ChartError::InvalidRangeOrder { .. }));
        assert_eq!(
            err.to_string(),
            "start 2024-01-02T00:00 is after end 2024-01-01T00:00"
        );
    }

    // compute_default_range (3 tests)

    #[test]
    fn test_default_range() {
        let range = compute_default_range(&scenario_dataset(), "t").unwrap();
        assert_eq!(range.start(), day(1));
        assert_eq!(range.end(), day(3));
        assert_eq!(range.to_string(), "2024-01-01T00:00 .. 2024-01-03T00:00");
    }

    #[test]
    fn test_default_range_skips_non_dates() {
        let data = Dataset::new(
            "m.csv",
            vec!["t".into()],
            vec![
                vec![CellValue::Text("2024-01-03".into())],
                vec![CellValue::Text("n/a".into())],
                vec![CellValue::DateTime(day(2))],
            ],
        )
        .unwrap();
        let range = compute_default_range(&data, "t").unwrap();
        assert_eq!((range.start(), range.end()), (day(2), day(3)));
    }

    #[test]
    fn test_default_range_no_dates() {
        let data = Dataset::new("m.csv", vec!["t".into()], vec![vec![CellValue::Bool(true)]]).unwrap();
        assert!(matches!(
            compute_default_range(&data, "t"),
            Err(ChartError::NoDateValues { .. })
        ));

        // plain numbers are sample ids, not serial dates
        let data = Dataset::new(
            "n.csv",
            vec!["t".into()],
            vec![vec![CellValue::Number(1.0)], vec![CellValue::Number(2020.0)]],
        )
        .unwrap();
        assert!(matches!(
            compute_default_range(&data, "t"),
            Err(ChartError::NoDateValues { .. })
        ));
    }

    // apply_range (3 tests)

    #[test]
    fn test_apply_range_inclusive_and_ordered() {
        let data = scenario_dataset();
        let range = DateRange::new(day(2), day(3)).unwrap();
        let filtered = apply_range(&data, "t", &range).unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.columns(), data.columns());
        assert_eq!(filtered.rows()[0][1], CellValue::Number(2.0));
        assert_eq!(filtered.rows()[1][1], CellValue::Number(3.0));
    }

    #[test]
    fn test_apply_range_no_match() {
        let range = DateRange::new(day(5), day(6)).unwrap();
        let filtered = apply_range(&scenario_dataset(), "t", &range).unwrap();
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_apply_range_unknown_column() {
        let range = DateRange::new(day(1), day(6)).unwrap();
        assert!(apply_range(&scenario_dataset(), "nope", &range).is_err());
    }

    proptest! {
        #[test]
        fn apply_range_is_idempotent(
            days in proptest::collection::vec(1u32..=28, 1..30),
            a in 1u32..=28,
            b in 1u32..=28,
        ) {
            let rows = days.iter().map(|d| vec![CellValue::DateTime(day(*d))]).collect();
            let data = Dataset::new("p.csv", vec!["t".into()], rows).unwrap();
            let range = DateRange::new(day(a.min(b)), day(a.max(b))).unwrap();

            let once = apply_range(&data, "t", &range).unwrap();
            let twice = apply_range(&once, "t", &range).unwrap();
            prop_assert_eq!(&once, &twice);
            prop_assert!(once.rows().iter().all(|r| range.contains(&r[0].as_datetime().unwrap())));
        }

        #[test]
        fn default_range_is_ordered(days in proptest::collection::vec(1u32..=28, 1..30)) {
            let rows = days.iter().map(|d| vec![CellValue::DateTime(day(*d))]).collect();
            let data = Dataset::new("p.csv", vec!["t".into()], rows).unwrap();
            let range = compute_default_range(&data, "t").unwrap();
            prop_assert!(range.start() <= range.end());
            let everything = apply_range(&data, "t", &range).unwrap();
            prop_assert_eq!(everything.len(), data.len());
        }
    }
}
