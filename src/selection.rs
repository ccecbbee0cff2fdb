use crate::error::{ChartError, ChartResult};
use crate::table::Dataset;

/// Which column drives the X axis and which columns are plotted on each side.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AxisSelection {
    pub x_axis: String,
    pub left_y: Vec<String>,
    pub right_y: Vec<String>,
}

/// Only the X column is required; Y columns are checked when the chart is built.
pub fn set_axes(
    x_axis: impl Into<String>,
    left_y: Vec<String>,
    right_y: Vec<String>,
) -> ChartResult<AxisSelection> {
    let x_axis = x_axis.into();
    if x_axis.trim().is_empty() {
        return Err(ChartError::MissingXAxis);
    }
    Ok(AxisSelection {
        x_axis,
        left_y,
        right_y,
    })
}

impl AxisSelection {
    /// First column on X, nothing on either Y side.
    pub fn default_for(dataset: &Dataset) -> Self {
        AxisSelection {
            x_axis: dataset.columns().first().cloned().unwrap_or_default(),
            left_y: Vec::new(),
            right_y: Vec::new(),
        }
    }

    pub fn series_count(&self) -> usize {
        self.left_y.len() + self.right_y.len()
    }

    /// Replace every name (or 0-based index) with the dataset's column name.
    pub fn canonicalize(&self, dataset: &Dataset) -> ChartResult<AxisSelection> {
        let lookup = |name: &String| dataset.find_column(name);
        Ok(AxisSelection {
            x_axis: lookup(&self.x_axis)?,
            left_y: self.left_y.iter().map(lookup).collect::<ChartResult<_>>()?,
            right_y: self.right_y.iter().map(lookup).collect::<ChartResult<_>>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;

    fn dataset() -> Dataset {
        Dataset::new(
            "t.csv",
            vec!["Time".into(), "a".into(), "b".into()],
            vec![vec![CellValue::Empty, CellValue::Number(1.0), CellValue::Number(2.0)]],
        )
        .unwrap()
    }

    #[test]
    fn test_set_axes_requires_x() {
        assert!(matches!(set_axes("", vec![], vec![]), Err(ChartError::MissingXAxis)));
        assert!(matches!(set_axes("  ", vec![], vec![]), Err(ChartError::MissingXAxis)));
    }

    #[test]
    fn test_set_axes_keeps_order_and_overlap() {
        let sel = set_axes("t", vec!["b".into(), "a".into()], vec!["a".into()]).unwrap();
        assert_eq!(sel.left_y, vec!["b", "a"]);
        assert_eq!(sel.right_y, vec!["a"]);
        assert_eq!(sel.series_count(), 3);
    }

    #[test]
    fn test_default_for_picks_first_column() {
        let sel = AxisSelection::default_for(&dataset());
        assert_eq!(sel.x_axis, "Time");
        assert!(sel.left_y.is_empty());
        assert!(sel.right_y.is_empty());
    }

    #[test]
    fn test_canonicalize() {
        let sel = set_axes("time", vec!["A".into()], vec![]).unwrap();
        let canon = sel.canonicalize(&dataset()).unwrap();
        assert_eq!(canon.x_axis, "Time");
        assert_eq!(canon.left_y, vec!["a"]);
    }

    #[test]
    fn test_canonicalize_indices() {
        let sel = set_axes("0", vec!["2".into()], vec!["1".into()]).unwrap();
        let canon = sel.canonicalize(&dataset()).unwrap();
        assert_eq!(canon.x_axis, "Time");
        assert_eq!(canon.left_y, vec!["b"]);
        assert_eq!(canon.right_y, vec!["a"]);
    }

    #[test]
    fn test_canonicalize_unknown_column() {
        let sel = set_axes("Time", vec![], vec!["zzz".into()]).unwrap();
        assert!(matches!(
            sel.canonicalize(&dataset()),
            Err(ChartError::UnknownColumn { ref name, .. }) if name == "zzz"
        ));
    }
}
