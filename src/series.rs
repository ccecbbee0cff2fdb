// Series Builder: rows + axis selection -> chart configuration

use crate::datetime::format_label;
use crate::error::ChartResult;
use crate::palette::{ColorPalette, SeriesColor};
use crate::selection::AxisSelection;
use crate::table::{CellValue, Dataset};
use crate::view::ZoomMode;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Line,
}

/// Scale identifier a series is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AxisId {
    #[serde(rename = "leftY")]
    Left,
    #[serde(rename = "rightY")]
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisPosition {
    Left,
    Right,
}

/// A linear value scale on one side of the plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleConfig {
    pub position: AxisPosition,
    /// Whether this scale's gridlines are drawn across the plot area.
    pub draw_on_chart_area: bool,
}

impl ScaleConfig {
    fn for_axis(axis: AxisId) -> Self {
        match axis {
            AxisId::Left => ScaleConfig {
                position: AxisPosition::Left,
                draw_on_chart_area: true,
            },
            AxisId::Right => ScaleConfig {
                position: AxisPosition::Right,
                draw_on_chart_area: false,
            },
        }
    }
}

/// One plotted column.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    /// One cell per row, as loaded. Non-numeric cells become gaps when drawn.
    pub values: Vec<CellValue>,
    pub color: SeriesColor,
    pub axis: AxisId,
}

/// Everything a renderer needs to draw one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    pub scales: BTreeMap<AxisId, ScaleConfig>,
    pub zoom_mode: ZoomMode,
}

impl ChartConfig {
    pub fn has_axis(&self, axis: AxisId) -> bool {
        self.scales.contains_key(&axis)
    }

    pub fn series_on(&self, axis: AxisId) -> impl Iterator<Item = &Series> {
        self.series.iter().filter(move |s| s.axis == axis)
    }
}

/// X cell as a label: date/times in `YYYY/MM/DD HH:mm`, anything else as its text.
pub fn label_for(cell: &CellValue) -> String {
    match cell.as_datetime() {
        Some(dt) => format_label(&dt),
        None => cell.to_string(),
    }
}

/// Map rows onto series and scales.
///
/// Series follow left-Y selection order then right-Y order. Colours come from
/// one counter shared by both sides, so no colour repeats until the palette
/// wraps.
pub fn build_chart(
    dataset: &Dataset,
    selection: &AxisSelection,
    palette: &ColorPalette,
    zoom_mode: ZoomMode,
) -> ChartResult<ChartConfig> {
    let labels = dataset
        .column(&selection.x_axis)?
        .iter()
        .map(label_for)
        .collect();

    let mut series = Vec::with_capacity(selection.series_count());
    let mut scales = BTreeMap::new();
    let mut count = 0;

    for (axis, columns) in [
        (AxisId::Left, &selection.left_y),
        (AxisId::Right, &selection.right_y),
    ] {
        if columns.is_empty() {
            continue;
        }
        for name in columns {
            series.push(Series {
                label: name.clone(),
                values: dataset.column(name)?,
                color: palette.get_color(count),
                axis,
            });
            count += 1;
        }
        scales.insert(axis, ScaleConfig::for_axis(axis));
    }

    if count > palette.len() {
        debug!(series = count, palette = palette.len(), "palette wrapped, colours repeat");
    }

    Ok(ChartConfig {
        kind: ChartKind::Line,
        labels,
        series,
        scales,
        zoom_mode,
    })
}
