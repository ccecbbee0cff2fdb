//! Application state and the single `update` function every user action goes through.
//!
//! Each action either succeeds and moves the state forward, or fails with a
//! [`ChartError`] and leaves the state exactly as it was.

use crate::config::RenderOptions;
use crate::error::{ChartError, ChartResult};
use crate::graph::Chart;
use crate::palette::ColorPalette;
use crate::range::{apply_range, compute_default_range, parse_range_input, DateRange};
use crate::selection::{set_axes, AxisSelection};
use crate::series::build_chart;
use crate::table::{load_dataset, Dataset};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Load a file, replacing the dataset and everything derived from it.
    LoadFile(PathBuf),
    SetAxes {
        x_axis: String,
        left_y: Vec<String>,
        right_y: Vec<String>,
    },
    /// Build and show the chart for the whole dataset.
    Display,
    /// Filter by the two user-entered bounds and show the result.
    ApplyRange { start: String, end: String },
    Pan { dx: f64, dy: f64 },
    Zoom { factor: f64, anchor: f64 },
    ResetZoom,
    /// Write the live chart as a PNG.
    ExportImage(PathBuf),
    /// Drop the dataset and chart.
    Reset,
}

/// What a successful action produced, for the front end to report.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Loaded { columns: Vec<String>, rows: usize },
    AxesSet(AxisSelection),
    Displayed {
        points: usize,
        series: usize,
        default_range: Option<DateRange>,
    },
    RangeApplied { range: DateRange, points: usize },
    ViewChanged,
    Exported { path: PathBuf, bytes: usize },
    Cleared,
}

/// Everything the session owns. At most one live chart exists at a time.
#[derive(Debug, Default)]
pub struct App {
    dataset: Option<Dataset>,
    selection: Option<AxisSelection>,
    // Axes of the chart on screen; the range filter redraws with these.
    shown_axes: Option<AxisSelection>,
    range: Option<DateRange>,
    chart: Option<Chart>,
    palette: ColorPalette,
    options: RenderOptions,
}

impl App {
    pub fn new(options: RenderOptions) -> Self {
        App {
            options,
            ..App::default()
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn selection(&self) -> Option<&AxisSelection> {
        self.selection.as_ref()
    }

    /// The range inputs as last populated or applied.
    pub fn range(&self) -> Option<&DateRange> {
        self.range.as_ref()
    }

    pub fn chart(&self) -> Option<&Chart> {
        self.chart.as_ref()
    }

    pub fn update(&mut self, action: Action) -> ChartResult<Outcome> {
        match action {
            Action::LoadFile(path) => self.load(path),
            Action::SetAxes {
                x_axis,
                left_y,
                right_y,
            } => self.set_axes(x_axis, left_y, right_y),
            Action::Display => self.display(),
            Action::ApplyRange { start, end } => self.apply_range(&start, &end),
            Action::Pan { dx, dy } => {
                self.live_chart()?.pan(dx, dy);
                Ok(Outcome::ViewChanged)
            }
            Action::Zoom { factor, anchor } => {
                self.live_chart()?.zoom(factor, anchor);
                Ok(Outcome::ViewChanged)
            }
            Action::ResetZoom => {
                self.live_chart()?.reset_zoom();
                Ok(Outcome::ViewChanged)
            }
            Action::ExportImage(path) => self.export(path),
            Action::Reset => {
                self.clear();
                Ok(Outcome::Cleared)
            }
        }
    }

    fn load(&mut self, path: PathBuf) -> ChartResult<Outcome> {
        // Read completely before touching state, so a failed load keeps the old session.
        let dataset = load_dataset(&path)?;
        self.clear();

        let outcome = Outcome::Loaded {
            columns: dataset.columns().to_vec(),
            rows: dataset.len(),
        };
        self.dataset = Some(dataset);
        Ok(outcome)
    }

    fn set_axes(
        &mut self,
        x_axis: String,
        left_y: Vec<String>,
        right_y: Vec<String>,
    ) -> ChartResult<Outcome> {
        let dataset = self.dataset.as_ref().ok_or(ChartError::NoDataset)?;
        let selection = set_axes(x_axis, left_y, right_y)?.canonicalize(dataset)?;
        self.selection = Some(selection.clone());
        Ok(Outcome::AxesSet(selection))
    }

    fn display(&mut self) -> ChartResult<Outcome> {
        let dataset = self.dataset.as_ref().ok_or(ChartError::NoDataset)?;
        let selection = self.selection.as_ref().ok_or(ChartError::NoSelection)?;

        let config = build_chart(dataset, selection, &self.palette, self.options.zoom_mode)?;
        let default_range = match compute_default_range(dataset, &selection.x_axis) {
            Ok(range) => Some(range),
            Err(err) => {
                warn!(column = %selection.x_axis, "no default range: {}", err);
                None
            }
        };

        let outcome = Outcome::Displayed {
            points: config.labels.len(),
            series: config.series.len(),
            default_range,
        };
        let shown = selection.clone();
        self.replace_chart(Chart::create(config, self.options.clone()));
        self.shown_axes = Some(shown);
        self.range = default_range;
        info!(?outcome, "chart displayed");
        Ok(outcome)
    }

    fn apply_range(&mut self, start: &str, end: &str) -> ChartResult<Outcome> {
        if self.chart.is_none() {
            return Err(ChartError::NoChart);
        }
        let dataset = self.dataset.as_ref().ok_or(ChartError::NoDataset)?;
        let selection = self.shown_axes.as_ref().ok_or(ChartError::NoChart)?;

        let range = parse_range_input(start, end)?;
        let filtered = apply_range(dataset, &selection.x_axis, &range)?;
        if filtered.is_empty() {
            return Err(ChartError::EmptyRangeResult {
                start: start.trim().to_string(),
                end: end.trim().to_string(),
            });
        }

        let config = build_chart(&filtered, selection, &self.palette, self.options.zoom_mode)?;
        let points = config.labels.len();
        self.replace_chart(Chart::create(config, self.options.clone()));
        self.range = Some(range);
        info!(%range, points, "range applied");
        Ok(Outcome::RangeApplied { range, points })
    }

    fn export(&mut self, path: PathBuf) -> ChartResult<Outcome> {
        let chart = self.chart.as_ref().ok_or(ChartError::NoChart)?;
        let png = chart.render_png()?;
        if let Err(source) = fs::write(&path, &png) {
            warn!(path = %path.display(), "image export failed: {}", source);
            return Err(ChartError::ExportFailed { path, source });
        }
        info!(path = %path.display(), bytes = png.len(), "chart exported");
        Ok(Outcome::Exported {
            path,
            bytes: png.len(),
        })
    }

    fn live_chart(&mut self) -> ChartResult<&mut Chart> {
        self.chart.as_mut().ok_or(ChartError::NoChart)
    }

    fn replace_chart(&mut self, chart: Chart) {
        if let Some(previous) = self.chart.take() {
            previous.destroy();
        }
        self.chart = Some(chart);
    }

    fn clear(&mut self) {
        if let Some(previous) = self.chart.take() {
            previous.destroy();
        }
        self.dataset = None;
        self.selection = None;
        self.shown_axes = None;
        self.range = None;
    }
}
