use crate::config::RenderOptions;
use crate::palette::Rgba;
use crate::series::{AxisId, ChartConfig};
use crate::table::CellValue;
use crate::view::{ViewState, Window};
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::prelude::*;
use tracing::debug;

/// The live chart: a configuration plus the current pan/zoom view.
///
/// At most one exists per session; replacing it goes through [`Chart::destroy`].
#[derive(Debug)]
pub struct Chart {
    config: ChartConfig,
    options: RenderOptions,
    view: ViewState,
}

impl Chart {
    pub fn create(config: ChartConfig, options: RenderOptions) -> Self {
        let view = ViewState::full(config.labels.len(), config.zoom_mode);
        debug!(
            points = config.labels.len(),
            series = config.series.len(),
            "chart created"
        );
        Chart {
            config,
            options,
            view,
        }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Release the chart. Callers tear the old chart down before creating a new one.
    pub fn destroy(self) {
        debug!(points = self.config.labels.len(), "chart destroyed");
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        let current = self.autoscaled_y();
        self.view.pan(dx, dy, current);
    }

    pub fn zoom(&mut self, factor: f64, anchor: f64) {
        let current = self.autoscaled_y();
        self.view.zoom(factor, anchor, current);
    }

    pub fn reset_zoom(&mut self) {
        self.view.reset();
    }

    /// Y window currently shown for `axis`, or `None` if the side is not in use.
    pub fn y_window(&self, axis: AxisId) -> Option<Window> {
        if !self.config.has_axis(axis) {
            return None;
        }
        let pinned = match axis {
            AxisId::Left => self.view.y_left,
            AxisId::Right => self.view.y_right,
        };
        pinned.or_else(|| Some(self.autoscale(axis)))
    }

    fn autoscaled_y(&self) -> (Option<Window>, Option<Window>) {
        (self.y_window(AxisId::Left), self.y_window(AxisId::Right))
    }

    // Min/max over the visible rows of every series on `axis`, padded.
    fn autoscale(&self, axis: AxisId) -> Window {
        let visible = self.view.visible_indices(self.config.labels.len());
        let (min, max) = self
            .config
            .series_on(axis)
            .flat_map(|s| s.values[visible.clone()].iter().filter_map(CellValue::as_f64))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });

        if !min.is_finite() || !max.is_finite() {
            return Window::new(0.0, 1.0);
        }
        let (lo, hi) = pad_range(min, max);
        [Window::new(lo, hi), Window::new(min, max)]
            .into_iter()
            .find(Window::is_usable)
            .unwrap_or(Window::new(0.0, 1.0))
    }

    /// Draw the current view and encode it as PNG.
    pub fn render_png(&self) -> Result<Vec<u8>> {
        let (width, height) = (self.options.width, self.options.height);
        let mut buffer = vec![0u8; (width * height * 3) as usize];

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();

            root.fill(&WHITE).context("Failed to fill background")?;

            let left_active = self.config.has_axis(AxisId::Left);
            let right_active = self.config.has_axis(AxisId::Right);
            let y_left = self.y_window(AxisId::Left);
            let y_right = self.y_window(AxisId::Right);
            let primary_y = y_left.or(y_right).unwrap_or(Window::new(0.0, 1.0));
            let secondary_y = y_right.unwrap_or(primary_y);
            let x = self.view.x;
            for window in [x, primary_y, secondary_y] {
                if !window.is_usable() {
                    anyhow::bail!("Cannot draw axis range {} .. {}", window.min, window.max);
                }
            }

            let mut chart = ChartBuilder::on(&root)
                .margin(10)
                .caption(
                    self.options.title.as_deref().unwrap_or(""),
                    ("sans-serif", 20),
                )
                .x_label_area_size(40)
                .y_label_area_size(if left_active { 60 } else { 0 })
                .right_y_label_area_size(if right_active { 60 } else { 0 })
                .build_cartesian_2d(x.min..x.max, primary_y.min..primary_y.max)
                .context("Failed to build chart")?
                .set_secondary_coord(x.min..x.max, secondary_y.min..secondary_y.max);

            let labels = &self.config.labels;
            let x_formatter = |value: &f64| label_at(labels, *value);

            let mut mesh = chart.configure_mesh();
            mesh.x_labels(6).x_label_formatter(&x_formatter);
            if !left_active {
                mesh.disable_y_mesh().disable_y_axis();
            }
            mesh.draw().context("Failed to draw mesh")?;

            if right_active {
                chart
                    .configure_secondary_axes()
                    .draw()
                    .context("Failed to draw right axis")?;
            }

            let visible = self.view.visible_indices(labels.len());
            for series in &self.config.series {
                let color = to_rgb(series.color.border_color);
                let line_style = color.stroke_width(2);
                let point_style = to_rgba(series.color.background_color).filled();
                let segments = line_segments(&series.values[visible.clone()], visible.start);
                let points: Vec<(f64, f64)> = segments.iter().flatten().copied().collect();

                let lines = segments.into_iter().map(|pts| PathElement::new(pts, line_style));
                let markers = points.into_iter().map(|p| Circle::new(p, 3, point_style));

                let anno = match series.axis {
                    AxisId::Left => {
                        chart.draw_series(markers).context("Failed to draw points")?;
                        chart.draw_series(lines)
                    }
                    AxisId::Right => {
                        chart
                            .draw_secondary_series(markers)
                            .context("Failed to draw points")?;
                        chart.draw_secondary_series(lines)
                    }
                }
                .context("Failed to draw line series")?;

                anno.label(series.label.clone()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            }

            if !self.config.series.is_empty() {
                chart
                    .configure_series_labels()
                    .position(SeriesLabelPosition::UpperLeft)
                    .background_style(&WHITE.mix(0.8))
                    .border_style(&BLACK)
                    .draw()
                    .context("Failed to draw legend")?;
            }

            root.present().context("Failed to present drawing")?;
        }

        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(&buffer, width, height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }
}

fn to_rgb(color: Rgba) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

fn to_rgba(color: Rgba) -> RGBAColor {
    RGBAColor(color.r, color.g, color.b, color.a)
}

// Tick labels only on whole row positions.
fn label_at(labels: &[String], value: f64) -> String {
    let index = value.round();
    if (value - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    labels.get(index as usize).cloned().unwrap_or_default()
}

/// Split a column into runs of plottable points; non-numeric cells break the line.
fn line_segments(values: &[CellValue], offset: usize) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for (i, cell) in values.iter().enumerate() {
        match cell.as_f64() {
            Some(y) => current.push(((offset + i) as f64, y)),
            None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

fn pad_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding, max + padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::ColorPalette;
    use crate::selection::set_axes;
    use crate::series::build_chart;
    use crate::table::Dataset;
    use crate::view::ZoomMode;

    fn chart(left: &[&str], right: &[&str], mode: ZoomMode) -> Chart {
        let rows = (0..10)
            .map(|i| {
                vec![
                    CellValue::Text(format!("2024-01-{:02} 00:00", i + 1)),
                    CellValue::Number(i as f64),
                    CellValue::Number(100.0 - i as f64 * 10.0),
                ]
            })
            .collect();
        let data = Dataset::new("g.csv", vec!["t".into(), "a".into(), "b".into()], rows).unwrap();
        let sel = set_axes(
            "t",
            left.iter().map(|s| s.to_string()).collect(),
            right.iter().map(|s| s.to_string()).collect(),
        )
        .unwrap();
        let config = build_chart(&data, &sel, &ColorPalette::category10(), mode).unwrap();
        Chart::create(config, RenderOptions::default())
    }

    fn is_valid_png(bytes: &[u8]) -> bool {
        bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
    }

    // helpers (5 tests)

    #[test]
    fn test_pad_range() {
        assert_eq!(pad_range(5.0, 5.0), (4.0, 6.0));
        assert_eq!(pad_range(0.0, 100.0), (-5.0, 105.0));
    }

    #[test]
    fn test_label_at() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert_eq!(label_at(&labels, 1.0), "b");
        assert_eq!(label_at(&labels, 0.5), "");
        assert_eq!(label_at(&labels, -1.0), "");
        assert_eq!(label_at(&labels, 7.0), "");
    }

    #[test]
    fn test_line_segments_break_on_gaps() {
        let values = vec![
            CellValue::Number(1.0),
            CellValue::Empty,
            CellValue::Text("3".into()),
            CellValue::Number(4.0),
            CellValue::Text("x".into()),
        ];
        let segments = line_segments(&values, 10);
        assert_eq!(segments, vec![vec![(10.0, 1.0)], vec![(12.0, 3.0), (13.0, 4.0)]]);
    }

    #[test]
    fn test_line_segments_all_gaps() {
        assert!(line_segments(&[CellValue::Empty, CellValue::Bool(true)], 0).is_empty());
    }

    #[test]
    fn test_autoscale_per_axis() {
        let chart = chart(&["a"], &["b"], ZoomMode::X);
        let left = chart.y_window(AxisId::Left).unwrap();
        let right = chart.y_window(AxisId::Right).unwrap();
        assert!(left.min < 0.0 && left.max > 9.0 && left.max < 10.0);
        assert!(right.min < 10.0 && right.max > 100.0);
    }

    // view interaction (3 tests)

    #[test]
    fn test_inactive_axis_has_no_window() {
        let chart = chart(&["a"], &[], ZoomMode::X);
        assert!(chart.y_window(AxisId::Right).is_none());
    }

    #[test]
    fn test_zoom_then_reset() {
        let mut chart = chart(&["a"], &[], ZoomMode::X);
        chart.zoom(0.5, 0.5);
        assert!(chart.view().is_zoomed());
        // y follows the visible rows
        let zoomed = chart.y_window(AxisId::Left).unwrap();
        assert!(zoomed.max < 9.0);
        chart.reset_zoom();
        assert!(!chart.view().is_zoomed());
    }

    #[test]
    fn test_xy_pan_pins_y() {
        let mut chart = chart(&["a"], &["b"], ZoomMode::XY);
        let before = chart.y_window(AxisId::Left).unwrap();
        chart.pan(0.0, 0.5);
        let after = chart.y_window(AxisId::Left).unwrap();
        assert!((after.min - (before.min + before.span() * 0.5)).abs() < 1e-9);
        assert!(chart.view().y_right.is_some());
    }

    // rendering (4 tests)

    #[test]
    fn test_render_png_dual_axis() {
        let png = chart(&["a"], &["b"], ZoomMode::X).render_png().unwrap();
        assert!(is_valid_png(&png));
    }

    #[test]
    fn test_extreme_values_still_render() {
        let rows = vec![
            vec![CellValue::Text("a".into()), CellValue::Number(-f64::MAX)],
            vec![CellValue::Text("b".into()), CellValue::Number(f64::MAX)],
        ];
        let data = Dataset::new("e.csv", vec!["t".into(), "v".into()], rows).unwrap();
        let sel = set_axes("t", vec!["v".into()], vec![]).unwrap();
        let config = build_chart(&data, &sel, &ColorPalette::category10(), ZoomMode::X).unwrap();
        let chart = Chart::create(config, RenderOptions::default());
        assert!(chart.y_window(AxisId::Left).unwrap().is_usable());
    }

    #[test]
    fn test_render_after_rejected_view_changes() {
        let mut chart = chart(&["a"], &["b"], ZoomMode::XY);
        chart.zoom(f64::NAN, 0.5);
        chart.pan(f64::INFINITY, f64::INFINITY);
        for _ in 0..20 {
            chart.pan(1e308, 1e308);
        }
        assert!(chart.view().x.is_usable());
        let png = chart.render_png().unwrap();
        assert!(is_valid_png(&png));
    }

    #[test]
    fn test_render_png_empty_selection() {
        let png = chart(&[], &[], ZoomMode::X).render_png().unwrap();
        assert!(is_valid_png(&png));
    }
}
