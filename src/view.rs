// Visible window of a chart and the pan/zoom helpers that move it.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Which axes pan and zoom act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ZoomMode {
    #[default]
    #[serde(rename = "x")]
    X,
    #[serde(rename = "xy")]
    XY,
}

impl FromStr for ZoomMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(ZoomMode::X),
            "xy" => Ok(ZoomMode::XY),
            other => Err(format!("unknown zoom mode '{}' (expected 'x' or 'xy')", other)),
        }
    }
}

impl fmt::Display for ZoomMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoomMode::X => f.write_str("x"),
            ZoomMode::XY => f.write_str("xy"),
        }
    }
}

/// Inclusive numeric window on one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub min: f64,
    pub max: f64,
}

impl Window {
    pub fn new(min: f64, max: f64) -> Self {
        Window { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Finite bounds with a positive span that survives `f64` rounding.
    pub fn is_usable(&self) -> bool {
        let magnitude = self.min.abs().max(self.max.abs()).max(1.0);
        self.min.is_finite()
            && self.max.is_finite()
            && self.span().is_finite()
            && self.span() > magnitude * f64::EPSILON * 16.0
    }

    fn shifted(&self, delta: f64) -> Self {
        Window::new(self.min + delta, self.max + delta)
    }

    // Keeps `anchor` (a fraction of the span) fixed on screen.
    fn scaled(&self, factor: f64, anchor: f64) -> Self {
        let pivot = self.min + self.span() * anchor;
        let span = self.span() * factor;
        let min = pivot - span * anchor;
        Window::new(min, min + span)
    }
}

/// Visible ranges of a live chart.
///
/// X is measured in row positions (category index). Y windows are only set
/// once the user pans or zooms in `xy` mode; `None` means autoscale to the
/// visible data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub mode: ZoomMode,
    pub x: Window,
    pub y_left: Option<Window>,
    pub y_right: Option<Window>,
    full_x: Window,
}

const MIN_ZOOM_FACTOR: f64 = 0.1;
const MAX_ZOOM_FACTOR: f64 = 10.0;
// X never narrows below one row or widens past this many full views.
const MIN_X_SPAN: f64 = 1.0;
const MAX_X_SPAN_VIEWS: f64 = 10.0;

impl ViewState {
    /// Whole dataset visible: half a category of margin on each side.
    pub fn full(point_count: usize, mode: ZoomMode) -> Self {
        let last = point_count.max(1) as f64 - 1.0;
        let full_x = Window::new(-0.5, last + 0.5);
        ViewState {
            mode,
            x: full_x,
            y_left: None,
            y_right: None,
            full_x,
        }
    }

    pub fn is_zoomed(&self) -> bool {
        self.x != self.full_x || self.y_left.is_some() || self.y_right.is_some()
    }

    /// Pan by a fraction of the visible span (positive moves right/up).
    ///
    /// `current_y` supplies the autoscaled Y windows so the first `xy` pan has
    /// something to shift. Non-finite deltas are ignored, and X stays on at
    /// least one row of data.
    pub fn pan(&mut self, dx: f64, dy: f64, current_y: (Option<Window>, Option<Window>)) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        let x = self.keep_on_data(self.x.shifted(dx * self.x.span()));
        self.x = accept(self.x, x);
        if self.mode == ZoomMode::XY && dy != 0.0 {
            let shift = |w: Window| accept(w, w.shifted(dy * w.span()));
            self.y_left = self.y_left.or(current_y.0).map(shift);
            self.y_right = self.y_right.or(current_y.1).map(shift);
        }
    }

    /// Zoom around `anchor` (0.0 = left/bottom edge, 1.0 = right/top edge).
    ///
    /// `factor` < 1 zooms in; it is clamped to [0.1, 10], and the X span to
    /// [one row, ten full views]. Non-finite arguments are ignored.
    pub fn zoom(&mut self, factor: f64, anchor: f64, current_y: (Option<Window>, Option<Window>)) {
        if !factor.is_finite() || !anchor.is_finite() {
            return;
        }
        let factor = factor.clamp(MIN_ZOOM_FACTOR, MAX_ZOOM_FACTOR);
        let anchor = anchor.clamp(0.0, 1.0);

        let span = self.x.span();
        let max_span = self.full_x.span() * MAX_X_SPAN_VIEWS;
        let x_factor = factor.clamp(MIN_X_SPAN / span, max_span / span);
        let x = self.keep_on_data(self.x.scaled(x_factor, anchor));
        self.x = accept(self.x, x);

        if self.mode == ZoomMode::XY {
            let scale = |w: Window| accept(w, w.scaled(factor, anchor));
            self.y_left = self.y_left.or(current_y.0).map(scale);
            self.y_right = self.y_right.or(current_y.1).map(scale);
        }
    }

    // Slide `window` back until it covers at least one row position.
    fn keep_on_data(&self, window: Window) -> Window {
        let first = self.full_x.min + 0.5;
        let last = self.full_x.max - 0.5;
        if window.min > last {
            window.shifted(last - window.min)
        } else if window.max < first {
            window.shifted(first - window.max)
        } else {
            window
        }
    }

    pub fn reset(&mut self) {
        self.x = self.full_x;
        self.y_left = None;
        self.y_right = None;
    }

    /// Row positions inside the visible X window, widened by one so lines reach the edge.
    pub fn visible_indices(&self, point_count: usize) -> std::ops::Range<usize> {
        if point_count == 0 {
            return 0..0;
        }
        let start = (self.x.min.floor() - 1.0).max(0.0) as usize;
        let end = ((self.x.max.ceil() + 2.0).max(0.0) as usize).min(point_count);
        start.min(end)..end
    }
}

fn accept(current: Window, next: Window) -> Window {
    if next.is_usable() {
        next
    } else {
        current
    }
}
