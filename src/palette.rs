// Series colour palette

use serde::Serialize;

/// An sRGB colour with opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Rgba { r, g, b, a }
    }

    /// CSS `rgba(...)` notation, as expected by web chart configs.
    pub fn css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for Rgba {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.css())
    }
}

/// Line colour plus the translucent fill used for legend boxes and points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesColor {
    pub border_color: Rgba,
    pub background_color: Rgba,
}

impl SeriesColor {
    const fn solid(r: u8, g: u8, b: u8) -> Self {
        SeriesColor {
            border_color: Rgba::new(r, g, b, 1.0),
            background_color: Rgba::new(r, g, b, 0.5),
        }
    }
}

/// Ordered colours handed out to series one by one
#[derive(Debug, Clone)]
pub struct ColorPalette {
    colors: Vec<SeriesColor>,
}

impl ColorPalette {
    /// Category10 colours (D3-inspired)
    pub fn category10() -> Self {
        ColorPalette {
            colors: vec![
                SeriesColor::solid(31, 119, 180),
                SeriesColor::solid(255, 127, 14),
                SeriesColor::solid(44, 160, 44),
                SeriesColor::solid(214, 39, 40),
                SeriesColor::solid(148, 103, 189),
                SeriesColor::solid(140, 86, 75),
                SeriesColor::solid(227, 119, 194),
                SeriesColor::solid(127, 127, 127),
                SeriesColor::solid(188, 189, 34),
                SeriesColor::solid(23, 190, 207),
            ],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.colors.len()
    }

    /// Get color for a specific index (wraps around if index > palette size)
    pub fn get_color(&self, index: usize) -> SeriesColor {
        self.colors[index % self.colors.len()]
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::category10()
    }
}
