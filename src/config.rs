use crate::view::ZoomMode;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

/// Output settings shared by every chart rendered in a session.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub title: Option<String>,
    pub zoom_mode: ZoomMode,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            title: None,
            zoom_mode: ZoomMode::X,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RenderOptions::default();
        assert_eq!((options.width, options.height), (800, 600));
        assert_eq!(options.zoom_mode, ZoomMode::X);
        assert!(options.title.is_none());
    }
}
