use serde::{Deserialize, Serialize};

/// A position in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// On-screen geometry of the row that starts a drag, in content coordinates
/// (scrolling already accounted for).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RowRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    /// Height of the row itself.
    pub height: f32,
    /// Height of the row plus its rendered descendants.
    pub extent: f32,
}

/// Scroll state of the container the rows are drawn in.
pub trait Viewport {
    fn scroll_top(&self) -> f32;

    fn set_scroll_top(&mut self, scroll_top: f32);

    /// Total height of the scrollable content.
    fn scroll_height(&self) -> f32;

    /// Height of the visible window onto the content.
    fn client_height(&self) -> f32;

    fn max_scroll_top(&self) -> f32 {
        (self.scroll_height() - self.client_height()).max(0.0)
    }
}

/// A plain-value [`Viewport`], for hosts that track scrolling themselves and for tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewportMetrics {
    pub scroll_top: f32,
    pub scroll_height: f32,
    pub client_height: f32,
}

impl ViewportMetrics {
    pub fn new(scroll_top: f32, scroll_height: f32, client_height: f32) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }
}

impl Viewport for ViewportMetrics {
    fn scroll_top(&self) -> f32 {
        self.scroll_top
    }

    fn set_scroll_top(&mut self, scroll_top: f32) {
        self.scroll_top = scroll_top.clamp(0.0, self.max_scroll_top());
    }

    fn scroll_height(&self) -> f32 {
        self.scroll_height
    }

    fn client_height(&self) -> f32 {
        self.client_height
    }
}
