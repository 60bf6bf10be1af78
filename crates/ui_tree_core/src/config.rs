use serde::{Deserialize, Serialize};

use crate::error::Result;

const DEFAULT_INDENT_WIDTH: f32 = 20.0;
const DEFAULT_DRAG_THRESHOLD: f32 = 8.0;
const DEFAULT_SCROLL_MARGIN: f32 = 20.0;
const DEFAULT_SCROLL_SPEED: f32 = 200.0;
const DEFAULT_ROW_HEIGHT: f32 = 28.0;

/// Tunables for indexing, drag recognition and autoscroll. All lengths are in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiTreeConfig {
    /// Horizontal offset per depth level. Half of it is the indent/outdent threshold.
    pub indent_width: f32,
    /// Pointer travel on either axis before a press turns into a drag.
    pub drag_threshold: f32,
    /// Distance from a viewport edge at which autoscroll kicks in.
    pub scroll_margin: f32,
    /// Autoscroll speed in pixels per second.
    pub scroll_speed: f32,
    /// Row height hosts use to lay out rows. The placer itself measures the dragged row.
    pub row_height: f32,
    pub draggable: bool,
}

impl Default for UiTreeConfig {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
            drag_threshold: DEFAULT_DRAG_THRESHOLD,
            scroll_margin: DEFAULT_SCROLL_MARGIN,
            scroll_speed: DEFAULT_SCROLL_SPEED,
            row_height: DEFAULT_ROW_HEIGHT,
            draggable: true,
        }
    }
}

impl UiTreeConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    pub fn indent_width(mut self, indent_width: f32) -> Self {
        self.indent_width = indent_width;
        self
    }

    pub fn drag_threshold(mut self, drag_threshold: f32) -> Self {
        self.drag_threshold = drag_threshold;
        self
    }

    pub fn scroll_margin(mut self, scroll_margin: f32) -> Self {
        self.scroll_margin = scroll_margin;
        self
    }

    pub fn scroll_speed(mut self, scroll_speed: f32) -> Self {
        self.scroll_speed = scroll_speed;
        self
    }

    pub fn row_height(mut self, row_height: f32) -> Self {
        self.row_height = row_height;
        self
    }

    pub fn draggable(mut self, draggable: bool) -> Self {
        self.draggable = draggable;
        self
    }

    /// Replace non-finite values, and values that must be positive, with defaults.
    ///
    /// The drag threshold and scroll margin may be zero.
    pub fn sanitized(mut self) -> Self {
        self.indent_width = positive_or(self.indent_width, DEFAULT_INDENT_WIDTH);
        self.scroll_speed = positive_or(self.scroll_speed, DEFAULT_SCROLL_SPEED);
        self.row_height = positive_or(self.row_height, DEFAULT_ROW_HEIGHT);
        self.drag_threshold = non_negative_or(self.drag_threshold, DEFAULT_DRAG_THRESHOLD);
        self.scroll_margin = non_negative_or(self.scroll_margin, DEFAULT_SCROLL_MARGIN);
        self
    }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

fn non_negative_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_widget_defaults() {
        let config = UiTreeConfig::default();
        assert_eq!(config.indent_width, 20.0);
        assert_eq!(config.drag_threshold, 8.0);
        assert_eq!(config.scroll_margin, 20.0);
        assert_eq!(config.scroll_speed, 200.0);
        assert!(config.draggable);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config = UiTreeConfig::from_json(r#"{ "indent_width": 16, "draggable": false }"#)
            .unwrap();
        assert_eq!(config.indent_width, 16.0);
        assert!(!config.draggable);
        assert_eq!(config.scroll_speed, 200.0);
    }

    #[test]
    fn sanitize_rejects_degenerate_values() {
        let config = UiTreeConfig::default()
            .indent_width(0.0)
            .scroll_speed(f32::NAN)
            .drag_threshold(-3.0)
            .scroll_margin(0.0)
            .sanitized();
        assert_eq!(config.indent_width, 20.0);
        assert_eq!(config.scroll_speed, 200.0);
        assert_eq!(config.drag_threshold, 8.0);
        assert_eq!(config.scroll_margin, 0.0);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = UiTreeConfig::from_json("{ indent_width: 1").unwrap_err();
        assert!(matches!(err, crate::TreeError::Config(_)));
    }
}
