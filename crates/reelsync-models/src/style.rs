//! Caption styling and output canvas definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which face of the configured font set a caption uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    #[default]
    Bold,
    Regular,
}

/// Vertical placement of a caption. Captions are always centered horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "anchor", rename_all = "snake_case")]
pub enum CaptionPosition {
    /// Centered on screen, shifted by `offset_y` pixels (negative moves up)
    Centered { offset_y: i32 },
    /// Fixed distance from the top edge
    Top { y: u32 },
    /// Fixed distance between the caption's bottom and the bottom edge
    Bottom { margin: u32 },
}

impl Default for CaptionPosition {
    fn default() -> Self {
        Self::Bottom { margin: 110 }
    }
}

/// Visual style of an overlaid caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CaptionStyle {
    #[serde(default)]
    pub font: FontWeight,
    /// Font size in pixels
    #[serde(default = "default_font_size")]
    pub size: u32,
    /// Text color (`white`, `#FFD700`, ...)
    #[serde(default = "default_color")]
    pub color: String,
    /// Outline width in pixels
    #[serde(default = "default_border_width")]
    pub border_width: u32,
    /// Drop shadow offset in pixels (0 disables the shadow)
    #[serde(default = "default_shadow")]
    pub shadow: u32,
    /// Background box opacity (0.0 disables the box)
    #[serde(default = "default_box_opacity")]
    pub box_opacity: f32,
    /// Padding around the text inside the box
    #[serde(default = "default_box_border")]
    pub box_border: u32,
    #[serde(default)]
    pub position: CaptionPosition,
}

fn default_font_size() -> u32 {
    44
}
fn default_color() -> String {
    "white".to_string()
}
fn default_border_width() -> u32 {
    5
}
fn default_shadow() -> u32 {
    4
}
fn default_box_opacity() -> f32 {
    0.65
}
fn default_box_border() -> u32 {
    22
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font: FontWeight::Bold,
            size: default_font_size(),
            color: default_color(),
            border_width: default_border_width(),
            shadow: default_shadow(),
            box_opacity: default_box_opacity(),
            box_border: default_box_border(),
            position: CaptionPosition::default(),
        }
    }
}

impl CaptionStyle {
    /// Large gold intro title.
    pub fn title() -> Self {
        Self {
            size: 105,
            color: "#FFD700".to_string(),
            border_width: 7,
            shadow: 5,
            box_opacity: 0.6,
            box_border: 26,
            position: CaptionPosition::Centered { offset_y: -110 },
            ..Default::default()
        }
    }

    /// Phase banner pinned to the top edge.
    pub fn banner() -> Self {
        Self {
            size: 56,
            color: "#FFD700".to_string(),
            box_opacity: 0.7,
            box_border: 18,
            position: CaptionPosition::Top { y: 8 },
            ..Default::default()
        }
    }

    /// Call-to-action line near the bottom edge.
    pub fn call_to_action() -> Self {
        Self {
            size: 44,
            box_opacity: 0.7,
            box_border: 18,
            position: CaptionPosition::Bottom { margin: 220 },
            ..Default::default()
        }
    }

    /// Builder-style setter for position.
    pub fn at(mut self, position: CaptionPosition) -> Self {
        self.position = position;
        self
    }

    /// Builder-style setter for color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

/// Vertical output canvas with a blurred fill behind the fitted footage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    /// Box blur radius of the background fill
    pub blur: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            blur: 12,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_defaults_fill_missing_fields() {
        let style: CaptionStyle = serde_json::from_str(r#"{"size": 32}"#).unwrap();
        assert_eq!(style.size, 32);
        assert_eq!(style.color, "white");
        assert_eq!(style.position, CaptionPosition::Bottom { margin: 110 });
    }

    #[test]
    fn test_position_tagging() {
        let pos: CaptionPosition =
            serde_json::from_str(r#"{"anchor": "centered", "offset_y": -80}"#).unwrap();
        assert_eq!(pos, CaptionPosition::Centered { offset_y: -80 });
    }

    #[test]
    fn test_presets() {
        assert!(CaptionStyle::title().size > CaptionStyle::banner().size);
        assert_eq!(CaptionStyle::banner().position, CaptionPosition::Top { y: 8 });
    }
}
