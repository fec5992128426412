//! Highlight/selection overlays and display colors.

use crate::config::EditorConfig;
use kurbo::{BezPath, Point};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert to a peniko color with an extra opacity factor applied.
    pub fn with_opacity(self, opacity: f64) -> Color {
        let alpha = (self.a as f64 * opacity.clamp(0.0, 1.0)) as u8;
        Color::from_rgba8(self.r, self.g, self.b, alpha)
    }
}

impl From<Color> for Rgba8 {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

impl From<Rgba8> for Color {
    fn from(color: Rgba8) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Visual parameters every non-passive element carries for its overlays and
/// snap markers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementStyle {
    pub marker_radius: f64,
    pub marker_color: Rgba8,
    pub marker_opacity: f64,
    pub highlight_color: Rgba8,
    pub selection_color: Rgba8,
    /// Gap between bounds and overlay outline, in pixels.
    pub overlay_padding: f64,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

impl ElementStyle {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            marker_radius: config.snap_marker_radius,
            marker_color: config.snap_marker_color,
            marker_opacity: config.snap_marker_opacity,
            highlight_color: config.highlight_color,
            selection_color: config.selection_color,
            overlay_padding: config.overlay_padding,
        }
    }
}

/// Which overlay layer an outline belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverlayKind {
    Highlight,
    Selection,
}

/// A closed outline around an element in drawn space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub kind: OverlayKind,
    /// Corners of the (possibly rotated) outline, clockwise from top-left.
    pub corners: [Point; 4],
    pub color: Rgba8,
    pub visible: bool,
}

impl Overlay {
    /// A new, invisible overlay with a degenerate outline.
    pub fn new(kind: OverlayKind, color: Rgba8) -> Self {
        Self {
            kind,
            corners: [Point::ZERO; 4],
            color,
            visible: false,
        }
    }

    /// Outline as a closed path for rendering.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.corners[0]);
        for corner in &self.corners[1..] {
            path.line_to(*corner);
        }
        path.close_path();
        path
    }
}

/// The pair of overlays owned by a non-passive element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlays {
    pub highlight: Overlay,
    pub selection: Overlay,
}

impl Overlays {
    pub fn new(style: &ElementStyle) -> Self {
        Self {
            highlight: Overlay::new(OverlayKind::Highlight, style.highlight_color),
            selection: Overlay::new(OverlayKind::Selection, style.selection_color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_overlays_invisible() {
        let overlays = Overlays::new(&ElementStyle::default());
        assert!(!overlays.highlight.visible);
        assert!(!overlays.selection.visible);
        assert_eq!(overlays.selection.kind, OverlayKind::Selection);
    }

    #[test]
    fn test_path_is_closed_quad() {
        let mut overlay = Overlay::new(OverlayKind::Highlight, Rgba8::new(0, 0, 0, 255));
        overlay.corners = [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 2.0),
            Point::new(0.0, 2.0),
        ];
        // move_to + 3 line_to + close_path
        assert_eq!(overlay.to_path().elements().len(), 5);
    }

    #[test]
    fn test_opacity_scales_alpha() {
        let color = Rgba8::new(10, 20, 30, 200).with_opacity(0.5);
        let rgba = color.to_rgba8();
        assert_eq!(rgba.a, 100);
        assert_eq!(rgba.r, 10);
    }
}
