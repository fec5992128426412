//! Editor configuration.

use crate::element::Rgba8;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default depth of each history stack.
pub const DEFAULT_HISTORY_DEPTH: usize = 10;

/// Default cap on the number of elements one editor holds.
pub const DEFAULT_MAX_ELEMENTS: usize = 4096;

/// Default rotation step in degrees.
pub const DEFAULT_ROTATE_STEP: f64 = 10.0;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables for one editor instance.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum entries kept on each of the undo and redo stacks.
    pub history_depth: usize,
    /// Maximum number of elements in the render system.
    pub max_elements: usize,
    /// Half-width and half-height of the theater, in real units.
    pub theater_half_extents: Size,
    /// Initial viewport size in pixels.
    pub viewport_size: Size,
    /// Grid pitch used by grid snapping, in real units.
    pub grid_size: f64,
    /// Whether placements snap to the grid.
    pub snap_to_grid: bool,
    /// Rotation step in degrees.
    pub rotate_step: f64,
    /// Zoom limits.
    pub min_scale: f64,
    pub max_scale: f64,
    /// Hit tolerance for hover and selection, in real units.
    pub hit_tolerance: f64,
    /// Visual radius of snap markers, in pixels.
    pub snap_marker_radius: f64,
    pub snap_marker_color: Rgba8,
    pub snap_marker_opacity: f64,
    pub highlight_color: Rgba8,
    pub selection_color: Rgba8,
    /// Padding between an element's bounds and its overlays, in pixels.
    pub overlay_padding: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: DEFAULT_HISTORY_DEPTH,
            max_elements: DEFAULT_MAX_ELEMENTS,
            theater_half_extents: Size::new(1000.0, 1000.0),
            viewport_size: Size::new(800.0, 600.0),
            grid_size: 10.0,
            snap_to_grid: true,
            rotate_step: DEFAULT_ROTATE_STEP,
            min_scale: 0.1,
            max_scale: 20.0,
            hit_tolerance: 2.0,
            snap_marker_radius: 3.0,
            snap_marker_color: Rgba8::new(0, 160, 255, 255),
            snap_marker_opacity: 0.8,
            highlight_color: Rgba8::new(255, 200, 0, 255),
            selection_color: Rgba8::new(0, 120, 255, 255),
            overlay_padding: 4.0,
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Loading editor config from {}", path.as_ref().display());
        Self::from_json(&text)
    }

    /// Serialize the configuration to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_depth == 0 {
            return Err(invalid("history_depth", "must be at least 1"));
        }
        if self.max_elements == 0 {
            return Err(invalid("max_elements", "must be at least 1"));
        }
        if self.theater_half_extents.width <= 0.0 || self.theater_half_extents.height <= 0.0 {
            return Err(invalid("theater_half_extents", "must be positive"));
        }
        if self.viewport_size.width <= 0.0 || self.viewport_size.height <= 0.0 {
            return Err(invalid("viewport_size", "must be positive"));
        }
        if self.grid_size <= 0.0 {
            return Err(invalid("grid_size", "must be positive"));
        }
        if self.rotate_step <= 0.0 || self.rotate_step >= 360.0 {
            return Err(invalid("rotate_step", "must be in (0, 360)"));
        }
        if self.min_scale <= 0.0 || self.min_scale > self.max_scale {
            return Err(invalid("min_scale", "must be positive and not above max_scale"));
        }
        if !(0.0..=1.0).contains(&self.snap_marker_opacity) {
            return Err(invalid("snap_marker_opacity", "must be in [0, 1]"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = EditorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history_depth, 10);
        assert!((config.rotate_step - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            EditorConfig::from_json(r#"{ "history_depth": 3, "grid_size": 2.5 }"#).unwrap();
        assert_eq!(config.history_depth, 3);
        assert!((config.grid_size - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.max_elements, DEFAULT_MAX_ELEMENTS);
    }

    #[test]
    fn test_invalid_value_rejected() {
        let result = EditorConfig::from_json(r#"{ "history_depth": 0 }"#);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { field: "history_depth", .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        let result = EditorConfig::from_json("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "rotate_step": 15.0, "snap_to_grid": false }}"#).unwrap();

        let config = EditorConfig::load(file.path()).unwrap();
        assert!((config.rotate_step - 15.0).abs() < f64::EPSILON);
        assert!(!config.snap_to_grid);
    }

    #[test]
    fn test_load_missing_file() {
        let result = EditorConfig::load("/nonexistent/schemdraft.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_json_roundtrip_preserves_overrides() {
        let mut config = EditorConfig::default();
        config.max_elements = 12;
        let json = config.to_json().unwrap();
        assert_eq!(EditorConfig::from_json(&json).unwrap(), config);
    }
}
