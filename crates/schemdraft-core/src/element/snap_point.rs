//! Snap points owned by design elements.

use super::overlay::{ElementStyle, Rgba8};
use super::ElementId;
use crate::snap::SnapRole;
use kurbo::{Circle, Point};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// A named anchor on an element.
///
/// `local` is relative to the owning element's origin; `position` is the
/// projected drawn-space position as of the element's last refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapPoint {
    pub role: SnapRole,
    pub local: Point,
    pub position: Point,
    pub radius: f64,
    pub color: Rgba8,
    pub opacity: f64,
    owner: ElementId,
}

impl SnapPoint {
    pub(crate) fn new(
        role: SnapRole,
        local: Point,
        owner: ElementId,
        style: &ElementStyle,
    ) -> Self {
        Self {
            role,
            local,
            position: local,
            radius: style.marker_radius,
            color: style.marker_color,
            opacity: style.marker_opacity,
            owner,
        }
    }

    /// Id of the element this point belongs to.
    pub fn owner(&self) -> ElementId {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: ElementId) {
        self.owner = owner;
    }

    /// Marker shape in drawn space.
    pub fn marker(&self) -> Circle {
        Circle::new(self.position, self.radius)
    }

    /// Marker color with opacity applied.
    pub fn marker_color(&self) -> Color {
        self.color.with_opacity(self.opacity)
    }
}
