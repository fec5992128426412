//! Viewport module for pan/zoom mapping between coordinate frames.
//!
//! Four frames are involved:
//!
//! - *listener*: input pixels, origin at the viewport's top-left corner;
//! - *holder*: the pannable pane, `listener - pan`;
//! - *real*: design space, origin at the theater centre, independent of
//!   pan and zoom;
//! - *drawn*: where a real point is drawn inside the holder,
//!   `real * scale + viewport_size / 2`.

use crate::config::EditorConfig;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Viewport manages the view transform for the editor surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    /// Pan translation of the holder pane, in pixels.
    pub pan: Vec2,
    /// Uniform zoom scale (1.0 = one pixel per real unit).
    scale: f64,
    /// Minimum allowed scale.
    pub min_scale: f64,
    /// Maximum allowed scale.
    pub max_scale: f64,
    /// Half-extents of the theater around the real origin.
    pub theater: Size,
    /// Size of the visible viewport in pixels.
    pub size: Size,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

impl Viewport {
    /// Create a viewport of the given pixel size with a theater of the
    /// given half-extents.
    pub fn new(size: Size, theater: Size) -> Self {
        Self {
            pan: Vec2::ZERO,
            scale: 1.0,
            min_scale: 0.1,
            max_scale: 20.0,
            theater,
            size,
        }
    }

    /// Create a viewport from editor settings.
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            ..Self::new(config.viewport_size, config.theater_half_extents)
        }
    }

    /// Current zoom scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Set the viewport pixel size (window resize).
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.size = Size::new(width, height);
    }

    /// Offset from the holder origin to the drawn position of the real origin.
    fn center_offset(&self) -> Vec2 {
        Vec2::new(self.size.width / 2.0, self.size.height / 2.0)
    }

    pub fn listener_to_holder(&self, pos: Point) -> Point {
        pos - self.pan
    }

    pub fn holder_to_listener(&self, pos: Point) -> Point {
        pos + self.pan
    }

    /// Convert a holder-space point to real coordinates.
    pub fn holder_to_real(&self, pos: Point) -> Point {
        let centered = pos - self.center_offset();
        Point::new(centered.x / self.scale, centered.y / self.scale)
    }

    /// Convert an input position straight to real coordinates.
    pub fn listener_to_real(&self, pos: Point) -> Point {
        self.holder_to_real(self.listener_to_holder(pos))
    }

    /// Convert a real point to the pixel where it appears on screen.
    pub fn real_to_listener(&self, pos: Point) -> Point {
        self.holder_to_listener(self.compute_draw_pos(pos))
    }

    /// Drawn position of a real point inside the holder.
    pub fn compute_draw_pos(&self, real: Point) -> Point {
        Point::new(real.x * self.scale, real.y * self.scale) + self.center_offset()
    }

    /// Affine transform from real space to drawn space.
    pub fn draw_transform(&self) -> Affine {
        Affine::translate(self.center_offset()) * Affine::scale(self.scale)
    }

    /// Real coordinate at the centre of the current view.
    pub fn real_center(&self) -> Point {
        let center = Point::new(self.size.width / 2.0, self.size.height / 2.0);
        self.listener_to_real(center)
    }

    /// Visible area in real coordinates.
    pub fn visible_real_rect(&self) -> Rect {
        Rect::from_points(
            self.listener_to_real(Point::ZERO),
            self.listener_to_real(Point::new(self.size.width, self.size.height)),
        )
    }

    /// Pan the holder by a delta in pixels.
    pub fn pan(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Change the scale, compensating the pan so that the real point at the
    /// visual centre stays put.
    ///
    /// Returns false when the clamped scale equals the current one.
    pub fn set_scale(&mut self, scale: f64) -> bool {
        let new_scale = scale.clamp(self.min_scale, self.max_scale);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return false;
        }

        let center = self.real_center();
        self.pan -= center.to_vec2() * (new_scale - self.scale);
        self.scale = new_scale;
        true
    }

    /// Multiply the scale by a factor, with compensation.
    pub fn zoom_by(&mut self, factor: f64) -> bool {
        self.set_scale(self.scale * factor)
    }

    /// Reset pan and zoom so the real origin sits in the middle at 100%.
    pub fn reset(&mut self) {
        self.pan = Vec2::ZERO;
        self.scale = 1.0;
    }

    /// Whether a real point lies strictly inside the theater.
    pub fn in_theater(&self, real: Point) -> bool {
        real.x > -self.theater.width
            && real.x < self.theater.width
            && real.y > -self.theater.height
            && real.y < self.theater.height
    }

    /// Real position for a drop at the given input position, or `None` if
    /// it falls outside the theater.
    pub fn placement_position(&self, listener: Point) -> Option<Point> {
        let real = self.listener_to_real(listener);
        self.in_theater(real).then_some(real)
    }

    /// Fit the whole theater into the viewport with some padding.
    pub fn fit_theater(&mut self, padding: f64) {
        let available = Size::new(
            (self.size.width - padding * 2.0).max(1.0),
            (self.size.height - padding * 2.0).max(1.0),
        );
        let scale_x = available.width / (self.theater.width * 2.0);
        let scale_y = available.height / (self.theater.height * 2.0);
        self.scale = scale_x.min(scale_y).clamp(self.min_scale, self.max_scale);
        self.pan = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(Size::new(800.0, 600.0), Size::new(500.0, 500.0))
    }

    fn assert_point_eq(a: Point, b: Point) {
        assert!((a.x - b.x).abs() < 1e-9, "{a:?} != {b:?}");
        assert!((a.y - b.y).abs() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_center_maps_to_origin() {
        let vp = viewport();
        assert_point_eq(vp.listener_to_real(Point::new(400.0, 300.0)), Point::ZERO);
        assert_point_eq(vp.real_center(), Point::ZERO);
    }

    #[test]
    fn test_holder_to_real_with_pan_and_zoom() {
        let mut vp = viewport();
        vp.pan = Vec2::new(50.0, -20.0);
        vp.scale = 2.0;

        let holder = vp.listener_to_holder(Point::new(450.0, 280.0));
        assert_point_eq(holder, Point::new(400.0, 300.0));
        assert_point_eq(vp.holder_to_real(Point::new(420.0, 310.0)), Point::new(10.0, 5.0));
    }

    #[test]
    fn test_compute_draw_pos() {
        let mut vp = viewport();
        vp.scale = 1.5;
        let drawn = vp.compute_draw_pos(Point::new(10.0, -10.0));
        assert_point_eq(drawn, Point::new(415.0, 285.0));
        assert_point_eq(vp.draw_transform() * Point::new(10.0, -10.0), drawn);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut vp = viewport();
        vp.pan = Vec2::new(30.0, -20.0);
        vp.scale = 1.5;

        let original = Point::new(123.0, 456.0);
        let real = vp.listener_to_real(original);
        assert_point_eq(vp.real_to_listener(real), original);
    }

    #[test]
    fn test_zoom_keeps_center_stable() {
        let mut vp = viewport();
        let center_pixel = Point::new(400.0, 300.0);
        assert_point_eq(vp.listener_to_real(center_pixel), Point::ZERO);

        assert!(vp.set_scale(2.0));
        assert_point_eq(vp.listener_to_real(center_pixel), Point::ZERO);
    }

    #[test]
    fn test_zoom_keeps_panned_center_stable() {
        let mut vp = viewport();
        vp.pan(Vec2::new(-120.0, 75.0));
        let before = vp.real_center();

        vp.set_scale(3.5);
        assert_point_eq(vp.real_center(), before);

        vp.zoom_by(0.25);
        assert_point_eq(vp.real_center(), before);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut vp = viewport();
        vp.set_scale(0.0001);
        assert!((vp.scale() - vp.min_scale).abs() < f64::EPSILON);

        vp.set_scale(1000.0);
        assert!((vp.scale() - vp.max_scale).abs() < f64::EPSILON);
        assert!(!vp.set_scale(1000.0));
    }

    #[test]
    fn test_placement_inside_theater() {
        let vp = viewport();
        let real = vp.placement_position(Point::new(410.0, 290.0));
        assert_point_eq(real.unwrap(), Point::new(10.0, -10.0));
    }

    #[test]
    fn test_placement_outside_theater_rejected() {
        let mut vp = viewport();
        vp.scale = 0.5;
        // 400 px right of centre at half scale is 800 real units.
        assert!(vp.placement_position(Point::new(800.0, 300.0)).is_none());
    }

    #[test]
    fn test_theater_boundary_is_exclusive() {
        let vp = viewport();
        assert!(!vp.in_theater(Point::new(500.0, 0.0)));
        assert!(!vp.in_theater(Point::new(0.0, -500.0)));
        assert!(vp.in_theater(Point::new(499.999, -499.999)));
    }

    #[test]
    fn test_fit_theater() {
        let mut vp = viewport();
        vp.pan(Vec2::new(10.0, 10.0));
        vp.fit_theater(50.0);
        // 500 px of vertical room for 1000 real units.
        assert!((vp.scale() - 0.5).abs() < 1e-9);
        assert_eq!(vp.pan, Vec2::ZERO);
    }

    #[test]
    fn test_visible_rect() {
        let vp = viewport();
        let rect = vp.visible_real_rect();
        assert_point_eq(Point::new(rect.x0, rect.y0), Point::new(-400.0, -300.0));
        assert_point_eq(Point::new(rect.x1, rect.y1), Point::new(400.0, 300.0));
    }
}
