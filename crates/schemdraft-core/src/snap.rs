//! Snap geometry: anchor tables per shape kind and grid snapping.
//!
//! Everything here is a pure function of local geometry. Projection into
//! drawn space happens in the element module.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Semantic role of a snap point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapRole {
    TopLeft,
    TopCenter,
    TopRight,
    Left,
    Center,
    Right,
    BottomLeft,
    BottomCenter,
    BottomRight,
    Start,
    Middle,
    End,
    /// Caller-supplied anchor on a composite element.
    Manual,
}

impl SnapRole {
    /// The nine bounding-box roles, row by row from the top.
    pub const BOX: [SnapRole; 9] = [
        SnapRole::TopLeft,
        SnapRole::TopCenter,
        SnapRole::TopRight,
        SnapRole::Left,
        SnapRole::Center,
        SnapRole::Right,
        SnapRole::BottomLeft,
        SnapRole::BottomCenter,
        SnapRole::BottomRight,
    ];

    /// The three line roles.
    pub const LINE: [SnapRole; 3] = [SnapRole::Start, SnapRole::Middle, SnapRole::End];

    /// Unit offsets of a box role from the box centre, in half-extents.
    fn box_signs(self) -> Option<(f64, f64)> {
        match self {
            SnapRole::TopLeft => Some((-1.0, -1.0)),
            SnapRole::TopCenter => Some((0.0, -1.0)),
            SnapRole::TopRight => Some((1.0, -1.0)),
            SnapRole::Left => Some((-1.0, 0.0)),
            SnapRole::Center => Some((0.0, 0.0)),
            SnapRole::Right => Some((1.0, 0.0)),
            SnapRole::BottomLeft => Some((-1.0, 1.0)),
            SnapRole::BottomCenter => Some((0.0, 1.0)),
            SnapRole::BottomRight => Some((1.0, 1.0)),
            _ => None,
        }
    }
}

/// Which anchor table an element uses. Chosen once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapRule {
    /// Nine bounding-box anchors, projected through the full transform.
    Box,
    /// Start, middle and end of a segment.
    Line,
    /// Caller-supplied anchors, projected by translation only.
    Manual,
}

impl SnapRule {
    /// Whether anchors follow the element's rotation.
    pub fn follows_rotation(self) -> bool {
        !matches!(self, SnapRule::Manual)
    }
}

/// Local geometry needed to evaluate an anchor table.
#[derive(Debug, Clone, Copy)]
pub enum AnchorSource<'a> {
    Bounds(Rect),
    Segment { start: Point, end: Point },
    Manual(&'a [Point]),
}

/// Anchor function signature shared by every rule.
type AnchorFn = fn(AnchorSource<'_>) -> Vec<(SnapRole, Point)>;

/// Rule -> anchor function table.
const ANCHOR_TABLE: [(SnapRule, AnchorFn); 3] = [
    (SnapRule::Box, box_anchors_from),
    (SnapRule::Line, line_anchors_from),
    (SnapRule::Manual, manual_anchors_from),
];

/// Evaluate the anchor table for a rule.
pub fn anchors(rule: SnapRule, source: AnchorSource<'_>) -> Vec<(SnapRole, Point)> {
    ANCHOR_TABLE
        .iter()
        .find(|(r, _)| *r == rule)
        .map(|(_, f)| f(source))
        .unwrap_or_default()
}

/// The nine bounding-box anchors of a local rect.
pub fn box_anchors(bounds: Rect) -> Vec<(SnapRole, Point)> {
    let center = bounds.center();
    let half_w = bounds.width() / 2.0;
    let half_h = bounds.height() / 2.0;
    SnapRole::BOX
        .iter()
        .filter_map(|&role| {
            role.box_signs().map(|(sx, sy)| {
                (role, Point::new(center.x + sx * half_w, center.y + sy * half_h))
            })
        })
        .collect()
}

/// Start, middle and end anchors of a segment.
pub fn line_anchors(start: Point, end: Point) -> Vec<(SnapRole, Point)> {
    vec![
        (SnapRole::Start, start),
        (SnapRole::Middle, start.midpoint(end)),
        (SnapRole::End, end),
    ]
}

fn box_anchors_from(source: AnchorSource<'_>) -> Vec<(SnapRole, Point)> {
    match source {
        AnchorSource::Bounds(rect) => box_anchors(rect),
        AnchorSource::Segment { start, end } => box_anchors(Rect::from_points(start, end)),
        AnchorSource::Manual(points) => box_anchors(bounding_rect(points)),
    }
}

fn line_anchors_from(source: AnchorSource<'_>) -> Vec<(SnapRole, Point)> {
    match source {
        AnchorSource::Segment { start, end } => line_anchors(start, end),
        AnchorSource::Bounds(rect) => line_anchors(
            Point::new(rect.x0, rect.center().y),
            Point::new(rect.x1, rect.center().y),
        ),
        AnchorSource::Manual(points) => match (points.first(), points.last()) {
            (Some(&start), Some(&end)) => line_anchors(start, end),
            _ => Vec::new(),
        },
    }
}

fn manual_anchors_from(source: AnchorSource<'_>) -> Vec<(SnapRole, Point)> {
    match source {
        AnchorSource::Manual(points) => points.iter().map(|&p| (SnapRole::Manual, p)).collect(),
        _ => Vec::new(),
    }
}

fn bounding_rect(points: &[Point]) -> Rect {
    let mut iter = points.iter();
    let Some(&first) = iter.next() else {
        return Rect::ZERO;
    };
    iter.fold(Rect::from_points(first, first), |rect, &p| rect.union_pt(p))
}

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> Point {
    if grid_size <= 0.0 {
        return point;
    }
    Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    )
}

/// Index of the target closest to `point` within `threshold`, if any.
pub fn nearest_target(point: Point, targets: &[Point], threshold: f64) -> Option<usize> {
    let mut best: Option<usize> = None;
    let mut best_dist_sq = threshold * threshold;

    for (i, target) in targets.iter().enumerate() {
        let dist_sq = (point - *target).hypot2();
        if dist_sq <= best_dist_sq {
            best_dist_sq = dist_sq;
            best = Some(i);
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_anchor_offsets() {
        let anchors = box_anchors(Rect::new(-10.0, -5.0, 10.0, 5.0));
        let expected = [
            (SnapRole::TopLeft, Point::new(-10.0, -5.0)),
            (SnapRole::TopCenter, Point::new(0.0, -5.0)),
            (SnapRole::TopRight, Point::new(10.0, -5.0)),
            (SnapRole::Left, Point::new(-10.0, 0.0)),
            (SnapRole::Center, Point::new(0.0, 0.0)),
            (SnapRole::Right, Point::new(10.0, 0.0)),
            (SnapRole::BottomLeft, Point::new(-10.0, 5.0)),
            (SnapRole::BottomCenter, Point::new(0.0, 5.0)),
            (SnapRole::BottomRight, Point::new(10.0, 5.0)),
        ];
        assert_eq!(anchors, expected);
    }

    #[test]
    fn test_box_anchors_off_center_bounds() {
        let anchors = box_anchors(Rect::new(0.0, 0.0, 40.0, 20.0));
        assert_eq!(anchors[4], (SnapRole::Center, Point::new(20.0, 10.0)));
        assert_eq!(anchors[0], (SnapRole::TopLeft, Point::new(0.0, 0.0)));
        assert_eq!(anchors[8], (SnapRole::BottomRight, Point::new(40.0, 20.0)));
    }

    #[test]
    fn test_line_anchors() {
        let anchors = line_anchors(Point::new(0.0, 0.0), Point::new(30.0, -10.0));
        assert_eq!(anchors.len(), 3);
        assert_eq!(anchors[1], (SnapRole::Middle, Point::new(15.0, -5.0)));
    }

    #[test]
    fn test_table_dispatch() {
        let manual = [Point::new(1.0, 2.0), Point::new(3.0, 4.0)];
        assert_eq!(anchors(SnapRule::Box, AnchorSource::Bounds(Rect::ZERO)).len(), 9);
        assert_eq!(
            anchors(
                SnapRule::Line,
                AnchorSource::Segment {
                    start: Point::ZERO,
                    end: Point::new(2.0, 0.0)
                }
            )
            .len(),
            3
        );
        let pts = anchors(SnapRule::Manual, AnchorSource::Manual(&manual));
        assert_eq!(pts, vec![(SnapRole::Manual, manual[0]), (SnapRole::Manual, manual[1])]);
    }

    #[test]
    fn test_box_rule_over_manual_points() {
        let manual = [Point::new(-4.0, -2.0), Point::new(4.0, 2.0)];
        let pts = anchors(SnapRule::Box, AnchorSource::Manual(&manual));
        assert_eq!(pts[0].1, Point::new(-4.0, -2.0));
        assert_eq!(pts[4].1, Point::ZERO);
    }

    #[test]
    fn test_manual_rule_ignores_bounds() {
        let bounds = AnchorSource::Bounds(Rect::new(0.0, 0.0, 1.0, 1.0));
        assert!(anchors(SnapRule::Manual, bounds).is_empty());
    }

    #[test]
    fn test_snap_to_grid() {
        assert_eq!(snap_to_grid(Point::new(23.0, 47.0), 20.0), Point::new(20.0, 40.0));
        assert_eq!(snap_to_grid(Point::new(31.0, 51.0), 20.0), Point::new(40.0, 60.0));
        assert_eq!(snap_to_grid(Point::new(-14.0, 6.0), 10.0), Point::new(-10.0, 10.0));
    }

    #[test]
    fn test_snap_to_grid_ignores_bad_pitch() {
        assert_eq!(snap_to_grid(Point::new(3.3, 4.4), 0.0), Point::new(3.3, 4.4));
    }

    #[test]
    fn test_nearest_target() {
        let targets = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(100.0, 0.0)];
        assert_eq!(nearest_target(Point::new(8.0, 1.0), &targets, 5.0), Some(1));
        assert_eq!(nearest_target(Point::new(50.0, 0.0), &targets, 5.0), None);
    }

    #[test]
    fn test_follows_rotation() {
        assert!(SnapRule::Box.follows_rotation());
        assert!(SnapRule::Line.follows_rotation());
        assert!(!SnapRule::Manual.follows_rotation());
    }
}
