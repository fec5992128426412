//! Kind discriminant and kind-specific geometry payloads.

use super::DesignElement;
use crate::snap::SnapRule;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Approximate glyph advance as a fraction of the font size.
const TEXT_ADVANCE: f64 = 0.6;

/// Every kind of placeable element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Circle,
    Rectangle,
    Line,
    Text,
    Group,
    Symbol,
    Pin,
    Via,
    Hole,
}

impl ElementKind {
    pub const ALL: [ElementKind; 9] = [
        ElementKind::Circle,
        ElementKind::Rectangle,
        ElementKind::Line,
        ElementKind::Text,
        ElementKind::Group,
        ElementKind::Symbol,
        ElementKind::Pin,
        ElementKind::Via,
        ElementKind::Hole,
    ];

    /// Display name for UI and default element names.
    pub fn display_name(self) -> &'static str {
        match self {
            ElementKind::Circle => "Circle",
            ElementKind::Rectangle => "Rectangle",
            ElementKind::Line => "Line",
            ElementKind::Text => "Text",
            ElementKind::Group => "Group",
            ElementKind::Symbol => "Symbol",
            ElementKind::Pin => "Pin",
            ElementKind::Via => "Via",
            ElementKind::Hole => "Hole",
        }
    }

    /// Kinds whose anchors are supplied by the caller unless auto-snap is on.
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            ElementKind::Group
                | ElementKind::Symbol
                | ElementKind::Pin
                | ElementKind::Via
                | ElementKind::Hole
        )
    }

    /// The anchor table this kind uses.
    pub fn snap_rule(self, auto_snap: bool) -> SnapRule {
        match self {
            ElementKind::Line => SnapRule::Line,
            ElementKind::Circle | ElementKind::Rectangle | ElementKind::Text => SnapRule::Box,
            _ if auto_snap => SnapRule::Box,
            _ => SnapRule::Manual,
        }
    }
}

/// Font used by text elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub family: String,
    /// Size in real units.
    pub size: f64,
    pub bold: bool,
}

impl Font {
    pub const DEFAULT_SIZE: f64 = 5.0;

    pub fn new(size: f64) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: "Monospace".to_string(),
            size: Self::DEFAULT_SIZE,
            bold: false,
        }
    }
}

/// Kind-specific payload. Coordinates are local to the owning element,
/// whose origin is its translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Geometry {
    Circle { radius: f64 },
    Rectangle { width: f64, height: f64 },
    Line { start: Point, end: Point },
    Text { content: String, font: Font },
    Group { children: Vec<DesignElement> },
    Symbol { reference: String, children: Vec<DesignElement> },
    /// Exactly two children: the lead line and the label text.
    Pin { number: String, children: Vec<DesignElement> },
    Via { pad_radius: f64, drill_radius: f64 },
    Hole { drill_radius: f64 },
}

impl Geometry {
    pub fn kind(&self) -> ElementKind {
        match self {
            Geometry::Circle { .. } => ElementKind::Circle,
            Geometry::Rectangle { .. } => ElementKind::Rectangle,
            Geometry::Line { .. } => ElementKind::Line,
            Geometry::Text { .. } => ElementKind::Text,
            Geometry::Group { .. } => ElementKind::Group,
            Geometry::Symbol { .. } => ElementKind::Symbol,
            Geometry::Pin { .. } => ElementKind::Pin,
            Geometry::Via { .. } => ElementKind::Via,
            Geometry::Hole { .. } => ElementKind::Hole,
        }
    }

    /// Default geometry for a freshly placed element of `kind`.
    pub fn default_for(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Circle => Geometry::Circle { radius: 10.0 },
            ElementKind::Rectangle => Geometry::Rectangle {
                width: 20.0,
                height: 10.0,
            },
            ElementKind::Line => Geometry::Line {
                start: Point::new(-10.0, 0.0),
                end: Point::new(10.0, 0.0),
            },
            ElementKind::Text => Geometry::Text {
                content: "Text".to_string(),
                font: Font::default(),
            },
            ElementKind::Group => Geometry::Group {
                children: Vec::new(),
            },
            ElementKind::Symbol => Geometry::Symbol {
                reference: "U?".to_string(),
                children: vec![DesignElement::passive_child(
                    Geometry::Rectangle {
                        width: 40.0,
                        height: 60.0,
                    },
                    Point::ZERO,
                )],
            },
            ElementKind::Pin => Geometry::pin("1", "~", 20.0),
            ElementKind::Via => Geometry::Via {
                pad_radius: 0.6,
                drill_radius: 0.3,
            },
            ElementKind::Hole => Geometry::Hole { drill_radius: 1.5 },
        }
    }

    /// Build a pin: a lead running from the origin along +x and a label
    /// just past its end.
    pub fn pin(number: &str, name: &str, length: f64) -> Self {
        let lead = DesignElement::passive_child(
            Geometry::Line {
                start: Point::ZERO,
                end: Point::new(length, 0.0),
            },
            Point::ZERO,
        );
        let label = DesignElement::passive_child(
            Geometry::Text {
                content: name.to_string(),
                font: Font::default(),
            },
            Point::new(length + Font::DEFAULT_SIZE, 0.0),
        );
        Geometry::Pin {
            number: number.to_string(),
            children: vec![lead, label],
        }
    }

    /// Child elements of composite kinds.
    pub fn children(&self) -> &[DesignElement] {
        match self {
            Geometry::Group { children }
            | Geometry::Symbol { children, .. }
            | Geometry::Pin { children, .. } => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<DesignElement>> {
        match self {
            Geometry::Group { children }
            | Geometry::Symbol { children, .. }
            | Geometry::Pin { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Deep copy that keeps the identifiers of child elements.
    pub(crate) fn snapshot_clone(&self) -> Self {
        fn keep(children: &[DesignElement]) -> Vec<DesignElement> {
            children.iter().map(DesignElement::snapshot_clone).collect()
        }
        match self {
            Geometry::Group { children } => Geometry::Group {
                children: keep(children),
            },
            Geometry::Symbol { reference, children } => Geometry::Symbol {
                reference: reference.clone(),
                children: keep(children),
            },
            Geometry::Pin { number, children } => Geometry::Pin {
                number: number.clone(),
                children: keep(children),
            },
            other => other.clone(),
        }
    }

    /// Bounding box in local coordinates.
    pub fn local_bounds(&self) -> Rect {
        match self {
            Geometry::Circle { radius } => centered(*radius, *radius),
            Geometry::Rectangle { width, height } => centered(width / 2.0, height / 2.0),
            Geometry::Line { start, end } => Rect::from_points(*start, *end),
            Geometry::Text { content, font } => {
                let chars = content.chars().count().max(1) as f64;
                centered(chars * font.size * TEXT_ADVANCE / 2.0, font.size / 2.0)
            }
            Geometry::Group { children }
            | Geometry::Symbol { children, .. }
            | Geometry::Pin { children, .. } => children
                .iter()
                .map(DesignElement::parent_bounds)
                .reduce(|a, b| a.union(b))
                .unwrap_or(Rect::ZERO),
            Geometry::Via { pad_radius, .. } => centered(*pad_radius, *pad_radius),
            Geometry::Hole { drill_radius } => centered(*drill_radius, *drill_radius),
        }
    }

    /// Translate local coordinates (used when re-centering composites).
    pub fn offset(&mut self, delta: Vec2) {
        match self {
            Geometry::Line { start, end } => {
                *start += delta;
                *end += delta;
            }
            Geometry::Group { children }
            | Geometry::Symbol { children, .. }
            | Geometry::Pin { children, .. } => {
                for child in children {
                    child.position += delta;
                }
            }
            _ => {}
        }
    }

    /// Feed the structural content into a hasher. Floats hash by bit pattern.
    pub(crate) fn hash_into<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Geometry::Circle { radius } => radius.to_bits().hash(state),
            Geometry::Rectangle { width, height } => {
                width.to_bits().hash(state);
                height.to_bits().hash(state);
            }
            Geometry::Line { start, end } => {
                hash_point(*start, state);
                hash_point(*end, state);
            }
            Geometry::Text { content, font } => {
                content.hash(state);
                font.family.hash(state);
                font.size.to_bits().hash(state);
                font.bold.hash(state);
            }
            Geometry::Group { children } => hash_children(children, state),
            Geometry::Symbol { reference, children } => {
                reference.hash(state);
                hash_children(children, state);
            }
            Geometry::Pin { number, children } => {
                number.hash(state);
                hash_children(children, state);
            }
            Geometry::Via {
                pad_radius,
                drill_radius,
            } => {
                pad_radius.to_bits().hash(state);
                drill_radius.to_bits().hash(state);
            }
            Geometry::Hole { drill_radius } => drill_radius.to_bits().hash(state),
        }
    }
}

fn centered(half_w: f64, half_h: f64) -> Rect {
    Rect::new(-half_w, -half_h, half_w, half_h)
}

pub(crate) fn hash_point<H: Hasher>(p: Point, state: &mut H) {
    p.x.to_bits().hash(state);
    p.y.to_bits().hash(state);
}

fn hash_children<H: Hasher>(children: &[DesignElement], state: &mut H) {
    children.len().hash(state);
    for child in children {
        child.hash_structure(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in ElementKind::ALL {
            assert_eq!(Geometry::default_for(kind).kind(), kind);
        }
    }

    #[test]
    fn test_snap_rule_table() {
        assert_eq!(ElementKind::Circle.snap_rule(false), SnapRule::Box);
        assert_eq!(ElementKind::Text.snap_rule(false), SnapRule::Box);
        assert_eq!(ElementKind::Line.snap_rule(true), SnapRule::Line);
        assert_eq!(ElementKind::Pin.snap_rule(false), SnapRule::Manual);
        assert_eq!(ElementKind::Symbol.snap_rule(true), SnapRule::Box);
    }

    #[test]
    fn test_local_bounds() {
        let rect = Geometry::Rectangle {
            width: 20.0,
            height: 10.0,
        };
        assert_eq!(rect.local_bounds(), Rect::new(-10.0, -5.0, 10.0, 5.0));

        let circle = Geometry::Circle { radius: 3.0 };
        assert_eq!(circle.local_bounds(), Rect::new(-3.0, -3.0, 3.0, 3.0));

        let line = Geometry::Line {
            start: Point::new(5.0, 5.0),
            end: Point::new(-5.0, 1.0),
        };
        assert_eq!(line.local_bounds(), Rect::new(-5.0, 1.0, 5.0, 5.0));
    }

    #[test]
    fn test_text_bounds_grow_with_content() {
        let short = Geometry::Text {
            content: "A".to_string(),
            font: Font::new(10.0),
        };
        let long = Geometry::Text {
            content: "ABCD".to_string(),
            font: Font::new(10.0),
        };
        assert!(long.local_bounds().width() > short.local_bounds().width());
        assert!((short.local_bounds().height() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_group_bounds_union_children() {
        let group = Geometry::Group {
            children: vec![
                DesignElement::passive_child(
                    Geometry::Circle { radius: 1.0 },
                    Point::new(-10.0, 0.0),
                ),
                DesignElement::passive_child(
                    Geometry::Circle { radius: 1.0 },
                    Point::new(10.0, 4.0),
                ),
            ],
        };
        assert_eq!(group.local_bounds(), Rect::new(-11.0, -1.0, 11.0, 5.0));
    }

    #[test]
    fn test_empty_group_bounds() {
        let group = Geometry::Group { children: Vec::new() };
        assert_eq!(group.local_bounds(), Rect::ZERO);
    }

    #[test]
    fn test_pin_has_lead_and_label() {
        let pin = Geometry::pin("3", "CLK", 15.0);
        let children = pin.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].kind(), ElementKind::Line);
        assert_eq!(children[1].kind(), ElementKind::Text);
    }

    #[test]
    fn test_offset_moves_children() {
        let mut group = Geometry::Group {
            children: vec![DesignElement::passive_child(
                Geometry::Circle { radius: 1.0 },
                Point::ZERO,
            )],
        };
        group.offset(Vec2::new(2.0, -3.0));
        assert_eq!(group.children()[0].position, Point::new(2.0, -3.0));
    }
}
