//! Design elements: the placeable items of the editor.
//!
//! There is one element type. Kind-specific data lives in [`Geometry`];
//! kind-specific snap behavior is looked up from [`crate::snap`] by the
//! element's [`SnapRule`], which is fixed at construction.

mod geometry;
mod overlay;
mod props;
mod snap_point;

pub use geometry::{ElementKind, Font, Geometry};
pub use overlay::{ElementStyle, Overlay, OverlayKind, Overlays, Rgba8};
pub use props::{fields, FieldSpec, FieldType, PropertyPanel, PropsContext, PropsError, MIXED};
pub use snap_point::SnapPoint;

use crate::snap::{self, AnchorSource, SnapRole, SnapRule};
use crate::viewport::Viewport;
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Handle to the editor an element is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EditorHandle(Uuid);

impl EditorHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EditorHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Construction options for [`DesignElement::create`].
#[derive(Debug, Clone, Default)]
pub struct ElementOptions {
    pub name: Option<String>,
    /// Translation in real coordinates.
    pub position: Point,
    /// Use the bounding-box anchors even for composite kinds.
    pub auto_snap: bool,
    /// Anchors for composite kinds without auto-snap, in local coordinates.
    pub manual_anchors: Vec<Point>,
    /// Decorative element: no overlays, no snap points.
    pub passive: bool,
    pub editor: Option<EditorHandle>,
    pub style: ElementStyle,
}

impl ElementOptions {
    pub fn at(position: Point) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn auto_snap(mut self) -> Self {
        self.auto_snap = true;
        self
    }

    pub fn manual_anchors(mut self, anchors: Vec<Point>) -> Self {
        self.manual_anchors = anchors;
        self
    }

    pub fn passive(mut self) -> Self {
        self.passive = true;
        self
    }

    pub fn editor(mut self, editor: EditorHandle) -> Self {
        self.editor = Some(editor);
        self
    }

    pub fn style(mut self, style: ElementStyle) -> Self {
        self.style = style;
        self
    }
}

/// A placeable, drawable item.
#[derive(Debug, Serialize, Deserialize)]
pub struct DesignElement {
    id: ElementId,
    /// Display name. Not guaranteed unique.
    pub name: String,
    pub geometry: Geometry,
    /// Translation in real coordinates.
    pub position: Point,
    /// Rotation in degrees, normalized to [0, 360).
    pub rotation: f64,
    pub visible: bool,
    passive: bool,
    is_pin: bool,
    highlighted: bool,
    highlighted_by_mouse: bool,
    highlighted_by_box: bool,
    selected: bool,
    #[serde(skip)]
    drag_anchor: Option<Point>,
    snap_rule: SnapRule,
    manual_anchors: Vec<Point>,
    snap_points: Vec<SnapPoint>,
    overlays: Option<Overlays>,
    style: ElementStyle,
    #[serde(skip)]
    editor: Option<EditorHandle>,
}

impl Clone for DesignElement {
    /// Deep copy of geometry, flags and snap positions under a fresh
    /// identifier (children included). The editor handle is not carried
    /// over; the receiver re-attaches the copy.
    fn clone(&self) -> Self {
        let mut copy = self.snapshot_clone();
        copy.regenerate_ids();
        copy
    }
}

impl DesignElement {
    /// Construct an element. Non-passive elements get invisible overlays and
    /// their snap-point set; call [`refresh`](Self::refresh) to project them.
    pub fn create(geometry: Geometry, options: ElementOptions) -> Self {
        let kind = geometry.kind();
        let id = Uuid::new_v4();
        let snap_rule = kind.snap_rule(options.auto_snap);
        let name = options
            .name
            .unwrap_or_else(|| kind.display_name().to_string());

        let mut element = Self {
            id,
            name,
            geometry,
            position: options.position,
            rotation: 0.0,
            visible: true,
            passive: options.passive,
            is_pin: kind == ElementKind::Pin,
            highlighted: false,
            highlighted_by_mouse: false,
            highlighted_by_box: false,
            selected: false,
            drag_anchor: None,
            snap_rule,
            manual_anchors: options.manual_anchors,
            snap_points: Vec::new(),
            overlays: None,
            style: options.style,
            editor: options.editor,
        };

        if !element.passive {
            element.overlays = Some(Overlays::new(&element.style));
            element.snap_points = element
                .local_anchors()
                .into_iter()
                .map(|(role, local)| SnapPoint::new(role, local, id, &element.style))
                .collect();
        }

        element
    }

    /// A passive element used as a child of a composite.
    pub fn passive_child(geometry: Geometry, position: Point) -> Self {
        Self::create(geometry, ElementOptions::at(position).passive())
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.geometry.kind()
    }

    pub fn is_passive(&self) -> bool {
        self.passive
    }

    pub fn is_pin(&self) -> bool {
        self.is_pin
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn is_highlighted_by_mouse(&self) -> bool {
        self.highlighted_by_mouse
    }

    pub fn is_highlighted_by_box(&self) -> bool {
        self.highlighted_by_box
    }

    pub fn snap_rule(&self) -> SnapRule {
        self.snap_rule
    }

    pub fn snap_points(&self) -> &[SnapPoint] {
        &self.snap_points
    }

    pub fn overlays(&self) -> Option<&Overlays> {
        self.overlays.as_ref()
    }

    pub fn editor(&self) -> Option<EditorHandle> {
        self.editor
    }

    pub fn attach(&mut self, editor: EditorHandle) {
        self.editor = Some(editor);
    }

    pub fn drag_anchor(&self) -> Option<Point> {
        self.drag_anchor
    }

    /// Set the selection flag. Returns whether it changed.
    pub(crate) fn set_selected(&mut self, selected: bool) -> bool {
        let changed = self.selected != selected;
        self.selected = selected;
        changed
    }

    /// Set the mouse/box highlight sources. Returns whether the combined
    /// highlight flag changed.
    pub(crate) fn set_highlight_sources(&mut self, by_mouse: bool, by_box: bool) -> bool {
        self.highlighted_by_mouse = by_mouse;
        self.highlighted_by_box = by_box;
        let highlighted = by_mouse || by_box;
        let changed = self.highlighted != highlighted;
        self.highlighted = highlighted;
        changed
    }

    /// Element-to-real transform: translation then rotation about the origin.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.position.to_vec2()) * Affine::rotate(self.rotation.to_radians())
    }

    /// Bounding box in local coordinates.
    pub fn local_bounds(&self) -> Rect {
        self.geometry.local_bounds()
    }

    /// Axis-aligned bounds in the parent's frame (real space for top-level
    /// elements).
    pub fn parent_bounds(&self) -> Rect {
        self.transform().transform_rect_bbox(self.local_bounds())
    }

    fn local_anchors(&self) -> Vec<(SnapRole, Point)> {
        let source = match (&self.geometry, self.snap_rule) {
            (_, SnapRule::Manual) => AnchorSource::Manual(&self.manual_anchors),
            (Geometry::Line { start, end }, SnapRule::Line) => AnchorSource::Segment {
                start: *start,
                end: *end,
            },
            _ => AnchorSource::Bounds(self.local_bounds()),
        };
        snap::anchors(self.snap_rule, source)
    }

    /// Recompute snap-point positions and overlays from the current local
    /// bounds, transform and viewport. Nothing else updates them.
    pub fn refresh(&mut self, viewport: &Viewport) {
        if self.passive {
            return;
        }

        let draw = viewport.draw_transform();
        let anchor_transform = if self.snap_rule.follows_rotation() {
            draw * self.transform()
        } else {
            draw * Affine::translate(self.position.to_vec2())
        };

        let anchors = self.local_anchors();
        for (point, (_, local)) in self.snap_points.iter_mut().zip(anchors) {
            point.local = local;
            point.position = anchor_transform * local;
        }

        let pad = self.style.overlay_padding / viewport.scale();
        let outline = self.local_bounds().inflate(pad, pad);
        let full = draw * self.transform();
        let corners = [
            full * Point::new(outline.x0, outline.y0),
            full * Point::new(outline.x1, outline.y0),
            full * Point::new(outline.x1, outline.y1),
            full * Point::new(outline.x0, outline.y1),
        ];
        if let Some(overlays) = &mut self.overlays {
            overlays.highlight.corners = corners;
            overlays.highlight.visible = self.highlighted && self.visible;
            overlays.selection.corners = corners;
            overlays.selection.visible = self.selected && self.visible;
        }
    }

    /// Rotate by one step in the direction of `delta`. Only selected elements
    /// rotate. Returns whether the rotation changed.
    pub fn rotate(&mut self, delta: f64, step: f64) -> bool {
        if !self.selected || delta == 0.0 || delta.is_nan() {
            return false;
        }
        self.rotation = (self.rotation + step.copysign(delta)).rem_euclid(360.0);
        true
    }

    /// Translate by a real-space delta.
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Start a drag at a real-space position.
    pub fn press(&mut self, real: Point) {
        self.drag_anchor = Some(real);
    }

    /// Move by the delta from the drag anchor to `real` and advance the
    /// anchor. Returns the applied delta, zero if no drag is active.
    pub fn drag_to(&mut self, real: Point) -> Vec2 {
        let Some(anchor) = self.drag_anchor else {
            return Vec2::ZERO;
        };
        let delta = real - anchor;
        self.position += delta;
        self.drag_anchor = Some(real);
        delta
    }

    pub fn release(&mut self) {
        self.drag_anchor = None;
    }

    /// Whether a real-space point hits this element.
    pub fn hit_test(&self, real: Point, tolerance: f64) -> bool {
        if !self.visible {
            return false;
        }
        let local = self.transform().inverse() * real;
        match &self.geometry {
            Geometry::Line { start, end } => {
                point_to_segment_dist(local, *start, *end) <= tolerance
            }
            _ => self.local_bounds().inflate(tolerance, tolerance).contains(local),
        }
    }

    /// Copy with fresh identifiers for the element and its children.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// Deep copy that keeps every identifier, used for history snapshots so
    /// restored elements stay addressable by id. The editor handle is
    /// dropped.
    pub(crate) fn snapshot_clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            geometry: self.geometry.snapshot_clone(),
            position: self.position,
            rotation: self.rotation,
            visible: self.visible,
            passive: self.passive,
            is_pin: self.is_pin,
            highlighted: self.highlighted,
            highlighted_by_mouse: self.highlighted_by_mouse,
            highlighted_by_box: self.highlighted_by_box,
            selected: self.selected,
            drag_anchor: self.drag_anchor,
            snap_rule: self.snap_rule,
            manual_anchors: self.manual_anchors.clone(),
            snap_points: self.snap_points.clone(),
            overlays: self.overlays.clone(),
            style: self.style,
            editor: None,
        }
    }

    fn regenerate_ids(&mut self) {
        self.id = Uuid::new_v4();
        let id = self.id;
        for point in &mut self.snap_points {
            point.set_owner(id);
        }
        if let Some(children) = self.geometry.children_mut() {
            for child in children {
                child.regenerate_ids();
            }
        }
    }

    /// Structural fingerprint used for change detection.
    ///
    /// Covers kind, name, geometry, transform, visibility and snap setup;
    /// ignores identifiers and transient interaction flags.
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash_structure(&mut hasher);
        hasher.finish()
    }

    pub(crate) fn hash_structure<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.geometry.hash_into(state);
        geometry::hash_point(self.position, state);
        self.rotation.to_bits().hash(state);
        self.visible.hash(state);
        self.passive.hash(state);
        self.snap_rule.hash(state);
        self.manual_anchors.len().hash(state);
        for anchor in &self.manual_anchors {
            geometry::hash_point(*anchor, state);
        }
    }
}

/// Distance from a point to a line segment (a->b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    (point - (a + seg * t)).hypot()
}
