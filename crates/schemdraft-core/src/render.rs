//! Render system: the ordered element collection and its display layers.

use crate::config::EditorConfig;
use crate::element::{DesignElement, EditorHandle, ElementId, Overlay, SnapPoint};
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Vec2};

/// An entry in the elements layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawItem {
    /// Background grid. Always at index 0.
    Grid,
    Element(ElementId),
}

/// Ordered element collection plus the four display layers.
///
/// The collection keeps insertion order, which is the order history captures
/// and restores. The elements layer is the draw order: the grid first, then
/// elements with the most recently added one directly above the grid.
#[derive(Debug)]
pub struct RenderSystem {
    /// Elements in insertion order.
    elements: Vec<DesignElement>,
    /// Draw order of the element layer.
    element_layer: Vec<DrawItem>,
    /// Owners of the highlight overlays, in attach order.
    highlight_layer: Vec<ElementId>,
    /// Owners of the selection overlays, in attach order.
    selection_layer: Vec<ElementId>,
    /// Owners of snap markers, in attach order.
    marker_layer: Vec<ElementId>,
    /// Maximum number of elements.
    capacity: usize,
    highlighted_count: usize,
    selected_count: usize,
    /// Handle attached to every element added here.
    editor: EditorHandle,
}

impl RenderSystem {
    /// Create an empty render system.
    pub fn new(capacity: usize, editor: EditorHandle) -> Self {
        Self {
            elements: Vec::new(),
            element_layer: vec![DrawItem::Grid],
            highlight_layer: Vec::new(),
            selection_layer: Vec::new(),
            marker_layer: Vec::new(),
            capacity,
            highlighted_count: 0,
            selected_count: 0,
            editor,
        }
    }

    /// Create an empty render system sized from editor settings.
    pub fn from_config(config: &EditorConfig, editor: EditorHandle) -> Self {
        Self::new(config.max_elements, editor)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Maximum number of elements.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Handle of the editor that owns this system.
    pub fn editor(&self) -> EditorHandle {
        self.editor
    }

    /// Elements in insertion order.
    pub fn elements(&self) -> &[DesignElement] {
        &self.elements
    }

    /// Mutable access for transforms. Flags go through
    /// [`set_selected`](Self::set_selected) and
    /// [`set_highlight`](Self::set_highlight).
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut DesignElement> {
        self.elements.iter_mut()
    }

    /// The elements layer in draw order.
    pub fn element_layer(&self) -> &[DrawItem] {
        &self.element_layer
    }

    /// Get an element by id.
    pub fn get(&self, id: ElementId) -> Option<&DesignElement> {
        self.elements.iter().find(|e| e.id() == id)
    }

    /// Get a mutable element by id.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut DesignElement> {
        self.elements.iter_mut().find(|e| e.id() == id)
    }

    /// Ids of elements, in insertion order.
    pub fn ids(&self) -> Vec<ElementId> {
        self.elements.iter().map(DesignElement::id).collect()
    }

    /// Add an element. Returns false, leaving everything unchanged, when the
    /// collection is full or already holds an element with the same id.
    pub fn add(&mut self, mut element: DesignElement) -> bool {
        if self.elements.len() >= self.capacity {
            log::debug!(
                "Render system full ({} elements), dropping '{}'",
                self.capacity,
                element.name
            );
            return false;
        }
        if self.get(element.id()).is_some() {
            log::debug!("Element {} is already present, dropping '{}'", element.id(), element.name);
            return false;
        }

        let id = element.id();
        element.attach(self.editor);
        if element.is_highlighted() {
            self.highlighted_count += 1;
        }
        if element.is_selected() {
            self.selected_count += 1;
        }

        self.element_layer.insert(1, DrawItem::Element(id));
        if !element.is_passive() {
            self.highlight_layer.push(id);
            self.selection_layer.push(id);
            self.marker_layer.push(id);
        }
        self.elements.push(element);
        true
    }

    /// Remove the first element with the given name.
    ///
    /// Names are not unique; only the first match in insertion order is
    /// removed. Use [`remove_by_id`](Self::remove_by_id) to target a
    /// specific element.
    pub fn remove(&mut self, name: &str) -> Option<DesignElement> {
        let index = self.elements.iter().position(|e| e.name == name)?;
        Some(self.remove_at(index))
    }

    /// Remove an element by id.
    pub fn remove_by_id(&mut self, id: ElementId) -> Option<DesignElement> {
        let index = self.elements.iter().position(|e| e.id() == id)?;
        Some(self.remove_at(index))
    }

    fn remove_at(&mut self, index: usize) -> DesignElement {
        let id = self.elements[index].id();
        self.set_highlight(id, false, false);
        self.set_selected(id, false);

        self.element_layer.retain(|item| *item != DrawItem::Element(id));
        self.highlight_layer.retain(|owner| *owner != id);
        self.selection_layer.retain(|owner| *owner != id);
        self.marker_layer.retain(|owner| *owner != id);
        self.elements.remove(index)
    }

    /// Remove every element and detach every layer entry.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.element_layer.truncate(1);
        self.highlight_layer.clear();
        self.selection_layer.clear();
        self.marker_layer.clear();
        self.highlighted_count = 0;
        self.selected_count = 0;
    }

    /// Deep copies of every element, in insertion order. The copies keep
    /// their identifiers, so they can only come back through
    /// [`replace_all`](Self::replace_all).
    pub fn clone_all(&self) -> Vec<DesignElement> {
        self.elements.iter().map(DesignElement::snapshot_clone).collect()
    }

    /// Replace the whole collection, as done on history restore.
    ///
    /// Interaction flags of the incoming elements are cleared and the
    /// counters start from zero.
    pub fn replace_all(&mut self, elements: Vec<DesignElement>) {
        self.clear();
        for mut element in elements {
            element.set_selected(false);
            element.set_highlight_sources(false, false);
            element.release();
            self.add(element);
        }
    }

    /// Number of highlighted elements.
    pub fn highlighted_count(&self) -> usize {
        self.highlighted_count
    }

    /// Number of selected elements.
    pub fn selected_count(&self) -> usize {
        self.selected_count
    }

    /// Clear every interaction flag and zero the counters.
    pub fn reset_counters(&mut self) {
        for element in &mut self.elements {
            element.set_selected(false);
            element.set_highlight_sources(false, false);
        }
        self.highlighted_count = 0;
        self.selected_count = 0;
    }

    /// Set an element's highlight sources. Returns whether its combined
    /// highlight flag changed.
    pub fn set_highlight(&mut self, id: ElementId, by_mouse: bool, by_box: bool) -> bool {
        let Some(element) = self.elements.iter_mut().find(|e| e.id() == id) else {
            return false;
        };
        if !element.set_highlight_sources(by_mouse, by_box) {
            return false;
        }
        if element.is_highlighted() {
            self.highlighted_count += 1;
        } else {
            self.highlighted_count = self.highlighted_count.saturating_sub(1);
        }
        true
    }

    /// Set an element's selection flag. Returns whether it changed.
    pub fn set_selected(&mut self, id: ElementId, selected: bool) -> bool {
        let Some(element) = self.elements.iter_mut().find(|e| e.id() == id) else {
            return false;
        };
        if !element.set_selected(selected) {
            return false;
        }
        if selected {
            self.selected_count += 1;
        } else {
            self.selected_count = self.selected_count.saturating_sub(1);
        }
        true
    }

    /// Ids of selected elements, in insertion order.
    pub fn selected_ids(&self) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|e| e.is_selected())
            .map(DesignElement::id)
            .collect()
    }

    /// Refresh one element against the viewport.
    pub fn refresh(&mut self, id: ElementId, viewport: &Viewport) {
        if let Some(element) = self.get_mut(id) {
            element.refresh(viewport);
        }
    }

    /// Refresh every element against the viewport.
    pub fn refresh_all(&mut self, viewport: &Viewport) {
        for element in &mut self.elements {
            element.refresh(viewport);
        }
    }

    /// Topmost element hit by a real-space point.
    pub fn hit_test(&self, real: Point, tolerance: f64) -> Option<ElementId> {
        self.element_layer.iter().rev().find_map(|item| match item {
            DrawItem::Element(id) => self
                .get(*id)
                .filter(|e| e.hit_test(real, tolerance))
                .map(DesignElement::id),
            DrawItem::Grid => None,
        })
    }

    /// Ids of non-passive elements whose bounds lie entirely inside a
    /// real-space rectangle.
    pub fn elements_in_rect(&self, rect: Rect) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|e| !e.is_passive() && e.visible && rect.union(e.parent_bounds()) == rect)
            .map(DesignElement::id)
            .collect()
    }

    fn layer_elements<'a>(
        &'a self,
        layer: &'a [ElementId],
    ) -> impl Iterator<Item = &'a DesignElement> + 'a {
        layer.iter().filter_map(|id| self.get(*id))
    }

    /// Visible highlight overlays.
    pub fn highlight_overlays(&self) -> impl Iterator<Item = &Overlay> {
        self.layer_elements(&self.highlight_layer)
            .filter_map(|e| e.overlays())
            .map(|o| &o.highlight)
            .filter(|o| o.visible)
    }

    /// Visible selection overlays.
    pub fn selection_overlays(&self) -> impl Iterator<Item = &Overlay> {
        self.layer_elements(&self.selection_layer)
            .filter_map(|e| e.overlays())
            .map(|o| &o.selection)
            .filter(|o| o.visible)
    }

    /// Snap markers of visible elements.
    pub fn snap_markers(&self) -> impl Iterator<Item = &SnapPoint> {
        self.layer_elements(&self.marker_layer)
            .filter(|e| e.visible)
            .flat_map(|e| e.snap_points())
    }

    /// Translate every element by a real-space delta.
    pub fn translate_all(&mut self, delta: Vec2) {
        for element in &mut self.elements {
            element.translate(delta);
        }
    }

    /// Centre of the union of every element's bounds.
    pub fn combined_midpoint(&self) -> Option<Point> {
        self.elements
            .iter()
            .map(DesignElement::parent_bounds)
            .reduce(|a, b| a.union(b))
            .map(|bounds| bounds.center())
    }

    /// Move everything so the combined midpoint sits on the real origin.
    /// Returns the applied delta.
    pub fn recenter(&mut self) -> Vec2 {
        let Some(mid) = self.combined_midpoint() else {
            return Vec2::ZERO;
        };
        let delta = Point::ZERO - mid;
        self.translate_all(delta);
        delta
    }
}
