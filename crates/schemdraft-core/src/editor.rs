//! Editor facade: owns the viewport, render system and history, and turns
//! user gestures into element mutations.

use crate::config::{ConfigError, EditorConfig};
use crate::element::{
    DesignElement, EditorHandle, ElementId, ElementKind, ElementOptions, ElementStyle, Geometry,
    PropertyPanel, PropsContext, PropsError, SnapPoint,
};
use crate::history::HistoryEngine;
use crate::render::RenderSystem;
use crate::snap;
use crate::status::{StatusLine, StatusSink};
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Vec2};

/// The gesture in progress, if any.
#[derive(Debug, Clone, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// A line being drawn. The preview never enters the collection until
    /// the gesture finishes.
    Line { preview: DesignElement },
    /// Selected elements being dragged.
    Drag,
}

/// Runtime editor state for one design surface.
#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    /// View transform.
    pub viewport: Viewport,
    render: RenderSystem,
    history: HistoryEngine,
    status: StatusLine,
    handle: EditorHandle,
    style: ElementStyle,
    /// Kind created by [`place`](Self::place).
    placement: ElementKind,
    gesture: Gesture,
}

impl Default for Editor {
    fn default() -> Self {
        Self::build(EditorConfig::default())
    }
}

impl Editor {
    /// Create an editor with validated settings.
    pub fn new(config: EditorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EditorConfig) -> Self {
        let handle = EditorHandle::new();
        Self {
            viewport: Viewport::from_config(&config),
            render: RenderSystem::from_config(&config, handle),
            history: HistoryEngine::from_config(&config),
            status: StatusLine::new(),
            handle,
            style: ElementStyle::from_config(&config),
            placement: ElementKind::Rectangle,
            gesture: Gesture::Idle,
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn render(&self) -> &RenderSystem {
        &self.render
    }

    pub fn history(&self) -> &HistoryEngine {
        &self.history
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn handle(&self) -> EditorHandle {
        self.handle
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// The line preview of an unfinished line gesture.
    pub fn line_preview(&self) -> Option<&DesignElement> {
        match &self.gesture {
            Gesture::Line { preview } => Some(preview),
            _ => None,
        }
    }

    pub fn placement_kind(&self) -> ElementKind {
        self.placement
    }

    /// Change the placement kind. Any unfinished gesture is cancelled.
    pub fn set_placement_kind(&mut self, kind: ElementKind) {
        self.cancel_gesture();
        self.placement = kind;
    }

    /// Resize the viewport and re-project everything.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport.set_size(width, height);
        self.refresh_all();
    }

    /// Snap a real point to the grid when grid snapping is on.
    pub fn pos_snap_to_grid_point(&self, real: Point) -> Point {
        if self.config.snap_to_grid {
            snap::snap_to_grid(real, self.config.grid_size)
        } else {
            real
        }
    }

    /// Grid-snapped real position for an input position, if it lands inside
    /// the theater.
    fn placement_point(&self, listener: Point) -> Option<Point> {
        let Some(real) = self.viewport.placement_position(listener) else {
            log::debug!("Placement at {listener:?} is outside the theater");
            return None;
        };
        let snapped = self.pos_snap_to_grid_point(real);
        if !self.viewport.in_theater(snapped) {
            log::debug!("Snapped placement {snapped:?} is outside the theater");
            return None;
        }
        Some(snapped)
    }

    fn options(&self, kind: ElementKind, position: Point) -> ElementOptions {
        let options = ElementOptions::at(position).editor(self.handle).style(self.style);
        match kind {
            ElementKind::Pin | ElementKind::Via | ElementKind::Hole => {
                options.manual_anchors(vec![Point::ZERO])
            }
            ElementKind::Group | ElementKind::Symbol => options.auto_snap(),
            _ => options,
        }
    }

    fn insert(&mut self, element: DesignElement) -> Option<ElementId> {
        let id = element.id();
        if !self.render.add(element) {
            return None;
        }
        self.render.refresh(id, &self.viewport);
        Some(id)
    }

    /// Place a default element of the active kind at an input position.
    pub fn place(&mut self, listener: Point) -> Option<ElementId> {
        self.cancel_gesture();
        let position = self.placement_point(listener)?;
        let kind = self.placement;
        let element =
            DesignElement::create(Geometry::default_for(kind), self.options(kind, position));
        let id = self.insert(element)?;
        log::debug!("Placed {} at {position:?}", kind.display_name());
        self.record();
        Some(id)
    }

    /// Start a line at an input position.
    pub fn begin_line(&mut self, listener: Point) -> bool {
        self.cancel_gesture();
        let Some(position) = self.placement_point(listener) else {
            return false;
        };
        let mut preview = DesignElement::create(
            Geometry::Line {
                start: Point::ZERO,
                end: Point::ZERO,
            },
            self.options(ElementKind::Line, position),
        );
        preview.refresh(&self.viewport);
        self.gesture = Gesture::Line { preview };
        true
    }

    /// Move the free end of the line preview.
    pub fn update_line(&mut self, listener: Point) {
        let Some(end) = self.placement_point(listener) else {
            return;
        };
        if let Gesture::Line { preview } = &mut self.gesture {
            let local = (end - preview.position).to_point();
            if let Geometry::Line { end, .. } = &mut preview.geometry {
                *end = local;
            }
            preview.refresh(&self.viewport);
        }
    }

    /// Finish the line gesture. Zero-length lines are discarded.
    pub fn finish_line(&mut self, listener: Point) -> Option<ElementId> {
        self.update_line(listener);
        let preview = match std::mem::take(&mut self.gesture) {
            Gesture::Line { preview } => preview,
            other => {
                self.gesture = other;
                return None;
            }
        };
        if let Geometry::Line { start, end } = &preview.geometry {
            if start == end {
                log::debug!("Discarding zero-length line");
                return None;
            }
        }
        let id = self.insert(preview)?;
        self.record();
        Some(id)
    }

    /// Abandon the current gesture. A line preview is discarded without
    /// touching the collection or history; a drag is released in place.
    pub fn cancel_gesture(&mut self) {
        match std::mem::take(&mut self.gesture) {
            Gesture::Line { .. } => log::debug!("Line gesture cancelled"),
            Gesture::Drag => self.release(),
            Gesture::Idle => {}
        }
    }

    /// Press at an input position. Pressing an unselected element selects
    /// it alone; pressing any selected element starts dragging the whole
    /// selection. Pressing empty space clears the selection.
    pub fn press(&mut self, listener: Point) -> bool {
        self.cancel_gesture();
        let real = self.viewport.listener_to_real(listener);
        let Some(hit) = self.render.hit_test(real, self.config.hit_tolerance) else {
            self.clear_selection();
            return false;
        };

        if !self.render.get(hit).is_some_and(DesignElement::is_selected) {
            self.clear_selection();
            self.render.set_selected(hit, true);
        }
        for element in self.render.elements_mut().filter(|e| e.is_selected()) {
            element.press(real);
        }
        self.refresh_all();
        self.gesture = Gesture::Drag;
        true
    }

    /// Drag the selection to an input position. Overlays update on release.
    pub fn drag(&mut self, listener: Point) {
        if !matches!(self.gesture, Gesture::Drag) {
            return;
        }
        let real = self.viewport.listener_to_real(listener);
        for element in self.render.elements_mut().filter(|e| e.is_selected()) {
            element.drag_to(real);
        }
    }

    /// End a drag: refresh and record.
    pub fn release(&mut self) {
        if matches!(self.gesture, Gesture::Drag) {
            self.gesture = Gesture::Idle;
        }
        for element in self.render.elements_mut() {
            element.release();
        }
        self.refresh_all();
        self.record();
    }

    /// Rotate every selected element by one step in the direction of
    /// `delta`.
    pub fn rotate_selected(&mut self, delta: f64) -> bool {
        let step = self.config.rotate_step;
        let mut changed = false;
        for element in self.render.elements_mut() {
            changed |= element.rotate(delta, step);
        }
        if changed {
            self.refresh_all();
            self.record();
        }
        changed
    }

    /// Delete the selection. Returns the number of removed elements.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.render.selected_ids();
        let removed = ids
            .into_iter()
            .filter_map(|id| self.render.remove_by_id(id))
            .count();
        if removed > 0 {
            self.record();
        }
        removed
    }

    /// Duplicate the selection one grid step down-right. The copies become
    /// the selection.
    pub fn duplicate_selected(&mut self) -> Vec<ElementId> {
        let offset = Vec2::new(self.config.grid_size, self.config.grid_size);
        let mut copies = Vec::new();
        for id in self.render.selected_ids() {
            let Some(mut copy) = self.render.get(id).map(DesignElement::duplicate) else {
                continue;
            };
            copy.set_highlight_sources(false, false);
            copy.translate(offset);
            let copy_id = copy.id();
            self.render.set_selected(id, false);
            if self.render.add(copy) {
                copies.push(copy_id);
            } else {
                self.status.show("Element limit reached.");
                break;
            }
        }
        if !copies.is_empty() {
            self.refresh_all();
            self.record();
        }
        copies
    }

    /// Update the by-mouse highlight from the pointer position.
    pub fn hover(&mut self, listener: Point) -> Option<ElementId> {
        let real = self.viewport.listener_to_real(listener);
        let hit = self.render.hit_test(real, self.config.hit_tolerance);
        let states: Vec<(ElementId, bool)> = self
            .render
            .elements()
            .iter()
            .map(|e| (e.id(), e.is_highlighted_by_box()))
            .collect();
        for (id, by_box) in states {
            if self.render.set_highlight(id, Some(id) == hit, by_box) {
                self.render.refresh(id, &self.viewport);
            }
        }
        hit
    }

    /// Update the by-box highlight from a rubber-band rectangle given in
    /// input coordinates. Returns the number of boxed elements.
    pub fn box_highlight(&mut self, rect: Rect) -> usize {
        let real = Rect::from_points(
            self.viewport.listener_to_real(Point::new(rect.x0, rect.y0)),
            self.viewport.listener_to_real(Point::new(rect.x1, rect.y1)),
        );
        let inside = self.render.elements_in_rect(real);
        self.set_box_highlight(|id| inside.contains(&id));
        inside.len()
    }

    /// Drop every by-box highlight.
    pub fn clear_box_highlight(&mut self) {
        self.set_box_highlight(|_| false);
    }

    fn set_box_highlight(&mut self, boxed: impl Fn(ElementId) -> bool) {
        let states: Vec<(ElementId, bool)> = self
            .render
            .elements()
            .iter()
            .map(|e| (e.id(), e.is_highlighted_by_mouse()))
            .collect();
        for (id, by_mouse) in states {
            if self.render.set_highlight(id, by_mouse, boxed(id)) {
                self.render.refresh(id, &self.viewport);
            }
        }
    }

    /// Select every highlighted element. Returns the selection size.
    pub fn select_highlighted(&mut self) -> usize {
        let ids: Vec<ElementId> = self
            .render
            .elements()
            .iter()
            .filter(|e| e.is_highlighted())
            .map(DesignElement::id)
            .collect();
        for id in ids {
            self.render.set_selected(id, true);
        }
        self.refresh_all();
        self.render.selected_count()
    }

    /// Add one element to the selection.
    pub fn select(&mut self, id: ElementId) -> bool {
        let changed = self.render.set_selected(id, true);
        self.render.refresh(id, &self.viewport);
        changed
    }

    pub fn clear_selection(&mut self) {
        for id in self.render.selected_ids() {
            self.render.set_selected(id, false);
            self.render.refresh(id, &self.viewport);
        }
    }

    /// Set the zoom scale with centre compensation.
    pub fn zoom(&mut self, scale: f64) -> bool {
        let changed = self.viewport.set_scale(scale);
        if changed {
            self.refresh_all();
        }
        changed
    }

    /// Multiply the zoom scale with centre compensation.
    pub fn zoom_by(&mut self, factor: f64) -> bool {
        self.zoom(self.viewport.scale() * factor)
    }

    /// Pan the view by a pixel delta.
    pub fn pan(&mut self, delta: Vec2) {
        self.viewport.pan(delta);
        self.refresh_all();
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
        self.refresh_all();
    }

    pub fn fit_theater(&mut self, padding: f64) {
        self.viewport.fit_theater(padding);
        self.refresh_all();
    }

    /// Re-project every element and the line preview.
    pub fn refresh_all(&mut self) {
        self.render.refresh_all(&self.viewport);
        if let Gesture::Line { preview } = &mut self.gesture {
            preview.refresh(&self.viewport);
        }
    }

    /// Record the current collection into history.
    pub fn record(&mut self) -> bool {
        self.history.record(&self.render)
    }

    pub fn undo(&mut self) -> bool {
        self.gesture = Gesture::Idle;
        let undone = self.history.undo(&mut self.render, &mut self.status);
        self.refresh_all();
        undone
    }

    pub fn redo(&mut self) -> bool {
        self.gesture = Gesture::Idle;
        let redone = self.history.redo(&mut self.render, &mut self.status);
        self.refresh_all();
        redone
    }

    /// Replace the collection with loaded elements and start history from
    /// them, so undo never goes back past the load. Returns how many
    /// elements were accepted.
    pub fn load(&mut self, elements: Vec<DesignElement>) -> usize {
        self.gesture = Gesture::Idle;
        self.render.clear();
        let mut loaded = 0;
        for element in elements {
            if self.render.add(element) {
                loaded += 1;
            }
        }
        self.refresh_all();
        self.history.reset(&self.render);
        log::info!("Loaded {loaded} elements");
        loaded
    }

    /// Load the selection into a property panel. Returns how many elements
    /// were loaded.
    pub fn props_load(
        &self,
        context: PropsContext,
        panel: &mut PropertyPanel,
    ) -> Result<usize, PropsError> {
        panel.begin_load();
        let mut loaded = 0;
        for element in self.render.elements() {
            if element.props_load(context, panel)? {
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Apply a property panel to the selection, then refresh and record.
    pub fn props_apply(
        &mut self,
        context: PropsContext,
        panel: &PropertyPanel,
    ) -> Result<bool, PropsError> {
        let mut changed = false;
        for element in self.render.elements_mut() {
            changed |= element.props_apply(context, panel, &mut self.status)?;
        }
        if changed {
            self.refresh_all();
            self.record();
        }
        Ok(changed)
    }

    /// Report a message on the status line.
    pub fn show_status(&mut self, message: &str) {
        self.status.show(message);
    }

    /// The snap point whose marker lies nearest an input position, within
    /// the marker radius.
    pub fn snap_point_near(&self, listener: Point) -> Option<&SnapPoint> {
        let holder = self.viewport.listener_to_holder(listener);
        let markers: Vec<&SnapPoint> = self.render.snap_markers().collect();
        let positions: Vec<Point> = markers.iter().map(|p| p.position).collect();
        snap::nearest_target(holder, &positions, self.config.snap_marker_radius).map(|i| markers[i])
    }
}
