//! Bounded undo/redo history over whole-collection snapshots.
//!
//! The top of the undo stack is always the most recently recorded state.
//! Undo drops it and restores the entry below, or the base snapshot once the
//! stack runs dry. The base holds the state that precedes the oldest entry
//! still retained, so eviction never loses the ability to go back one step
//! past the retained entries.

use crate::config::EditorConfig;
use crate::element::DesignElement;
use crate::render::RenderSystem;
use crate::status::StatusSink;
use std::collections::VecDeque;

/// Order-sensitive fingerprint of an element sequence.
pub fn state_hash(elements: &[DesignElement]) -> u64 {
    elements
        .iter()
        .fold(1u64, |h, e| h.wrapping_mul(31).wrapping_add(e.state_hash()))
}

/// Immutable deep copy of the element collection.
#[derive(Debug)]
pub struct HistorySnapshot {
    elements: Vec<DesignElement>,
    hash: u64,
}

impl Clone for HistorySnapshot {
    fn clone(&self) -> Self {
        Self {
            elements: self.elements.iter().map(DesignElement::snapshot_clone).collect(),
            hash: self.hash,
        }
    }
}

impl HistorySnapshot {
    /// Capture the current collection of a render system.
    pub fn capture(render: &RenderSystem) -> Self {
        let elements = render.clone_all();
        let hash = state_hash(&elements);
        Self { elements, hash }
    }

    /// Snapshot of an empty collection.
    pub fn empty() -> Self {
        Self {
            elements: Vec::new(),
            hash: state_hash(&[]),
        }
    }

    pub fn elements(&self) -> &[DesignElement] {
        &self.elements
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn restore(&self, render: &mut RenderSystem) {
        render.replace_all(self.elements.iter().map(DesignElement::snapshot_clone).collect());
    }
}

#[derive(Debug)]
pub struct HistoryEngine {
    undo_stack: VecDeque<HistorySnapshot>,
    redo_stack: VecDeque<HistorySnapshot>,
    max_depth: usize,
    /// Hash of the last recorded or restored state. `None` until the first
    /// record on an engine built over an empty collection.
    last_hash: Option<u64>,
    base: HistorySnapshot,
}

impl HistoryEngine {
    /// Create an engine whose starting state is the empty collection.
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(max_depth),
            redo_stack: VecDeque::with_capacity(max_depth),
            max_depth: max_depth.max(1),
            last_hash: None,
            base: HistorySnapshot::empty(),
        }
    }

    /// Create an engine whose starting state is the current collection.
    /// Undoing past the first record restores it.
    pub fn with_base(max_depth: usize, render: &RenderSystem) -> Self {
        let mut engine = Self::new(max_depth);
        engine.reset(render);
        engine
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.history_depth)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Hash of the most recently recorded or restored state.
    pub fn last_hash(&self) -> Option<u64> {
        self.last_hash
    }

    /// Snapshots on the undo stack, oldest first.
    pub fn undo_entries(&self) -> impl Iterator<Item = &HistorySnapshot> {
        self.undo_stack.iter()
    }

    /// The state preceding the oldest retained undo entry.
    pub fn base(&self) -> &HistorySnapshot {
        &self.base
    }

    /// Capture the current collection without recording it.
    pub fn capture(&self, render: &RenderSystem) -> HistorySnapshot {
        HistorySnapshot::capture(render)
    }

    /// Forget all history and treat the current collection as the starting
    /// state.
    pub fn reset(&mut self, render: &RenderSystem) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.base = HistorySnapshot::capture(render);
        self.last_hash = Some(self.base.hash);
    }

    /// Record the current collection if it differs from the last recorded
    /// state. Returns whether a snapshot was pushed.
    pub fn record(&mut self, render: &RenderSystem) -> bool {
        let snapshot = HistorySnapshot::capture(render);
        if self.last_hash == Some(snapshot.hash) {
            return false;
        }

        self.last_hash = Some(snapshot.hash);
        self.push_undo(snapshot);
        self.redo_stack.clear();
        log::debug!("History recorded ({} undo entries)", self.undo_stack.len());
        true
    }

    fn push_undo(&mut self, snapshot: HistorySnapshot) {
        if self.undo_stack.len() >= self.max_depth {
            if let Some(evicted) = self.undo_stack.pop_front() {
                self.base = evicted;
            }
        }
        self.undo_stack.push_back(snapshot);
    }

    fn push_redo(&mut self, snapshot: HistorySnapshot) {
        if self.redo_stack.len() >= self.max_depth {
            self.redo_stack.pop_front();
        }
        self.redo_stack.push_back(snapshot);
    }

    /// Step back one recorded state.
    ///
    /// When the live collection has changes that were never recorded, the
    /// most recent recorded state is restored instead and stays on the
    /// stack.
    pub fn undo(&mut self, render: &mut RenderSystem, status: &mut dyn StatusSink) -> bool {
        if self.undo_stack.is_empty() {
            status.show("Nothing to undo.");
            return false;
        }

        let live = HistorySnapshot::capture(render);
        let unrecorded = self.last_hash != Some(live.hash);
        self.push_redo(live);
        if !unrecorded {
            self.undo_stack.pop_back();
        }

        let target = self.undo_stack.back().unwrap_or(&self.base);
        target.restore(render);
        self.last_hash = Some(target.hash);
        render.reset_counters();
        log::debug!(
            "Undo{}: {} undo / {} redo entries",
            if unrecorded { " of unrecorded changes" } else { "" },
            self.undo_stack.len(),
            self.redo_stack.len()
        );
        true
    }

    /// Re-apply the most recently undone state.
    pub fn redo(&mut self, render: &mut RenderSystem, status: &mut dyn StatusSink) -> bool {
        let Some(snapshot) = self.redo_stack.pop_back() else {
            status.show("Nothing to redo.");
            return false;
        };

        snapshot.restore(render);
        self.last_hash = Some(snapshot.hash);
        render.reset_counters();
        self.push_undo(snapshot);
        log::debug!(
            "Redo: {} undo / {} redo entries",
            self.undo_stack.len(),
            self.redo_stack.len()
        );
        true
    }

    /// Drop every entry, keeping the current base.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{EditorHandle, ElementOptions, Geometry};
    use crate::status::StatusLine;
    use kurbo::{Point, Vec2};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn render() -> RenderSystem {
        RenderSystem::new(100, EditorHandle::new())
    }

    fn circle(name: &str) -> DesignElement {
        DesignElement::create(
            Geometry::Circle { radius: 5.0 },
            ElementOptions::default().named(name),
        )
    }

    fn names(render: &RenderSystem) -> Vec<String> {
        render.elements().iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn test_undo_on_fresh_engine() {
        init();
        let mut history = HistoryEngine::new(10);
        let mut render = render();
        render.add(circle("A"));
        let mut status = StatusLine::new();

        assert!(!history.undo(&mut render, &mut status));
        assert_eq!(status.message(), Some("Nothing to undo."));
        assert_eq!(names(&render), ["A"]);
    }

    #[test]
    fn test_redo_on_fresh_engine() {
        let mut history = HistoryEngine::new(10);
        let mut render = render();
        let mut status = StatusLine::new();

        assert!(!history.redo(&mut render, &mut status));
        assert_eq!(status.message(), Some("Nothing to redo."));
    }

    #[test]
    fn test_undo_redo_restores_collections() {
        init();
        let mut history = HistoryEngine::new(10);
        let mut render = render();
        let mut status = StatusLine::new();

        let a = circle("A");
        let id_a = a.id();
        render.add(a);
        assert!(history.record(&render));
        render.add(circle("B"));
        assert!(history.record(&render));

        assert!(history.undo(&mut render, &mut status));
        assert_eq!(names(&render), ["A"]);
        assert_eq!(render.ids(), vec![id_a]);

        assert!(history.redo(&mut render, &mut status));
        assert_eq!(names(&render), ["A", "B"]);
        assert_eq!(history.undo_len(), 2);
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn test_undo_to_base() {
        let mut history = HistoryEngine::new(10);
        let mut render = render();
        let mut status = StatusLine::new();

        render.add(circle("A"));
        history.record(&render);
        assert!(history.undo(&mut render, &mut status));
        assert!(render.is_empty());
        assert!(!history.undo(&mut render, &mut status));
    }

    #[test]
    fn test_eviction_keeps_newest() {
        let mut history = HistoryEngine::new(10);
        let mut render = render();
        let element = circle("A");
        let id = element.id();
        render.add(element);

        let mut hashes = Vec::new();
        for i in 1..=11 {
            render.get_mut(id).unwrap().position = Point::new(i as f64, 0.0);
            assert!(history.record(&render));
            hashes.push(state_hash(render.elements()));
        }

        assert_eq!(history.undo_len(), 10);
        let kept: Vec<u64> = history.undo_entries().map(HistorySnapshot::hash).collect();
        assert_eq!(kept, hashes[1..]);
        assert_eq!(history.base().hash(), hashes[0]);
    }

    #[test]
    fn test_record_dedup() {
        let mut history = HistoryEngine::new(10);
        let mut render = render();
        render.add(circle("A"));

        assert!(history.record(&render));
        assert!(!history.record(&render));
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn test_record_ignores_selection() {
        let mut history = HistoryEngine::new(10);
        let mut render = render();
        let a = circle("A");
        let id = a.id();
        render.add(a);
        history.record(&render);

        render.set_selected(id, true);
        assert!(!history.record(&render));
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = HistoryEngine::new(10);
        let mut render = render();
        let mut status = StatusLine::new();

        render.add(circle("A"));
        history.record(&render);
        render.add(circle("B"));
        history.record(&render);
        history.undo(&mut render, &mut status);
        assert!(history.can_redo());

        render.add(circle("C"));
        history.record(&render);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_resets_counters() {
        let mut history = HistoryEngine::new(10);
        let mut render = render();
        let mut status = StatusLine::new();

        let a = circle("A");
        let id = a.id();
        render.add(a);
        history.record(&render);
        render.get_mut(id).unwrap().translate(Vec2::new(5.0, 0.0));
        history.record(&render);

        render.set_selected(id, true);
        history.undo(&mut render, &mut status);
        assert_eq!(render.selected_count(), 0);
        assert_eq!(render.get(id).unwrap().position, Point::ZERO);
    }

    #[test]
    fn test_state_hash_is_order_sensitive() {
        let a = circle("A");
        let b = circle("B");
        assert_eq!(state_hash(&[]), 1);
        assert_ne!(
            state_hash(&[a.clone(), b.clone()]),
            state_hash(&[b, a])
        );
    }

    #[test]
    fn test_reset_uses_current_as_base() {
        let mut history = HistoryEngine::new(10);
        let mut render = render();
        let mut status = StatusLine::new();

        render.add(circle("A"));
        history.reset(&render);
        assert!(!history.record(&render));

        render.add(circle("B"));
        history.record(&render);
        history.undo(&mut render, &mut status);
        assert_eq!(names(&render), ["A"]);
    }

    #[test]
    fn test_first_record_on_empty_collection() {
        let mut history = HistoryEngine::new(10);
        let render = render();

        assert_eq!(history.last_hash(), None);
        assert!(history.record(&render));
        assert!(!history.record(&render));
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn test_with_base_restores_loaded_state() {
        let mut render = render();
        let a = circle("A");
        let id = a.id();
        render.add(a);
        let mut history = HistoryEngine::with_base(10, &render);
        let mut status = StatusLine::new();

        render.get_mut(id).unwrap().translate(Vec2::new(5.0, 0.0));
        assert!(history.record(&render));
        assert!(history.undo(&mut render, &mut status));

        assert_eq!(render.len(), 1);
        assert_eq!(render.get(id).unwrap().position, Point::ZERO);
    }

    #[test]
    fn test_undo_discards_unrecorded_changes_first() {
        let mut history = HistoryEngine::new(10);
        let mut render = render();
        let mut status = StatusLine::new();

        let a = circle("A");
        let id = a.id();
        render.add(a);
        history.record(&render);
        render.get_mut(id).unwrap().position = Point::new(5.0, 0.0);
        history.record(&render);
        render.get_mut(id).unwrap().position = Point::new(9.0, 0.0);

        assert!(history.undo(&mut render, &mut status));
        assert_eq!(render.get(id).unwrap().position, Point::new(5.0, 0.0));
        assert_eq!(history.undo_len(), 2);

        assert!(history.undo(&mut render, &mut status));
        assert_eq!(render.get(id).unwrap().position, Point::ZERO);

        assert!(history.redo(&mut render, &mut status));
        assert_eq!(render.get(id).unwrap().position, Point::new(5.0, 0.0));
        assert!(history.redo(&mut render, &mut status));
        assert_eq!(render.get(id).unwrap().position, Point::new(9.0, 0.0));
    }

    #[test]
    fn test_restore_keeps_ids_across_round_trips() {
        let mut history = HistoryEngine::new(10);
        let mut render = render();
        let mut status = StatusLine::new();

        let a = circle("A");
        let id = a.id();
        render.add(a);
        history.record(&render);
        render.add(circle("B"));
        history.record(&render);

        history.undo(&mut render, &mut status);
        history.redo(&mut render, &mut status);
        history.undo(&mut render, &mut status);
        assert_eq!(render.ids(), vec![id]);
    }
}
