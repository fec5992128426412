//! SchemDraft Core Library
//!
//! Editor core for schematic, symbol, footprint and PCB design surfaces:
//! element geometry and snapping, viewport mapping, the render collection
//! and undo/redo history.

pub mod config;
pub mod editor;
pub mod element;
pub mod history;
pub mod render;
pub mod snap;
pub mod status;
pub mod viewport;

pub use config::{ConfigError, EditorConfig};
pub use editor::{Editor, Gesture};
pub use element::{
    DesignElement, EditorHandle, ElementId, ElementKind, ElementOptions, Geometry, PropertyPanel,
    PropsContext, PropsError, SnapPoint, MIXED,
};
pub use history::{HistoryEngine, HistorySnapshot, state_hash};
pub use render::{DrawItem, RenderSystem};
pub use snap::{SnapRole, SnapRule, snap_to_grid};
pub use status::{StatusLine, StatusSink};
pub use viewport::Viewport;
