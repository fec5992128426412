//! Property panel load/apply.
//!
//! The panel itself is owned by the UI; this side only sees a map of widget
//! ids to their text. Each editing context exposes a table of fields per
//! element kind.

use super::{DesignElement, ElementKind, Geometry};
use crate::status::StatusSink;
use kurbo::Point;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Shown in a widget when the selected elements disagree on its value.
pub const MIXED: &str = "<mixed>";

const MAX_COORD: f64 = 1.0e6;
const MIN_SIZE: f64 = 1.0e-3;
const MAX_SIZE: f64 = 1.0e4;

/// Structural problems that abort a load or apply.
#[derive(Debug, Error, PartialEq)]
pub enum PropsError {
    #[error("property panel has no widget '{0}'")]
    MissingWidget(String),

    #[error("{kind} '{name}' is malformed: {reason}")]
    Structure {
        kind: &'static str,
        name: String,
        reason: &'static str,
    },
}

/// Editing context the panel belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropsContext {
    Global,
    Symbol,
    Footprint,
    Pcb,
}

impl PropsContext {
    fn allows_symbol_fields(self) -> bool {
        !matches!(self, PropsContext::Global)
    }

    fn allows_board_fields(self) -> bool {
        matches!(self, PropsContext::Footprint | PropsContext::Pcb)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldType {
    /// Inclusive range.
    Number { min: f64, max: f64 },
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Widget id.
    pub id: &'static str,
    pub label: &'static str,
    pub ty: FieldType,
}

const fn number(id: &'static str, label: &'static str, min: f64, max: f64) -> FieldSpec {
    FieldSpec {
        id,
        label,
        ty: FieldType::Number { min, max },
    }
}

const fn text(id: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        id,
        label,
        ty: FieldType::Text,
    }
}

const COMMON_FIELDS: &[FieldSpec] = &[
    number("posX", "X", -MAX_COORD, MAX_COORD),
    number("posY", "Y", -MAX_COORD, MAX_COORD),
    number("rotation", "Rotation", -360.0, 360.0),
    text("name", "Name"),
];

const CIRCLE_FIELDS: &[FieldSpec] = &[number("radius", "Radius", MIN_SIZE, MAX_SIZE)];

const RECTANGLE_FIELDS: &[FieldSpec] = &[
    number("width", "Width", MIN_SIZE, MAX_SIZE),
    number("height", "Height", MIN_SIZE, MAX_SIZE),
];

const LINE_FIELDS: &[FieldSpec] = &[
    number("startX", "Start X", -MAX_COORD, MAX_COORD),
    number("startY", "Start Y", -MAX_COORD, MAX_COORD),
    number("endX", "End X", -MAX_COORD, MAX_COORD),
    number("endY", "End Y", -MAX_COORD, MAX_COORD),
];

const TEXT_FIELDS: &[FieldSpec] = &[
    text("text", "Text"),
    number("fontSize", "Font size", MIN_SIZE, MAX_SIZE),
];

const PIN_FIELDS: &[FieldSpec] = &[
    text("pinNumber", "Pin number"),
    text("pinName", "Pin name"),
    number("pinLength", "Pin length", MIN_SIZE, MAX_SIZE),
];

const VIA_FIELDS: &[FieldSpec] = &[
    number("padRadius", "Pad radius", MIN_SIZE, MAX_SIZE),
    number("drillRadius", "Drill radius", MIN_SIZE, MAX_SIZE),
];

const HOLE_FIELDS: &[FieldSpec] = &[number("drillRadius", "Drill radius", MIN_SIZE, MAX_SIZE)];

/// Fields shown for an element kind in a context, common fields first.
pub fn fields(context: PropsContext, kind: ElementKind) -> Vec<FieldSpec> {
    let kind_fields: &[FieldSpec] = match kind {
        ElementKind::Circle if context.allows_symbol_fields() => CIRCLE_FIELDS,
        ElementKind::Rectangle if context.allows_symbol_fields() => RECTANGLE_FIELDS,
        ElementKind::Line if context.allows_symbol_fields() => LINE_FIELDS,
        ElementKind::Text if context.allows_symbol_fields() => TEXT_FIELDS,
        ElementKind::Pin if context.allows_symbol_fields() => PIN_FIELDS,
        ElementKind::Via if context.allows_board_fields() => VIA_FIELDS,
        ElementKind::Hole if context.allows_board_fields() => HOLE_FIELDS,
        _ => &[],
    };
    COMMON_FIELDS.iter().chain(kind_fields).copied().collect()
}

/// Text content of the panel's widgets, keyed by widget id.
#[derive(Debug, Clone, Default)]
pub struct PropertyPanel {
    widgets: HashMap<String, String>,
    loaded: HashSet<String>,
}

impl PropertyPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A panel with an empty widget for each id.
    pub fn with_widgets<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            widgets: ids.into_iter().map(|id| (id.to_string(), String::new())).collect(),
            loaded: HashSet::new(),
        }
    }

    /// A panel with every widget a context can show.
    pub fn for_context(context: PropsContext) -> Self {
        let ids: HashSet<&str> = ElementKind::ALL
            .iter()
            .flat_map(|&kind| fields(context, kind))
            .map(|field| field.id)
            .collect();
        Self::with_widgets(ids)
    }

    pub fn add_widget(&mut self, id: impl Into<String>) {
        self.widgets.entry(id.into()).or_default();
    }

    pub fn has_widget(&self, id: &str) -> bool {
        self.widgets.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.widgets.get(id).map(String::as_str)
    }

    /// Set a widget's text, as the user typing into it.
    pub fn set(&mut self, id: &str, value: impl Into<String>) -> Result<(), PropsError> {
        let widget = self
            .widgets
            .get_mut(id)
            .ok_or_else(|| PropsError::MissingWidget(id.to_string()))?;
        *widget = value.into();
        Ok(())
    }

    /// Start loading a new selection: every widget is cleared.
    pub fn begin_load(&mut self) {
        self.loaded.clear();
        for value in self.widgets.values_mut() {
            value.clear();
        }
    }

    /// Write a loaded value. A later element disagreeing with an earlier one
    /// turns the widget into [`MIXED`].
    fn load(&mut self, id: &str, value: String) -> Result<(), PropsError> {
        let widget = self
            .widgets
            .get_mut(id)
            .ok_or_else(|| PropsError::MissingWidget(id.to_string()))?;
        if self.loaded.insert(id.to_string()) {
            *widget = value;
        } else if *widget != value {
            *widget = MIXED.to_string();
        }
        Ok(())
    }
}

enum FieldValue {
    Number(f64),
    Text(String),
}

impl DesignElement {
    /// Write this element's fields into the panel. Returns `Ok(false)` when
    /// the element is not selected.
    pub fn props_load(
        &self,
        context: PropsContext,
        panel: &mut PropertyPanel,
    ) -> Result<bool, PropsError> {
        if !self.selected {
            return Ok(false);
        }
        for field in fields(context, self.kind()) {
            let value = self.field_value(field.id)?;
            panel.load(field.id, value)?;
        }
        Ok(true)
    }

    /// Apply the panel's fields to this element.
    ///
    /// Invalid input is reported through `status` and leaves that field
    /// unchanged. Returns whether anything changed.
    pub fn props_apply(
        &mut self,
        context: PropsContext,
        panel: &PropertyPanel,
        status: &mut dyn StatusSink,
    ) -> Result<bool, PropsError> {
        if !self.selected {
            return Ok(false);
        }

        let mut changed = false;
        for field in fields(context, self.kind()) {
            let raw = panel
                .get(field.id)
                .ok_or_else(|| PropsError::MissingWidget(field.id.to_string()))?;
            let raw = raw.trim();
            if raw.is_empty() || raw == MIXED {
                continue;
            }

            let value = match field.ty {
                FieldType::Text => FieldValue::Text(raw.to_string()),
                FieldType::Number { min, max } => match raw.parse::<f64>() {
                    Ok(v) if !v.is_finite() => {
                        status.show(&format!("{}: '{raw}' is not a number.", field.label));
                        continue;
                    }
                    Ok(v) if v < min || v > max => {
                        status.show(&format!("{}: must be between {min} and {max}.", field.label));
                        continue;
                    }
                    Ok(v) => FieldValue::Number(v),
                    Err(_) => {
                        status.show(&format!("{}: '{raw}' is not a number.", field.label));
                        continue;
                    }
                },
            };

            if let (FieldValue::Number(v), Geometry::Via { pad_radius, drill_radius }) =
                (&value, &self.geometry)
            {
                let rejected = match field.id {
                    "padRadius" => {
                        let drill = pending_number(panel, "drillRadius").unwrap_or(*drill_radius);
                        *v <= drill
                    }
                    "drillRadius" => *v >= *pad_radius,
                    _ => false,
                };
                if rejected {
                    status.show("Drill radius must be smaller than the pad radius.");
                    continue;
                }
            }

            changed |= self.set_field(field.id, value)?;
        }

        Ok(changed)
    }

    fn structure_error(&self, reason: &'static str) -> PropsError {
        PropsError::Structure {
            kind: self.kind().display_name(),
            name: self.name.clone(),
            reason,
        }
    }

    /// Lead end point and label text of a pin.
    fn pin_parts(&self) -> Result<(Point, &str), PropsError> {
        let children = self.geometry.children();
        if children.len() != 2 {
            return Err(self.structure_error("a pin needs exactly two children"));
        }
        match (&children[0].geometry, &children[1].geometry) {
            (Geometry::Line { end, .. }, Geometry::Text { content, .. }) => Ok((*end, content)),
            _ => Err(self.structure_error("a pin needs a lead line and a label")),
        }
    }

    fn pin_parts_mut(&mut self) -> Result<(&mut DesignElement, &mut DesignElement), PropsError> {
        let malformed = self.structure_error("a pin needs a lead line and a label");
        let wrong_count = self.structure_error("a pin needs exactly two children");
        let Some(children) = self.geometry.children_mut() else {
            return Err(malformed);
        };
        match children.as_mut_slice() {
            [lead, label]
                if matches!(lead.geometry, Geometry::Line { .. })
                    && matches!(label.geometry, Geometry::Text { .. }) =>
            {
                Ok((lead, label))
            }
            [_, _] => Err(malformed),
            _ => Err(wrong_count),
        }
    }

    fn field_value(&self, id: &str) -> Result<String, PropsError> {
        let value = match (id, &self.geometry) {
            ("posX", _) => self.position.x.to_string(),
            ("posY", _) => self.position.y.to_string(),
            ("rotation", _) => self.rotation.to_string(),
            ("name", _) => self.name.clone(),
            ("radius", Geometry::Circle { radius }) => radius.to_string(),
            ("width", Geometry::Rectangle { width, .. }) => width.to_string(),
            ("height", Geometry::Rectangle { height, .. }) => height.to_string(),
            ("startX", Geometry::Line { start, .. }) => start.x.to_string(),
            ("startY", Geometry::Line { start, .. }) => start.y.to_string(),
            ("endX", Geometry::Line { end, .. }) => end.x.to_string(),
            ("endY", Geometry::Line { end, .. }) => end.y.to_string(),
            ("text", Geometry::Text { content, .. }) => content.clone(),
            ("fontSize", Geometry::Text { font, .. }) => font.size.to_string(),
            ("pinNumber", Geometry::Pin { number, .. }) => number.clone(),
            ("pinName", Geometry::Pin { .. }) => self.pin_parts()?.1.to_string(),
            ("pinLength", Geometry::Pin { .. }) => self.pin_parts()?.0.x.to_string(),
            ("padRadius", Geometry::Via { pad_radius, .. }) => pad_radius.to_string(),
            (
                "drillRadius",
                Geometry::Via { drill_radius, .. } | Geometry::Hole { drill_radius },
            ) => drill_radius.to_string(),
            _ => String::new(),
        };
        Ok(value)
    }

    fn set_field(&mut self, id: &str, value: FieldValue) -> Result<bool, PropsError> {
        let changed = match (id, value) {
            ("name", FieldValue::Text(name)) => replace(&mut self.name, name),
            ("posX", FieldValue::Number(v)) => replace(&mut self.position.x, v),
            ("posY", FieldValue::Number(v)) => replace(&mut self.position.y, v),
            ("rotation", FieldValue::Number(v)) => replace(&mut self.rotation, v.rem_euclid(360.0)),
            ("pinName", FieldValue::Text(name)) => {
                let (_, label) = self.pin_parts_mut()?;
                match &mut label.geometry {
                    Geometry::Text { content, .. } => replace(content, name),
                    _ => false,
                }
            }
            ("pinLength", FieldValue::Number(length)) => {
                let (lead, label) = self.pin_parts_mut()?;
                let mut changed = false;
                if let Geometry::Line { start, end } = &mut lead.geometry {
                    changed = replace(end, Point::new(start.x + length, start.y));
                }
                label.position.x = length + super::Font::DEFAULT_SIZE;
                changed
            }
            (id, value) => self.set_geometry_field(id, value),
        };
        Ok(changed)
    }

    fn set_geometry_field(&mut self, id: &str, value: FieldValue) -> bool {
        match (id, value, &mut self.geometry) {
            ("radius", FieldValue::Number(v), Geometry::Circle { radius }) => replace(radius, v),
            ("width", FieldValue::Number(v), Geometry::Rectangle { width, .. }) => {
                replace(width, v)
            }
            ("height", FieldValue::Number(v), Geometry::Rectangle { height, .. }) => {
                replace(height, v)
            }
            ("startX", FieldValue::Number(v), Geometry::Line { start, .. }) => {
                replace(&mut start.x, v)
            }
            ("startY", FieldValue::Number(v), Geometry::Line { start, .. }) => {
                replace(&mut start.y, v)
            }
            ("endX", FieldValue::Number(v), Geometry::Line { end, .. }) => replace(&mut end.x, v),
            ("endY", FieldValue::Number(v), Geometry::Line { end, .. }) => replace(&mut end.y, v),
            ("text", FieldValue::Text(s), Geometry::Text { content, .. }) => replace(content, s),
            ("fontSize", FieldValue::Number(v), Geometry::Text { font, .. }) => {
                replace(&mut font.size, v)
            }
            ("pinNumber", FieldValue::Text(s), Geometry::Pin { number, .. }) => replace(number, s),
            ("padRadius", FieldValue::Number(v), Geometry::Via { pad_radius, .. }) => {
                replace(pad_radius, v)
            }
            (
                "drillRadius",
                FieldValue::Number(v),
                Geometry::Via { drill_radius, .. } | Geometry::Hole { drill_radius },
            ) => replace(drill_radius, v),
            _ => false,
        }
    }
}

/// A numeric field value the panel is about to apply, if it is valid.
fn pending_number(panel: &PropertyPanel, id: &str) -> Option<f64> {
    let raw = panel.get(id)?.trim();
    let value = raw.parse::<f64>().ok()?;
    (value.is_finite() && (MIN_SIZE..=MAX_SIZE).contains(&value)).then_some(value)
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
