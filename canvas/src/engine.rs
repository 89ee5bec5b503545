//! The canvas controller shared by every planning surface.
//!
//! One `CanvasController` owns the element list, the selection, the camera,
//! undo history and the in-flight gesture. Surfaces differ only in which
//! element kinds their toolbar can add and how eagerly they autosave, so they
//! are a parameter ([`Surface`]) rather than separate controllers.
//!
//! Every handler returns `Vec<Action>` for the host to process: persist the
//! document, redraw, open an edit dialog, or start an export. The controller
//! never performs I/O itself.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::fmt;

use crate::camera::{Camera, Point};
use crate::consts::{CASCADE_OFFSET, MARQUEE_MIN_PX, NUDGE_STEP, NUDGE_STEP_LARGE};
use crate::doc::{
    CanvasData, CanvasElement, DocError, ElementContent, ElementId, ElementKind, ElementPatch, NormalizeReport,
    Position, Size, generate_id,
};
use crate::drag::{DragSession, clamp_group_delta};
use crate::hit::{self, Rect};
use crate::history::History;
use crate::input::{Button, ExportFormat, InputState, Key, Modifiers, ToolbarCommand};
use crate::selection::Selection;

// =============================================================================
// SURFACES
// =============================================================================

/// A canvas variant. Each surface restricts the kinds its toolbar can add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// The main project canvas; every kind is allowed.
    Project,
    /// Scratch canvas next to the AI generation tools.
    AiTools,
    /// User-story mapping board.
    UserStory,
    /// Hexagon knowledge diagram for project modelling.
    ProjectModelling,
    /// Editor for reusable canvas templates.
    TemplateBuilder,
}

impl Surface {
    pub const ALL: [Surface; 5] =
        [Self::Project, Self::AiTools, Self::UserStory, Self::ProjectModelling, Self::TemplateBuilder];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::AiTools => "aiTools",
            Self::UserStory => "userStory",
            Self::ProjectModelling => "projectModelling",
            Self::TemplateBuilder => "templateBuilder",
        }
    }

    /// Element kinds this surface's toolbar may add.
    #[must_use]
    pub fn allowed_kinds(self) -> &'static [ElementKind] {
        use ElementKind as K;
        match self {
            Self::Project => &K::ALL,
            Self::AiTools => &[K::Sticky, K::Text, K::Bmc, K::Story, K::KnowledgeItem, K::CustomHexi],
            Self::UserStory => &[K::Story, K::Sticky, K::Text, K::Connector, K::Group],
            Self::ProjectModelling => &[
                K::KnowledgeItem,
                K::CustomHexi,
                K::PlanningFocus,
                K::ArtifactLink,
                K::Sticky,
                K::Text,
                K::Connector,
            ],
            Self::TemplateBuilder => &[K::Text, K::Sticky, K::Shape, K::Connector, K::Image, K::Group, K::CustomHexi],
        }
    }

    #[must_use]
    pub fn allows(self, kind: ElementKind) -> bool {
        self.allowed_kinds().contains(&kind)
    }

    /// Default autosave debounce for this surface, in milliseconds.
    #[must_use]
    pub fn autosave_delay_ms(self) -> u64 {
        match self {
            Self::Project | Self::ProjectModelling => 1000,
            Self::AiTools => 2000,
            Self::UserStory => 500,
            Self::TemplateBuilder => 200,
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ERRORS + ACTIONS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    #[error("{kind} elements cannot be added to the {surface} canvas")]
    KindNotAllowed { surface: Surface, kind: ElementKind },
    #[error("element not found: {0}")]
    NotFound(ElementId),
    #[error(transparent)]
    Doc(#[from] DocError),
}

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The element list changed and was recorded in history. `flush` asks the
    /// autosave worker to skip the debounce.
    Persist { flush: bool },
    /// The selection changed; carries the new selection in order.
    SelectionChanged(Vec<ElementId>),
    /// A click (not a drag) landed on an element: open its editor.
    EditRequested { id: ElementId },
    /// Visual-only offset for every selected element during a group drag.
    GroupPreview { dx: f64, dy: f64 },
    /// Visual-only position for a single element being dragged.
    ElementPreview { id: ElementId, position: Position },
    /// Camera, marquee, or preview state changed; redraw.
    RenderNeeded,
    /// The toolbar asked for an export of the current scene.
    ExportRequested(ExportFormat),
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// Core controller state. All of it is plain data; no UI handles.
#[derive(Debug, Clone)]
pub struct CanvasController {
    surface: Surface,
    doc: CanvasData,
    selection: Selection,
    camera: Camera,
    input: InputState,
    history: History<Vec<CanvasElement>>,
    viewport_width: f64,
    viewport_height: f64,
}

impl CanvasController {
    /// Empty controller for `surface`.
    #[must_use]
    pub fn new(surface: Surface) -> Self {
        Self {
            surface,
            doc: CanvasData::default(),
            selection: Selection::new(),
            camera: Camera::default(),
            input: InputState::Idle,
            history: History::new(Vec::new()),
            viewport_width: 0.0,
            viewport_height: 0.0,
        }
    }

    /// Controller seeded with an existing document.
    #[must_use]
    pub fn with_document(surface: Surface, data: CanvasData) -> Self {
        let mut controller = Self::new(surface);
        controller.load(data);
        controller
    }

    // --- Data inputs ---

    /// Replace the document with a freshly loaded one. History restarts at the
    /// loaded state and any selection or gesture is dropped.
    pub fn load(&mut self, mut data: CanvasData) -> NormalizeReport {
        let report = data.normalize();
        self.history.reset(data.elements.clone());
        self.doc = data;
        self.selection.clear();
        self.input = InputState::Idle;
        report
    }

    /// Overwrite local state with a document pushed by another client.
    ///
    /// Last writer wins: history restarts at the remote state, the selection
    /// keeps only ids that still exist, and an in-flight gesture is cancelled.
    pub fn apply_remote(&mut self, mut data: CanvasData) -> Vec<Action> {
        data.normalize();
        let before = self.selection.clone();
        self.history.reset(data.elements.clone());
        self.doc = data;
        self.input = InputState::Idle;
        self.prune_selection();

        let mut actions = Vec::new();
        actions.extend(self.selection_action(&before));
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Update viewport dimensions in CSS pixels.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport_width = width.max(0.0);
        self.viewport_height = height.max(0.0);
    }

    // --- Queries ---

    #[must_use]
    pub fn surface(&self) -> Surface {
        self.surface
    }

    #[must_use]
    pub fn document(&self) -> &CanvasData {
        &self.doc
    }

    #[must_use]
    pub fn elements(&self) -> &[CanvasElement] {
        &self.doc.elements
    }

    #[must_use]
    pub fn element(&self, id: &str) -> Option<&CanvasElement> {
        self.doc.get(id)
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The currently selected elements, in document order.
    #[must_use]
    pub fn selected_elements(&self) -> Vec<&CanvasElement> {
        self.doc.elements.iter().filter(|el| self.selection.contains(&el.id)).collect()
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Where `id` should be drawn right now, including any uncommitted drag.
    #[must_use]
    pub fn visual_position(&self, id: &str) -> Option<Position> {
        let stored = self.doc.get(id)?.position;
        match &self.input {
            InputState::DraggingElements(session) => Some(session.preview_position(id).unwrap_or(stored)),
            _ => Some(stored),
        }
    }

    /// The marquee rectangle in canvas coordinates while sweeping.
    #[must_use]
    pub fn marquee_rect(&self) -> Option<Rect> {
        self.input.marquee_rect()
    }

    // --- Pointer input ---

    pub fn on_pointer_down(&mut self, screen: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if !self.input.is_idle() {
            return Vec::new();
        }
        match button {
            Button::Secondary => return Vec::new(),
            Button::Middle => {
                self.input = InputState::Panning { last_screen: screen };
                return Vec::new();
            }
            Button::Primary => {}
        }

        let world = self.camera.screen_to_canvas(screen);
        let Some(id) = hit::hit_test(world, &self.doc.elements).map(|el| el.id.clone()) else {
            self.input =
                InputState::Marquee { start_screen: screen, start: world, current: world, additive: modifiers.shift };
            return Vec::new();
        };

        let before = self.selection.clone();
        if modifiers.shift {
            if !self.selection.toggle(&id) {
                self.input = InputState::Idle;
                return self.selection_action(&before).into_iter().collect();
            }
        } else if !self.selection.contains(&id) {
            self.selection.select_only(&id);
        }

        let starts = self
            .doc
            .elements
            .iter()
            .filter(|el| self.selection.contains(&el.id))
            .map(|el| (el.id.clone(), el.position))
            .collect();
        self.input = InputState::DraggingElements(DragSession::new(id, screen, starts));
        self.selection_action(&before).into_iter().collect()
    }

    pub fn on_pointer_move(&mut self, screen: Point, _modifiers: Modifiers) -> Vec<Action> {
        let world = self.camera.screen_to_canvas(screen);
        let scale = self.camera.scale();
        match &mut self.input {
            InputState::Idle => Vec::new(),
            InputState::Panning { last_screen } => {
                let (dx, dy) = (screen.x - last_screen.x, screen.y - last_screen.y);
                *last_screen = screen;
                self.camera.pan_by(dx, dy);
                vec![Action::RenderNeeded]
            }
            InputState::DraggingElements(session) => {
                let (dx, dy) = session.update(screen, scale);
                if session.is_group() {
                    vec![Action::GroupPreview { dx, dy }]
                } else {
                    match session.preview_position(&session.anchor) {
                        Some(position) => vec![Action::ElementPreview { id: session.anchor.clone(), position }],
                        None => Vec::new(),
                    }
                }
            }
            InputState::Marquee { current, .. } => {
                *current = world;
                vec![Action::RenderNeeded]
            }
        }
    }

    pub fn on_pointer_up(&mut self, screen: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if self.input.button() != Some(button) {
            return Vec::new();
        }
        let world = self.camera.screen_to_canvas(screen);
        match std::mem::take(&mut self.input) {
            InputState::Idle | InputState::Panning { .. } => Vec::new(),
            InputState::DraggingElements(session) => self.finish_drag(&session, screen, modifiers),
            InputState::Marquee { start_screen, start, additive, .. } => {
                self.finish_marquee(start_screen, screen, Rect::from_corners(start, world), additive)
            }
        }
    }

    fn finish_drag(&mut self, session: &DragSession, screen: Point, modifiers: Modifiers) -> Vec<Action> {
        if session.is_click(screen) {
            if modifiers.shift {
                return vec![Action::RenderNeeded];
            }
            return vec![Action::EditRequested { id: session.anchor.clone() }, Action::RenderNeeded];
        }

        let mut moved = false;
        for (id, position) in session.final_positions() {
            if let Some(el) = self.doc.get_mut(&id) {
                if el.position != position {
                    el.position = position;
                    moved = true;
                }
            }
        }
        if !moved {
            return vec![Action::RenderNeeded];
        }
        vec![self.commit(false), Action::RenderNeeded]
    }

    fn finish_marquee(&mut self, start_screen: Point, end_screen: Point, rect: Rect, additive: bool) -> Vec<Action> {
        let before = self.selection.clone();
        let too_small = (end_screen.x - start_screen.x).abs() < MARQUEE_MIN_PX
            && (end_screen.y - start_screen.y).abs() < MARQUEE_MIN_PX;
        if too_small {
            if !additive {
                self.selection.clear();
            }
        } else {
            let hits = hit::elements_in_rect(&rect, &self.doc.elements);
            if additive {
                self.selection.extend(hits);
            } else {
                self.selection.replace(hits);
            }
        }
        let mut actions: Vec<Action> = self.selection_action(&before).into_iter().collect();
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Keyboard ---

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        if key.is("Escape") {
            return self.cancel();
        }
        if !self.input.is_idle() {
            return Vec::new();
        }
        let step = if modifiers.shift { NUDGE_STEP_LARGE } else { NUDGE_STEP };
        if modifiers.command() {
            if key.is("z") {
                return if modifiers.shift { self.redo() } else { self.undo() };
            }
            if key.is("y") {
                return self.redo();
            }
            if key.is("a") {
                return self.select_all();
            }
            if key.is("d") {
                return self.duplicate_selected();
            }
            return Vec::new();
        }
        match key.0.as_str() {
            "Delete" | "Backspace" => self.delete_selected(),
            "ArrowLeft" => self.nudge_selected(-step, 0.0),
            "ArrowRight" => self.nudge_selected(step, 0.0),
            "ArrowUp" => self.nudge_selected(0.0, -step),
            "ArrowDown" => self.nudge_selected(0.0, step),
            _ => Vec::new(),
        }
    }

    /// Drop any in-flight gesture and clear the selection.
    pub fn cancel(&mut self) -> Vec<Action> {
        let before = self.selection.clone();
        self.input = InputState::Idle;
        self.selection.clear();
        let mut actions: Vec<Action> = self.selection_action(&before).into_iter().collect();
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Toolbar ---

    /// Run a toolbar command.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::KindNotAllowed`] when adding a kind this surface does not offer.
    pub fn dispatch(&mut self, command: &ToolbarCommand) -> Result<Vec<Action>, CanvasError> {
        let actions = match command {
            ToolbarCommand::Add(kind) => self.add_element(*kind)?.1,
            ToolbarCommand::ZoomIn => {
                self.camera.zoom_in();
                vec![Action::RenderNeeded]
            }
            ToolbarCommand::ZoomOut => {
                self.camera.zoom_out();
                vec![Action::RenderNeeded]
            }
            ToolbarCommand::ZoomReset => {
                self.camera.reset();
                vec![Action::RenderNeeded]
            }
            ToolbarCommand::Undo => self.undo(),
            ToolbarCommand::Redo => self.redo(),
            ToolbarCommand::DeleteSelected => self.delete_selected(),
            ToolbarCommand::DuplicateSelected => self.duplicate_selected(),
            ToolbarCommand::Export(format) => vec![Action::ExportRequested(*format)],
        };
        Ok(actions)
    }

    // --- Element mutations ---

    /// Add a default element of `kind` at the centre of the viewport.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::KindNotAllowed`] when the surface does not offer `kind`.
    pub fn add_element(&mut self, kind: ElementKind) -> Result<(ElementId, Vec<Action>), CanvasError> {
        let size = kind.default_size();
        let center = self.viewport_center();
        let position = Position::new(center.x - size.width / 2.0, center.y - size.height / 2.0);
        self.add_element_at(kind, position)
    }

    /// Add a default element of `kind` near `position`, cascading off any
    /// element already sitting exactly there.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::KindNotAllowed`] when the surface does not offer `kind`.
    pub fn add_element_at(&mut self, kind: ElementKind, position: Position) -> Result<(ElementId, Vec<Action>), CanvasError> {
        self.ensure_allowed(kind)?;
        let mut position = position.clamped();
        while self.doc.elements.iter().any(|el| el.position == position) {
            position = position.offset(CASCADE_OFFSET, CASCADE_OFFSET);
        }
        let element = CanvasElement::new(kind, position);
        let id = element.id.clone();
        self.doc.push(element);

        let before = self.selection.clone();
        self.selection.select_only(&id);
        let mut actions: Vec<Action> = self.selection_action(&before).into_iter().collect();
        actions.push(self.commit(true));
        Ok((id, actions))
    }

    /// Insert prepared elements (e.g. AI output) as one history entry.
    ///
    /// Colliding ids are re-keyed and positions clamped. The inserted elements
    /// become the selection.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::KindNotAllowed`] if any element's kind is not
    /// offered by this surface; nothing is inserted in that case.
    pub fn insert_elements(&mut self, elements: Vec<CanvasElement>) -> Result<Vec<Action>, CanvasError> {
        for el in &elements {
            self.ensure_allowed(el.kind())?;
        }
        if elements.is_empty() {
            return Ok(Vec::new());
        }
        let before = self.selection.clone();
        self.selection.clear();
        for mut el in elements {
            if el.id.is_empty() || self.doc.contains(&el.id) {
                el.id = generate_id(el.kind());
            }
            el.position = el.position.clamped();
            self.selection.add(&el.id);
            self.doc.push(el);
        }
        let mut actions: Vec<Action> = self.selection_action(&before).into_iter().collect();
        actions.push(self.commit(true));
        Ok(actions)
    }

    /// Replace an element's payload, e.g. after its edit dialog is confirmed.
    ///
    /// # Errors
    ///
    /// [`CanvasError::NotFound`] for an unknown id, [`CanvasError::Doc`] when
    /// the payload kind differs from the element's kind.
    pub fn update_content(&mut self, id: &str, content: ElementContent) -> Result<Vec<Action>, CanvasError> {
        self.apply_patch(id, &ElementPatch { content: Some(content), ..Default::default() })
    }

    /// Move and/or resize an element. Positions are clamped; invalid sizes are ignored.
    ///
    /// # Errors
    ///
    /// [`CanvasError::NotFound`] for an unknown id.
    pub fn update_geometry(
        &mut self,
        id: &str,
        position: Option<Position>,
        size: Option<Size>,
    ) -> Result<Vec<Action>, CanvasError> {
        self.apply_patch(id, &ElementPatch { position, size, ..Default::default() })
    }

    /// Apply a sparse edit to one element as a single history entry.
    ///
    /// # Errors
    ///
    /// [`CanvasError::NotFound`] for an unknown id, [`CanvasError::Doc`] when
    /// the patch content has the wrong kind.
    pub fn apply_patch(&mut self, id: &str, patch: &ElementPatch) -> Result<Vec<Action>, CanvasError> {
        let el = self.doc.get_mut(id).ok_or_else(|| CanvasError::NotFound(id.to_owned()))?;
        let before = el.clone();
        el.apply_patch(patch)?;
        if *el == before {
            return Ok(Vec::new());
        }
        Ok(vec![self.commit(false)])
    }

    /// Remove every selected element as one history entry.
    pub fn delete_selected(&mut self) -> Vec<Action> {
        if self.selection.is_empty() {
            return Vec::new();
        }
        let mut removed = false;
        for id in self.selection.ids() {
            removed |= self.doc.remove(id).is_some();
        }
        self.selection.clear();
        let mut actions = vec![Action::SelectionChanged(Vec::new())];
        if removed {
            actions.push(self.commit(false));
        }
        actions
    }

    /// Copy every selected element, offset by the cascade step. The copies
    /// become the selection.
    pub fn duplicate_selected(&mut self) -> Vec<Action> {
        let copies: Vec<CanvasElement> = self
            .selected_elements()
            .into_iter()
            .map(|el| CanvasElement {
                id: generate_id(el.kind()),
                position: el.position.offset(CASCADE_OFFSET, CASCADE_OFFSET),
                ..el.clone()
            })
            .collect();
        if copies.is_empty() {
            return Vec::new();
        }
        let ids: Vec<ElementId> = copies.iter().map(|el| el.id.clone()).collect();
        for el in copies {
            self.doc.push(el);
        }
        self.selection.replace(&ids);
        vec![Action::SelectionChanged(ids), self.commit(true)]
    }

    /// Move the selection by `(dx, dy)` as a group, clamped at the canvas edge.
    pub fn nudge_selected(&mut self, dx: f64, dy: f64) -> Vec<Action> {
        let ids = self.selection.ids().to_vec();
        self.move_elements(&ids, dx, dy)
    }

    /// Move `ids` by one shared delta, clamped so that none goes negative.
    pub fn move_elements(&mut self, ids: &[ElementId], dx: f64, dy: f64) -> Vec<Action> {
        let starts: Vec<Position> =
            self.doc.elements.iter().filter(|el| ids.contains(&el.id)).map(|el| el.position).collect();
        if starts.is_empty() {
            return Vec::new();
        }
        let (dx, dy) = clamp_group_delta(&starts, dx, dy);
        if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
            return Vec::new();
        }
        for el in self.doc.elements.iter_mut().filter(|el| ids.contains(&el.id)) {
            el.position = el.position.offset(dx, dy);
        }
        vec![self.commit(false), Action::RenderNeeded]
    }

    // --- Selection ---

    pub fn select_all(&mut self) -> Vec<Action> {
        let before = self.selection.clone();
        self.selection.replace(self.doc.elements.iter().map(|el| el.id.as_str()));
        self.selection_action(&before).into_iter().collect()
    }

    /// Replace the selection with the given ids; unknown ids are skipped.
    pub fn select<I, S>(&mut self, ids: I) -> Vec<Action>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.selection.clone();
        self.selection.replace(ids.into_iter().filter(|id| self.doc.contains(id.as_ref())));
        self.selection_action(&before).into_iter().collect()
    }

    // --- History ---

    pub fn undo(&mut self) -> Vec<Action> {
        match self.history.undo().cloned() {
            Some(snapshot) => self.restore(snapshot),
            None => Vec::new(),
        }
    }

    pub fn redo(&mut self) -> Vec<Action> {
        match self.history.redo().cloned() {
            Some(snapshot) => self.restore(snapshot),
            None => Vec::new(),
        }
    }

    fn restore(&mut self, snapshot: Vec<CanvasElement>) -> Vec<Action> {
        let before = self.selection.clone();
        self.doc.elements = snapshot;
        self.input = InputState::Idle;
        self.prune_selection();
        let mut actions: Vec<Action> = self.selection_action(&before).into_iter().collect();
        actions.push(Action::Persist { flush: false });
        actions
    }

    // --- Internals ---

    fn commit(&mut self, flush: bool) -> Action {
        self.history.push(self.doc.elements.clone());
        Action::Persist { flush }
    }

    fn ensure_allowed(&self, kind: ElementKind) -> Result<(), CanvasError> {
        if self.surface.allows(kind) {
            Ok(())
        } else {
            Err(CanvasError::KindNotAllowed { surface: self.surface, kind })
        }
    }

    fn prune_selection(&mut self) {
        let doc = &self.doc;
        self.selection.retain_existing(|id| doc.contains(id));
    }

    fn selection_action(&self, before: &Selection) -> Option<Action> {
        (self.selection != *before).then(|| Action::SelectionChanged(self.selection.ids().to_vec()))
    }

    fn viewport_center(&self) -> Point {
        self.camera.screen_to_canvas(Point::new(self.viewport_width / 2.0, self.viewport_height / 2.0))
    }
}
