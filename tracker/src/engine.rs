use tracing::{debug, info, warn};

use crate::camera::{Camera, Point};
use crate::config::TrackerConfig;
use crate::connectors::{ConnectorStats, Mc4Status};
use crate::consts::{FIT_PADDING_PX, WHEEL_ZOOM_STEP};
use crate::doc::{Feature, LoadError, Survey, SurveySources};
use crate::geometry::ConnectorEnd;
use crate::hit::{self, Hit};
use crate::ident;
use crate::input::{ActiveModes, Button, InputState, Key, Modifiers, PaintMode, TrackMode, UiState, WheelDelta};
use crate::lengths::LengthTable;
use crate::observe::{Change, Observers, Subscription};
use crate::progress::{self, DailyRecord, ProgressSummary, Totals};
use crate::selection::{self, SelectionSet, SelectionStore};
use crate::shape::Bounds;
use crate::style::{self, BoxPreview, Label, Style};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

const CURSOR_DEFAULT: &str = "default";
const CURSOR_POINTER: &str = "pointer";
const CURSOR_PAINT: &str = "cell";
const CURSOR_BOX: &str = "crosshair";
const CURSOR_PAN: &str = "grabbing";

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The selected set changed; restyle tables and refresh totals.
    SelectionChanged,
    ConnectorToggled { id: String, end: ConnectorEnd, installed: bool },
    SetCursor(String),
    RenderNeeded,
}

/// One operator session: the loaded survey, lengths, selection, connector
/// status, camera, and the gesture in progress.
///
/// Everything a handler needs is reached through `self`; there is no shared
/// or global state. Handlers run to completion in dispatch order, so each one
/// sees the state committed by the previous event.
pub struct Session {
    config: TrackerConfig,
    survey: Survey,
    lengths: LengthTable,
    selection: SelectionStore,
    mc4: Mc4Status,
    pub camera: Camera,
    pub ui: UiState,
    pub input: InputState,
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Clicks released before this host timestamp are ignored.
    suppress_until_ms: f64,
    /// Selection at the last submit; the next submit reports what was added since.
    submitted: SelectionSet,
    observers: Observers,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl Session {
    #[must_use]
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            survey: Survey::default(),
            lengths: LengthTable::default(),
            selection: SelectionStore::new(config.history_limit),
            mc4: Mc4Status::new(),
            camera: Camera::default(),
            ui: UiState::default(),
            input: InputState::default(),
            viewport_width: 0.0,
            viewport_height: 0.0,
            suppress_until_ms: f64::NEG_INFINITY,
            submitted: SelectionSet::new(),
            observers: Observers::new(),
        }
    }

    // --- Data inputs ---

    /// Parse and derive a new survey, replacing the current one.
    ///
    /// Selection, connector status and the submit baseline start over either
    /// way. On error the session is left with an empty survey so nothing
    /// stale or partial is shown.
    ///
    /// # Errors
    ///
    /// Returns the [`LoadError`] of the first layer that fails to parse.
    pub fn load_survey(&mut self, sources: &SurveySources<'_>) -> Result<(), LoadError> {
        match Survey::load(sources, &self.config) {
            Ok(survey) => {
                self.replace_survey(survey);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "survey load failed; clearing map");
                self.replace_survey(Survey::default());
                Err(err)
            }
        }
    }

    /// Install already-built features (used by hosts that parse elsewhere, and by tests).
    pub fn set_survey(&mut self, survey: Survey) {
        self.replace_survey(survey);
    }

    fn replace_survey(&mut self, survey: Survey) {
        self.survey = survey;
        self.selection.reset();
        self.submitted.clear();
        self.mc4.clear();
        self.input = InputState::Idle;
        self.ui.hover = None;
        self.observers.notify(Change::SurveyLoaded);
        self.observers.notify(Change::SelectionChanged);
        self.observers.notify(Change::ConnectorsChanged);
        self.fit_to_survey();
    }

    /// Build the length table from pre-split rows.
    pub fn load_lengths(&mut self, rows: &[Vec<String>]) {
        self.lengths = LengthTable::build(rows);
        self.observers.notify(Change::LengthsLoaded);
    }

    // --- Viewport / camera ---

    /// Update viewport dimensions in CSS pixels and refit to the survey.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport_width = width;
        self.viewport_height = height;
        self.fit_to_survey();
    }

    /// Frame the tables layer in the viewport. Returns `false` when there is
    /// nothing to frame or no viewport yet.
    pub fn fit_to_survey(&mut self) -> bool {
        let fitted =
            self.camera
                .fit_bounds(&self.survey.bounds(), self.viewport_width, self.viewport_height, FIT_PADDING_PX);
        if fitted {
            self.observers.notify(Change::CameraChanged);
        }
        fitted
    }

    // --- Modes ---

    pub fn toggle_mode(&mut self, mode: TrackMode) -> ActiveModes {
        self.ui.modes.toggle(mode);
        debug!(?mode, on = self.ui.modes.is_on(mode), "mode toggled");
        self.ui.modes
    }

    /// Enter a sticky paint mode from the toolbar. Applies at once to the
    /// table under the pointer, then to every table the pointer enters.
    pub fn enter_paint_mode(&mut self, mode: PaintMode) -> Vec<Action> {
        self.ui.sticky_paint = Some(mode);
        debug!(?mode, "paint mode entered");
        let mut actions = Vec::new();
        if let Some(id) = self.ui.hover.clone().filter(|_| self.ui.modes.dc) {
            self.paint(mode, &id, &mut actions);
        }
        actions.push(Action::SetCursor(self.cursor().to_string()));
        actions
    }

    pub fn exit_paint_mode(&mut self) -> Vec<Action> {
        if self.ui.sticky_paint.take().is_none() {
            return Vec::new();
        }
        debug!("paint mode exited");
        vec![Action::SetCursor(self.cursor().to_string())]
    }

    // --- Input events ---

    pub fn pointer_down(&mut self, screen: Point, button: Button) -> Vec<Action> {
        if !self.input.is_idle() {
            return Vec::new();
        }
        if button == Button::Middle {
            self.input = InputState::Panning { button, last_screen: screen };
            return vec![Action::SetCursor(CURSOR_PAN.to_string())];
        }
        let target = self.table_at(screen);
        debug!(?button, ?target, "pointer down");
        self.input = InputState::Pressed { button, start: screen, target };
        Vec::new()
    }

    pub fn pointer_move(&mut self, screen: Point) -> Vec<Action> {
        let mut actions = Vec::new();
        let hover = self.table_at(screen);
        let hover_changed = hover != self.ui.hover;
        self.ui.hover = hover;

        self.input = match std::mem::take(&mut self.input) {
            InputState::Idle => {
                if hover_changed {
                    if let (Some(mode), Some(id)) = (self.ui.sticky_paint, self.ui.hover.clone()) {
                        if self.ui.modes.dc {
                            self.paint(mode, &id, &mut actions);
                        }
                    }
                    actions.push(Action::SetCursor(self.cursor().to_string()));
                }
                InputState::Idle
            }
            InputState::Pressed { button, start, target } => {
                let threshold = self.config.drag_threshold_px;
                if start.dist_sq(screen) > threshold * threshold {
                    self.begin_drag(button, start, target, screen, &mut actions)
                } else {
                    InputState::Pressed { button, start, target }
                }
            }
            InputState::Painting { button, mode } => {
                if let Some(id) = self.ui.hover.clone() {
                    self.paint(mode, &id, &mut actions);
                }
                InputState::Painting { button, mode }
            }
            InputState::Boxing { button, mode, start, .. } => {
                self.observers.notify(Change::PreviewChanged);
                actions.push(Action::RenderNeeded);
                InputState::Boxing { button, mode, start, current: screen }
            }
            InputState::Panning { button, last_screen } => {
                self.pan(screen.x - last_screen.x, screen.y - last_screen.y, &mut actions);
                InputState::Panning { button, last_screen: screen }
            }
        };
        actions
    }

    /// Release `button`. `now_ms` is the host clock, used for click suppression.
    pub fn pointer_up(&mut self, screen: Point, button: Button, now_ms: f64) -> Vec<Action> {
        if self.input.button() != Some(button) {
            return Vec::new();
        }
        let mut actions = Vec::new();
        match std::mem::take(&mut self.input) {
            InputState::Idle => {}
            InputState::Pressed { button, start, .. } => self.click(button, start, now_ms, &mut actions),
            InputState::Painting { mode, .. } => {
                debug!(?mode, selected = self.selection.len(), "paint stroke finished");
            }
            InputState::Boxing { mode, start, .. } => self.commit_box(mode, start, screen, now_ms, &mut actions),
            InputState::Panning { .. } => {}
        }
        actions.push(Action::SetCursor(self.cursor().to_string()));
        actions
    }

    /// Zoom about the cursor. Scrolling up zooms in.
    pub fn wheel(&mut self, screen: Point, delta: WheelDelta) -> Vec<Action> {
        if delta.dy == 0.0 {
            return Vec::new();
        }
        self.camera.zoom_at(screen, WHEEL_ZOOM_STEP.powf(-delta.dy / 100.0));
        self.observers.notify(Change::CameraChanged);
        vec![Action::RenderNeeded]
    }

    pub fn key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        let changed = match key.0.as_str() {
            "Escape" => return self.cancel_gesture(),
            k if modifiers.command() && k.eq_ignore_ascii_case("z") => {
                if modifiers.shift {
                    self.redo()
                } else {
                    self.undo()
                }
            }
            k if modifiers.command() && k.eq_ignore_ascii_case("y") => self.redo(),
            _ => return Vec::new(),
        };
        if changed { vec![Action::SelectionChanged, Action::RenderNeeded] } else { Vec::new() }
    }

    /// Abandon the gesture in progress and leave any sticky paint mode.
    /// Changes a paint stroke already made stay; a box commits nothing.
    pub fn cancel_gesture(&mut self) -> Vec<Action> {
        let previous = std::mem::take(&mut self.input);
        let left_paint = self.ui.sticky_paint.take().is_some();
        let mut actions = Vec::new();
        if matches!(previous, InputState::Boxing { .. }) {
            self.observers.notify(Change::PreviewChanged);
            actions.push(Action::RenderNeeded);
        }
        if left_paint || !previous.is_idle() {
            debug!("gesture cancelled");
            actions.push(Action::SetCursor(self.cursor().to_string()));
        }
        actions
    }

    // --- Selection commands ---

    /// Step the selection back one snapshot.
    pub fn undo(&mut self) -> bool {
        let changed = self.selection.undo();
        if changed {
            self.observers.notify(Change::SelectionChanged);
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.selection.redo();
        if changed {
            self.observers.notify(Change::SelectionChanged);
        }
        changed
    }

    /// Add every table in the `prefix` group (e.g. `TX1-INV2`).
    pub fn select_group(&mut self, prefix: &str) -> bool {
        let ids = self.group_ids(prefix);
        let changed = self.selection.add_many(ids.iter().map(String::as_str));
        debug!(%prefix, matched = ids.len(), changed, "group selected");
        if changed {
            self.observers.notify(Change::SelectionChanged);
        }
        changed
    }

    pub fn deselect_group(&mut self, prefix: &str) -> bool {
        let ids = self.group_ids(prefix);
        let changed = self.selection.remove_many(ids.iter().map(String::as_str));
        debug!(%prefix, matched = ids.len(), changed, "group deselected");
        if changed {
            self.observers.notify(Change::SelectionChanged);
        }
        changed
    }

    /// Add (or with [`PaintMode::Erase`] remove) every table intersecting a
    /// world-space rectangle, as one history step.
    pub fn select_region(&mut self, rect: &Bounds, mode: PaintMode) -> bool {
        let ids = selection::resolve_region(rect, self.survey.tables());
        let changed = match mode {
            PaintMode::Add => self.selection.add_many(ids.iter().map(String::as_str)),
            PaintMode::Erase => self.selection.remove_many(ids.iter().map(String::as_str)),
        };
        debug!(?mode, matched = ids.len(), changed, "region committed");
        if changed {
            self.observers.notify(Change::SelectionChanged);
        }
        changed
    }

    /// Clear the selection, its history, and the submit baseline.
    pub fn reset(&mut self) {
        self.selection.reset();
        self.submitted.clear();
        info!("selection reset");
        self.observers.notify(Change::SelectionChanged);
    }

    /// Close out a working day. Reports the DC length selected since the
    /// previous submit; afterwards the current selection can no longer be undone.
    pub fn submit(&mut self, date: &str, subcontractor: &str, workers: u32) -> DailyRecord {
        let added: SelectionSet = self.selection.current().difference(&self.submitted).cloned().collect();
        let installed_length = progress::totals(&added, &self.lengths).dc();
        self.submitted = self.selection.current().clone();
        self.selection.collapse_history();
        info!(%date, %subcontractor, workers, tables = added.len(), installed_length, "daily work submitted");
        self.observers.notify(Change::SelectionChanged);
        DailyRecord {
            date: date.to_string(),
            subcontractor: subcontractor.to_string(),
            workers,
            installed_length,
        }
    }

    /// Record a connector's installed flag directly, as when restoring a
    /// previous day's field notes.
    ///
    /// Returns `false` when the loaded survey has no connector at `(id, end)`;
    /// nothing is recorded in that case.
    pub fn set_connector(&mut self, id: &str, end: ConnectorEnd, installed: bool) -> bool {
        let known = self.survey.connectors().iter().any(|f| f.id == id && f.end == Some(end));
        if !known {
            warn!(%id, ?end, "no such connector; ignoring");
            return false;
        }
        if self.mc4.is_installed(id, end) != installed {
            self.mc4.set(id, end, installed);
            debug!(%id, ?end, installed, "connector set");
            self.observers.notify(Change::ConnectorsChanged);
        }
        true
    }

    // --- Observers ---

    /// Register a change listener for as long as the returned guard lives.
    #[must_use = "dropping the Subscription unregisters the listener immediately"]
    pub fn subscribe(&self, listener: impl FnMut(Change) + 'static) -> Subscription {
        self.observers.subscribe(listener)
    }

    // --- Queries ---

    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[must_use]
    pub fn survey(&self) -> &Survey {
        &self.survey
    }

    #[must_use]
    pub fn lengths(&self) -> &LengthTable {
        &self.lengths
    }

    /// The currently selected ids.
    #[must_use]
    pub fn selection(&self) -> &SelectionSet {
        self.selection.current()
    }

    #[must_use]
    pub fn history(&self) -> &SelectionStore {
        &self.selection
    }

    #[must_use]
    pub fn mc4(&self) -> &Mc4Status {
        &self.mc4
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn hovered(&self) -> Option<&str> {
        self.ui.hover.as_deref()
    }

    #[must_use]
    pub fn totals(&self) -> Totals {
        progress::totals(self.selection.current(), &self.lengths)
    }

    #[must_use]
    pub fn connector_stats(&self) -> ConnectorStats {
        self.mc4.stats(self.survey.tables().len())
    }

    #[must_use]
    pub fn progress(&self) -> ProgressSummary {
        ProgressSummary::compute(self.selection.current(), &self.lengths, self.connector_stats())
    }

    #[must_use]
    pub fn style_of(&self, feature: &Feature) -> Style {
        style::feature_style(feature, self.selection.current(), &self.lengths, &self.mc4)
    }

    #[must_use]
    pub fn labels(&self) -> Vec<Label> {
        style::labels(&self.survey, &self.camera)
    }

    #[must_use]
    pub fn box_preview(&self) -> Option<BoxPreview> {
        style::box_preview(&self.input)
    }

    // --- Internals ---

    fn table_at(&self, screen: Point) -> Option<String> {
        let world = self.camera.screen_to_world(screen);
        let tolerance = self.camera.screen_dist_to_world(self.config.hit_slop_px);
        hit::hit_table(world, self.survey.tables(), tolerance).map(|f| f.id.clone())
    }

    fn group_ids(&self, prefix: &str) -> Vec<String> {
        self.survey.table_ids().into_iter().filter(|id| ident::in_group(id, prefix)).collect()
    }

    fn begin_drag(
        &mut self,
        button: Button,
        start: Point,
        target: Option<String>,
        screen: Point,
        actions: &mut Vec<Action>,
    ) -> InputState {
        let mode = match PaintMode::for_button(button) {
            Some(mode) if self.ui.modes.dc => mode,
            _ => {
                self.pan(screen.x - start.x, screen.y - start.y, actions);
                actions.push(Action::SetCursor(CURSOR_PAN.to_string()));
                return InputState::Panning { button, last_screen: screen };
            }
        };
        let next = match target {
            Some(origin) => {
                debug!(?mode, %origin, "paint stroke started");
                self.paint(mode, &origin, actions);
                if let Some(id) = self.ui.hover.clone() {
                    self.paint(mode, &id, actions);
                }
                InputState::Painting { button, mode }
            }
            None => {
                debug!(?mode, "box gesture started");
                self.observers.notify(Change::PreviewChanged);
                actions.push(Action::RenderNeeded);
                InputState::Boxing { button, mode, start, current: screen }
            }
        };
        actions.push(Action::SetCursor(self.cursor_for(&next).to_string()));
        next
    }

    fn paint(&mut self, mode: PaintMode, id: &str, actions: &mut Vec<Action>) {
        let changed = match mode {
            PaintMode::Add => self.selection.add_many([id]),
            PaintMode::Erase => self.selection.remove_many([id]),
        };
        if changed {
            self.selection_changed(actions);
        }
    }

    fn click(&mut self, button: Button, at: Point, now_ms: f64, actions: &mut Vec<Action>) {
        if now_ms < self.suppress_until_ms {
            debug!(now_ms, until = self.suppress_until_ms, "click suppressed after box release");
            return;
        }
        let connectors = button == Button::Primary && self.ui.modes.mc4;
        match hit::hit_test(at, &self.survey, &self.camera, self.config.hit_slop_px, connectors) {
            Some(Hit::Connector { id, end }) => {
                let installed = self.mc4.toggle(&id, end);
                self.observers.notify(Change::ConnectorsChanged);
                actions.push(Action::ConnectorToggled { id, end, installed });
                actions.push(Action::RenderNeeded);
            }
            Some(Hit::Table(id)) if self.ui.modes.dc => {
                if let (Button::Primary, Some(mode)) = (button, self.ui.sticky_paint) {
                    debug!(%id, ?mode, "table clicked while painting");
                    self.paint(mode, &id, actions);
                    return;
                }
                let changed = match button {
                    Button::Primary => self.selection.toggle_one(&id),
                    Button::Secondary => self.selection.remove_many([id.as_str()]),
                    Button::Middle => false,
                };
                debug!(?button, %id, changed, "table clicked");
                if changed {
                    self.selection_changed(actions);
                }
            }
            _ => {}
        }
    }

    fn commit_box(&mut self, mode: PaintMode, start: Point, end: Point, now_ms: f64, actions: &mut Vec<Action>) {
        let rect = self.camera.screen_rect_to_world(start, end);
        if self.select_region(&rect, mode) {
            actions.push(Action::SelectionChanged);
            actions.push(Action::RenderNeeded);
        }
        self.suppress_until_ms = now_ms + self.config.click_suppress_ms;
        self.observers.notify(Change::PreviewChanged);
        actions.push(Action::RenderNeeded);
    }

    fn pan(&mut self, dx: f64, dy: f64, actions: &mut Vec<Action>) {
        self.camera.pan_by(dx, dy);
        self.observers.notify(Change::CameraChanged);
        actions.push(Action::RenderNeeded);
    }

    fn selection_changed(&self, actions: &mut Vec<Action>) {
        self.observers.notify(Change::SelectionChanged);
        actions.push(Action::SelectionChanged);
        actions.push(Action::RenderNeeded);
    }

    fn cursor(&self) -> &'static str {
        self.cursor_for(&self.input)
    }

    fn cursor_for(&self, state: &InputState) -> &'static str {
        match state {
            InputState::Boxing { .. } => CURSOR_BOX,
            InputState::Panning { .. } => CURSOR_PAN,
            InputState::Painting { .. } => CURSOR_PAINT,
            InputState::Idle | InputState::Pressed { .. } => {
                if self.ui.sticky_paint.is_some() {
                    CURSOR_PAINT
                } else if self.ui.hover.is_some() {
                    CURSOR_POINTER
                } else {
                    CURSOR_DEFAULT
                }
            }
        }
    }
}
