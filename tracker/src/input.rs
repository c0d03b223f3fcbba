//! Input model: buttons, modifier keys, tracking modes, and the gesture state machine.
//!
//! `Button` and `Modifiers` capture the user's intent at the time of a
//! pointer event. `InputState` is the gesture being tracked between
//! pointer-down and pointer-up, carrying what the session needs to decide on
//! release whether the press was a click, a paint stroke, or a box.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::Serialize;

use crate::camera::Point;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// Meta / Command key; treated like Ctrl for shortcuts.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button: select.
    Primary,
    /// Middle mouse button: pan.
    Middle,
    /// Right mouse button: deselect.
    Secondary,
}

/// A keyboard key as reported by the host (e.g. `"Escape"`, `"z"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

/// Wheel / trackpad scroll delta in pixels.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    pub dx: f64,
    /// Positive scrolls down, which zooms out.
    pub dy: f64,
}

/// Whether a gesture adds tables to the selection or removes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaintMode {
    Add,
    Erase,
}

impl PaintMode {
    /// Primary selects, secondary deselects; other buttons do neither.
    #[must_use]
    pub fn for_button(button: Button) -> Option<Self> {
        match button {
            Button::Primary => Some(Self::Add),
            Button::Secondary => Some(Self::Erase),
            Button::Middle => None,
        }
    }
}

/// Which progress layer a mode toggle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackMode {
    /// DC cable pulling: table selection.
    Dc,
    /// MC4 connector installation: endpoint toggles.
    Mc4,
}

/// Which progress layers accept gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActiveModes {
    pub dc: bool,
    pub mc4: bool,
}

impl Default for ActiveModes {
    fn default() -> Self {
        Self { dc: true, mc4: true }
    }
}

impl ActiveModes {
    #[must_use]
    pub fn is_on(self, mode: TrackMode) -> bool {
        match mode {
            TrackMode::Dc => self.dc,
            TrackMode::Mc4 => self.mc4,
        }
    }

    pub fn toggle(&mut self, mode: TrackMode) {
        match mode {
            TrackMode::Dc => self.dc = !self.dc,
            TrackMode::Mc4 => self.mc4 = !self.mc4,
        }
    }
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub modes: ActiveModes,
    /// Paint mode entered from the toolbar; stays on until exited.
    pub sticky_paint: Option<PaintMode>,
    /// Id of the selectable table under the pointer.
    pub hover: Option<String>,
}

/// Internal state for the input state machine.
///
/// Each active variant carries the gesture context needed on pointer-up.
/// Points are in screen pixels.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// A button is down but the pointer has not yet travelled past the drag threshold.
    Pressed {
        button: Button,
        start: Point,
        /// Table under the pointer at press time.
        target: Option<String>,
    },
    /// Dragging across tables, adding or erasing each one entered.
    Painting { button: Button, mode: PaintMode },
    /// Dragging out a selection rectangle from empty space.
    Boxing {
        button: Button,
        mode: PaintMode,
        start: Point,
        /// Latest pointer position; the rectangle resolves against this on release.
        current: Point,
    },
    /// Middle-button drag (or any drag while DC selection is off).
    Panning {
        button: Button,
        /// Position at the previous pointer event, used to compute the pan delta.
        last_screen: Point,
    },
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The button driving the gesture, if any.
    #[must_use]
    pub fn button(&self) -> Option<Button> {
        match self {
            Self::Idle => None,
            Self::Pressed { button, .. }
            | Self::Painting { button, .. }
            | Self::Boxing { button, .. }
            | Self::Panning { button, .. } => Some(*button),
        }
    }
}
