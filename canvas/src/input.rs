//! Input model: modifier keys, mouse buttons, wheel deltas and the gesture state machine.
//!
//! `InputState` is the gesture being tracked between pointer-down and
//! pointer-up. Painting never lives here: a paint attempt is resolved and
//! finished inside the pointer-down handler, so the machine goes straight
//! back to `Idle`.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::viewport::Point;

/// Keyboard modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Whether the modifier that turns a primary drag into a pan is held.
    #[must_use]
    pub fn pans(self) -> bool {
        self.shift
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` code.
    #[must_use]
    pub fn from_dom(code: i16) -> Self {
        match code {
            1 => Self::Middle,
            2 => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// What a pointer-down starts, given the button and modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Pan,
    Paint,
    Share,
}

/// Classify a pointer-down.
#[must_use]
pub fn classify(button: Button, modifiers: Modifiers) -> Gesture {
    match button {
        Button::Middle => Gesture::Pan,
        Button::Primary if modifiers.pans() => Gesture::Pan,
        Button::Primary => Gesture::Paint,
        Button::Secondary => Gesture::Share,
    }
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; pointer moves update the hover cell.
    #[default]
    Idle,
    /// Dragging the board around.
    Panning {
        /// Screen position of the previous pointer event, used to compute the pan delta.
        last_screen: Point,
    },
    /// Dragging inside the minimap; each move recenters the main view.
    MinimapDrag,
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
