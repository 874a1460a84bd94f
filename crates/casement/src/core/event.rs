//! Raw input events from the platform driver and the semantic events
//! delivered to widgets.

use serde::{Deserialize, Serialize};

/// Kinds of semantic events. The discriminants are the wire codes shared
/// with the client library and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventKind {
    /// A key or button went down.
    Press = 1,
    /// A key or button went up.
    Release = 2,
    /// The pointer moved.
    Motion = 3,
    /// The pointer entered the widget.
    Enter = 4,
    /// The pointer left the widget.
    Leave = 5,
    /// A held key auto-repeated.
    KeyRepeat = 6,
    /// The widget gained keyboard focus.
    FocusIn = 7,
    /// The widget lost keyboard focus.
    FocusOut = 8,
}

impl EventKind {
    /// Stable wire code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Decode a wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => Self::Press,
            2 => Self::Release,
            3 => Self::Motion,
            4 => Self::Enter,
            5 => Self::Leave,
            6 => Self::KeyRepeat,
            7 => Self::FocusIn,
            8 => Self::FocusOut,
            _ => return None,
        })
    }
}

/// An event delivered to a widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A key or mouse button was pressed.
    Press {
        /// Keycode.
        code: u32,
        /// ASCII translation under the current modifiers, if any.
        ascii: Option<char>,
    },
    /// A key or mouse button was released.
    Release {
        /// Keycode.
        code: u32,
    },
    /// The pointer moved to an absolute screen position.
    Motion {
        /// Pointer column.
        x: i32,
        /// Pointer row.
        y: i32,
    },
    /// The pointer entered the widget.
    Enter,
    /// The pointer left the widget.
    Leave,
    /// A held key auto-repeated.
    KeyRepeat {
        /// Keycode.
        code: u32,
        /// ASCII translation under the current modifiers, if any.
        ascii: Option<char>,
    },
    /// Keyboard focus arrived.
    FocusIn,
    /// Keyboard focus left.
    FocusOut,
}

impl Event {
    /// The kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Press { .. } => EventKind::Press,
            Self::Release { .. } => EventKind::Release,
            Self::Motion { .. } => EventKind::Motion,
            Self::Enter => EventKind::Enter,
            Self::Leave => EventKind::Leave,
            Self::KeyRepeat { .. } => EventKind::KeyRepeat,
            Self::FocusIn => EventKind::FocusIn,
            Self::FocusOut => EventKind::FocusOut,
        }
    }

    /// The keycode carried by key events.
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Press { code, .. } | Self::Release { code } | Self::KeyRepeat { code, .. } => {
                Some(*code)
            }
            _ => None,
        }
    }
}

/// Kinds of raw events produced by the platform input driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawKind {
    /// Key or button down.
    Press,
    /// Key or button up.
    Release,
    /// Relative pointer motion in `rel_x`/`rel_y`.
    Motion,
    /// Absolute pointer position in `rel_x`/`rel_y`.
    AbsMotion,
}

/// A raw input event as polled from the platform driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Event kind.
    pub kind: RawKind,
    /// Keycode for press and release.
    pub code: u32,
    /// Horizontal motion (relative or absolute).
    pub rel_x: i32,
    /// Vertical motion (relative or absolute).
    pub rel_y: i32,
}

impl RawEvent {
    /// A press of `code`.
    pub fn press(code: u32) -> Self {
        Self {
            kind: RawKind::Press,
            code,
            rel_x: 0,
            rel_y: 0,
        }
    }

    /// A release of `code`.
    pub fn release(code: u32) -> Self {
        Self {
            kind: RawKind::Release,
            code,
            rel_x: 0,
            rel_y: 0,
        }
    }

    /// Relative pointer motion.
    pub fn motion(dx: i32, dy: i32) -> Self {
        Self {
            kind: RawKind::Motion,
            code: 0,
            rel_x: dx,
            rel_y: dy,
        }
    }

    /// Absolute pointer motion.
    pub fn abs_motion(x: i32, y: i32) -> Self {
        Self {
            kind: RawKind::AbsMotion,
            code: 0,
            rel_x: x,
            rel_y: y,
        }
    }
}
