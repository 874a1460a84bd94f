//! Core types: the widget arena, compositor, input state machine and the
//! toolkit context tying them together.

/// Platform driver interfaces.
pub mod backend;
/// Colours and the drawing surface.
pub mod canvas;
/// Clipping stack.
pub mod clip;
/// Toolkit configuration.
pub mod config;
/// Debug dump utilities.
pub mod dump;
/// Core error types.
pub mod error;
/// Input event types.
pub mod event;
/// Widget flags.
pub mod flags;
/// Widget and application ids.
pub mod id;
/// Linux input keycodes.
pub mod keycodes;
/// Keycode to ASCII translation.
pub mod keymap;
/// Log subscriber setup.
pub mod logging;
/// Node records stored in the arena.
pub mod node;
/// Deferred redraw queue.
pub mod redraw;
/// Window stack and compositor.
pub mod screen;
/// Testing utilities.
#[cfg(any(test, feature = "testing"))]
pub mod testing;
/// Deadline-ordered timers.
pub mod tick;
/// The toolkit context.
pub mod toolkit;
/// Widget arena.
pub mod tree;
/// Input state machine.
pub mod userstate;
/// Attribute values.
pub mod value;

pub use id::{AppId, WidgetId};
pub use screen::Screen;
pub use toolkit::{Notification, Toolkit};
pub use tree::WidgetTree;
