//! Built-in widgets.

/// Push button.
pub mod button;
/// Plain container.
pub mod panel;
/// Top-level window.
pub mod window;

pub use button::Button;
pub use panel::Panel;
pub use window::Window;
