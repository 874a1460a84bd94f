/// In-memory framebuffer.
pub mod buf;
/// Scripted input.
pub mod input;
/// Test widgets.
pub mod widgets;

pub use buf::{FrameState, MemoryFrameBuffer};
pub use input::ScriptedInput;
pub use widgets::{Fill, Recorder, RecorderLog};
