use bitflags::bitflags;

bitflags! {
    /// Per-widget state bits kept in the node record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WidgetFlags: u32 {
        /// Pressed/selected look, set while a touch interaction is active.
        const STATE = 1 << 0;
        /// The pointer is over this widget.
        const MFOCUS = 1 << 1;
        /// This widget receives keyboard input within its window.
        const KFOCUS = 1 << 2;
        /// The widget may take keyboard focus when clicked.
        const SELECTABLE = 1 << 3;
        /// The widget edits text.
        const EDITABLE = 1 << 4;
        /// Clicking the widget always grabs keyboard focus.
        const GRAB_FOCUS = 1 << 5;
        /// The widget paints every pixel of its rectangle.
        const CONCEALING = 1 << 6;
        /// Unhandled events bubble to the parent.
        const PROPAGATE = 1 << 7;
        /// Window is the active (keyboard-focused) window.
        const ACTIVE = 1 << 8;
        /// Window stays above ordinary windows.
        const STAY_TOP = 1 << 9;
    }
}

impl WidgetFlags {
    /// Flags that make a widget eligible for click-to-focus.
    pub const FOCUSABLE: Self = Self::SELECTABLE.union(Self::GRAB_FOCUS);
}
