//! Pointer and keyboard state: the interaction mode machine, focus slots, the
//! pressed-key table and key-repeat bookkeeping.
//!
//! Focus slots hold weak ids. They do not keep a widget alive and are cleared
//! when the widget is destroyed.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::{
    geom::{Point, Rect},
    id::WidgetId,
    keycodes,
    keymap::Mods,
    tick::TickToken,
    widget::PointerCallback,
};

/// Interaction modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// No interaction in progress.
    #[default]
    Idle,
    /// A widget is held down.
    Touch,
    /// A widget follows pointer motion.
    Drag,
    /// The pointer is pinned and relative motion goes to a widget.
    Grab,
}

/// Callbacks registered when entering a mode.
#[derive(Default)]
pub struct ModeCallbacks {
    /// Called once per cycle in DRAG when the pointer moved.
    pub motion: Option<PointerCallback>,
    /// Called once per cycle while the mode lasts.
    pub tick: Option<PointerCallback>,
    /// Called once when the mode ends.
    pub release: Option<PointerCallback>,
}

/// Which mode callback to check out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hook {
    /// The motion callback.
    Motion,
    /// The tick callback.
    Tick,
}

/// A mode in progress.
struct ActiveMode {
    /// Mode kind.
    mode: Mode,
    /// Widget the mode acts on.
    widget: WidgetId,
    /// Identifies this activation, so checked-out callbacks are not restored
    /// into a later one.
    generation: u64,
    /// Pointer position when the mode began.
    start: Point,
    /// Cumulative pointer delta since the mode began.
    delta: (i32, i32),
    /// The pointer moved since the last motion callback.
    moved: bool,
    /// Registered callbacks.
    callbacks: ModeCallbacks,
}

/// A finished mode, handed back so its release callback can run.
pub(crate) struct Ended {
    /// Widget the mode acted on.
    pub widget: WidgetId,
    /// Final cumulative delta.
    pub delta: (i32, i32),
    /// Release callback.
    pub release: Option<PointerCallback>,
}

/// Key-repeat state of a held key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Repeat {
    /// Scheduled repeat tick.
    pub token: TickToken,
    /// The initial delay has passed.
    pub repeating: bool,
}

/// Input state.
pub struct UserState {
    /// Pointer position.
    mouse: Point,
    /// Area the pointer is confined to.
    bounds: Rect,
    /// Keys and buttons currently held.
    pressed: HashSet<u32>,
    /// Repeat bookkeeping for held keys.
    repeats: HashMap<u32, Repeat>,
    /// Current mode, if not idle.
    active: Option<ActiveMode>,
    /// Activation counter.
    generation: u64,
    /// Widget last clicked.
    selected: Option<WidgetId>,
    /// Widget under the pointer.
    mfocus: Option<WidgetId>,
    /// Widget holding keyboard focus.
    kfocus: Option<WidgetId>,
}

impl UserState {
    /// Fresh state with the pointer at the centre of `bounds`.
    pub fn new(bounds: Rect) -> Self {
        let centre = Point::new(
            bounds.tl.x + (bounds.w / 2) as i32,
            bounds.tl.y + (bounds.h / 2) as i32,
        );
        Self {
            mouse: centre,
            bounds,
            pressed: HashSet::new(),
            repeats: HashMap::new(),
            active: None,
            generation: 0,
            selected: None,
            mfocus: None,
            kfocus: None,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.active.as_ref().map_or(Mode::Idle, |m| m.mode)
    }

    /// Widget the current mode acts on.
    pub fn mode_widget(&self) -> Option<WidgetId> {
        self.active.as_ref().map(|m| m.widget)
    }

    /// Cumulative pointer delta of the current mode.
    pub fn mode_delta(&self) -> Option<(i32, i32)> {
        self.active.as_ref().map(|m| m.delta)
    }

    /// Pointer position.
    pub fn mouse(&self) -> Point {
        self.mouse
    }

    /// Widget last clicked.
    pub fn selected(&self) -> Option<WidgetId> {
        self.selected
    }

    /// Widget under the pointer.
    pub fn mfocus(&self) -> Option<WidgetId> {
        self.mfocus
    }

    /// Widget holding keyboard focus.
    pub fn kfocus(&self) -> Option<WidgetId> {
        self.kfocus
    }

    /// Set the clicked widget.
    pub(crate) fn set_selected(&mut self, id: Option<WidgetId>) {
        self.selected = id;
    }

    /// Set the widget under the pointer.
    pub(crate) fn set_mfocus(&mut self, id: Option<WidgetId>) {
        self.mfocus = id;
    }

    /// Set the keyboard focus widget.
    pub(crate) fn set_kfocus(&mut self, id: Option<WidgetId>) {
        self.kfocus = id;
    }

    /// Modifier state derived from the held keys.
    pub fn mods(&self) -> Mods {
        Mods::from_pressed(|c| self.pressed.contains(&c))
    }

    /// Is a key or button held?
    pub fn is_pressed(&self, code: u32) -> bool {
        self.pressed.contains(&code)
    }

    /// Is any mouse button held?
    pub fn any_button(&self) -> bool {
        self.pressed.iter().any(|c| keycodes::is_mouse_button(*c))
    }

    /// Record a press. Returns false if the key was already held.
    pub(crate) fn press(&mut self, code: u32) -> bool {
        self.pressed.insert(code)
    }

    /// Record a release. Returns false if the key was not held.
    pub(crate) fn release(&mut self, code: u32) -> bool {
        self.pressed.remove(&code)
    }

    /// Repeat state of a key.
    pub(crate) fn repeat(&self, code: u32) -> Option<Repeat> {
        self.repeats.get(&code).copied()
    }

    /// Track a newly armed repeat.
    pub(crate) fn arm_repeat(&mut self, code: u32, token: TickToken) {
        self.repeats.insert(
            code,
            Repeat {
                token,
                repeating: false,
            },
        );
    }

    /// Mark a key as past its initial delay.
    pub(crate) fn start_repeating(&mut self, code: u32) {
        if let Some(r) = self.repeats.get_mut(&code) {
            r.repeating = true;
        }
    }

    /// Stop tracking a repeat, returning its token for cancellation.
    pub(crate) fn disarm_repeat(&mut self, code: u32) -> Option<TickToken> {
        self.repeats.remove(&code).map(|r| r.token)
    }

    /// Clamp a point to the pointer bounds.
    fn clamp(&self, p: Point) -> Point {
        self.bounds.clamp_point(p).unwrap_or(self.bounds.tl)
    }

    /// Enter a mode. Any mode in progress must have been ended first.
    pub(crate) fn begin(&mut self, mode: Mode, widget: WidgetId, callbacks: ModeCallbacks) {
        self.generation += 1;
        debug!(?mode, ?widget, "mode begin");
        self.active = Some(ActiveMode {
            mode,
            widget,
            generation: self.generation,
            start: self.mouse,
            delta: (0, 0),
            moved: false,
            callbacks,
        });
    }

    /// Leave the current mode.
    pub(crate) fn end(&mut self) -> Option<Ended> {
        let m = self.active.take()?;
        debug!(mode = ?m.mode, widget = ?m.widget, delta = ?m.delta, "mode end");
        Some(Ended {
            widget: m.widget,
            delta: m.delta,
            release: m.callbacks.release,
        })
    }

    /// Move the pointer by a relative amount. In GRAB the pointer stays
    /// pinned and only the mode delta accumulates. Returns whether anything
    /// changed.
    pub(crate) fn move_rel(&mut self, dx: i32, dy: i32) -> bool {
        let target = self.mouse.offset(dx, dy);
        self.move_to(target, (dx, dy))
    }

    /// Move the pointer to an absolute position.
    pub(crate) fn move_abs(&mut self, p: Point) -> bool {
        let d = (p.x.saturating_sub(self.mouse.x), p.y.saturating_sub(self.mouse.y));
        self.move_to(p, d)
    }

    /// Shared motion handling.
    fn move_to(&mut self, target: Point, rel: (i32, i32)) -> bool {
        if let Some(m) = self.active.as_mut()
            && m.mode == Mode::Grab
        {
            if rel == (0, 0) {
                return false;
            }
            m.delta = (m.delta.0.saturating_add(rel.0), m.delta.1.saturating_add(rel.1));
            m.moved = true;
            return true;
        }
        let next = self.clamp(target);
        if next == self.mouse {
            return false;
        }
        self.mouse = next;
        if let Some(m) = self.active.as_mut() {
            m.delta = (next.x - m.start.x, next.y - m.start.y);
            m.moved = true;
        }
        true
    }

    /// Check out a mode callback. Returns the callback with the activation
    /// it belongs to, the target widget and the current delta. The motion
    /// callback is only handed out in DRAG after the pointer moved.
    pub(crate) fn take_hook(&mut self, hook: Hook) -> Option<(u64, WidgetId, (i32, i32), PointerCallback)> {
        let m = self.active.as_mut()?;
        let cb = match hook {
            Hook::Tick => m.callbacks.tick.take()?,
            Hook::Motion => {
                if m.mode != Mode::Drag || !m.moved {
                    return None;
                }
                m.moved = false;
                m.callbacks.motion.take()?
            }
        };
        Some((m.generation, m.widget, m.delta, cb))
    }

    /// Return a checked-out callback, unless its mode has since ended.
    pub(crate) fn restore_hook(&mut self, hook: Hook, generation: u64, cb: PointerCallback) {
        if let Some(m) = self.active.as_mut()
            && m.generation == generation
        {
            match hook {
                Hook::Tick => m.callbacks.tick = Some(cb),
                Hook::Motion => m.callbacks.motion = Some(cb),
            }
        }
    }

    /// Forget a destroyed widget. A mode acting on it ends without its
    /// release callback.
    pub(crate) fn purge(&mut self, id: WidgetId) {
        for slot in [&mut self.selected, &mut self.mfocus, &mut self.kfocus] {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        if self.mode_widget() == Some(id) {
            self.active = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> UserState {
        UserState::new(Rect::new(0, 0, 100, 100))
    }

    #[test]
    fn motion_is_clamped() {
        let mut s = state();
        assert_eq!(s.mouse(), Point::new(50, 50));
        assert!(s.move_rel(-80, 10));
        assert_eq!(s.mouse(), Point::new(0, 60));
        assert!(s.move_abs(Point::new(500, 500)));
        assert_eq!(s.mouse(), Point::new(99, 99));
        assert!(!s.move_rel(5, 5));
    }

    #[test]
    fn grab_pins_pointer() {
        let mut s = state();
        s.begin(Mode::Grab, WidgetId::default(), ModeCallbacks::default());
        assert!(s.move_rel(5, 0));
        assert!(s.move_rel(0, 5));
        assert_eq!(s.mouse(), Point::new(50, 50));
        assert_eq!(s.mode_delta(), Some((5, 5)));
        let ended = s.end();
        assert!(ended.is_some_and(|e| e.delta == (5, 5)));
        assert_eq!(s.mode(), Mode::Idle);
    }

    #[test]
    fn motion_hook_only_after_moving() {
        let mut s = state();
        let cb: PointerCallback = Box::new(|_, _, _, _| {});
        s.begin(
            Mode::Drag,
            WidgetId::default(),
            ModeCallbacks {
                motion: Some(cb),
                ..Default::default()
            },
        );
        assert!(s.take_hook(Hook::Motion).is_none());
        s.move_rel(3, 4);
        let (generation, _, delta, cb) = s.take_hook(Hook::Motion).expect("motion hook");
        assert_eq!(delta, (3, 4));
        assert!(s.take_hook(Hook::Motion).is_none());
        s.restore_hook(Hook::Motion, generation, cb);

        s.end();
        s.begin(Mode::Drag, WidgetId::default(), ModeCallbacks::default());
        s.move_rel(1, 1);
        assert!(s.take_hook(Hook::Motion).is_none());
    }

    #[test]
    fn modifiers_follow_keys() {
        let mut s = state();
        assert!(s.press(keycodes::KEY_LEFTSHIFT));
        assert!(!s.press(keycodes::KEY_LEFTSHIFT));
        assert_eq!(s.mods(), Mods::SHIFT);
        assert!(s.release(keycodes::KEY_LEFTSHIFT));
        assert_eq!(s.mods(), Mods::NONE);
        assert!(!s.any_button());
        s.press(keycodes::BTN_LEFT);
        assert!(s.any_button());
    }
}
