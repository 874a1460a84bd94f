//! The toolkit context.
//!
//! A `Toolkit` owns the widget tree, the screen, the redraw queue, the input
//! state and the tick scheduler. There is no global state; every operation
//! goes through a context, and independent contexts do not interact.

use std::mem;

use tracing::{debug, trace};

use crate::{
    backend::{FrameBuffer, InputSource},
    config::Config,
    error::{Error, Result},
    event::{Event, EventKind, RawEvent, RawKind},
    flags::WidgetFlags,
    geom::{Point, Rect},
    id::{AppId, WidgetId},
    keycodes, keymap,
    redraw::{RedrawManager, RedrawStats},
    screen::Screen,
    tick::{TickScheduler, TickToken},
    tree::WidgetTree,
    userstate::{Hook, Mode, ModeCallbacks, UserState},
    value::Value,
    widget::{EventOutcome, MinMax, PointerCallback, Request, Widget},
};

/// A scheduled job.
pub enum Task {
    /// Key-repeat timer for a held key.
    KeyRepeat {
        /// Key being repeated.
        code: u32,
    },
    /// A user callback. Returning false stops a periodic tick.
    User(Box<dyn FnMut(&mut Toolkit) -> bool>),
}

/// An action reported to the application owning a widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Owning application.
    pub app: AppId,
    /// Widget the action came from.
    pub widget: WidgetId,
    /// Action name.
    pub action: String,
    /// Kind of the event that triggered it, if any.
    pub event: Option<EventKind>,
}

/// Running totals for a toolkit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Cycles run.
    pub cycles: u64,
    /// Raw input events processed.
    pub inputs: u64,
    /// Events delivered to widgets.
    pub events: u64,
    /// Tick firings.
    pub ticks: u64,
    /// Redraw totals.
    pub redraw: RedrawStats,
}

/// The toolkit context.
pub struct Toolkit {
    /// Active configuration.
    config: Config,
    /// Widget arena.
    tree: WidgetTree,
    /// Window stack and output.
    screen: Screen,
    /// Pending damage.
    redraw: RedrawManager,
    /// Input state.
    user: UserState,
    /// Timers.
    ticks: TickScheduler<Task>,
    /// Undelivered notifications.
    outbox: Vec<Notification>,
    /// Time of the current cycle in milliseconds.
    now: u64,
    /// Running totals.
    stats: Stats,
}

impl Toolkit {
    /// Create a context drawing to `fb`.
    pub fn init(config: Config, fb: Box<dyn FrameBuffer>) -> Result<Self> {
        config.validate()?;
        let screen = Screen::new(&config, fb);
        let user = UserState::new(screen.bounds());
        debug!(size = ?screen.size(), "toolkit initialised");
        Ok(Self {
            ticks: TickScheduler::new(config.max_ticks),
            config,
            tree: WidgetTree::new(),
            screen,
            redraw: RedrawManager::new(),
            user,
            outbox: Vec::new(),
            now: 0,
            stats: Stats::default(),
        })
    }

    /// Release every window, drop pending work and return the final totals.
    pub fn shutdown(mut self) -> Stats {
        self.idle();
        let windows: Vec<WidgetId> = self.screen.window_ids().collect();
        for w in windows {
            if let Ok(gone) = self.screen.remove(&mut self.tree, &mut self.redraw, w) {
                self.purge(&gone);
            }
        }
        self.ticks.clear();
        self.redraw.clear();
        self.stats.redraw = self.redraw.stats();
        debug!(stats = ?self.stats, "toolkit shut down");
        self.stats
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The widget tree.
    pub fn tree(&self) -> &WidgetTree {
        &self.tree
    }

    /// The screen.
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// The redraw queue.
    pub fn redraw(&self) -> &RedrawManager {
        &self.redraw
    }

    /// Input state.
    pub fn user(&self) -> &UserState {
        &self.user
    }

    /// Time of the current cycle.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Running totals.
    pub fn stats(&self) -> Stats {
        Stats {
            redraw: self.redraw.stats(),
            ..self.stats
        }
    }

    /// Pointer position.
    pub fn mouse(&self) -> Point {
        self.user.mouse()
    }

    /// Current interaction mode.
    pub fn mode(&self) -> Mode {
        self.user.mode()
    }

    /// Widget under the pointer.
    pub fn mouse_widget(&self) -> Option<WidgetId> {
        self.screen.find_widget(&self.tree, self.user.mouse())
    }

    /// Create a detached widget. The caller holds its only reference.
    pub fn create(&mut self, app: AppId, widget: impl Into<Box<dyn Widget>>) -> WidgetId {
        self.tree.create(app, widget)
    }

    /// Create a widget as the last child of `parent`.
    pub fn add_child(&mut self, parent: WidgetId, widget: impl Into<Box<dyn Widget>>) -> Result<WidgetId> {
        let id = self.tree.add_child(parent, widget)?;
        self.redraw.draw_widget(id);
        Ok(id)
    }

    /// Take a reference.
    pub fn inc_ref(&mut self, id: WidgetId) -> Result<u32> {
        self.tree.inc_ref(id)
    }

    /// Drop a reference, destroying the widget when none remain.
    pub fn dec_ref(&mut self, id: WidgetId) -> Result<()> {
        let gone = self.tree.dec_ref(id)?;
        self.purge(&gone);
        Ok(())
    }

    /// Drop a reference, ignoring dead ids.
    pub fn release(&mut self, id: WidgetId) {
        if let Err(e) = self.dec_ref(id) {
            debug!(?id, %e, "release ignored");
        }
    }

    /// Attach a detached widget under `parent`.
    pub fn attach(&mut self, parent: WidgetId, child: WidgetId) -> Result<()> {
        self.tree.attach(parent, child)?;
        self.redraw.draw_widget(child);
        Ok(())
    }

    /// Detach a widget from its parent, dropping the parent's reference.
    pub fn detach(&mut self, child: WidgetId) -> Result<()> {
        let area = self.tree.abs_rect(child);
        let visible = self.is_visible(child);
        let gone = self.tree.detach(child)?;
        if let (Some(r), true) = (area, visible) {
            self.redraw.draw_area(r);
        }
        self.purge(&gone);
        Ok(())
    }

    /// Is the widget in a window on screen?
    fn is_visible(&self, id: WidgetId) -> bool {
        self.tree
            .root_of(id)
            .is_some_and(|r| self.screen.contains(r))
    }

    /// Clear destroyed ids out of every weak slot.
    fn purge(&mut self, gone: &[WidgetId]) {
        for id in gone {
            self.user.purge(*id);
            self.redraw.purge(*id);
            self.screen.purge(*id);
        }
    }

    /// Move or resize a widget. Windows on screen are placed.
    pub fn set_geometry(&mut self, id: WidgetId, rect: Rect) -> Result<()> {
        if self.screen.contains(id) {
            return self.place(id, rect);
        }
        let old = self.tree.abs_rect(id);
        self.tree.set_geometry(id, rect)?;
        self.tree.updatepos(id)?;
        if self.is_visible(id) {
            if let Some(r) = old {
                self.redraw.draw_area(r);
            }
            self.redraw.draw_widget(id);
        }
        Ok(())
    }

    /// Override a widget's size limits. Takes effect at the next `update`.
    pub fn set_minmax(&mut self, id: WidgetId, minmax: MinMax) -> Result<()> {
        self.tree.set_minmax(id, minmax)
    }

    /// Recompute size limits and layout, then queue the affected area.
    pub fn update(&mut self, id: WidgetId) -> Result<()> {
        let target = self.tree.update(id)?;
        self.redraw.draw_widget(target);
        Ok(())
    }

    /// Queue a widget for redraw.
    pub fn draw_widget(&mut self, id: WidgetId) {
        self.redraw.draw_widget(id);
    }

    /// Queue part of a widget for redraw.
    pub fn draw_widget_area(&mut self, id: WidgetId, area: Rect) {
        self.redraw.draw_widget_area(id, area);
    }

    /// Queue a screen area for redraw.
    pub fn draw_area(&mut self, rect: Rect) {
        self.redraw.draw_area(rect);
    }

    /// Repaint what lies behind `origin` within `rect` and make it visible.
    pub fn drawbehind(&mut self, origin: WidgetId, rect: Rect) -> Result<u64> {
        let painted = self.screen.drawbehind(&mut self.tree, origin, rect)?;
        self.screen.update_area(rect);
        Ok(painted)
    }

    /// Flush up to `max_pixels` of damage.
    pub fn process_pixels(&mut self, max_pixels: u64) -> u64 {
        self.redraw
            .process_pixels(&mut self.tree, &mut self.screen, max_pixels)
    }

    /// Flush damage within a time budget.
    pub fn exec_redraw(&mut self, budget_ms: u64) -> u64 {
        self.redraw
            .exec_redraw(&mut self.tree, &mut self.screen, budget_ms)
    }

    /// Flush every pending entry.
    pub fn flush(&mut self) -> u64 {
        let mut total = 0;
        while !self.redraw.is_idle() {
            total += self.process_pixels(u64::MAX);
        }
        total
    }

    /// Place a window on screen, or move and resize it.
    pub fn place(&mut self, win: WidgetId, rect: Rect) -> Result<()> {
        self.screen
            .place(&mut self.tree, &mut self.redraw, win, rect)
    }

    /// Raise a window within its group.
    pub fn top(&mut self, win: WidgetId) -> Result<()> {
        self.screen.top(&self.tree, &mut self.redraw, win)
    }

    /// Lower a window within its group.
    pub fn back(&mut self, win: WidgetId) -> Result<()> {
        self.screen.back(&self.tree, &mut self.redraw, win)
    }

    /// Take a window off screen.
    pub fn remove_window(&mut self, win: WidgetId) -> Result<()> {
        let was_active = self.screen.active_window() == Some(win);
        let gone = self
            .screen
            .remove(&mut self.tree, &mut self.redraw, win)?;
        if was_active {
            self.user.set_kfocus(None);
        }
        self.purge(&gone);
        Ok(())
    }

    /// Keep a window above ordinary windows.
    pub fn set_stay_top(&mut self, win: WidgetId, stay_top: bool) -> Result<()> {
        self.screen
            .set_stay_top(&mut self.tree, &mut self.redraw, win, stay_top)
    }

    /// Transfer keyboard focus to a window on behalf of `requester`.
    pub fn set_active_window(&mut self, win: WidgetId, requester: AppId, force: bool) -> Result<()> {
        let events = self.screen.set_active_window(
            &mut self.tree,
            &mut self.redraw,
            win,
            requester,
            force,
        )?;
        self.user.set_kfocus(self.screen.kfocus(win));
        for (id, ev) in events {
            self.deliver(id, &ev);
        }
        Ok(())
    }

    /// Give keyboard focus within its window to `id`.
    pub fn focus(&mut self, id: WidgetId) -> Result<()> {
        let win = self.tree.root_of(id).ok_or(Error::WidgetNotFound(id))?;
        if !self.screen.contains(win) {
            return Err(Error::NotAWindow(win));
        }
        let old = self.screen.kfocus(win);
        if old == Some(id) {
            return Ok(());
        }
        let active = self.screen.active_window() == Some(win);
        if let Some(o) = old {
            let _changed = self.tree.set_flags(o, WidgetFlags::KFOCUS, false);
            self.redraw.draw_widget(o);
            if active {
                self.deliver(o, &Event::FocusOut);
            }
        }
        self.tree.set_flags(id, WidgetFlags::KFOCUS, true)?;
        self.screen.set_kfocus(win, Some(id));
        self.redraw.draw_widget(id);
        if active {
            self.user.set_kfocus(Some(id));
            self.deliver(id, &Event::FocusIn);
        }
        Ok(())
    }

    /// Bind a named action to an event kind on a widget.
    pub fn bind(&mut self, id: WidgetId, kind: EventKind, action: impl Into<String>) -> Result<()> {
        self.tree.bind(id, kind, action)
    }

    /// Remove a binding.
    pub fn unbind(&mut self, id: WidgetId, kind: EventKind) -> Result<bool> {
        self.tree.unbind(id, kind)
    }

    /// Read an attribute.
    pub fn get_attr(&self, id: WidgetId, name: &str) -> Option<Value> {
        self.tree.get_attr(id, name)
    }

    /// Write an attribute and queue the widget for redraw.
    pub fn set_attr(&mut self, id: WidgetId, name: &str, value: Value) -> Result<()> {
        let old = self.tree.abs_rect(id);
        self.tree.set_attr(id, name, value)?;
        if matches!(name, "x" | "y" | "w" | "h") {
            self.tree.updatepos(id)?;
            if let Some(r) = old {
                self.redraw.draw_area(r);
            }
        }
        self.redraw.draw_widget(id);
        Ok(())
    }

    /// Invoke a widget method and queue the widget for redraw.
    pub fn call(&mut self, id: WidgetId, method: &str, args: &[Value]) -> Result<Value> {
        let v = self.tree.call(id, method, args)?;
        self.redraw.draw_widget(id);
        Ok(v)
    }

    /// Report an action to the application owning `id`.
    pub fn notify(&mut self, id: WidgetId, action: impl Into<String>) {
        self.push_notification(id, action.into(), None);
    }

    /// Queue a notification.
    fn push_notification(&mut self, id: WidgetId, action: String, event: Option<EventKind>) {
        let Some(app) = self.tree.app(id) else {
            debug!(?id, "notification from dead widget dropped");
            return;
        };
        trace!(%app, ?id, action = %action, "notify");
        self.outbox.push(Notification {
            app,
            widget: id,
            action,
            event,
        });
    }

    /// Drain pending notifications.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        mem::take(&mut self.outbox)
    }

    /// Run `f` after `delay` milliseconds, then every `period` milliseconds
    /// while it returns true. A zero period runs it once.
    pub fn schedule(
        &mut self,
        delay: u64,
        period: u64,
        f: impl FnMut(&mut Self) -> bool + 'static,
    ) -> Result<TickToken> {
        self.ticks
            .schedule(self.now, delay, period, Task::User(Box::new(f)))
    }

    /// Cancel a scheduled tick.
    pub fn cancel_tick(&mut self, token: TickToken) -> bool {
        self.ticks.cancel(token)
    }

    /// Number of live ticks.
    pub fn tick_count(&self) -> usize {
        self.ticks.len()
    }

    /// Enter TOUCH mode on a widget.
    pub fn touch(
        &mut self,
        id: WidgetId,
        tick: Option<PointerCallback>,
        release: Option<PointerCallback>,
    ) -> Result<()> {
        self.enter_mode(
            Mode::Touch,
            id,
            ModeCallbacks {
                motion: None,
                tick,
                release,
            },
        )
    }

    /// Enter DRAG mode on a widget.
    pub fn drag(
        &mut self,
        id: WidgetId,
        motion: Option<PointerCallback>,
        tick: Option<PointerCallback>,
        release: Option<PointerCallback>,
    ) -> Result<()> {
        self.enter_mode(
            Mode::Drag,
            id,
            ModeCallbacks {
                motion,
                tick,
                release,
            },
        )
    }

    /// Enter GRAB mode on a widget. The pointer is pinned where it is.
    pub fn grab(&mut self, id: WidgetId, tick: Option<PointerCallback>) -> Result<()> {
        self.enter_mode(
            Mode::Grab,
            id,
            ModeCallbacks {
                motion: None,
                tick,
                release: None,
            },
        )?;
        self.screen.set_mouse_pos(self.user.mouse());
        Ok(())
    }

    /// Shared mode entry. A mode already in progress is ended first.
    fn enter_mode(&mut self, mode: Mode, id: WidgetId, callbacks: ModeCallbacks) -> Result<()> {
        if !self.tree.contains(id) {
            return Err(Error::WidgetNotFound(id));
        }
        if self.user.mode() != Mode::Idle {
            self.idle();
        }
        if !self.tree.contains(id) {
            return Err(Error::WidgetNotFound(id));
        }
        self.user.begin(mode, id, callbacks);
        self.tree.set_flags(id, WidgetFlags::STATE, true)?;
        self.redraw.draw_widget(id);
        Ok(())
    }

    /// End the current mode, running its release callback once with the
    /// final delta.
    pub fn idle(&mut self) {
        let Some(ended) = self.user.end() else {
            return;
        };
        if self
            .tree
            .set_flags(ended.widget, WidgetFlags::STATE, false)
            .is_ok()
        {
            self.redraw.draw_widget(ended.widget);
        }
        if let Some(mut cb) = ended.release {
            cb(self, ended.widget, ended.delta.0, ended.delta.1);
        }
    }

    /// Deliver an event to a widget, bubbling as configured, and apply the
    /// resulting requests. Errors are logged and dropped.
    pub fn deliver(&mut self, id: WidgetId, event: &Event) -> EventOutcome {
        let mut requests = Vec::new();
        let mouse = self.user.mouse();
        let outcome = match self.tree.handle_event(id, event, mouse, &mut requests) {
            Ok(o) => o,
            Err(e) => {
                debug!(?id, %e, "event dropped");
                EventOutcome::Ignore
            }
        };
        self.stats.events += 1;
        self.apply(requests, Some(event.kind()));
        outcome
    }

    /// Apply requests collected during event handling.
    fn apply(&mut self, requests: Vec<Request>, kind: Option<EventKind>) {
        for req in requests {
            let res = match req {
                Request::Redraw(id) => {
                    self.redraw.draw_widget(id);
                    Ok(())
                }
                Request::Update(id) => self.update(id),
                Request::Touch { id, tick, release } => self.touch(id, tick, release),
                Request::Drag {
                    id,
                    motion,
                    tick,
                    release,
                } => self.drag(id, motion, tick, release),
                Request::Grab { id, tick } => self.grab(id, tick),
                Request::Focus(id) => self.focus(id),
                Request::Notify { id, action } => {
                    self.push_notification(id, action, kind);
                    Ok(())
                }
            };
            if let Err(e) = res {
                debug!(%e, "request refused");
            }
        }
    }

    /// Where keyboard events go.
    fn keyboard_target(&self) -> Option<WidgetId> {
        self.user.kfocus().or(self.screen.active_window())
    }

    /// Process one raw input event.
    pub fn handle_raw(&mut self, ev: RawEvent) {
        self.stats.inputs += 1;
        trace!(?ev, "raw input");
        match ev.kind {
            RawKind::Press => self.press(ev.code),
            RawKind::Release => self.release_key(ev.code),
            RawKind::Motion => {
                if self.user.move_rel(ev.rel_x, ev.rel_y) {
                    self.moved();
                }
            }
            RawKind::AbsMotion => {
                if self.user.move_abs(Point::new(ev.rel_x, ev.rel_y)) {
                    self.moved();
                }
            }
        }
    }

    /// Handle a key or button press.
    fn press(&mut self, code: u32) {
        if code > keycodes::KEY_MAX || !self.user.press(code) {
            return;
        }
        if keycodes::is_mouse_button(code) {
            self.focus_from_pointer();
            if let Some(target) = self.user.selected() {
                self.deliver(target, &Event::Press { code, ascii: None });
            }
            return;
        }
        let ascii = keymap::ascii(code, self.user.mods());
        if let Some(target) = self.keyboard_target() {
            self.deliver(target, &Event::Press { code, ascii });
        }
        if keycodes::is_modifier(code) {
            return;
        }
        let (delay, rate) = (self.config.key_repeat_delay_ms, self.config.key_repeat_rate_ms);
        match self
            .ticks
            .schedule(self.now, delay, rate, Task::KeyRepeat { code })
        {
            Ok(token) => self.user.arm_repeat(code, token),
            Err(e) => debug!(code, %e, "key repeat not armed"),
        }
    }

    /// Handle a key or button release.
    fn release_key(&mut self, code: u32) {
        if !self.user.release(code) {
            return;
        }
        if keycodes::is_mouse_button(code) {
            if let Some(target) = self.user.selected() {
                self.deliver(target, &Event::Release { code });
            }
            if !self.user.any_button() && self.user.mode() != Mode::Idle {
                self.idle();
            }
            return;
        }
        if let Some(token) = self.user.disarm_repeat(code) {
            self.ticks.cancel(token);
        }
        if let Some(target) = self.keyboard_target() {
            self.deliver(target, &Event::Release { code });
        }
    }

    /// Follow pointer motion.
    fn moved(&mut self) {
        let p = self.user.mouse();
        self.screen.set_mouse_pos(p);
        let target = match self.user.mode() {
            Mode::Idle => self.mouse_widget(),
            _ => self.user.mode_widget(),
        };
        if let Some(t) = target {
            self.deliver(t, &Event::Motion { x: p.x, y: p.y });
        }
    }

    /// A button press selects the widget under the pointer, activates its
    /// window and moves keyboard focus to it if it accepts focus.
    fn focus_from_pointer(&mut self) {
        let w = self.mouse_widget();
        self.user.set_selected(w);
        let Some(w) = w else {
            return;
        };
        let Some(win) = self.tree.root_of(w) else {
            return;
        };
        if let Err(e) = self.set_active_window(win, AppId::SERVER, true) {
            debug!(?win, %e, "activation failed");
        }
        let focusable = self.tree.flags(w).intersects(WidgetFlags::FOCUSABLE);
        if focusable
            && self.screen.kfocus(win) != Some(w)
            && let Err(e) = self.focus(w)
        {
            debug!(?w, %e, "focus failed");
        }
    }

    /// Track the widget under the pointer, sending Leave and Enter. Skipped
    /// while a mouse button is held.
    pub fn update_mfocus(&mut self) {
        if self.user.any_button() {
            return;
        }
        let now = self.mouse_widget();
        let old = self.user.mfocus();
        if now == old {
            return;
        }
        self.user.set_mfocus(now);
        if let Some(o) = old
            && self.tree.set_flags(o, WidgetFlags::MFOCUS, false).is_ok()
        {
            self.deliver(o, &Event::Leave);
        }
        if let Some(n) = now
            && self.tree.set_flags(n, WidgetFlags::MFOCUS, true).is_ok()
        {
            self.deliver(n, &Event::Enter);
        }
    }

    /// Run the current mode's motion and tick callbacks.
    fn run_mode_hooks(&mut self) {
        for hook in [Hook::Motion, Hook::Tick] {
            if let Some((generation, id, (dx, dy), mut cb)) = self.user.take_hook(hook) {
                cb(self, id, dx, dy);
                self.user.restore_hook(hook, generation, cb);
            }
        }
    }

    /// Fire every tick due at `now`.
    fn run_ticks(&mut self, now: u64) -> u64 {
        let mut fired = 0;
        while let Some(mut due) = self.ticks.pop_due(now) {
            let rearm = match &mut due.task {
                Task::KeyRepeat { code } => self.key_repeat(*code, due.token),
                Task::User(f) => f(self),
            };
            self.ticks.finish(due, rearm);
            fired += 1;
        }
        fired
    }

    /// A key-repeat tick fired. The first firing ends the initial delay;
    /// each later one sends a repeat to the keyboard focus.
    fn key_repeat(&mut self, code: u32, token: TickToken) -> bool {
        let Some(rep) = self.user.repeat(code) else {
            return false;
        };
        if rep.token != token || !self.user.is_pressed(code) {
            return false;
        }
        if !rep.repeating {
            self.user.start_repeating(code);
            return true;
        }
        let ascii = keymap::ascii(code, self.user.mods());
        if let Some(target) = self.keyboard_target() {
            self.deliver(target, &Event::KeyRepeat { code, ascii });
        }
        true
    }

    /// Run one cycle at time `now`: drain input, track mouse focus, run the
    /// mode callbacks, fire due ticks, then flush the redraw queue within the
    /// configured pixel budget. Returns the pixels composited.
    pub fn cycle(&mut self, now: u64, input: &mut dyn InputSource) -> u64 {
        self.now = self.now.max(now);
        while let Some(ev) = input.poll() {
            self.handle_raw(ev);
        }
        self.update_mfocus();
        self.run_mode_hooks();
        self.stats.ticks += self.run_ticks(self.now);
        self.stats.cycles += 1;
        let budget = self.config.pixel_budget();
        self.process_pixels(budget)
    }
}
