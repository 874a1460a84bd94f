//! Integration tests for input dispatch, interaction modes and focus.

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        rc::Rc,
    };

    use casement::{
        AppId, Notification, Toolkit, WidgetId,
        canvas::Color,
        config::Config,
        error::{Error, Result},
        event::{Event, EventKind, RawEvent},
        flags::WidgetFlags,
        geom::{Expanse, Point, Rect},
        keycodes::{BTN_LEFT, KEY_A, KEY_ENTER, KEY_LEFTSHIFT},
        testing::{MemoryFrameBuffer, Recorder, RecorderLog, ScriptedInput},
        userstate::Mode,
        widget::{EventContext, EventOutcome, PointerCallback, Widget},
        widgets::{Button, Window},
    };
    use pretty_assertions::assert_eq;

    /// Pointer callback invocations: widget and delta.
    type Calls = Rc<RefCell<Vec<(WidgetId, i32, i32)>>>;

    fn recording(calls: &Calls) -> PointerCallback {
        let calls = calls.clone();
        Box::new(move |_tk: &mut Toolkit, id: WidgetId, dx: i32, dy: i32| {
            calls.borrow_mut().push((id, dx, dy));
        })
    }

    /// Starts a TOUCH interaction when pressed with the left button.
    struct Toucher {
        /// Release callback invocations.
        calls: Calls,
    }

    impl Widget for Toucher {
        fn on_event(&mut self, event: &Event, ctx: &mut EventContext<'_>) -> Result<EventOutcome> {
            match event {
                Event::Press { code, .. } if *code == BTN_LEFT => {
                    ctx.touch(None, Some(recording(&self.calls)));
                    Ok(EventOutcome::Handle)
                }
                _ => Ok(EventOutcome::Ignore),
            }
        }
    }

    /// A 100x100 screen, with the pointer starting at (50, 50).
    fn toolkit(config: Config) -> Result<Toolkit> {
        let (_, fb) = MemoryFrameBuffer::create(Expanse::new(100, 100));
        let config = Config {
            width: 100,
            height: 100,
            ..config
        };
        Toolkit::init(config, Box::new(fb))
    }

    fn window(tk: &mut Toolkit, app: u32, rect: Rect) -> Result<WidgetId> {
        let w = tk.create(AppId(app), Window::new(Color::WHITE));
        tk.place(w, rect)?;
        tk.release(w);
        Ok(w)
    }

    /// Add a child under the pointer start position.
    fn child(tk: &mut Toolkit, win: WidgetId, widget: impl Widget) -> Result<WidgetId> {
        let c = tk.add_child(win, widget)?;
        tk.set_geometry(c, Rect::new(40, 40, 20, 20))?;
        Ok(c)
    }

    fn input(events: impl IntoIterator<Item = RawEvent>) -> ScriptedInput {
        events.into_iter().collect()
    }

    fn kinds(log: &Rc<RefCell<RecorderLog>>, wanted: &[EventKind]) -> Vec<(WidgetId, EventKind)> {
        log.borrow()
            .events
            .iter()
            .map(|(id, e)| (*id, e.kind()))
            .filter(|(_, k)| wanted.contains(k))
            .collect()
    }

    #[test]
    fn touch_and_release() -> Result<()> {
        let mut tk = toolkit(Config::default())?;
        let win = window(&mut tk, 1, Rect::new(0, 0, 100, 100))?;
        let calls = Calls::default();
        let t = child(&mut tk, win, Toucher { calls: calls.clone() })?;

        tk.cycle(0, &mut input([RawEvent::press(BTN_LEFT)]));
        assert_eq!(tk.mode(), Mode::Touch);
        assert_eq!(tk.user().mode_widget(), Some(t));
        assert!(tk.tree().flags(t).contains(WidgetFlags::STATE));
        assert!(calls.borrow().is_empty());

        tk.cycle(10, &mut input([RawEvent::release(BTN_LEFT)]));
        assert_eq!(tk.mode(), Mode::Idle);
        assert!(!tk.tree().flags(t).contains(WidgetFlags::STATE));
        assert_eq!(*calls.borrow(), vec![(t, 0, 0)]);

        tk.cycle(20, &mut ScriptedInput::new());
        assert_eq!(calls.borrow().len(), 1);
        Ok(())
    }

    #[test]
    fn grab_accumulates_motion() -> Result<()> {
        let mut tk = toolkit(Config::default())?;
        let win = window(&mut tk, 1, Rect::new(0, 0, 100, 100))?;
        let t = child(&mut tk, win, Toucher { calls: Calls::default() })?;
        let calls = Calls::default();
        tk.grab(t, Some(recording(&calls)))?;
        assert_eq!(tk.mode(), Mode::Grab);

        tk.cycle(1, &mut input([RawEvent::motion(5, 0)]));
        tk.cycle(2, &mut input([RawEvent::motion(0, 5)]));
        tk.cycle(3, &mut input([RawEvent::motion(-2, -2)]));
        assert_eq!(*calls.borrow(), vec![(t, 5, 0), (t, 5, 5), (t, 3, 3)]);
        assert_eq!(tk.mouse(), Point::new(50, 50));
        Ok(())
    }

    #[test]
    fn drag_motion_once_per_cycle() -> Result<()> {
        let mut tk = toolkit(Config::default())?;
        let win = window(&mut tk, 1, Rect::new(0, 0, 100, 100))?;
        let t = child(&mut tk, win, Toucher { calls: Calls::default() })?;
        let motion = Calls::default();
        let release = Calls::default();
        tk.drag(t, Some(recording(&motion)), None, Some(recording(&release)))?;

        tk.cycle(1, &mut ScriptedInput::new());
        assert!(motion.borrow().is_empty());
        tk.cycle(2, &mut input([RawEvent::motion(3, 0), RawEvent::motion(2, 1)]));
        assert_eq!(*motion.borrow(), vec![(t, 5, 1)]);
        tk.cycle(3, &mut ScriptedInput::new());
        assert_eq!(motion.borrow().len(), 1);
        assert_eq!(tk.mouse(), Point::new(55, 51));

        tk.idle();
        assert_eq!(*release.borrow(), vec![(t, 5, 1)]);
        Ok(())
    }

    #[test]
    fn mode_transitions() -> Result<()> {
        let mut tk = toolkit(Config::default())?;
        let win = window(&mut tk, 1, Rect::new(0, 0, 100, 100))?;
        let a = child(&mut tk, win, Toucher { calls: Calls::default() })?;
        let b = tk.add_child(win, Toucher { calls: Calls::default() })?;
        let released = Calls::default();

        tk.touch(a, None, Some(recording(&released)))?;
        assert_eq!(tk.mode(), Mode::Touch);
        tk.drag(b, None, None, None)?;
        assert_eq!(tk.mode(), Mode::Drag);
        assert_eq!(*released.borrow(), vec![(a, 0, 0)]);
        assert!(!tk.tree().flags(a).contains(WidgetFlags::STATE));
        assert!(tk.tree().flags(b).contains(WidgetFlags::STATE));

        tk.grab(a, None)?;
        assert_eq!(tk.mode(), Mode::Grab);
        assert_eq!(tk.user().mode_widget(), Some(a));

        tk.idle();
        assert_eq!(tk.mode(), Mode::Idle);
        tk.idle();
        assert_eq!(released.borrow().len(), 1);

        tk.dec_ref(b)?;
        assert!(matches!(tk.touch(b, None, None), Err(Error::WidgetNotFound(_))));
        assert_eq!(tk.mode(), Mode::Idle);
        Ok(())
    }

    /// A window with a focused recorder, active for app 1.
    fn keyboard_setup(config: Config) -> Result<(Toolkit, WidgetId, Rc<RefCell<RecorderLog>>)> {
        let mut tk = toolkit(config)?;
        let win = window(&mut tk, 1, Rect::new(0, 0, 100, 100))?;
        let (log, rec) = Recorder::create();
        let r = child(&mut tk, win, rec)?;
        tk.set_active_window(win, AppId(1), false)?;
        tk.focus(r)?;
        Ok((tk, r, log))
    }

    #[test]
    fn key_repeat_after_delay() -> Result<()> {
        let (mut tk, r, log) = keyboard_setup(Config::default())?;
        tk.cycle(0, &mut input([RawEvent::press(KEY_A)]));
        assert_eq!(tk.tick_count(), 1);
        for t in (10..=340).step_by(10) {
            tk.cycle(t, &mut ScriptedInput::new());
        }
        let repeats: Vec<Event> = log
            .borrow()
            .events
            .iter()
            .filter(|(_, e)| e.kind() == EventKind::KeyRepeat)
            .map(|(_, e)| e.clone())
            .collect();
        let want = Event::KeyRepeat {
            code: KEY_A,
            ascii: Some('a'),
        };
        assert_eq!(repeats, vec![want.clone(), want.clone(), want]);

        tk.cycle(350, &mut input([RawEvent::release(KEY_A)]));
        for t in (360..=600).step_by(10) {
            tk.cycle(t, &mut ScriptedInput::new());
        }
        assert_eq!(kinds(&log, &[EventKind::KeyRepeat]).len(), 3);
        assert_eq!(tk.tick_count(), 0);
        assert_eq!(
            kinds(&log, &[EventKind::Press, EventKind::Release]),
            vec![(r, EventKind::Press), (r, EventKind::Release)]
        );
        Ok(())
    }

    #[test]
    fn key_released_before_delay() -> Result<()> {
        let (mut tk, _, log) = keyboard_setup(Config::default())?;
        tk.cycle(0, &mut input([RawEvent::press(KEY_A)]));
        tk.cycle(200, &mut input([RawEvent::release(KEY_A)]));
        for t in (210..=600).step_by(10) {
            tk.cycle(t, &mut ScriptedInput::new());
        }
        assert!(kinds(&log, &[EventKind::KeyRepeat]).is_empty());
        assert_eq!(tk.tick_count(), 0);
        Ok(())
    }

    #[test]
    fn shift_translates_keys() -> Result<()> {
        let (mut tk, r, log) = keyboard_setup(Config::default())?;
        tk.cycle(0, &mut input([RawEvent::press(KEY_LEFTSHIFT)]));
        assert_eq!(tk.tick_count(), 0);
        tk.cycle(1, &mut input([RawEvent::press(KEY_A)]));
        let last = log.borrow().events.last().cloned();
        assert_eq!(
            last,
            Some((
                r,
                Event::Press {
                    code: KEY_A,
                    ascii: Some('A'),
                }
            ))
        );
        Ok(())
    }

    #[test]
    fn click_focuses_and_activates() -> Result<()> {
        let mut tk = toolkit(Config::default())?;
        let win = window(&mut tk, 1, Rect::new(0, 0, 100, 100))?;
        let (log, rec) = Recorder::create();
        let r = child(&mut tk, win, rec.flags(WidgetFlags::SELECTABLE))?;

        tk.cycle(0, &mut input([RawEvent::press(BTN_LEFT)]));
        assert_eq!(tk.screen().active_window(), Some(win));
        assert!(tk.tree().flags(win).contains(WidgetFlags::ACTIVE));
        assert!(tk.tree().flags(r).contains(WidgetFlags::KFOCUS));
        assert_eq!(tk.user().kfocus(), Some(r));
        assert_eq!(tk.user().selected(), Some(r));
        assert_eq!(
            kinds(&log, &[EventKind::FocusIn, EventKind::Press]),
            vec![(r, EventKind::FocusIn), (r, EventKind::Press)]
        );
        Ok(())
    }

    #[test]
    fn focus_follows_active_window() -> Result<()> {
        let mut tk = toolkit(Config::default())?;
        let a = window(&mut tk, 1, Rect::new(0, 0, 50, 100))?;
        let b = window(&mut tk, 2, Rect::new(50, 0, 50, 100))?;
        let (log, rec) = Recorder::create();
        let ca = tk.add_child(a, rec)?;
        let cb = tk.add_child(b, Recorder::with_log(&log))?;

        tk.set_active_window(a, AppId(1), false)?;
        tk.focus(ca)?;
        tk.focus(cb)?;
        assert_eq!(tk.user().kfocus(), Some(ca));
        assert!(matches!(
            tk.set_active_window(b, AppId(1), false),
            Err(Error::ActivationRefused(_))
        ));
        assert_eq!(tk.screen().active_window(), Some(a));

        tk.set_active_window(b, AppId(2), false)?;
        assert_eq!(tk.user().kfocus(), Some(cb));
        assert!(!tk.tree().flags(a).contains(WidgetFlags::ACTIVE));
        assert_eq!(
            kinds(&log, &[EventKind::FocusIn, EventKind::FocusOut]),
            vec![
                (ca, EventKind::FocusIn),
                (ca, EventKind::FocusOut),
                (cb, EventKind::FocusIn),
            ]
        );

        tk.set_active_window(a, AppId(2), true)?;
        assert_eq!(tk.screen().active_window(), Some(a));
        Ok(())
    }

    #[test]
    fn mouse_focus_tracks_pointer() -> Result<()> {
        let mut tk = toolkit(Config::default())?;
        let win = window(&mut tk, 1, Rect::new(0, 0, 100, 100))?;
        let (log, rec) = Recorder::create();
        let r = child(&mut tk, win, rec)?;
        let crossing = [EventKind::Enter, EventKind::Leave];

        tk.cycle(0, &mut ScriptedInput::new());
        assert_eq!(tk.user().mfocus(), Some(r));
        assert!(tk.tree().flags(r).contains(WidgetFlags::MFOCUS));

        tk.cycle(1, &mut input([RawEvent::abs_motion(10, 10)]));
        assert_eq!(tk.user().mfocus(), Some(win));
        assert!(!tk.tree().flags(r).contains(WidgetFlags::MFOCUS));
        assert!(tk.tree().flags(win).contains(WidgetFlags::MFOCUS));
        assert_eq!(
            kinds(&log, &crossing),
            vec![(r, EventKind::Enter), (r, EventKind::Leave)]
        );

        // No crossing while a button is held.
        tk.cycle(2, &mut input([RawEvent::press(BTN_LEFT), RawEvent::abs_motion(50, 50)]));
        assert_eq!(tk.user().mfocus(), Some(win));
        assert_eq!(kinds(&log, &crossing).len(), 2);

        tk.cycle(3, &mut input([RawEvent::release(BTN_LEFT)]));
        assert_eq!(tk.user().mfocus(), Some(r));
        assert_eq!(kinds(&log, &crossing).len(), 3);
        Ok(())
    }

    #[test]
    fn button_click_notifies() -> Result<()> {
        let mut tk = toolkit(Config::default())?;
        let win = window(&mut tk, 1, Rect::new(0, 0, 100, 100))?;
        let btn = child(&mut tk, win, Button::new("ok"))?;

        tk.cycle(0, &mut input([RawEvent::press(BTN_LEFT), RawEvent::release(BTN_LEFT)]));
        assert_eq!(
            tk.take_notifications(),
            vec![Notification {
                app: AppId(1),
                widget: btn,
                action: "click".into(),
                event: None,
            }]
        );

        // Released away from the button.
        tk.cycle(
            1,
            &mut input([
                RawEvent::press(BTN_LEFT),
                RawEvent::abs_motion(90, 90),
                RawEvent::release(BTN_LEFT),
            ]),
        );
        assert!(tk.take_notifications().is_empty());

        tk.cycle(2, &mut input([RawEvent::press(KEY_ENTER)]));
        let n = tk.take_notifications();
        assert_eq!(n.len(), 1);
        assert_eq!(n[0].event, Some(EventKind::Press));
        assert_eq!(tk.get_attr(btn, "label"), Some("ok".into()));
        Ok(())
    }

    #[test]
    fn bindings_notify() -> Result<()> {
        let mut tk = toolkit(Config::default())?;
        let win = window(&mut tk, 1, Rect::new(0, 0, 100, 100))?;
        let (log, rec) = Recorder::create();
        let r = child(&mut tk, win, rec)?;
        tk.bind(r, EventKind::Enter, "hover")?;

        tk.cycle(0, &mut ScriptedInput::new());
        let n = tk.take_notifications();
        assert_eq!(n.len(), 1);
        assert_eq!(n[0].action, "hover");
        assert_eq!(n[0].event, Some(EventKind::Enter));
        assert_eq!(kinds(&log, &[EventKind::Enter]).len(), 1);

        assert!(tk.unbind(r, EventKind::Enter)?);
        assert!(!tk.unbind(r, EventKind::Enter)?);
        tk.cycle(1, &mut input([RawEvent::abs_motion(5, 5), RawEvent::abs_motion(50, 50)]));
        assert!(tk.take_notifications().is_empty());
        Ok(())
    }

    #[test]
    fn destroy_clears_every_reference() -> Result<()> {
        let mut tk = toolkit(Config::default())?;
        let win = window(&mut tk, 1, Rect::new(0, 0, 100, 100))?;
        let (log, rec) = Recorder::create();
        let r = child(&mut tk, win, rec.flags(WidgetFlags::SELECTABLE))?;
        tk.cycle(0, &mut input([RawEvent::press(BTN_LEFT), RawEvent::release(BTN_LEFT)]));
        let released = Calls::default();
        tk.touch(r, None, Some(recording(&released)))?;
        tk.draw_widget(r);
        assert_eq!(tk.user().selected(), Some(r));
        assert_eq!(tk.user().mfocus(), Some(r));
        assert_eq!(tk.user().kfocus(), Some(r));

        tk.remove_window(win)?;
        assert!(!tk.tree().contains(win));
        assert!(!tk.tree().contains(r));
        assert_eq!(tk.user().selected(), None);
        assert_eq!(tk.user().mfocus(), None);
        assert_eq!(tk.user().kfocus(), None);
        assert_eq!(tk.mode(), Mode::Idle);
        assert!(released.borrow().is_empty());
        assert!(!tk.redraw().is_queued(r));
        assert!(!tk.screen().contains(win));
        assert_eq!(tk.screen().active_window(), None);
        assert_eq!(log.borrow().freed, 1);
        assert!(tk.tree().is_empty());
        Ok(())
    }

    #[test]
    fn detach_and_dec_ref_clear_every_reference() -> Result<()> {
        let mut tk = toolkit(Config::default())?;
        let win = window(&mut tk, 1, Rect::new(0, 0, 100, 100))?;
        let (log, rec) = Recorder::create();
        let r = child(&mut tk, win, rec)?;
        tk.cycle(0, &mut ScriptedInput::new());
        assert_eq!(tk.user().mfocus(), Some(r));

        tk.detach(r)?;
        assert!(!tk.tree().contains(r));
        assert_eq!(log.borrow().freed, 1);
        assert_eq!(tk.user().mfocus(), None);
        assert!(!tk.redraw().is_queued(r));

        // The screen holds the last reference to the window.
        tk.cycle(10, &mut ScriptedInput::new());
        assert_eq!(tk.user().mfocus(), Some(win));
        tk.dec_ref(win)?;
        assert!(!tk.tree().contains(win));
        assert!(!tk.screen().contains(win));
        assert_eq!(tk.screen().window_ids().count(), 0);
        assert_eq!(tk.user().mfocus(), None);
        assert_eq!(tk.mouse_widget(), None);
        assert!(tk.tree().is_empty());
        Ok(())
    }

    #[test]
    fn extra_reference_outlives_window() -> Result<()> {
        let mut tk = toolkit(Config::default())?;
        let win = window(&mut tk, 1, Rect::new(0, 0, 100, 100))?;
        let (log, rec) = Recorder::create();
        let r = child(&mut tk, win, rec)?;
        assert_eq!(tk.inc_ref(r)?, 2);

        tk.remove_window(win)?;
        assert!(tk.tree().contains(r));
        assert_eq!(tk.tree().parent(r), None);
        assert_eq!(log.borrow().freed, 0);

        tk.dec_ref(r)?;
        assert!(!tk.tree().contains(r));
        assert_eq!(log.borrow().freed, 1);
        assert!(tk.dec_ref(r).is_err());
        tk.release(r);
        Ok(())
    }

    #[test]
    fn user_ticks() -> Result<()> {
        let mut tk = toolkit(Config::default())?;
        let fired = Rc::new(Cell::new(0));
        let f = fired.clone();
        tk.schedule(10, 10, move |_| {
            f.set(f.get() + 1);
            f.get() < 3
        })?;
        let once = Rc::new(Cell::new(0));
        let o = once.clone();
        let cancelled = tk.schedule(10, 0, move |_| {
            o.set(o.get() + 1);
            true
        })?;
        assert!(tk.cancel_tick(cancelled));
        assert!(!tk.cancel_tick(cancelled));

        for t in (0..=100).step_by(5) {
            tk.cycle(t, &mut ScriptedInput::new());
        }
        assert_eq!(fired.get(), 3);
        assert_eq!(once.get(), 0);
        assert_eq!(tk.tick_count(), 0);
        assert_eq!(tk.stats().ticks, 3);
        Ok(())
    }

    #[test]
    fn tick_table_is_bounded() -> Result<()> {
        let config = Config {
            max_ticks: 2,
            ..Config::default()
        };
        let mut tk = toolkit(config)?;
        tk.schedule(100, 0, |_| false)?;
        tk.schedule(100, 0, |_| false)?;
        assert!(matches!(
            tk.schedule(100, 0, |_| false),
            Err(Error::TickTableFull(2))
        ));
        // Key repeat cannot be armed, but the press still goes through.
        let win = window(&mut tk, 1, Rect::new(0, 0, 100, 100))?;
        tk.set_active_window(win, AppId(1), false)?;
        tk.cycle(0, &mut input([RawEvent::press(KEY_A)]));
        assert_eq!(tk.tick_count(), 2);
        assert_eq!(tk.stats().inputs, 1);
        Ok(())
    }
}
