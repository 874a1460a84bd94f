//! The window stack and compositor.
//!
//! Windows are kept topmost first, with stay-top windows as a leading group.
//! Compositing splits a dirty rectangle against each window in z-order: the
//! part inside a window is painted by that window, and the up to four
//! leftover strips continue down the stack. The traversal uses an explicit
//! work stack, so deep window stacks cost heap memory rather than call depth.

use tracing::{debug, trace};

use crate::{
    backend::FrameBuffer,
    canvas::{Canvas, Color},
    clip::ClipStack,
    config::Config,
    error::{Error, Result},
    event::Event,
    flags::WidgetFlags,
    geom::{Expanse, Point, Rect},
    id::{AppId, WidgetId},
    redraw::RedrawManager,
    tree::WidgetTree,
    widgets::Window,
};

/// A window chained into the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEntry {
    /// Root widget of the window.
    pub id: WidgetId,
    /// Kept above ordinary windows.
    pub stay_top: bool,
    /// Widget holding keyboard focus while this window is active.
    pub kfocus: Option<WidgetId>,
}

/// Work items for the compositor.
enum Work {
    /// Composite `rect` from list position `idx` downwards.
    Rec {
        /// First window to consider.
        idx: usize,
        /// Area to composite.
        rect: Rect,
        /// Number of see-through windows above this area.
        behind: usize,
    },
    /// Paint a window subtree clipped to `rect`.
    Paint {
        /// Window root.
        win: WidgetId,
        /// Clip area.
        rect: Rect,
        /// Stop before this widget.
        stop: Option<WidgetId>,
    },
    /// Fill with the background colour.
    Background(Rect),
}

/// The screen: window stack, framebuffer and clipping state.
#[derive(Debug)]
pub struct Screen {
    /// Output driver.
    fb: Box<dyn FrameBuffer>,
    /// Clipping stack shared by all paint operations.
    clip: ClipStack,
    /// Windows, topmost first.
    windows: Vec<WindowEntry>,
    /// Window holding keyboard focus.
    active: Option<WidgetId>,
    /// Colour for areas no window covers.
    background: Color,
    /// Maximum number of see-through windows composited on top of each other.
    drawbehind_depth: usize,
}

impl Screen {
    /// Build a screen over a framebuffer.
    pub fn new(config: &Config, fb: Box<dyn FrameBuffer>) -> Self {
        let bounds = Rect::new(0, 0, fb.size().w, fb.size().h);
        Self {
            fb,
            clip: ClipStack::new(bounds, config.clip_depth),
            windows: Vec::new(),
            active: None,
            background: config.background,
            drawbehind_depth: config.drawbehind_depth,
        }
    }

    /// Screen size in pixels.
    pub fn size(&self) -> Expanse {
        self.fb.size()
    }

    /// The full screen rectangle.
    pub fn bounds(&self) -> Rect {
        let s = self.size();
        Rect::new(0, 0, s.w, s.h)
    }

    /// Windows, topmost first.
    pub fn windows(&self) -> &[WindowEntry] {
        &self.windows
    }

    /// Window ids, topmost first.
    pub fn window_ids(&self) -> impl Iterator<Item = WidgetId> + '_ {
        self.windows.iter().map(|e| e.id)
    }

    /// Is `win` chained into the stack?
    pub fn contains(&self, win: WidgetId) -> bool {
        self.position(win).is_some()
    }

    /// List position of a window.
    pub fn position(&self, win: WidgetId) -> Option<usize> {
        self.windows.iter().position(|e| e.id == win)
    }

    /// The window holding keyboard focus.
    pub fn active_window(&self) -> Option<WidgetId> {
        self.active
    }

    /// Keyboard focus widget recorded for a window.
    pub fn kfocus(&self, win: WidgetId) -> Option<WidgetId> {
        self.windows
            .iter()
            .find(|e| e.id == win)
            .and_then(|e| e.kfocus)
    }

    /// Record the keyboard focus widget of a window.
    pub(crate) fn set_kfocus(&mut self, win: WidgetId, focus: Option<WidgetId>) {
        if let Some(e) = self.windows.iter_mut().find(|e| e.id == win) {
            e.kfocus = focus;
        }
    }

    /// Borrow the framebuffer.
    pub fn framebuffer(&self) -> &dyn FrameBuffer {
        self.fb.as_ref()
    }

    /// Mutably borrow the framebuffer.
    pub fn framebuffer_mut(&mut self) -> &mut dyn FrameBuffer {
        self.fb.as_mut()
    }

    /// Range of list positions belonging to a group.
    fn group(&self, stay_top: bool) -> (usize, usize) {
        let split = self.windows.iter().take_while(|e| e.stay_top).count();
        if stay_top {
            (0, split)
        } else {
            (split, self.windows.len())
        }
    }

    /// Check that `win` is a live window widget.
    fn check_window(tree: &WidgetTree, win: WidgetId) -> Result<()> {
        if !tree.contains(win) {
            return Err(Error::WidgetNotFound(win));
        }
        if tree.widget::<Window>(win).is_none() || tree.parent(win).is_some() {
            return Err(Error::NotAWindow(win));
        }
        Ok(())
    }

    /// Insert a window at the top of its group, or move and resize a window
    /// already on screen. Both the old and the new area are queued.
    pub fn place(
        &mut self,
        tree: &mut WidgetTree,
        redraw: &mut RedrawManager,
        win: WidgetId,
        rect: Rect,
    ) -> Result<()> {
        Self::check_window(tree, win)?;
        let old = tree.geometry(win);
        let applied = tree.set_geometry(win, rect)?;
        tree.updatepos(win)?;
        if self.contains(win) {
            redraw.draw_area(old);
        } else {
            tree.inc_ref(win)?;
            let stay_top = tree.flags(win).contains(WidgetFlags::STAY_TOP);
            let (start, _) = self.group(stay_top);
            self.windows.insert(
                start,
                WindowEntry {
                    id: win,
                    stay_top,
                    kfocus: None,
                },
            );
            debug!(?win, ?applied, "window placed");
        }
        redraw.draw_area(applied);
        Ok(())
    }

    /// Raise a window to the top of its group.
    pub fn top(&mut self, tree: &WidgetTree, redraw: &mut RedrawManager, win: WidgetId) -> Result<()> {
        let idx = self.position(win).ok_or(Error::NotAWindow(win))?;
        let entry = self.windows.remove(idx);
        let (start, _) = self.group(entry.stay_top);
        self.windows.insert(start, entry);
        redraw.draw_area(tree.geometry(win));
        Ok(())
    }

    /// Lower a window to the bottom of its group.
    pub fn back(&mut self, tree: &WidgetTree, redraw: &mut RedrawManager, win: WidgetId) -> Result<()> {
        let idx = self.position(win).ok_or(Error::NotAWindow(win))?;
        let entry = self.windows.remove(idx);
        let (_, end) = self.group(entry.stay_top);
        self.windows.insert(end, entry);
        redraw.draw_area(tree.geometry(win));
        Ok(())
    }

    /// Unchain a window, queue the uncovered area and drop the screen's
    /// reference. Returns the ids destroyed as a result.
    pub fn remove(
        &mut self,
        tree: &mut WidgetTree,
        redraw: &mut RedrawManager,
        win: WidgetId,
    ) -> Result<Vec<WidgetId>> {
        let idx = self.position(win).ok_or(Error::NotAWindow(win))?;
        self.windows.remove(idx);
        if self.active == Some(win) {
            self.active = None;
            let _changed = tree.set_flags(win, WidgetFlags::ACTIVE, false);
        }
        redraw.draw_area(tree.geometry(win));
        debug!(?win, "window removed");
        tree.dec_ref(win)
    }

    /// Keep a window above ordinary windows, or return it to the ordinary
    /// group.
    pub fn set_stay_top(
        &mut self,
        tree: &mut WidgetTree,
        redraw: &mut RedrawManager,
        win: WidgetId,
        stay_top: bool,
    ) -> Result<()> {
        Self::check_window(tree, win)?;
        tree.set_flags(win, WidgetFlags::STAY_TOP, stay_top)?;
        if let Some(idx) = self.position(win) {
            let mut entry = self.windows.remove(idx);
            entry.stay_top = stay_top;
            let (start, _) = self.group(stay_top);
            self.windows.insert(start, entry);
            redraw.draw_area(tree.geometry(win));
        }
        Ok(())
    }

    /// Make `win` the active window. A request from an application that does
    /// not own the window is refused unless forced. Returns the focus events
    /// to deliver, in order.
    pub fn set_active_window(
        &mut self,
        tree: &mut WidgetTree,
        redraw: &mut RedrawManager,
        win: WidgetId,
        requester: AppId,
        force: bool,
    ) -> Result<Vec<(WidgetId, Event)>> {
        if !self.contains(win) {
            return Err(Error::NotAWindow(win));
        }
        if !force && tree.app(win) != Some(requester) {
            debug!(?win, %requester, "activation refused");
            return Err(Error::ActivationRefused(win));
        }
        let mut events = Vec::new();
        if self.active == Some(win) {
            return Ok(events);
        }
        if let Some(old) = self.active.take() {
            let _changed = tree.set_flags(old, WidgetFlags::ACTIVE, false);
            if let Some(f) = self.kfocus(old) {
                events.push((f, Event::FocusOut));
            }
            redraw.draw_widget(old);
        }
        tree.set_flags(win, WidgetFlags::ACTIVE, true)?;
        if let Some(f) = self.kfocus(win) {
            events.push((f, Event::FocusIn));
        }
        self.active = Some(win);
        redraw.draw_widget(win);
        debug!(?win, "window activated");
        Ok(events)
    }

    /// Forget a destroyed widget.
    pub(crate) fn purge(&mut self, id: WidgetId) {
        self.windows.retain(|e| e.id != id);
        for e in &mut self.windows {
            if e.kfocus == Some(id) {
                e.kfocus = None;
            }
        }
        if self.active == Some(id) {
            self.active = None;
        }
    }

    /// The topmost window containing `p`.
    pub fn find_window(&self, tree: &WidgetTree, p: Point) -> Option<WidgetId> {
        self.window_ids()
            .find(|w| tree.geometry(*w).contains_point(p))
    }

    /// The deepest widget under `p` in the topmost window containing it.
    pub fn find_widget(&self, tree: &WidgetTree, p: Point) -> Option<WidgetId> {
        self.find_window(tree, p)
            .and_then(|w| tree.widget_at(w, p))
    }

    /// Repaint `rect` from the full window stack. Returns the number of
    /// pixels written.
    pub fn draw_area(&mut self, tree: &mut WidgetTree, rect: Rect) -> u64 {
        self.draw_rec(tree, rect, None)
    }

    /// Repaint what lies behind `origin` within `rect`, as it appears on
    /// screen. Windows above the one holding `origin` keep their area, and
    /// that window is painted only up to `origin`.
    pub fn drawbehind(&mut self, tree: &mut WidgetTree, origin: WidgetId, rect: Rect) -> Result<u64> {
        let win = tree.root_of(origin).ok_or(Error::WidgetNotFound(origin))?;
        let idx = self.position(win).ok_or(Error::NotAWindow(win))?;
        Ok(self.draw_rec(tree, rect, Some((idx, origin))))
    }

    /// Composite `rect` against the window stack.
    fn draw_rec(&mut self, tree: &mut WidgetTree, rect: Rect, origin: Option<(usize, WidgetId)>) -> u64 {
        let bounds = self.bounds();
        let Some(rect) = rect.intersect(&bounds) else {
            return 0;
        };
        let mut painted = 0;
        let mut work = vec![Work::Rec {
            idx: 0,
            rect,
            behind: 0,
        }];
        while let Some(item) = work.pop() {
            match item {
                Work::Background(r) => {
                    self.fb.fill(r, self.background);
                    painted += r.area();
                }
                Work::Paint { win, rect, stop } => {
                    painted += self.paint_window(tree, win, rect, stop);
                }
                Work::Rec { idx, rect, behind } => {
                    let hit = self.windows.iter().enumerate().skip(idx).find_map(|(i, e)| {
                        tree.geometry(e.id)
                            .intersect(&rect)
                            .map(|inter| (i, e.id, inter))
                    });
                    let Some((j, win, inter)) = hit else {
                        work.push(Work::Background(rect));
                        continue;
                    };
                    for strip in rect.subtract(&inter).iter() {
                        work.push(Work::Rec {
                            idx: j + 1,
                            rect: strip,
                            behind,
                        });
                    }
                    let concealing = tree.flags(win).contains(WidgetFlags::CONCEALING);
                    let (paint, below, stop) = match origin {
                        // Hidden by a window above the origin.
                        Some((oidx, _)) if j < oidx => (false, false, None),
                        Some((_, o)) if o == win => (false, true, None),
                        Some((oidx, o)) if j == oidx => (true, !concealing, Some(o)),
                        _ => (true, !concealing, None),
                    };
                    if paint {
                        work.push(Work::Paint {
                            win,
                            rect: inter,
                            stop,
                        });
                    }
                    if below {
                        if behind < self.drawbehind_depth {
                            work.push(Work::Rec {
                                idx: j + 1,
                                rect: inter,
                                behind: behind + 1,
                            });
                        } else {
                            trace!(?win, "see-through depth exhausted");
                            work.push(Work::Background(inter));
                        }
                    }
                }
            }
        }
        painted
    }

    /// Paint a window subtree clipped to `rect`.
    fn paint_window(&mut self, tree: &mut WidgetTree, win: WidgetId, rect: Rect, stop: Option<WidgetId>) -> u64 {
        let bounds = self.bounds();
        self.clip.reset(bounds);
        let mut canvas = Canvas::new(self.fb.as_mut(), &mut self.clip);
        if canvas.push_clip(rect).is_err() {
            return 0;
        }
        tree.paint_tree(win, &mut canvas, stop);
        canvas.painted()
    }

    /// Make a painted area visible.
    pub fn update_area(&mut self, rect: Rect) {
        if let Some(r) = rect.intersect(&self.bounds()) {
            self.fb.update_area(r);
        }
    }

    /// Move the pointer image.
    pub fn set_mouse_pos(&mut self, p: Point) {
        self.fb.set_mouse_pos(p);
    }
}
