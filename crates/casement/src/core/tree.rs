//! The widget arena.
//!
//! Nodes live in a generational slot map. Ownership flows from a parent to its
//! children through the child list, and from external holders through
//! explicit references. A node is destroyed exactly once, when its reference
//! count drops to zero; destruction releases one reference on each child.

use std::any::Any;

use slotmap::SlotMap;
use tracing::{debug, trace};

use crate::{
    canvas::Canvas,
    error::{Error, Result},
    event::{Event, EventKind},
    flags::WidgetFlags,
    geom::{Expanse, Point, Rect},
    id::{AppId, WidgetId},
    node::{Binding, Node},
    value::Value,
    widget::{ChildInfo, EventContext, EventOutcome, MinMax, PaintInfo, Request, Widget, WidgetName},
};

/// Result of painting a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintOutcome {
    /// Whether any widget reported painting.
    pub painted: bool,
    /// Whether painting stopped at the requested widget.
    pub reached: bool,
}

/// A step in the iterative paint traversal.
enum PaintStep {
    /// Paint a node whose parent origin is given.
    Enter(WidgetId, Point),
    /// Restore the clip pushed for a finished node.
    Leave,
}

/// Arena of widget nodes.
#[derive(Default)]
pub struct WidgetTree {
    /// Node storage.
    nodes: SlotMap<WidgetId, Node>,
}

impl WidgetTree {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live widgets.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no widgets are alive.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Is `id` a live widget?
    pub fn contains(&self, id: WidgetId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Borrow a node record.
    pub fn node(&self, id: WidgetId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// All live widget ids.
    pub fn ids(&self) -> impl Iterator<Item = WidgetId> + '_ {
        self.nodes.keys()
    }

    /// Look up a node or fail with `WidgetNotFound`.
    fn get(&self, id: WidgetId) -> Result<&Node> {
        self.nodes.get(id).ok_or(Error::WidgetNotFound(id))
    }

    /// Mutable variant of [`get`](Self::get).
    fn get_mut(&mut self, id: WidgetId) -> Result<&mut Node> {
        self.nodes.get_mut(id).ok_or(Error::WidgetNotFound(id))
    }

    /// Create a detached widget holding one reference, owned by the caller.
    pub fn create(&mut self, app: AppId, widget: impl Into<Box<dyn Widget>>) -> WidgetId {
        let id = self.nodes.insert(Node::new(app, widget.into()));
        trace!(?id, "create");
        id
    }

    /// Create a widget as the last child of `parent`. The parent holds the
    /// only reference.
    pub fn add_child(&mut self, parent: WidgetId, widget: impl Into<Box<dyn Widget>>) -> Result<WidgetId> {
        let app = self.get(parent)?.app;
        let child = self.create(app, widget);
        if let Err(e) = self.attach(parent, child) {
            self.dec_ref(child)?;
            return Err(e);
        }
        self.dec_ref(child)?;
        Ok(child)
    }

    /// Add a reference. Returns the new count.
    pub fn inc_ref(&mut self, id: WidgetId) -> Result<u32> {
        let node = self.get_mut(id)?;
        node.refs += 1;
        Ok(node.refs)
    }

    /// Drop a reference, destroying the widget when none remain. Returns the
    /// ids of every widget destroyed as a result.
    pub fn dec_ref(&mut self, id: WidgetId) -> Result<Vec<WidgetId>> {
        let node = self.get_mut(id)?;
        node.refs = node.refs.saturating_sub(1);
        if node.refs > 0 {
            return Ok(Vec::new());
        }
        Ok(self.destroy(id))
    }

    /// Current reference count, zero for dead ids.
    pub fn ref_count(&self, id: WidgetId) -> u32 {
        self.nodes.get(id).map_or(0, |n| n.refs)
    }

    /// Free a widget whose count reached zero, cascading into children that
    /// lose their last reference.
    fn destroy(&mut self, id: WidgetId) -> Vec<WidgetId> {
        let mut destroyed = Vec::new();
        let mut pending = vec![id];
        while let Some(cur) = pending.pop() {
            let Some(mut node) = self.nodes.remove(cur) else {
                continue;
            };
            if let Some(parent) = node.parent
                && let Some(p) = self.nodes.get_mut(parent)
            {
                p.children.retain(|c| *c != cur);
            }
            node.bindings.clear();
            if let Some(w) = node.widget.as_mut() {
                w.on_free();
            }
            for child in node.children.drain(..) {
                if let Some(c) = self.nodes.get_mut(child) {
                    c.parent = None;
                    c.refs = c.refs.saturating_sub(1);
                    if c.refs == 0 {
                        pending.push(child);
                    }
                }
            }
            trace!(id = ?cur, name = %node.name, "destroy");
            destroyed.push(cur);
        }
        destroyed
    }

    /// Parent of a widget.
    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Children of a widget, back to front.
    pub fn children(&self, id: WidgetId) -> &[WidgetId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// The topmost ancestor of a widget.
    pub fn root_of(&self, id: WidgetId) -> Option<WidgetId> {
        let mut cur = id;
        self.nodes.get(cur)?;
        for _ in 0..=self.nodes.len() {
            match self.parent(cur) {
                Some(p) => cur = p,
                None => return Some(cur),
            }
        }
        None
    }

    /// True if `id` is `ancestor` or lies somewhere below it.
    pub fn related_to(&self, ancestor: WidgetId, id: WidgetId) -> bool {
        let mut cur = Some(id);
        let mut steps = 0;
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
            cur = self.parent(c);
        }
        false
    }

    /// True if painting `id` paints over `origin`, which is the case when
    /// `origin` is `id` itself or one of its descendants.
    pub fn covers(&self, id: WidgetId, origin: WidgetId) -> bool {
        self.contains(id) && self.related_to(id, origin)
    }

    /// Append a detached widget to `parent`'s children. The parent takes a
    /// reference of its own.
    pub fn attach(&mut self, parent: WidgetId, child: WidgetId) -> Result<()> {
        self.get(parent)?;
        if self.get(child)?.parent.is_some() {
            return Err(Error::AlreadyAttached(child));
        }
        if self.related_to(child, parent) {
            return Err(Error::WouldCreateCycle { parent, child });
        }
        self.get_mut(parent)?.children.push(child);
        let node = self.get_mut(child)?;
        node.parent = Some(parent);
        node.refs += 1;
        Ok(())
    }

    /// Remove a widget from its parent, dropping the parent's reference.
    /// Returns the ids destroyed if that was the last one.
    pub fn detach(&mut self, child: WidgetId) -> Result<Vec<WidgetId>> {
        let Some(parent) = self.get(child)?.parent else {
            return Ok(Vec::new());
        };
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|c| *c != child);
        }
        self.get_mut(child)?.parent = None;
        self.dec_ref(child)
    }

    /// Rect relative to the parent. Zero for dead ids.
    pub fn geometry(&self, id: WidgetId) -> Rect {
        self.nodes.get(id).map_or_else(Rect::zero, |n| n.rect)
    }

    /// Set the rect relative to the parent. The size is clamped to the
    /// widget's limits. Returns the rect actually applied.
    pub fn set_geometry(&mut self, id: WidgetId, rect: Rect) -> Result<Rect> {
        let node = self.get_mut(id)?;
        let size = rect.size().clamp(node.minmax.min, node.minmax.max);
        node.rect = Rect::new(rect.tl.x, rect.tl.y, size.w, size.h);
        Ok(node.rect)
    }

    /// Rect in absolute screen coordinates.
    pub fn abs_rect(&self, id: WidgetId) -> Option<Rect> {
        let mut rect = self.nodes.get(id)?.rect;
        let mut cur = self.parent(id);
        let mut steps = 0;
        while let Some(p) = cur {
            let pr = self.nodes.get(p)?.rect;
            rect = rect.translate(pr.tl.x, pr.tl.y);
            steps += 1;
            if steps > self.nodes.len() {
                return None;
            }
            cur = self.parent(p);
        }
        Some(rect)
    }

    /// Size limits. Unbounded for dead ids.
    pub fn minmax(&self, id: WidgetId) -> MinMax {
        self.nodes.get(id).map(|n| n.minmax).unwrap_or_default()
    }

    /// Replace the size limits.
    pub fn set_minmax(&mut self, id: WidgetId, minmax: MinMax) -> Result<()> {
        self.get_mut(id)?.minmax = minmax;
        Ok(())
    }

    /// Flags of a widget. Empty for dead ids.
    pub fn flags(&self, id: WidgetId) -> WidgetFlags {
        self.nodes.get(id).map_or(WidgetFlags::empty(), |n| n.flags)
    }

    /// Set or clear flags. Returns whether anything changed.
    pub fn set_flags(&mut self, id: WidgetId, flags: WidgetFlags, on: bool) -> Result<bool> {
        let node = self.get_mut(id)?;
        let before = node.flags;
        node.flags.set(flags, on);
        Ok(before != node.flags)
    }

    /// Owning application.
    pub fn app(&self, id: WidgetId) -> Option<AppId> {
        self.nodes.get(id).map(|n| n.app)
    }

    /// Type name of a widget.
    pub fn type_name(&self, id: WidgetId) -> Option<&WidgetName> {
        self.nodes.get(id).map(|n| &n.name)
    }

    /// Layout records for the children of `id`.
    fn child_infos(&self, id: WidgetId) -> Vec<ChildInfo> {
        self.children(id)
            .iter()
            .filter_map(|c| {
                self.nodes.get(*c).map(|n| ChildInfo {
                    id: *c,
                    rect: n.rect,
                    minmax: n.minmax,
                })
            })
            .collect()
    }

    /// Recompute size limits. If they changed and the widget has a parent,
    /// the parent is updated in turn; otherwise children are repositioned.
    /// Returns the widget whose area must be redrawn.
    pub fn update(&mut self, id: WidgetId) -> Result<WidgetId> {
        let mut cur = id;
        loop {
            let infos = self.child_infos(cur);
            let node = self.get(cur)?;
            let current = node.minmax;
            let parent = node.parent;
            let next = node
                .widget
                .as_ref()
                .map_or(current, |w| w.calc_minmax(current, &infos));
            if next != current {
                let node = self.get_mut(cur)?;
                node.minmax = next;
                let size = node.rect.size().clamp(next.min, next.max);
                node.rect = Rect::new(node.rect.tl.x, node.rect.tl.y, size.w, size.h);
                if let Some(p) = parent {
                    cur = p;
                    continue;
                }
            }
            self.updatepos(cur)?;
            return Ok(cur);
        }
    }

    /// Let each widget in the subtree position its children.
    pub fn updatepos(&mut self, id: WidgetId) -> Result<()> {
        self.get(id)?;
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let infos = self.child_infos(cur);
            let Some(node) = self.nodes.get_mut(cur) else {
                continue;
            };
            let size = node.rect.size();
            let rects = node.widget.as_mut().and_then(|w| w.arrange(size, &infos));
            if let Some(rects) = rects {
                for (info, r) in infos.iter().zip(rects) {
                    if let Some(child) = self.nodes.get_mut(info.id) {
                        let s = r.size().clamp(child.minmax.min, child.minmax.max);
                        child.rect = Rect::new(r.tl.x, r.tl.y, s.w, s.h);
                    }
                }
            }
            stack.extend(infos.iter().map(|i| i.id));
        }
        Ok(())
    }

    /// Bind a named action to an event kind, replacing any earlier binding.
    pub fn bind(&mut self, id: WidgetId, kind: EventKind, action: impl Into<String>) -> Result<()> {
        let node = self.get_mut(id)?;
        let action = action.into();
        match node.bindings.iter_mut().find(|b| b.kind == kind) {
            Some(b) => b.action = action,
            None => node.bindings.push(Binding { kind, action }),
        }
        Ok(())
    }

    /// Remove a binding. Returns whether one existed.
    pub fn unbind(&mut self, id: WidgetId, kind: EventKind) -> Result<bool> {
        let node = self.get_mut(id)?;
        let before = node.bindings.len();
        node.bindings.retain(|b| b.kind != kind);
        Ok(node.bindings.len() != before)
    }

    /// Check a widget out of its slot for a single call.
    pub fn with_widget_mut<R>(
        &mut self,
        id: WidgetId,
        f: impl FnOnce(&mut dyn Widget, &mut Self) -> R,
    ) -> Result<R> {
        let mut widget = self
            .get_mut(id)?
            .widget
            .take()
            .ok_or_else(|| Error::Internal(format!("widget {id:?} is already checked out")))?;
        let out = f(widget.as_mut(), self);
        match self.nodes.get_mut(id) {
            Some(node) => node.widget = Some(widget),
            // Destroyed during the call.
            None => widget.on_free(),
        }
        Ok(out)
    }

    /// Borrow a widget as its concrete type.
    pub fn widget<W: Widget>(&self, id: WidgetId) -> Option<&W> {
        let w = self.nodes.get(id)?.widget.as_deref()?;
        (w as &dyn Any).downcast_ref::<W>()
    }

    /// Mutably borrow a widget as its concrete type.
    pub fn widget_mut<W: Widget>(&mut self, id: WidgetId) -> Option<&mut W> {
        let w = self.nodes.get_mut(id)?.widget.as_deref_mut()?;
        (w as &mut dyn Any).downcast_mut::<W>()
    }

    /// Deliver an event to `id`. An ignored event moves on to the parent
    /// while the current widget has PROPAGATE set. A binding on the handling
    /// widget turns the event into a notification and stops propagation.
    pub fn handle_event(
        &mut self,
        id: WidgetId,
        event: &Event,
        mouse: Point,
        requests: &mut Vec<Request>,
    ) -> Result<EventOutcome> {
        self.get(id)?;
        let mut target = Some(id);
        while let Some(cur) = target {
            let Some(node) = self.nodes.get(cur) else {
                break;
            };
            let propagate = node.flags.contains(WidgetFlags::PROPAGATE);
            let parent = node.parent;
            let mut outcome = self.with_widget_mut(cur, |w, tree| {
                let mut ctx = EventContext::new(cur, tree, mouse, requests);
                w.on_event(event, &mut ctx)
            })??;
            if let Some(b) = self
                .nodes
                .get(cur)
                .and_then(|n| n.bindings.iter().find(|b| b.kind == event.kind()))
            {
                requests.push(Request::Notify {
                    id: cur,
                    action: b.action.clone(),
                });
                outcome = EventOutcome::Handle;
            }
            trace!(id = ?cur, kind = ?event.kind(), ?outcome, "event");
            if outcome != EventOutcome::Ignore || !propagate {
                return Ok(outcome);
            }
            target = parent;
        }
        Ok(EventOutcome::Ignore)
    }

    /// Paint the subtree rooted at `id` back to front, each widget clipped to
    /// its own rect. With `stop_at`, painting ends just before that widget,
    /// leaving everything that lies behind it.
    pub fn paint_tree(
        &mut self,
        id: WidgetId,
        canvas: &mut Canvas<'_>,
        stop_at: Option<WidgetId>,
    ) -> PaintOutcome {
        let origin = self
            .parent(id)
            .and_then(|p| self.abs_rect(p))
            .map_or_else(Point::zero, |r| r.tl);
        let mut out = PaintOutcome::default();
        let mut pushed = 0usize;
        let mut stack = vec![PaintStep::Enter(id, origin)];
        while let Some(step) = stack.pop() {
            let (cur, origin) = match step {
                PaintStep::Leave => {
                    if canvas.pop_clip().is_ok() {
                        pushed -= 1;
                    }
                    continue;
                }
                PaintStep::Enter(cur, origin) => (cur, origin),
            };
            if Some(cur) == stop_at {
                out.reached = true;
                break;
            }
            let Some(rect) = self.nodes.get(cur).map(|n| n.rect.translate(origin.x, origin.y)) else {
                continue;
            };
            if canvas.push_clip(rect).is_err() {
                debug!(id = ?cur, "clip stack exhausted, subtree skipped");
                // Nothing in front of an origin inside the skipped subtree may paint.
                if stop_at.is_some_and(|s| self.covers(cur, s)) {
                    out.reached = true;
                    break;
                }
                continue;
            }
            pushed += 1;
            stack.push(PaintStep::Leave);
            if canvas.clip().is_empty() {
                // The origin may sit under a widget that is clipped away.
                if stop_at.is_some_and(|s| self.covers(cur, s)) {
                    out.reached = true;
                    break;
                }
                continue;
            }
            let Some(node) = self.nodes.get_mut(cur) else {
                continue;
            };
            let info = PaintInfo {
                id: cur,
                rect,
                flags: node.flags,
            };
            if let Some(w) = node.widget.as_mut() {
                out.painted |= w.paint(canvas, &info);
            }
            for child in node.children.iter().rev() {
                stack.push(PaintStep::Enter(*child, rect.tl));
            }
        }
        for _ in 0..pushed {
            let _ignored = canvas.pop_clip();
        }
        out
    }

    /// The deepest widget under `p` within the subtree of `id`.
    pub fn widget_at(&self, id: WidgetId, p: Point) -> Option<WidgetId> {
        let rect = self.abs_rect(id)?;
        if !rect.contains_point(p) {
            return None;
        }
        let mut cur = id;
        let mut origin = rect.tl;
        'descend: loop {
            for child in self.children(cur).iter().rev() {
                let Some(node) = self.nodes.get(*child) else {
                    continue;
                };
                let r = node.rect.translate(origin.x, origin.y);
                if r.contains_point(p) {
                    cur = *child;
                    origin = r.tl;
                    continue 'descend;
                }
            }
            return Some(cur);
        }
    }

    /// Read an attribute. Base geometry and flag attributes are answered
    /// here; anything else is passed to the widget.
    pub fn get_attr(&self, id: WidgetId, name: &str) -> Option<Value> {
        let node = self.nodes.get(id)?;
        let (r, mm, f) = (node.rect, node.minmax, node.flags);
        let v = match name {
            "x" => Value::Int(r.tl.x.into()),
            "y" => Value::Int(r.tl.y.into()),
            "w" => Value::Int(r.w.into()),
            "h" => Value::Int(r.h.into()),
            "min_w" => Value::Int(mm.min.w.into()),
            "min_h" => Value::Int(mm.min.h.into()),
            "max_w" => Value::Int(mm.max.w.into()),
            "max_h" => Value::Int(mm.max.h.into()),
            _ => match flag_attr(name) {
                Some(flag) => Value::Bool(f.contains(flag)),
                None => return node.widget.as_ref()?.get_attr(name),
            },
        };
        Some(v)
    }

    /// Write an attribute. On error nothing changes.
    pub fn set_attr(&mut self, id: WidgetId, name: &str, value: Value) -> Result<()> {
        let node = self.get_mut(id)?;
        match name {
            "x" | "y" | "w" | "h" => {
                let mut r = node.rect;
                match name {
                    "x" => r.tl.x = value.as_i32(name)?,
                    "y" => r.tl.y = value.as_i32(name)?,
                    "w" => r.w = value.as_u32(name)?,
                    _ => r.h = value.as_u32(name)?,
                }
                self.set_geometry(id, r)?;
            }
            "min_w" | "min_h" | "max_w" | "max_h" => {
                let v = value.as_u32(name)?;
                let mm = &mut node.minmax;
                match name {
                    "min_w" => mm.min.w = v,
                    "min_h" => mm.min.h = v,
                    "max_w" => mm.max.w = v,
                    _ => mm.max.h = v,
                }
            }
            _ => match flag_attr(name) {
                Some(flag) => {
                    let on = value.as_bool(name)?;
                    node.flags.set(flag, on);
                }
                None => {
                    return self.with_widget_mut(id, |w, _| w.set_attr(name, value))?;
                }
            },
        }
        Ok(())
    }

    /// Invoke a widget method.
    pub fn call(&mut self, id: WidgetId, method: &str, args: &[Value]) -> Result<Value> {
        self.with_widget_mut(id, |w, _| w.call(method, args))?
    }

    /// Size of a widget's rect. Zero for dead ids.
    pub fn size(&self, id: WidgetId) -> Expanse {
        self.geometry(id).size()
    }
}

/// Flag behind a boolean base attribute.
fn flag_attr(name: &str) -> Option<WidgetFlags> {
    Some(match name {
        "selectable" => WidgetFlags::SELECTABLE,
        "grab_focus" => WidgetFlags::GRAB_FOCUS,
        "propagate" => WidgetFlags::PROPAGATE,
        "state" => WidgetFlags::STATE,
        _ => return None,
    })
}
