//! Widget trait, event outcome and the per-dispatch event context.

use std::{
    any::{Any, type_name},
    fmt,
};

use convert_case::{Case, Casing};

use crate::{
    canvas::Canvas,
    error::{Error, Result},
    event::Event,
    flags::WidgetFlags,
    geom::{Expanse, Point, Rect},
    id::WidgetId,
    toolkit::Toolkit,
    tree::WidgetTree,
    value::Value,
};

/// The result of an event handler.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum EventOutcome {
    /// The event was processed and propagation stops.
    Handle,
    /// The event was processed without a state change and propagation stops.
    Consume,
    /// The event was not handled and may bubble up the tree.
    Ignore,
}

/// Minimum and maximum outer size of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MinMax {
    /// Smallest allowed size.
    pub min: Expanse,
    /// Largest allowed size.
    pub max: Expanse,
}

impl Default for MinMax {
    fn default() -> Self {
        Self {
            min: Expanse::new(0, 0),
            max: Expanse::new(u32::MAX, u32::MAX),
        }
    }
}

impl MinMax {
    /// A fixed size.
    pub fn fixed(size: Expanse) -> Self {
        Self {
            min: size,
            max: size,
        }
    }
}

/// Layout information about a child, passed to the parent's layout hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildInfo {
    /// Child id.
    pub id: WidgetId,
    /// Geometry relative to the parent.
    pub rect: Rect,
    /// Size limits.
    pub minmax: MinMax,
}

/// What a widget needs to know about itself while painting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaintInfo {
    /// Widget being painted.
    pub id: WidgetId,
    /// Absolute screen rectangle.
    pub rect: Rect,
    /// Current flags.
    pub flags: WidgetFlags,
}

/// Callback run by the input state machine with the cumulative pointer delta
/// since the interaction began.
pub type PointerCallback = Box<dyn FnMut(&mut Toolkit, WidgetId, i32, i32)>;

/// Snake-case name of a widget type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WidgetName(String);

impl WidgetName {
    /// Munge an arbitrary string into a snake-case widget name.
    pub fn convert(name: &str) -> Self {
        let raw = name.to_case(Case::Snake);
        let filtered: String = raw
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
            .collect();
        if filtered.is_empty() {
            Self("widget".into())
        } else {
            Self(filtered)
        }
    }
}

impl fmt::Display for WidgetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for WidgetName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Widgets are the behaviour attached to nodes in the tree arena.
///
/// Every method has a default, so a widget type only overrides the
/// operations it cares about.
pub trait Widget: Any {
    /// Flags applied when the widget is created.
    fn initial_flags(&self) -> WidgetFlags {
        WidgetFlags::empty()
    }

    /// Paint this widget's own content. Children are painted afterwards by
    /// the tree. Returns whether anything was painted.
    fn paint(&mut self, _canvas: &mut Canvas<'_>, _info: &PaintInfo) -> bool {
        false
    }

    /// Handle an event.
    fn on_event(&mut self, _event: &Event, _ctx: &mut EventContext<'_>) -> Result<EventOutcome> {
        Ok(EventOutcome::Ignore)
    }

    /// Compute size limits from the children.
    fn calc_minmax(&self, current: MinMax, _children: &[ChildInfo]) -> MinMax {
        current
    }

    /// Position children inside a widget of outer size `size`. Returning
    /// `None` leaves children where they are.
    fn arrange(&mut self, _size: Expanse, _children: &[ChildInfo]) -> Option<Vec<Rect>> {
        None
    }

    /// Release type-specific resources. Called once, just before the widget
    /// is dropped.
    fn on_free(&mut self) {}

    /// Read a type-specific attribute.
    fn get_attr(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Write a type-specific attribute.
    fn set_attr(&mut self, name: &str, _value: Value) -> Result<()> {
        Err(Error::UnknownAttribute(name.into()))
    }

    /// Invoke a type-specific method.
    fn call(&mut self, method: &str, _args: &[Value]) -> Result<Value> {
        Err(Error::UnknownMethod(method.into()))
    }

    /// Name of the widget type.
    fn type_name(&self) -> WidgetName {
        let name = type_name::<Self>();
        let short = name.rsplit("::").next().unwrap_or(name);
        WidgetName::convert(short)
    }
}

/// Convert widgets into boxed trait objects.
impl<W> From<W> for Box<dyn Widget>
where
    W: Widget + 'static,
{
    fn from(widget: W) -> Self {
        Box::new(widget)
    }
}

/// Side effects requested by a widget during event handling. They are applied
/// by the toolkit once the handler returns.
pub enum Request {
    /// Queue a redraw of the widget.
    Redraw(WidgetId),
    /// Recompute size limits and layout, then redraw.
    Update(WidgetId),
    /// Enter TOUCH mode on the widget.
    Touch {
        /// Target widget.
        id: WidgetId,
        /// Per-cycle callback.
        tick: Option<PointerCallback>,
        /// Callback on pointer release.
        release: Option<PointerCallback>,
    },
    /// Enter DRAG mode on the widget.
    Drag {
        /// Target widget.
        id: WidgetId,
        /// Callback on pointer motion.
        motion: Option<PointerCallback>,
        /// Per-cycle callback.
        tick: Option<PointerCallback>,
        /// Callback on pointer release.
        release: Option<PointerCallback>,
    },
    /// Enter GRAB mode on the widget.
    Grab {
        /// Target widget.
        id: WidgetId,
        /// Per-cycle callback.
        tick: Option<PointerCallback>,
    },
    /// Move keyboard focus to the widget.
    Focus(WidgetId),
    /// Push an action notification to the owning application.
    Notify {
        /// Originating widget.
        id: WidgetId,
        /// Action name.
        action: String,
    },
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redraw(id) => write!(f, "Redraw({id:?})"),
            Self::Update(id) => write!(f, "Update({id:?})"),
            Self::Touch { id, .. } => write!(f, "Touch({id:?})"),
            Self::Drag { id, .. } => write!(f, "Drag({id:?})"),
            Self::Grab { id, .. } => write!(f, "Grab({id:?})"),
            Self::Focus(id) => write!(f, "Focus({id:?})"),
            Self::Notify { id, action } => write!(f, "Notify({id:?}, {action})"),
        }
    }
}

/// Context handed to [`Widget::on_event`].
///
/// Reads come straight from the tree; mutations are collected as
/// [`Request`]s.
pub struct EventContext<'a> {
    /// Widget handling the event.
    id: WidgetId,
    /// Read-only view of the tree.
    tree: &'a WidgetTree,
    /// Current pointer position.
    mouse: Point,
    /// Collected requests.
    requests: &'a mut Vec<Request>,
}

impl<'a> EventContext<'a> {
    /// Construct a context for `id`.
    pub(crate) fn new(
        id: WidgetId,
        tree: &'a WidgetTree,
        mouse: Point,
        requests: &'a mut Vec<Request>,
    ) -> Self {
        Self {
            id,
            tree,
            mouse,
            requests,
        }
    }

    /// The widget handling the event.
    pub fn id(&self) -> WidgetId {
        self.id
    }

    /// The tree, for read-only queries.
    pub fn tree(&self) -> &WidgetTree {
        self.tree
    }

    /// Absolute pointer position.
    pub fn mouse(&self) -> Point {
        self.mouse
    }

    /// Absolute rectangle of the handling widget.
    pub fn abs_rect(&self) -> Rect {
        self.tree.abs_rect(self.id).unwrap_or_default()
    }

    /// Flags of the handling widget.
    pub fn flags(&self) -> WidgetFlags {
        self.tree.flags(self.id)
    }

    /// Queue a redraw of the handling widget.
    pub fn redraw(&mut self) {
        self.requests.push(Request::Redraw(self.id));
    }

    /// Recompute size limits and layout of the handling widget.
    pub fn update(&mut self) {
        self.requests.push(Request::Update(self.id));
    }

    /// Start a TOUCH interaction on the handling widget.
    pub fn touch(&mut self, tick: Option<PointerCallback>, release: Option<PointerCallback>) {
        self.requests.push(Request::Touch {
            id: self.id,
            tick,
            release,
        });
    }

    /// Start a DRAG interaction on the handling widget.
    pub fn drag(
        &mut self,
        motion: Option<PointerCallback>,
        tick: Option<PointerCallback>,
        release: Option<PointerCallback>,
    ) {
        self.requests.push(Request::Drag {
            id: self.id,
            motion,
            tick,
            release,
        });
    }

    /// Start a GRAB interaction on the handling widget.
    pub fn grab(&mut self, tick: Option<PointerCallback>) {
        self.requests.push(Request::Grab { id: self.id, tick });
    }

    /// Request keyboard focus for the handling widget.
    pub fn focus(&mut self) {
        self.requests.push(Request::Focus(self.id));
    }

    /// Notify the owning application of a named action.
    pub fn notify(&mut self, action: impl Into<String>) {
        self.requests.push(Request::Notify {
            id: self.id,
            action: action.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FancyButton;
    impl Widget for FancyButton {}

    #[test]
    fn names() {
        assert_eq!(FancyButton.type_name(), "fancy_button");
        assert_eq!(WidgetName::convert("!!"), "widget");
        assert_eq!(WidgetName::convert("Scroll Bar").to_string(), "scroll_bar");
    }
}
