use crate::{
    event::EventKind,
    flags::WidgetFlags,
    geom::Rect,
    id::{AppId, WidgetId},
    widget::{MinMax, Widget, WidgetName},
};

/// A named action bound to an event kind on a widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Event kind that triggers the action.
    pub kind: EventKind,
    /// Action name reported to the owning application.
    pub action: String,
}

/// Widget record stored in the tree arena.
pub struct Node {
    /// Widget behaviour. Taken out of the slot for the duration of a call.
    pub(crate) widget: Option<Box<dyn Widget>>,
    /// Snake-case type name, cached at creation.
    pub(crate) name: WidgetName,

    /// Parent in the tree. Non-owning.
    pub(crate) parent: Option<WidgetId>,
    /// Children, back to front. Each entry holds one reference.
    pub(crate) children: Vec<WidgetId>,

    /// Outer rect relative to the parent origin.
    pub(crate) rect: Rect,
    /// Size limits.
    pub(crate) minmax: MinMax,
    /// State and capability flags.
    pub(crate) flags: WidgetFlags,

    /// Reference count. The node is destroyed when this reaches zero.
    pub(crate) refs: u32,
    /// Owning application.
    pub(crate) app: AppId,
    /// Event bindings.
    pub(crate) bindings: Vec<Binding>,
}

impl Node {
    /// Build a fresh record holding one reference.
    pub(crate) fn new(app: AppId, widget: Box<dyn Widget>) -> Self {
        Self {
            name: widget.type_name(),
            flags: widget.initial_flags(),
            widget: Some(widget),
            parent: None,
            children: Vec::new(),
            rect: Rect::zero(),
            minmax: MinMax::default(),
            refs: 1,
            app,
            bindings: Vec::new(),
        }
    }

    /// Widget type name.
    pub fn name(&self) -> &WidgetName {
        &self.name
    }

    /// Parent widget, if attached.
    pub fn parent(&self) -> Option<WidgetId> {
        self.parent
    }

    /// Children, back to front.
    pub fn children(&self) -> &[WidgetId] {
        &self.children
    }

    /// Rect relative to the parent.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Size limits.
    pub fn minmax(&self) -> MinMax {
        self.minmax
    }

    /// Current flags.
    pub fn flags(&self) -> WidgetFlags {
        self.flags
    }

    /// Current reference count.
    pub fn refs(&self) -> u32 {
        self.refs
    }

    /// Owning application.
    pub fn app(&self) -> AppId {
        self.app
    }

    /// Registered bindings.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// The widget behaviour, unless it is currently checked out.
    pub fn widget(&self) -> Option<&dyn Widget> {
        self.widget.as_deref()
    }
}
