use std::{io, result::Result as StdResult};

use thiserror::Error;

use crate::{core::id::WidgetId, geom};

/// Result type for casement operations.
pub type Result<T> = StdResult<T, Error>;

/// Core error type.
///
/// Operations that fail leave the toolkit in the state it was in before the
/// call. Accessors never error: they return a default for unknown widgets.
#[derive(PartialEq, Eq, Error, Debug, Clone)]
pub enum Error {
    /// The widget id is stale or was never allocated.
    #[error("widget not found: {0:?}")]
    WidgetNotFound(WidgetId),

    /// The widget is not a window chained into the screen.
    #[error("not a window: {0:?}")]
    NotAWindow(WidgetId),

    /// The widget already has a parent.
    #[error("widget already attached: {0:?}")]
    AlreadyAttached(WidgetId),

    /// Attaching would make a widget its own ancestor.
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    WouldCreateCycle {
        /// Requested parent.
        parent: WidgetId,
        /// Requested child.
        child: WidgetId,
    },

    /// The clipping stack is full.
    #[error("clip stack overflow (depth {0})")]
    ClipOverflow(usize),

    /// Pop on a clipping stack with no pushed entries.
    #[error("clip stack underflow")]
    ClipUnderflow,

    /// The tick table is full.
    #[error("tick table full (capacity {0})")]
    TickTableFull(usize),

    /// A window activation crossed application boundaries without force.
    #[error("activation of {0:?} refused")]
    ActivationRefused(WidgetId),

    /// No attribute with this name exists on the widget.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    /// No method with this name exists on the widget.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// A value had the wrong type or range for its target.
    #[error("invalid value for {name}: {reason}")]
    InvalidValue {
        /// Attribute or argument name.
        name: String,
        /// Human-readable reason.
        reason: String,
    },

    /// Configuration could not be loaded or is inconsistent.
    #[error("config: {0}")]
    Config(String),

    /// Geometry failure.
    #[error("geometry: {0}")]
    Geometry(String),

    /// Internal error.
    #[error("internal: {0}")]
    Internal(String),
}

impl From<geom::Error> for Error {
    fn from(e: geom::Error) -> Self {
        Self::Geometry(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Internal(e.to_string())
    }
}
