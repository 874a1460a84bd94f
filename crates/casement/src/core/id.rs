use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Generational identifier for a widget stored in the tree arena.
    ///
    /// A stale id never aliases a newer widget, so ids may be held as weak
    /// references anywhere in the toolkit.
    pub struct WidgetId;
}

/// Identifier of the client application that owns a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(pub u32);

impl AppId {
    /// The application id used for widgets owned by the server itself.
    pub const SERVER: Self = Self(0);
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "app{}", self.0)
    }
}
