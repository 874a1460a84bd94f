//! Casement: a retained-mode widget toolkit and window compositor core.
//!
//! Widgets live in an arena owned by a [`Toolkit`] context. Windows are the
//! roots of widget trees placed on a [`Screen`], which composites damaged
//! areas so that every pixel is painted by the topmost window covering it.
//! Input flows through a small state machine that tracks pointer modes,
//! focus and key repeat.
//!
//! # Module Organization
//!
//! - [`geom`] - Geometry primitives (Rect, Point, Expanse)
//! - [`widget`] - The widget trait and event context
//! - [`widgets`] - Built-in widgets
//! - [`toolkit`] - The context driving input, timers and redraw

#![warn(missing_docs)]

// Internal core module - re-export specific items below
mod core;

pub use casement_geom as geom;

pub mod widget;
pub mod widgets;

#[cfg(any(test, feature = "testing"))]
pub use core::testing;
pub use core::{
    AppId, Notification, Screen, Toolkit, WidgetId, WidgetTree, backend, canvas, clip, config,
    dump, error, event, flags, id, keycodes, keymap, logging, node, redraw, screen, tick,
    toolkit, tree, userstate, value,
};

pub use widget::{EventOutcome, Widget};
