//! Pixel-space geometry primitives used across casement.
//!
//! All coordinates are signed so that windows may hang off the edge of the
//! screen; sizes are unsigned. Rectangles are half-open: a rect at `(x, y)`
//! with size `w × h` covers columns `x..x + w` and rows `y..y + h`.

#![warn(missing_docs)]

/// Error types for geometry operations.
mod error;
/// Width/height size type.
mod expanse;
/// Point helpers.
mod point;
/// Rectangle operations.
mod rect;

pub use error::{Error, Result};
pub use expanse::Expanse;
pub use point::Point;
pub use rect::{Rect, Remainder};
