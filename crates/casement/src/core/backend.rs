//! Interfaces to the platform screen and input drivers.

use std::fmt::Debug;

use crate::{
    canvas::Color,
    event::RawEvent,
    geom::{Expanse, Point, Rect},
};

/// A framebuffer-backed screen driver.
pub trait FrameBuffer: Debug {
    /// Visible size in pixels.
    fn size(&self) -> Expanse;

    /// Fill a rectangle that lies entirely on screen.
    fn fill(&mut self, rect: Rect, color: Color);

    /// Read back a pixel, if the driver supports it.
    fn pixel(&self, _p: Point) -> Option<Color> {
        None
    }

    /// Make a painted area visible (flip or copy to the device).
    fn update_area(&mut self, rect: Rect);

    /// Move the hardware or software mouse cursor.
    fn set_mouse_pos(&mut self, _p: Point) {}
}

/// A source of raw input events from the platform.
pub trait InputSource {
    /// Return the next pending event, or `None` when drained.
    fn poll(&mut self) -> Option<RawEvent>;
}

impl<I> InputSource for I
where
    I: Iterator<Item = RawEvent>,
{
    fn poll(&mut self) -> Option<RawEvent> {
        self.next()
    }
}
