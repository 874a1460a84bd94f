use serde::{Deserialize, Serialize};

use crate::{
    backend::FrameBuffer,
    clip::ClipStack,
    error::Result,
    geom::{Point, Rect},
};

/// A 32-bit `0xAARRGGBB` pixel colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self(0xff00_0000);
    /// Opaque white.
    pub const WHITE: Self = Self(0xffff_ffff);

    /// Opaque colour from components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(0xff00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// Red, green and blue components.
    pub fn components(self) -> (u8, u8, u8) {
        ((self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8)
    }

    /// Scale the colour towards black by `num / 256`.
    pub fn shade(self, num: u16) -> Self {
        let (r, g, b) = self.components();
        let f = |c: u8| ((c as u32 * num.min(256) as u32) / 256) as u8;
        Self::rgb(f(r), f(g), f(b))
    }
}

/// Drawing surface handed to widgets while painting.
///
/// All output goes through the clipping stack, so a widget can never paint
/// outside the area the compositor assigned to it.
pub struct Canvas<'a> {
    /// Target framebuffer.
    fb: &'a mut dyn FrameBuffer,
    /// Active clipping stack.
    clip: &'a mut ClipStack,
    /// Pixels written so far.
    painted: u64,
}

impl<'a> Canvas<'a> {
    /// Wrap a framebuffer and clip stack.
    pub fn new(fb: &'a mut dyn FrameBuffer, clip: &'a mut ClipStack) -> Self {
        Self {
            fb,
            clip,
            painted: 0,
        }
    }

    /// The active clipping rectangle.
    pub fn clip(&self) -> Rect {
        self.clip.current()
    }

    /// Narrow the clip to `rect`.
    pub fn push_clip(&mut self, rect: Rect) -> Result<Rect> {
        self.clip.push(rect)
    }

    /// Restore the previous clip.
    pub fn pop_clip(&mut self) -> Result<Rect> {
        self.clip.pop()
    }

    /// Fill the visible part of `rect`. Returns whether any pixel was written.
    pub fn fill(&mut self, rect: Rect, color: Color) -> bool {
        match self.clip.clip(&rect) {
            Some(r) => {
                self.fb.fill(r, color);
                self.painted += r.area();
                true
            }
            None => false,
        }
    }

    /// Draw a one pixel outline just inside `rect`.
    pub fn frame(&mut self, rect: Rect, color: Color) -> bool {
        if rect.is_empty() {
            return false;
        }
        let (l, t, r, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
        let mut any = self.fill(Rect::from_edges(l, t, r, t + 1), color);
        any |= self.fill(Rect::from_edges(l, b - 1, r, b), color);
        any |= self.fill(Rect::from_edges(l, t + 1, l + 1, b - 1), color);
        any |= self.fill(Rect::from_edges(r - 1, t + 1, r, b - 1), color);
        any
    }

    /// Set a single pixel if it is visible.
    pub fn pixel(&mut self, p: Point, color: Color) -> bool {
        self.fill(Rect::new(p.x, p.y, 1, 1), color)
    }

    /// Pixels written through this canvas.
    pub fn painted(&self) -> u64 {
        self.painted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{geom::Expanse, testing::MemoryFrameBuffer};

    #[test]
    fn fill_respects_clip() -> Result<()> {
        let (state, mut fb) = MemoryFrameBuffer::create(Expanse::new(20, 20));
        let mut clip = ClipStack::new(Rect::new(0, 0, 20, 20), 8);
        let mut c = Canvas::new(&mut fb, &mut clip);
        c.push_clip(Rect::new(5, 5, 5, 5))?;
        assert!(c.fill(Rect::new(0, 0, 20, 20), Color::WHITE));
        assert!(!c.fill(Rect::new(15, 15, 2, 2), Color::WHITE));
        c.pop_clip()?;
        assert_eq!(c.painted(), 25);
        let s = state.borrow();
        assert_eq!(s.pixel(5, 5), Some(Color::WHITE));
        assert_eq!(s.pixel(10, 10), Some(Color::default()));
        Ok(())
    }

    #[test]
    fn frame_outline() {
        let (state, mut fb) = MemoryFrameBuffer::create(Expanse::new(10, 10));
        let mut clip = ClipStack::new(Rect::new(0, 0, 10, 10), 8);
        let mut c = Canvas::new(&mut fb, &mut clip);
        assert!(c.frame(Rect::new(1, 1, 4, 4), Color::WHITE));
        let s = state.borrow();
        assert_eq!(s.pixel(1, 1), Some(Color::WHITE));
        assert_eq!(s.pixel(4, 2), Some(Color::WHITE));
        assert_eq!(s.pixel(2, 2), Some(Color::default()));
        assert_eq!(s.count(Color::WHITE), 12);
    }

    #[test]
    fn shade() {
        assert_eq!(Color::rgb(200, 100, 0).shade(128), Color::rgb(100, 50, 0));
        assert_eq!(Color::WHITE.shade(256), Color::WHITE);
    }
}
