//! A framebuffer that paints into memory and records every write.
use std::{cell::RefCell, rc::Rc};

use crate::{
    backend::FrameBuffer,
    canvas::Color,
    geom::{Expanse, Point, Rect},
};

/// Pixels and write statistics of a [`MemoryFrameBuffer`].
#[derive(Debug, Default)]
pub struct FrameState {
    /// Buffer size.
    size: Expanse,
    /// Row-major pixels.
    pixels: Vec<Color>,
    /// Row-major write counts.
    writes: Vec<u32>,
    /// Areas passed to `update_area`, in order.
    updates: Vec<Rect>,
    /// Last pointer position set by the toolkit.
    mouse: Option<Point>,
}

impl FrameState {
    /// Buffer of the given size, all pixels `Color::default()`.
    fn new(size: Expanse) -> Self {
        let n = size.area() as usize;
        Self {
            size,
            pixels: vec![Color::default(); n],
            writes: vec![0; n],
            updates: Vec::new(),
            mouse: None,
        }
    }

    /// Index of an on-screen pixel.
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.size.w || y as u32 >= self.size.h {
            return None;
        }
        Some(y as usize * self.size.w as usize + x as usize)
    }

    /// Buffer size.
    pub fn size(&self) -> Expanse {
        self.size
    }

    /// Pixel colour.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Number of times a pixel was written.
    pub fn writes(&self, x: i32, y: i32) -> u32 {
        self.index(x, y).map_or(0, |i| self.writes[i])
    }

    /// Highest write count of any pixel.
    pub fn max_writes(&self) -> u32 {
        self.writes.iter().copied().max().unwrap_or(0)
    }

    /// Total pixel writes.
    pub fn total_writes(&self) -> u64 {
        self.writes.iter().map(|w| u64::from(*w)).sum()
    }

    /// Zero all write counts.
    pub fn reset_writes(&mut self) {
        self.writes.iter_mut().for_each(|w| *w = 0);
        self.updates.clear();
    }

    /// Number of pixels with the given colour.
    pub fn count(&self, color: Color) -> usize {
        self.pixels.iter().filter(|p| **p == color).count()
    }

    /// Areas made visible so far.
    pub fn updates(&self) -> &[Rect] {
        &self.updates
    }

    /// Last pointer position.
    pub fn mouse(&self) -> Option<Point> {
        self.mouse
    }

    /// Encode the buffer as a binary PPM image.
    pub fn to_ppm(&self) -> Vec<u8> {
        let mut out = format!("P6\n{} {}\n255\n", self.size.w, self.size.h).into_bytes();
        out.reserve(self.pixels.len() * 3);
        for p in &self.pixels {
            let (r, g, b) = p.components();
            out.extend_from_slice(&[r, g, b]);
        }
        out
    }
}

/// A [`FrameBuffer`] backed by memory, shared with the test through a
/// [`FrameState`] handle.
#[derive(Debug)]
pub struct MemoryFrameBuffer {
    /// Shared state.
    state: Rc<RefCell<FrameState>>,
}

impl MemoryFrameBuffer {
    /// Create a framebuffer and a handle to inspect it.
    pub fn create(size: Expanse) -> (Rc<RefCell<FrameState>>, Self) {
        let state = Rc::new(RefCell::new(FrameState::new(size)));
        (state.clone(), Self { state })
    }
}

impl FrameBuffer for MemoryFrameBuffer {
    fn size(&self) -> Expanse {
        self.state.borrow().size
    }

    fn fill(&mut self, rect: Rect, color: Color) {
        let mut s = self.state.borrow_mut();
        for y in rect.top()..rect.bottom() {
            for x in rect.left()..rect.right() {
                if let Some(i) = s.index(x, y) {
                    s.pixels[i] = color;
                    s.writes[i] += 1;
                }
            }
        }
    }

    fn pixel(&self, p: Point) -> Option<Color> {
        self.state.borrow().pixel(p.x, p.y)
    }

    fn update_area(&mut self, rect: Rect) {
        self.state.borrow_mut().updates.push(rect);
    }

    fn set_mouse_pos(&mut self, p: Point) {
        self.state.borrow_mut().mouse = Some(p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_writes() {
        let (state, mut fb) = MemoryFrameBuffer::create(Expanse::new(4, 3));
        fb.fill(Rect::new(-1, 1, 3, 5), Color::WHITE);
        fb.fill(Rect::new(0, 2, 1, 1), Color::BLACK);
        fb.update_area(Rect::new(0, 0, 4, 3));
        let s = state.borrow();
        assert_eq!(s.count(Color::WHITE), 3);
        assert_eq!(s.writes(0, 2), 2);
        assert_eq!(s.max_writes(), 2);
        assert_eq!(s.total_writes(), 5);
        assert_eq!(s.updates().len(), 1);
        assert_eq!(&s.to_ppm()[..11], b"P6\n4 3\n255\n");
    }
}
