use tracing::trace;

use crate::{
    error::{Error, Result},
    geom::Rect,
};

/// Default maximum depth of the clipping stack.
pub const DEFAULT_CLIP_DEPTH: usize = 64;

/// A bounded stack of nested clipping rectangles in absolute pixel space.
///
/// The bottom of the stack is the screen rectangle set by [`reset`]. Each
/// push intersects with the current top, so the active clip is always the
/// intersection of every rectangle pushed since the last reset.
///
/// [`reset`]: ClipStack::reset
#[derive(Debug, Clone)]
pub struct ClipStack {
    /// Screen rectangle at the bottom of the stack.
    base: Rect,
    /// Pushed, already intersected clips.
    stack: Vec<Rect>,
    /// Maximum number of pushed entries.
    depth: usize,
}

impl ClipStack {
    /// Create a stack over the given screen rectangle.
    pub fn new(base: Rect, depth: usize) -> Self {
        Self {
            base,
            stack: Vec::with_capacity(depth),
            depth,
        }
    }

    /// The active clipping rectangle. An empty rectangle means nothing may be
    /// drawn.
    pub fn current(&self) -> Rect {
        self.stack.last().copied().unwrap_or(self.base)
    }

    /// Number of pushed entries.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Is the stack at its base?
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Push the intersection of `rect` with the current clip. When the stack
    /// is full the push is refused and the stack is unchanged.
    pub fn push(&mut self, rect: Rect) -> Result<Rect> {
        if self.stack.len() >= self.depth {
            trace!(depth = self.depth, "clip push refused");
            return Err(Error::ClipOverflow(self.depth));
        }
        let cur = self.current();
        let clip = cur
            .intersect(&rect)
            .unwrap_or_else(|| Rect::new(cur.tl.x, cur.tl.y, 0, 0));
        self.stack.push(clip);
        Ok(clip)
    }

    /// Restore the clip active before the matching push.
    pub fn pop(&mut self) -> Result<Rect> {
        self.stack.pop().ok_or(Error::ClipUnderflow)?;
        Ok(self.current())
    }

    /// Drop all pushed entries and set a new base rectangle.
    pub fn reset(&mut self, base: Rect) {
        self.stack.clear();
        self.base = base;
    }

    /// Clip `rect` against the active clip.
    pub fn clip(&self, rect: &Rect) -> Option<Rect> {
        self.current().intersect(rect)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn nested() -> Result<()> {
        let mut c = ClipStack::new(Rect::new(0, 0, 640, 480), 4);
        assert_eq!(c.push(Rect::new(10, 10, 100, 100))?, Rect::new(10, 10, 100, 100));
        assert_eq!(c.push(Rect::new(50, -20, 200, 50))?, Rect::new(50, 10, 60, 20));
        assert!(c.push(Rect::new(500, 500, 5, 5))?.is_empty());
        assert!(c.clip(&Rect::new(0, 0, 640, 480)).is_none());
        c.pop()?;
        assert_eq!(c.pop()?, Rect::new(10, 10, 100, 100));
        assert_eq!(c.pop()?, Rect::new(0, 0, 640, 480));
        assert_eq!(c.pop(), Err(Error::ClipUnderflow));
        Ok(())
    }

    #[test]
    fn overflow_leaves_stack_unchanged() -> Result<()> {
        let mut c = ClipStack::new(Rect::new(0, 0, 100, 100), 2);
        c.push(Rect::new(0, 0, 50, 50))?;
        c.push(Rect::new(10, 10, 50, 50))?;
        let before = c.current();
        assert_eq!(c.push(Rect::new(20, 20, 5, 5)), Err(Error::ClipOverflow(2)));
        assert_eq!(c.current(), before);
        assert_eq!(c.len(), 2);
        Ok(())
    }

    fn arb_rect() -> impl Strategy<Value = Rect> {
        (-100i32..700, -100i32..500, 0u32..400, 0u32..400)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn push_is_intersection_and_pop_restores(rects in prop::collection::vec(arb_rect(), 1..64)) {
            let screen = Rect::new(0, 0, 640, 480);
            let mut c = ClipStack::new(screen, DEFAULT_CLIP_DEPTH);
            let mut expected = Some(screen);
            let mut history = vec![c.current()];
            for r in &rects {
                c.push(*r).unwrap();
                expected = expected.and_then(|e| e.intersect(r));
                match expected {
                    Some(e) => prop_assert_eq!(c.current(), e),
                    None => prop_assert!(c.current().is_empty()),
                }
                history.push(c.current());
            }
            history.pop();
            while let Some(prev) = history.pop() {
                prop_assert_eq!(c.pop().unwrap(), prev);
            }
            prop_assert!(c.is_empty());
        }
    }
}
