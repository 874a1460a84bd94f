use super::{Expanse, Point};
use crate::{Error, Result};

/// A rectangle with a signed origin and unsigned size.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct Rect {
    /// Top-left corner.
    pub tl: Point,
    /// Width.
    pub w: u32,
    /// Height.
    pub h: u32,
}

/// Saturate an i64 edge coordinate back into i32 space.
fn sat(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

impl Rect {
    /// Construct a rectangle from coordinates and size.
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self {
            tl: Point { x, y },
            w,
            h,
        }
    }

    /// The empty rectangle at the origin.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build a rectangle from exclusive edges. Inverted edges give an empty
    /// rectangle anchored at `(left, top)`.
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        let w = (right as i64 - left as i64).max(0) as u32;
        let h = (bottom as i64 - top as i64).max(0) as u32;
        Self::new(left, top, w, h)
    }

    /// Leftmost column.
    pub fn left(&self) -> i32 {
        self.tl.x
    }

    /// Topmost row.
    pub fn top(&self) -> i32 {
        self.tl.y
    }

    /// One past the rightmost column.
    pub fn right(&self) -> i32 {
        sat(self.tl.x as i64 + self.w as i64)
    }

    /// One past the bottom row.
    pub fn bottom(&self) -> i32 {
        sat(self.tl.y as i64 + self.h as i64)
    }

    /// Size of the rectangle.
    pub fn size(&self) -> Expanse {
        Expanse::new(self.w, self.h)
    }

    /// Number of pixels covered.
    pub fn area(&self) -> u64 {
        self.size().area()
    }

    /// Does this rect have a zero size?
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Does this rectangle contain the point?
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.left() && p.x < self.right() && p.y >= self.top() && p.y < self.bottom()
    }

    /// Does this rectangle completely enclose the other? An empty rectangle is
    /// enclosed by everything.
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.is_empty()
            || (other.left() >= self.left()
                && other.top() >= self.top()
                && other.right() <= self.right()
                && other.bottom() <= self.bottom())
    }

    /// Intersection of two rectangles, or `None` if they do not overlap.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return None;
        }
        Some(Self::from_edges(left, top, right, bottom))
    }

    /// Do the rectangles share at least one pixel?
    pub fn overlaps(&self, other: &Self) -> bool {
        self.intersect(other).is_some()
    }

    /// Smallest rectangle enclosing both. Empty inputs are ignored.
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self::from_edges(
            self.left().min(other.left()),
            self.top().min(other.top()),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Split the area of `self` not covered by `hole` into up to four
    /// disjoint strips. The left and right strips span the full height of
    /// `self`; the top and bottom strips span only the width of the overlap.
    pub fn subtract(&self, hole: &Self) -> Remainder {
        let Some(cut) = self.intersect(hole) else {
            return Remainder {
                left: (!self.is_empty()).then_some(*self),
                ..Remainder::default()
            };
        };
        let strip = |r: Self| (!r.is_empty()).then_some(r);
        Remainder {
            left: strip(Self::from_edges(
                self.left(),
                self.top(),
                cut.left(),
                self.bottom(),
            )),
            top: strip(Self::from_edges(
                cut.left(),
                self.top(),
                cut.right(),
                cut.top(),
            )),
            right: strip(Self::from_edges(
                cut.right(),
                self.top(),
                self.right(),
                self.bottom(),
            )),
            bottom: strip(Self::from_edges(
                cut.left(),
                cut.bottom(),
                cut.right(),
                self.bottom(),
            )),
        }
    }

    /// Shift the rectangle by an offset.
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            tl: self.tl.offset(dx, dy),
            ..*self
        }
    }

    /// Clamp a point so that it falls on a pixel inside the rectangle.
    pub fn clamp_point(&self, p: Point) -> Result<Point> {
        if self.is_empty() {
            return Err(Error::Geometry("cannot clamp into an empty rectangle".into()));
        }
        Ok(Point {
            x: p.x.clamp(self.left(), self.right() - 1),
            y: p.y.clamp(self.top(), self.bottom() - 1),
        })
    }

    /// Given a point inside this rectangle, return it relative to our origin.
    pub fn rebase(&self, p: Point) -> Result<Point> {
        if !self.contains_point(p) {
            return Err(Error::Geometry("co-ords outside rectangle".into()));
        }
        Ok(p - self.tl)
    }
}

impl From<(i32, i32, u32, u32)> for Rect {
    fn from(v: (i32, i32, u32, u32)) -> Self {
        Self::new(v.0, v.1, v.2, v.3)
    }
}

/// The leftover strips produced by [`Rect::subtract`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Remainder {
    /// Full-height strip left of the hole.
    pub left: Option<Rect>,
    /// Strip above the hole, as wide as the hole.
    pub top: Option<Rect>,
    /// Full-height strip right of the hole.
    pub right: Option<Rect>,
    /// Strip below the hole, as wide as the hole.
    pub bottom: Option<Rect>,
}

impl Remainder {
    /// Iterate the non-empty strips in left, top, right, bottom order.
    pub fn iter(&self) -> impl Iterator<Item = Rect> + '_ {
        [self.left, self.top, self.right, self.bottom]
            .into_iter()
            .flatten()
    }

    /// Total area of all strips.
    pub fn area(&self) -> u64 {
        self.iter().map(|r| r.area()).sum()
    }
}
