/// A width and height, without a position.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct Expanse {
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
}

impl Expanse {
    /// Construct a new expanse.
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    /// Number of pixels covered.
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// Is either dimension zero?
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Clamp each dimension into `[min, max]`. A `max` smaller than `min`
    /// yields `min`.
    pub fn clamp(&self, min: Self, max: Self) -> Self {
        Self {
            w: self.w.min(max.w).max(min.w),
            h: self.h.min(max.h).max(min.h),
        }
    }
}

impl From<(u32, u32)> for Expanse {
    fn from(v: (u32, u32)) -> Self {
        Self { w: v.0, h: v.1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp() {
        let min = Expanse::new(10, 10);
        let max = Expanse::new(100, 50);
        assert_eq!(Expanse::new(5, 60).clamp(min, max), Expanse::new(10, 50));
        assert_eq!(Expanse::new(40, 20).clamp(min, max), Expanse::new(40, 20));
        assert_eq!(Expanse::new(40, 20).clamp(min, Expanse::new(5, 5)), min);
        assert_eq!(Expanse::new(3, 7).area(), 21);
    }
}
