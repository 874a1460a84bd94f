use crate::{
    canvas::{Canvas, Color},
    error::{Error, Result},
    geom::{Expanse, Rect},
    value::Value,
    widget::{ChildInfo, MinMax, PaintInfo, Widget},
};

/// A container that optionally fills its background and stacks its children
/// vertically.
#[derive(Debug, Default)]
pub struct Panel {
    /// Background colour. `None` leaves the parent showing through.
    color: Option<Color>,
    /// Stack children top to bottom at full width.
    vertical: bool,
    /// Gap between stacked children.
    spacing: u32,
}

impl Panel {
    /// A transparent panel that leaves its children where they are.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the background.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Stack children vertically with the given gap.
    pub fn vertical(mut self, spacing: u32) -> Self {
        self.vertical = true;
        self.spacing = spacing;
        self
    }
}

impl Widget for Panel {
    fn paint(&mut self, canvas: &mut Canvas<'_>, info: &PaintInfo) -> bool {
        match self.color {
            Some(c) => canvas.fill(info.rect, c),
            None => false,
        }
    }

    fn calc_minmax(&self, current: MinMax, children: &[ChildInfo]) -> MinMax {
        if !self.vertical || children.is_empty() {
            return current;
        }
        let gaps = self.spacing.saturating_mul(children.len() as u32 - 1);
        let h = children
            .iter()
            .fold(gaps, |acc, c| acc.saturating_add(c.minmax.min.h));
        let w = children.iter().map(|c| c.minmax.min.w).max().unwrap_or(0);
        MinMax {
            min: Expanse::new(w, h),
            max: current.max,
        }
    }

    fn arrange(&mut self, size: Expanse, children: &[ChildInfo]) -> Option<Vec<Rect>> {
        if !self.vertical {
            return None;
        }
        let mut y = 0i32;
        let mut out = Vec::with_capacity(children.len());
        for c in children {
            let h = c.rect.h.max(c.minmax.min.h);
            out.push(Rect::new(0, y, size.w, h));
            y = y
                .saturating_add(i32::try_from(h).unwrap_or(i32::MAX))
                .saturating_add(i32::try_from(self.spacing).unwrap_or(i32::MAX));
        }
        Some(out)
    }

    fn get_attr(&self, name: &str) -> Option<Value> {
        match name {
            "color" => self.color.map(|c| Value::Int(c.0.into())),
            "vertical" => Some(Value::Bool(self.vertical)),
            "spacing" => Some(Value::Int(self.spacing.into())),
            _ => None,
        }
    }

    fn set_attr(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "color" => self.color = Some(Color(value.as_u32(name)?)),
            "vertical" => self.vertical = value.as_bool(name)?,
            "spacing" => self.spacing = value.as_u32(name)?,
            _ => return Err(Error::UnknownAttribute(name.into())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        id::{AppId, WidgetId},
        tree::WidgetTree,
    };

    #[test]
    fn vertical_stack() -> Result<()> {
        let mut t = WidgetTree::new();
        let p = t.create(AppId(1), Panel::new().vertical(2));
        t.set_geometry(p, Rect::new(0, 0, 40, 100))?;
        let a = t.add_child(p, Panel::new())?;
        let b = t.add_child(p, Panel::new())?;
        t.set_minmax(a, MinMax::fixed(Expanse::new(10, 10)))?;
        t.set_minmax(b, MinMax::fixed(Expanse::new(20, 5)))?;

        assert_eq!(t.update(p)?, p);
        assert_eq!(t.minmax(p).min, Expanse::new(20, 17));
        assert_eq!(t.geometry(a), Rect::new(0, 0, 10, 10));
        assert_eq!(t.geometry(b), Rect::new(0, 12, 20, 5));
        Ok(())
    }

    #[test]
    fn oversized_spacing_saturates() {
        let child = |h| ChildInfo {
            id: WidgetId::default(),
            rect: Rect::new(0, 0, 10, h),
            minmax: MinMax::default(),
        };
        let mut p = Panel::new().vertical(u32::MAX);
        let rects = p
            .arrange(Expanse::new(40, 100), &[child(10), child(10), child(u32::MAX)])
            .unwrap_or_default();
        assert_eq!(rects.len(), 3);
        assert_eq!(rects[0].tl.y, 0);
        assert_eq!(rects[1].tl.y, i32::MAX);
        assert_eq!(rects[2].tl.y, i32::MAX);
    }
}
