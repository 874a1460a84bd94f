use crate::{
    canvas::{Canvas, Color},
    error::{Error, Result},
    flags::WidgetFlags,
    geom::Rect,
    value::Value,
    widget::{PaintInfo, Widget, WidgetName},
};

/// Frame colour of the active window.
const ACTIVE_FRAME: Color = Color::rgb(0x26, 0x8b, 0xd2);
/// Frame colour of inactive windows.
const INACTIVE_FRAME: Color = Color::rgb(0x58, 0x6e, 0x75);

/// A top-level window. Windows are the roots of widget trees placed on the
/// screen.
pub struct Window {
    /// Window title.
    title: String,
    /// Interior colour.
    color: Color,
    /// Draw a one pixel frame.
    border: bool,
    /// Whether the window hides everything beneath it.
    concealing: bool,
}

impl Window {
    /// An opaque window with the given interior colour.
    pub fn new(color: Color) -> Self {
        Self {
            title: String::new(),
            color,
            border: true,
            concealing: true,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Enable or disable the frame.
    pub fn with_border(mut self, border: bool) -> Self {
        self.border = border;
        self
    }

    /// Make the window see-through, so windows beneath it are painted first.
    pub fn transparent(mut self) -> Self {
        self.concealing = false;
        self
    }

    /// Window title.
    pub fn title(&self) -> &str {
        &self.title
    }
}

impl Widget for Window {
    fn initial_flags(&self) -> WidgetFlags {
        if self.concealing {
            WidgetFlags::CONCEALING
        } else {
            WidgetFlags::empty()
        }
    }

    fn paint(&mut self, canvas: &mut Canvas<'_>, info: &PaintInfo) -> bool {
        let r = info.rect;
        let frame = if info.flags.contains(WidgetFlags::ACTIVE) {
            ACTIVE_FRAME
        } else {
            INACTIVE_FRAME
        };
        if !self.concealing {
            // Only the frame is opaque.
            return self.border && canvas.frame(r, frame);
        }
        if !self.border || r.w < 3 || r.h < 3 {
            return canvas.fill(r, self.color);
        }
        let edge = canvas.frame(r, frame);
        let inner = Rect::new(r.tl.x + 1, r.tl.y + 1, r.w - 2, r.h - 2);
        canvas.fill(inner, self.color) || edge
    }

    fn get_attr(&self, name: &str) -> Option<Value> {
        match name {
            "title" => Some(Value::Str(self.title.clone())),
            "color" => Some(Value::Int(self.color.0.into())),
            "border" => Some(Value::Bool(self.border)),
            _ => None,
        }
    }

    fn set_attr(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "title" => self.title = value.as_str(name)?.to_string(),
            "color" => self.color = Color(value.as_u32(name)?),
            "border" => self.border = value.as_bool(name)?,
            _ => return Err(Error::UnknownAttribute(name.into())),
        }
        Ok(())
    }

    fn type_name(&self) -> WidgetName {
        WidgetName::convert("window")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clip::ClipStack, geom::Expanse, id::WidgetId, testing::MemoryFrameBuffer};

    #[test]
    fn frame_and_interior_do_not_overlap() {
        let (state, mut fb) = MemoryFrameBuffer::create(Expanse::new(8, 8));
        let mut clip = ClipStack::new(Rect::new(0, 0, 8, 8), 4);
        let mut canvas = Canvas::new(&mut fb, &mut clip);
        let mut w = Window::new(Color::WHITE);
        let info = PaintInfo {
            id: WidgetId::default(),
            rect: Rect::new(1, 1, 6, 6),
            flags: WidgetFlags::ACTIVE,
        };
        assert!(w.paint(&mut canvas, &info));
        let s = state.borrow();
        assert_eq!(s.count(Color::WHITE), 16);
        assert_eq!(s.count(ACTIVE_FRAME), 20);
        assert_eq!(s.max_writes(), 1);
    }

    #[test]
    fn attributes() -> Result<()> {
        let mut w = Window::new(Color::BLACK).with_title("main");
        assert_eq!(w.get_attr("title"), Some(Value::Str("main".into())));
        w.set_attr("title", Value::Str("other".into()))?;
        assert_eq!(w.title(), "other");
        assert!(w.set_attr("border", Value::Int(2)).is_err());
        Ok(())
    }
}
