use crate::{
    canvas::{Canvas, Color},
    error::{Error, Result},
    event::Event,
    flags::WidgetFlags,
    id::WidgetId,
    keycodes,
    toolkit::Toolkit,
    value::Value,
    widget::{EventContext, EventOutcome, PaintInfo, Widget},
};

/// Colour of a button at rest.
const IDLE: Color = Color::rgb(0xee, 0xe8, 0xd5);
/// Colour while held down.
const PRESSED: Color = Color::rgb(0x93, 0xa1, 0xa1);
/// Outline colour while focused.
const FOCUS: Color = Color::rgb(0xcb, 0x4b, 0x16);

/// A push button. Releasing the pointer after a press, or pressing enter or
/// space while focused, notifies the owning application with a `click`
/// action.
#[derive(Debug, Default)]
pub struct Button {
    /// Button label.
    label: String,
}

impl Button {
    /// Construct a button with a label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// The button label.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Widget for Button {
    fn initial_flags(&self) -> WidgetFlags {
        WidgetFlags::SELECTABLE
    }

    fn paint(&mut self, canvas: &mut Canvas<'_>, info: &PaintInfo) -> bool {
        let color = if info.flags.contains(WidgetFlags::STATE) {
            PRESSED
        } else {
            IDLE
        };
        let painted = canvas.fill(info.rect, color);
        if info.flags.contains(WidgetFlags::KFOCUS) {
            canvas.frame(info.rect, FOCUS);
        }
        painted
    }

    fn on_event(&mut self, event: &Event, ctx: &mut EventContext<'_>) -> Result<EventOutcome> {
        match event {
            Event::Press { code, .. } if *code == keycodes::BTN_LEFT => {
                ctx.touch(
                    None,
                    Some(Box::new(|tk: &mut Toolkit, id: WidgetId, _dx: i32, _dy: i32| {
                        if tk.mouse_widget() == Some(id) {
                            tk.notify(id, "click");
                        }
                    })),
                );
                Ok(EventOutcome::Handle)
            }
            Event::Press { code, .. }
                if *code == keycodes::KEY_ENTER || *code == keycodes::KEY_SPACE =>
            {
                ctx.notify("click");
                Ok(EventOutcome::Handle)
            }
            _ => Ok(EventOutcome::Ignore),
        }
    }

    fn get_attr(&self, name: &str) -> Option<Value> {
        match name {
            "label" => Some(Value::Str(self.label.clone())),
            _ => None,
        }
    }

    fn set_attr(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "label" => self.label = value.as_str(name)?.to_string(),
            _ => return Err(Error::UnknownAttribute(name.into())),
        }
        Ok(())
    }
}
