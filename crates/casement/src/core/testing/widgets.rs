use std::{cell::RefCell, rc::Rc};

use crate::{
    canvas::{Canvas, Color},
    error::Result,
    event::Event,
    flags::WidgetFlags,
    id::WidgetId,
    widget::{EventContext, EventOutcome, PaintInfo, Widget},
};

/// A widget that fills its rect with one colour.
#[derive(Debug, Clone, Copy)]
pub struct Fill {
    /// Fill colour.
    color: Color,
}

impl Fill {
    /// A fill widget.
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Widget for Fill {
    fn paint(&mut self, canvas: &mut Canvas<'_>, info: &PaintInfo) -> bool {
        canvas.fill(info.rect, self.color)
    }
}

/// What a [`Recorder`] saw.
#[derive(Debug, Default)]
pub struct RecorderLog {
    /// Events received, with the receiving widget.
    pub events: Vec<(WidgetId, Event)>,
    /// Paint calls.
    pub paints: usize,
    /// Number of `on_free` calls.
    pub freed: usize,
}

/// A widget that records the events and paints it receives.
#[derive(Debug)]
pub struct Recorder {
    /// Shared log.
    log: Rc<RefCell<RecorderLog>>,
    /// Outcome returned for every event.
    outcome: EventOutcome,
    /// Flags set at creation.
    flags: WidgetFlags,
    /// Optional fill colour.
    color: Option<Color>,
}

impl Recorder {
    /// A recorder that ignores events, and the log it writes to.
    pub fn create() -> (Rc<RefCell<RecorderLog>>, Self) {
        let log = Rc::new(RefCell::new(RecorderLog::default()));
        (log.clone(), Self::with_log(&log))
    }

    /// A recorder writing to an existing log.
    pub fn with_log(log: &Rc<RefCell<RecorderLog>>) -> Self {
        Self {
            log: log.clone(),
            outcome: EventOutcome::Ignore,
            flags: WidgetFlags::empty(),
            color: None,
        }
    }

    /// Return `outcome` for every event.
    pub fn outcome(mut self, outcome: EventOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Start with these flags.
    pub fn flags(mut self, flags: WidgetFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Fill the rect when painted.
    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

impl Widget for Recorder {
    fn initial_flags(&self) -> WidgetFlags {
        self.flags
    }

    fn paint(&mut self, canvas: &mut Canvas<'_>, info: &PaintInfo) -> bool {
        self.log.borrow_mut().paints += 1;
        self.color.is_some_and(|c| canvas.fill(info.rect, c))
    }

    fn on_event(&mut self, event: &Event, ctx: &mut EventContext<'_>) -> Result<EventOutcome> {
        self.log.borrow_mut().events.push((ctx.id(), event.clone()));
        Ok(self.outcome)
    }

    fn on_free(&mut self) {
        self.log.borrow_mut().freed += 1;
    }
}
