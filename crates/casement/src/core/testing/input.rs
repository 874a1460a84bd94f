use std::collections::VecDeque;

use crate::event::RawEvent;

/// A queue of raw events replayed as an input source.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    /// Pending events.
    events: VecDeque<RawEvent>,
}

impl ScriptedInput {
    /// An empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&mut self, ev: RawEvent) -> &mut Self {
        self.events.push_back(ev);
        self
    }

    /// Number of events left.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when every event has been consumed.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl FromIterator<RawEvent> for ScriptedInput {
    fn from_iter<I: IntoIterator<Item = RawEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl Iterator for ScriptedInput {
    type Item = RawEvent;

    fn next(&mut self) -> Option<RawEvent> {
        self.events.pop_front()
    }
}
