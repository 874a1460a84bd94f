//! Deferred redraw queue.
//!
//! Damage is recorded without painting. Requests against a widget that is
//! already queued grow its pending area to the bounding union, so a widget is
//! never queued twice. Flushing resolves widget entries to screen rectangles
//! at that point, so a widget that moves before the flush is painted where it
//! ends up.

use std::{collections::VecDeque, time::Instant};

use tracing::{trace, warn};

use crate::{
    geom::Rect,
    id::WidgetId,
    screen::Screen,
    tree::WidgetTree,
};

/// Initial throughput estimate, in pixels per millisecond.
const INITIAL_THROUGHPUT: f64 = 20_000.0;

/// A queued redraw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Damage {
    /// Part of a widget, relative to the widget. `None` covers all of it.
    Widget {
        /// Damaged widget.
        id: WidgetId,
        /// Damaged area relative to the widget.
        area: Option<Rect>,
    },
    /// A raw screen area.
    Area(Rect),
}

/// Counters for flushed damage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedrawStats {
    /// Entries flushed.
    pub entries: u64,
    /// Pixels composited.
    pub pixels: u64,
}

/// Queue of pending damage.
#[derive(Debug)]
pub struct RedrawManager {
    /// Pending entries, oldest first.
    queue: VecDeque<Damage>,
    /// Measured compositing speed in pixels per millisecond.
    throughput: f64,
    /// Running totals.
    stats: RedrawStats,
}

impl Default for RedrawManager {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            throughput: INITIAL_THROUGHPUT,
            stats: RedrawStats::default(),
        }
    }
}

impl RedrawManager {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue all of a widget.
    pub fn draw_widget(&mut self, id: WidgetId) {
        self.queue_widget(id, None);
    }

    /// Queue part of a widget, given relative to the widget.
    pub fn draw_widget_area(&mut self, id: WidgetId, area: Rect) {
        self.queue_widget(id, Some(area));
    }

    /// Queue a widget entry, merging with one already pending.
    fn queue_widget(&mut self, id: WidgetId, area: Option<Rect>) {
        for d in &mut self.queue {
            if let Damage::Widget { id: qid, area: qarea } = d
                && *qid == id
            {
                *qarea = match (*qarea, area) {
                    (Some(a), Some(b)) => Some(a.union(&b)),
                    _ => None,
                };
                trace!(?id, "damage coalesced");
                return;
            }
        }
        self.queue.push_back(Damage::Widget { id, area });
    }

    /// Queue a raw screen area.
    pub fn draw_area(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        if self
            .queue
            .iter()
            .any(|d| matches!(d, Damage::Area(r) if r.contains_rect(&rect)))
        {
            return;
        }
        self.queue
            .retain(|d| !matches!(d, Damage::Area(r) if rect.contains_rect(r)));
        self.queue.push_back(Damage::Area(rect));
    }

    /// Is a widget waiting to be redrawn?
    pub fn is_queued(&self, id: WidgetId) -> bool {
        self.queue
            .iter()
            .any(|d| matches!(d, Damage::Widget { id: q, .. } if *q == id))
    }

    /// Number of pending entries.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is queued.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pending entries, oldest first.
    pub fn queue(&self) -> impl Iterator<Item = &Damage> {
        self.queue.iter()
    }

    /// Drop entries for a destroyed widget.
    pub fn purge(&mut self, id: WidgetId) {
        self.queue
            .retain(|d| !matches!(d, Damage::Widget { id: q, .. } if *q == id));
    }

    /// Discard everything.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Running totals.
    pub fn stats(&self) -> RedrawStats {
        self.stats
    }

    /// Current throughput estimate in pixels per millisecond.
    pub fn throughput(&self) -> f64 {
        self.throughput
    }

    /// Screen rectangle for an entry, if anything of it is visible.
    fn resolve(tree: &WidgetTree, screen: &Screen, damage: Damage) -> Option<Rect> {
        let rect = match damage {
            Damage::Area(r) => r,
            Damage::Widget { id, area } => {
                let root = tree.root_of(id)?;
                if !screen.contains(root) {
                    return None;
                }
                let abs = tree.abs_rect(id)?;
                match area {
                    None => abs,
                    Some(a) => a.translate(abs.tl.x, abs.tl.y).intersect(&abs)?,
                }
            }
        };
        rect.intersect(&screen.bounds())
    }

    /// Flush entries until `max_pixels` would be exceeded. At least one entry
    /// is flushed per call. Returns the number of pixels composited.
    pub fn process_pixels(&mut self, tree: &mut WidgetTree, screen: &mut Screen, max_pixels: u64) -> u64 {
        let mut done = 0u64;
        let mut flushed = 0u64;
        while let Some(&damage) = self.queue.front() {
            let rect = Self::resolve(tree, screen, damage);
            let cost = rect.map_or(0, |r| r.area());
            if flushed > 0 && done.saturating_add(cost) > max_pixels {
                break;
            }
            self.queue.pop_front();
            flushed += 1;
            if let Some(r) = rect {
                screen.draw_area(tree, r);
                screen.update_area(r);
            }
            done += cost;
        }
        if flushed > 0 {
            trace!(flushed, pixels = done, left = self.queue.len(), "redraw");
        }
        self.stats.entries += flushed;
        self.stats.pixels += done;
        done
    }

    /// Flush within a time budget, converted to pixels with the measured
    /// throughput.
    pub fn exec_redraw(&mut self, tree: &mut WidgetTree, screen: &mut Screen, budget_ms: u64) -> u64 {
        let max_pixels = (budget_ms as f64 * self.throughput).max(1.0) as u64;
        let start = Instant::now();
        let done = self.process_pixels(tree, screen, max_pixels);
        let elapsed = start.elapsed().as_secs_f64() * 1000.0;
        if done > 0 && elapsed > 0.0 {
            let sample = done as f64 / elapsed;
            self.throughput = self.throughput * 0.75 + sample * 0.25;
        }
        if elapsed > (budget_ms as f64) * 2.0 && budget_ms > 0 {
            warn!(elapsed, budget_ms, "redraw overran its budget");
        }
        done
    }
}
