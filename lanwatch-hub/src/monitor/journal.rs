//! Bounded per-device event history.

use std::collections::VecDeque;
use time::OffsetDateTime;

use super::event::{EventKind, LinkEvent};

/// Most-recent-first history of [`LinkEvent`]s for one device, capped at a
/// fixed maximum length.
///
/// Entries are kept in arrival order, which is assumed to also be
/// chronological order per device. The journal never reorders by timestamp;
/// out-of-order or duplicate reports are stored exactly as delivered. The
/// rolling-window count in [`count_since`](Self::count_since) depends on
/// this: sorting would change which events a window "ending now" sees.
#[derive(Clone, Debug)]
pub struct EventJournal {
    max_events: usize,
    entries: VecDeque<LinkEvent>,
}

impl EventJournal {
    pub fn new(max_events: usize) -> Self {
        Self {
            max_events,
            entries: VecDeque::with_capacity(max_events),
        }
    }

    /// Prepend `event`, dropping the oldest entries beyond the cap.
    ///
    /// Truncation is unconditional on every call; the length invariant
    /// `len() <= max_events` holds at every return.
    pub fn record(&mut self, event: LinkEvent) {
        self.entries.push_front(event);
        self.entries.truncate(self.max_events);
    }

    /// Count entries of `kind` with `occurred_at >= not_before`.
    ///
    /// Linear over the journal, which is fine: the cap is small and fixed.
    pub fn count_since(&self, kind: EventKind, not_before: OffsetDateTime) -> usize {
        self.entries
            .iter()
            .filter(|e| e.kind == kind && e.occurred_at >= not_before)
            .count()
    }

    /// The `n` most recent entries, newest first. Borrows; no allocation.
    pub fn most_recent(&self, n: usize) -> impl Iterator<Item = &LinkEvent> {
        self.entries.iter().take(n)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
