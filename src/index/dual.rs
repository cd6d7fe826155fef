//! Identity map and chronological index kept in step.

use super::ChronologicalIndex;
use crate::types::{Event, EventId, Timestamp};
use std::collections::HashMap;
use tracing::debug;

/// The logbook's event set, indexed by id and by date.
///
/// After every `upsert` or `remove` each id in the identity map is filed
/// exactly once, under its current date, and nothing else is filed.
#[derive(Clone, Debug, Default)]
pub struct DualIndex {
    /// Event id to current event.
    events: HashMap<EventId, Event>,

    /// Date to ids sharing that date.
    chronological: ChronologicalIndex,
}

impl DualIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index in one pass over `events`.
    ///
    /// Same-date events are filed in the order given. A repeated id replaces
    /// the earlier occurrence.
    pub fn from_events(events: impl IntoIterator<Item = Event>) -> Self {
        let mut index = Self::new();
        for event in events {
            index.upsert(event);
        }
        index
    }

    /// Insert or replace an event.
    ///
    /// Returns the event previously stored under the same id. When the date
    /// changed, the id moves from the old date's bucket to the end of the
    /// new one.
    pub fn upsert(&mut self, event: Event) -> Option<Event> {
        let id = event.id;
        let date = event.date;

        match self.events.insert(id, event) {
            None => {
                self.chronological.insert(date, id);
                None
            }
            Some(previous) => {
                if previous.date != date {
                    debug!(%id, from = ?previous.date, to = ?date, "relocating event");
                    self.chronological.relocate(id, previous.date, date);
                }
                Some(previous)
            }
        }
    }

    /// Remove an event by id, returning it if it was present.
    pub fn remove(&mut self, id: EventId) -> Option<Event> {
        let removed = self.events.remove(&id)?;
        self.chronological.remove(removed.date, id);
        debug!(%id, date = ?removed.date, "removed event");
        Some(removed)
    }

    /// Borrow an event by id.
    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events.get(&id)
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.events.contains_key(&id)
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The chronological half of the index.
    pub fn chronological(&self) -> &ChronologicalIndex {
        &self.chronological
    }

    /// Ids in chronological order, ties in bucket order.
    pub fn ordered_ids(&self) -> Vec<EventId> {
        self.chronological.ids().collect()
    }

    /// `(date, id)` pairs in chronological order, ties in bucket order.
    pub fn ordered_entries(&self) -> Vec<(Timestamp, EventId)> {
        self.chronological
            .buckets()
            .flat_map(|(date, ids)| ids.iter().map(move |id| (date, *id)))
            .collect()
    }

    /// Events in chronological order.
    pub fn ordered_events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.chronological
            .ids()
            .filter_map(move |id| self.events.get(&id))
    }

    /// Distinct dates, ascending.
    pub fn dates(&self) -> Vec<Timestamp> {
        self.chronological.dates().collect()
    }

    /// Check both halves describe the same event set.
    pub fn is_consistent(&self) -> bool {
        if self.chronological.id_count() != self.events.len() {
            return false;
        }
        let filed_correctly = self.chronological.buckets().all(|(date, ids)| {
            ids.iter()
                .all(|id| self.events.get(id).is_some_and(|event| event.date == date))
        });
        filed_correctly
            && self
                .events
                .values()
                .all(|event| self.chronological.bucket(event.date).contains(&event.id))
    }
}
