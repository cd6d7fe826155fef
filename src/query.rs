//! Read-only queries over the dual index.

use crate::index::DualIndex;
use crate::types::{Event, EventId, Timestamp};
use std::ops::{
    Bound, Range, RangeBounds, RangeFrom, RangeFull, RangeInclusive, RangeTo, RangeToInclusive,
};

/// A span of dates with independently inclusive or exclusive ends.
///
/// Built from any std range over [`Timestamp`] or through the named
/// constructors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateInterval {
    start: Bound<Timestamp>,
    end: Bound<Timestamp>,
}

impl DateInterval {
    pub const fn new(start: Bound<Timestamp>, end: Bound<Timestamp>) -> Self {
        Self { start, end }
    }

    /// Every date.
    pub const fn all() -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }

    /// `[start, end]`
    pub const fn closed(start: Timestamp, end: Timestamp) -> Self {
        Self::new(Bound::Included(start), Bound::Included(end))
    }

    /// `[start, end)`
    pub const fn half_open(start: Timestamp, end: Timestamp) -> Self {
        Self::new(Bound::Included(start), Bound::Excluded(end))
    }

    /// `[start, ..)`
    pub const fn since(start: Timestamp) -> Self {
        Self::new(Bound::Included(start), Bound::Unbounded)
    }

    /// `(start, ..)`
    pub const fn after(start: Timestamp) -> Self {
        Self::new(Bound::Excluded(start), Bound::Unbounded)
    }

    /// `(.., end)`
    pub const fn up_to(end: Timestamp) -> Self {
        Self::new(Bound::Unbounded, Bound::Excluded(end))
    }

    /// `(.., end]`
    pub const fn through(end: Timestamp) -> Self {
        Self::new(Bound::Unbounded, Bound::Included(end))
    }

    pub const fn bounds(&self) -> (Bound<Timestamp>, Bound<Timestamp>) {
        (self.start, self.end)
    }

    /// Whether `date` lies within both bounds.
    pub fn contains(&self, date: Timestamp) -> bool {
        let above_start = match self.start {
            Bound::Included(start) => date >= start,
            Bound::Excluded(start) => date > start,
            Bound::Unbounded => true,
        };
        let below_end = match self.end {
            Bound::Included(end) => date <= end,
            Bound::Excluded(end) => date < end,
            Bound::Unbounded => true,
        };
        above_start && below_end
    }

    /// Whether no date can satisfy both bounds.
    pub fn is_empty(&self) -> bool {
        match (self.start, self.end) {
            (Bound::Included(s), Bound::Included(e)) => s > e,
            (Bound::Included(s), Bound::Excluded(e))
            | (Bound::Excluded(s), Bound::Included(e))
            | (Bound::Excluded(s), Bound::Excluded(e)) => s >= e,
            _ => false,
        }
    }
}

impl Default for DateInterval {
    fn default() -> Self {
        Self::all()
    }
}

impl RangeBounds<Timestamp> for DateInterval {
    fn start_bound(&self) -> Bound<&Timestamp> {
        self.start.as_ref()
    }

    fn end_bound(&self) -> Bound<&Timestamp> {
        self.end.as_ref()
    }
}

impl From<Range<Timestamp>> for DateInterval {
    fn from(range: Range<Timestamp>) -> Self {
        Self::half_open(range.start, range.end)
    }
}

impl From<RangeInclusive<Timestamp>> for DateInterval {
    fn from(range: RangeInclusive<Timestamp>) -> Self {
        let (start, end) = range.into_inner();
        Self::closed(start, end)
    }
}

impl From<RangeFrom<Timestamp>> for DateInterval {
    fn from(range: RangeFrom<Timestamp>) -> Self {
        Self::since(range.start)
    }
}

impl From<RangeTo<Timestamp>> for DateInterval {
    fn from(range: RangeTo<Timestamp>) -> Self {
        Self::up_to(range.end)
    }
}

impl From<RangeToInclusive<Timestamp>> for DateInterval {
    fn from(range: RangeToInclusive<Timestamp>) -> Self {
        Self::through(range.end)
    }
}

impl From<RangeFull> for DateInterval {
    fn from(_: RangeFull) -> Self {
        Self::all()
    }
}

impl DualIndex {
    /// Events dated within `interval`, chronologically, ties in insertion
    /// order.
    pub fn range(&self, interval: &DateInterval) -> Vec<Event> {
        self.scan(interval).cloned().collect()
    }

    /// Events carrying experience `key`, optionally limited to `interval`.
    ///
    /// An empty key matches nothing.
    pub fn with_experience(&self, key: &str, interval: Option<&DateInterval>) -> Vec<Event> {
        if key.is_empty() {
            return Vec::new();
        }
        let interval = interval.copied().unwrap_or_default();
        self.scan(&interval)
            .filter(|event| event.has_experience(key))
            .cloned()
            .collect()
    }

    /// Ids dated within `interval`, in chronological order.
    pub fn ids_in(&self, interval: &DateInterval) -> Vec<EventId> {
        self.chronological()
            .buckets_in(interval)
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    fn scan<'a>(&'a self, interval: &DateInterval) -> impl Iterator<Item = &'a Event> + 'a {
        self.chronological()
            .buckets_in(interval)
            .flat_map(|(_, ids)| ids.iter())
            .filter_map(move |id| self.get(*id))
    }
}
