//! Date-ordered index of event ids.

use crate::query::DateInterval;
use crate::types::{EventId, Timestamp};
use std::collections::BTreeMap;

/// Ordered mapping from date to the ids recorded on that date.
///
/// Within a bucket ids keep the order in which they were first filed under
/// that date. Emptied buckets are pruned.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChronologicalIndex {
    buckets: BTreeMap<Timestamp, Vec<EventId>>,
}

impl ChronologicalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// File `id` at the end of the `date` bucket.
    ///
    /// An id already present in that bucket keeps its position.
    pub fn insert(&mut self, date: Timestamp, id: EventId) {
        let bucket = self.buckets.entry(date).or_default();
        if !bucket.contains(&id) {
            bucket.push(id);
        }
    }

    /// Remove `id` from the `date` bucket. Returns whether it was there.
    pub fn remove(&mut self, date: Timestamp, id: EventId) -> bool {
        let Some(bucket) = self.buckets.get_mut(&date) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|existing| *existing == id) else {
            return false;
        };
        bucket.remove(pos);
        if bucket.is_empty() {
            self.buckets.remove(&date);
        }
        true
    }

    /// Move `id` from the `from` bucket to the end of the `to` bucket.
    pub fn relocate(&mut self, id: EventId, from: Timestamp, to: Timestamp) {
        if from == to {
            return;
        }
        self.remove(from, id);
        self.insert(to, id);
    }

    /// Ids filed under exactly `date`.
    pub fn bucket(&self, date: Timestamp) -> &[EventId] {
        self.buckets.get(&date).map(Vec::as_slice).unwrap_or_default()
    }

    /// All buckets in ascending date order.
    pub fn buckets(&self) -> impl Iterator<Item = (Timestamp, &[EventId])> {
        self.buckets.iter().map(|(date, ids)| (*date, ids.as_slice()))
    }

    /// Buckets whose date lies within `interval`, ascending.
    ///
    /// Seeks to the lower bound and stops past the upper bound.
    pub fn buckets_in<'a>(
        &'a self,
        interval: &DateInterval,
    ) -> Box<dyn Iterator<Item = (Timestamp, &'a [EventId])> + 'a> {
        if interval.is_empty() {
            return Box::new(std::iter::empty());
        }
        Box::new(
            self.buckets
                .range(interval.bounds())
                .map(|(date, ids)| (*date, ids.as_slice())),
        )
    }

    /// Every id in chronological order.
    pub fn ids(&self) -> impl Iterator<Item = EventId> + '_ {
        self.buckets.values().flat_map(|ids| ids.iter().copied())
    }

    /// Distinct dates, ascending.
    pub fn dates(&self) -> impl Iterator<Item = Timestamp> + '_ {
        self.buckets.keys().copied()
    }

    /// Number of distinct dates.
    pub fn date_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of filed ids across all buckets.
    pub fn id_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
