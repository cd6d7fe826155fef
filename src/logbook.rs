//! Main Logbook struct tying the index, queries, and persistence together.

use crate::error::{LogbookError, Result};
use crate::index::DualIndex;
use crate::persist::{self, FileEncoding};
use crate::query::DateInterval;
use crate::types::{Event, EventId, LogbookStats, Timestamp};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Logbook configuration.
#[derive(Clone, Debug)]
pub struct LogbookConfig {
    /// File holding the encoded events.
    pub path: PathBuf,

    /// Encoding of that file.
    pub encoding: FileEncoding,

    /// Whether to create the file if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to hold an exclusive lock on `<path>.lock` while open.
    pub lock: bool,
}

impl Default for LogbookConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./logbook.bin"),
            encoding: FileEncoding::MessagePack,
            create_if_missing: true,
            lock: true,
        }
    }
}

impl LogbookConfig {
    /// Default configuration for the file at `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// Index state plus change counters, guarded together.
struct State {
    index: DualIndex,
    /// Bumped by every mutation.
    generation: u64,
    /// Generation last written to disk.
    saved_generation: u64,
}

/// A personal logbook of dated events.
///
/// Every operation goes through one mutex, so no caller observes a
/// half-applied mutation. Mutations stay in memory until [`Logbook::save`].
pub struct Logbook {
    config: LogbookConfig,

    /// Lock file for exclusive access.
    _lock_file: Option<File>,

    state: Mutex<State>,

    /// Orders saves so an older snapshot never overwrites a newer one.
    save_lock: Mutex<()>,
}

impl Logbook {
    /// Open the logbook at `path` with default settings, creating it if
    /// missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(LogbookConfig::at(path.as_ref()))
    }

    /// Open a logbook with an explicit configuration.
    pub fn open_with(config: LogbookConfig) -> Result<Self> {
        if !config.create_if_missing && !config.path.exists() {
            return Err(LogbookError::NotInitialized);
        }

        let lock_file = if config.lock {
            Some(Self::acquire_lock(&config.path)?)
        } else {
            None
        };

        let index = persist::load(&config.path, config.encoding, config.create_if_missing)?;
        info!(
            path = %config.path.display(),
            events = index.len(),
            "opened logbook"
        );

        Ok(Self {
            config,
            _lock_file: lock_file,
            state: Mutex::new(State {
                index,
                generation: 0,
                saved_generation: 0,
            }),
            save_lock: Mutex::new(()),
        })
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_path = persist::sidecar_path(path, ".lock");
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        if lock_file.try_lock_exclusive().is_err() {
            warn!(path = %path.display(), "logbook is locked by another owner");
            return Err(LogbookError::Locked);
        }

        Ok(lock_file)
    }

    // --- Mutations ---

    /// Insert or replace an event, returning the one it replaced.
    pub fn update(&self, event: Event) -> Option<Event> {
        let mut state = self.state.lock();
        state.generation += 1;
        state.index.upsert(event)
    }

    /// Remove an event by id, returning it if it was present.
    pub fn remove(&self, id: EventId) -> Option<Event> {
        let mut state = self.state.lock();
        let removed = state.index.remove(id);
        if removed.is_some() {
            state.generation += 1;
        }
        removed
    }

    // --- Queries ---

    /// Get an event by id.
    pub fn get(&self, id: EventId) -> Option<Event> {
        self.state.lock().index.get(id).cloned()
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.state.lock().index.contains(id)
    }

    /// Events dated within `interval`, in chronological order.
    ///
    /// Accepts any std range over [`Timestamp`], e.g. `t0..t3` or `..=t2`.
    pub fn range(&self, interval: impl Into<DateInterval>) -> Vec<Event> {
        self.state.lock().index.range(&interval.into())
    }

    /// Events carrying experience `key`, in chronological order.
    pub fn with_experience(&self, key: &str) -> Vec<Event> {
        self.state.lock().index.with_experience(key, None)
    }

    /// Events carrying experience `key` dated within `interval`.
    pub fn with_experience_in(&self, key: &str, interval: impl Into<DateInterval>) -> Vec<Event> {
        let interval = interval.into();
        self.state.lock().index.with_experience(key, Some(&interval))
    }

    /// Lazily walk all events in chronological order.
    ///
    /// The `(date, id)` order is captured when the traversal starts. Each
    /// id is looked up again when yielded and is skipped if it was removed
    /// or moved to another date in the meantime, so dates never decrease.
    /// Same-date edits yield their latest value; events added in the
    /// meantime are not included. Each call starts an independent traversal.
    pub fn chronological(&self) -> Chronological<'_> {
        let entries = self.state.lock().index.ordered_entries();
        Chronological {
            logbook: self,
            entries: entries.into_iter(),
        }
    }

    /// All events in chronological order.
    pub fn events(&self) -> Vec<Event> {
        self.state.lock().index.ordered_events().cloned().collect()
    }

    /// Distinct event dates, ascending.
    pub fn dates(&self) -> Vec<Timestamp> {
        self.state.lock().index.dates()
    }

    pub fn len(&self) -> usize {
        self.state.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().index.is_empty()
    }

    /// Whether mutations happened since the last open or successful save.
    pub fn is_dirty(&self) -> bool {
        let state = self.state.lock();
        state.generation != state.saved_generation
    }

    // --- Persistence ---

    /// Write the current event set to the logbook file.
    ///
    /// On failure the file keeps its previous content and the in-memory
    /// events are untouched, so the save can be retried.
    pub fn save(&self) -> Result<()> {
        let _save = self.save_lock.lock();

        let (bytes, generation, count) = {
            let state = self.state.lock();
            let bytes = persist::encode(state.index.ordered_events(), self.config.encoding)?;
            (bytes, state.generation, state.index.len())
        };

        persist::write_encoded(&self.config.path, &bytes)?;

        let mut state = self.state.lock();
        state.saved_generation = state.saved_generation.max(generation);
        info!(
            path = %self.config.path.display(),
            events = count,
            bytes = bytes.len(),
            "saved logbook"
        );
        Ok(())
    }

    // --- Accessors ---

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn config(&self) -> &LogbookConfig {
        &self.config
    }

    /// Event and date counts plus the size of the file on disk.
    pub fn stats(&self) -> Result<LogbookStats> {
        let (event_count, date_count) = {
            let state = self.state.lock();
            (
                state.index.len() as u64,
                state.index.chronological().date_count() as u64,
            )
        };
        let file_size_bytes = fs::metadata(&self.config.path)?.len();

        Ok(LogbookStats {
            event_count,
            date_count,
            file_size_bytes,
        })
    }
}

/// Chronological traversal returned by [`Logbook::chronological`].
pub struct Chronological<'a> {
    logbook: &'a Logbook,
    entries: std::vec::IntoIter<(Timestamp, EventId)>,
}

impl Iterator for Chronological<'_> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        for (date, id) in self.entries.by_ref() {
            match self.logbook.get(id) {
                Some(event) if event.date == date => return Some(event),
                _ => {}
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.entries.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventKind;
    use tempfile::TempDir;

    fn test_logbook(dir: &TempDir) -> Logbook {
        Logbook::open(dir.path().join("logbook.bin")).unwrap()
    }

    #[test]
    fn test_update_insert_then_replace() {
        let dir = TempDir::new().unwrap();
        let logbook = test_logbook(&dir);
        let event = Event::new(EventKind::Flight, Timestamp(1));

        assert!(logbook.update(event.clone()).is_none());
        let replaced = logbook.update(event.clone().at(Timestamp(2)));

        assert_eq!(replaced, Some(event.clone()));
        assert!(logbook.range(Timestamp(1)..=Timestamp(1)).is_empty());
        assert_eq!(logbook.range(Timestamp(2)..=Timestamp(2))[0].id, event.id);
    }

    #[test]
    fn test_dirty_tracking() {
        let dir = TempDir::new().unwrap();
        let logbook = test_logbook(&dir);
        assert!(!logbook.is_dirty());

        let event = Event::new(EventKind::Simulator, Timestamp(1));
        logbook.update(event.clone());
        assert!(logbook.is_dirty());

        logbook.save().unwrap();
        assert!(!logbook.is_dirty());

        assert!(logbook.remove(EventId::new()).is_none());
        assert!(!logbook.is_dirty());

        logbook.remove(event.id);
        assert!(logbook.is_dirty());
    }

    #[test]
    fn test_chronological_skips_removed_after_start() {
        let dir = TempDir::new().unwrap();
        let logbook = test_logbook(&dir);
        let a = Event::new(EventKind::Flight, Timestamp(1));
        let b = Event::new(EventKind::Flight, Timestamp(2));
        let c = Event::new(EventKind::Flight, Timestamp(3));
        for event in [&a, &b, &c] {
            logbook.update(event.clone());
        }

        let mut walk = logbook.chronological();
        assert_eq!(walk.next().map(|e| e.id), Some(a.id));

        logbook.remove(b.id);
        logbook.update(Event::new(EventKind::Flight, Timestamp(0)));

        let rest: Vec<_> = walk.map(|e| e.id).collect();
        assert_eq!(rest, vec![c.id]);
    }

    #[test]
    fn test_chronological_dates_never_decrease_when_moved_mid_walk() {
        let dir = TempDir::new().unwrap();
        let logbook = test_logbook(&dir);
        let a = Event::new(EventKind::Flight, Timestamp(1));
        let b = Event::new(EventKind::Flight, Timestamp(2));
        let c = Event::new(EventKind::Flight, Timestamp(3));
        for event in [&a, &b, &c] {
            logbook.update(event.clone());
        }

        let mut walk = logbook.chronological();
        let mut dates = vec![walk.next().unwrap().date];
        logbook.update(c.clone().at(Timestamp(0)));
        dates.extend(walk.map(|e| e.date));

        assert_eq!(dates, vec![Timestamp(1), Timestamp(2)]);
    }

    #[test]
    fn test_stats() {
        let dir = TempDir::new().unwrap();
        let logbook = test_logbook(&dir);
        logbook.update(Event::new(EventKind::Flight, Timestamp(1)));
        logbook.update(Event::new(EventKind::Flight, Timestamp(1)));
        logbook.update(Event::new(EventKind::Flight, Timestamp(5)));
        logbook.save().unwrap();

        let stats = logbook.stats().unwrap();
        assert_eq!(stats.event_count, 3);
        assert_eq!(stats.date_count, 2);
        assert!(stats.file_size_bytes > 0);
    }
}
