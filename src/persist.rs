//! Whole-file persistence of the event set.
//!
//! A logbook file holds one encoded sequence of events and nothing else.
//! Saves re-encode the full set and atomically replace the file via a
//! temp-rename, so readers see either the old or the new content.

use crate::error::{LogbookError, Result};
use crate::index::DualIndex;
use crate::types::Event;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// On-disk encoding of the event sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileEncoding {
    /// MessagePack with named fields.
    #[default]
    MessagePack,
    /// Pretty-printed JSON.
    Json,
}

/// Encode `events` as a single sequence.
pub fn encode<'a>(
    events: impl IntoIterator<Item = &'a Event>,
    encoding: FileEncoding,
) -> Result<Vec<u8>> {
    let events: Vec<&Event> = events.into_iter().collect();
    let bytes = match encoding {
        FileEncoding::MessagePack => rmp_serde::to_vec_named(&events)?,
        FileEncoding::Json => serde_json::to_vec_pretty(&events)?,
    };
    Ok(bytes)
}

/// Decode a sequence of events.
pub fn decode(bytes: &[u8], encoding: FileEncoding) -> Result<Vec<Event>> {
    let events = match encoding {
        FileEncoding::MessagePack => rmp_serde::from_slice(bytes)?,
        FileEncoding::Json => serde_json::from_slice(bytes)
            .map_err(|e| LogbookError::Deserialization(e.to_string()))?,
    };
    Ok(events)
}

/// Load the event set at `path` and index it.
///
/// A missing file is created holding an empty sequence when
/// `create_if_missing` is set, otherwise [`LogbookError::NotInitialized`].
/// Content that fails to decode is an error and is left untouched. A
/// zero-byte file counts as existing content, not as missing: it fails to
/// decode rather than being replaced with an empty logbook.
pub fn load(path: &Path, encoding: FileEncoding, create_if_missing: bool) -> Result<DualIndex> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if !create_if_missing {
                return Err(LogbookError::NotInitialized);
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            save(path, encoding, std::iter::empty::<&Event>())?;
            info!(path = %path.display(), "created empty logbook");
            return Ok(DualIndex::new());
        }
        Err(e) => return Err(e.into()),
    };

    let index = DualIndex::from_events(decode(&bytes, encoding)?);
    info!(path = %path.display(), events = index.len(), "loaded logbook");
    Ok(index)
}

/// Replace the content at `path` with `events`.
///
/// Encoding happens before any file is touched. Returns the number of bytes
/// written.
pub fn save<'a>(
    path: &Path,
    encoding: FileEncoding,
    events: impl IntoIterator<Item = &'a Event>,
) -> Result<u64> {
    let bytes = encode(events, encoding)?;
    write_encoded(path, &bytes)?;
    Ok(bytes.len() as u64)
}

/// Atomically replace the content at `path` with already encoded `bytes`.
pub(crate) fn write_encoded(path: &Path, bytes: &[u8]) -> Result<()> {
    write_atomic(path, bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote logbook");
    Ok(())
}

/// Sibling path with `suffix` appended to the file name.
pub(crate) fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = sidecar_path(path, ".tmp");

    let written = write_synced(&tmp_path, bytes).and_then(|()| fs::rename(&tmp_path, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    sync_parent_dir(path)?;
    Ok(())
}

/// Flush the directory entry so the rename survives a crash.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file: File = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
