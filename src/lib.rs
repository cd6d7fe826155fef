//! # Logbook
//!
//! A personal record store of dated events: flights, simulator sessions,
//! and ground instruction.
//!
//! ## Core Concepts
//!
//! - **Events**: Immutable dated records with a unique id and named
//!   experience values
//! - **Dual index**: An identity map and a chronological index kept
//!   consistent by every mutation
//! - **Queries**: Point lookup, date ranges, experience search, and
//!   chronological traversal
//! - **Persistence**: The whole event set lives in one file, replaced
//!   atomically on each save
//!
//! ## Example
//!
//! ```ignore
//! use logbook::{Event, EventKind, ExperienceValue, Logbook, Timestamp};
//!
//! let logbook = Logbook::open("./pilot.logbook")?;
//!
//! let flight = Event::new(EventKind::Flight, Timestamp::now())
//!     .with_equipment("C172")
//!     .with_experience("Landings", ExperienceValue::Count(3));
//! logbook.update(flight);
//!
//! let landings = logbook.with_experience("Landings");
//! logbook.save()?;
//! ```

pub mod error;
pub mod index;
pub mod logbook;
pub mod persist;
pub mod query;
pub mod types;

// Re-exports
pub use error::{LogbookError, Result};
pub use index::{ChronologicalIndex, DualIndex};
pub use logbook::{Chronological, Logbook, LogbookConfig};
pub use persist::FileEncoding;
pub use query::DateInterval;
pub use types::*;
