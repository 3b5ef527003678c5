//! # Storage
//!
//! redb-backed persistence: table schema, record layouts, and the
//! transactional [`WordStore`].

mod records;
mod redb_store;
pub mod schema;

pub use redb_store::WordStore;

pub(crate) use records::{
    EntryRecord, JoinedEntry, NotebookRecord, WordRecord, decode, display_time, from_micros,
    newest_first, now_micros,
};
pub(crate) use redb_store::{load, next_id, store};
