//! The jot journal service.
//!
//! Drives the pure engine in [`jot_core`] against the collaborator traits:
//! optimistic appends with rollback, deletions with cascade, live suggestion
//! composition on tokio, and an in-memory session-scoped store.

mod composer;
mod config;
mod journal;
mod memory;
mod sources;

pub mod error;

pub use composer::Composer;
pub use config::JournalConfig;
pub use error::{Error, Result};
pub use journal::{Journal, Snapshot};
pub use memory::MemoryStore;
pub use sources::{StaticContacts, StaticPlaceSearch};
