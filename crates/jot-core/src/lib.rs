//! Core types and algorithms for the jot mention journal.
//!
//! Free-text entries carry `@name` mentions. This crate turns raw text into
//! typed mentions and folds the message log into the People and Places
//! registries. It is deliberately free of runtime, storage and network
//! dependencies; collaborators are described by the traits in [`store`].

pub mod classify;
pub mod entity;
pub mod error;
pub mod extract;
pub mod message;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod suggest;

pub use error::{Error, Result};

/// The character that opens a mention.
pub const MARKER: char = '@';
