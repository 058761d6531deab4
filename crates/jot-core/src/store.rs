//! Collaborator traits consumed by the journal.
//!
//! The message store is the durable log; place search and the contact source
//! feed classification and suggestions. Higher layers depend on these
//! abstractions, not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{entity::Coordinates, message::Message};

/// One result from a place search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceResult {
  pub name:      String,
  pub address:   String,
  pub latitude:  f64,
  pub longitude: f64,
}

impl PlaceResult {
  pub fn coordinates(&self) -> Coordinates {
    Coordinates {
      latitude:  self.latitude,
      longitude: self.longitude,
    }
  }
}

/// The durable message log.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded runtimes.
pub trait MessageStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a newly created message.
  fn append(
    &self,
    message: Message,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove a message by id.
  fn delete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Load the full log for the current session.
  fn load_all(
    &self,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;
}

/// Live place lookup by free-text query.
pub trait PlaceSearch: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn search<'a>(
    &'a self,
    query: &'a str,
  ) -> impl Future<Output = Result<Vec<PlaceResult>, Self::Error>> + Send + 'a;
}

/// The device address book, read once per session.
pub trait ContactSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Display names of every contact.
  fn list_contacts(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;
}
