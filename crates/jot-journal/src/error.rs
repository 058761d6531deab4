//! Error type for `jot-journal`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] jot_core::Error),

  /// A message store operation failed; local state has been restored to
  /// match the durable log.
  #[error("persistence failure: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("message text is empty")]
  EmptyMessage,

  #[error("contact name is empty")]
  EmptyName,

  #[error("message not found: {0}")]
  MessageNotFound(Uuid),

  #[error("person not found: {0}")]
  PersonNotFound(Uuid),

  #[error("place not found: {0}")]
  PlaceNotFound(Uuid),
}

impl Error {
  pub(crate) fn persistence(
    e: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    Self::Persistence(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
