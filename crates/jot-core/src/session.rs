//! The signed-in user session.
//!
//! A session is created by an explicit sign-in and ends at sign-out. It is
//! passed to the collaborators that need an identity (the message store)
//! rather than looked up globally. There is no fallback identity: once ended,
//! every identity lookup fails with [`Error::NotAuthenticated`].

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Who the session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub user_id:    String,
  pub email:      Option<String>,
  pub started_at: DateTime<Utc>,
}

/// A shared handle to the current session.
///
/// Cloning is cheap and every clone observes [`Session::sign_out`].
#[derive(Debug, Clone)]
pub struct Session {
  identity: Arc<RwLock<Option<Identity>>>,
}

impl Session {
  /// Start a session for an authenticated user. An empty user id is refused.
  pub fn sign_in(
    user_id: impl Into<String>,
    email: Option<String>,
  ) -> Result<Self> {
    let user_id = user_id.into();
    if user_id.trim().is_empty() {
      return Err(Error::NotAuthenticated);
    }
    tracing::info!(%user_id, "session started");
    Ok(Self {
      identity: Arc::new(RwLock::new(Some(Identity {
        user_id,
        email,
        started_at: Utc::now(),
      }))),
    })
  }

  pub fn identity(&self) -> Result<Identity> {
    self
      .identity
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
      .ok_or(Error::NotAuthenticated)
  }

  pub fn user_id(&self) -> Result<String> {
    self.identity().map(|i| i.user_id)
  }

  pub fn is_active(&self) -> bool { self.identity().is_ok() }

  /// End the session for every holder of this handle.
  pub fn sign_out(&self) {
    let ended = self
      .identity
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .take();
    if let Some(identity) = ended {
      tracing::info!(user_id = %identity.user_id, "session ended");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sign_out_is_seen_by_clones() {
    let session = Session::sign_in("u1", None).unwrap();
    let held = session.clone();
    assert_eq!(held.user_id().unwrap(), "u1");

    session.sign_out();
    assert!(!held.is_active());
    assert!(matches!(held.user_id(), Err(Error::NotAuthenticated)));
  }

  #[test]
  fn blank_user_is_refused() {
    assert!(matches!(
      Session::sign_in("  ", None),
      Err(Error::NotAuthenticated)
    ));
  }
}
