//! [`MemoryStore`] — an in-process [`MessageStore`] scoped to a session.

use std::{collections::HashMap, sync::Arc};

use jot_core::{message::Message, session::Session, store::MessageStore};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Messages kept in memory and partitioned by user id.
///
/// Every operation requires an active [`Session`]; after sign-out the store
/// refuses with [`jot_core::Error::NotAuthenticated`]. Cloning is cheap and
/// clones share the same messages.
#[derive(Debug, Clone)]
pub struct MemoryStore {
  session: Session,
  logs:    Arc<RwLock<HashMap<String, Vec<Message>>>>,
}

impl MemoryStore {
  pub fn new(session: Session) -> Self {
    Self {
      session,
      logs: Arc::default(),
    }
  }

  /// A handle on the same messages acting for another session.
  pub fn for_session(&self, session: Session) -> Self {
    Self {
      session,
      logs: Arc::clone(&self.logs),
    }
  }

  pub fn session(&self) -> &Session { &self.session }
}

impl MessageStore for MemoryStore {
  type Error = jot_core::Error;

  async fn append(&self, message: Message) -> jot_core::Result<()> {
    let user_id = self.session.user_id()?;
    tracing::debug!(%user_id, message_id = %message.id, "append");
    self
      .logs
      .write()
      .await
      .entry(user_id)
      .or_default()
      .push(message);
    Ok(())
  }

  async fn delete(&self, id: Uuid) -> jot_core::Result<()> {
    let user_id = self.session.user_id()?;
    tracing::debug!(%user_id, message_id = %id, "delete");
    if let Some(log) = self.logs.write().await.get_mut(&user_id) {
      log.retain(|m| m.id != id);
    }
    Ok(())
  }

  async fn load_all(&self) -> jot_core::Result<Vec<Message>> {
    let user_id = self.session.user_id()?;
    let logs = self.logs.read().await;
    Ok(logs.get(&user_id).cloned().unwrap_or_default())
  }
}
