//! [`Journal`] — the in-memory log and registries kept in step with a
//! [`MessageStore`].
//!
//! The registries are rebuilt from the log after every change. Appends are
//! applied locally first and rolled back if the store rejects them; deletes
//! go to the store first and only then touch local state.

use std::sync::Arc;

use chrono::Utc;
use jot_core::{
  classify::{KnownEntities, mentions_with},
  entity::{Person, Place, Registries, entity_id, name_key},
  message::{Mention, MentionType, Message},
  reconcile::{
    RegistrySeeds, Tombstone, exclusive_messages, history, reconcile_with,
  },
  store::{ContactSource, MessageStore},
  suggest::SuggestionItem,
};
use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{Error, JournalConfig, Result};

/// A point-in-time copy of the journal for rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
  pub messages:   Vec<Message>,
  pub registries: Registries,
}

pub struct Journal<S: MessageStore> {
  store:      Arc<S>,
  config:     JournalConfig,
  log:        Vec<Message>,
  seeds:      RegistrySeeds,
  contacts:   Vec<String>,
  registries: Registries,
  updates:    watch::Sender<Registries>,
}

impl<S: MessageStore> Journal<S> {
  /// An empty journal; call [`Journal::load`] to read the durable log.
  pub fn new(store: Arc<S>, config: JournalConfig) -> Self {
    let (updates, _) = watch::channel(Registries::default());
    Self {
      store,
      config,
      log: Vec::new(),
      seeds: RegistrySeeds::default(),
      contacts: Vec::new(),
      registries: Registries::default(),
      updates,
    }
  }

  /// Create a journal and load the durable log into it.
  pub async fn open(store: Arc<S>, config: JournalConfig) -> Result<Self> {
    let mut journal = Self::new(store, config);
    journal.load().await?;
    Ok(journal)
  }

  pub fn config(&self) -> &JournalConfig { &self.config }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub fn messages(&self) -> &[Message] { &self.log }

  pub fn registries(&self) -> &Registries { &self.registries }

  pub fn people(&self) -> &[Person] { &self.registries.people }

  pub fn places(&self) -> &[Place] { &self.registries.places }

  pub fn contacts(&self) -> &[String] { &self.contacts }

  pub fn snapshot(&self) -> Snapshot {
    Snapshot {
      messages:   self.log.clone(),
      registries: self.registries.clone(),
    }
  }

  /// Receive the registries after every rebuild, including optimistic ones.
  pub fn subscribe(&self) -> watch::Receiver<Registries> {
    self.updates.subscribe()
  }

  /// Messages mentioning the person, newest first.
  pub fn person_history(&self, id: Uuid) -> Result<Vec<&Message>> {
    let person = self.registries.person(id).ok_or(Error::PersonNotFound(id))?;
    Ok(history(&self.log, MentionType::Person, &person.name))
  }

  /// Messages mentioning the place, newest first.
  pub fn place_history(&self, id: Uuid) -> Result<Vec<&Message>> {
    let place = self.registries.place(id).ok_or(Error::PlaceNotFound(id))?;
    Ok(history(&self.log, MentionType::Place, &place.name))
  }

  /// The names classification accepts without a confirmed suggestion.
  pub fn known(&self) -> KnownEntities {
    KnownEntities::from_sources(&self.contacts, &self.registries)
  }

  /// The mentions `text` would carry if sent now.
  pub fn mentions_for(
    &self,
    text: &str,
    confirmed: &[SuggestionItem],
  ) -> Vec<Mention> {
    mentions_with(text, &self.known(), confirmed)
  }

  // ── Contacts ──────────────────────────────────────────────────────────────

  pub fn set_contacts(&mut self, contacts: Vec<String>) {
    self.contacts = contacts;
  }

  /// Read the contact source. A failing source leaves the current contacts
  /// in place.
  pub async fn refresh_contacts<C: ContactSource>(&mut self, source: &C) {
    match source.list_contacts().await {
      Ok(contacts) => {
        tracing::debug!(count = contacts.len(), "contacts refreshed");
        self.contacts = contacts;
      }
      Err(e) => tracing::warn!(error = %e, "contact source failed"),
    }
  }

  /// Add a person without a mention. Adding a name that already exists is a
  /// no-op.
  pub fn add_contact(&mut self, name: &str) -> Result<Person> {
    let name = name.trim();
    if name.is_empty() {
      return Err(Error::EmptyName);
    }
    let key = name_key(name);
    if !self.seeds.pinned_people.iter().any(|p| name_key(p) == key) {
      self.seeds.pinned_people.push(name.to_owned());
    }
    self.lift_tombstone(MentionType::Person, &key);
    self.rebuild();
    self
      .registries
      .person_named(name)
      .cloned()
      .ok_or_else(|| {
        Error::PersonNotFound(entity_id(MentionType::Person, name))
      })
  }

  // ── Log mutations ─────────────────────────────────────────────────────────

  /// Replace the local log with the durable one. On failure local state is
  /// left as it was.
  pub async fn load(&mut self) -> Result<()> {
    let messages = self.store.load_all().await.map_err(Error::persistence)?;
    tracing::info!(count = messages.len(), "loaded message log");
    self.log = messages;
    self.rebuild();
    Ok(())
  }

  /// Create and persist a message.
  ///
  /// The message joins the local log before the store is called so the
  /// registries reflect it at once; if the store fails it is removed again
  /// and the failure is returned.
  pub async fn send(
    &mut self,
    text: &str,
    confirmed: &[SuggestionItem],
  ) -> Result<Message> {
    if text.trim().is_empty() {
      return Err(Error::EmptyMessage);
    }
    let message = Message::new(text, self.mentions_for(text, confirmed))?;

    self.log.push(message.clone());
    self.rebuild();

    match self.store.append(message.clone()).await {
      Ok(()) => {
        tracing::info!(
          message_id = %message.id,
          mentions = message.mentions.len(),
          "message appended"
        );
        Ok(message)
      }
      Err(e) => {
        tracing::warn!(
          message_id = %message.id,
          error = %e,
          "append failed, rolling back"
        );
        self.log.retain(|m| m.id != message.id);
        self.rebuild();
        Err(Error::persistence(e))
      }
    }
  }

  /// Delete one message.
  pub async fn delete_message(&mut self, id: Uuid) -> Result<()> {
    if !self.log.iter().any(|m| m.id == id) {
      return Err(Error::MessageNotFound(id));
    }
    self.store.delete(id).await.map_err(Error::persistence)?;
    tracing::info!(message_id = %id, "message deleted");
    self.log.retain(|m| m.id != id);
    self.rebuild();
    Ok(())
  }

  /// Delete a person and every message that mentions only them. Returns the
  /// number of messages removed.
  pub async fn delete_person(&mut self, id: Uuid) -> Result<usize> {
    let name = self
      .registries
      .person(id)
      .ok_or(Error::PersonNotFound(id))?
      .name
      .clone();
    self.delete_entity(MentionType::Person, name).await
  }

  /// Delete a place and every message that mentions only it. Returns the
  /// number of messages removed.
  pub async fn delete_place(&mut self, id: Uuid) -> Result<usize> {
    let name = self
      .registries
      .place(id)
      .ok_or(Error::PlaceNotFound(id))?
      .name
      .clone();
    self.delete_entity(MentionType::Place, name).await
  }

  async fn delete_entity(
    &mut self,
    kind: MentionType,
    name: String,
  ) -> Result<usize> {
    let doomed = exclusive_messages(&self.log, kind, &name);
    let mut removed = 0;
    for id in doomed {
      if let Err(e) = self.store.delete(id).await {
        // Keep what the store already removed; the entity stays.
        tracing::warn!(
          %kind,
          %name,
          removed,
          error = %e,
          "cascade delete failed"
        );
        self.rebuild();
        return Err(Error::persistence(e));
      }
      self.log.retain(|m| m.id != id);
      removed += 1;
    }

    let key = name_key(&name);
    if kind == MentionType::Person {
      self.seeds.pinned_people.retain(|p| name_key(p) != key);
    }
    self.lift_tombstone(kind, &key);
    self.seeds.tombstones.push(Tombstone {
      kind,
      name: name.clone(),
      deleted_at: Utc::now(),
    });
    self.rebuild();

    tracing::info!(%kind, %name, removed, "entity deleted");
    Ok(removed)
  }

  fn lift_tombstone(&mut self, kind: MentionType, key: &str) {
    self
      .seeds
      .tombstones
      .retain(|t| !(t.kind == kind && name_key(&t.name) == key));
  }

  fn rebuild(&mut self) {
    self.registries = reconcile_with(&self.log, &self.seeds);
    self.updates.send_replace(self.registries.clone());
  }
}
