//! Registry entities derived from the message log.
//!
//! People and Places are never stored authoritatively; every field, a place's
//! coordinates included, is recomputed from the log by
//! [`crate::reconcile::reconcile`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::MentionType;

/// Namespace for the deterministic registry entity ids.
const ENTITY_NAMESPACE: Uuid =
  Uuid::from_u128(0x6a6f_742d_7265_6769_7374_7279_2d69_6473);

/// Case-insensitive registry key for a name.
pub fn name_key(name: &str) -> String { name.to_lowercase() }

/// Stable id for the entity `name` in registry `kind`.
///
/// Rebuilding the registries from the same log always yields the same ids.
pub fn entity_id(kind: MentionType, name: &str) -> Uuid {
  let seed = format!("{kind}:{}", name_key(name));
  Uuid::new_v5(&ENTITY_NAMESPACE, seed.as_bytes())
}

/// A WGS84 position attached to a place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub latitude:  f64,
  pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
  pub id:                Uuid,
  pub name:              String,
  pub message_count:     usize,
  pub last_mentioned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
  pub id:                Uuid,
  pub name:              String,
  pub message_count:     usize,
  pub last_mentioned_at: Option<DateTime<Utc>>,
  pub coordinates:       Option<Coordinates>,
}

/// The People and Places registries at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registries {
  pub people: Vec<Person>,
  pub places: Vec<Place>,
}

impl Registries {
  pub fn person(&self, id: Uuid) -> Option<&Person> {
    self.people.iter().find(|p| p.id == id)
  }

  pub fn place(&self, id: Uuid) -> Option<&Place> {
    self.places.iter().find(|p| p.id == id)
  }

  pub fn person_named(&self, name: &str) -> Option<&Person> {
    let key = name_key(name);
    self.people.iter().find(|p| name_key(&p.name) == key)
  }

  pub fn place_named(&self, name: &str) -> Option<&Place> {
    let key = name_key(name);
    self.places.iter().find(|p| name_key(&p.name) == key)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn entity_id_ignores_case() {
    assert_eq!(
      entity_id(MentionType::Person, "Alice"),
      entity_id(MentionType::Person, "ALICE")
    );
  }

  #[test]
  fn entity_id_depends_on_kind() {
    assert_ne!(
      entity_id(MentionType::Person, "Paris"),
      entity_id(MentionType::Place, "Paris")
    );
  }
}
