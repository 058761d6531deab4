//! Reconciliation: message log → People and Places registries.
//!
//! Registries are never patched in place. Every change to the log rebuilds
//! them in two passes: an upsert pass collects one entry per
//! case-insensitive name and type, then a recount pass filters the log per
//! entity to compute `message_count` and `last_mentioned_at`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  entity::{Coordinates, Person, Place, Registries, entity_id, name_key},
  message::{Message, MentionType},
};

// ─── Seeds ───────────────────────────────────────────────────────────────────

/// Records that a registry entity was deleted at `deleted_at`.
///
/// A tombstoned entity stays out of the registries until a message newer than
/// the deletion mentions it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tombstone {
  pub kind:       MentionType,
  pub name:       String,
  pub deleted_at: DateTime<Utc>,
}

/// Session state that shapes the registries beyond the log itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySeeds {
  /// People added explicitly through "add contact"; kept with a zero count
  /// while unmentioned.
  pub pinned_people: Vec<String>,
  pub tombstones:    Vec<Tombstone>,
}

impl RegistrySeeds {
  fn buried(&self, log: &[Message], kind: MentionType, name: &str) -> bool {
    let key = name_key(name);
    self
      .tombstones
      .iter()
      .filter(|t| t.kind == kind && name_key(&t.name) == key)
      .any(|t| {
        !log
          .iter()
          .any(|m| m.timestamp > t.deleted_at && m.mentions_entity(kind, name))
      })
  }
}

// ─── Queries ─────────────────────────────────────────────────────────────────

/// Messages mentioning the entity, newest first.
pub fn history<'a>(
  log: &'a [Message],
  kind: MentionType,
  name: &str,
) -> Vec<&'a Message> {
  let mut messages: Vec<&Message> = log
    .iter()
    .filter(|m| m.mentions_entity(kind, name))
    .collect();
  messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
  messages
}

/// Ids of the messages whose mentions all refer to the entity. These are the
/// messages removed when the entity is deleted.
pub fn exclusive_messages(
  log: &[Message],
  kind: MentionType,
  name: &str,
) -> Vec<Uuid> {
  log
    .iter()
    .filter(|m| m.mentions_only(kind, name))
    .map(|m| m.id)
    .collect()
}

/// Coordinates from the earliest message that carries any for the place.
fn first_coordinates(log: &[Message], name: &str) -> Option<Coordinates> {
  chronological(log).into_iter().find_map(|m| {
    m.mentions
      .iter()
      .filter(|mention| mention.refers_to(MentionType::Place, name))
      .find_map(|mention| mention.coordinates)
  })
}

fn chronological(log: &[Message]) -> Vec<&Message> {
  let mut ordered: Vec<&Message> = log.iter().collect();
  ordered.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
  ordered
}

// ─── Reconcile ───────────────────────────────────────────────────────────────

/// Rebuild both registries from the log alone.
pub fn reconcile(log: &[Message]) -> Registries {
  reconcile_with(log, &RegistrySeeds::default())
}

/// Rebuild both registries from the log and the session seeds.
///
/// Display names come from the pinned contact name if any, otherwise from the
/// earliest mention, so the result does not depend on log order.
pub fn reconcile_with(log: &[Message], seeds: &RegistrySeeds) -> Registries {
  // Pass 1: upsert one entry per (type, case-insensitive name).
  let mut people: BTreeMap<String, String> = BTreeMap::new();
  let mut places: BTreeMap<String, String> = BTreeMap::new();

  for name in &seeds.pinned_people {
    people.entry(name_key(name)).or_insert_with(|| name.clone());
  }
  for message in chronological(log) {
    for mention in &message.mentions {
      let name = mention.name();
      let registry = match mention.kind {
        MentionType::Person => &mut people,
        MentionType::Place => &mut places,
      };
      registry.entry(name_key(&name)).or_insert(name);
    }
  }

  people.retain(|_, name| !seeds.buried(log, MentionType::Person, name));
  places.retain(|_, name| !seeds.buried(log, MentionType::Place, name));

  // Pass 2: recount every entity against the log.
  let people = people
    .into_values()
    .map(|name| {
      let mentioned = history(log, MentionType::Person, &name);
      Person {
        id: entity_id(MentionType::Person, &name),
        message_count: mentioned.len(),
        last_mentioned_at: mentioned.first().map(|m| m.timestamp),
        name,
      }
    })
    .collect::<Vec<_>>();

  let places = places
    .into_values()
    .map(|name| {
      let mentioned = history(log, MentionType::Place, &name);
      Place {
        id: entity_id(MentionType::Place, &name),
        message_count: mentioned.len(),
        last_mentioned_at: mentioned.first().map(|m| m.timestamp),
        coordinates: first_coordinates(log, &name),
        name,
      }
    })
    .collect::<Vec<_>>();

  tracing::debug!(
    messages = log.len(),
    people = people.len(),
    places = places.len(),
    "reconciled registries"
  );

  Registries { people, places }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::classify::{KnownEntities, mentions_in};

  fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  fn message(text: &str, secs: i64, known: &KnownEntities) -> Message {
    Message::from_parts(Uuid::new_v4(), text, at(secs), mentions_in(text, known))
      .unwrap()
  }

  fn known(people: &[&str], places: &[&str]) -> KnownEntities {
    KnownEntities {
      people: people.iter().collect(),
      places: places.iter().collect(),
    }
  }

  fn lunch_log() -> Vec<Message> {
    let k = known(&["Alice"], &["Deli"]);
    vec![
      message("Lunch with @Alice at @Deli", 100, &k),
      message("Call @Alice", 200, &k),
    ]
  }

  #[test]
  fn lunch_scenario_counts() {
    let log = lunch_log();
    let r = reconcile(&log);

    assert_eq!(r.people.len(), 1);
    assert_eq!(r.people[0].name, "Alice");
    assert_eq!(r.people[0].message_count, 2);
    assert_eq!(r.people[0].last_mentioned_at, Some(at(200)));

    assert_eq!(r.places.len(), 1);
    assert_eq!(r.places[0].name, "Deli");
    assert_eq!(r.places[0].message_count, 1);
    assert_eq!(r.places[0].last_mentioned_at, Some(at(100)));
  }

  #[test]
  fn reconcile_is_idempotent_and_order_independent() {
    let log = lunch_log();
    let mut reversed = log.clone();
    reversed.reverse();
    assert_eq!(reconcile(&log), reconcile(&log));
    assert_eq!(reconcile(&log), reconcile(&reversed));
  }

  #[test]
  fn names_are_case_insensitively_unique() {
    let k = known(&["alice"], &[]);
    let log = vec![
      message("@Alice first", 1, &k),
      message("then @ALICE", 2, &k),
    ];
    let r = reconcile(&log);
    assert_eq!(r.people.len(), 1);
    assert_eq!(r.people[0].name, "Alice");
    assert_eq!(r.people[0].message_count, 2);
  }

  #[test]
  fn counts_match_the_log_for_every_entity() {
    let k = known(&["Alice", "Bob"], &["Deli", "Park"]);
    let log = vec![
      message("@Alice and @Bob at @Park", 10, &k),
      message("@Bob @Bob again", 20, &k),
      message("@Deli with @Alice", 30, &k),
      message("nothing", 40, &k),
    ];
    let r = reconcile(&log);
    for p in &r.people {
      let expected = log
        .iter()
        .filter(|m| m.mentions_entity(MentionType::Person, &p.name))
        .count();
      assert_eq!(p.message_count, expected, "{}", p.name);
    }
    assert_eq!(r.person_named("bob").unwrap().message_count, 2);
    assert_eq!(
      r.place_named("park").unwrap().last_mentioned_at,
      Some(at(10))
    );
  }

  #[test]
  fn same_name_in_both_registries_counts_separately() {
    let person = known(&["Jordan"], &[]);
    let place = known(&[], &["Jordan"]);
    let log = vec![
      message("@Jordan called", 1, &person),
      message("flying to @Jordan", 2, &place),
    ];
    let r = reconcile(&log);
    assert_eq!(r.people[0].message_count, 1);
    assert_eq!(r.places[0].message_count, 1);
    assert_ne!(r.people[0].id, r.places[0].id);
  }

  #[test]
  fn coordinates_first_write_wins() {
    let k = known(&[], &["Deli"]);
    let mut first = message("@Deli", 10, &k);
    let mut second = message("@Deli again", 20, &k);
    first.mentions[0].coordinates = Some(Coordinates {
      latitude:  1.0,
      longitude: 2.0,
    });
    second.mentions[0].coordinates = Some(Coordinates {
      latitude:  9.0,
      longitude: 9.0,
    });
    let r = reconcile(&[second, first]);
    assert_eq!(r.places[0].coordinates.unwrap().latitude, 1.0);
  }

  #[test]
  fn removing_last_message_drops_place_and_coordinates() {
    let k = known(&[], &["Deli"]);
    let mut only = message("@Deli", 10, &k);
    only.mentions[0].coordinates = Some(Coordinates {
      latitude:  1.0,
      longitude: 2.0,
    });
    assert_eq!(reconcile(std::slice::from_ref(&only)).places.len(), 1);
    assert!(reconcile(&[]).places.is_empty());
  }

  #[test]
  fn pinned_people_survive_with_zero_count() {
    let seeds = RegistrySeeds {
      pinned_people: vec!["Dana".into()],
      tombstones:    vec![],
    };
    let r = reconcile_with(&[], &seeds);
    assert_eq!(r.people.len(), 1);
    assert_eq!(r.people[0].message_count, 0);
    assert_eq!(r.people[0].last_mentioned_at, None);
  }

  #[test]
  fn tombstone_hides_until_mentioned_again() {
    let k = known(&["Alice", "Bob"], &[]);
    let mut log = vec![message("@Alice and @Bob", 10, &k)];
    let seeds = RegistrySeeds {
      pinned_people: vec![],
      tombstones:    vec![Tombstone {
        kind:       MentionType::Person,
        name:       "alice".into(),
        deleted_at: at(50),
      }],
    };
    let r = reconcile_with(&log, &seeds);
    assert!(r.person_named("Alice").is_none());
    assert!(r.person_named("Bob").is_some());

    log.push(message("@Alice is back", 60, &k));
    let r = reconcile_with(&log, &seeds);
    let alice = r.person_named("Alice").unwrap();
    assert_eq!(alice.message_count, 2);
    assert_eq!(alice.last_mentioned_at, Some(at(60)));
  }

  #[test]
  fn exclusive_messages_keep_shared_ones() {
    let log = lunch_log();
    let ids = exclusive_messages(&log, MentionType::Person, "alice");
    assert_eq!(ids, vec![log[1].id]);
    assert!(exclusive_messages(&log, MentionType::Place, "Deli").is_empty());
  }

  #[test]
  fn history_is_newest_first() {
    let log = lunch_log();
    let h = history(&log, MentionType::Person, "Alice");
    assert_eq!(h.len(), 2);
    assert_eq!(h[0].text, "Call @Alice");
  }
}
