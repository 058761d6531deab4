//! Mention classification against known sources.
//!
//! Only names already known as a person (device contacts, the People
//! registry) or a place (the Places registry) are accepted. Anything else is
//! rejected; a novel name becomes a mention only through an explicitly
//! confirmed suggestion.

use std::collections::HashSet;

use crate::{
  MARKER,
  entity::{Registries, name_key},
  extract::{RawSpan, extract},
  message::{Mention, MentionType},
  suggest::SuggestionItem,
};

/// A case-insensitive set of names.
#[derive(Debug, Clone, Default)]
pub struct KnownNames {
  keys: HashSet<String>,
}

impl KnownNames {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, name: &str) { self.keys.insert(name_key(name)); }

  pub fn contains(&self, name: &str) -> bool {
    self.keys.contains(&name_key(name))
  }

  pub fn len(&self) -> usize { self.keys.len() }

  pub fn is_empty(&self) -> bool { self.keys.is_empty() }
}

impl<S: AsRef<str>> FromIterator<S> for KnownNames {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    let mut known = Self::new();
    for name in iter {
      known.insert(name.as_ref());
    }
    known
  }
}

/// The known-people and known-places sets used for classification.
#[derive(Debug, Clone, Default)]
pub struct KnownEntities {
  pub people: KnownNames,
  pub places: KnownNames,
}

impl KnownEntities {
  /// Contacts plus everything already in the registries.
  pub fn from_sources(contacts: &[String], registries: &Registries) -> Self {
    Self {
      people: contacts
        .iter()
        .map(String::as_str)
        .chain(registries.people.iter().map(|p| p.name.as_str()))
        .collect(),
      places: registries.places.iter().map(|p| p.name.as_str()).collect(),
    }
  }
}

/// Classify a cleaned candidate. A leading marker is ignored. People win a
/// tie; an unknown name yields `None`.
pub fn classify(
  cleaned: &str,
  people: &KnownNames,
  places: &KnownNames,
) -> Option<MentionType> {
  let name = cleaned.strip_prefix(MARKER).unwrap_or(cleaned);
  if name.is_empty() {
    None
  } else if people.contains(name) {
    Some(MentionType::Person)
  } else if places.contains(name) {
    Some(MentionType::Place)
  } else {
    None
  }
}

/// Resolve a candidate to the longest word prefix that classifies.
///
/// The extractor cannot tell where a multi-word name ends, so
/// `@Alice at noon` is tried as `Alice at noon`, `Alice at`, then `Alice`.
/// A prefix naming a confirmed suggestion takes that suggestion's type and
/// coordinates ahead of the known sets.
pub fn resolve(
  span: &RawSpan,
  source: &str,
  known: &KnownEntities,
  confirmed: &[SuggestionItem],
) -> Option<Mention> {
  span.prefixes(source).find_map(|(name, range)| {
    let key = name_key(&name);
    if let Some(item) = confirmed.iter().find(|c| name_key(&c.name) == key) {
      let coordinates = match item.kind {
        MentionType::Place => item.coordinates,
        MentionType::Person => None,
      };
      return Some(
        Mention::new(&name, item.kind, range).with_coordinates(coordinates),
      );
    }
    classify(&name, &known.people, &known.places)
      .map(|kind| Mention::new(&name, kind, range))
  })
}

/// Extract and classify every mention in `text`, dropping rejected
/// candidates.
pub fn mentions_in(text: &str, known: &KnownEntities) -> Vec<Mention> {
  mentions_with(text, known, &[])
}

/// Like [`mentions_in`], additionally accepting confirmed suggestions.
pub fn mentions_with(
  text: &str,
  known: &KnownEntities,
  confirmed: &[SuggestionItem],
) -> Vec<Mention> {
  let spans = extract(text);
  let mentions: Vec<Mention> = spans
    .iter()
    .filter_map(|span| resolve(span, text, known, confirmed))
    .collect();
  tracing::debug!(
    candidates = spans.len(),
    accepted = mentions.len(),
    "classified mentions"
  );
  mentions
}

#[cfg(test)]
mod tests {
  use super::*;

  fn known(people: &[&str], places: &[&str]) -> KnownEntities {
    KnownEntities {
      people: people.iter().collect(),
      places: places.iter().collect(),
    }
  }

  #[test]
  fn people_are_checked_first() {
    let k = known(&["Paris"], &["paris"]);
    assert_eq!(
      classify("@PARIS", &k.people, &k.places),
      Some(MentionType::Person)
    );
  }

  #[test]
  fn places_match_case_insensitively() {
    let k = known(&[], &["Deli"]);
    assert_eq!(
      classify("deli", &k.people, &k.places),
      Some(MentionType::Place)
    );
  }

  #[test]
  fn unknown_names_are_rejected() {
    let k = known(&["Alice"], &["Deli"]);
    assert_eq!(classify("project-x", &k.people, &k.places), None);
    assert_eq!(classify("@", &k.people, &k.places), None);
    // Repeated calls give the same answer.
    assert_eq!(classify("project-x", &k.people, &k.places), None);
  }

  #[test]
  fn hyphenated_person_and_unknown_project() {
    let text = "Meeting @Bob-Smith re @project-x tomorrow";
    let k = known(&["Bob-Smith"], &[]);
    let mentions = mentions_in(text, &k);
    assert_eq!(mentions.len(), 1);
    assert_eq!(mentions[0].text, "@Bob-Smith");
    assert_eq!(mentions[0].kind, MentionType::Person);
    assert_eq!(mentions[0].range.slice(text), Some("@Bob-Smith"));
  }

  #[test]
  fn multi_word_names_resolve_to_longest_match() {
    let text = "Dinner with @Mary Ann at @Blue Bottle Cafe";
    let k = known(&["Mary", "Mary Ann"], &["Blue Bottle Cafe"]);
    let mentions = mentions_in(text, &k);
    assert_eq!(mentions.len(), 2);
    assert_eq!(mentions[0].name(), "Mary Ann");
    assert_eq!(mentions[1].name(), "Blue Bottle Cafe");
    assert_eq!(mentions[1].kind, MentionType::Place);
  }

  #[test]
  fn known_entities_merge_contacts_and_registries() {
    let registries = Registries {
      people: vec![crate::entity::Person {
        id:                uuid::Uuid::nil(),
        name:              "Carol".into(),
        message_count:     1,
        last_mentioned_at: None,
      }],
      places: vec![],
    };
    let k = KnownEntities::from_sources(&["Alice".to_string()], &registries);
    assert!(k.people.contains("alice"));
    assert!(k.people.contains("CAROL"));
    assert!(k.places.is_empty());
  }

  #[test]
  fn confirmed_suggestion_admits_novel_place() {
    let text = "Coffee at @Blue Bottle";
    let item = SuggestionItem {
      name:        "Blue Bottle".into(),
      subtitle:    Some("66 Mint St".into()),
      kind:        MentionType::Place,
      coordinates: Some(crate::entity::Coordinates {
        latitude:  37.78,
        longitude: -122.4,
      }),
    };
    let k = known(&[], &[]);
    assert!(mentions_in(text, &k).is_empty());

    let mentions = mentions_with(text, &k, std::slice::from_ref(&item));
    assert_eq!(mentions.len(), 1);
    assert_eq!(mentions[0].kind, MentionType::Place);
    assert_eq!(mentions[0].coordinates, item.coordinates);
  }

  #[test]
  fn confirmed_kind_overrides_known_sets() {
    let k = known(&["Jordan"], &[]);
    let item = SuggestionItem {
      name:        "Jordan".into(),
      subtitle:    None,
      kind:        MentionType::Place,
      coordinates: None,
    };
    let mentions = mentions_with("trip to @Jordan", &k, &[item]);
    assert_eq!(mentions[0].kind, MentionType::Place);
  }
}
