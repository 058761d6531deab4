//! Suggestion composition for a partially typed mention.
//!
//! Ranking: contact prefix matches first, then known places that do not
//! overlap a contact match, then live search results not already listed. The
//! list is capped. Nothing here mutates the journal; a suggestion only
//! becomes a mention once it is confirmed and the next message is sent.
//!
//! Live search is asynchronous and may resolve after the user has moved on.
//! [`SuggestionState`] matches each result batch back to the request that
//! produced it and drops batches that are stale or arrive after a
//! confirmation.

use serde::{Deserialize, Serialize};

use crate::{
  MARKER,
  entity::{Coordinates, Place, name_key},
  message::MentionType,
  store::PlaceResult,
};

/// Default cap on the number of suggestions.
pub const DEFAULT_LIMIT: usize = 8;

/// Shortest partial that triggers a live place search.
pub const LIVE_SEARCH_MIN_LEN: usize = 2;

/// A proposed completion for the mention being typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionItem {
  pub name:        String,
  /// Address line for places.
  pub subtitle:    Option<String>,
  pub kind:        MentionType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub coordinates: Option<Coordinates>,
}

impl SuggestionItem {
  pub fn person(name: impl Into<String>) -> Self {
    Self {
      name:        name.into(),
      subtitle:    None,
      kind:        MentionType::Person,
      coordinates: None,
    }
  }

  fn known_place(place: &Place) -> Self {
    Self {
      name:        place.name.clone(),
      subtitle:    None,
      kind:        MentionType::Place,
      coordinates: place.coordinates,
    }
  }
}

impl From<PlaceResult> for SuggestionItem {
  fn from(r: PlaceResult) -> Self {
    let coordinates = Some(r.coordinates());
    Self {
      name: r.name,
      subtitle: Some(r.address),
      kind: MentionType::Place,
      coordinates,
    }
  }
}

// ─── Input helpers ───────────────────────────────────────────────────────────

/// The partial name after the last marker, while it is still being typed
/// (no whitespace yet).
pub fn active_token(input: &str) -> Option<&str> {
  token_at(input).map(|(_, partial)| partial)
}

/// Like [`active_token`], with the byte offset of its marker.
fn token_at(input: &str) -> Option<(usize, &str)> {
  let at = input.rfind(MARKER)?;
  let partial = &input[at + MARKER.len_utf8()..];
  (!partial.contains(char::is_whitespace)).then_some((at, partial))
}

/// Replace the mention being typed with the chosen suggestion.
pub fn apply_suggestion(input: &str, item: &SuggestionItem) -> String {
  match input.rfind(MARKER) {
    Some(at) => format!("{}{MARKER}{} ", &input[..at], item.name),
    None => input.to_owned(),
  }
}

// ─── Ranking ─────────────────────────────────────────────────────────────────

fn starts_with_ci(name: &str, partial: &str) -> bool {
  name_key(name).starts_with(&name_key(partial))
}

fn overlaps_ci(a: &str, b: &str) -> bool {
  let (a, b) = (name_key(a), name_key(b));
  a.contains(&b) || b.contains(&a)
}

/// Suggestions from already-known sources, ranked and capped.
pub fn compose_known(
  partial: &str,
  contacts: &[String],
  places: &[Place],
  limit: usize,
) -> Vec<SuggestionItem> {
  let mut items: Vec<SuggestionItem> = Vec::new();

  for contact in contacts.iter().filter(|c| starts_with_ci(c, partial)) {
    if !items.iter().any(|i| name_key(&i.name) == name_key(contact)) {
      items.push(SuggestionItem::person(contact.as_str()));
    }
  }

  let contact_matches: Vec<String> =
    items.iter().map(|i| i.name.clone()).collect();
  for place in places.iter().filter(|p| starts_with_ci(&p.name, partial)) {
    if contact_matches.iter().any(|c| overlaps_ci(c, &place.name)) {
      continue;
    }
    items.push(SuggestionItem::known_place(place));
  }

  items.truncate(limit);
  items
}

/// Append live search results whose names are not already listed.
pub fn merge_live(
  items: &mut Vec<SuggestionItem>,
  results: Vec<PlaceResult>,
  limit: usize,
) {
  for result in results {
    if items.len() >= limit {
      break;
    }
    if items.iter().all(|i| i.name != result.name) {
      items.push(result.into());
    }
  }
}

// ─── Staleness tracking ──────────────────────────────────────────────────────

/// Identifies one live search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
  pub generation: u64,
  pub query:      String,
}

/// The composer's view of the token being typed.
///
/// Every input change starts a new generation. A live result batch is applied
/// only if it belongs to the current generation and no suggestion has been
/// confirmed for the token since. A token is identified by its marker offset
/// and partial text, so a later token spelled the same way starts fresh.
#[derive(Debug, Clone)]
pub struct SuggestionState {
  generation:   u64,
  token:        Option<(usize, String)>,
  confirmed:    bool,
  items:        Vec<SuggestionItem>,
  limit:        usize,
  live_min_len: usize,
}

impl Default for SuggestionState {
  fn default() -> Self { Self::new(DEFAULT_LIMIT, LIVE_SEARCH_MIN_LEN) }
}

impl SuggestionState {
  pub fn new(limit: usize, live_min_len: usize) -> Self {
    Self {
      generation: 0,
      token: None,
      confirmed: false,
      items: Vec::new(),
      limit,
      live_min_len,
    }
  }

  pub fn items(&self) -> &[SuggestionItem] { &self.items }

  pub fn partial(&self) -> Option<&str> {
    self.token.as_ref().map(|(_, partial)| partial.as_str())
  }

  pub fn is_confirmed(&self) -> bool { self.confirmed }

  /// Recompute known-source suggestions for new input. Returns a ticket when
  /// a live search should be issued for it.
  pub fn update(
    &mut self,
    input: &str,
    contacts: &[String],
    places: &[Place],
  ) -> Option<SearchTicket> {
    self.generation += 1;

    let Some((at, partial)) = token_at(input) else {
      self.token = None;
      self.confirmed = false;
      self.items.clear();
      return None;
    };

    let same_token = self
      .token
      .as_ref()
      .is_some_and(|(prev_at, prev)| *prev_at == at && prev == partial);
    if !same_token {
      self.confirmed = false;
      self.token = Some((at, partial.to_owned()));
    }
    if self.confirmed {
      return None;
    }

    self.items = compose_known(partial, contacts, places, self.limit);
    (partial.chars().count() >= self.live_min_len).then(|| SearchTicket {
      generation: self.generation,
      query:      partial.to_owned(),
    })
  }

  /// Apply a live search batch. Returns `false` if the batch was stale and
  /// dropped.
  pub fn deliver(
    &mut self,
    ticket: &SearchTicket,
    results: Vec<PlaceResult>,
  ) -> bool {
    if self.confirmed || ticket.generation != self.generation {
      tracing::debug!(
        query = %ticket.query,
        confirmed = self.confirmed,
        "dropping stale place results"
      );
      return false;
    }
    merge_live(&mut self.items, results, self.limit);
    true
  }

  /// Confirm a suggestion for the current token. The list is cleared and no
  /// later live result may repopulate it.
  pub fn confirm(&mut self, item: &SuggestionItem) -> SuggestionItem {
    self.confirmed = true;
    self.items.clear();
    item.clone()
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  fn place(name: &str) -> Place {
    Place {
      id:                Uuid::nil(),
      name:              name.into(),
      message_count:     1,
      last_mentioned_at: None,
      coordinates:       None,
    }
  }

  fn result(name: &str) -> PlaceResult {
    PlaceResult {
      name:      name.into(),
      address:   "1 Main St".into(),
      latitude:  1.0,
      longitude: 2.0,
    }
  }

  fn contacts(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn active_token_stops_at_whitespace() {
    assert_eq!(active_token("hi @Al"), Some("Al"));
    assert_eq!(active_token("hi @"), Some(""));
    assert_eq!(active_token("hi @Al "), None);
    assert_eq!(active_token("no marker"), None);
  }

  #[test]
  fn apply_replaces_from_last_marker() {
    let item = SuggestionItem::person("Alice");
    assert_eq!(
      apply_suggestion("lunch @Bo and @al", &item),
      "lunch @Bo and @Alice "
    );
  }

  #[test]
  fn contacts_rank_before_places() {
    let items = compose_known(
      "s",
      &contacts(&["Sam", "Bob"]),
      &[place("Starbucks")],
      DEFAULT_LIMIT,
    );
    let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["Sam", "Starbucks"]);
    assert_eq!(items[0].kind, MentionType::Person);
    assert_eq!(items[1].kind, MentionType::Place);
  }

  #[test]
  fn overlapping_place_is_excluded() {
    let items = compose_known(
      "jo",
      &contacts(&["Jo"]),
      &[place("Joe's Diner"), place("Jordan Park")],
      DEFAULT_LIMIT,
    );
    // The contact "Jo" is a substring of both place names.
    assert_eq!(items.len(), 1);

    let items = compose_known(
      "jor",
      &contacts(&["Jordana"]),
      &[place("Jordan")],
      DEFAULT_LIMIT,
    );
    assert_eq!(items.len(), 1);
  }

  #[test]
  fn list_is_capped() {
    let many: Vec<String> = (0..12).map(|i| format!("Al{i}")).collect();
    assert_eq!(compose_known("al", &many, &[], DEFAULT_LIMIT).len(), 8);

    let mut items = compose_known("al", &many[..7], &[], DEFAULT_LIMIT);
    merge_live(&mut items, vec![result("Alamo"), result("Alcatraz")], 8);
    assert_eq!(items.len(), 8);
    assert_eq!(items[7].name, "Alamo");
  }

  #[test]
  fn live_results_skip_exact_duplicates() {
    let mut items =
      compose_known("de", &[], &[place("Deli")], DEFAULT_LIMIT);
    merge_live(&mut items, vec![result("Deli"), result("Denny's")], 8);
    let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["Deli", "Denny's"]);
    assert_eq!(items[1].subtitle.as_deref(), Some("1 Main St"));
    assert!(items[1].coordinates.is_some());
  }

  #[test]
  fn short_partial_does_not_search() {
    let mut state = SuggestionState::default();
    assert!(state.update("@a", &[], &[]).is_none());
    assert!(state.update("@ab", &[], &[]).is_some());
  }

  #[test]
  fn stale_generation_is_dropped() {
    let mut state = SuggestionState::default();
    let old = state.update("@de", &[], &[]).unwrap();
    let new = state.update("@del", &[], &[]).unwrap();
    assert!(!state.deliver(&old, vec![result("Denver")]));
    assert!(state.deliver(&new, vec![result("Deli")]));
    assert_eq!(state.items().len(), 1);
    assert_eq!(state.items()[0].name, "Deli");
  }

  #[test]
  fn results_after_confirmation_are_dropped() {
    let people = contacts(&["Dana"]);
    let mut state = SuggestionState::default();
    let ticket = state.update("@da", &people, &[]).unwrap();
    let chosen = state.items()[0].clone();
    state.confirm(&chosen);

    assert!(!state.deliver(&ticket, vec![result("Dallas")]));
    assert!(state.items().is_empty());
    assert!(state.is_confirmed());
  }

  #[test]
  fn new_token_clears_confirmation() {
    let mut state = SuggestionState::default();
    state.update("@da", &contacts(&["Dana"]), &[]);
    state.confirm(&SuggestionItem::person("Dana"));
    state.update("@Dana ", &[], &[]);
    assert!(!state.is_confirmed());
    assert!(state.update("@Dana and @bo", &[], &[]).is_some());
  }

  #[test]
  fn same_spelling_at_another_marker_is_a_new_token() {
    let people = contacts(&["Dana"]);
    let mut state = SuggestionState::default();
    state.update("@da", &people, &[]);
    state.confirm(&SuggestionItem::person("Dana"));
    assert!(state.update("@da", &people, &[]).is_none());

    let ticket = state.update("@da and @da", &people, &[]);
    assert!(ticket.is_some());
    assert!(!state.is_confirmed());
    assert_eq!(state.items().len(), 1);
  }
}
