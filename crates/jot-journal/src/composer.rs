//! [`Composer`] — live suggestions for the mention being typed.
//!
//! Known-source suggestions are computed synchronously on every keystroke.
//! Live place search runs as a tokio task per keystroke; its results are
//! merged only if they still belong to the current input and no suggestion
//! was confirmed in the meantime. In-flight searches are never aborted, their
//! late results are simply dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jot_core::{
  entity::Place,
  store::PlaceSearch,
  suggest::{SearchTicket, SuggestionItem, SuggestionState},
};
use tokio::{sync::watch, task::JoinHandle};

use crate::JournalConfig;

pub struct Composer<P: PlaceSearch + 'static> {
  search:      Arc<P>,
  state:       Arc<Mutex<SuggestionState>>,
  items:       Arc<watch::Sender<Vec<SuggestionItem>>>,
  max_results: usize,
  in_flight:   Vec<JoinHandle<()>>,
}

impl<P: PlaceSearch + 'static> Composer<P> {
  pub fn new(search: Arc<P>, config: &JournalConfig) -> Self {
    let (items, _) = watch::channel(Vec::new());
    Self {
      search,
      state: Arc::new(Mutex::new(SuggestionState::new(
        config.suggestion_limit,
        config.live_search_min_len,
      ))),
      items: Arc::new(items),
      max_results: config.max_live_results,
      in_flight: Vec::new(),
    }
  }

  /// Receive the suggestion list every time it changes.
  pub fn subscribe(&self) -> watch::Receiver<Vec<SuggestionItem>> {
    self.items.subscribe()
  }

  /// The current suggestion list.
  pub fn items(&self) -> Vec<SuggestionItem> { self.items.borrow().clone() }

  /// React to new input text. Must be called from within a tokio runtime.
  pub fn update(
    &mut self,
    input: &str,
    contacts: &[String],
    places: &[Place],
  ) {
    self.in_flight.retain(|h| !h.is_finished());

    let ticket = {
      let mut state = lock(&self.state);
      let ticket = state.update(input, contacts, places);
      self.items.send_replace(state.items().to_vec());
      ticket
    };

    if let Some(ticket) = ticket {
      let handle = self.spawn_search(ticket);
      self.in_flight.push(handle);
    }
  }

  /// Confirm `item` for the token being typed. Searches still in flight for
  /// it will not alter the list.
  pub fn confirm(&mut self, item: &SuggestionItem) -> SuggestionItem {
    let mut state = lock(&self.state);
    let confirmed = state.confirm(item);
    self.items.send_replace(Vec::new());
    tracing::debug!(
      name = %confirmed.name,
      kind = %confirmed.kind,
      "suggestion confirmed"
    );
    confirmed
  }

  /// Wait for every live search issued so far to finish.
  pub async fn settle(&mut self) {
    for handle in self.in_flight.drain(..) {
      if let Err(e) = handle.await {
        tracing::warn!(error = %e, "place search task failed");
      }
    }
  }

  fn spawn_search(&self, ticket: SearchTicket) -> JoinHandle<()> {
    let search = Arc::clone(&self.search);
    let state = Arc::clone(&self.state);
    let items = Arc::clone(&self.items);
    let max_results = self.max_results;

    tokio::spawn(async move {
      let mut results = match search.search(&ticket.query).await {
        Ok(results) => results,
        Err(e) => {
          tracing::warn!(
            query = %ticket.query,
            error = %e,
            "place search failed"
          );
          Vec::new()
        }
      };
      results.truncate(max_results);

      let mut state = lock(&state);
      if state.deliver(&ticket, results) {
        items.send_replace(state.items().to_vec());
      }
    })
  }
}

fn lock(state: &Mutex<SuggestionState>) -> MutexGuard<'_, SuggestionState> {
  state.lock().unwrap_or_else(PoisonError::into_inner)
}
