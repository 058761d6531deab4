//! Tunables for the journal and the suggestion composer.

use jot_core::suggest::{DEFAULT_LIMIT, LIVE_SEARCH_MIN_LEN};
use serde::{Deserialize, Serialize};

/// Runtime journal configuration; every field has a default so a partial
/// `[journal]` table is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
  /// Cap on the suggestion list.
  pub suggestion_limit:    usize,
  /// Shortest partial that triggers a live place search.
  pub live_search_min_len: usize,
  /// Live search results considered per request.
  pub max_live_results:    usize,
}

impl Default for JournalConfig {
  fn default() -> Self {
    Self {
      suggestion_limit:    DEFAULT_LIMIT,
      live_search_min_len: LIVE_SEARCH_MIN_LEN,
      max_live_results:    10,
    }
  }
}
