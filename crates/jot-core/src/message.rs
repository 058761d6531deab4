//! Messages and the mentions attached to them.
//!
//! A message is immutable once created; the only lifecycle event is deletion.
//! The message log is the single source of truth from which the People and
//! Places registries are derived.

use std::ops::Range;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, MARKER, Result,
  entity::{Coordinates, name_key},
};

// ─── MentionType ─────────────────────────────────────────────────────────────

/// The registry a mention resolves into.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MentionType {
  Person,
  Place,
}

// ─── SourceRange ─────────────────────────────────────────────────────────────

/// A byte span into the owning message's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
  pub start: usize,
  pub len:   usize,
}

impl SourceRange {
  pub fn new(start: usize, len: usize) -> Self { Self { start, len } }

  /// One past the last byte, or `None` if the range overflows `usize`.
  pub fn end(&self) -> Option<usize> { self.start.checked_add(self.len) }

  pub fn as_range(&self) -> Option<Range<usize>> {
    self.end().map(|end| self.start..end)
  }

  /// The slice of `text` covered by this range, if it lies on char
  /// boundaries inside `text`.
  pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
    text.get(self.as_range()?)
  }
}

impl From<Range<usize>> for SourceRange {
  fn from(r: Range<usize>) -> Self {
    Self::new(r.start, r.end.saturating_sub(r.start))
  }
}

// ─── Mention ─────────────────────────────────────────────────────────────────

/// A classified `@name` occurrence inside a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
  /// The mention as written, including the leading marker.
  pub text:        String,
  #[serde(rename = "type")]
  pub kind:        MentionType,
  pub range:       SourceRange,
  /// Coordinates of the place-search result the mention was confirmed from.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub coordinates: Option<Coordinates>,
}

impl Mention {
  pub fn new(name: &str, kind: MentionType, range: SourceRange) -> Self {
    Self {
      text: format!("{MARKER}{name}"),
      kind,
      range,
      coordinates: None,
    }
  }

  pub fn with_coordinates(mut self, coordinates: Option<Coordinates>) -> Self {
    self.coordinates = coordinates;
    self
  }

  /// The mention text with every marker removed.
  pub fn name(&self) -> String { self.text.replace(MARKER, "") }

  /// True if this mention refers to the entity `name` in registry `kind`.
  pub fn refers_to(&self, kind: MentionType, name: &str) -> bool {
    self.kind == kind && name_key(&self.name()) == name_key(name)
  }
}

// ─── Message ─────────────────────────────────────────────────────────────────

/// A journal entry and the mentions confirmed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
  pub id:        Uuid,
  pub text:      String,
  pub timestamp: DateTime<Utc>,
  pub mentions:  Vec<Mention>,
}

impl Message {
  /// Create a message stamped with the current time.
  pub fn new(text: impl Into<String>, mentions: Vec<Mention>) -> Result<Self> {
    Self::from_parts(Uuid::new_v4(), text, Utc::now(), mentions)
  }

  /// Rebuild a message from stored parts, validating every mention range.
  pub fn from_parts(
    id: Uuid,
    text: impl Into<String>,
    timestamp: DateTime<Utc>,
    mentions: Vec<Mention>,
  ) -> Result<Self> {
    let text = text.into();
    for m in &mentions {
      if m.range.len == 0 || m.range.slice(&text).is_none() {
        return Err(Error::InvalidRange {
          start:    m.range.start,
          len:      m.range.len,
          text_len: text.len(),
        });
      }
    }
    Ok(Self {
      id,
      text,
      timestamp,
      mentions,
    })
  }

  /// True if the message mentions the entity at least once.
  pub fn mentions_entity(&self, kind: MentionType, name: &str) -> bool {
    self.mentions.iter().any(|m| m.refers_to(kind, name))
  }

  /// True if the message has mentions and every one refers to the entity.
  pub fn mentions_only(&self, kind: MentionType, name: &str) -> bool {
    !self.mentions.is_empty()
      && self.mentions.iter().all(|m| m.refers_to(kind, name))
  }
}
