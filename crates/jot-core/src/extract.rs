//! Mention extraction: raw text → candidate spans.
//!
//! A candidate starts at the marker and greedily consumes letters, digits,
//! whitespace and hyphens. The marker itself is outside that class, so a
//! second marker closes the open span and starts a new one. Extraction is
//! total: every input yields a (possibly empty) list.

use std::ops::Range;

use serde::Serialize;

use crate::{MARKER, message::SourceRange};

/// Candidates with more words than this are assumed to run on into the
/// message body.
const MAX_WORDS: usize = 3;

/// How many words an over-long candidate is cut back to.
const TRUNCATED_WORDS: usize = 2;

/// A candidate mention located in its source text.
///
/// Byte offsets always refer to the text passed to [`extract`], even though
/// the cleaned name may be shorter than the raw match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawSpan {
  /// Offset of the marker.
  pub marker: usize,
  /// The full greedy match, marker included, before cleanup.
  pub raw:    SourceRange,
  /// The words kept after cleanup, in order.
  pub words:  Vec<Range<usize>>,
  name:       String,
}

impl RawSpan {
  /// The cleaned name, words joined by single spaces.
  pub fn name(&self) -> &str { &self.name }

  /// The cleaned candidate including the marker.
  pub fn text(&self) -> String { format!("{MARKER}{}", self.name) }

  /// From the marker to the end of the last kept word.
  pub fn range(&self) -> SourceRange {
    let end = self.words.last().map_or(self.marker + 1, |w| w.end);
    SourceRange::from(self.marker..end)
  }

  /// Word prefixes of the candidate, longest first, each with the source
  /// range it covers.
  pub fn prefixes<'a>(
    &'a self,
    source: &'a str,
  ) -> impl Iterator<Item = (String, SourceRange)> + 'a {
    (1..=self.words.len()).rev().map(move |n| {
      let name = self.words[..n]
        .iter()
        .map(|w| &source[w.clone()])
        .collect::<Vec<_>>()
        .join(" ");
      (name, SourceRange::from(self.marker..self.words[n - 1].end))
    })
  }
}

fn is_name_char(c: char) -> bool {
  c.is_alphanumeric() || c.is_whitespace() || c == '-'
}

/// Byte ranges of the whitespace-separated words in `text[start..end]`.
fn word_ranges(text: &str, start: usize, end: usize) -> Vec<Range<usize>> {
  let mut words = Vec::new();
  let mut open: Option<usize> = None;
  for (i, c) in text[start..end].char_indices() {
    let at = start + i;
    match (c.is_whitespace(), open) {
      (true, Some(from)) => {
        words.push(from..at);
        open = None;
      }
      (false, None) => open = Some(at),
      _ => {}
    }
  }
  if let Some(from) = open {
    words.push(from..end);
  }
  words
}

/// Scan `text` for mention candidates.
pub fn extract(text: &str) -> Vec<RawSpan> {
  let mut spans = Vec::new();
  let mut chars = text.char_indices().peekable();

  while let Some((at, c)) = chars.next() {
    if c != MARKER {
      continue;
    }
    let body_start = at + c.len_utf8();
    let mut end = body_start;
    while let Some(&(i, d)) = chars.peek() {
      if !is_name_char(d) {
        break;
      }
      end = i + d.len_utf8();
      chars.next();
    }

    let mut words = word_ranges(text, body_start, end);
    if words.len() > MAX_WORDS {
      words.truncate(TRUNCATED_WORDS);
    }
    if words.is_empty() {
      continue;
    }

    let name = words
      .iter()
      .map(|w| &text[w.clone()])
      .collect::<Vec<_>>()
      .join(" ");
    spans.push(RawSpan {
      marker: at,
      raw: SourceRange::from(at..end),
      words,
      name,
    });
  }

  tracing::trace!(candidates = spans.len(), "extracted mention candidates");
  spans
}
