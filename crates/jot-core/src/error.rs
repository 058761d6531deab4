//! Error types for `jot-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(
    "mention range {start}+{len} is not a valid span of a {text_len}-byte \
     message"
  )]
  InvalidRange {
    start:    usize,
    len:      usize,
    text_len: usize,
  },

  #[error("no active session")]
  NotAuthenticated,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
