//! The active-board context.
//!
//! A [`Session`] names the board every dependent operation works on. It is
//! resolved once, before any board-scoped store access, and then passed
//! explicitly to whatever needs it.

use uuid::Uuid;

use crate::conspiracy::Conspiracy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
  pub conspiracy_id: Uuid,
}

impl Session {
  pub fn new(conspiracy_id: Uuid) -> Self { Self { conspiracy_id } }

  /// The query string that addresses this session's board: `?<id>`.
  pub fn query(&self) -> String { format!("?{}", self.conspiracy_id) }
}

impl From<&Conspiracy> for Session {
  fn from(c: &Conspiracy) -> Self { Self::new(c.id) }
}

/// The first key of a URL query string, with or without the leading `?`.
///
/// The board id travels as a bare key (`?<uuid>`), so `?abc&x=1` yields
/// `abc` and `?k=v` yields `k`.
pub fn first_query_key(query: &str) -> Option<&str> {
  let query = query.strip_prefix('?').unwrap_or(query);
  let first = query.split('&').next()?;
  let key = first.split('=').next()?;
  (!key.is_empty()).then_some(key)
}

/// Parse the board id out of a query string, if the first key is a UUID.
pub fn requested_board(query: &str) -> Option<Uuid> {
  first_query_key(query).and_then(|k| Uuid::parse_str(k).ok())
}
