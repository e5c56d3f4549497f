//! Conspiracy: the top-level unit of persistence, one per board.

use chrono::{DateTime, SubsecRound as _, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name given to boards created without user input.
pub const DEFAULT_NAME: &str = "new conspiracy";

/// The current time at the precision storage keeps (microseconds).
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

/// Metadata for a single board.
///
/// `id` is the join key to the board's graph snapshot. `last_modified` is
/// stamped by the store on every save; callers never set it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conspiracy {
  pub id:            Uuid,
  pub name:          String,
  pub created:       DateTime<Utc>,
  pub last_modified: DateTime<Utc>,
}

impl Conspiracy {
  /// A fresh board with a random id and `created == last_modified == now`.
  pub fn new(name: impl Into<String>) -> Self {
    let at = now();
    Self {
      id:            Uuid::new_v4(),
      name:          name.into(),
      created:       at,
      last_modified: at,
    }
  }
}

impl Default for Conspiracy {
  fn default() -> Self { Self::new(DEFAULT_NAME) }
}
