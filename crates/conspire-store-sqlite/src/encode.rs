//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that text comparison orders them correctly.
//! Graphs are stored as compact JSON. UUIDs are stored as hyphenated
//! lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use conspire_core::{
  asset::{Asset, AssetId},
  conspiracy::Conspiracy,
  graph::GraphData,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── GraphData ────────────────────────────────────────────────────────────────

pub fn encode_graph(data: &GraphData) -> Result<String> { Ok(serde_json::to_string(data)?) }

pub fn decode_graph(s: &str) -> Result<GraphData> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read from, or about to be written to, a `conspiracies` row.
#[derive(Debug, Clone)]
pub struct RawConspiracy {
  pub id:            String,
  pub name:          String,
  pub created:       String,
  pub last_modified: String,
}

impl RawConspiracy {
  pub fn from_conspiracy(c: &Conspiracy) -> Self {
    Self {
      id:            encode_uuid(c.id),
      name:          c.name.clone(),
      created:       encode_dt(c.created),
      last_modified: encode_dt(c.last_modified),
    }
  }

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      name:          row.get(1)?,
      created:       row.get(2)?,
      last_modified: row.get(3)?,
    })
  }

  pub fn into_conspiracy(self) -> Result<Conspiracy> {
    Ok(Conspiracy {
      id:            decode_uuid(&self.id)?,
      name:          self.name,
      created:       decode_dt(&self.created)?,
      last_modified: decode_dt(&self.last_modified)?,
    })
  }
}

/// Raw values read from an `assets` row.
pub struct RawAsset {
  pub rowid:     i64,
  pub id:        String,
  pub name:      Option<String>,
  pub mime_type: String,
  pub data:      Vec<u8>,
}

impl RawAsset {
  /// Expects columns `rowid, id, name, type, data`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      rowid:     row.get(0)?,
      id:        row.get(1)?,
      name:      row.get(2)?,
      mime_type: row.get(3)?,
      data:      row.get(4)?,
    })
  }

  pub fn into_asset(self) -> Result<Asset> {
    Ok(Asset {
      id:        AssetId::parse(&self.id)?,
      name:      self.name,
      mime_type: self.mime_type,
      data:      self.data,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn encoded_timestamps_sort_as_text() {
    let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 9, 59, 59).unwrap();
    let later = earlier + chrono::Duration::microseconds(1);
    let (a, b) = (encode_dt(earlier), encode_dt(later));
    assert_eq!(a.len(), b.len());
    assert!(a < b);
  }

  #[test]
  fn timestamp_roundtrip_keeps_micros() {
    let now = Utc::now();
    let back = decode_dt(&encode_dt(now)).unwrap();
    assert_eq!(back.timestamp_micros(), now.timestamp_micros());
  }
}
