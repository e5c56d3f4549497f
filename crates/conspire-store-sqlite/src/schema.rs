//! SQL schema for the SQLite board store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema version; future migrations will be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
///
/// Rows are only ever overwritten with `INSERT ... ON CONFLICT DO UPDATE`,
/// never `INSERT OR REPLACE`, so a row keeps its `rowid` and the registry
/// keeps its insertion order.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS conspiracies (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    created       TEXT NOT NULL,   -- fixed-width RFC 3339 UTC
    last_modified TEXT NOT NULL    -- fixed-width RFC 3339 UTC; sorts as text
);

-- One snapshot per conspiracy, replaced wholesale on every save.
CREATE TABLE IF NOT EXISTS graphs (
    id   TEXT PRIMARY KEY REFERENCES conspiracies(id),
    data TEXT NOT NULL             -- JSON {nodes, edges, combos}
);

-- Content-addressed; id is the hex SHA-256 of data.
CREATE TABLE IF NOT EXISTS assets (
    id   TEXT PRIMARY KEY,
    name TEXT,
    type TEXT NOT NULL,
    data BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS conspiracies_name_idx ON conspiracies(name);
CREATE INDEX IF NOT EXISTS assets_name_idx       ON assets(name);

PRAGMA user_version = 1;
";
