//! SQL schema for the taglore SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Admin tagging decisions are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
-- Ordering is created_at with rowid as the insertion tie-break.
CREATE TABLE IF NOT EXISTS events (
    event_id            TEXT PRIMARY KEY,
    action              TEXT NOT NULL,   -- discriminant of ActionType
    document_id         TEXT,
    rationale           TEXT,
    decision_json       TEXT NOT NULL,   -- tagged JSON Decision payload
    time_to_decision_ms INTEGER,
    created_at          TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

-- Ledger of events already consumed by the reinforcement engine.
-- Inserted in the same transaction as the plan it guards, so replaying an
-- event id can never double-count.
CREATE TABLE IF NOT EXISTS learned_events (
    event_id   TEXT PRIMARY KEY REFERENCES events(event_id),
    applied_at TEXT NOT NULL,
    op_count   INTEGER NOT NULL
);

-- Positive keyword <-> code associations.
CREATE TABLE IF NOT EXISTS correlations (
    association_id    TEXT PRIMARY KEY,
    keyword           TEXT NOT NULL,
    taxonomy_code     TEXT NOT NULL,
    strength          REAL NOT NULL,
    occurrence_count  INTEGER NOT NULL,
    source            TEXT NOT NULL,   -- 'feedback' | 'correction' | 'manual'
    created_at        TEXT NOT NULL,
    last_validated_at TEXT NOT NULL,
    UNIQUE (keyword, taxonomy_code)
);

-- Negative mirror of correlations; same shape, opposite meaning.
CREATE TABLE IF NOT EXISTS restrictions (
    association_id    TEXT PRIMARY KEY,
    keyword           TEXT NOT NULL,
    taxonomy_code     TEXT NOT NULL,
    strength          REAL NOT NULL,
    occurrence_count  INTEGER NOT NULL,
    source            TEXT NOT NULL,
    created_at        TEXT NOT NULL,
    last_validated_at TEXT NOT NULL,
    UNIQUE (keyword, taxonomy_code)
);

CREATE INDEX IF NOT EXISTS events_created_idx       ON events(created_at);
CREATE INDEX IF NOT EXISTS events_action_idx        ON events(action);
CREATE INDEX IF NOT EXISTS correlations_keyword_idx ON correlations(keyword);
CREATE INDEX IF NOT EXISTS restrictions_keyword_idx ON restrictions(keyword);

PRAGMA user_version = 1;
";
