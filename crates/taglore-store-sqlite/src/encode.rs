//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. The decision payload is
//! stored as its tagged JSON form. UUIDs are stored as hyphenated lowercase
//! strings.

use chrono::{DateTime, Utc};
use taglore_core::{
  association::{Association, AssociationSource, Polarity},
  event::{ActionType, Decision, Event},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── ActionType ──────────────────────────────────────────────────────────────

pub fn encode_action(a: ActionType) -> &'static str { a.discriminant() }

pub fn decode_action(s: &str) -> Result<ActionType> {
  Ok(ActionType::parse(s)?)
}

// ─── Decision ────────────────────────────────────────────────────────────────

pub fn encode_decision(d: &Decision) -> Result<String> {
  Ok(serde_json::to_string(d)?)
}

pub fn decode_decision(s: &str) -> Result<Decision> {
  Ok(serde_json::from_str(s)?)
}

// ─── AssociationSource ───────────────────────────────────────────────────────

pub fn encode_source(s: AssociationSource) -> &'static str {
  match s {
    AssociationSource::Feedback => "feedback",
    AssociationSource::Correction => "correction",
    AssociationSource::Manual => "manual",
  }
}

pub fn decode_source(s: &str) -> Result<AssociationSource> {
  match s {
    "feedback" => Ok(AssociationSource::Feedback),
    "correction" => Ok(AssociationSource::Correction),
    "manual" => Ok(AssociationSource::Manual),
    other => Err(Error::Decode(format!("unknown source: {other:?}"))),
  }
}

// ─── Polarity ────────────────────────────────────────────────────────────────

/// The table an association polarity maps to. Only ever interpolated into
/// SQL as one of these two constants.
pub fn polarity_table(p: Polarity) -> &'static str {
  match p {
    Polarity::Correlate => "correlations",
    Polarity::Restrict => "restrictions",
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `events` row.
pub struct RawEvent {
  pub event_id:            String,
  pub action:              String,
  pub document_id:         Option<String>,
  pub rationale:           Option<String>,
  pub decision_json:       String,
  pub time_to_decision_ms: Option<i64>,
  pub created_at:          String,
}

impl RawEvent {
  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:            decode_uuid(&self.event_id)?,
      action:              decode_action(&self.action)?,
      document_id:         self.document_id,
      rationale:           self.rationale,
      decision:            decode_decision(&self.decision_json)?,
      time_to_decision_ms: self.time_to_decision_ms,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `correlations` or `restrictions` row.
pub struct RawAssociation {
  pub association_id:    String,
  pub keyword:           String,
  pub taxonomy_code:     String,
  pub strength:          f64,
  pub occurrence_count:  i64,
  pub source:            String,
  pub created_at:        String,
  pub last_validated_at: String,
}

impl RawAssociation {
  pub fn into_association(self) -> Result<Association> {
    Ok(Association {
      association_id:    decode_uuid(&self.association_id)?,
      keyword:           self.keyword,
      taxonomy_code:     self.taxonomy_code,
      strength:          self.strength,
      occurrence_count:  self.occurrence_count,
      source:            decode_source(&self.source)?,
      created_at:        decode_dt(&self.created_at)?,
      last_validated_at: decode_dt(&self.last_validated_at)?,
    })
  }
}
