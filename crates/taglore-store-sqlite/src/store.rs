//! [`SqliteStore`] — the SQLite implementation of [`TagStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OpenFlags, OptionalExtension as _};
use uuid::Uuid;

use taglore_core::{
  association::{Association, Polarity},
  event::{Event, NewEvent},
  reinforce::{self, LearningOp, LearningOutcome},
  store::{AssociationQuery, AssociationSort, EventQuery, TagStore},
};

use crate::{
  Error, Result,
  encode::{
    RawAssociation, RawEvent, encode_action, encode_decision, encode_dt,
    encode_source, encode_uuid, polarity_table,
  },
  schema::SCHEMA,
};

const EVENT_COLUMNS: &str =
  "event_id, action, document_id, rationale, decision_json, \
   time_to_decision_ms, created_at";

const ASSOCIATION_COLUMNS: &str =
  "association_id, keyword, taxonomy_code, strength, occurrence_count, \
   source, created_at, last_validated_at";

fn raw_event_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEvent> {
  Ok(RawEvent {
    event_id:            row.get(0)?,
    action:              row.get(1)?,
    document_id:         row.get(2)?,
    rationale:           row.get(3)?,
    decision_json:       row.get(4)?,
    time_to_decision_ms: row.get(5)?,
    created_at:          row.get(6)?,
  })
}

fn raw_association_from_row(
  row: &rusqlite::Row<'_>,
) -> rusqlite::Result<RawAssociation> {
  Ok(RawAssociation {
    association_id:    row.get(0)?,
    keyword:           row.get(1)?,
    taxonomy_code:     row.get(2)?,
    strength:          row.get(3)?,
    occurrence_count:  row.get(4)?,
    source:            row.get(5)?,
    created_at:        row.get(6)?,
    last_validated_at: row.get(7)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A taglore store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connections are reference-counted. Writes and
/// ordinary reads funnel through `conn`; its single connection thread is the
/// serialisation point for concurrent reinforcement of the same (keyword,
/// code) pair. Bias reads go through `reader`, a read-only connection with
/// its own thread, so a suggestion-time lookup never waits for a learning
/// transaction to commit (WAL lets the two proceed independently).
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  reader: tokio_rusqlite::Connection,
}

const READER_FLAGS: OpenFlags = OpenFlags::SQLITE_OPEN_READ_ONLY
  .union(OpenFlags::SQLITE_OPEN_URI)
  .union(OpenFlags::SQLITE_OPEN_NO_MUTEX);

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_owned();
    let conn = tokio_rusqlite::Connection::open(path.clone()).await?;
    init_schema(&conn).await?;
    // Opened after the schema run so the file is guaranteed to exist.
    let reader =
      tokio_rusqlite::Connection::open_with_flags(path, READER_FLAGS).await?;
    Ok(Self { conn, reader })
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    // A named shared-cache database, so the reader connection sees the same
    // data as the writer.
    let uri = format!(
      "file:taglore-{}?mode=memory&cache=shared",
      Uuid::new_v4().simple()
    );
    let conn = tokio_rusqlite::Connection::open(uri.clone()).await?;
    init_schema(&conn).await?;
    let reader =
      tokio_rusqlite::Connection::open_with_flags(uri, READER_FLAGS).await?;
    Ok(Self { conn, reader })
  }

  /// Fetch one polarity's rows for a keyword set, on the reader connection.
  async fn associations_for_keywords(
    &self,
    polarity: Polarity,
    keywords: Vec<String>,
  ) -> Result<Vec<Association>> {
    let table = polarity_table(polarity);
    let placeholders: Vec<String> =
      (1..=keywords.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
      "SELECT {ASSOCIATION_COLUMNS} FROM {table}
       WHERE keyword IN ({})",
      placeholders.join(", ")
    );

    let raws: Vec<RawAssociation> = self
      .reader
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params_from_iter(keywords.iter()),
            raw_association_from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawAssociation::into_association)
      .collect()
  }
}

async fn init_schema(conn: &tokio_rusqlite::Connection) -> Result<()> {
  conn
    .call(|conn| {
      conn.execute_batch(SCHEMA)?;
      Ok(())
    })
    .await?;
  Ok(())
}

// ─── TagStore impl ───────────────────────────────────────────────────────────

impl TagStore for SqliteStore {
  type Error = Error;

  // ── Event log — append-only writes ────────────────────────────────────────

  async fn record_event(&self, input: NewEvent) -> Result<Event> {
    input.validate()?;

    let event = Event {
      event_id:            Uuid::new_v4(),
      action:              input.action,
      document_id:         input.document_id,
      rationale:           input.rationale,
      decision:            input.decision,
      time_to_decision_ms: input.time_to_decision_ms,
      created_at:          Utc::now(),
    };

    let event_id_str  = encode_uuid(event.event_id);
    let action_str    = encode_action(event.action).to_owned();
    let document_id   = event.document_id.clone();
    let rationale     = event.rationale.clone();
    let decision_str  = encode_decision(&event.decision)?;
    let latency       = event.time_to_decision_ms;
    let created_str   = encode_dt(event.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO events (
             event_id, action, document_id, rationale,
             decision_json, time_to_decision_ms, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            event_id_str,
            action_str,
            document_id,
            rationale,
            decision_str,
            latency,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(event)
  }

  async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
    let id_str = encode_uuid(id);
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?1");

    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], raw_event_from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>> {
    let action_str = query.action.map(encode_action).map(str::to_owned);
    let since_str  = query.since.map(encode_dt);
    let until_str  = query.until.map(encode_dt);
    let limit_val  = query.limit.unwrap_or(100) as i64;

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&'static str> = vec![];
        if action_str.is_some() {
          conds.push("action = ?1");
        }
        if since_str.is_some() {
          conds.push("created_at >= ?2");
        }
        if until_str.is_some() {
          conds.push("created_at <= ?3");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        // ?4 (the limit) is always present, so the bind count is stable
        // regardless of which filters apply.
        let sql = format!(
          "SELECT {EVENT_COLUMNS} FROM events
           {where_clause}
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?4"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              action_str.as_deref(),
              since_str.as_deref(),
              until_str.as_deref(),
              limit_val,
            ],
            raw_event_from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn events_between(
    &self,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  ) -> Result<Vec<Event>> {
    let start_str = encode_dt(start);
    let end_str   = encode_dt(end);
    let sql = format!(
      "SELECT {EVENT_COLUMNS} FROM events
       WHERE created_at >= ?1 AND created_at <= ?2
       ORDER BY created_at ASC, rowid ASC"
    );

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![start_str, end_str], raw_event_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  // ── Reinforcement ─────────────────────────────────────────────────────────

  async fn learn_from(&self, event_id: Uuid) -> Result<LearningOutcome> {
    let event = self
      .get_event(event_id)
      .await?
      .ok_or(Error::EventNotFound(event_id))?;

    let ops = reinforce::learning_plan(&event);
    let op_count = ops.len();

    let id_str  = encode_uuid(event_id);
    let now_str = encode_dt(Utc::now());

    // The ledger check, the upserts, and the ledger insert commit together;
    // a replayed event id sees the ledger row and touches nothing.
    let already_applied: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let applied: bool = tx
          .query_row(
            "SELECT 1 FROM learned_events WHERE event_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if applied {
          return Ok(true);
        }

        for op in &ops {
          apply_op(&tx, op, &now_str)?;
        }

        tx.execute(
          "INSERT INTO learned_events (event_id, applied_at, op_count)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, now_str, op_count as i64],
        )?;

        tx.commit()?;
        Ok(false)
      })
      .await?;

    if already_applied {
      Ok(LearningOutcome::AlreadyApplied)
    } else if op_count == 0 {
      Ok(LearningOutcome::NothingToLearn)
    } else {
      Ok(LearningOutcome::Applied { ops: op_count })
    }
  }

  // ── Associations ──────────────────────────────────────────────────────────

  async fn list_associations(
    &self,
    polarity: Polarity,
    query: &AssociationQuery,
  ) -> Result<Vec<Association>> {
    let table = polarity_table(polarity);
    let keyword_pattern = query.keyword.as_deref().map(|k| format!("%{k}%"));
    let code_pattern    = query.code.as_deref().map(|c| format!("%{c}%"));
    let order = match query.sort {
      AssociationSort::Strength => "strength DESC",
      AssociationSort::Occurrence => "occurrence_count DESC",
    };
    let limit_val = query.limit.unwrap_or(100) as i64;

    let raws: Vec<RawAssociation> = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&'static str> = vec![];
        if keyword_pattern.is_some() {
          conds.push("keyword LIKE ?1");
        }
        if code_pattern.is_some() {
          conds.push("taxonomy_code LIKE ?2");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {ASSOCIATION_COLUMNS} FROM {table}
           {where_clause}
           ORDER BY {order}, keyword ASC, taxonomy_code ASC
           LIMIT ?3"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              keyword_pattern.as_deref(),
              code_pattern.as_deref(),
              limit_val,
            ],
            raw_association_from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawAssociation::into_association)
      .collect()
  }

  async fn get_association(
    &self,
    polarity: Polarity,
    keyword: &str,
    taxonomy_code: &str,
  ) -> Result<Option<Association>> {
    let table = polarity_table(polarity);
    let sql = format!(
      "SELECT {ASSOCIATION_COLUMNS} FROM {table}
       WHERE keyword = ?1 AND taxonomy_code = ?2"
    );
    let keyword = keyword.to_owned();
    let code    = taxonomy_code.to_owned();

    let raw: Option<RawAssociation> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &sql,
              rusqlite::params![keyword, code],
              raw_association_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAssociation::into_association).transpose()
  }

  async fn delete_association(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted: bool = self
      .conn
      .call(move |conn| {
        let from_correlations = conn.execute(
          "DELETE FROM correlations WHERE association_id = ?1",
          rusqlite::params![id_str],
        )?;
        let from_restrictions = conn.execute(
          "DELETE FROM restrictions WHERE association_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(from_correlations + from_restrictions > 0)
      })
      .await?;

    Ok(deleted)
  }

  async fn bias_rows(
    &self,
    keywords: &[String],
  ) -> Result<(Vec<Association>, Vec<Association>)> {
    if keywords.is_empty() {
      return Ok((Vec::new(), Vec::new()));
    }

    let correlations = self
      .associations_for_keywords(Polarity::Correlate, keywords.to_vec())
      .await?;
    let restrictions = self
      .associations_for_keywords(Polarity::Restrict, keywords.to_vec())
      .await?;

    Ok((correlations, restrictions))
  }
}

// ─── Plan application ────────────────────────────────────────────────────────

/// Apply one learning op inside the caller's transaction.
fn apply_op(
  tx: &rusqlite::Transaction<'_>,
  op: &LearningOp,
  now_str: &str,
) -> rusqlite::Result<()> {
  match op {
    LearningOp::Reinforce { polarity, keyword, taxonomy_code, source } => {
      let table = polarity_table(*polarity);
      let existing: Option<(String, f64, i64)> = tx
        .query_row(
          &format!(
            "SELECT association_id, strength, occurrence_count
             FROM {table} WHERE keyword = ?1 AND taxonomy_code = ?2"
          ),
          rusqlite::params![keyword, taxonomy_code],
          |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

      match existing {
        Some((id, strength, occurrences)) => {
          tx.execute(
            &format!(
              "UPDATE {table}
               SET strength = ?1, occurrence_count = ?2, last_validated_at = ?3
               WHERE association_id = ?4"
            ),
            rusqlite::params![
              reinforce::reinforce(strength),
              occurrences + 1,
              now_str,
              id,
            ],
          )?;
        }
        None => {
          tx.execute(
            &format!(
              "INSERT INTO {table} (
                 association_id, keyword, taxonomy_code, strength,
                 occurrence_count, source, created_at, last_validated_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ),
            rusqlite::params![
              Uuid::new_v4().hyphenated().to_string(),
              keyword,
              taxonomy_code,
              reinforce::INITIAL_STRENGTH,
              1i64,
              encode_source(*source),
              now_str,
              now_str,
            ],
          )?;
        }
      }
    }

    LearningOp::Decay { polarity, keyword, taxonomy_code } => {
      let table = polarity_table(*polarity);
      let existing: Option<(String, f64)> = tx
        .query_row(
          &format!(
            "SELECT association_id, strength
             FROM {table} WHERE keyword = ?1 AND taxonomy_code = ?2"
          ),
          rusqlite::params![keyword, taxonomy_code],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

      // Decaying a pair never seen is a no-op, not an error.
      if let Some((id, strength)) = existing {
        tx.execute(
          &format!(
            "UPDATE {table}
             SET strength = ?1, last_validated_at = ?2
             WHERE association_id = ?3"
          ),
          rusqlite::params![reinforce::decay(strength), now_str, id],
        )?;
      }
    }
  }

  Ok(())
}
