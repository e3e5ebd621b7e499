//! Integration tests for `SqliteStore` against an in-memory database.

use taglore_core::{
  association::Polarity,
  bias::resolve_bias,
  event::{ActionType, AutoSuggestionStatus, Decision, MergeReason, NewEvent},
  reinforce::{INITIAL_STRENGTH, LearningOutcome, reinforce},
  scorecard::{ScorecardWindow, compute_scorecard},
  store::{AssociationQuery, AssociationSort, EventQuery, TagStore},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn adopt(code: &str, keywords: &[&str]) -> NewEvent {
  NewEvent::new(ActionType::AdoptOrphan, Decision::Adopt {
    taxonomy_code: code.into(),
    keywords:      keywords.iter().map(|k| k.to_string()).collect(),
  })
}

fn reject(code: &str, keywords: &[&str]) -> NewEvent {
  NewEvent::new(ActionType::DeleteOrphan, Decision::Reject {
    taxonomy_code: code.into(),
    keywords:      keywords.iter().map(|k| k.to_string()).collect(),
  })
}

// ─── Event recording ─────────────────────────────────────────────────────────

#[tokio::test]
async fn record_event_and_retrieve() {
  let s = store().await;

  let mut input = adopt("FIN", &["balanço"]);
  input.document_id = Some("doc-17".into());
  input.rationale = Some("clearly financial".into());
  input.time_to_decision_ms = Some(4_200);

  let event = s.record_event(input).await.unwrap();
  let fetched = s.get_event(event.event_id).await.unwrap().unwrap();

  assert_eq!(fetched.event_id, event.event_id);
  assert_eq!(fetched.action, ActionType::AdoptOrphan);
  assert_eq!(fetched.document_id.as_deref(), Some("doc-17"));
  assert_eq!(fetched.time_to_decision_ms, Some(4_200));
  assert_eq!(fetched.decision, event.decision);
}

#[tokio::test]
async fn get_event_missing_returns_none() {
  let s = store().await;
  assert!(s.get_event(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn mismatched_payload_not_persisted() {
  let s = store().await;

  let bad = NewEvent::new(
    ActionType::AdoptOrphan,
    Decision::ImportExport { concept_count: 1 },
  );
  let err = s.record_event(bad).await.unwrap_err();
  assert!(matches!(err, crate::Error::Core(_)));

  let all = s.list_events(&EventQuery::default()).await.unwrap();
  assert!(all.is_empty());
}

#[tokio::test]
async fn list_events_filters_by_action() {
  let s = store().await;
  s.record_event(adopt("FIN", &["a"])).await.unwrap();
  s.record_event(reject("GERAL", &["b"])).await.unwrap();
  s.record_event(adopt("RH", &["c"])).await.unwrap();

  let adopts = s
    .list_events(&EventQuery {
      action: Some(ActionType::AdoptOrphan),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(adopts.len(), 2);
  assert!(adopts.iter().all(|e| e.action == ActionType::AdoptOrphan));
}

// ─── Reinforcement ───────────────────────────────────────────────────────────

#[tokio::test]
async fn first_adoption_creates_provisional_correlation() {
  let s = store().await;

  let event = s.record_event(adopt("FIN", &["balanço"])).await.unwrap();
  let outcome = s.learn_from(event.event_id).await.unwrap();
  assert_eq!(outcome, LearningOutcome::Applied { ops: 1 });

  let row = s
    .get_association(Polarity::Correlate, "balanço", "FIN")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(row.strength, INITIAL_STRENGTH);
  assert_eq!(row.occurrence_count, 1);
}

#[tokio::test]
async fn two_adoptions_reinforce_each_keyword() {
  let s = store().await;

  for _ in 0..2 {
    let event = s
      .record_event(adopt("FIN", &["balanço", "contabilidade"]))
      .await
      .unwrap();
    s.learn_from(event.event_id).await.unwrap();
  }

  let expected = reinforce(INITIAL_STRENGTH);
  for keyword in ["balanço", "contabilidade"] {
    let row = s
      .get_association(Polarity::Correlate, keyword, "FIN")
      .await
      .unwrap()
      .unwrap();
    assert_eq!(row.occurrence_count, 2);
    assert!((row.strength - expected).abs() < 1e-12);
  }
}

#[tokio::test]
async fn delete_orphan_creates_restriction() {
  let s = store().await;

  let event = s.record_event(reject("GERAL", &["relatorio"])).await.unwrap();
  s.learn_from(event.event_id).await.unwrap();

  let row = s
    .get_association(Polarity::Restrict, "relatorio", "GERAL")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(row.strength, INITIAL_STRENGTH);
  assert_eq!(row.occurrence_count, 1);

  // No correlation was created for the pair.
  assert!(
    s.get_association(Polarity::Correlate, "relatorio", "GERAL")
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn replay_does_not_double_count() {
  let s = store().await;

  let event = s.record_event(adopt("FIN", &["balanço"])).await.unwrap();
  s.learn_from(event.event_id).await.unwrap();

  let replay = s.learn_from(event.event_id).await.unwrap();
  assert_eq!(replay, LearningOutcome::AlreadyApplied);

  let row = s
    .get_association(Polarity::Correlate, "balanço", "FIN")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(row.occurrence_count, 1);
  assert_eq!(row.strength, INITIAL_STRENGTH);
}

#[tokio::test]
async fn learn_from_unknown_event_errors() {
  let s = store().await;
  let err = s.learn_from(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, crate::Error::EventNotFound(_)));
}

#[tokio::test]
async fn empty_keywords_learn_nothing_but_event_persists() {
  let s = store().await;

  let event = s.record_event(adopt("FIN", &[])).await.unwrap();
  let outcome = s.learn_from(event.event_id).await.unwrap();
  assert_eq!(outcome, LearningOutcome::NothingToLearn);

  assert!(s.get_event(event.event_id).await.unwrap().is_some());
  let rows = s
    .list_associations(Polarity::Correlate, &AssociationQuery::default())
    .await
    .unwrap();
  assert!(rows.is_empty());
}

#[tokio::test]
async fn reassignment_decays_old_and_reinforces_new() {
  let s = store().await;

  // Establish a correlation for the wrong code first.
  let wrong = s.record_event(adopt("GERAL", &["balanço"])).await.unwrap();
  s.learn_from(wrong.event_id).await.unwrap();

  let fix = s
    .record_event(NewEvent::new(
      ActionType::ReassignOrphan,
      Decision::Reassign {
        from_code: "GERAL".into(),
        to_code:   "FIN".into(),
        keywords:  vec!["balanço".into()],
      },
    ))
    .await
    .unwrap();
  s.learn_from(fix.event_id).await.unwrap();

  let old = s
    .get_association(Polarity::Correlate, "balanço", "GERAL")
    .await
    .unwrap()
    .unwrap();
  assert!(old.strength < INITIAL_STRENGTH);
  // Decay is not an observation: count unchanged, row still present.
  assert_eq!(old.occurrence_count, 1);

  let new = s
    .get_association(Polarity::Correlate, "balanço", "FIN")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(new.strength, INITIAL_STRENGTH);
  assert_eq!(
    new.source,
    taglore_core::association::AssociationSource::Correction
  );
}

#[tokio::test]
async fn accepted_merge_reinforces_target() {
  let s = store().await;

  let merge = s
    .record_event(NewEvent::new(ActionType::MergeParent, Decision::Merge {
      target_code:     "FIN".into(),
      keywords:        vec!["contabilidade".into()],
      reasons:         vec![MergeReason::Synonymy],
      auto_suggestion: Some(AutoSuggestionStatus::Accepted),
    }))
    .await
    .unwrap();
  let outcome = s.learn_from(merge.event_id).await.unwrap();
  assert_eq!(outcome, LearningOutcome::Applied { ops: 1 });

  assert!(
    s.get_association(Polarity::Correlate, "contabilidade", "FIN")
      .await
      .unwrap()
      .is_some()
  );
}

// ─── Association listings ────────────────────────────────────────────────────

#[tokio::test]
async fn list_associations_filtered_and_sorted() {
  let s = store().await;

  // "balanço" reinforced twice, "caixa" once.
  for keywords in [&["balanço", "caixa"][..], &["balanço"][..]] {
    let event = s.record_event(adopt("FIN", keywords)).await.unwrap();
    s.learn_from(event.event_id).await.unwrap();
  }

  let by_strength = s
    .list_associations(Polarity::Correlate, &AssociationQuery::default())
    .await
    .unwrap();
  assert_eq!(by_strength.len(), 2);
  assert_eq!(by_strength[0].keyword, "balanço");

  let by_occurrence = s
    .list_associations(Polarity::Correlate, &AssociationQuery {
      sort: AssociationSort::Occurrence,
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(by_occurrence[0].occurrence_count, 2);

  let filtered = s
    .list_associations(Polarity::Correlate, &AssociationQuery {
      keyword: Some("caix".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(filtered.len(), 1);
  assert_eq!(filtered[0].keyword, "caixa");
}

#[tokio::test]
async fn delete_association_is_idempotent() {
  let s = store().await;

  let event = s.record_event(adopt("FIN", &["balanço"])).await.unwrap();
  s.learn_from(event.event_id).await.unwrap();

  let row = s
    .get_association(Polarity::Correlate, "balanço", "FIN")
    .await
    .unwrap()
    .unwrap();

  assert!(s.delete_association(row.association_id).await.unwrap());
  // Second delete: no row left, still success.
  assert!(!s.delete_association(row.association_id).await.unwrap());
  // Deleting an id that never existed is also success.
  assert!(!s.delete_association(Uuid::new_v4()).await.unwrap());
}

// ─── Bias reads ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn bias_reports_restriction_over_correlation() {
  let s = store().await;

  // Same pair lands in both stores: adopted once, later rejected.
  let adopt_ev = s.record_event(adopt("FIN", &["geral"])).await.unwrap();
  s.learn_from(adopt_ev.event_id).await.unwrap();
  let reject_ev = s
    .record_event(NewEvent::new(
      ActionType::RejectDuplicate,
      Decision::Reject {
        taxonomy_code: "FIN".into(),
        keywords:      vec!["geral".into()],
      },
    ))
    .await
    .unwrap();
  s.learn_from(reject_ev.event_id).await.unwrap();

  let keywords = vec!["geral".to_string(), "inexistente".to_string()];
  let (correlations, restrictions) = s.bias_rows(&keywords).await.unwrap();
  let map = resolve_bias(&keywords, &correlations, &restrictions);

  let geral = &map["geral"];
  assert!(geral.correlations.is_empty());
  assert_eq!(geral.restrictions.len(), 1);
  assert_eq!(geral.restrictions[0].taxonomy_code, "FIN");

  // Unknown keyword: present, empty, no error.
  assert!(map["inexistente"].correlations.is_empty());
  assert!(map["inexistente"].restrictions.is_empty());
}

#[tokio::test]
async fn bias_reader_connection_sees_committed_learning() {
  let s = store().await;

  let event = s.record_event(adopt("FIN", &["balanço"])).await.unwrap();
  s.learn_from(event.event_id).await.unwrap();

  // bias_rows runs on the dedicated read-only connection, not the write
  // connection; everything committed by learn_from must be visible there.
  let keywords = vec!["balanço".to_string()];
  let (correlations, restrictions) = s.bias_rows(&keywords).await.unwrap();
  assert_eq!(correlations.len(), 1);
  assert_eq!(correlations[0].taxonomy_code, "FIN");
  assert_eq!(correlations[0].strength, INITIAL_STRENGTH);
  assert!(restrictions.is_empty());
}

// ─── Scorecard over the stored log ───────────────────────────────────────────

#[tokio::test]
async fn scorecard_from_stored_events() {
  let s = store().await;

  for _ in 0..7 {
    s.record_event(adopt("FIN", &["kw"])).await.unwrap();
  }
  for _ in 0..3 {
    s.record_event(reject("GERAL", &["kw"])).await.unwrap();
  }

  let window = ScorecardWindow::trailing(14, chrono::Utc::now()).unwrap();
  let events = s.events_between(window.start(), window.until).await.unwrap();
  let card = compute_scorecard(window, &events);

  assert_eq!(card.true_positives, 7);
  assert_eq!(card.false_positives, 3);
  assert_eq!(card.acceptance_rate, 70.0);
  assert_eq!(card.daily.len(), 14);
}
