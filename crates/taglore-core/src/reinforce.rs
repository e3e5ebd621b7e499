//! The reinforcement algorithm and the event → learning-plan mapping.
//!
//! All functions here are pure. The store applies a [`LearningOp`] plan
//! transactionally and records the event id in a ledger so replaying the
//! same event never double-counts.

use serde::{Deserialize, Serialize};

use crate::{
  association::{AssociationSource, Polarity},
  event::{ActionType, AutoSuggestionStatus, Decision, Event},
};

/// Strength assigned to a pair on first observation.
pub const INITIAL_STRENGTH: f64 = 0.5;

/// Fraction of the remaining headroom gained per confirmation.
pub const LEARNING_RATE: f64 = 0.2;

/// Multiplier applied when a correction weakens an existing correlation.
pub const DECAY_FACTOR: f64 = 0.8;

/// One confirmation step: strength moves toward 1 by a fixed fraction of the
/// remaining headroom, so repeated confirmation saturates instead of
/// overflowing.
pub fn reinforce(strength: f64) -> f64 {
  (strength + (1.0 - strength) * LEARNING_RATE).clamp(0.0, 1.0)
}

/// One weakening step. Strictly lowers any positive strength; never leaves
/// [0, 1].
pub fn decay(strength: f64) -> f64 {
  (strength * DECAY_FACTOR).clamp(0.0, 1.0)
}

// ─── Learning plan ───────────────────────────────────────────────────────────

/// A single store mutation derived from an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearningOp {
  /// Upsert: create the pair at [`INITIAL_STRENGTH`] or strengthen it and
  /// bump its occurrence count.
  Reinforce {
    polarity:      Polarity,
    keyword:       String,
    taxonomy_code: String,
    source:        AssociationSource,
  },
  /// Weaken the pair if it exists; a no-op otherwise. Occurrence count is
  /// untouched — decay is not an observation of the pair.
  Decay {
    polarity:      Polarity,
    keyword:       String,
    taxonomy_code: String,
  },
}

/// The result of running the engine over one event id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LearningOutcome {
  /// The plan was applied in full.
  Applied { ops: usize },
  /// The event id was already in the ledger; nothing was touched.
  AlreadyApplied,
  /// The event carries no learnable signal (empty keywords, import/export,
  /// or an ignored auto-suggestion).
  NothingToLearn,
}

/// Map an event to the store mutations it implies.
///
/// - Adoptions reinforce a correlation per keyword.
/// - Rejections reinforce a restriction per keyword.
/// - Merges reinforce correlations toward the surviving code, unless the
///   admin ignored the auto-suggestion outright.
/// - Reassignments decay the old correlation and reinforce the new one.
/// - Import/export events carry no signal.
///
/// Blank keywords are skipped; an event whose keywords are all blank yields
/// an empty plan (the event itself is still persisted for audit).
pub fn learning_plan(event: &Event) -> Vec<LearningOp> {
  let mut ops = Vec::new();

  match &event.decision {
    Decision::Adopt { taxonomy_code, keywords } => {
      for kw in clean(keywords) {
        ops.push(LearningOp::Reinforce {
          polarity:      Polarity::Correlate,
          keyword:       kw,
          taxonomy_code: taxonomy_code.clone(),
          source:        AssociationSource::Feedback,
        });
      }
    }

    Decision::Reject { taxonomy_code, keywords } => {
      for kw in clean(keywords) {
        ops.push(LearningOp::Reinforce {
          polarity:      Polarity::Restrict,
          keyword:       kw,
          taxonomy_code: taxonomy_code.clone(),
          source:        AssociationSource::Feedback,
        });
      }
    }

    Decision::Merge { target_code, keywords, auto_suggestion, .. } => {
      if *auto_suggestion == Some(AutoSuggestionStatus::Ignored) {
        return ops;
      }
      for kw in clean(keywords) {
        ops.push(LearningOp::Reinforce {
          polarity:      Polarity::Correlate,
          keyword:       kw,
          taxonomy_code: target_code.clone(),
          source:        AssociationSource::Feedback,
        });
      }
    }

    Decision::Reassign { from_code, to_code, keywords } => {
      for kw in clean(keywords) {
        ops.push(LearningOp::Decay {
          polarity:      Polarity::Correlate,
          keyword:       kw.clone(),
          taxonomy_code: from_code.clone(),
        });
        ops.push(LearningOp::Reinforce {
          polarity:      Polarity::Correlate,
          keyword:       kw,
          taxonomy_code: to_code.clone(),
          source:        AssociationSource::Correction,
        });
      }
    }

    Decision::ImportExport { .. } => {}
  }

  debug_assert!(
    event.decision.matches(event.action),
    "unvalidated event reached the learning engine"
  );

  ops
}

fn clean(keywords: &[String]) -> impl Iterator<Item = String> + '_ {
  keywords
    .iter()
    .map(|k| k.trim())
    .filter(|k| !k.is_empty())
    .map(str::to_owned)
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;
  use crate::event::MergeReason;

  fn event(action: ActionType, decision: Decision) -> Event {
    Event {
      event_id: Uuid::new_v4(),
      action,
      document_id: None,
      rationale: None,
      decision,
      time_to_decision_ms: None,
      created_at: Utc::now(),
    }
  }

  #[test]
  fn strength_stays_in_bounds() {
    let mut s = INITIAL_STRENGTH;
    for _ in 0..1000 {
      s = reinforce(s);
      assert!((0.0..=1.0).contains(&s));
    }
    for _ in 0..1000 {
      s = decay(s);
      assert!((0.0..=1.0).contains(&s));
    }
  }

  #[test]
  fn reinforcement_is_monotone_and_converges() {
    let mut s = INITIAL_STRENGTH;
    for _ in 0..200 {
      let next = reinforce(s);
      assert!(next >= s);
      assert!(next < 1.0);
      s = next;
    }
    assert!(s > 0.999);
  }

  #[test]
  fn decay_strictly_lowers_positive_strength() {
    let reinforced = reinforce(INITIAL_STRENGTH);
    let decayed = decay(reinforced);
    assert!(decayed < reinforced);
    assert!(decayed > 0.0);
  }

  #[test]
  fn adopt_plans_one_correlation_per_keyword() {
    let e = event(ActionType::AdoptOrphan, Decision::Adopt {
      taxonomy_code: "FIN".into(),
      keywords:      vec!["balanço".into(), "contabilidade".into()],
    });
    let plan = learning_plan(&e);
    assert_eq!(plan.len(), 2);
    assert!(plan.iter().all(|op| matches!(
      op,
      LearningOp::Reinforce { polarity: Polarity::Correlate, .. }
    )));
  }

  #[test]
  fn reject_plans_restrictions() {
    let e = event(ActionType::DeleteOrphan, Decision::Reject {
      taxonomy_code: "GERAL".into(),
      keywords:      vec!["relatorio".into()],
    });
    let plan = learning_plan(&e);
    assert_eq!(plan, vec![LearningOp::Reinforce {
      polarity:      Polarity::Restrict,
      keyword:       "relatorio".into(),
      taxonomy_code: "GERAL".into(),
      source:        AssociationSource::Feedback,
    }]);
  }

  #[test]
  fn reassign_decays_then_reinforces() {
    let e = event(ActionType::ReassignOrphan, Decision::Reassign {
      from_code: "GERAL".into(),
      to_code:   "FIN".into(),
      keywords:  vec!["balanço".into()],
    });
    let plan = learning_plan(&e);
    assert_eq!(plan.len(), 2);
    assert!(matches!(&plan[0], LearningOp::Decay { taxonomy_code, .. }
      if taxonomy_code == "GERAL"));
    assert!(matches!(&plan[1], LearningOp::Reinforce {
      taxonomy_code,
      source: AssociationSource::Correction,
      ..
    } if taxonomy_code == "FIN"));
  }

  #[test]
  fn ignored_auto_suggestion_learns_nothing() {
    let e = event(ActionType::MergeParent, Decision::Merge {
      target_code:     "FIN".into(),
      keywords:        vec!["balanço".into()],
      reasons:         vec![MergeReason::Synonymy],
      auto_suggestion: Some(AutoSuggestionStatus::Ignored),
    });
    assert!(learning_plan(&e).is_empty());
  }

  #[test]
  fn blank_keywords_are_skipped() {
    let e = event(ActionType::AdoptOrphan, Decision::Adopt {
      taxonomy_code: "FIN".into(),
      keywords:      vec!["".into(), "   ".into(), "balanço".into()],
    });
    assert_eq!(learning_plan(&e).len(), 1);
  }

  #[test]
  fn import_export_learns_nothing() {
    let e = event(
      ActionType::ExportTaxonomy,
      Decision::ImportExport { concept_count: 42 },
    );
    assert!(learning_plan(&e).is_empty());
  }
}
