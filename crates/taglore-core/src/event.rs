//! Tag-management events — the fundamental unit of the taglore event log.
//!
//! An event is an immutable record of a single admin tagging decision. Events
//! are never updated or deleted; the learning engine consumes them exactly
//! once and all dashboards are derived from the log at read time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::EnumIter;
use uuid::Uuid;

use crate::{Error, Result};

// ─── ActionType ──────────────────────────────────────────────────────────────

/// The closed set of admin tagging actions. Anything outside this enum is a
/// validation error and is rejected before persistence.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
  /// An orphan tag was adopted into the taxonomy.
  AdoptOrphan,
  /// An orphan tag was discarded.
  DeleteOrphan,
  /// Two tags were unified; the surviving tag became the parent.
  MergeParent,
  /// Two tags were unified; the surviving tag became the child.
  MergeChild,
  /// A suggested tag was rejected as a duplicate of an existing one.
  RejectDuplicate,
  ExportTaxonomy,
  ImportTaxonomy,
  /// An orphan tag was remapped from one taxonomy code to another.
  ReassignOrphan,
  /// A whole suggested sub-taxonomy was accepted.
  TaxonomyAdoption,
}

impl ActionType {
  /// The discriminant string stored in the `action` column.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::AdoptOrphan => "adopt_orphan",
      Self::DeleteOrphan => "delete_orphan",
      Self::MergeParent => "merge_parent",
      Self::MergeChild => "merge_child",
      Self::RejectDuplicate => "reject_duplicate",
      Self::ExportTaxonomy => "export_taxonomy",
      Self::ImportTaxonomy => "import_taxonomy",
      Self::ReassignOrphan => "reassign_orphan",
      Self::TaxonomyAdoption => "taxonomy_adoption",
    }
  }

  /// Parse the discriminant string back into the enum.
  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "adopt_orphan" => Ok(Self::AdoptOrphan),
      "delete_orphan" => Ok(Self::DeleteOrphan),
      "merge_parent" => Ok(Self::MergeParent),
      "merge_child" => Ok(Self::MergeChild),
      "reject_duplicate" => Ok(Self::RejectDuplicate),
      "export_taxonomy" => Ok(Self::ExportTaxonomy),
      "import_taxonomy" => Ok(Self::ImportTaxonomy),
      "reassign_orphan" => Ok(Self::ReassignOrphan),
      "taxonomy_adoption" => Ok(Self::TaxonomyAdoption),
      other => Err(Error::UnknownActionType(other.to_owned())),
    }
  }

  /// Actions counted as true positives on the scorecard: the AI suggestion
  /// was right and the admin adopted it.
  pub fn is_acceptance(&self) -> bool {
    matches!(self, Self::AdoptOrphan | Self::TaxonomyAdoption)
  }

  /// Actions counted as false positives: the suggestion was discarded.
  pub fn is_rejection(&self) -> bool {
    matches!(self, Self::DeleteOrphan | Self::RejectDuplicate)
  }
}

// ─── Merge metadata ──────────────────────────────────────────────────────────

/// Categorical justification recorded when two tags are unified.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum MergeReason {
  Synonymy,
  GrammaticalVariation,
  SpellingVariation,
  Acronym,
  Typo,
  LanguageEquivalence,
  Generalization,
}

impl MergeReason {
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::Synonymy => "synonymy",
      Self::GrammaticalVariation => "grammatical_variation",
      Self::SpellingVariation => "spelling_variation",
      Self::Acronym => "acronym",
      Self::Typo => "typo",
      Self::LanguageEquivalence => "language_equivalence",
      Self::Generalization => "generalization",
    }
  }
}

/// What the admin did with the auto-suggested merge target, when the merge
/// started from an AI suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoSuggestionStatus {
  /// Taken as suggested.
  Accepted,
  /// Taken after the admin adjusted the target.
  Modified,
  /// Discarded; the admin merged somewhere else entirely.
  Ignored,
}

// ─── Decision ────────────────────────────────────────────────────────────────

/// The structured decision payload, decoded once at the ingestion boundary.
/// The variant must match the event's [`ActionType`] (see
/// [`NewEvent::validate`]); downstream consumers never re-parse free-form
/// JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
  /// An orphan or sub-taxonomy was accepted under `taxonomy_code`.
  Adopt {
    taxonomy_code: String,
    keywords:      Vec<String>,
  },
  /// A suggestion for `taxonomy_code` was discarded.
  Reject {
    taxonomy_code: String,
    keywords:      Vec<String>,
  },
  /// Two tags were unified into `target_code`.
  Merge {
    target_code:     String,
    keywords:        Vec<String>,
    /// Flag set; empty when the admin gave no justification.
    #[serde(default)]
    reasons:         Vec<MergeReason>,
    /// `None` when the merge did not start from an AI suggestion.
    #[serde(default)]
    auto_suggestion: Option<AutoSuggestionStatus>,
  },
  /// A keyword set was remapped from one code to another (a correction).
  Reassign {
    from_code: String,
    to_code:   String,
    keywords:  Vec<String>,
  },
  /// Bookkeeping payload for taxonomy import/export actions.
  ImportExport { concept_count: u64 },
}

impl Decision {
  /// The discriminant of the serde `kind` tag, for error messages.
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::Adopt { .. } => "adopt",
      Self::Reject { .. } => "reject",
      Self::Merge { .. } => "merge",
      Self::Reassign { .. } => "reassign",
      Self::ImportExport { .. } => "import_export",
    }
  }

  /// Whether this payload variant is the one expected for `action`.
  pub fn matches(&self, action: ActionType) -> bool {
    matches!(
      (action, self),
      (ActionType::AdoptOrphan | ActionType::TaxonomyAdoption, Self::Adopt { .. })
        | (ActionType::DeleteOrphan | ActionType::RejectDuplicate, Self::Reject { .. })
        | (ActionType::MergeParent | ActionType::MergeChild, Self::Merge { .. })
        | (ActionType::ReassignOrphan, Self::Reassign { .. })
        | (
          ActionType::ExportTaxonomy | ActionType::ImportTaxonomy,
          Self::ImportExport { .. }
        )
    )
  }
}

// ─── Event ───────────────────────────────────────────────────────────────────

/// An immutable admin tagging decision. Once written, no field is ever
/// updated; the log is purged only by explicit admin action, wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
  pub event_id:            Uuid,
  pub action:              ActionType,
  /// The document whose suggested tags were being reviewed, if any.
  pub document_id:         Option<String>,
  /// Free-text justification entered by the admin.
  pub rationale:           Option<String>,
  pub decision:            Decision,
  /// How long the admin deliberated; `None` when the UI did not measure it.
  pub time_to_decision_ms: Option<i64>,
  /// Server-assigned timestamp; never changes after creation.
  pub created_at:          DateTime<Utc>,
}

// ─── NewEvent ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::TagStore::record_event`].
/// `event_id` and `created_at` are always set by the store; they are not
/// accepted from callers.
#[derive(Debug, Clone)]
pub struct NewEvent {
  pub action:              ActionType,
  pub document_id:         Option<String>,
  pub rationale:           Option<String>,
  pub decision:            Decision,
  pub time_to_decision_ms: Option<i64>,
}

impl NewEvent {
  /// Convenience constructor with all optional fields unset.
  pub fn new(action: ActionType, decision: Decision) -> Self {
    Self {
      action,
      document_id: None,
      rationale: None,
      decision,
      time_to_decision_ms: None,
    }
  }

  /// Reject mismatched action/payload combinations before anything is
  /// persisted. An empty keyword list is valid — the event is still recorded
  /// for audit and learning becomes a no-op.
  pub fn validate(&self) -> Result<()> {
    if !self.decision.matches(self.action) {
      return Err(Error::PayloadMismatch {
        action:  self.action.discriminant(),
        payload: self.decision.discriminant(),
      });
    }
    Ok(())
  }
}
