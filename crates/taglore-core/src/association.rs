//! Associations — learned keyword ↔ taxonomy-code signals.
//!
//! A correlation is a positive association (this keyword belongs under this
//! code); a restriction is the negative mirror (this keyword must not be
//! tagged with this code). The two are structurally identical and differ only
//! in [`Polarity`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which of the two association stores a row lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
  /// Positive: bias future suggestions toward the code.
  Correlate,
  /// Negative: veto the code for this keyword.
  Restrict,
}

/// How an association row first entered the store.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AssociationSource {
  /// Created by reinforcement from an adopt/reject/merge event.
  #[default]
  Feedback,
  /// Created by a reassignment (the admin corrected a mapping).
  Correction,
  /// Seeded by hand.
  Manual,
}

/// A learned association between a keyword and a taxonomy code, unique per
/// (keyword, taxonomy_code) within each polarity.
///
/// `strength` always stays within [0, 1] and `occurrence_count` is monotonic
/// non-decreasing; both invariants are maintained by the reinforcement
/// engine. Rows are never auto-deleted however low strength falls —
/// weakening is reversible and auditable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Association {
  pub association_id:    Uuid,
  pub keyword:           String,
  pub taxonomy_code:     String,
  pub strength:          f64,
  pub occurrence_count:  i64,
  pub source:            AssociationSource,
  pub created_at:        DateTime<Utc>,
  /// Bumped on every reinforcement or decay touching the row.
  pub last_validated_at: DateTime<Utc>,
}
