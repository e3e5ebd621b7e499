//! Scorecard aggregation — accuracy metrics computed from the raw event log.
//!
//! Recomputed on demand rather than incrementally materialised; event volume
//! is admin-paced, so a full scan per dashboard read is fine. An empty window
//! is a valid zero scorecard, distinct from a storage failure (which
//! surfaces as an error from the store, never as zeros).

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use strum::IntoEnumIterator as _;

use crate::{
  Error, Result,
  event::{ActionType, AutoSuggestionStatus, Decision, Event, MergeReason},
};

// ─── Window ──────────────────────────────────────────────────────────────────

/// A trailing window of whole UTC days ending at `until`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScorecardWindow {
  pub until: DateTime<Utc>,
  pub days:  u32,
}

impl ScorecardWindow {
  /// A window covering the `days` UTC dates ending at `until`'s date.
  /// `days` must be at least 1.
  pub fn trailing(days: u32, until: DateTime<Utc>) -> Result<Self> {
    if days == 0 {
      return Err(Error::EmptyWindow);
    }
    Ok(Self { until, days })
  }

  /// Midnight UTC of the first bucketed day.
  pub fn start(&self) -> DateTime<Utc> {
    self
      .first_date()
      .and_time(NaiveTime::MIN)
      .and_utc()
  }

  fn first_date(&self) -> NaiveDate {
    self.until.date_naive() - Days::new(u64::from(self.days - 1))
  }

  /// The bucket dates, oldest first. Always exactly `days` entries.
  pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
    let first = self.first_date();
    (0..self.days).map(move |i| first + Days::new(u64::from(i)))
  }

  fn contains(&self, at: DateTime<Utc>) -> bool {
    at >= self.start() && at <= self.until
  }
}

// ─── Output types ────────────────────────────────────────────────────────────

/// One UTC-day bucket of the daily time series. Buckets are emitted for
/// every day in the window, zeroed when nothing happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyBucket {
  pub date:     NaiveDate,
  pub total:    u64,
  pub accepted: u64,
  pub rejected: u64,
}

/// Accepted/modified/ignored counts over merge events that carried an
/// auto-suggestion status.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AutoSuggestionStats {
  pub accepted:      u64,
  pub modified:      u64,
  pub ignored:       u64,
  /// Percentage of statuses that were `accepted`; 0 when there are none.
  pub accepted_rate: f64,
}

/// The aggregated accuracy scorecard served to dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct Scorecard {
  pub window:                ScorecardWindow,
  pub true_positives:        u64,
  pub false_positives:       u64,
  /// `100 * TP / (TP + FP)`; 0 when both are zero, never NaN.
  pub acceptance_rate:       f64,
  /// Mean decision latency per action type, over events that carried one.
  /// Every action type is present; `None` means no latency data.
  pub avg_latency_by_action: BTreeMap<&'static str, Option<f64>>,
  pub daily:                 Vec<DailyBucket>,
  /// Count per merge reason across merge events; every reason is present.
  pub merge_reasons:         BTreeMap<&'static str, u64>,
  pub auto_suggestions:      AutoSuggestionStats,
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

/// `100 * tp / (tp + fp)`, defined as 0 for the empty case.
pub fn acceptance_rate(tp: u64, fp: u64) -> f64 {
  if tp + fp == 0 {
    0.0
  } else {
    tp as f64 / (tp + fp) as f64 * 100.0
  }
}

/// Compute the scorecard for `window` over `events`.
///
/// Events outside the window are ignored, so callers may pass a superset
/// (e.g. a coarse time-range query). The daily series always has exactly
/// `window.days` buckets.
pub fn compute_scorecard(window: ScorecardWindow, events: &[Event]) -> Scorecard {
  let mut tp = 0u64;
  let mut fp = 0u64;

  let mut latency_sums: BTreeMap<&'static str, (f64, u64)> = BTreeMap::new();
  let mut buckets: BTreeMap<NaiveDate, DailyBucket> = window
    .dates()
    .map(|date| {
      (date, DailyBucket { date, total: 0, accepted: 0, rejected: 0 })
    })
    .collect();
  let mut reasons: BTreeMap<&'static str, u64> =
    MergeReason::iter().map(|r| (r.discriminant(), 0)).collect();
  let mut suggestions = AutoSuggestionStats::default();

  for event in events {
    if !window.contains(event.created_at) {
      continue;
    }

    if event.action.is_acceptance() {
      tp += 1;
    }
    if event.action.is_rejection() {
      fp += 1;
    }

    if let Some(ms) = event.time_to_decision_ms {
      let entry = latency_sums
        .entry(event.action.discriminant())
        .or_insert((0.0, 0));
      entry.0 += ms as f64;
      entry.1 += 1;
    }

    if let Some(bucket) = buckets.get_mut(&event.created_at.date_naive()) {
      bucket.total += 1;
      if event.action.is_acceptance() {
        bucket.accepted += 1;
      }
      if event.action.is_rejection() {
        bucket.rejected += 1;
      }
    }

    if let Decision::Merge { reasons: flags, auto_suggestion, .. } =
      &event.decision
    {
      for flag in flags {
        *reasons.entry(flag.discriminant()).or_insert(0) += 1;
      }
      match auto_suggestion {
        Some(AutoSuggestionStatus::Accepted) => suggestions.accepted += 1,
        Some(AutoSuggestionStatus::Modified) => suggestions.modified += 1,
        Some(AutoSuggestionStatus::Ignored) => suggestions.ignored += 1,
        None => {}
      }
    }
  }

  let avg_latency_by_action = ActionType::iter()
    .map(|action| {
      let key = action.discriminant();
      let avg = latency_sums.get(key).map(|(sum, n)| sum / *n as f64);
      (key, avg)
    })
    .collect();

  let total_suggestions =
    suggestions.accepted + suggestions.modified + suggestions.ignored;
  suggestions.accepted_rate = if total_suggestions == 0 {
    0.0
  } else {
    suggestions.accepted as f64 / total_suggestions as f64 * 100.0
  };

  Scorecard {
    window,
    true_positives: tp,
    false_positives: fp,
    acceptance_rate: acceptance_rate(tp, fp),
    avg_latency_by_action,
    daily: buckets.into_values().collect(),
    merge_reasons: reasons,
    auto_suggestions: suggestions,
  }
}
