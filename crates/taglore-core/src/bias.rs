//! Bias resolution — the read model served to the tag-suggestion pipeline.
//!
//! Pure assembly over association rows fetched by the store. The one rule
//! with teeth: a restriction for a (keyword, code) pair suppresses any
//! correlation for the same pair, regardless of relative strength.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::association::Association;

/// A taxonomy code with the learned strength of its association.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeStrength {
  pub taxonomy_code: String,
  pub strength:      f64,
}

/// The bias signal for a single keyword. Unknown keywords get an entry with
/// both lists empty — never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BiasEntry {
  /// Codes to favour, strongest first.
  pub correlations: Vec<CodeStrength>,
  /// Codes to veto, strongest first.
  pub restrictions: Vec<CodeStrength>,
}

/// Assemble the bias map for `keywords` from raw association rows.
///
/// Rows for keywords outside the requested set are ignored, so callers may
/// pass over-fetched results. Within each list, entries are sorted by
/// strength descending, ties broken by code.
pub fn resolve_bias(
  keywords: &[String],
  correlations: &[Association],
  restrictions: &[Association],
) -> BTreeMap<String, BiasEntry> {
  let mut map: BTreeMap<String, BiasEntry> = keywords
    .iter()
    .map(|kw| (kw.clone(), BiasEntry::default()))
    .collect();

  // Pairs under restriction; correlations for these are suppressed.
  let restricted: BTreeSet<(&str, &str)> = restrictions
    .iter()
    .map(|a| (a.keyword.as_str(), a.taxonomy_code.as_str()))
    .collect();

  for row in restrictions {
    if let Some(entry) = map.get_mut(&row.keyword) {
      entry.restrictions.push(CodeStrength {
        taxonomy_code: row.taxonomy_code.clone(),
        strength:      row.strength,
      });
    }
  }

  for row in correlations {
    if restricted.contains(&(row.keyword.as_str(), row.taxonomy_code.as_str()))
    {
      continue;
    }
    if let Some(entry) = map.get_mut(&row.keyword) {
      entry.correlations.push(CodeStrength {
        taxonomy_code: row.taxonomy_code.clone(),
        strength:      row.strength,
      });
    }
  }

  for entry in map.values_mut() {
    sort_by_strength(&mut entry.correlations);
    sort_by_strength(&mut entry.restrictions);
  }

  map
}

fn sort_by_strength(list: &mut [CodeStrength]) {
  list.sort_by(|a, b| {
    b.strength
      .partial_cmp(&a.strength)
      .unwrap_or(std::cmp::Ordering::Equal)
      .then_with(|| a.taxonomy_code.cmp(&b.taxonomy_code))
  });
}
