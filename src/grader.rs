//! Submission grading: field-by-field comparison of a cleaned submission
//! against the canonical (clean) records of a challenge.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::record::{is_empty, Field, Record, RecordError, Value};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradeError {
  /// Nothing to grade against; the owning challenge does not exist.
  #[error("canonical record set is empty")]
  InvalidChallenge,
}

/// Verdict for one submitted record that matched a canonical record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordVerdict {
  pub id: u64,
  pub correct: bool,
  pub errors: Vec<Field>,
}

/// A submitted entry that was left out of grading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedEntry {
  pub index: usize,
  pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
  pub score: usize,
  pub total_possible: usize,
  pub percentage: u32,
  pub results: Vec<RecordVerdict>,
  pub skipped: Vec<SkippedEntry>,
}

fn fields_match(canonical: Option<&Value>, submitted: Option<&Value>) -> bool {
  if is_empty(canonical) && is_empty(submitted) {
    return true;
  }
  matches!((canonical, submitted), (Some(c), Some(s)) if c == s)
}

/// Fields of `canonical` the submission got wrong, in canonical order.
/// Fields only the submission carries are never looked at.
pub fn mismatched_fields(canonical: &Record, submitted: &Record) -> Vec<Field> {
  canonical
    .fields
    .iter()
    .filter(|(field, value)| !fields_match(Some(*value), submitted.get(**field)))
    .map(|(field, _)| *field)
    .collect()
}

/// Rounded share of fully correct records, half away from zero.
pub fn percentage(score: usize, total_possible: usize) -> u32 {
  if total_possible == 0 {
    return 0;
  }
  (100.0 * score as f64 / total_possible as f64).round() as u32
}

/// Grade already-parsed records.
///
/// Every submitted record with a canonical counterpart gets a verdict, in
/// submission order; ids without one get none. `score` counts canonical ids
/// with at least one correct verdict, so a repeated id cannot push it past
/// `total_possible`. Canonical records that were never submitted still count
/// towards `total_possible`.
pub fn grade(canonical: &[Record], submitted: &[Record]) -> Result<GradingResult, GradeError> {
  if canonical.is_empty() {
    return Err(GradeError::InvalidChallenge);
  }
  let by_id: HashMap<u64, &Record> = canonical.iter().map(|r| (r.id, r)).collect();

  let mut results = Vec::with_capacity(submitted.len());
  for record in submitted {
    let Some(expected) = by_id.get(&record.id) else {
      debug!(target: "grading", id = record.id, "No canonical record for submitted id");
      continue;
    };
    let errors = mismatched_fields(expected, record);
    results.push(RecordVerdict { id: record.id, correct: errors.is_empty(), errors });
  }

  let score = results.iter().filter(|r| r.correct).map(|r| r.id).collect::<HashSet<_>>().len();
  let total_possible = canonical.len();
  Ok(GradingResult {
    score,
    total_possible,
    percentage: percentage(score, total_possible),
    results,
    skipped: Vec::new(),
  })
}

/// Grade raw JSON entries. Entries that cannot be read as records are
/// skipped and reported; they never spoil the score of the rest.
#[instrument(level = "debug", skip_all, fields(canonical = canonical.len(), submitted = entries.len()))]
pub fn grade_entries(canonical: &[Record], entries: &[serde_json::Value]) -> Result<GradingResult, GradeError> {
  let mut parsed = Vec::with_capacity(entries.len());
  let mut skipped = Vec::new();
  for (index, entry) in entries.iter().enumerate() {
    match Record::from_json(entry) {
      Ok(record) => parsed.push(record),
      Err(e) => {
        debug!(target: "grading", index, error = %e, "Skipping malformed entry");
        skipped.push(skip(index, &e));
      }
    }
  }
  let mut result = grade(canonical, &parsed)?;
  result.skipped = skipped;
  Ok(result)
}

fn skip(index: usize, e: &RecordError) -> SkippedEntry {
  SkippedEntry { index, reason: e.to_string() }
}
