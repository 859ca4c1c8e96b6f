//! Domain models: challenges with their paired record sets, and leaderboard entries.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::Record;

/// Which half of a challenge: the puzzle or the answer key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
  Dirty,
  Clean,
}

/// Challenge metadata, without its records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeInfo {
  pub id: u32,
  pub name: String,
  pub difficulty: String, // free-form label, e.g. "Easy/Medium"
  pub description: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Challenge {
  pub info: ChallengeInfo,
  pub dirty: Vec<Record>,
  pub clean: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChallengeError {
  #[error("challenge {0} has no records")]
  Empty(u32),
  #[error("challenge {id}: {dirty} dirty records but {clean} clean records")]
  CardinalityMismatch { id: u32, dirty: usize, clean: usize },
  #[error("challenge {id}: record id {record} appears more than once")]
  DuplicateRecord { id: u32, record: u64 },
  #[error("challenge {id}: record id {record} has no clean counterpart")]
  Unpaired { id: u32, record: u64 },
}

impl Challenge {
  pub fn records(&self, variant: Variant) -> &[Record] {
    match variant {
      Variant::Dirty => &self.dirty,
      Variant::Clean => &self.clean,
    }
  }

  /// Dirty and clean must pair up one-to-one by record id.
  pub fn validate(&self) -> Result<(), ChallengeError> {
    let id = self.info.id;
    if self.dirty.is_empty() || self.clean.is_empty() {
      return Err(ChallengeError::Empty(id));
    }
    if self.dirty.len() != self.clean.len() {
      return Err(ChallengeError::CardinalityMismatch { id, dirty: self.dirty.len(), clean: self.clean.len() });
    }
    let clean_ids = unique_ids(id, &self.clean)?;
    let dirty_ids = unique_ids(id, &self.dirty)?;
    // Equal sizes and unique ids: one direction is enough.
    if let Some(record) = dirty_ids.iter().find(|r| !clean_ids.contains(*r)) {
      return Err(ChallengeError::Unpaired { id, record: *record });
    }
    Ok(())
  }
}

fn unique_ids(id: u32, records: &[Record]) -> Result<HashSet<u64>, ChallengeError> {
  let mut ids = HashSet::with_capacity(records.len());
  for r in records {
    if !ids.insert(r.id) {
      return Err(ChallengeError::DuplicateRecord { id, record: r.id });
    }
  }
  Ok(ids)
}

/// A leaderboard entry as stored.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Highscore {
  pub id: i64,
  pub name: String,
  pub score: u32,
  pub challenge_id: Option<u32>,
  pub timestamp: DateTime<Utc>,
}

/// A leaderboard entry about to be stored.
#[derive(Clone, Debug, PartialEq)]
pub struct NewHighscore {
  pub name: String,
  pub score: u32,
  pub challenge_id: Option<u32>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::Field;

  fn challenge(dirty: &[u64], clean: &[u64]) -> Challenge {
    let rec = |id: &u64| Record::new(*id).with(Field::Name, "x");
    Challenge {
      info: ChallengeInfo { id: 7, name: "t".into(), difficulty: "Easy".into(), description: "d".into() },
      dirty: dirty.iter().map(rec).collect(),
      clean: clean.iter().map(rec).collect(),
    }
  }

  #[test]
  fn paired_collections_validate() {
    assert_eq!(challenge(&[1, 2, 3], &[3, 1, 2]).validate(), Ok(()));
  }

  #[test]
  fn bijection_violations_are_reported() {
    assert_eq!(challenge(&[], &[]).validate(), Err(ChallengeError::Empty(7)));
    assert_eq!(
      challenge(&[1, 2], &[1]).validate(),
      Err(ChallengeError::CardinalityMismatch { id: 7, dirty: 2, clean: 1 })
    );
    assert_eq!(
      challenge(&[1, 2], &[1, 1]).validate(),
      Err(ChallengeError::DuplicateRecord { id: 7, record: 1 })
    );
    assert_eq!(challenge(&[1, 4], &[1, 2]).validate(), Err(ChallengeError::Unpaired { id: 7, record: 4 }));
  }
}
