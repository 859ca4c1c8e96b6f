//! In-memory store. Used by tests and by `backend = "memory"` deployments,
//! where data lives only as long as the process.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::{debug, instrument};

use super::{ChallengeStore, LeaderboardStore, Store, StoreError, StoreResult};
use crate::domain::{Challenge, ChallengeInfo, Highscore, NewHighscore, Variant};
use crate::record::Record;

#[derive(Default)]
struct Inner {
  challenges: BTreeMap<u32, Challenge>,
  highscores: Vec<Highscore>,
  next_highscore_id: i64,
}

pub struct MemoryStore {
  inner: RwLock<Option<Inner>>,
}

impl Default for MemoryStore {
  fn default() -> Self { Self::new() }
}

impl MemoryStore {
  pub fn new() -> Self {
    Self { inner: RwLock::new(Some(Inner { next_highscore_id: 1, ..Inner::default() })) }
  }

  fn read<T>(&self, f: impl FnOnce(&Inner) -> T) -> StoreResult<T> {
    let guard: RwLockReadGuard<'_, Option<Inner>> = self.inner.read().map_err(|_| StoreError::Poisoned)?;
    guard.as_ref().map(f).ok_or(StoreError::Closed)
  }

  fn write<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> StoreResult<T> {
    let mut guard: RwLockWriteGuard<'_, Option<Inner>> = self.inner.write().map_err(|_| StoreError::Poisoned)?;
    guard.as_mut().map(f).ok_or(StoreError::Closed)
  }
}

impl ChallengeStore for MemoryStore {
  fn list_challenges(&self) -> StoreResult<Vec<ChallengeInfo>> {
    self.read(|i| i.challenges.values().map(|c| c.info.clone()).collect())
  }

  fn challenge(&self, id: u32) -> StoreResult<Option<ChallengeInfo>> {
    self.read(|i| i.challenges.get(&id).map(|c| c.info.clone()))
  }

  fn records(&self, id: u32, variant: Variant) -> StoreResult<Vec<Record>> {
    self.read(|i| {
      let mut records = i.challenges.get(&id).map(|c| c.records(variant).to_vec()).unwrap_or_default();
      records.sort_by_key(|r| r.id);
      records
    })
  }

  #[instrument(level = "debug", skip(self, challenge), fields(id = challenge.info.id))]
  fn insert_challenge(&self, challenge: &Challenge) -> StoreResult<()> {
    self.write(|i| {
      i.challenges.insert(challenge.info.id, challenge.clone());
    })
  }

  fn clear(&self) -> StoreResult<()> {
    self.write(|i| {
      i.challenges.clear();
      i.highscores.clear();
    })
  }
}

impl LeaderboardStore for MemoryStore {
  fn add_highscore(&self, entry: NewHighscore) -> StoreResult<Highscore> {
    self.write(|i| {
      let hs = Highscore {
        id: i.next_highscore_id,
        name: entry.name,
        score: entry.score,
        challenge_id: entry.challenge_id,
        timestamp: Utc::now(),
      };
      i.next_highscore_id += 1;
      i.highscores.push(hs.clone());
      hs
    })
  }

  fn top_highscores(&self, limit: usize) -> StoreResult<Vec<Highscore>> {
    self.read(|i| {
      let mut all = i.highscores.clone();
      // stable sort keeps insertion order among equal scores
      all.sort_by(|a, b| b.score.cmp(&a.score));
      all.truncate(limit);
      all
    })
  }
}

impl Store for MemoryStore {
  fn close(&self) -> StoreResult<()> {
    let mut guard = self.inner.write().map_err(|_| StoreError::Poisoned)?;
    match guard.take() {
      Some(_) => {
        debug!(target: "store", "Memory store closed");
        Ok(())
      }
      None => Err(StoreError::Closed),
    }
  }
}
