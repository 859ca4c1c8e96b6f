//! Challenge and leaderboard storage.
//!
//! The grading core never touches a store; handlers load fully materialized
//! record collections through these traits and pass them in. A store is
//! opened once at startup, shared behind an `Arc`, and closed explicitly on
//! shutdown. After `close` every call fails with [`StoreError::Closed`].

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::{StoreBackend, StoreConfig};
use crate::domain::{Challenge, ChallengeInfo, Highscore, NewHighscore, Variant};
use crate::record::Record;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("sqlite: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("store is closed")]
  Closed,
  #[error("store lock poisoned")]
  Poisoned,
  #[error("corrupt row: {0}")]
  Corrupt(String),
}

pub trait ChallengeStore {
  /// All challenges, ordered by id.
  fn list_challenges(&self) -> StoreResult<Vec<ChallengeInfo>>;
  fn challenge(&self, id: u32) -> StoreResult<Option<ChallengeInfo>>;
  /// Records of one half of a challenge, ordered by record id. Unknown
  /// challenges yield an empty collection.
  fn records(&self, id: u32, variant: Variant) -> StoreResult<Vec<Record>>;
  /// Insert or replace a challenge with both record sets.
  fn insert_challenge(&self, challenge: &Challenge) -> StoreResult<()>;
  /// Remove every challenge and highscore.
  fn clear(&self) -> StoreResult<()>;
}

pub trait LeaderboardStore {
  fn add_highscore(&self, entry: NewHighscore) -> StoreResult<Highscore>;
  /// Best scores first; ties keep insertion order.
  fn top_highscores(&self, limit: usize) -> StoreResult<Vec<Highscore>>;
}

pub trait Store: ChallengeStore + LeaderboardStore + Send + Sync {
  fn close(&self) -> StoreResult<()>;
}

pub fn open_store(cfg: &StoreConfig) -> StoreResult<Arc<dyn Store>> {
  match cfg.backend {
    StoreBackend::Memory => {
      info!(target: "store", "Using in-memory store");
      Ok(Arc::new(MemoryStore::new()))
    }
    StoreBackend::Sqlite => {
      let store = SqliteStore::open(&cfg.path)?;
      info!(target: "store", path = %cfg.path, "Opened sqlite store");
      Ok(Arc::new(store))
    }
  }
}
