//! SQLite-backed store (rusqlite).
//!
//! `clean_data` and `dirty_data` are wide tables with one column per known
//! field. A present value is stored as its JSON text (`"12"`, `12`, `true`),
//! so its kind survives the round trip; an absent or null value is SQL NULL.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, info, instrument};

use super::{ChallengeStore, LeaderboardStore, Store, StoreError, StoreResult};
use crate::domain::{Challenge, ChallengeInfo, Highscore, NewHighscore, Variant};
use crate::record::{Field, Record, Value};

pub struct SqliteStore {
  conn: Mutex<Option<Connection>>,
}

fn table(variant: Variant) -> &'static str {
  match variant {
    Variant::Dirty => "dirty_data",
    Variant::Clean => "clean_data",
  }
}

fn field_columns() -> String {
  Field::ALL.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", ")
}

fn schema_sql() -> String {
  let cols: String = Field::ALL.iter().map(|f| format!("  {},\n", f.as_str())).collect();
  let record_table = |name: &str| {
    format!(
      "CREATE TABLE IF NOT EXISTS {name} (\n  record_id INTEGER NOT NULL,\n  challenge_id INTEGER NOT NULL,\n{cols}  PRIMARY KEY (record_id, challenge_id),\n  FOREIGN KEY (challenge_id) REFERENCES challenges (id)\n);\n"
    )
  };
  format!(
    "CREATE TABLE IF NOT EXISTS challenges (
  id INTEGER PRIMARY KEY,
  name TEXT NOT NULL,
  difficulty TEXT NOT NULL,
  description TEXT NOT NULL
);
{}{}CREATE TABLE IF NOT EXISTS highscores (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  score INTEGER NOT NULL,
  challenge_id INTEGER,
  timestamp TEXT NOT NULL
);
",
    record_table("clean_data"),
    record_table("dirty_data"),
  )
}

fn to_sql(value: &Value) -> SqlValue {
  match value {
    Value::Null => SqlValue::Null,
    other => SqlValue::Text(other.to_json().to_string()),
  }
}

fn from_sql(column: &str, raw: ValueRef<'_>) -> StoreResult<Value> {
  match raw {
    ValueRef::Null => Ok(Value::Null),
    ValueRef::Text(bytes) => serde_json::from_slice::<serde_json::Value>(bytes)
      .ok()
      .and_then(|v| Value::from_json(&v))
      .ok_or_else(|| StoreError::Corrupt(format!("{column}: not a JSON scalar"))),
    _ => Err(StoreError::Corrupt(format!("{column}: expected JSON text"))),
  }
}

// Record ids span all of u64; the column holds the same 64 bits as i64.
fn id_to_sql(id: u64) -> i64 {
  id as i64
}

fn id_from_sql(raw: i64) -> u64 {
  raw as u64
}

fn row_to_record(row: &Row<'_>) -> StoreResult<Record> {
  let mut record = Record::new(id_from_sql(row.get(0)?));
  for (i, field) in Field::ALL.iter().enumerate() {
    let value = from_sql(field.as_str(), row.get_ref(i + 1)?)?;
    record.fields.insert(*field, value);
  }
  Ok(record)
}

fn insert_record(conn: &Connection, variant: Variant, challenge_id: u32, record: &Record) -> StoreResult<()> {
  let mut columns = vec!["record_id", "challenge_id"];
  let mut values = vec![SqlValue::Integer(id_to_sql(record.id)), SqlValue::Integer(i64::from(challenge_id))];
  for (field, value) in &record.fields {
    columns.push(field.as_str());
    values.push(to_sql(value));
  }
  let placeholders = (1..=values.len()).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ");
  let sql = format!("INSERT INTO {} ({}) VALUES ({})", table(variant), columns.join(", "), placeholders);
  conn.execute(&sql, params_from_iter(values))?;
  Ok(())
}

fn parse_timestamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|d| d.with_timezone(&Utc))
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl SqliteStore {
  pub fn open(path: &str) -> StoreResult<Self> {
    Self::from_connection(Connection::open(path)?)
  }

  #[cfg(test)]
  pub fn open_in_memory() -> StoreResult<Self> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> StoreResult<Self> {
    conn.execute_batch(&schema_sql())?;
    Ok(Self { conn: Mutex::new(Some(conn)) })
  }

  fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> StoreResult<T>) -> StoreResult<T> {
    let mut guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
    let conn = guard.as_mut().ok_or(StoreError::Closed)?;
    f(conn)
  }
}

impl ChallengeStore for SqliteStore {
  fn list_challenges(&self) -> StoreResult<Vec<ChallengeInfo>> {
    self.with_conn(|conn| {
      let mut stmt = conn.prepare("SELECT id, name, difficulty, description FROM challenges ORDER BY id")?;
      let rows = stmt.query_map([], |row| {
        Ok(ChallengeInfo { id: row.get(0)?, name: row.get(1)?, difficulty: row.get(2)?, description: row.get(3)? })
      })?;
      let out = rows.collect::<Result<Vec<_>, _>>()?;
      Ok(out)
    })
  }

  fn challenge(&self, id: u32) -> StoreResult<Option<ChallengeInfo>> {
    self.with_conn(|conn| {
      let info = conn
        .query_row(
          "SELECT id, name, difficulty, description FROM challenges WHERE id = ?1",
          params![id],
          |row| Ok(ChallengeInfo { id: row.get(0)?, name: row.get(1)?, difficulty: row.get(2)?, description: row.get(3)? }),
        )
        .optional()?;
      Ok(info)
    })
  }

  #[instrument(level = "debug", skip(self))]
  fn records(&self, id: u32, variant: Variant) -> StoreResult<Vec<Record>> {
    self.with_conn(|conn| {
      let sql = format!(
        "SELECT record_id, {} FROM {} WHERE challenge_id = ?1",
        field_columns(),
        table(variant)
      );
      let mut stmt = conn.prepare(&sql)?;
      let mut rows = stmt.query(params![id])?;
      let mut records = Vec::new();
      while let Some(row) = rows.next()? {
        records.push(row_to_record(row)?);
      }
      records.sort_by_key(|r| r.id);
      Ok(records)
    })
  }

  #[instrument(level = "debug", skip(self, challenge), fields(id = challenge.info.id))]
  fn insert_challenge(&self, challenge: &Challenge) -> StoreResult<()> {
    self.with_conn(|conn| {
      let id = challenge.info.id;
      let tx = conn.transaction()?;
      tx.execute("DELETE FROM clean_data WHERE challenge_id = ?1", params![id])?;
      tx.execute("DELETE FROM dirty_data WHERE challenge_id = ?1", params![id])?;
      tx.execute(
        "INSERT OR REPLACE INTO challenges (id, name, difficulty, description) VALUES (?1, ?2, ?3, ?4)",
        params![id, challenge.info.name, challenge.info.difficulty, challenge.info.description],
      )?;
      for variant in [Variant::Clean, Variant::Dirty] {
        for record in challenge.records(variant) {
          insert_record(&tx, variant, id, record)?;
        }
      }
      tx.commit()?;
      debug!(target: "store", id, records = challenge.clean.len(), "Challenge stored");
      Ok(())
    })
  }

  fn clear(&self) -> StoreResult<()> {
    self.with_conn(|conn| {
      let tx = conn.transaction()?;
      for name in ["clean_data", "dirty_data", "challenges", "highscores"] {
        tx.execute(&format!("DELETE FROM {name}"), [])?;
      }
      tx.commit()?;
      Ok(())
    })
  }
}

impl LeaderboardStore for SqliteStore {
  fn add_highscore(&self, entry: NewHighscore) -> StoreResult<Highscore> {
    self.with_conn(|conn| {
      let timestamp = Utc::now();
      conn.execute(
        "INSERT INTO highscores (name, score, challenge_id, timestamp) VALUES (?1, ?2, ?3, ?4)",
        params![entry.name, entry.score, entry.challenge_id, timestamp.to_rfc3339()],
      )?;
      Ok(Highscore {
        id: conn.last_insert_rowid(),
        name: entry.name,
        score: entry.score,
        challenge_id: entry.challenge_id,
        timestamp,
      })
    })
  }

  fn top_highscores(&self, limit: usize) -> StoreResult<Vec<Highscore>> {
    self.with_conn(|conn| {
      let mut stmt = conn.prepare(
        "SELECT id, name, score, challenge_id, timestamp FROM highscores ORDER BY score DESC, id ASC LIMIT ?1",
      )?;
      let limit = i64::try_from(limit).unwrap_or(i64::MAX);
      let rows = stmt.query_map(params![limit], |row| {
        let ts: String = row.get(4)?;
        Ok(Highscore {
          id: row.get(0)?,
          name: row.get(1)?,
          score: row.get(2)?,
          challenge_id: row.get(3)?,
          timestamp: parse_timestamp(4, &ts)?,
        })
      })?;
      let out = rows.collect::<Result<Vec<_>, _>>()?;
      Ok(out)
    })
  }
}

impl Store for SqliteStore {
  fn close(&self) -> StoreResult<()> {
    let mut guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
    let conn = guard.take().ok_or(StoreError::Closed)?;
    conn.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
    info!(target: "store", "Sqlite store closed");
    Ok(())
  }
}
