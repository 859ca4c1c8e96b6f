//! Loading service configuration (server, store, seeding, challenge bank) from TOML.
//!
//! See `AppConfig` for the expected schema. Environment variables override a
//! few keys so a container can be configured without a file:
//!   PORT, DATABASE_PATH, SEED_MODE ("keep_existing" | "reset").

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::{Challenge, ChallengeInfo};
use crate::record::Record;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HIGHSCORE_LIMIT: usize = 5;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub port: u16,
  /// Directory with the built frontend; served as an SPA fallback when set.
  pub static_dir: Option<String>,
  pub highscore_limit: usize,
  pub seed_mode: SeedMode,
  pub store: StoreConfig,
  pub challenges: Vec<ChallengeCfg>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      port: DEFAULT_PORT,
      static_dir: None,
      highscore_limit: DEFAULT_HIGHSCORE_LIMIT,
      seed_mode: SeedMode::default(),
      store: StoreConfig::default(),
      challenges: Vec::new(),
    }
  }
}

/// What to do with existing data at startup.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SeedMode {
  /// Seed only an empty store.
  #[default]
  KeepExisting,
  /// Wipe everything and seed again.
  Reset,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
  #[default]
  Sqlite,
  Memory,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
  pub backend: StoreBackend,
  pub path: String,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self { backend: StoreBackend::Sqlite, path: "data.db".into() }
  }
}

/// Challenge entry accepted in the TOML bank. Records are inline tables
/// with an `id` and any of the known field names.
#[derive(Clone, Debug, Deserialize)]
pub struct ChallengeCfg {
  pub id: u32,
  pub name: String,
  pub difficulty: String,
  #[serde(default)] pub description: String,
  pub dirty: Vec<Record>,
  pub clean: Vec<Record>,
}

impl ChallengeCfg {
  pub fn to_challenge(&self) -> Challenge {
    Challenge {
      info: ChallengeInfo {
        id: self.id,
        name: self.name.clone(),
        difficulty: self.difficulty.clone(),
        description: self.description.clone(),
      },
      dirty: self.dirty.clone(),
      clean: self.clean.clone(),
    }
  }
}

pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

/// Load from APP_CONFIG_PATH (if set), then apply env overrides.
/// Unreadable or invalid files are logged and replaced by defaults.
pub fn load_config_from_env() -> AppConfig {
  let mut cfg = match std::env::var("APP_CONFIG_PATH") {
    Ok(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match parse_config(&s) {
        Ok(cfg) => {
          info!(target: "datascrub_backend", %path, bank = cfg.challenges.len(), "Loaded config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "datascrub_backend", %path, error = %e, "Failed to parse TOML config");
          AppConfig::default()
        }
      },
      Err(e) => {
        error!(target: "datascrub_backend", %path, error = %e, "Failed to read TOML config file");
        AppConfig::default()
      }
    },
    Err(_) => AppConfig::default(),
  };
  apply_env_overrides(&mut cfg, |k| std::env::var(k).ok());
  cfg
}

fn apply_env_overrides(cfg: &mut AppConfig, var: impl Fn(&str) -> Option<String>) {
  if let Some(p) = var("PORT") {
    match p.parse::<u16>() {
      Ok(port) => cfg.port = port,
      Err(_) => warn!(target: "datascrub_backend", value = %p, "Ignoring invalid PORT"),
    }
  }
  if let Some(path) = var("DATABASE_PATH") {
    cfg.store.path = path;
  }
  if let Some(mode) = var("SEED_MODE") {
    match mode.as_str() {
      "keep_existing" => cfg.seed_mode = SeedMode::KeepExisting,
      "reset" => cfg.seed_mode = SeedMode::Reset,
      other => warn!(target: "datascrub_backend", value = %other, "Ignoring unknown SEED_MODE"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::{Field, Value};
  use std::collections::HashMap;

  #[test]
  fn empty_file_yields_defaults() {
    let cfg = parse_config("").expect("config");
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.highscore_limit, DEFAULT_HIGHSCORE_LIMIT);
    assert_eq!(cfg.seed_mode, SeedMode::KeepExisting);
    assert_eq!(cfg.store, StoreConfig::default());
    assert!(cfg.challenges.is_empty());
  }

  #[test]
  fn bank_challenges_parse_into_records() {
    let cfg = parse_config(
      r#"
        port = 8080
        seed_mode = "reset"

        [store]
        backend = "memory"

        [[challenges]]
        id = 42
        name = "Postcodes"
        difficulty = "Easy"
        dirty = [ { id = 1, postcode = "1234ab", huisnummer = 7 } ]
        clean = [ { id = 1, postcode = "1234 AB", huisnummer = 7 } ]
      "#,
    )
    .expect("config");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.seed_mode, SeedMode::Reset);
    assert_eq!(cfg.store.backend, StoreBackend::Memory);
    assert_eq!(cfg.store.path, "data.db");

    let ch = cfg.challenges[0].to_challenge();
    assert_eq!(ch.info.id, 42);
    assert_eq!(ch.info.description, "");
    assert_eq!(ch.clean[0].get(Field::Postcode), Some(&Value::from("1234 AB")));
    assert_eq!(ch.dirty[0].get(Field::Huisnummer), Some(&Value::from(7)));
    assert_eq!(ch.validate(), Ok(()));
  }

  #[test]
  fn example_config_is_valid() {
    let cfg = parse_config(include_str!("../config.example.toml")).expect("example config");
    assert_eq!(cfg.store.backend, StoreBackend::Sqlite);
    assert_eq!(cfg.challenges.len(), 1);
    assert_eq!(cfg.challenges[0].to_challenge().validate(), Ok(()));
  }

  #[test]
  fn bank_record_without_id_is_rejected() {
    let res = parse_config(
      r#"
        [[challenges]]
        id = 1
        name = "n"
        difficulty = "d"
        dirty = [ { name = "x" } ]
        clean = [ { id = 1, name = "x" } ]
      "#,
    );
    assert!(res.is_err());
  }

  #[test]
  fn env_overrides_apply_and_bad_values_are_ignored() {
    let vars: HashMap<&str, &str> =
      HashMap::from([("PORT", "not-a-port"), ("DATABASE_PATH", "/tmp/x.db"), ("SEED_MODE", "reset")]);
    let mut cfg = AppConfig::default();
    apply_env_overrides(&mut cfg, |k| vars.get(k).map(|v| v.to_string()));
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.store.path, "/tmp/x.db");
    assert_eq!(cfg.seed_mode, SeedMode::Reset);
  }
}
