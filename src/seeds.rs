//! Built-in exercises and the startup seeding policy.

use std::collections::BTreeMap;

use tracing::{error, info, instrument, warn};

use crate::config::SeedMode;
use crate::domain::{Challenge, ChallengeInfo};
use crate::record::{Field, Record, Value};
use crate::store::{ChallengeStore, Store, StoreResult};

macro_rules! row {
  ($($field:ident => $value:expr),* $(,)?) => {
    vec![$((Field::$field, Value::from($value))),*]
  };
}

/// Records numbered 1..=n in the order given.
fn numbered(rows: Vec<Vec<(Field, Value)>>) -> Vec<Record> {
  rows
    .into_iter()
    .zip(1u64..)
    .map(|(fields, id)| fields.into_iter().fold(Record::new(id), |r, (f, v)| r.with(f, v)))
    .collect()
}

fn challenge(
  id: u32,
  name: &str,
  difficulty: &str,
  description: &str,
  clean: Vec<Vec<(Field, Value)>>,
  dirty: Vec<Vec<(Field, Value)>>,
) -> Challenge {
  Challenge {
    info: ChallengeInfo {
      id,
      name: name.into(),
      difficulty: difficulty.into(),
      description: description.into(),
    },
    dirty: numbered(dirty),
    clean: numbered(clean),
  }
}

/// The exercises every deployment starts with.
pub fn seed_challenges() -> Vec<Challenge> {
  vec![
    challenge(
      1,
      "Text Correction",
      "Easy",
      "Fix simple text errors like spelling mistakes and basic factual errors",
      vec![
        row!(Name => "John Smith", Email => "john.smith@example.com", Phone => "555-123-4567"),
        row!(Name => "Sarah Johnson", Email => "sarah.j@company.com", Phone => "555-987-6543"),
        row!(Name => "Robert Williams", Email => "rob.williams@mail.org", Phone => "555-246-8135"),
        row!(Name => "Lisa Brown", Email => "lisa.brown@example.net", Phone => "555-369-1478"),
        row!(Name => "Michael Davis", Email => "michael.davis@company.org", Phone => "555-159-7531"),
      ],
      vec![
        row!(Name => "Jhon Smtih", Email => "john.smith@exapmle.com", Phone => "555-123-4567"),
        row!(Name => "Sara Jonson", Email => "sarah.j@comapny.com", Phone => "555-978-6543"),
        row!(Name => "Robrt Willaims", Email => "rob.williams@mail.org", Phone => "555-246-8135"),
        row!(Name => "Liza Brown", Email => "lisa.brown@example.ent", Phone => "555-369-1478"),
        row!(Name => "Micheal Davsi", Email => "michael.davis@company.org", Phone => "555-195-7531"),
      ],
    ),
    challenge(
      2,
      "Type Correction",
      "Easy/Medium",
      "Convert textual numbers and dates to their proper formats",
      vec![
        row!(Name => "Product A", Number => 12, Date => "2023-05-15"),
        row!(Name => "Product B", Number => 25, Date => "2023-06-20"),
        row!(Name => "Product C", Number => 8, Date => "2023-04-10"),
        row!(Name => "Product D", Number => 30, Date => "2023-07-05"),
        row!(Name => "Product E", Number => 15, Date => "2023-03-25"),
      ],
      vec![
        row!(Name => "Product A", Number => "Twelve", Date => "May 15, 2023"),
        row!(Name => "Product B", Number => "Twenty-five", Date => "20/06/2023"),
        row!(Name => "Product C", Number => "Eight", Date => "10th April 2023"),
        row!(Name => "Product D", Number => "Thirty", Date => "July 5th, 2023"),
        row!(Name => "Product E", Number => "Fifteen", Date => "25-03-2023"),
      ],
    ),
    challenge(
      3,
      "Data Standardization",
      "Medium",
      "Standardize data formats such as dates and ensure proper capitalization",
      vec![
        row!(Name => "John Doe", Email => "john.doe@example.com", Date => "2023-08-15"),
        row!(Name => "Jane Smith", Email => "jane.smith@company.org", Date => "2023-09-22"),
        row!(Name => "Robert Johnson", Email => "robert.johnson@mail.net", Date => "2023-07-10"),
        row!(Name => "Emily Davis", Email => "emily.davis@example.com", Date => "2023-10-05"),
        row!(Name => "Michael Wilson", Email => "michael.wilson@company.org", Date => "2023-06-30"),
      ],
      vec![
        row!(Name => "john doe", Email => "JOHN.DOE@EXAMPLE.COM", Date => "15-08-2023"),
        row!(Name => "JANE SMITH", Email => "jane.smith@company.org", Date => "22/09/2023"),
        row!(Name => "Robert johnson", Email => "ROBERT.JOHNSON@mail.net", Date => "10.07.2023"),
        row!(Name => "emily DAVIS", Email => "Emily.Davis@Example.com", Date => "05-10-2023"),
        row!(Name => "MICHAEL wilson", Email => "michael.wilson@COMPANY.org", Date => "30/06/2023"),
      ],
    ),
    challenge(
      4,
      "Missing Data Handling",
      "Medium/Hard",
      "Fill in missing fields based on context or mark them appropriately",
      vec![
        row!(Name => "John Smith", Email => "john@example.com", City => "New York", PostalCode => "10001"),
        row!(Name => "Maria Garcia", Email => "maria@company.org", City => "Los Angeles", PostalCode => "90001"),
        row!(Name => "James Johnson", Email => "james@mail.net", City => "Chicago", PostalCode => "60007"),
        row!(Name => "Emily Wilson", Email => "emily@example.com", City => "Houston", PostalCode => "77001"),
        row!(Name => "Robert Brown", Email => "robert@company.org", City => "Phoenix", PostalCode => "85001"),
      ],
      vec![
        row!(Name => "John Smith", Email => "john@example.com", City => "", PostalCode => "10001"),
        row!(Name => "Maria Garcia", Email => "", City => "Los Angeles", PostalCode => "90001"),
        row!(Name => "James Johnson", Email => "james@mail.net", City => "Chicago", PostalCode => ""),
        row!(Name => "", Email => "emily@example.com", City => "Houston", PostalCode => "77001"),
        row!(Name => "Robert Brown", Email => "robert@company.org", City => "", PostalCode => ""),
      ],
    ),
    challenge(
      5,
      "Structural Validation",
      "Hard",
      "Fix data with structural problems like inconsistent formatting in addresses and phone numbers",
      vec![
        row!(Name => "Thomas Wright", Phone => "555-123-4567", Address => "123 Main St, Apt 4B"),
        row!(Name => "Sophia Lee", Phone => "555-234-5678", Address => "456 Oak Ave, Suite 7C"),
        row!(Name => "Alexander Kim", Phone => "555-345-6789", Address => "789 Pine Rd, Unit 10D"),
        row!(Name => "Isabella Martinez", Phone => "555-456-7890", Address => "321 Cedar Ln, #15"),
        row!(Name => "William Chen", Phone => "555-567-8901", Address => "654 Maple Dr, Apt 22"),
      ],
      vec![
        row!(Name => "Thomas Wright", Phone => "5551234567", Address => "123MainStApt4B"),
        row!(Name => "Sophia Lee", Phone => "(555) 234-5678", Address => "456, Oak Avenue, Suite 7C"),
        row!(Name => "Alexander Kim", Phone => "555.345.6789", Address => "789 Pine Road Unit 10D"),
        row!(Name => "Isabella Martinez", Phone => "555 456 7890", Address => "321 Cedar Lane #15"),
        row!(Name => "William Chen", Phone => "+1-555-567-8901", Address => "654 Maple Drive, Apartment 22"),
      ],
    ),
    challenge(
      6,
      "Nederlandse Adressen",
      "Medium",
      "Normalize Dutch postcodes, house numbers and place names",
      vec![
        row!(Voornaam => "Jan", Achternaam => "Jansen", Postcode => "1234 AB", Huisnummer => 12, Woonplaats => "Amsterdam"),
        row!(Voornaam => "Eva", Achternaam => "de Vries", Postcode => "3511 LX", Huisnummer => 3, Woonplaats => "Utrecht"),
        row!(Voornaam => "Pieter", Achternaam => "Bakker", Postcode => "9711 BC", Huisnummer => 101, Woonplaats => "Groningen"),
        row!(Voornaam => "Sanne", Achternaam => "Visser", Postcode => "5611 AZ", Huisnummer => 8, Woonplaats => "Eindhoven"),
      ],
      vec![
        row!(Voornaam => "jan", Achternaam => "Jansen", Postcode => "1234ab", Huisnummer => "12", Woonplaats => "amsterdam"),
        row!(Voornaam => "Eva", Achternaam => "de vries", Postcode => "3511 lx", Huisnummer => 3, Woonplaats => "UTRECHT"),
        row!(Voornaam => "Pieter", Achternaam => "Bakker", Postcode => "9711BC", Huisnummer => "101", Woonplaats => "Groningen "),
        row!(Voornaam => "Sanne", Achternaam => "", Postcode => "5611 AZ", Huisnummer => 8, Woonplaats => "Eindhoven"),
      ],
    ),
  ]
}

/// Built-ins overlaid with bank challenges; a bank entry replaces the
/// built-in with the same id.
pub fn merge_bank(builtin: Vec<Challenge>, bank: Vec<Challenge>) -> Vec<Challenge> {
  let mut by_id: BTreeMap<u32, Challenge> = builtin.into_iter().map(|c| (c.info.id, c)).collect();
  for c in bank {
    if by_id.contains_key(&c.info.id) {
      warn!(target: "seeding", id = c.info.id, "Bank challenge replaces built-in challenge");
    }
    by_id.insert(c.info.id, c);
  }
  by_id.into_values().collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
  /// Store already had data and was left alone.
  Skipped,
  /// `inserted` challenges written, `rejected` failed validation.
  Seeded { inserted: usize, rejected: usize },
}

/// Seed `store` according to `mode`. Challenges that break the dirty/clean
/// pairing are logged and left out.
#[instrument(level = "info", skip(store, challenges), fields(count = challenges.len()))]
pub fn seed_store(store: &dyn Store, mode: SeedMode, challenges: &[Challenge]) -> StoreResult<SeedOutcome> {
  match mode {
    SeedMode::KeepExisting => {
      if !store.list_challenges()?.is_empty() {
        info!(target: "seeding", "Challenges already exist, skipping creation");
        return Ok(SeedOutcome::Skipped);
      }
    }
    SeedMode::Reset => {
      store.clear()?;
      info!(target: "seeding", "Store wiped before reseeding");
    }
  }

  let mut inserted = 0;
  let mut rejected = 0;
  for c in challenges {
    if let Err(e) = c.validate() {
      error!(target: "seeding", id = c.info.id, error = %e, "Skipping invalid challenge");
      rejected += 1;
      continue;
    }
    store.insert_challenge(c)?;
    inserted += 1;
  }
  info!(target: "seeding", inserted, rejected, "Challenges created");
  Ok(SeedOutcome::Seeded { inserted, rejected })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{NewHighscore, Variant};
  use crate::store::{LeaderboardStore, MemoryStore};

  #[test]
  fn builtin_challenges_are_well_formed() {
    let all = seed_challenges();
    assert_eq!(all.len(), 6);
    for c in &all {
      assert_eq!(c.validate(), Ok(()), "challenge {}", c.info.id);
      assert!(c.dirty != c.clean, "challenge {} has nothing to clean", c.info.id);
    }
  }

  #[test]
  fn keep_existing_seeds_once() {
    let store = MemoryStore::new();
    let all = seed_challenges();
    assert_eq!(
      seed_store(&store, SeedMode::KeepExisting, &all).expect("seed"),
      SeedOutcome::Seeded { inserted: 6, rejected: 0 }
    );
    assert_eq!(seed_store(&store, SeedMode::KeepExisting, &all).expect("seed"), SeedOutcome::Skipped);
    assert_eq!(store.list_challenges().expect("list").len(), 6);
  }

  #[test]
  fn reset_wipes_and_reseeds() {
    let store = MemoryStore::new();
    store.add_highscore(NewHighscore { name: "a".into(), score: 50, challenge_id: None }).expect("add");
    let mut all = seed_challenges();
    seed_store(&store, SeedMode::KeepExisting, &all).expect("seed");

    all.truncate(2);
    seed_store(&store, SeedMode::Reset, &all).expect("reseed");
    assert_eq!(store.list_challenges().expect("list").len(), 2);
    assert!(store.top_highscores(5).expect("top").is_empty());
  }

  #[test]
  fn invalid_challenges_are_skipped() {
    let store = MemoryStore::new();
    let mut broken = seed_challenges().remove(0);
    broken.clean.pop();
    let out = seed_store(&store, SeedMode::Reset, &[broken, seed_challenges().remove(1)]).expect("seed");
    assert_eq!(out, SeedOutcome::Seeded { inserted: 1, rejected: 1 });
    assert!(store.records(1, Variant::Clean).expect("records").is_empty());
  }

  #[test]
  fn bank_overrides_builtin_by_id() {
    let mut custom = seed_challenges().remove(2);
    custom.info.name = "Custom".into();
    custom.info.id = 1;
    let merged = merge_bank(seed_challenges(), vec![custom]);
    assert_eq!(merged.len(), 6);
    assert_eq!(merged[0].info.name, "Custom");
  }
}
