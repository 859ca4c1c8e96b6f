//! Schema projection: strip the columns a challenge never uses.
//!
//! Challenges draw from one wide field vocabulary but each populates only a
//! few fields. Serving the full superset would tell the client which columns
//! are noise, so every collection is narrowed to its live fields first.

use std::collections::BTreeSet;

use crate::record::{is_empty, Field, Record, Value};

/// Fields holding at least one non-empty value anywhere in `records`.
/// The identifier is a dedicated member of [`Record`] and is always kept.
pub fn live_fields(records: &[Record]) -> BTreeSet<Field> {
  let mut live = BTreeSet::new();
  for record in records {
    for (field, value) in &record.fields {
      if !is_empty(Some(value)) {
        live.insert(*field);
      }
    }
  }
  live
}

/// Narrow every record to the live fields of the whole collection.
///
/// Output keeps input order and cardinality. A live field missing from a
/// record is emitted as null, so each projected record carries exactly the
/// same field set.
pub fn project(records: &[Record]) -> Vec<Record> {
  let live = live_fields(records);
  records
    .iter()
    .map(|record| {
      let mut out = Record::new(record.id);
      for field in &live {
        let value = record.get(*field).cloned().unwrap_or(Value::Null);
        out.fields.insert(*field, value);
      }
      out
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> Vec<Record> {
    vec![
      Record::new(1).with(Field::Name, "John Smith").with(Field::City, "").with(Field::Iban, Value::Null),
      Record::new(2).with(Field::Name, "").with(Field::Email, "maria@company.org").with(Field::City, ""),
      Record::new(3).with(Field::PostalCode, "60007"),
    ]
  }

  #[test]
  fn sparse_fields_survive_if_any_row_has_a_value() {
    let records = vec![
      Record::new(1).with(Field::Voornaam, "Jan").with(Field::Postcode, ""),
      Record::new(2).with(Field::Voornaam, "").with(Field::Postcode, "1234 AB"),
    ];
    let live = live_fields(&records);
    assert_eq!(live, BTreeSet::from([Field::Voornaam, Field::Postcode]));

    let projected = project(&records);
    assert_eq!(projected, records);
  }

  #[test]
  fn all_empty_collection_keeps_only_the_id() {
    let records = vec![Record::new(1).with(Field::Voornaam, "").with(Field::Postcode, "")];
    assert!(live_fields(&records).is_empty());
    assert_eq!(project(&records), vec![Record::new(1)]);
  }

  #[test]
  fn empty_input_projects_to_empty_output() {
    assert!(project(&[]).is_empty());
  }

  #[test]
  fn dead_columns_are_dropped_and_gaps_filled() {
    let projected = project(&sample());
    assert_eq!(projected.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    for r in &projected {
      let fields: Vec<Field> = r.fields.keys().copied().collect();
      assert_eq!(fields, vec![Field::Name, Field::Email, Field::PostalCode]);
    }
    assert_eq!(projected[2].get(Field::Name), Some(&Value::Null));
    assert_eq!(projected[1].get(Field::Name), Some(&Value::from("")));
  }

  #[test]
  fn projection_is_idempotent() {
    let once = project(&sample());
    assert_eq!(project(&once), once);
  }

  #[test]
  fn live_set_ignores_row_order() {
    let records = sample();
    let expected = live_fields(&records);
    let mut reversed = records.clone();
    reversed.reverse();
    assert_eq!(live_fields(&reversed), expected);
    let mut rotated = records;
    rotated.rotate_left(1);
    assert_eq!(live_fields(&rotated), expected);
    assert_eq!(project(&rotated)[0].id, 2);
  }
}
