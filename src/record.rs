//! Records exchanged with clients: the closed field vocabulary, scalar values,
//! and the one emptiness rule shared by projection and grading.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Number};
use thiserror::Error;

/// Every field a challenge may use. Declaration order is the iteration order
/// of a record, and therefore the order mismatches are reported in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
  Name,
  Email,
  Phone,
  Address,
  City,
  PostalCode,
  Date,
  Number,
  // Dutch identity / address fields
  Voornaam,
  Tussenvoegsel,
  Achternaam,
  Straat,
  Huisnummer,
  Postcode,
  Woonplaats,
  Geboortedatum,
  Bsn,
  Iban,
}

impl Field {
  pub const ALL: [Field; 18] = [
    Field::Name,
    Field::Email,
    Field::Phone,
    Field::Address,
    Field::City,
    Field::PostalCode,
    Field::Date,
    Field::Number,
    Field::Voornaam,
    Field::Tussenvoegsel,
    Field::Achternaam,
    Field::Straat,
    Field::Huisnummer,
    Field::Postcode,
    Field::Woonplaats,
    Field::Geboortedatum,
    Field::Bsn,
    Field::Iban,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Field::Name => "name",
      Field::Email => "email",
      Field::Phone => "phone",
      Field::Address => "address",
      Field::City => "city",
      Field::PostalCode => "postal_code",
      Field::Date => "date",
      Field::Number => "number",
      Field::Voornaam => "voornaam",
      Field::Tussenvoegsel => "tussenvoegsel",
      Field::Achternaam => "achternaam",
      Field::Straat => "straat",
      Field::Huisnummer => "huisnummer",
      Field::Postcode => "postcode",
      Field::Woonplaats => "woonplaats",
      Field::Geboortedatum => "geboortedatum",
      Field::Bsn => "bsn",
      Field::Iban => "iban",
    }
  }

  pub fn from_name(name: &str) -> Option<Field> {
    Field::ALL.iter().copied().find(|f| f.as_str() == name)
  }
}

impl fmt::Display for Field {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A scalar field value. Equality is literal: no coercion between kinds,
/// no trimming, no case folding.
#[derive(Clone, Debug)]
pub enum Value {
  Null,
  Text(String),
  Number(Number),
  Bool(bool),
}

impl Value {
  /// Convert a JSON value; `None` for arrays and objects.
  pub fn from_json(v: &serde_json::Value) -> Option<Value> {
    match v {
      serde_json::Value::Null => Some(Value::Null),
      serde_json::Value::String(s) => Some(Value::Text(s.clone())),
      serde_json::Value::Number(n) => Some(Value::Number(n.clone())),
      serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
      serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
  }

  pub fn to_json(&self) -> serde_json::Value {
    match self {
      Value::Null => serde_json::Value::Null,
      Value::Text(s) => serde_json::Value::String(s.clone()),
      Value::Number(n) => serde_json::Value::Number(n.clone()),
      Value::Bool(b) => serde_json::Value::Bool(*b),
    }
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self { Value::Text(s.to_string()) }
}

impl From<String> for Value {
  fn from(s: String) -> Self { Value::Text(s) }
}

impl From<i32> for Value {
  fn from(n: i32) -> Self { Value::Number(Number::from(n)) }
}

impl From<i64> for Value {
  fn from(n: i64) -> Self { Value::Number(Number::from(n)) }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self { Value::Bool(b) }
}

impl PartialEq for Value {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Value::Null, Value::Null) => true,
      (Value::Text(a), Value::Text(b)) => a == b,
      (Value::Bool(a), Value::Bool(b)) => a == b,
      (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
      _ => false,
    }
  }
}

// 12 and 12.0 denote the same JSON number.
fn numbers_equal(a: &Number, b: &Number) -> bool {
  if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
    return x == y;
  }
  if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
    return x == y;
  }
  match (a.as_f64(), b.as_f64()) {
    (Some(x), Some(y)) => x == y,
    _ => false,
  }
}

impl Serialize for Value {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Value::Null => serializer.serialize_unit(),
      Value::Text(s) => serializer.serialize_str(s),
      Value::Number(n) => n.serialize(serializer),
      Value::Bool(b) => serializer.serialize_bool(*b),
    }
  }
}

/// The emptiness rule: absent, null and `""` all mean "no value".
/// Whitespace-only text is a value.
pub fn is_empty(value: Option<&Value>) -> bool {
  match value {
    None | Some(Value::Null) => true,
    Some(Value::Text(s)) => s.is_empty(),
    Some(_) => false,
  }
}

/// Why a submitted entry could not be read as a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
  #[error("entry is not a JSON object")]
  NotAnObject,
  #[error("entry has no id")]
  MissingId,
  #[error("id must be a positive integer")]
  InvalidId,
  #[error("field '{0}' is not a scalar value")]
  NonScalar(String),
}

/// One row of a challenge: a positive identifier plus a sparse field map.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Record {
  pub id: u64,
  pub fields: BTreeMap<Field, Value>,
}

impl Record {
  pub fn new(id: u64) -> Self {
    Self { id, fields: BTreeMap::new() }
  }

  pub fn with(mut self, field: Field, value: impl Into<Value>) -> Self {
    self.fields.insert(field, value.into());
    self
  }

  pub fn get(&self, field: Field) -> Option<&Value> {
    self.fields.get(&field)
  }

  /// Read a client-supplied JSON object. Keys outside the field vocabulary
  /// are dropped; they could never be compared against a canonical record.
  pub fn from_json(entry: &serde_json::Value) -> Result<Record, RecordError> {
    let obj = entry.as_object().ok_or(RecordError::NotAnObject)?;
    let id = parse_id(obj)?;

    let mut record = Record::new(id);
    for (key, raw) in obj {
      if key == "id" {
        continue;
      }
      let value = Value::from_json(raw).ok_or_else(|| RecordError::NonScalar(key.clone()))?;
      if let Some(field) = Field::from_name(key) {
        record.fields.insert(field, value);
      }
    }
    Ok(record)
  }

  pub fn to_json(&self) -> serde_json::Value {
    let mut obj = Map::new();
    obj.insert("id".into(), serde_json::Value::from(self.id));
    for (field, value) in &self.fields {
      obj.insert(field.as_str().into(), value.to_json());
    }
    serde_json::Value::Object(obj)
  }
}

fn parse_id(obj: &Map<String, serde_json::Value>) -> Result<u64, RecordError> {
  let raw = obj.get("id").ok_or(RecordError::MissingId)?;
  if let Some(id) = raw.as_u64() {
    return if id > 0 { Ok(id) } else { Err(RecordError::InvalidId) };
  }
  // 1.0 is the same JSON number as 1.
  match raw.as_f64() {
    Some(f) if f >= 1.0 && f.fract() == 0.0 && f <= MAX_FLOAT_ID => Ok(f as u64),
    _ => Err(RecordError::InvalidId),
  }
}

// Largest float id accepted; every integer up to 2^53 is exact in an f64.
const MAX_FLOAT_ID: f64 = 9_007_199_254_740_992.0;

impl Serialize for Record {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
    map.serialize_entry("id", &self.id)?;
    for (field, value) in &self.fields {
      map.serialize_entry(field.as_str(), value)?;
    }
    map.end()
  }
}

impl<'de> Deserialize<'de> for Record {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    Record::from_json(&raw).map_err(de::Error::custom)
  }
}
