//! Public protocol structs for the HTTP endpoints (serde ready).
//! Field names follow the frontend's camelCase JSON.

use serde::{Deserialize, Serialize};

use crate::domain::ChallengeInfo;
use crate::record::Record;

/// Puzzle delivery: challenge metadata plus the projected dirty records.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeOut {
    pub id: u32,
    pub name: String,
    pub difficulty: String,
    pub description: String,
    pub dirty_data: Vec<Record>,
}

impl ChallengeOut {
    pub fn new(info: ChallengeInfo, dirty_data: Vec<Record>) -> Self {
        Self {
            id: info.id,
            name: info.name,
            difficulty: info.difficulty,
            description: info.description,
            dirty_data,
        }
    }
}

/// Entries stay raw JSON so one malformed record can be skipped without
/// rejecting the whole request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitIn {
    pub cleaned_data: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct HighscoreQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighscoreIn {
    pub name: String,
    pub score: u32,
    #[serde(default)]
    pub challenge_id: Option<u32>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
