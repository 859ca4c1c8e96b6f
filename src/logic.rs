//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - Serving a challenge's puzzle (dirty records, projected)
//!   - Grading a submission against the projected answer key
//!   - Reading and appending leaderboard entries

use tracing::{info, instrument};

use crate::domain::{ChallengeInfo, Highscore, NewHighscore, Variant};
use crate::error::{AppError, AppResult};
use crate::grader::{grade_entries, GradingResult};
use crate::projector::project;
use crate::protocol::{ChallengeOut, HighscoreIn};
use crate::state::{AppState, MAX_HIGHSCORE_LIMIT};
use crate::store::{ChallengeStore, LeaderboardStore};

pub const MAX_NAME_CHARS: usize = 40;
pub const MAX_SCORE: u32 = 100;

#[instrument(level = "info", skip(state))]
pub async fn list_challenges(state: &AppState) -> AppResult<Vec<ChallengeInfo>> {
  state.with_store(|s| s.list_challenges()).await
}

#[instrument(level = "info", skip(state))]
pub async fn load_puzzle(state: &AppState, id: u32) -> AppResult<ChallengeOut> {
  let (info, dirty) = state
    .with_store(move |s| Ok((s.challenge(id)?, s.records(id, Variant::Dirty)?)))
    .await?;
  let info = match info {
    Some(info) if !dirty.is_empty() => info,
    _ => return Err(AppError::ChallengeNotFound(id)),
  };
  let dirty = project(&dirty);
  info!(target: "challenge", id, records = dirty.len(), fields = dirty.first().map_or(0, |r| r.fields.len()), "Puzzle served");
  Ok(ChallengeOut::new(info, dirty))
}

#[instrument(level = "info", skip(state, entries), fields(entries = entries.len()))]
pub async fn grade_submission(state: &AppState, id: u32, entries: Vec<serde_json::Value>) -> AppResult<GradingResult> {
  let clean = state.with_store(move |s| s.records(id, Variant::Clean)).await?;
  if clean.is_empty() {
    return Err(AppError::ChallengeNotFound(id));
  }
  let canonical = project(&clean);
  let result = grade_entries(&canonical, &entries)?;
  info!(
    target: "grading",
    id,
    score = result.score,
    total = result.total_possible,
    percentage = result.percentage,
    skipped = result.skipped.len(),
    "Submission graded"
  );
  Ok(result)
}

#[instrument(level = "info", skip(state))]
pub async fn top_highscores(state: &AppState, limit: Option<usize>) -> AppResult<Vec<Highscore>> {
  let limit = limit.unwrap_or(state.highscore_limit).clamp(1, MAX_HIGHSCORE_LIMIT);
  state.with_store(move |s| s.top_highscores(limit)).await
}

#[instrument(level = "info", skip(state, body), fields(score = body.score))]
pub async fn add_highscore(state: &AppState, body: HighscoreIn) -> AppResult<Highscore> {
  let name = body.name.trim().to_string();
  if name.is_empty() {
    return Err(AppError::BadRequest("name is required".into()));
  }
  if name.chars().count() > MAX_NAME_CHARS {
    return Err(AppError::BadRequest(format!("name is longer than {MAX_NAME_CHARS} characters")));
  }
  if body.score > MAX_SCORE {
    return Err(AppError::BadRequest(format!("score must be between 0 and {MAX_SCORE}")));
  }

  let entry = NewHighscore { name, score: body.score, challenge_id: body.challenge_id };
  let stored = state
    .with_store(move |s| {
      if let Some(cid) = entry.challenge_id {
        if s.challenge(cid)?.is_none() {
          return Ok(None);
        }
      }
      s.add_highscore(entry).map(Some)
    })
    .await?;
  let stored = stored.ok_or_else(|| AppError::BadRequest("unknown challengeId".into()))?;
  info!(target: "datascrub_backend", id = stored.id, score = stored.score, "Highscore recorded");
  Ok(stored)
}
