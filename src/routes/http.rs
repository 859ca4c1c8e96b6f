//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::State, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::domain::{ChallengeInfo, Highscore};
use crate::error::AppResult;
use crate::grader::GradingResult;
use crate::logic::*;
use crate::protocol::*;
use crate::routes::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_list_challenges(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<ChallengeInfo>>> {
  let challenges = list_challenges(&state).await?;
  info!(target: "challenge", count = challenges.len(), "HTTP challenge list served");
  Ok(Json(challenges))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_challenge(
  State(state): State<Arc<AppState>>,
  ApiPath(id): ApiPath<u32>,
) -> AppResult<Json<ChallengeOut>> {
  Ok(Json(load_puzzle(&state, id).await?))
}

#[instrument(level = "info", skip(state, body), fields(entries = body.cleaned_data.len()))]
pub async fn http_post_submit(
  State(state): State<Arc<AppState>>,
  ApiPath(id): ApiPath<u32>,
  ApiJson(body): ApiJson<SubmitIn>,
) -> AppResult<Json<GradingResult>> {
  Ok(Json(grade_submission(&state, id, body.cleaned_data).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_highscores(
  State(state): State<Arc<AppState>>,
  ApiQuery(q): ApiQuery<HighscoreQuery>,
) -> AppResult<Json<Vec<Highscore>>> {
  Ok(Json(top_highscores(&state, q.limit).await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_highscore(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<HighscoreIn>,
) -> AppResult<Json<Highscore>> {
  Ok(Json(add_highscore(&state, body).await?))
}

#[cfg(test)]
mod tests {
  use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
  };
  use serde_json::{json, Value};
  use tower::ServiceExt;

  use crate::config::{AppConfig, SeedMode};
  use crate::domain::{Challenge, ChallengeInfo};
  use crate::record::{Field, Record};
  use crate::routes::build_router;
  use crate::seeds::{seed_challenges, seed_store};
  use crate::state::AppState;
  use crate::store::{ChallengeStore, MemoryStore, Store};
  use std::sync::Arc;

  fn app() -> (Router, Arc<dyn Store>) {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    seed_store(store.as_ref(), SeedMode::KeepExisting, &seed_challenges()).expect("seed");
    let state = Arc::new(AppState::new(store.clone(), &AppConfig::default()));
    (build_router(state, None), store)
  }

  async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        req = req.header("content-type", "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).expect("request")).await.expect("response");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
  }

  fn clean_entries(challenge: &Challenge) -> Vec<Value> {
    challenge.clean.iter().map(Record::to_json).collect()
  }

  #[tokio::test]
  async fn health_and_listing() {
    let (app, _) = app();
    let (status, body) = call(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    let (status, body) = call(&app, "GET", "/api/challenges", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().expect("array");
    assert_eq!(list.len(), 6);
    assert_eq!(list[0]["name"], json!("Text Correction"));
  }

  #[tokio::test]
  async fn puzzle_is_projected_to_live_fields() {
    let (app, store) = app();
    let challenge = Challenge {
      info: ChallengeInfo { id: 20, name: "Sparse".into(), difficulty: "Easy".into(), description: String::new() },
      dirty: vec![
        Record::new(1).with(Field::Voornaam, "jan").with(Field::Iban, "").with(Field::Postcode, ""),
        Record::new(2).with(Field::Voornaam, "").with(Field::Postcode, "1234ab"),
      ],
      clean: vec![
        Record::new(1).with(Field::Voornaam, "Jan").with(Field::Postcode, "1000 AA"),
        Record::new(2).with(Field::Voornaam, "Piet").with(Field::Postcode, "1234 AB"),
      ],
    };
    store.insert_challenge(&challenge).expect("insert");

    let (status, body) = call(&app, "GET", "/api/challenge/20", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], json!(20));
    assert_eq!(
      body["dirtyData"],
      json!([
        {"id": 1, "voornaam": "jan", "postcode": ""},
        {"id": 2, "voornaam": "", "postcode": "1234ab"},
      ])
    );
  }

  #[tokio::test]
  async fn unknown_challenge_is_not_found() {
    let (app, _) = app();
    let (status, body) = call(&app, "GET", "/api/challenge/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Challenge not found"}));

    let (status, _) = call(&app, "POST", "/api/challenge/99/submit", Some(json!({"cleanedData": []}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

  }

  #[tokio::test]
  async fn malformed_requests_answer_with_json_errors() {
    let (app, _) = app();
    let (status, body) = call(&app, "GET", "/api/challenge/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) = call(&app, "POST", "/api/challenge/1/submit", Some(json!({"rows": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some_and(|e| e.contains("cleanedData")), "{body}");

    let (status, body) = call(&app, "GET", "/api/highscores?limit=lots", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");
  }

  #[tokio::test]
  async fn perfect_submission_scores_full_marks() {
    let (app, _) = app();
    let challenge = &seed_challenges()[1];
    let body = json!({"cleanedData": clean_entries(challenge)});
    let (status, out) = call(&app, "POST", "/api/challenge/2/submit", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["score"], json!(5));
    assert_eq!(out["totalPossible"], json!(5));
    assert_eq!(out["percentage"], json!(100));
  }

  #[tokio::test]
  async fn partial_submission_reports_errors_and_skips_garbage() {
    let (app, _) = app();
    let challenge = &seed_challenges()[0];
    let mut entries = clean_entries(challenge);
    entries.truncate(3);
    entries[1]["name"] = json!("Sara Jonson");
    entries.push(json!({"name": "no id"}));
    entries.push(json!({"id": 77, "name": "stranger"}));

    let (status, out) = call(&app, "POST", "/api/challenge/1/submit", Some(json!({"cleanedData": entries}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["score"], json!(2));
    assert_eq!(out["totalPossible"], json!(5));
    assert_eq!(out["percentage"], json!(40));
    assert_eq!(out["results"][1], json!({"id": 2, "correct": false, "errors": ["name"]}));
    assert_eq!(out["results"].as_array().map(Vec::len), Some(3));
    assert_eq!(out["skipped"][0]["index"], json!(3));
  }

  #[tokio::test]
  async fn repeated_entries_each_get_a_verdict() {
    let (app, _) = app();
    let challenge = &seed_challenges()[0];
    let mut wrong = challenge.clean[0].to_json();
    wrong["name"] = json!("Jhon Smtih");
    let entries = vec![wrong, challenge.clean[0].to_json()];

    let (status, out) = call(&app, "POST", "/api/challenge/1/submit", Some(json!({"cleanedData": entries}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["results"], json!([
      {"id": 1, "correct": false, "errors": ["name"]},
      {"id": 1, "correct": true, "errors": []},
    ]));
    assert_eq!(out["score"], json!(1));
    assert_eq!(out["skipped"], json!([]));
  }

  #[tokio::test]
  async fn highscores_append_and_rank() {
    let (app, _) = app();
    for (name, score) in [("ann", 40), ("bob", 100), ("cy", 67)] {
      let (status, _) = call(&app, "POST", "/api/highscores", Some(json!({"name": name, "score": score, "challengeId": 1}))).await;
      assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = call(&app, "GET", "/api/highscores/?limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body.as_array().expect("array").iter().filter_map(|h| h["name"].as_str()).collect();
    assert_eq!(names, vec!["bob", "cy"]);
  }

  #[tokio::test]
  async fn bad_highscores_are_rejected() {
    let (app, _) = app();
    let (status, body) = call(&app, "POST", "/api/highscores", Some(json!({"name": "  ", "score": 10}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "name is required"}));

    let (status, _) = call(&app, "POST", "/api/highscores", Some(json!({"name": "x", "score": 101}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, "POST", "/api/highscores", Some(json!({"name": "x", "score": 1, "challengeId": 404}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn closed_store_maps_to_database_error() {
    let (app, store) = app();
    store.close().expect("close");
    let (status, body) = call(&app, "GET", "/api/challenges", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Database error"}));
  }
}
