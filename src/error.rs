//! Errors surfaced at the HTTP boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::grader::GradeError;
use crate::store::StoreError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
  /// Unknown id, or a challenge without records.
  #[error("Challenge not found")]
  ChallengeNotFound(u32),

  #[error("{0}")]
  BadRequest(String),

  #[error("Database error")]
  Store(#[from] StoreError),

  #[error("Internal error")]
  Internal(String),
}

impl From<GradeError> for AppError {
  fn from(err: GradeError) -> Self {
    match err {
      // Callers check for an empty answer key first; this only fires if the
      // store changed between the two reads.
      GradeError::InvalidChallenge => AppError::Internal(err.to_string()),
    }
  }
}

impl AppError {
  pub fn status_code(&self) -> StatusCode {
    match self {
      AppError::ChallengeNotFound(_) => StatusCode::NOT_FOUND,
      AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
      AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
  pub error: String,
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    match &self {
      AppError::Store(e) => error!(target: "datascrub_backend", error = %e, "Store failure"),
      AppError::Internal(detail) => error!(target: "datascrub_backend", %detail, "Internal failure"),
      _ => {}
    }
    let status = self.status_code();
    (status, Json(ErrorBody { error: self.to_string() })).into_response()
  }
}
