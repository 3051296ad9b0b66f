use axum::{
  http::StatusCode,
  response::{Html, IntoResponse, Response},
  Json,
};
use thiserror::Error;

use super::validation::ValidationErrors;
use super::views;

/// Handler error. Anything unexpected is logged and answered with a bare 500.
#[derive(Debug, Error)]
pub enum AppError {
  #[error("request failed validation")]
  Validation(ValidationErrors),
  #[error("{0}")]
  NotFound(&'static str),
  #[error("{0}")]
  BadRequest(String),
  #[error(transparent)]
  Internal(#[from] anyhow::Error),
}

impl From<ValidationErrors> for AppError {
  fn from(e: ValidationErrors) -> Self {
    Self::Validation(e)
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    match self {
      Self::Validation(errors) => (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response(),
      Self::NotFound(message) => (
        StatusCode::NOT_FOUND,
        Html(views::not_found(&views::Page::anonymous("Not Found"), message)),
      )
        .into_response(),
      Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
      Self::Internal(e) => {
        tracing::error!("Request failed: {:#}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Error occurred").into_response()
      }
    }
  }
}
