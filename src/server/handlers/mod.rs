mod account;
mod pages;
mod recipes;

pub use account::{login, login_page, logout, register, register_page};
pub use pages::{about, contact, contact_page, not_found};
pub use recipes::{
  edit_recipe, edit_recipe_page, explore_categories, explore_category, explore_latest,
  explore_random, explore_recipe, homepage, search_recipe, submit_recipe, submit_recipe_page,
};

use axum::{
  http::{header, HeaderValue, StatusCode},
  response::{IntoResponse, Response},
};

use super::error::AppError;
use super::session::{self, FlashKind, Session};
use super::state::AppState;
use super::views::Flashes;
use crate::models::SaveError;

/// 302 to `location`, optionally setting a cookie on the way.
pub fn redirect(location: &str, cookie: Option<HeaderValue>) -> Response {
  let mut response = (StatusCode::FOUND, [(header::LOCATION, location)]).into_response();
  if let Some(cookie) = cookie {
    response.headers_mut().append(header::SET_COOKIE, cookie);
  }
  response
}

/// Pop the info and error flashes a form page shows.
async fn take_flashes(
  state: &AppState,
  session: &Session,
  info: FlashKind,
) -> Result<Flashes, AppError> {
  Ok(Flashes {
    info: session::take_flash(state, session, info).await?,
    errors: session::take_flash(state, session, FlashKind::Errors).await?,
  })
}

/// Flash lines for a failed write. Store failures are logged and reported
/// generically.
fn save_failure(err: SaveError) -> Vec<String> {
  match err {
    SaveError::Schema(e) => e.messages(),
    SaveError::Store(e) => {
      tracing::error!("Write failed: {:#}", e);
      vec!["Something went wrong while saving, please try again.".to_string()]
    }
  }
}

impl From<SaveError> for AppError {
  fn from(err: SaveError) -> Self {
    match err {
      SaveError::Schema(e) => AppError::BadRequest(e.to_string()),
      SaveError::Store(e) => AppError::Internal(e),
    }
  }
}
