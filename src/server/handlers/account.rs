use axum::{
  extract::State,
  http::{HeaderMap, StatusCode},
  response::{Html, IntoResponse, Response},
  Form,
};
use serde::Deserialize;

use super::redirect;
use crate::models::User;
use crate::server::auth;
use crate::server::error::AppError;
use crate::server::session::{self, Session};
use crate::server::state::AppState;
use crate::server::validation::{FormFields, REGISTER_RULES};
use crate::server::views::{self, Page};
use crate::types::Query;

pub async fn register_page(session: Session) -> Html<String> {
  Html(views::register(&Page::new("Register", &session), None))
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
  name: Option<String>,
  email: Option<String>,
  password: Option<String>,
}

impl FormFields for RegisterForm {
  fn field(&self, name: &str) -> Option<&str> {
    match name {
      "name" => self.name.as_deref(),
      "email" => self.email.as_deref(),
      "password" => self.password.as_deref(),
      _ => None,
    }
  }

  fn field_mut(&mut self, name: &str) -> Option<&mut String> {
    match name {
      "name" => self.name.as_mut(),
      "email" => self.email.as_mut(),
      "password" => self.password.as_mut(),
      _ => None,
    }
  }
}

pub async fn register(
  State(state): State<AppState>,
  session: Session,
  Form(mut form): Form<RegisterForm>,
) -> Result<Response, AppError> {
  REGISTER_RULES.apply(&mut form)?;
  let name = form.name.unwrap_or_default();
  let email = form.email.unwrap_or_default();
  let password = form.password.unwrap_or_default();

  let users = state.users();
  if users.find_one(&Query::eq("email", &email)).await?.is_some() {
    let page = Page::new("Register", &session);
    return Ok(
      (
        StatusCode::BAD_REQUEST,
        Html(views::register(&page, Some("Email already exists"))),
      )
        .into_response(),
    );
  }

  let password = auth::hash_password(&password)
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hash error: {}", e)))?;
  let user = users
    .create(User {
      name,
      email,
      password,
    })
    .await?;
  tracing::info!(id = %user.id, "Registered user");

  Ok(redirect("/login", None))
}

pub async fn login_page(session: Session) -> Html<String> {
  Html(views::login(&Page::new("Login", &session), None))
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
  #[serde(default)]
  email: String,
  #[serde(default)]
  password: String,
}

pub async fn login(
  State(state): State<AppState>,
  session: Session,
  Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
  let user = state
    .users()
    .find_one(&Query::eq("email", &form.email))
    .await?;

  let user = match user {
    Some(user) if auth::verify_password(&form.password, &user.password) => user,
    _ => {
      let page = Page::new("Login", &session);
      return Ok(Html(views::login(&page, Some("Invalid credentials"))).into_response());
    }
  };

  // a fresh token on every login; the visitor's old one is dropped
  if let Some(old) = &session.token_hash {
    state.store.delete_session(old).await?;
  }
  let (_, cookie) = session::start(&state, Some(user.id)).await?;
  tracing::info!(id = %user.id, "User logged in");

  Ok(redirect("/", Some(cookie)))
}

/// Reads the cookie directly so a store outage still logs the visitor out.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
  if let Some(token) = session::read_cookie(&headers, session::SESSION_COOKIE) {
    let token_hash = auth::hash_session_token(&token);
    if let Err(e) = state.store.delete_session(&token_hash).await {
      tracing::error!("Failed to destroy session: {:#}", e);
    }
  }
  redirect("/login", Some(session::clear_session_cookie()))
}
