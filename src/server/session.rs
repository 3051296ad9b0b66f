//! Cookie-backed visitor sessions and the flash queue that rides on them.
//!
//! The cookie carries a random token; the store only ever sees its SHA-256.
//! A visitor gets a session on login, or lazily the first time a flash
//! message has to be queued for them.

use axum::{
  extract::FromRequestParts,
  http::{header, request::Parts, HeaderMap, HeaderValue},
};
use uuid::Uuid;

use super::auth::{generate_session_token, hash_session_token};
use super::error::AppError;
use super::state::AppState;

pub const SESSION_COOKIE: &str = "cookbook_sid";

/// Request-scoped session context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
  /// Present when the request carried a live session cookie
  pub token_hash: Option<String>,
  pub user_id: Option<Uuid>,
}

impl Session {
  pub fn is_authenticated(&self) -> bool {
    self.user_id.is_some()
  }
}

impl FromRequestParts<AppState> for Session {
  type Rejection = AppError;

  async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
    // already resolved by the login gate
    if let Some(session) = parts.extensions.get::<Session>() {
      return Ok(session.clone());
    }

    let Some(token) = read_cookie(&parts.headers, SESSION_COOKIE) else {
      return Ok(Session::default());
    };
    let token_hash = hash_session_token(&token);
    match state.store.get_session(&token_hash).await? {
      Some(record) => Ok(Session {
        token_hash: Some(token_hash),
        user_id: record.user_id,
      }),
      None => Ok(Session::default()),
    }
  }
}

/// Value of the named cookie across every `Cookie` header.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|s| s.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(k, _)| *k == name)
    .map(|(_, v)| v.to_string())
    .filter(|v| !v.is_empty())
}

pub fn session_cookie(token: &str, max_age_secs: i64) -> Result<HeaderValue, anyhow::Error> {
  let cookie = format!(
    "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
    SESSION_COOKIE, token, max_age_secs
  );
  Ok(HeaderValue::from_str(&cookie)?)
}

pub fn clear_session_cookie() -> HeaderValue {
  HeaderValue::from_static("cookbook_sid=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

/// Open a new session and return its token hash with the `Set-Cookie` value.
pub async fn start(
  state: &AppState,
  user_id: Option<Uuid>,
) -> Result<(String, HeaderValue), anyhow::Error> {
  let ttl = state.config.session.ttl();
  let token = generate_session_token();
  let token_hash = hash_session_token(&token);
  state
    .store
    .create_session(&token_hash, user_id, chrono::Utc::now() + ttl)
    .await?;
  Ok((token_hash, session_cookie(&token, ttl.num_seconds())?))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
  /// Recipe added or updated
  Submit,
  /// Contact message saved
  Contact,
  Errors,
}

impl FlashKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Submit => "infoSubmit",
      Self::Contact => "infoContact",
      Self::Errors => "infoErrors",
    }
  }
}

/// Queue messages for the next render. Returns a `Set-Cookie` value when a
/// session had to be started to hold them.
pub async fn flash(
  state: &AppState,
  session: &Session,
  kind: FlashKind,
  messages: &[String],
) -> Result<Option<HeaderValue>, anyhow::Error> {
  let (token_hash, cookie) = match &session.token_hash {
    Some(hash) => (hash.clone(), None),
    None => {
      let (hash, cookie) = start(state, None).await?;
      (hash, Some(cookie))
    }
  };
  for message in messages {
    state
      .store
      .push_flash(&token_hash, kind.as_str(), message)
      .await?;
  }
  Ok(cookie)
}

/// Pop every queued message of `kind`.
pub async fn take_flash(
  state: &AppState,
  session: &Session,
  kind: FlashKind,
) -> Result<Vec<String>, anyhow::Error> {
  match &session.token_hash {
    Some(hash) => state.store.take_flash(hash, kind.as_str()).await,
    None => Ok(Vec::new()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_read_cookie() {
    let mut headers = HeaderMap::new();
    headers.insert(
      header::COOKIE,
      HeaderValue::from_static("theme=dark; cookbook_sid=abc123; lang=en"),
    );
    assert_eq!(read_cookie(&headers, SESSION_COOKIE).as_deref(), Some("abc123"));
    assert_eq!(read_cookie(&headers, "missing"), None);
  }

  #[test]
  fn test_read_cookie_across_headers() {
    let mut headers = HeaderMap::new();
    headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
    headers.append(header::COOKIE, HeaderValue::from_static("cookbook_sid=xyz"));
    assert_eq!(read_cookie(&headers, SESSION_COOKIE).as_deref(), Some("xyz"));
  }

  #[test]
  fn test_empty_cookie_is_absent() {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, clear_session_cookie());
    assert_eq!(read_cookie(&headers, SESSION_COOKIE), None);
  }

  #[test]
  fn test_session_cookie_attributes() {
    let cookie = session_cookie("abc", 604800).unwrap();
    assert_eq!(
      cookie.to_str().unwrap(),
      "cookbook_sid=abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=604800"
    );
  }
}
