//! Password hashing, session tokens and the login gate.

use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use axum::{extract::Request, middleware::Next, response::Response};
use sha2::{Digest, Sha256};

use super::handlers::redirect;
use super::session::Session;

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  let argon2 = Argon2::default();
  let hash = argon2.hash_password(password.as_bytes(), &salt)?;
  Ok(hash.to_string())
}

/// Verify a password against an Argon2 hash
pub fn verify_password(password: &str, hash: &str) -> bool {
  let parsed_hash = match PasswordHash::new(hash) {
    Ok(h) => h,
    Err(_) => return false,
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .is_ok()
}

/// Generate a random session token
pub fn generate_session_token() -> String {
  use rand::Rng;
  let mut rng = rand::thread_rng();
  let bytes: [u8; 32] = rng.gen();
  hex::encode(bytes)
}

/// Hash a session token for storage
pub fn hash_session_token(token: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(token.as_bytes());
  hex::encode(hasher.finalize())
}

/// Gate for the recipe write routes: visitors without a logged-in session
/// are sent to `/login`.
pub async fn require_login(session: Session, mut req: Request, next: Next) -> Response {
  if !session.is_authenticated() {
    tracing::debug!(path = %req.uri().path(), "Login required, redirecting");
    return redirect("/login", None);
  }
  req.extensions_mut().insert(session);
  next.run(req).await
}
