//! Checks for the few values that get spliced into SQL text.
//!
//! Everything else reaches SQLite as a bound parameter. Collection names and
//! JSON field names end up inside `json_extract(data, '$.<field>')` and the
//! `WHERE collection = ...` clause, so they are restricted to plain
//! identifiers. Paging numbers are bounded.

use thiserror::Error;

pub const MAX_IDENTIFIER_LENGTH: usize = 64;
pub const MAX_LIMIT: usize = 10_000;
pub const MAX_OFFSET: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
  #[error("identifier cannot be empty")]
  Empty,
  #[error("identifier too long: {0} > {MAX_IDENTIFIER_LENGTH}")]
  TooLong(usize),
  #[error("invalid character {0:?} in identifier")]
  InvalidChar(char),
  #[error("identifier must start with a letter or underscore, got {0:?}")]
  InvalidStart(char),
  #[error("limit {0} exceeds maximum {MAX_LIMIT}")]
  LimitTooLarge(usize),
  #[error("offset {0} exceeds maximum {MAX_OFFSET}")]
  OffsetTooLarge(usize),
}

/// Collection names: lowercase ASCII letters, digits and underscores.
pub fn validate_collection_name(name: &str) -> Result<(), SanitizeError> {
  check_identifier(name, |c| {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
  })
}

/// Top-level document field names: ASCII letters, digits and underscores.
pub fn validate_field_name(name: &str) -> Result<(), SanitizeError> {
  check_identifier(name, |c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn validate_window(limit: Option<usize>, offset: Option<usize>) -> Result<(), SanitizeError> {
  match (limit, offset) {
    (Some(l), _) if l > MAX_LIMIT => Err(SanitizeError::LimitTooLarge(l)),
    (_, Some(o)) if o > MAX_OFFSET => Err(SanitizeError::OffsetTooLarge(o)),
    _ => Ok(()),
  }
}

fn check_identifier(name: &str, allowed: impl Fn(char) -> bool) -> Result<(), SanitizeError> {
  let Some(first) = name.chars().next() else {
    return Err(SanitizeError::Empty);
  };
  if name.len() > MAX_IDENTIFIER_LENGTH {
    return Err(SanitizeError::TooLong(name.len()));
  }
  if !(first.is_ascii_alphabetic() || first == '_') {
    return Err(SanitizeError::InvalidStart(first));
  }
  match name.chars().find(|c| !allowed(*c)) {
    Some(c) => Err(SanitizeError::InvalidChar(c)),
    None => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_collection_names() {
    assert!(validate_collection_name("recipes").is_ok());
    assert!(validate_collection_name("contact_messages").is_ok());
    assert_eq!(
      validate_collection_name("Recipes"),
      Err(SanitizeError::InvalidChar('R'))
    );
    assert_eq!(validate_collection_name(""), Err(SanitizeError::Empty));
    assert!(validate_collection_name("recipes; DROP TABLE documents").is_err());
  }

  #[test]
  fn test_field_names() {
    assert!(validate_field_name("category").is_ok());
    assert!(validate_field_name("createdAt").is_ok());
    assert_eq!(
      validate_field_name("1st"),
      Err(SanitizeError::InvalidStart('1'))
    );
    assert_eq!(
      validate_field_name("name') OR 1=1 --"),
      Err(SanitizeError::InvalidChar('\''))
    );
    assert!(validate_field_name(&"a".repeat(65)).is_err());
  }

  #[test]
  fn test_window_bounds() {
    assert!(validate_window(Some(20), Some(0)).is_ok());
    assert!(validate_window(None, None).is_ok());
    assert_eq!(
      validate_window(Some(MAX_LIMIT + 1), None),
      Err(SanitizeError::LimitTooLarge(MAX_LIMIT + 1))
    );
    assert_eq!(
      validate_window(None, Some(MAX_OFFSET + 1)),
      Err(SanitizeError::OffsetTooLarge(MAX_OFFSET + 1))
    );
  }
}
