//! Recipe image uploads: file-name sanitising and writing into the upload
//! directory that is served under `/uploads`.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

pub const MAX_FILE_NAME_LENGTH: usize = 255;

#[derive(Debug, Error)]
pub enum UploadError {
  #[error("file name cannot be empty")]
  EmptyName,
  #[error("file name cannot contain '..'")]
  PathTraversal,
  #[error("file name cannot contain null bytes")]
  NullByte,
  #[error("file name cannot contain control characters")]
  ControlCharacter,
  #[error("file name too long: {0} bytes (max {MAX_FILE_NAME_LENGTH})")]
  TooLong(usize),
  #[error("failed to write upload: {0}")]
  Io(#[from] std::io::Error),
}

/// An image part received from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
  pub file_name: String,
  pub bytes: Bytes,
}

/// Checks a client-supplied file name and returns its final path component.
pub fn sanitize_file_name(raw: &str) -> Result<&str, UploadError> {
  let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();

  if name.is_empty() {
    return Err(UploadError::EmptyName);
  }
  if name.contains("..") {
    return Err(UploadError::PathTraversal);
  }
  if name.contains('\0') {
    return Err(UploadError::NullByte);
  }
  if name.chars().any(char::is_control) {
    return Err(UploadError::ControlCharacter);
  }
  if name.len() > MAX_FILE_NAME_LENGTH {
    return Err(UploadError::TooLong(name.len()));
  }
  Ok(name)
}

/// Owns the directory uploaded images are written to.
#[derive(Debug, Clone)]
pub struct UploadStore {
  dir: PathBuf,
}

impl UploadStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub async fn init(&self) -> Result<(), UploadError> {
    fs::create_dir_all(&self.dir).await?;
    Ok(())
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  /// `<epoch-millis><name>`, the name recorded on the recipe. The length
  /// limit applies to the prefixed name.
  pub fn stored_name(&self, file: &UploadedFile) -> Result<String, UploadError> {
    let name = sanitize_file_name(&file.file_name)?;
    let stored = format!("{}{}", chrono::Utc::now().timestamp_millis(), name);
    if stored.len() > MAX_FILE_NAME_LENGTH {
      return Err(UploadError::TooLong(stored.len()));
    }
    Ok(stored)
  }

  /// Write the bytes under `stored_name`. An existing file is overwritten.
  pub async fn write(&self, stored_name: &str, bytes: &[u8]) -> Result<PathBuf, UploadError> {
    let name = sanitize_file_name(stored_name)?;
    let path = self.dir.join(name);

    let mut file = File::create(&path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;

    tracing::debug!(path = %path.display(), size = bytes.len(), "Stored upload");
    Ok(path)
  }
}
