use serde::{Deserialize, Serialize};
use std::path::Path;

/// Expand environment variables in a string.
/// Supports $VAR_NAME and ${VAR_NAME} syntax; unset variables expand to "".
pub(crate) fn expand_env_vars(input: &str) -> String {
  let mut result = input.to_string();

  // ${VAR_NAME} first, it is the more specific form
  while let Some(start) = result.find("${") {
    let Some(end) = result[start..].find('}') else {
      break;
    };
    let var_name = &result[start + 2..start + end];
    let value = std::env::var(var_name).unwrap_or_default();
    result = format!(
      "{}{}{}",
      &result[..start],
      value,
      &result[start + end + 1..]
    );
  }

  let mut i = 0;
  while i < result.len() {
    if result[i..].starts_with('$') {
      let rest = &result[i + 1..];
      let var_len = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .count();
      if var_len > 0 {
        let var_name = &rest[..var_len];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..i], value, &rest[var_len..]);
        i += value.len();
        continue;
      }
    }
    i += result[i..].chars().next().map_or(1, char::len_utf8);
  }

  result
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
  #[serde(default)]
  pub server: ServerSection,
  #[serde(default)]
  pub database: DatabaseSection,
  #[serde(default)]
  pub uploads: UploadsSection,
  #[serde(default)]
  pub session: SessionSection,
  #[serde(default)]
  pub limits: LimitsSection,
  #[serde(default)]
  pub logging: LoggingSection,
  #[serde(default)]
  pub seed: SeedSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
  #[serde(default = "default_host")]
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,
}

fn default_host() -> String {
  "0.0.0.0".into()
}
fn default_port() -> u16 {
  3000
}

impl Default for ServerSection {
  fn default() -> Self {
    Self {
      host: default_host(),
      port: default_port(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
  /// SQLite file, or ":memory:"
  #[serde(default = "default_database_path")]
  pub path: String,
}
fn default_database_path() -> String {
  "cookbook.db".into()
}
impl Default for DatabaseSection {
  fn default() -> Self {
    Self {
      path: default_database_path(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsSection {
  #[serde(default = "default_uploads_dir")]
  pub dir: String,
}
fn default_uploads_dir() -> String {
  "./public/uploads".into()
}
impl Default for UploadsSection {
  fn default() -> Self {
    Self {
      dir: default_uploads_dir(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSection {
  #[serde(default = "default_ttl_days")]
  pub ttl_days: i64,
  /// Seconds between expired-session sweeps
  #[serde(default = "default_cleanup_interval_secs")]
  pub cleanup_interval_secs: u64,
}
fn default_ttl_days() -> i64 {
  7
}
fn default_cleanup_interval_secs() -> u64 {
  3600
}
impl Default for SessionSection {
  fn default() -> Self {
    Self {
      ttl_days: default_ttl_days(),
      cleanup_interval_secs: default_cleanup_interval_secs(),
    }
  }
}

impl SessionSection {
  pub fn ttl(&self) -> chrono::Duration {
    chrono::Duration::days(self.ttl_days.max(1))
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsSection {
  /// Maximum request body size in bytes, uploads included
  #[serde(default = "default_max_upload_size")]
  pub max_upload_size: usize,
}
fn default_max_upload_size() -> usize {
  10 * 1024 * 1024 // 10 MB
}
impl Default for LimitsSection {
  fn default() -> Self {
    Self {
      max_upload_size: default_max_upload_size(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
  #[serde(default = "default_level")]
  pub level: String,
}
fn default_level() -> String {
  "info".into()
}
impl Default for LoggingSection {
  fn default() -> Self {
    Self {
      level: default_level(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedSection {
  /// Insert the default categories when the collection is empty
  #[serde(default = "default_true")]
  pub categories: bool,
}
fn default_true() -> bool {
  true
}
impl Default for SeedSection {
  fn default() -> Self {
    Self { categories: true }
  }
}

impl ServerConfig {
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
    let content = std::fs::read_to_string(&path)?;
    Self::from_yaml(&content)
  }

  pub fn from_yaml(content: &str) -> Result<Self, anyhow::Error> {
    let expanded = expand_env_vars(content);
    Ok(serde_yaml::from_str(&expanded)?)
  }

  pub fn find_and_load() -> Result<Option<Self>, anyhow::Error> {
    for p in ["cookbook.yaml", "cookbook.yml"] {
      if Path::new(p).exists() {
        tracing::info!("Loading config from {}", p);
        return Ok(Some(Self::from_file(p)?));
      }
    }
    Ok(None)
  }

  pub fn address(&self) -> String {
    format!("{}:{}", self.server.host, self.server.port)
  }
}
