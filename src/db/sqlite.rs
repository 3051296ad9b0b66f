use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension};
use tokio_rusqlite::Connection;
use uuid::Uuid;

use super::backend::{DocumentStore, SessionRecord};
use super::sanitize::{validate_collection_name, validate_field_name, validate_window};
use crate::types::{Document, Filter, Query, SortOrder};

const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA temp_store = MEMORY;
"#;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    collection TEXT NOT NULL,
    data TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, seq);

CREATE VIRTUAL TABLE IF NOT EXISTS recipe_search USING fts5(
    doc_id UNINDEXED,
    name,
    description,
    tokenize = 'porter unicode61 remove_diacritics 0'
);

CREATE TRIGGER IF NOT EXISTS recipe_search_insert AFTER INSERT ON documents
WHEN NEW.collection = 'recipes' BEGIN
    INSERT INTO recipe_search (doc_id, name, description)
    VALUES (NEW.id, json_extract(NEW.data, '$.name'), json_extract(NEW.data, '$.description'));
END;

CREATE TRIGGER IF NOT EXISTS recipe_search_update AFTER UPDATE OF data ON documents
WHEN NEW.collection = 'recipes' BEGIN
    DELETE FROM recipe_search WHERE doc_id = OLD.id;
    INSERT INTO recipe_search (doc_id, name, description)
    VALUES (NEW.id, json_extract(NEW.data, '$.name'), json_extract(NEW.data, '$.description'));
END;

CREATE TRIGGER IF NOT EXISTS recipe_search_delete AFTER DELETE ON documents
WHEN OLD.collection = 'recipes' BEGIN
    DELETE FROM recipe_search WHERE doc_id = OLD.id;
END;

CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id TEXT,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
) WITHOUT ROWID;
CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);

CREATE TABLE IF NOT EXISTS flash_messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    token_hash TEXT NOT NULL,
    kind TEXT NOT NULL,
    message TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_flash_messages_token ON flash_messages(token_hash, kind);
"#;

const DOCUMENT_COLUMNS: &str = "id, collection, data, created_at, updated_at";

pub struct SqliteBackend {
  conn: Connection,
}

impl SqliteBackend {
  pub async fn new(path: &str) -> Result<Self, anyhow::Error> {
    let conn = if path == ":memory:" {
      Connection::open_in_memory().await?
    } else {
      Connection::open(path).await?
    };

    conn
      .call(|conn| conn.execute_batch(PRAGMAS).map_err(|e| e.into()))
      .await?;

    Ok(Self { conn })
  }

  pub async fn in_memory() -> Result<Self, anyhow::Error> {
    Self::new(":memory:").await
  }
}

#[async_trait]
impl DocumentStore for SqliteBackend {
  async fn init_schema(&self) -> Result<(), anyhow::Error> {
    self
      .conn
      .call(|conn| conn.execute_batch(SCHEMA).map_err(|e| e.into()))
      .await?;
    tracing::info!("SQLite schema initialized");
    Ok(())
  }

  async fn insert(
    &self,
    collection: &str,
    data: serde_json::Value,
  ) -> Result<Document, anyhow::Error> {
    validate_collection_name(collection)?;

    let id = Uuid::new_v4();
    // stored with microsecond precision
    let now = Utc::now().trunc_subsecs(6);
    let data_str = serde_json::to_string(&data)?;
    let now_str = timestamp(now);
    let col = collection.to_string();
    let id_str = id.to_string();

    self
      .conn
      .call(move |conn| {
        conn
          .execute(
            "INSERT INTO documents (id, collection, data, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
            params![id_str, col, data_str, now_str],
          )
          .map_err(|e| e.into())
      })
      .await?;

    Ok(Document {
      id,
      collection: collection.into(),
      data,
      created_at: now,
      updated_at: now,
    })
  }

  async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, anyhow::Error> {
    validate_collection_name(collection)?;

    let col = collection.to_string();
    let id_str = id.to_string();

    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(&format!(
          "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE collection = ?1 AND id = ?2"
        ))?;
        Ok(stmt.query_row(params![col, id_str], row_to_doc).optional()?)
      })
      .await
      .map_err(|e| anyhow::anyhow!("{}", e))
  }

  async fn update(
    &self,
    collection: &str,
    id: Uuid,
    data: serde_json::Value,
  ) -> Result<Option<Document>, anyhow::Error> {
    validate_collection_name(collection)?;

    let col = collection.to_string();
    let id_str = id.to_string();
    let data_str = serde_json::to_string(&data)?;
    let now_str = timestamp(Utc::now());

    self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE documents SET data = ?1, updated_at = ?2 WHERE collection = ?3 AND id = ?4",
          params![data_str, now_str, col, id_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }

        let mut stmt = conn.prepare_cached(&format!(
          "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1"
        ))?;
        Ok(stmt.query_row(params![id_str], row_to_doc).optional()?)
      })
      .await
      .map_err(|e| anyhow::anyhow!("{}", e))
  }

  async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, anyhow::Error> {
    validate_collection_name(collection)?;
    validate_window(query.limit, query.offset)?;

    let Some((clause, mut args)) = filter_clause(&query.filter)? else {
      return Ok(Vec::new());
    };
    args.insert(0, collection.to_string());

    let mut sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE collection = ?1");
    sql.push_str(&clause);
    sql.push_str(match query.order {
      SortOrder::Inserted => " ORDER BY seq ASC",
      SortOrder::Newest => " ORDER BY seq DESC",
    });
    // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded
    match (query.limit, query.offset) {
      (Some(l), Some(o)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", l, o)),
      (Some(l), None) => sql.push_str(&format!(" LIMIT {}", l)),
      (None, Some(o)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", o)),
      (None, None) => {}
    }

    let capacity = query.limit.unwrap_or(32);
    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(&sql)?;
        let mut rows = stmt.query(params_from_iter(args.iter()))?;
        let mut docs = Vec::with_capacity(capacity);
        while let Some(row) = rows.next()? {
          docs.push(row_to_doc(row)?);
        }
        Ok(docs)
      })
      .await
      .map_err(|e| anyhow::anyhow!("{}", e))
  }

  async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, anyhow::Error> {
    validate_collection_name(collection)?;

    let Some((clause, mut args)) = filter_clause(filter)? else {
      return Ok(0);
    };
    args.insert(0, collection.to_string());
    let sql = format!("SELECT COUNT(*) FROM documents WHERE collection = ?1{clause}");

    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(&sql)?;
        let n: i64 = stmt.query_row(params_from_iter(args.iter()), |row| row.get(0))?;
        Ok(n.max(0) as u64)
      })
      .await
      .map_err(|e| anyhow::anyhow!("{}", e))
  }

  async fn create_session(
    &self,
    token_hash: &str,
    user_id: Option<Uuid>,
    expires_at: DateTime<Utc>,
  ) -> Result<SessionRecord, anyhow::Error> {
    let now = Utc::now().trunc_subsecs(6);
    let hash = token_hash.to_string();
    let user = user_id.map(|u| u.to_string());
    let created_str = timestamp(now);
    let expires_str = timestamp(expires_at);

    self
      .conn
      .call(move |conn| {
        conn
          .execute(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![hash, user, created_str, expires_str],
          )
          .map_err(|e| e.into())
      })
      .await?;

    Ok(SessionRecord {
      token_hash: token_hash.to_string(),
      user_id,
      created_at: now,
      expires_at,
    })
  }

  async fn get_session(&self, token_hash: &str) -> Result<Option<SessionRecord>, anyhow::Error> {
    let hash = token_hash.to_string();
    let now_str = timestamp(Utc::now());

    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(
          "SELECT token_hash, user_id, created_at, expires_at FROM sessions WHERE token_hash = ?1 AND expires_at > ?2",
        )?;
        let session = stmt
          .query_row(params![hash, now_str], |row| {
            let user_id: Option<String> = row.get(1)?;
            let created_str: String = row.get(2)?;
            let expires_str: String = row.get(3)?;
            Ok(SessionRecord {
              token_hash: row.get(0)?,
              user_id: user_id.and_then(|s| s.parse().ok()),
              created_at: parse_timestamp(&created_str),
              expires_at: parse_timestamp(&expires_str),
            })
          })
          .optional()?;
        Ok(session)
      })
      .await
      .map_err(|e| anyhow::anyhow!("{}", e))
  }

  async fn delete_session(&self, token_hash: &str) -> Result<bool, anyhow::Error> {
    let hash = token_hash.to_string();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM flash_messages WHERE token_hash = ?1",
          params![hash],
        )?;
        let removed = tx.execute("DELETE FROM sessions WHERE token_hash = ?1", params![hash])?;
        tx.commit()?;
        Ok(removed > 0)
      })
      .await
      .map_err(|e| anyhow::anyhow!("{}", e))
  }

  async fn cleanup_expired_sessions(&self) -> Result<u64, anyhow::Error> {
    let now_str = timestamp(Utc::now());
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM flash_messages WHERE token_hash IN (SELECT token_hash FROM sessions WHERE expires_at <= ?1)",
          params![now_str],
        )?;
        let removed = tx.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now_str])?;
        tx.commit()?;
        Ok(removed as u64)
      })
      .await
      .map_err(|e| anyhow::anyhow!("{}", e))
  }

  async fn push_flash(
    &self,
    token_hash: &str,
    kind: &str,
    message: &str,
  ) -> Result<(), anyhow::Error> {
    let hash = token_hash.to_string();
    let kind = kind.to_string();
    let message = message.to_string();
    let now_str = timestamp(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO flash_messages (token_hash, kind, message, created_at) VALUES (?1, ?2, ?3, ?4)",
          params![hash, kind, message, now_str],
        )?;
        Ok(())
      })
      .await
      .map_err(|e| anyhow::anyhow!("{}", e))
  }

  async fn take_flash(&self, token_hash: &str, kind: &str) -> Result<Vec<String>, anyhow::Error> {
    let hash = token_hash.to_string();
    let kind = kind.to_string();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let messages = {
          let mut stmt = tx.prepare_cached(
            "SELECT message FROM flash_messages WHERE token_hash = ?1 AND kind = ?2 ORDER BY id",
          )?;
          let rows = stmt.query_map(params![hash, kind], |row| row.get::<_, String>(0))?;
          rows.collect::<Result<Vec<_>, _>>()?
        };
        if !messages.is_empty() {
          tx.execute(
            "DELETE FROM flash_messages WHERE token_hash = ?1 AND kind = ?2",
            params![hash, kind],
          )?;
        }
        tx.commit()?;
        Ok(messages)
      })
      .await
      .map_err(|e| anyhow::anyhow!("{}", e))
  }
}

/// SQL fragment and bound values for a filter. The fragment starts with
/// `AND` and numbers its parameters from `?2` (`?1` is the collection).
/// `None` means the filter cannot match anything.
fn filter_clause(filter: &Filter) -> Result<Option<(String, Vec<String>)>, anyhow::Error> {
  match filter {
    Filter::All => Ok(Some((String::new(), Vec::new()))),
    Filter::Eq { field, value } => {
      validate_field_name(field)?;
      Ok(Some((
        format!(" AND json_extract(data, '$.{}') = ?2", field),
        vec![value.clone()],
      )))
    }
    Filter::Text { term } => Ok(match_expression(term).map(|expr| {
      (
        " AND id IN (SELECT doc_id FROM recipe_search WHERE recipe_search MATCH ?2)".to_string(),
        vec![expr],
      )
    })),
  }
}

/// Turn free text into an FTS5 query: each word quoted, words OR-ed.
/// Punctuation only separates words, so user input cannot inject FTS syntax.
pub(crate) fn match_expression(term: &str) -> Option<String> {
  let words: Vec<String> = term
    .split(|c: char| !c.is_alphanumeric())
    .filter(|w| !w.is_empty())
    .map(|w| format!("\"{}\"", w))
    .collect();
  if words.is_empty() {
    None
  } else {
    Some(words.join(" OR "))
  }
}

/// Fixed-width UTC timestamps so that string comparison is time comparison
fn timestamp(at: DateTime<Utc>) -> String {
  at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
  DateTime::parse_from_rfc3339(s)
    .map(|d| d.with_timezone(&Utc))
    .unwrap_or_else(|_| Utc::now())
}

#[inline]
fn row_to_doc(row: &rusqlite::Row) -> Result<Document, rusqlite::Error> {
  let id_str: String = row.get(0)?;
  let data_str: String = row.get(2)?;
  let created_str: String = row.get(3)?;
  let updated_str: String = row.get(4)?;
  Ok(Document {
    id: id_str.parse().unwrap_or_default(),
    collection: row.get(1)?,
    data: serde_json::from_str(&data_str).unwrap_or(serde_json::Value::Null),
    created_at: parse_timestamp(&created_str),
    updated_at: parse_timestamp(&updated_str),
  })
}
