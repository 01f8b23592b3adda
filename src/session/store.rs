//! Durable client-side token storage.
//!
//! The token lives under a single key (`admin_token`) in a small SQLite
//! key/value table. Absence of the key means "not logged in".

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{ApiError, Result};

/// Storage key for the bearer token.
pub const TOKEN_KEY: &str = "admin_token";

/// Trait for durable token storage backends.
pub trait TokenStore: Send + Sync {
  /// Read the stored token, if any.
  fn token(&self) -> Result<Option<String>>;

  /// Persist a token, replacing any previous one.
  fn set_token(&self, token: &str) -> Result<()>;

  /// Remove the stored token. Removing an absent token is not an error.
  fn clear_token(&self) -> Result<()>;
}

/// In-memory store, used in tests and when persistence is disabled.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
  token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a store that already holds a token.
  pub fn with_token(token: impl Into<String>) -> Self {
    Self {
      token: Mutex::new(Some(token.into())),
    }
  }
}

fn poisoned<E: std::fmt::Display>(e: E) -> ApiError {
  ApiError::Storage(format!("Lock poisoned: {}", e))
}

impl TokenStore for MemoryTokenStore {
  fn token(&self) -> Result<Option<String>> {
    Ok(self.token.lock().map_err(poisoned)?.clone())
  }

  fn set_token(&self, token: &str) -> Result<()> {
    *self.token.lock().map_err(poisoned)? = Some(token.to_string());
    Ok(())
  }

  fn clear_token(&self) -> Result<()> {
    *self.token.lock().map_err(poisoned)? = None;
    Ok(())
  }
}

/// SQLite-backed key/value store.
pub struct SqliteTokenStore {
  conn: Mutex<Connection>,
}

impl SqliteTokenStore {
  /// Open the store at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;
    Self::open_at(&path)
  }

  /// Open (or create) the store at an explicit path.
  pub fn open_at(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        ApiError::Storage(format!("Failed to create state directory: {}", e))
      })?;
    }

    let conn = Connection::open(path).map_err(|e| {
      ApiError::Storage(format!(
        "Failed to open state database at {}: {}",
        path.display(),
        e
      ))
    })?;

    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;

    Ok(store)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| ApiError::Storage("Could not determine data directory".to_string()))?;

    Ok(data_dir.join("mpadmin").join("state.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self.conn.lock().map_err(poisoned)?;

    conn
      .execute_batch(STATE_SCHEMA)
      .map_err(|e| ApiError::Storage(format!("Failed to run state migrations: {}", e)))?;

    Ok(())
  }

  fn get(&self, key: &str) -> Result<Option<String>> {
    let conn = self.conn.lock().map_err(poisoned)?;

    conn
      .query_row(
        "SELECT value FROM client_state WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| ApiError::Storage(format!("Failed to read {}: {}", key, e)))
  }
}

const STATE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS client_state (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl TokenStore for SqliteTokenStore {
  fn token(&self) -> Result<Option<String>> {
    // An empty value is treated the same as a missing key
    Ok(self.get(TOKEN_KEY)?.filter(|t| !t.is_empty()))
  }

  fn set_token(&self, token: &str) -> Result<()> {
    let conn = self.conn.lock().map_err(poisoned)?;

    conn
      .execute(
        "INSERT OR REPLACE INTO client_state (key, value, updated_at)
         VALUES (?, ?, datetime('now'))",
        params![TOKEN_KEY, token],
      )
      .map_err(|e| ApiError::Storage(format!("Failed to store token: {}", e)))?;

    Ok(())
  }

  fn clear_token(&self) -> Result<()> {
    let conn = self.conn.lock().map_err(poisoned)?;

    conn
      .execute(
        "DELETE FROM client_state WHERE key = ?",
        params![TOKEN_KEY],
      )
      .map_err(|e| ApiError::Storage(format!("Failed to clear token: {}", e)))?;

    Ok(())
  }
}
