//! SQLite-backed cache store with per-entry TTL expiration.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::key::{cache_key, Category};

/// Schema for the three category tables. The `expires_at` indexes keep
/// expiration scans cheap.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS activities_cache (
    cache_key TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL,
    expires_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS body_composition_cache (
    cache_key TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL,
    expires_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS user_profile_cache (
    cache_key TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL,
    expires_at TIMESTAMP NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_activities_expires
    ON activities_cache(expires_at);
CREATE INDEX IF NOT EXISTS idx_body_expires
    ON body_composition_cache(expires_at);
CREATE INDEX IF NOT EXISTS idx_profile_expires
    ON user_profile_cache(expires_at);
"#;

/// Per-category entry counts.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryStats {
  pub total: u64,
  pub valid: u64,
  pub expired: u64,
}

/// Live cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
  pub activities: CategoryStats,
  pub body_composition: CategoryStats,
  pub user_profiles: CategoryStats,
  pub ttl_hours: i64,
  pub cache_dir: String,
  pub db_size_bytes: u64,
}

/// Durable, namespaced, TTL-expiring key-value store for Garmin data.
///
/// One SQLite file per cache directory. Multiple store instances may point at
/// the same directory; SQLite's own locking serializes writers.
pub struct CacheStore {
  cache_dir: PathBuf,
  db_path: PathBuf,
  ttl: Duration,
}

impl CacheStore {
  /// Open (or create) the store under `cache_dir` with a base TTL in hours.
  ///
  /// Fails if the directory cannot be created; that error is not retried.
  pub fn open(cache_dir: &Path, ttl_hours: i64) -> Result<Self> {
    std::fs::create_dir_all(cache_dir)
      .map_err(|e| eyre!("Failed to create cache directory {}: {}", cache_dir.display(), e))?;

    let store = Self {
      cache_dir: cache_dir.to_path_buf(),
      db_path: cache_dir.join("garmin_cache.db"),
      ttl: Duration::hours(ttl_hours),
    };

    let conn = store.connection()?;
    conn
      .execute_batch(SCHEMA)
      .map_err(|e| eyre!("Failed to initialize cache schema: {}", e))?;
    debug!("cache database ready at {}", store.db_path.display());

    Ok(store)
  }

  /// Connections are scoped to a single logical operation and released on
  /// every exit path when dropped.
  fn connection(&self) -> Result<Connection> {
    Connection::open(&self.db_path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", self.db_path.display(), e))
  }

  /// Look up a payload. Returns `Ok(None)` on a miss; an expired entry is
  /// deleted as a side effect of the read. Storage failures are errors, never
  /// a silent miss.
  pub fn get(&self, category: Category, params: &[(&str, &str)]) -> Result<Option<Value>> {
    let key = cache_key(category, params);
    let conn = self.connection()?;

    let row: Option<(String, String)> = conn
      .query_row(
        &format!(
          "SELECT data, expires_at FROM {} WHERE cache_key = ?",
          category.table()
        ),
        params![key],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()
      .map_err(|e| eyre!("Cache read failed for {}: {}", key, e))?;

    let Some((data, expires_at)) = row else {
      info!(category = category.name(), key = %key, "cache MISS");
      return Ok(None);
    };

    let expires = parse_timestamp(&expires_at)?;
    if Utc::now() < expires {
      info!(category = category.name(), key = %key, "cache HIT");
      let payload = serde_json::from_str(&data)
        .map_err(|e| eyre!("Corrupt cache entry {}: {}", key, e))?;
      return Ok(Some(payload));
    }

    // Lazy expiration: drop the stale entry on read.
    info!(category = category.name(), key = %key, "cache EXPIRED");
    conn
      .execute(
        &format!("DELETE FROM {} WHERE cache_key = ?", category.table()),
        params![key],
      )
      .map_err(|e| eyre!("Failed to delete expired entry {}: {}", key, e))?;

    Ok(None)
  }

  /// Upsert a payload. The entry is immediately readable via `get` until
  /// `created_at + ttl` passes.
  pub fn set(
    &self,
    category: Category,
    params: &[(&str, &str)],
    payload: &Value,
    ttl_override: Option<Duration>,
  ) -> Result<()> {
    let key = cache_key(category, params);
    let ttl = ttl_override.unwrap_or_else(|| category.ttl(self.ttl));
    let created_at = Utc::now();
    let expires_at = created_at + ttl;

    let data = serde_json::to_string(payload)
      .map_err(|e| eyre!("Failed to serialize payload for {}: {}", key, e))?;

    let conn = self.connection()?;
    conn
      .execute(
        &format!(
          "INSERT OR REPLACE INTO {} (cache_key, data, created_at, expires_at)
           VALUES (?, ?, ?, ?)",
          category.table()
        ),
        params![key, data, timestamp(created_at), timestamp(expires_at)],
      )
      .map_err(|e| eyre!("Cache write failed for {}: {}", key, e))?;

    debug!(
      category = category.name(),
      key = %key,
      expires_at = %expires_at,
      "cached entry"
    );
    Ok(())
  }

  /// Delete every expired entry across all categories. Returns the total
  /// deleted count; a second call without new writes returns zero.
  pub fn clear_expired(&self) -> Result<usize> {
    let now = timestamp(Utc::now());
    let conn = self.connection()?;

    let mut deleted = 0;
    for category in Category::ALL {
      deleted += conn
        .execute(
          &format!("DELETE FROM {} WHERE expires_at <= ?", category.table()),
          params![now],
        )
        .map_err(|e| eyre!("Failed to clear expired {}: {}", category.name(), e))?;
    }

    if deleted > 0 {
      info!(deleted, "removed expired cache entries");
    }
    Ok(deleted)
  }

  /// Delete every entry in every category regardless of expiration.
  pub fn clear_all(&self) -> Result<()> {
    let conn = self.connection()?;
    for category in Category::ALL {
      conn
        .execute(&format!("DELETE FROM {}", category.table()), [])
        .map_err(|e| eyre!("Failed to clear {}: {}", category.name(), e))?;
    }
    info!("cache cleared");
    Ok(())
  }

  /// Live per-category counts plus store configuration and on-disk size.
  pub fn stats(&self) -> Result<CacheStats> {
    let conn = self.connection()?;
    let now = timestamp(Utc::now());

    // Both counts come from one statement so a concurrent writer (another
    // store instance on the same directory) can never make valid > total.
    let category_stats = |category: Category| -> Result<CategoryStats> {
      let (total, valid): (u64, u64) = conn
        .query_row(
          &format!(
            "SELECT COUNT(*), COALESCE(SUM(expires_at > ?), 0) FROM {}",
            category.table()
          ),
          params![now],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(|e| eyre!("Failed to count {}: {}", category.name(), e))?;

      Ok(CategoryStats {
        total,
        valid,
        expired: total.saturating_sub(valid),
      })
    };

    Ok(CacheStats {
      activities: category_stats(Category::Activities)?,
      body_composition: category_stats(Category::BodyComposition)?,
      user_profiles: category_stats(Category::UserProfile)?,
      ttl_hours: self.ttl.num_hours(),
      cache_dir: self.cache_dir.display().to_string(),
      db_size_bytes: std::fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0),
    })
  }
}

/// Fixed-width RFC 3339 so timestamps also compare correctly as strings in SQL.
fn timestamp(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| eyre!("Failed to parse timestamp '{}': {}", s, e))
}
