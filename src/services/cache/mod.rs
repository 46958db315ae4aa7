//! Time-boxed cache of provider responses.
//!
//! Each entry is `{payload, fetched_at}` and is fresh while
//! `now - fetched_at < ttl`. Payloads are stored as JSON in SQLite so a
//! restarted dashboard can render immediately from the last response.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A cached value with the instant it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        ttl > Duration::zero() && now - self.fetched_at < ttl
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).max(Duration::zero())
    }
}

pub struct ResponseCache<'a> {
    conn: &'a Connection,
}

impl<'a> ResponseCache<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Returns the entry for `key` if one exists and is still fresh.
    pub fn get<T: DeserializeOwned>(
        &self,
        key: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Option<CacheEntry<T>>> {
        Ok(self.get_any_age(key)?.filter(|entry| entry.is_fresh(now, ttl)))
    }

    /// Returns the entry for `key` regardless of age.
    pub fn get_any_age<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CacheEntry<T>>> {
        let row = self
            .conn
            .query_row(
                "SELECT payload, fetched_at FROM response_cache WHERE key = ?1",
                [key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .with_context(|| format!("Failed to read cache entry '{}'", key))?;

        let Some((payload, fetched_at)) = row else {
            return Ok(None);
        };

        let fetched_at = match DateTime::parse_from_rfc3339(&fetched_at) {
            Ok(parsed) => parsed.with_timezone(&Utc),
            Err(err) => {
                log::warn!("Dropping cache entry '{}' with bad timestamp: {}", key, err);
                self.invalidate(key)?;
                return Ok(None);
            }
        };

        match serde_json::from_str(&payload) {
            Ok(value) => Ok(Some(CacheEntry { value, fetched_at })),
            Err(err) => {
                // Payload shape changed between versions; treat as a miss.
                log::warn!("Dropping unreadable cache entry '{}': {}", key, err);
                self.invalidate(key)?;
                Ok(None)
            }
        }
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T, fetched_at: DateTime<Utc>) -> Result<()> {
        let payload = serde_json::to_string(value)
            .with_context(|| format!("Failed to serialize cache entry '{}'", key))?;

        self.conn
            .execute(
                "INSERT INTO response_cache (key, payload, fetched_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET payload = excluded.payload, fetched_at = excluded.fetched_at",
                params![key, payload, format_stamp(fetched_at)],
            )
            .with_context(|| format!("Failed to write cache entry '{}'", key))?;

        Ok(())
    }

    pub fn invalidate(&self, key: &str) -> Result<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM response_cache WHERE key = ?1", [key])
            .with_context(|| format!("Failed to delete cache entry '{}'", key))?;

        Ok(rows_affected > 0)
    }

    /// Deletes every entry that is no longer fresh. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>, ttl: Duration) -> Result<usize> {
        let cutoff = format_stamp(now - ttl.max(Duration::zero()));
        let removed = self
            .conn
            .execute("DELETE FROM response_cache WHERE fetched_at <= ?1", [cutoff])
            .context("Failed to purge expired cache entries")?;

        if removed > 0 {
            log::debug!("Purged {} expired cache entries", removed);
        }

        Ok(removed)
    }
}

// Fixed-width UTC stamps so SQL string comparison orders chronologically.
fn format_stamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}
