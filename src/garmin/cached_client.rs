//! Garmin client with transparent caching and retry.
//!
//! Composes the raw client with the cache store and the retry policy:
//! check cache first, fall through to a retry-wrapped remote fetch on a miss,
//! write the result back with a fresh expiration.

use chrono::NaiveDate;
use color_eyre::Result;
use serde_json::{json, Value};
use tracing::warn;

use crate::cache::{CacheStore, Category};
use crate::retry::RetryPolicy;

use super::client::GarminClient;

/// Garmin client wrapped with the cache store and retry policy.
///
/// `cache` is `None` when caching is disabled; every lookup then misses and
/// nothing is written back.
pub struct CachedGarminClient {
  inner: GarminClient,
  cache: Option<CacheStore>,
  retry: RetryPolicy,
}

impl CachedGarminClient {
  pub fn new(inner: GarminClient, cache: Option<CacheStore>, retry: RetryPolicy) -> Self {
    Self {
      inner,
      cache,
      retry,
    }
  }

  pub async fn connect(&mut self) -> Result<()> {
    self.inner.connect().await
  }

  /// Activities for a date range. Terminal remote failures propagate; the
  /// orchestrator decides whether the batch can continue without them.
  pub async fn get_activities(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
    let start_s = start.to_string();
    let end_s = end.to_string();
    let params = [("start_date", start_s.as_str()), ("end_date", end_s.as_str())];

    if let Some(cache) = &self.cache {
      if let Some(hit) = cache.get(Category::Activities, &params)? {
        return Ok(as_list(hit));
      }
    }

    let activities = self
      .retry
      .run("garmin activities", || self.inner.get_activities(start, end))
      .await?;

    if let Some(cache) = &self.cache {
      cache.set(
        Category::Activities,
        &params,
        &Value::Array(activities.clone()),
        None,
      )?;
    }

    Ok(activities)
  }

  /// Body composition for a date range. Degrades to an empty list on terminal
  /// remote failure; partial data must not abort the run.
  pub async fn get_body_composition(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
    let start_s = start.to_string();
    let end_s = end.to_string();
    let params = [("start_date", start_s.as_str()), ("end_date", end_s.as_str())];

    if let Some(cache) = &self.cache {
      if let Some(hit) = cache.get(Category::BodyComposition, &params)? {
        return Ok(as_list(hit));
      }
    }

    let composition = match self
      .retry
      .run("garmin body composition", || {
        self.inner.get_body_composition(start, end)
      })
      .await
    {
      Ok(records) => records,
      Err(e) => {
        warn!("body composition unavailable, continuing without it: {}", e);
        return Ok(Vec::new());
      }
    };

    if let Some(cache) = &self.cache {
      cache.set(
        Category::BodyComposition,
        &params,
        &Value::Array(composition.clone()),
        None,
      )?;
    }

    Ok(composition)
  }

  /// User profile. Falls back to a neutral profile on terminal remote failure.
  pub async fn get_user_profile(&self) -> Result<Value> {
    let params = [("user_id", "default")];

    if let Some(cache) = &self.cache {
      if let Some(hit) = cache.get(Category::UserProfile, &params)? {
        return Ok(hit);
      }
    }

    let profile = match self
      .retry
      .run("garmin user profile", || self.inner.get_user_profile())
      .await
    {
      Ok(profile) => profile,
      Err(e) => {
        warn!("user profile unavailable, using fallback: {}", e);
        return Ok(json!({"name": "Athlete", "unit_system": "metric"}));
      }
    };

    if let Some(cache) = &self.cache {
      cache.set(Category::UserProfile, &params, &profile, None)?;
    }

    Ok(profile)
  }

  /// Uncached passthroughs. Per-day wellness records and activity details are
  /// cheap relative to the ranged queries and already absorb their failures.
  pub async fn get_activity_details(&self, activity_id: &str) -> Result<Option<Value>> {
    self.inner.get_activity_details(activity_id).await
  }

  pub async fn get_sleep_data(&self, date: NaiveDate) -> Result<Option<Value>> {
    self.inner.get_sleep_data(date).await
  }

  pub async fn get_daily_stats(&self, date: NaiveDate) -> Result<Option<Value>> {
    self.inner.get_daily_stats(date).await
  }

  pub async fn get_heart_rates(&self, date: NaiveDate) -> Result<Option<Value>> {
    self.inner.get_heart_rates(date).await
  }

  pub async fn get_body_battery(&self, date: NaiveDate) -> Result<Option<Value>> {
    self.inner.get_body_battery(date).await
  }
}

fn as_list(value: Value) -> Vec<Value> {
  match value {
    Value::Array(items) => items,
    other => vec![other],
  }
}
