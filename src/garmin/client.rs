//! Garmin Connect API client.

use chrono::NaiveDate;
use color_eyre::{eyre::eyre, Result};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::normalize::normalize_body_composition;

const AUTH_URL: &str = "https://connect.garmin.com/services/auth/login";
const API_BASE: &str = "https://connectapi.garmin.com";
const USER_AGENT: &str = "trainsight/0.1";

struct Session {
  token: String,
}

/// Client for the Garmin Connect API.
///
/// `connect` must be called before any data method; data methods on a
/// disconnected client log an error and return empty/neutral values instead
/// of failing, so the orchestrator can treat missing categories as "no data".
pub struct GarminClient {
  http: reqwest::Client,
  email: String,
  password: String,
  session: Option<Session>,
}

impl GarminClient {
  pub fn new(email: String, password: String) -> Result<Self> {
    let http = reqwest::Client::builder()
      .user_agent(USER_AGENT)
      .timeout(std::time::Duration::from_secs(30))
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self {
      http,
      email,
      password,
      session: None,
    })
  }

  /// Establish a session with Garmin Connect.
  pub async fn connect(&mut self) -> Result<()> {
    info!("connecting to Garmin Connect...");

    let response = self
      .http
      .post(AUTH_URL)
      .json(&json!({
        "username": self.email,
        "password": self.password,
      }))
      .send()
      .await
      .map_err(|e| eyre!("Garmin login request failed: {}", e))?
      .error_for_status()
      .map_err(|e| eyre!("Garmin login rejected: {}", e))?;

    let body: Value = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse Garmin login response: {}", e))?;

    let token = body
      .get("access_token")
      .and_then(Value::as_str)
      .ok_or_else(|| eyre!("Garmin login response did not include a token"))?
      .to_string();

    self.session = Some(Session { token });
    info!("connected to Garmin Connect");
    Ok(())
  }

  fn token(&self) -> Option<&str> {
    self.session.as_ref().map(|s| s.token.as_str())
  }

  async fn get_json(&self, path: &str, token: &str) -> Result<Value> {
    self
      .http
      .get(format!("{}{}", API_BASE, path))
      .bearer_auth(token)
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", path, e))?
      .error_for_status()
      .map_err(|e| eyre!("Request to {} failed: {}", path, e))?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse response from {}: {}", path, e))
  }

  /// Activities within a date range (inclusive). Remote failures propagate so
  /// the retry wrapper above can absorb the transient ones.
  pub async fn get_activities(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
    let Some(token) = self.token() else {
      error!("client not connected");
      return Ok(Vec::new());
    };

    info!("fetching activities ({} to {})...", start, end);
    let path = format!(
      "/activitylist-service/activities/search/activities?startDate={}&endDate={}&start=0&limit=200",
      start, end
    );
    let body = self.get_json(&path, token).await?;

    let activities = match body {
      Value::Array(items) => items,
      other => {
        warn!("unexpected activities shape: {}", other);
        Vec::new()
      }
    };

    info!("{} activities fetched", activities.len());
    Ok(activities)
  }

  /// Full details for a single activity. Failures here are absorbed; one
  /// missing detail record must not abort the batch.
  pub async fn get_activity_details(&self, activity_id: &str) -> Result<Option<Value>> {
    let Some(token) = self.token() else {
      error!("client not connected");
      return Ok(None);
    };

    let path = format!("/activity-service/activity/{}", activity_id);
    match self.get_json(&path, token).await {
      Ok(details) => Ok(Some(details)),
      Err(e) => {
        warn!("failed to fetch details for activity {}: {}", activity_id, e);
        Ok(None)
      }
    }
  }

  /// User profile (name, unit system, settings when available).
  pub async fn get_user_profile(&self) -> Result<Value> {
    let Some(token) = self.token() else {
      error!("client not connected");
      return Ok(json!({}));
    };

    info!("fetching user profile...");
    let social = self
      .get_json("/userprofile-service/socialProfile", token)
      .await?;

    let mut profile = json!({
      "name": social.get("displayName").and_then(Value::as_str).unwrap_or("Athlete"),
      "unit_system": social.get("measurementSystem").and_then(Value::as_str).unwrap_or("metric"),
    });

    // Settings are optional; their absence is not a failure.
    if let Ok(settings) = self
      .get_json("/userprofile-service/userprofile/user-settings", token)
      .await
    {
      profile["settings"] = settings;
    }

    Ok(profile)
  }

  /// Body composition measurements within a date range, normalized into a
  /// flat list regardless of the upstream response shape.
  pub async fn get_body_composition(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
    let Some(token) = self.token() else {
      error!("client not connected");
      return Ok(Vec::new());
    };

    info!("fetching body composition ({} to {})...", start, end);
    let path = format!(
      "/weight-service/weight/dateRange?startDate={}&endDate={}",
      start, end
    );
    let body = self.get_json(&path, token).await?;

    Ok(normalize_body_composition(body))
  }

  /// Sleep data for a single day. Absorbed on failure.
  pub async fn get_sleep_data(&self, date: NaiveDate) -> Result<Option<Value>> {
    self
      .wellness(
        &format!("/wellness-service/wellness/dailySleepData?date={}", date),
        "sleep",
        date,
      )
      .await
  }

  /// Daily summary stats (steps, calories) for a single day. Absorbed on failure.
  pub async fn get_daily_stats(&self, date: NaiveDate) -> Result<Option<Value>> {
    self
      .wellness(
        &format!("/usersummary-service/usersummary/daily?calendarDate={}", date),
        "daily stats",
        date,
      )
      .await
  }

  /// Heart rate data for a single day. Absorbed on failure.
  pub async fn get_heart_rates(&self, date: NaiveDate) -> Result<Option<Value>> {
    self
      .wellness(
        &format!("/wellness-service/wellness/dailyHeartRate?date={}", date),
        "heart rate",
        date,
      )
      .await
  }

  /// Body Battery data for a single day. Absorbed on failure.
  pub async fn get_body_battery(&self, date: NaiveDate) -> Result<Option<Value>> {
    self
      .wellness(
        &format!(
          "/wellness-service/wellness/bodyBattery/reports/daily?startDate={}&endDate={}",
          date, date
        ),
        "body battery",
        date,
      )
      .await
  }

  async fn wellness(&self, path: &str, what: &str, date: NaiveDate) -> Result<Option<Value>> {
    let Some(token) = self.token() else {
      error!("client not connected");
      return Ok(None);
    };

    match self.get_json(path, token).await {
      Ok(Value::Null) => Ok(None),
      Ok(data) => Ok(Some(data)),
      Err(e) => {
        warn!("failed to fetch {} for {}: {}", what, date, e);
        Ok(None)
      }
    }
  }
}
