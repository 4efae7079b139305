//! Typed views over the raw Garmin records.

use serde::Serialize;
use serde_json::Value;

/// A single activity, flattened from the raw Garmin record.
#[derive(Debug, Clone, Serialize)]
pub struct Activity {
  pub activity_id: String,
  pub name: String,
  pub activity_type: String,
  pub date: String,
  pub distance_km: f64,
  pub duration_minutes: f64,
  pub avg_heart_rate: Option<i64>,
  pub max_heart_rate: Option<i64>,
  pub calories: Option<i64>,
  pub avg_speed: Option<f64>,
  pub elevation_gain: Option<f64>,
}

impl Activity {
  /// Flatten a raw Garmin activity record. Missing fields get neutral
  /// defaults rather than failing the whole batch.
  pub fn from_raw(raw: &Value) -> Self {
    Self {
      activity_id: raw
        .get("activityId")
        .map(|v| v.to_string().trim_matches('"').to_string())
        .unwrap_or_default(),
      name: raw
        .get("activityName")
        .and_then(Value::as_str)
        .unwrap_or("Unnamed")
        .to_string(),
      activity_type: raw
        .pointer("/activityType/typeKey")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string(),
      date: raw
        .get("startTimeLocal")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string(),
      distance_km: raw.get("distance").and_then(Value::as_f64).unwrap_or(0.0) / 1000.0,
      duration_minutes: raw.get("duration").and_then(Value::as_f64).unwrap_or(0.0) / 60.0,
      avg_heart_rate: raw.get("averageHR").and_then(Value::as_i64),
      max_heart_rate: raw.get("maxHR").and_then(Value::as_i64),
      calories: raw.get("calories").and_then(Value::as_i64),
      avg_speed: raw.get("averageSpeed").and_then(Value::as_f64),
      elevation_gain: raw.get("elevationGain").and_then(Value::as_f64),
    }
  }

  /// Human-readable block used in prompts and text reports.
  pub fn to_readable_text(&self) -> String {
    let mut text = format!("{}\n", self.name);
    text += &format!("  Type: {}\n", self.activity_type);
    text += &format!("  Date: {}\n", self.date);
    text += &format!("  Distance: {:.2} km\n", self.distance_km);
    text += &format!("  Duration: {:.0} min\n", self.duration_minutes);

    if let Some(hr) = self.avg_heart_rate {
      text += &format!("  Avg HR: {} bpm\n", hr);
    }
    if let Some(hr) = self.max_heart_rate {
      text += &format!("  Max HR: {} bpm\n", hr);
    }
    if let Some(calories) = self.calories {
      text += &format!("  Calories: {}\n", calories);
    }
    if let Some(elevation) = self.elevation_gain {
      text += &format!("  Elevation gain: {:.0} m\n", elevation);
    }

    text
  }
}

/// One raw record pinned to the day it was fetched for.
#[derive(Debug, Clone, Serialize)]
pub struct DatedRecord {
  pub date: String,
  pub data: Value,
}

/// Per-day wellness metrics collected over the analysis window.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WellnessData {
  pub sleep: Vec<DatedRecord>,
  pub daily_stats: Vec<DatedRecord>,
  pub heart_rate: Vec<DatedRecord>,
  pub body_battery: Vec<DatedRecord>,
}
