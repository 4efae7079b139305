//! Summary statistics computed from the fetched data, feeding the reports
//! and the embedded charts.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::garmin::Activity;

#[derive(Debug, Clone, Serialize)]
pub struct DailyDistance {
  pub date: String,
  pub km: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeightPoint {
  pub date: String,
  pub kg: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
  pub total_activities: usize,
  pub total_distance_km: f64,
  pub total_duration_minutes: f64,
  pub avg_heart_rate: Option<f64>,
  pub activity_type_counts: BTreeMap<String, usize>,
  pub daily_distance: Vec<DailyDistance>,
  pub weight_series: Vec<WeightPoint>,
}

impl TrainingSummary {
  pub fn from_data(activities: &[Activity], body_composition: &[Value]) -> Self {
    let total_distance_km = activities.iter().map(|a| a.distance_km).sum();
    let total_duration_minutes = activities.iter().map(|a| a.duration_minutes).sum();

    let heart_rates: Vec<i64> = activities.iter().filter_map(|a| a.avg_heart_rate).collect();
    let avg_heart_rate = if heart_rates.is_empty() {
      None
    } else {
      Some(heart_rates.iter().sum::<i64>() as f64 / heart_rates.len() as f64)
    };

    let mut activity_type_counts = BTreeMap::new();
    for activity in activities {
      *activity_type_counts
        .entry(activity.activity_type.clone())
        .or_insert(0) += 1;
    }

    // Group distance by day; activity dates are "YYYY-MM-DD HH:MM:SS".
    let mut by_day: BTreeMap<String, f64> = BTreeMap::new();
    for activity in activities {
      let day = activity.date.chars().take(10).collect::<String>();
      if !day.is_empty() {
        *by_day.entry(day).or_insert(0.0) += activity.distance_km;
      }
    }
    let daily_distance = by_day
      .into_iter()
      .map(|(date, km)| DailyDistance { date, km })
      .collect();

    let weight_series = body_composition
      .iter()
      .filter_map(|record| {
        let date = record
          .get("calendarDate")
          .or_else(|| record.get("date"))
          .and_then(Value::as_str)?;
        let kg = record.get("weight").and_then(Value::as_f64).map(weight_kg)?;
        Some(WeightPoint {
          date: date.to_string(),
          kg,
        })
      })
      .collect();

    Self {
      total_activities: activities.len(),
      total_distance_km,
      total_duration_minutes,
      avg_heart_rate,
      activity_type_counts,
      daily_distance,
      weight_series,
    }
  }
}

/// Garmin reports weight in grams; tolerate records already in kilograms.
pub(crate) fn weight_kg(raw: f64) -> f64 {
  if raw > 1000.0 {
    raw / 1000.0
  } else {
    raw
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn activity(date: &str, km: f64, hr: Option<i64>, kind: &str) -> Activity {
    Activity {
      activity_id: "1".into(),
      name: "test".into(),
      activity_type: kind.into(),
      date: date.into(),
      distance_km: km,
      duration_minutes: 30.0,
      avg_heart_rate: hr,
      max_heart_rate: None,
      calories: None,
      avg_speed: None,
      elevation_gain: None,
    }
  }

  #[test]
  fn test_summary_totals_and_types() {
    let activities = vec![
      activity("2024-01-01 07:00:00", 5.0, Some(140), "running"),
      activity("2024-01-01 18:00:00", 20.0, Some(120), "cycling"),
      activity("2024-01-02 07:00:00", 10.0, None, "running"),
    ];

    let summary = TrainingSummary::from_data(&activities, &[]);
    assert_eq!(summary.total_activities, 3);
    assert!((summary.total_distance_km - 35.0).abs() < 1e-9);
    assert_eq!(summary.avg_heart_rate, Some(130.0));
    assert_eq!(summary.activity_type_counts["running"], 2);
    assert_eq!(summary.activity_type_counts["cycling"], 1);

    // Two days, same-day distances summed.
    assert_eq!(summary.daily_distance.len(), 2);
    assert_eq!(summary.daily_distance[0].date, "2024-01-01");
    assert!((summary.daily_distance[0].km - 25.0).abs() < 1e-9);
  }

  #[test]
  fn test_weight_series_from_grams() {
    let records = vec![
      json!({"calendarDate": "2024-01-01", "weight": 75500.0}),
      json!({"date": "2024-01-15", "weight": 74.8}),
      json!({"calendarDate": "2024-01-20"}),
    ];

    let summary = TrainingSummary::from_data(&[], &records);
    assert_eq!(summary.weight_series.len(), 2);
    assert!((summary.weight_series[0].kg - 75.5).abs() < 1e-9);
    assert!((summary.weight_series[1].kg - 74.8).abs() < 1e-9);
  }

  #[test]
  fn test_empty_input() {
    let summary = TrainingSummary::from_data(&[], &[]);
    assert_eq!(summary.total_activities, 0);
    assert_eq!(summary.avg_heart_rate, None);
    assert!(summary.daily_distance.is_empty());
  }
}
