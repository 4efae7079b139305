//! Shape normalization for the body-composition endpoint.
//!
//! Garmin returns this payload in several shapes: a plain sequence of
//! measurements, a mapping whose value under one of a few known keys holds
//! the sequence, or an unrecognized mapping. All the ambiguity is isolated
//! here, producing a single normalized sequence.

use serde_json::Value;
use tracing::{info, warn};

/// Mapping keys known to hold the measurement list.
const KNOWN_LIST_KEYS: [&str; 3] = ["dateWeightList", "dailyWeightSummaries", "weightList"];

/// Normalize a body-composition response into a flat list of measurements.
pub fn normalize_body_composition(value: Value) -> Vec<Value> {
  match value {
    Value::Array(measurements) => {
      info!("{} body composition measurements", measurements.len());
      measurements
    }
    Value::Object(ref map) => {
      for key in KNOWN_LIST_KEYS {
        if let Some(Value::Array(measurements)) = map.get(key) {
          info!("{} body composition measurements under '{}'", measurements.len(), key);
          return measurements.clone();
        }
      }

      // Unknown mapping: best-effort single-element result rather than
      // failing the whole analysis.
      let keys: Vec<&String> = map.keys().collect();
      warn!(?keys, "unrecognized body composition shape, wrapping as single measurement");
      vec![value]
    }
    Value::Null => {
      info!("no body composition data");
      Vec::new()
    }
    other => {
      warn!("unexpected body composition type: {}", other);
      Vec::new()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_sequence_passes_through() {
    let records = normalize_body_composition(json!([{"weight": 75.0}, {"weight": 74.8}]));
    assert_eq!(records.len(), 2);
  }

  #[test]
  fn test_known_keys_unwrap() {
    for key in KNOWN_LIST_KEYS {
      let records = normalize_body_composition(json!({key: [{"weight": 75.0}]}));
      assert_eq!(records, vec![json!({"weight": 75.0})], "key {}", key);
    }
  }

  #[test]
  fn test_unknown_mapping_wraps_whole_value() {
    let payload = json!({"totalAverage": {"weight": 75.0}});
    let records = normalize_body_composition(payload.clone());
    assert_eq!(records, vec![payload]);
  }

  #[test]
  fn test_null_and_scalars_yield_empty() {
    assert!(normalize_body_composition(json!(null)).is_empty());
    assert!(normalize_body_composition(json!(42)).is_empty());
  }
}
