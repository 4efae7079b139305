//! Cache categories and key derivation.

use chrono::Duration;

/// Data categories cached independently of one another.
///
/// Each category maps to its own SQLite table so expiration and clearing
/// never cross category boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
  Activities,
  BodyComposition,
  UserProfile,
}

impl Category {
  pub const ALL: [Category; 3] = [
    Category::Activities,
    Category::BodyComposition,
    Category::UserProfile,
  ];

  /// SQLite table backing this category.
  pub fn table(self) -> &'static str {
    match self {
      Category::Activities => "activities_cache",
      Category::BodyComposition => "body_composition_cache",
      Category::UserProfile => "user_profile_cache",
    }
  }

  /// Short name used as the cache key prefix.
  pub fn name(self) -> &'static str {
    match self {
      Category::Activities => "activities",
      Category::BodyComposition => "body_composition",
      Category::UserProfile => "profile",
    }
  }

  /// Effective TTL for this category. Profile data changes far less often
  /// than activity logs, so it expires 7x slower.
  pub fn ttl(self, base: Duration) -> Duration {
    match self {
      Category::UserProfile => base * 7,
      _ => base,
    }
  }
}

/// Derive the lookup key for a category and parameter set.
///
/// Parameters are sorted by name before joining, so logically identical
/// requests always produce the same key regardless of argument order.
pub fn cache_key(category: Category, params: &[(&str, &str)]) -> String {
  let mut sorted: Vec<(&str, &str)> = params.to_vec();
  sorted.sort_by(|a, b| a.0.cmp(b.0));

  let param_str = sorted
    .iter()
    .map(|(k, v)| format!("{}={}", k, v))
    .collect::<Vec<_>>()
    .join("_");

  format!("{}:{}", category.name(), param_str)
}
