//! Multi-format report output: text, markdown, JSON, and HTML with charts.

mod html;

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::garmin::Activity;
use crate::stats::TrainingSummary;

/// Everything a report renders from.
pub struct ReportContext<'a> {
  pub analysis: &'a str,
  pub activities: &'a [Activity],
  pub summary: &'a TrainingSummary,
  pub profile: &'a Value,
  pub model: &'a str,
  pub period_days: i64,
  pub generated_at: DateTime<Utc>,
}

pub struct ReportWriter {
  output_dir: PathBuf,
}

impl ReportWriter {
  pub fn new(output_dir: &Path) -> Result<Self> {
    std::fs::create_dir_all(output_dir)
      .map_err(|e| eyre!("Failed to create output directory {}: {}", output_dir.display(), e))?;
    Ok(Self {
      output_dir: output_dir.to_path_buf(),
    })
  }

  /// Write all four report formats; returns the written paths.
  pub fn write_all(&self, ctx: &ReportContext) -> Result<Vec<PathBuf>> {
    let stamp = ctx.generated_at.format("%Y%m%d_%H%M%S");

    let paths = vec![
      self.write(&format!("analysis_{}.txt", stamp), &render_text(ctx))?,
      self.write(&format!("analysis_{}.md", stamp), &render_markdown(ctx))?,
      self.write(&format!("analysis_{}.json", stamp), &render_json(ctx)?)?,
      self.write(&format!("analysis_{}.html", stamp), &html::render_html(ctx)?)?,
    ];

    info!("reports written to {}", self.output_dir.display());
    Ok(paths)
  }

  fn write(&self, name: &str, content: &str) -> Result<PathBuf> {
    let path = self.output_dir.join(name);
    std::fs::write(&path, content)
      .map_err(|e| eyre!("Failed to write report {}: {}", path.display(), e))?;
    Ok(path)
  }
}

fn render_text(ctx: &ReportContext) -> String {
  let mut out = String::new();
  out += &format!(
    "TRAINING ANALYSIS — last {} days\nGenerated: {} by {}\n\n",
    ctx.period_days,
    ctx.generated_at.format("%Y-%m-%d %H:%M UTC"),
    ctx.model
  );

  out += &format!(
    "Activities: {}  Distance: {:.1} km  Time: {:.0} min\n\n",
    ctx.summary.total_activities, ctx.summary.total_distance_km, ctx.summary.total_duration_minutes
  );

  for activity in ctx.activities {
    out += &activity.to_readable_text();
    out += "\n";
  }

  out += "ANALYSIS\n--------\n";
  out += ctx.analysis;
  out += "\n";
  out
}

fn render_markdown(ctx: &ReportContext) -> String {
  let mut out = String::new();
  out += &format!("# Training Analysis — last {} days\n\n", ctx.period_days);
  out += &format!(
    "_Generated {} by `{}`_\n\n",
    ctx.generated_at.format("%Y-%m-%d %H:%M UTC"),
    ctx.model
  );

  out += "## Summary\n\n";
  out += &format!("- Activities: **{}**\n", ctx.summary.total_activities);
  out += &format!("- Distance: **{:.1} km**\n", ctx.summary.total_distance_km);
  out += &format!("- Time: **{:.0} min**\n", ctx.summary.total_duration_minutes);
  if let Some(hr) = ctx.summary.avg_heart_rate {
    out += &format!("- Avg HR: **{:.0} bpm**\n", hr);
  }
  out += "\n";

  if !ctx.summary.activity_type_counts.is_empty() {
    out += "| Type | Count |\n|------|-------|\n";
    for (kind, count) in &ctx.summary.activity_type_counts {
      out += &format!("| {} | {} |\n", kind, count);
    }
    out += "\n";
  }

  out += "## Analysis\n\n";
  out += ctx.analysis;
  out += "\n";
  out
}

fn render_json(ctx: &ReportContext) -> Result<String> {
  let report = json!({
    "generated_at": ctx.generated_at.to_rfc3339(),
    "model": ctx.model,
    "period_days": ctx.period_days,
    "profile": ctx.profile,
    "summary": ctx.summary,
    "activities": ctx.activities,
    "analysis": ctx.analysis,
  });

  serde_json::to_string_pretty(&report).map_err(|e| eyre!("Failed to serialize report: {}", e))
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn context<'a>(summary: &'a TrainingSummary, profile: &'a Value) -> ReportContext<'a> {
    ReportContext {
      analysis: "Solid week. Keep the long run easy.",
      activities: &[],
      summary,
      profile,
      model: "claude-sonnet-4-20250514",
      period_days: 7,
      generated_at: Utc::now(),
    }
  }

  #[test]
  fn test_write_all_produces_four_files() {
    let dir = TempDir::new().unwrap();
    let summary = TrainingSummary::from_data(&[], &[]);
    let profile = json!({"name": "Test"});

    let writer = ReportWriter::new(dir.path()).unwrap();
    let paths = writer.write_all(&context(&summary, &profile)).unwrap();

    assert_eq!(paths.len(), 4);
    for path in &paths {
      assert!(path.exists());
      assert!(std::fs::metadata(path).unwrap().len() > 0);
    }

    let extensions: Vec<_> = paths
      .iter()
      .map(|p| p.extension().unwrap().to_str().unwrap())
      .collect();
    assert_eq!(extensions, vec!["txt", "md", "json", "html"]);
  }

  #[test]
  fn test_json_report_round_trips() {
    let summary = TrainingSummary::from_data(&[], &[]);
    let profile = json!({"name": "Test"});

    let rendered = render_json(&context(&summary, &profile)).unwrap();
    let parsed: Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(parsed["period_days"], 7);
    assert_eq!(parsed["analysis"], "Solid week. Keep the long run easy.");
  }
}
