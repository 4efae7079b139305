//! Self-contained HTML report with Chart.js charts.

use color_eyre::{eyre::eyre, Result};

use super::ReportContext;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Training Analysis</title>
<script src="https://cdn.jsdelivr.net/npm/chart.js@4"></script>
<style>
  body { font-family: -apple-system, "Segoe UI", sans-serif; margin: 0; background: #f5f6f8; color: #222; }
  header { background: #1a3c6e; color: #fff; padding: 24px 32px; }
  header h1 { margin: 0 0 4px; font-size: 1.5em; }
  header p { margin: 0; opacity: 0.8; }
  main { max-width: 960px; margin: 24px auto; padding: 0 16px; }
  .cards { display: flex; gap: 16px; flex-wrap: wrap; margin-bottom: 24px; }
  .card { background: #fff; border-radius: 8px; padding: 16px 24px; flex: 1; min-width: 160px; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
  .card .value { font-size: 1.6em; font-weight: 600; }
  .card .label { color: #666; font-size: .85em; }
  section { background: #fff; border-radius: 8px; padding: 24px; margin-bottom: 24px; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
  pre.analysis { white-space: pre-wrap; font-family: inherit; line-height: 1.5; }
</style>
</head>
<body>
<header>
  <h1>Training Analysis</h1>
  <p>{subtitle}</p>
</header>
<main>
  <div class="cards">
    <div class="card"><div class="value">{total_activities}</div><div class="label">Activities</div></div>
    <div class="card"><div class="value">{total_distance}</div><div class="label">Distance (km)</div></div>
    <div class="card"><div class="value">{total_duration}</div><div class="label">Time (min)</div></div>
    <div class="card"><div class="value">{avg_hr}</div><div class="label">Avg HR (bpm)</div></div>
  </div>
  <section>
    <h2>Daily distance</h2>
    <canvas id="distance-chart"></canvas>
  </section>
  <section>
    <h2>Weight trend</h2>
    <canvas id="weight-chart"></canvas>
  </section>
  <section>
    <h2>Analysis</h2>
    <pre class="analysis">{analysis}</pre>
  </section>
</main>
<script>
new Chart(document.getElementById('distance-chart'), {
  type: 'bar',
  data: {
    labels: {distance_labels},
    datasets: [{ label: 'km', data: {distance_values}, backgroundColor: '#1a3c6e' }]
  }
});
new Chart(document.getElementById('weight-chart'), {
  type: 'line',
  data: {
    labels: {weight_labels},
    datasets: [{ label: 'kg', data: {weight_values}, borderColor: '#c0392b', tension: 0.3 }]
  }
});
</script>
</body>
</html>
"#;

pub(super) fn render_html(ctx: &ReportContext) -> Result<String> {
  let subtitle = format!(
    "Last {} days — generated {} by {}",
    ctx.period_days,
    ctx.generated_at.format("%Y-%m-%d %H:%M UTC"),
    ctx.model
  );

  let distance_labels: Vec<&str> = ctx
    .summary
    .daily_distance
    .iter()
    .map(|d| d.date.as_str())
    .collect();
  let distance_values: Vec<f64> = ctx.summary.daily_distance.iter().map(|d| d.km).collect();
  let weight_labels: Vec<&str> = ctx
    .summary
    .weight_series
    .iter()
    .map(|w| w.date.as_str())
    .collect();
  let weight_values: Vec<f64> = ctx.summary.weight_series.iter().map(|w| w.kg).collect();

  let avg_hr = ctx
    .summary
    .avg_heart_rate
    .map(|hr| format!("{:.0}", hr))
    .unwrap_or_else(|| "-".to_string());

  let mut out = TEMPLATE.to_string();
  for (name, value) in [
    ("subtitle", escape(&subtitle)),
    ("total_activities", ctx.summary.total_activities.to_string()),
    ("total_distance", format!("{:.1}", ctx.summary.total_distance_km)),
    ("total_duration", format!("{:.0}", ctx.summary.total_duration_minutes)),
    ("avg_hr", avg_hr),
    ("analysis", escape(ctx.analysis)),
    ("distance_labels", to_json(&distance_labels)?),
    ("distance_values", to_json(&distance_values)?),
    ("weight_labels", to_json(&weight_labels)?),
    ("weight_values", to_json(&weight_values)?),
  ] {
    out = out.replace(&format!("{{{}}}", name), &value);
  }

  Ok(out)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
  serde_json::to_string(value).map_err(|e| eyre!("Failed to serialize chart data: {}", e))
}

fn escape(text: &str) -> String {
  text
    .replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::stats::TrainingSummary;
  use chrono::Utc;
  use serde_json::json;

  #[test]
  fn test_render_embeds_data_and_escapes() {
    let summary = TrainingSummary::from_data(&[], &[json!({"calendarDate": "2024-01-01", "weight": 75500.0})]);
    let profile = json!({"name": "Test"});

    let ctx = ReportContext {
      analysis: "Watch your <heart rate> zones",
      activities: &[],
      summary: &summary,
      profile: &profile,
      model: "gpt-4o",
      period_days: 7,
      generated_at: Utc::now(),
    };

    let html = render_html(&ctx).unwrap();
    assert!(html.contains("&lt;heart rate&gt;"));
    assert!(html.contains("\"2024-01-01\""));
    assert!(html.contains("[75.5]"));
    // No unresolved placeholders left behind.
    assert!(!html.contains("{analysis}"));
    assert!(!html.contains("{distance_labels}"));
  }
}
