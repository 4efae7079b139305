//! Batch orchestrator: fetch, analyze, report.

use chrono::{Duration, NaiveDate, Utc};
use color_eyre::{eyre::eyre, Result};
use tracing::{info, warn};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::garmin::{Activity, CachedGarminClient, DatedRecord, GarminClient, WellnessData};
use crate::llm::{provider_from_config, AnalysisInput, LlmAnalyzer};
use crate::prompt::PromptManager;
use crate::report::{ReportContext, ReportWriter};
use crate::retry::RetryPolicy;
use crate::stats::TrainingSummary;

pub struct TrainingAnalyzer {
  config: Config,
  client: CachedGarminClient,
  analyzer: LlmAnalyzer,
  reports: ReportWriter,
}

impl TrainingAnalyzer {
  pub fn new(config: Config) -> Result<Self> {
    let email = Config::garmin_email()?;
    let password = Config::garmin_password()?;

    let cache = if config.cache.enabled {
      let store = CacheStore::open(&config.cache.dir, config.cache.ttl_hours)?;
      // Startup sweep so stale entries don't accumulate across runs.
      store.clear_expired()?;
      Some(store)
    } else {
      info!("cache disabled");
      None
    };

    let client = CachedGarminClient::new(
      GarminClient::new(email, password)?,
      cache,
      RetryPolicy::new(3, std::time::Duration::from_secs(2), 2.0),
    );

    let prompts = PromptManager::new(&config.prompts_dir);
    let prompt_errors = prompts.validate();
    if !prompt_errors.is_empty() {
      return Err(eyre!("Prompt files invalid:\n  {}", prompt_errors.join("\n  ")));
    }

    let analyzer = LlmAnalyzer::new(provider_from_config(&config.llm)?, prompts);
    let reports = ReportWriter::new(&config.output_dir)?;

    Ok(Self {
      config,
      client,
      analyzer,
      reports,
    })
  }

  /// Run the full analysis. Partial category data degrades gracefully;
  /// connection failure, an empty activity list, and LLM failure abort with a
  /// clear reason.
  pub async fn run(&mut self) -> Result<()> {
    info!("starting training analysis ({} days)", self.config.analysis_days);

    self
      .client
      .connect()
      .await
      .map_err(|e| eyre!("Failed to connect to Garmin Connect: {}", e))?;

    let end = Utc::now().date_naive();
    let start = end - Duration::days(self.config.analysis_days);

    let raw_activities = self.client.get_activities(start, end).await?;
    if raw_activities.is_empty() {
      return Err(eyre!("No activities found between {} and {}", start, end));
    }

    let activities: Vec<Activity> = raw_activities.iter().map(Activity::from_raw).collect();
    info!("{} activities in range", activities.len());

    let profile = self.client.get_user_profile().await?;
    let body_composition = self.client.get_body_composition(start, end).await?;
    info!("{} body composition measurements", body_composition.len());

    let details = self.collect_details(&activities).await;
    let wellness = self.collect_wellness(start, end).await;
    let training_plan = self.load_training_plan();

    let input = AnalysisInput {
      activities: &activities,
      profile: &profile,
      body_composition: &body_composition,
      details: &details,
      wellness: &wellness,
      training_plan: training_plan.as_deref(),
      period_days: self.config.analysis_days,
    };

    let analysis = self
      .analyzer
      .analyze(&input)
      .await
      .map_err(|e| eyre!("LLM analysis failed: {}", e))?;

    let summary = TrainingSummary::from_data(&activities, &body_composition);
    let ctx = ReportContext {
      analysis: &analysis,
      activities: &activities,
      summary: &summary,
      profile: &profile,
      model: self.analyzer.model_name(),
      period_days: self.config.analysis_days,
      generated_at: Utc::now(),
    };
    let paths = self.reports.write_all(&ctx)?;

    println!("\n{}\n", analysis);
    println!("Reports:");
    for path in paths {
      println!("  {}", path.display());
    }

    info!("analysis completed");
    Ok(())
  }

  /// Per-activity details (training effect, splits). A missing record is
  /// skipped; one bad activity must not abort the batch.
  async fn collect_details(&self, activities: &[Activity]) -> Vec<serde_json::Value> {
    let mut details = Vec::new();
    for activity in activities {
      if activity.activity_id.is_empty() {
        continue;
      }
      if let Ok(Some(detail)) = self.client.get_activity_details(&activity.activity_id).await {
        details.push(detail);
      }
    }
    info!("{} activity detail records", details.len());
    details
  }

  /// Collect per-day wellness metrics. Every failure here is absorbed; a day
  /// without data just doesn't appear in the series.
  async fn collect_wellness(&self, start: NaiveDate, end: NaiveDate) -> WellnessData {
    let mut wellness = WellnessData::default();

    let mut date = start;
    while date <= end {
      let day = date.to_string();

      if let Ok(Some(data)) = self.client.get_sleep_data(date).await {
        wellness.sleep.push(DatedRecord { date: day.clone(), data });
      }
      if let Ok(Some(data)) = self.client.get_daily_stats(date).await {
        wellness.daily_stats.push(DatedRecord { date: day.clone(), data });
      }
      if let Ok(Some(data)) = self.client.get_heart_rates(date).await {
        wellness.heart_rate.push(DatedRecord { date: day.clone(), data });
      }
      if let Ok(Some(data)) = self.client.get_body_battery(date).await {
        wellness.body_battery.push(DatedRecord { date: day, data });
      }

      date = date + Duration::days(1);
    }

    info!(
      sleep = wellness.sleep.len(),
      daily = wellness.daily_stats.len(),
      heart_rate = wellness.heart_rate.len(),
      body_battery = wellness.body_battery.len(),
      "wellness metrics collected"
    );
    wellness
  }

  fn load_training_plan(&self) -> Option<String> {
    let path = self.config.training_plan.as_ref()?;
    if !path.exists() {
      warn!("training plan file not found: {}", path.display());
      return None;
    }

    match std::fs::read_to_string(path) {
      Ok(plan) => {
        info!("training plan loaded from {}", path.display());
        Some(plan)
      }
      Err(e) => {
        warn!("failed to read training plan {}: {}", path.display(), e);
        None
      }
    }
  }
}
