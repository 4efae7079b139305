//! LLM narrative analysis: provider abstraction and prompt orchestration.

mod analyzer;
mod provider;

pub use analyzer::{AnalysisInput, LlmAnalyzer};
pub use provider::{provider_from_config, LlmProvider};
