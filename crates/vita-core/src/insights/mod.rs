//! Insight engine - graded health insights from a daily log
//!
//! Threshold rules look at hydration, sleep and step counts across the whole
//! log. The mood rule fits a [`MoodModel`](crate::classifier::MoodModel) on
//! the same log and counts the days it predicts as sad. Messages come back in
//! a fixed order (hydration, sleep, steps, mood), with a single fallback
//! message when nothing fires.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vita_core::{HealthLog, insights::InsightEngine};
//!
//! let log = HealthLog::from_path("health_log.csv")?;
//! let insights = InsightEngine::new().generate(&log)?;
//! ```

pub mod engine;
pub mod rules;
pub mod types;

pub use engine::{
    generate_insights, AnalysisContext, InsightEngine, InsightRule, FALLBACK_MESSAGE,
};
pub use rules::{
    hydration_insight, mood_insight, sleep_insight, steps_insight, HydrationRule, MoodRule,
    SleepRule, StepsRule,
};
pub use types::{EngineConfig, InsightReport, RuleKind, TierScheme};
