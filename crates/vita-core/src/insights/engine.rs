//! Insight engine - trains the mood model and runs every rule in order

use crate::classifier::MoodModel;
use crate::health_log::HealthLog;
use crate::Result;

use super::rules::{HydrationRule, MoodRule, SleepRule, StepsRule};
use super::types::{EngineConfig, InsightReport, RuleKind, TierScheme};

/// Message returned when no rule produced output
pub const FALLBACK_MESSAGE: &str = "✅ No issues detected from the uploaded data.";

/// Context provided to insight rules
pub struct AnalysisContext<'a> {
    /// The date-sorted log being analysed
    pub log: &'a HealthLog,
    /// Mood model fitted on this log, if training was possible
    pub model: Option<&'a MoodModel>,
    /// In-sample prediction per row (empty without a model)
    pub predicted_moods: &'a [Option<String>],
    pub scheme: TierScheme,
}

/// A single insight rule
pub trait InsightRule: Send + Sync {
    fn kind(&self) -> RuleKind;

    /// Produce a message, or `None` when there is nothing to report
    fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Option<String>;
}

/// Runs rules over a health log and aggregates their messages
pub struct InsightEngine {
    rules: Vec<Box<dyn InsightRule>>,
    config: EngineConfig,
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightEngine {
    /// Create an engine with the built-in rules and default settings
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with the built-in rules
    pub fn with_config(config: EngineConfig) -> Self {
        let mut engine = Self {
            rules: vec![],
            config,
        };

        // Output order: hydration, sleep, steps, mood
        engine.register(Box::new(HydrationRule));
        engine.register(Box::new(SleepRule));
        engine.register(Box::new(StepsRule));
        engine.register(Box::new(MoodRule));

        engine
    }

    /// Append a rule; rules run in registration order
    pub fn register(&mut self, rule: Box<dyn InsightRule>) {
        self.rules.push(rule);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generate the ordered insight messages for a log
    pub fn generate(&self, log: &HealthLog) -> Result<Vec<String>> {
        Ok(self.analyze(log)?.insights)
    }

    /// Train the mood model, run every rule and collect the results
    ///
    /// The predicted moods are returned alongside the messages so callers
    /// can chart them without fitting a second model.
    pub fn analyze(&self, log: &HealthLog) -> Result<InsightReport> {
        let model = if self.config.require_mood {
            MoodModel::train_strict(log)?
        } else {
            MoodModel::train(log)?
        };

        let predicted_moods = match &model {
            Some(model) => model.predict_labels(log)?,
            None => Vec::new(),
        };

        let ctx = AnalysisContext {
            log,
            model: model.as_ref(),
            predicted_moods: &predicted_moods,
            scheme: self.config.tier_scheme,
        };

        let mut insights = Vec::new();
        for rule in &self.rules {
            let message = rule.evaluate(&ctx);
            tracing::debug!(
                rule = rule.kind().as_str(),
                fired = message.is_some(),
                "Insight rule evaluated"
            );
            insights.extend(message);
        }

        if insights.is_empty() {
            insights.push(FALLBACK_MESSAGE.to_string());
        }

        Ok(InsightReport {
            insights,
            predicted_moods,
        })
    }
}

/// Generate insights with the default engine
pub fn generate_insights(log: &HealthLog) -> Result<Vec<String>> {
    InsightEngine::new().generate(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::rules::{HYDRATION_MISSING, MOOD_SKIPPED};
    use crate::Error;

    fn log_from(csv: &str) -> HealthLog {
        HealthLog::from_reader(csv.as_bytes()).unwrap()
    }

    /// Five short, dehydrated, sedentary sad days and three good happy days
    const STRESSED_WEEK: &str = "date,sleep_hours,hydration_ml,steps,mood
2024-05-01,5,2000,3000,sad
2024-05-02,5,2000,3000,sad
2024-05-03,5,2000,3000,sad
2024-05-04,5,2000,3000,sad
2024-05-05,5,2000,3000,sad
2024-05-06,8,2500,5000,happy
2024-05-07,8,2500,6000,happy
2024-05-08,8,2500,6000,happy";

    #[test]
    fn test_stressed_week() {
        let insights = generate_insights(&log_from(STRESSED_WEEK)).unwrap();
        assert_eq!(
            insights,
            vec![
                "🚱 You've been underhydrated for 5 days straight! Your body needs more fluids urgently.",
                "🛌 You've been sleep-deprived for 5 days in a row! Prioritize proper rest to recover.",
                "🚶‍♂️ Your average steps (4000) are lower than the healthy range. Try to stay more active.",
                "💔 You’ve reported feeling low for 5 days. It might be time to talk to someone or take a mental health break.",
            ]
        );
    }

    #[test]
    fn test_generate_is_deterministic() {
        let log = log_from(STRESSED_WEEK);
        let engine = InsightEngine::new();
        assert_eq!(engine.generate(&log).unwrap(), engine.generate(&log).unwrap());
    }

    #[test]
    fn test_fallback_when_nothing_fires() {
        let log = log_from(
            "date,sleep_hours,hydration_ml,steps,mood
2024-05-01,8,2500,9000,happy
2024-05-02,5,2000,7000,neutral
2024-05-03,7.5,2600,11000,happy",
        );
        let engine = InsightEngine::with_config(EngineConfig {
            tier_scheme: TierScheme::Collapsed,
            ..Default::default()
        });
        assert_eq!(engine.generate(&log).unwrap(), vec![FALLBACK_MESSAGE]);
    }

    #[test]
    fn test_graded_steps_always_report() {
        let log = log_from("date,steps\n2024-05-01,12000");
        let insights = generate_insights(&log).unwrap();
        assert!(insights[2].starts_with("🏃‍♂️"));
        assert_eq!(insights[3], MOOD_SKIPPED);
    }

    #[test]
    fn test_missing_column_keeps_other_rules() {
        let log = log_from(
            "date,sleep_hours,steps,mood
2024-05-01,5,12000,happy
2024-05-02,8,12000,happy",
        );
        let insights = generate_insights(&log).unwrap();
        assert_eq!(insights[0], HYDRATION_MISSING);
        assert!(insights[1].starts_with("🫣"));
        assert!(insights[2].starts_with("🏃‍♂️ Fantastic! 12000"));
        assert_eq!(insights.len(), 3);
    }

    #[test]
    fn test_report_includes_predictions() {
        let log = log_from(STRESSED_WEEK);
        let report = InsightEngine::new().analyze(&log).unwrap();
        assert_eq!(report.predicted_moods.len(), log.len());
        let sad = report
            .predicted_moods
            .iter()
            .filter(|m| m.as_deref() == Some("sad"))
            .count();
        assert_eq!(sad, 5);
    }

    #[test]
    fn test_require_mood() {
        let log = log_from("date,steps\n2024-05-01,9000");
        let engine = InsightEngine::with_config(EngineConfig {
            require_mood: true,
            ..Default::default()
        });
        assert!(matches!(engine.generate(&log), Err(Error::MissingColumn(_))));
    }
}
