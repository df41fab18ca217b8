//! Threshold and model-based insight rules
//!
//! Each rule maps one statistic of the log to a message tier. Counts are
//! taken over the whole log, not over consecutive days.

use tracing::debug;

use crate::classifier::MoodModel;
use crate::health_log::HealthLog;
use crate::models::Metric;

use super::engine::{AnalysisContext, InsightRule};
use super::types::{RuleKind, TierScheme};

/// Water intake below this many millilitres counts as a low day
pub const LOW_HYDRATION_ML: f64 = 2200.0;

/// Sleep below this many hours counts as a low day
pub const LOW_SLEEP_HOURS: f64 = 6.0;

/// Predicted mood label counted by the mood rule
pub const SAD_MOOD: &str = "sad";

pub const HYDRATION_MISSING: &str = "⚠️ 'hydration_ml' column missing. Hydration analysis skipped.";
pub const SLEEP_MISSING: &str = "⚠️ 'sleep_hours' column missing. Sleep analysis skipped.";
pub const STEPS_MISSING: &str = "⚠️ 'steps' column missing. Steps analysis skipped.";
pub const MOOD_SKIPPED: &str = "⚠️ Mood prediction skipped due to missing required columns.";
pub const MOOD_INSUFFICIENT: &str = "⚠️ Insufficient features for mood prediction.";

/// Messages for 1, 2, 3, 4 and 5+ low-hydration days
const HYDRATION_TIERS: [&str; 5] = [
    "🫗 Yesterday’s water intake was low. Stay hydrated today!",
    "💧 You’ve had low hydration for 2 days. Try to drink more water today.",
    "🚰 Your hydration has been low for 3 or more days. Increase water intake.",
    "⚠️ You've had 4 days of low water intake. Time to focus on staying hydrated!",
    "🚱 You've been underhydrated for 5 days straight! Your body needs more fluids urgently.",
];

/// Messages for 1, 2, 3, 4 and 5+ short-sleep days
const SLEEP_TIERS: [&str; 5] = [
    "🫣 You didn’t get enough sleep yesterday. Rest well tonight!",
    "⏰ Two days of low sleep logged. Try to wind down earlier tonight.",
    "😴 Your sleep has been below 6 hours for multiple days. Aim for 7–8 hours of rest.",
    "⚠️ Four days of poor sleep detected. Make time for rest before it impacts your health.",
    "🛌 You've been sleep-deprived for 5 days in a row! Prioritize proper rest to recover.",
];

/// Messages for 1, 2, 3, 4 and 5+ predicted sad days
const MOOD_TIERS: [&str; 5] = [
    "😕 You logged a sad mood recently. Keep an eye on how you're feeling—it's okay to take a break.",
    "🙁 Noticing a dip in mood the last 2 days. Take time for yourself and do something that brings you joy.",
    "🧠 Mood patterns suggest fatigue or stress. Consider self-care, better sleep, and hydration.",
    "😟 You've had 4 down days recently. Try practicing self-care, connecting with loved ones, or reflecting on stressors.",
    "💔 You’ve reported feeling low for 5 days. It might be time to talk to someone or take a mental health break.",
];

/// Pick the tier message for a day count
fn tier_message(tiers: &[&'static str; 5], count: usize, scheme: TierScheme) -> Option<&'static str> {
    match scheme {
        TierScheme::Graded => match count {
            0 => None,
            n => Some(tiers[n.min(5) - 1]),
        },
        TierScheme::Collapsed => (count >= 3).then_some(tiers[2]),
    }
}

/// Low-hydration days
pub fn hydration_insight(log: &HealthLog, scheme: TierScheme) -> Option<String> {
    if !log.has_metric(Metric::HydrationMl) {
        return Some(HYDRATION_MISSING.to_string());
    }
    let low_days = log.count_below(Metric::HydrationMl, LOW_HYDRATION_ML);
    debug!(low_days, "Hydration rule");
    tier_message(&HYDRATION_TIERS, low_days, scheme).map(String::from)
}

/// Short-sleep days
pub fn sleep_insight(log: &HealthLog, scheme: TierScheme) -> Option<String> {
    if !log.has_metric(Metric::SleepHours) {
        return Some(SLEEP_MISSING.to_string());
    }
    let low_days = log.count_below(Metric::SleepHours, LOW_SLEEP_HOURS);
    debug!(low_days, "Sleep rule");
    tier_message(&SLEEP_TIERS, low_days, scheme).map(String::from)
}

/// Average daily steps
pub fn steps_insight(log: &HealthLog, scheme: TierScheme) -> Option<String> {
    let Some(mean) = log.mean(Metric::Steps) else {
        return Some(STEPS_MISSING.to_string());
    };
    debug!(mean, "Steps rule");

    let n = mean.trunc() as i64;
    if scheme == TierScheme::Collapsed {
        return (mean < 5000.0).then(|| lower_than_healthy(n));
    }

    let message = if mean < 3000.0 {
        format!(
            "🛑 Your average steps ({}) are very low. Try taking short walks throughout the day to stay active.",
            n
        )
    } else if mean < 5000.0 {
        lower_than_healthy(n)
    } else if mean < 8000.0 {
        format!(
            "🚶‍♀️ You're getting some movement with {} steps daily. A little more effort can put you in the optimal range!",
            n
        )
    } else if mean < 10000.0 {
        format!(
            "👏 Great job! You're averaging {} steps. Keep going to hit the ideal target!",
            n
        )
    } else {
        format!(
            "🏃‍♂️ Fantastic! {} steps a day puts you in top shape. Stay consistent!",
            n
        )
    };
    Some(message)
}

fn lower_than_healthy(n: i64) -> String {
    format!(
        "🚶‍♂️ Your average steps ({}) are lower than the healthy range. Try to stay more active.",
        n
    )
}

/// Predicted sad days
///
/// `predicted` holds one in-sample prediction per log row.
pub fn mood_insight(
    model: Option<&MoodModel>,
    predicted: &[Option<String>],
    scheme: TierScheme,
) -> Option<String> {
    let Some(model) = model else {
        return Some(MOOD_SKIPPED.to_string());
    };
    if model.classifier.features().is_empty() {
        return Some(MOOD_INSUFFICIENT.to_string());
    }

    let sad_days = predicted
        .iter()
        .filter(|label| label.as_deref() == Some(SAD_MOOD))
        .count();
    debug!(sad_days, "Mood rule");
    tier_message(&MOOD_TIERS, sad_days, scheme).map(String::from)
}

/// Water intake rule
pub struct HydrationRule;

impl InsightRule for HydrationRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Hydration
    }

    fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Option<String> {
        hydration_insight(ctx.log, ctx.scheme)
    }
}

/// Sleep duration rule
pub struct SleepRule;

impl InsightRule for SleepRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Sleep
    }

    fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Option<String> {
        sleep_insight(ctx.log, ctx.scheme)
    }
}

/// Activity rule
pub struct StepsRule;

impl InsightRule for StepsRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Steps
    }

    fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Option<String> {
        steps_insight(ctx.log, ctx.scheme)
    }
}

/// Classifier-driven mood rule
pub struct MoodRule;

impl InsightRule for MoodRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Mood
    }

    fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Option<String> {
        mood_insight(ctx.model, ctx.predicted_moods, ctx.scheme)
    }
}
