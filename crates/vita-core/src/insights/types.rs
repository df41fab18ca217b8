//! Core types for the insight engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The rules evaluated by the engine, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Days with low water intake
    Hydration,
    /// Days with short sleep
    Sleep,
    /// Average daily step count
    Steps,
    /// Days the classifier predicts a sad mood
    Mood,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Hydration => "hydration",
            RuleKind::Sleep => "sleep",
            RuleKind::Steps => "steps",
            RuleKind::Mood => "mood",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "hydration" => Ok(RuleKind::Hydration),
            "sleep" => Ok(RuleKind::Sleep),
            "steps" => Ok(RuleKind::Steps),
            "mood" => Ok(RuleKind::Mood),
            _ => Err(format!("Unknown rule: {}", s)),
        }
    }
}

/// How counts map to message tiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierScheme {
    /// Five tiers: 1, 2, 3, 4 and 5+ days
    #[default]
    Graded,
    /// A single tier for 3+ days; steps only flag a mean below 5000
    Collapsed,
}

impl TierScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierScheme::Graded => "graded",
            TierScheme::Collapsed => "collapsed",
        }
    }
}

impl fmt::Display for TierScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TierScheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "graded" => Ok(TierScheme::Graded),
            "collapsed" => Ok(TierScheme::Collapsed),
            _ => Err(format!("Unknown tier scheme: {}", s)),
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub tier_scheme: TierScheme,
    /// Fail instead of skipping the mood rule when the mood column is absent
    pub require_mood: bool,
}

impl EngineConfig {
    /// Read settings from the environment
    ///
    /// - `VITA_TIER_SCHEME`: `graded` (default) or `collapsed`
    /// - `VITA_REQUIRE_MOOD`: `true`/`1`/`yes` to make a missing mood column fatal
    pub fn from_env() -> Result<Self> {
        let tier_scheme = match std::env::var("VITA_TIER_SCHEME") {
            Ok(s) if !s.trim().is_empty() => s.trim().parse().map_err(Error::Config)?,
            _ => TierScheme::default(),
        };

        let require_mood = match std::env::var("VITA_REQUIRE_MOOD") {
            Ok(s) => parse_flag(&s).ok_or_else(|| {
                Error::Config(format!("Invalid VITA_REQUIRE_MOOD value: {}", s))
            })?,
            Err(_) => false,
        };

        Ok(Self {
            tier_scheme,
            require_mood,
        })
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Result of one insight run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    /// Messages in rule order, or the single fallback message
    pub insights: Vec<String>,
    /// In-sample mood prediction per log row (empty when no model was trained)
    pub predicted_moods: Vec<Option<String>>,
}
