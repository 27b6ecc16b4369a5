//! Tunable engine parameters.
//!
//! Every field has a serde default so a partial `[engine]` table in the
//! trainer config only overrides what it names.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// All engine parameters, grouped per component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub calibrator: CalibratorConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub weakness: WeaknessConfig,
    #[serde(default)]
    pub quality: QualityConfig,
}

impl EngineConfig {
    /// Reject parameter combinations the engines cannot run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.calibrator.validate()?;
        self.scheduler.validate()?;
        self.weakness.validate()?;
        Ok(())
    }
}

fn ensure(ok: bool, message: impl FnOnce() -> String) -> Result<(), EngineError> {
    if ok {
        Ok(())
    } else {
        Err(EngineError::Configuration(message()))
    }
}

/// EWMA weights must lie in (0, 1]. NaN fails every comparison.
fn valid_alpha(alpha: f64) -> bool {
    alpha > 0.0 && alpha <= 1.0
}

fn unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

/// Difficulty calibrator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibratorConfig {
    /// Weight of each new observation in the smoothed accuracy.
    pub alpha: f64,
    /// Smoothed accuracy assigned to a brand-new user.
    pub seed_accuracy: f64,
    /// Tier assigned to a brand-new user.
    pub seed_tier: u8,
    /// Below this accuracy the tier steps down.
    pub band_low: f64,
    /// Above this accuracy the tier steps up.
    pub band_high: f64,
    /// Minimum recorded outcomes between two tier changes.
    pub min_outcomes_between_changes: u32,
}

impl CalibratorConfig {
    fn validate(&self) -> Result<(), EngineError> {
        ensure(valid_alpha(self.alpha), || {
            format!("calibrator.alpha must be in (0, 1], got {}", self.alpha)
        })?;
        ensure(unit(self.seed_accuracy), || {
            format!("calibrator.seed_accuracy must be in [0, 1], got {}", self.seed_accuracy)
        })?;
        ensure((1..=5).contains(&self.seed_tier), || {
            format!("calibrator.seed_tier must be in 1..=5, got {}", self.seed_tier)
        })?;
        ensure(
            unit(self.band_low) && unit(self.band_high) && self.band_low <= self.band_high,
            || {
                format!(
                    "calibrator band must satisfy 0 <= band_low <= band_high <= 1, got [{}, {}]",
                    self.band_low, self.band_high
                )
            },
        )
    }
}

impl Default for CalibratorConfig {
    fn default() -> Self {
        Self {
            alpha: 0.15,
            seed_accuracy: 0.75,
            seed_tier: 3,
            band_low: 0.70,
            band_high: 0.80,
            min_outcomes_between_changes: 5,
        }
    }
}

/// Spaced-repetition scheduler parameters (SM-2 family).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub initial_ease: f64,
    pub min_ease: f64,
    pub max_ease: f64,
    /// Interval after the first successful recall, in days.
    pub first_interval_days: f64,
    /// Interval after the second successful recall, in days.
    pub second_interval_days: f64,
    /// Interval after a lapse, in days.
    pub lapse_interval_days: f64,
    /// Upper bound on any review interval, in days.
    pub max_interval_days: f64,
    /// Lowest quality that still counts as a successful recall.
    pub passing_quality: u8,
}

impl SchedulerConfig {
    fn validate(&self) -> Result<(), EngineError> {
        ensure(
            self.min_ease > 0.0 && self.min_ease <= self.max_ease && self.max_ease.is_finite(),
            || {
                format!(
                    "scheduler ease bounds must satisfy 0 < min_ease <= max_ease, got [{}, {}]",
                    self.min_ease, self.max_ease
                )
            },
        )?;
        ensure(
            (self.min_ease..=self.max_ease).contains(&self.initial_ease),
            || format!("scheduler.initial_ease {} is outside the ease bounds", self.initial_ease),
        )?;
        for (name, days) in [
            ("first_interval_days", self.first_interval_days),
            ("second_interval_days", self.second_interval_days),
            ("lapse_interval_days", self.lapse_interval_days),
        ] {
            ensure(days.is_finite() && days >= 0.0, || {
                format!("scheduler.{name} must be a non-negative number, got {days}")
            })?;
        }
        ensure(self.max_interval_days > 0.0, || {
            format!("scheduler.max_interval_days must be positive, got {}", self.max_interval_days)
        })?;
        ensure(self.passing_quality <= 5, || {
            format!("scheduler.passing_quality must be at most 5, got {}", self.passing_quality)
        })
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_ease: 2.5,
            min_ease: 1.3,
            max_ease: 2.5,
            first_interval_days: 1.0,
            second_interval_days: 6.0,
            lapse_interval_days: 1.0,
            max_interval_days: 36_500.0,
            passing_quality: 3,
        }
    }
}

/// Weakness detector parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaknessConfig {
    pub alpha: f64,
    /// Rolling accuracy of a category with no attempts yet.
    pub seed_accuracy: f64,
    /// Categories below this rolling accuracy are weak.
    pub threshold: f64,
    /// Categories with fewer attempts are never flagged.
    pub min_attempts: u32,
    /// Rolling accuracy at or above which a category counts as a strength.
    pub strength_threshold: f64,
}

impl WeaknessConfig {
    fn validate(&self) -> Result<(), EngineError> {
        ensure(valid_alpha(self.alpha), || {
            format!("weakness.alpha must be in (0, 1], got {}", self.alpha)
        })?;
        for (name, value) in [
            ("seed_accuracy", self.seed_accuracy),
            ("threshold", self.threshold),
            ("strength_threshold", self.strength_threshold),
        ] {
            ensure(unit(value), || format!("weakness.{name} must be in [0, 1], got {value}"))?;
        }
        Ok(())
    }
}

impl Default for WeaknessConfig {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            seed_accuracy: 1.0,
            threshold: 0.60,
            min_attempts: 3,
            strength_threshold: 0.80,
        }
    }
}

/// Response-quality derivation from answer latency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Expected response time for a tier-1 clue.
    pub base_expected_ms: u64,
    /// Extra expected time per tier above 1.
    pub per_tier_ms: u64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            base_expected_ms: 10_000,
            per_tier_ms: 2_500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
[calibrator]
alpha = 0.3

[weakness]
min_attempts = 5
"#,
        )
        .unwrap();
        assert_eq!(config.calibrator.alpha, 0.3);
        assert_eq!(config.calibrator.min_outcomes_between_changes, 5);
        assert_eq!(config.weakness.min_attempts, 5);
        assert_eq!(config.weakness.threshold, 0.60);
        assert_eq!(config.scheduler, SchedulerConfig::default());
    }

    fn rejected(toml_str: &str) -> String {
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        match config.validate() {
            Err(EngineError::Configuration(message)) => message,
            other => panic!("expected a configuration error, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn inverted_ease_bounds_are_rejected() {
        let message = rejected("[scheduler]\nmin_ease = 3.0\n");
        assert!(message.contains("min_ease"), "{message}");
    }

    #[test]
    fn nan_ease_bound_is_rejected() {
        let mut config = EngineConfig::default();
        config.scheduler.max_ease = f64::NAN;
        assert!(matches!(config.validate(), Err(EngineError::Configuration(_))));
    }

    #[test]
    fn out_of_range_alpha_is_rejected() {
        assert!(rejected("[calibrator]\nalpha = 0.0\n").contains("calibrator.alpha"));
        assert!(rejected("[weakness]\nalpha = 1.5\n").contains("weakness.alpha"));
    }

    #[test]
    fn inverted_band_is_rejected() {
        let message = rejected("[calibrator]\nband_low = 0.9\nband_high = 0.8\n");
        assert!(message.contains("band"), "{message}");
    }

    #[test]
    fn passing_quality_above_five_is_rejected() {
        assert!(rejected("[scheduler]\npassing_quality = 6\n").contains("passing_quality"));
    }

    #[test]
    fn negative_interval_is_rejected() {
        assert!(rejected("[scheduler]\nlapse_interval_days = -1.0\n").contains("lapse_interval_days"));
        assert!(rejected("[scheduler]\nmax_interval_days = 0.0\n").contains("max_interval_days"));
    }
}
