//! Weakness detector: per-category mastery and weak-category flags.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::WeaknessConfig;
use crate::statistics::{ewma, ratio};

/// Per-(user, category) mastery record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMastery {
    pub attempts: u32,
    pub correct: u32,
    /// Exponentially-weighted recent accuracy in [0, 1].
    pub rolling_accuracy: f64,
    /// Derived; recomputed on every update.
    pub is_weak: bool,
}

impl CategoryMastery {
    /// Lifetime (unsmoothed) accuracy.
    pub fn raw_accuracy(&self) -> f64 {
        ratio(self.correct as u64, self.attempts as u64)
    }
}

#[derive(Debug, Clone, Default)]
pub struct WeaknessDetector {
    config: WeaknessConfig,
}

impl WeaknessDetector {
    pub fn new(config: WeaknessConfig) -> Self {
        Self { config }
    }

    pub fn initial_mastery(&self) -> CategoryMastery {
        CategoryMastery {
            attempts: 0,
            correct: 0,
            rolling_accuracy: self.config.seed_accuracy.clamp(0.0, 1.0),
            is_weak: false,
        }
    }

    /// Record one answer in `category` and return the updated mastery.
    pub fn record_outcome<'a>(
        &self,
        mastery: &'a mut BTreeMap<String, CategoryMastery>,
        category: &str,
        correct: bool,
    ) -> &'a CategoryMastery {
        let entry = mastery
            .entry(category.to_string())
            .or_insert_with(|| self.initial_mastery());

        let was_weak = entry.is_weak;
        entry.attempts += 1;
        if correct {
            entry.correct += 1;
        }
        entry.rolling_accuracy = ewma(entry.rolling_accuracy, correct, self.config.alpha);
        entry.is_weak = self.is_weak(entry);

        if entry.is_weak != was_weak {
            tracing::info!(
                category,
                weak = entry.is_weak,
                rolling_accuracy = entry.rolling_accuracy,
                "category weakness flag changed"
            );
        }
        entry
    }

    /// Weak means below threshold with enough attempts to be meaningful.
    pub fn is_weak(&self, mastery: &CategoryMastery) -> bool {
        mastery.attempts >= self.config.min_attempts && mastery.rolling_accuracy < self.config.threshold
    }

    pub fn weak_categories(&self, mastery: &BTreeMap<String, CategoryMastery>) -> BTreeSet<String> {
        mastery
            .iter()
            .filter(|(_, m)| self.is_weak(m))
            .map(|(category, _)| category.clone())
            .collect()
    }

    /// Categories with enough attempts and a rolling accuracy at or above
    /// the strength threshold, strongest first.
    pub fn strong_categories(&self, mastery: &BTreeMap<String, CategoryMastery>) -> Vec<String> {
        let mut strong: Vec<(&String, f64)> = mastery
            .iter()
            .filter(|(_, m)| {
                m.attempts >= self.config.min_attempts
                    && m.rolling_accuracy >= self.config.strength_threshold
            })
            .map(|(category, m)| (category, m.rolling_accuracy))
            .collect();
        strong.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        strong.into_iter().map(|(category, _)| category.clone()).collect()
    }
}
