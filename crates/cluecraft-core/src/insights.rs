//! Read-only projection of a user's engine state for a recommendations surface.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{Tier, UserId};
use crate::profile::UserProfile;
use crate::statistics::skill_level;

/// Average response time above which the player is nudged to speed up.
const SLOW_RESPONSE_SECS: f64 = 20.0;
/// Smoothed accuracy below which easier practice is suggested.
const LOW_ACCURACY: f64 = 0.60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub user_id: UserId,
    pub global_accuracy: f64,
    pub current_tier: Tier,
    /// Weak categories, weakest first.
    pub weak_categories: Vec<String>,
    pub due_review_count: usize,
    /// Strong categories, strongest first.
    pub strengths: Vec<String>,
    /// Composite skill level, 0–10.
    pub level: f64,
    pub answered: u64,
    pub lifetime_accuracy: f64,
    pub recommendations: Vec<String>,
}

/// Assemble insights from a profile and the engines' derived outputs.
pub fn summarize(
    profile: &UserProfile,
    weak_categories: &BTreeSet<String>,
    strengths: Vec<String>,
    due_review_count: usize,
) -> Insights {
    let mut weak: Vec<(String, f64)> = weak_categories
        .iter()
        .map(|c| {
            let accuracy = profile
                .mastery
                .get(c)
                .map(|m| m.rolling_accuracy)
                .unwrap_or_default();
            (c.clone(), accuracy)
        })
        .collect();
    weak.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    let mut recommendations = Vec::new();
    if profile.totals.answered == 0 {
        recommendations.push("Play a few rounds so the trainer can calibrate to you".to_string());
    }
    if let Some((category, accuracy)) = weak.first() {
        recommendations.push(format!(
            "Focus on {category} - recent accuracy is only {}%",
            (accuracy * 100.0).round() as u32
        ));
    }
    if profile.totals.answered > 0 && profile.totals.avg_response_secs() > SLOW_RESPONSE_SECS {
        recommendations
            .push("Try to improve response speed - aim for under 15 seconds per clue".to_string());
    }
    if profile.totals.answered > 0 && profile.calibration.global_accuracy < LOW_ACCURACY {
        recommendations.push("Consider practicing easier clues to build confidence".to_string());
    }
    if due_review_count > 0 {
        recommendations.push(format!(
            "{due_review_count} clue(s) are due for review - try review mode"
        ));
    }

    Insights {
        user_id: profile.user_id.clone(),
        global_accuracy: profile.calibration.global_accuracy,
        current_tier: profile.calibration.current_tier,
        weak_categories: weak.into_iter().map(|(c, _)| c).collect(),
        due_review_count,
        strengths,
        level: skill_level(&profile.totals),
        answered: profile.totals.answered,
        lifetime_accuracy: profile.totals.accuracy(),
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibrator::DifficultyCalibrator;
    use crate::weakness::WeaknessDetector;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn profile() -> UserProfile {
        UserProfile::new("alice", DifficultyCalibrator::default().initial_state(), Utc::now())
    }

    #[test]
    fn new_user_gets_calibration_hint() {
        let insights = summarize(&profile(), &BTreeSet::new(), vec![], 0);
        assert_eq!(insights.global_accuracy, 0.75);
        assert_eq!(insights.current_tier.get(), 3);
        assert_eq!(insights.level, 1.0);
        assert_eq!(insights.recommendations.len(), 1);
        assert!(insights.recommendations[0].contains("calibrate"));
    }

    #[test]
    fn weakest_category_is_recommended_first() {
        let detector = WeaknessDetector::default();
        let mut profile = profile();
        let mut mastery = BTreeMap::new();
        for correct in [false, false, false] {
            detector.record_outcome(&mut mastery, "OPERA", correct);
        }
        for correct in [false, false, false, false] {
            detector.record_outcome(&mut mastery, "SCIENCE", correct);
        }
        profile.mastery = mastery;
        for _ in 0..7 {
            profile.totals.record(false, 25_000);
        }
        profile.calibration.global_accuracy = 0.4;

        let weak = detector.weak_categories(&profile.mastery);
        let insights = summarize(&profile, &weak, vec![], 3);

        assert_eq!(insights.weak_categories, vec!["SCIENCE", "OPERA"]);
        assert!(insights.recommendations[0].starts_with("Focus on SCIENCE"));
        assert!(insights.recommendations.iter().any(|r| r.contains("speed")));
        assert!(insights.recommendations.iter().any(|r| r.contains("easier")));
        assert!(insights.recommendations.iter().any(|r| r.starts_with("3 clue(s)")));
        assert_eq!(insights.due_review_count, 3);
    }
}
