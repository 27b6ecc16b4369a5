//! Smoothing and aggregate statistics shared by the engines.

use serde::{Deserialize, Serialize};

/// Exponentially-weighted update of a success rate.
///
/// `next = alpha * observation + (1 - alpha) * previous`, clamped to [0, 1].
pub fn ewma(previous: f64, correct: bool, alpha: f64) -> f64 {
    let observation = if correct { 1.0 } else { 0.0 };
    (alpha * observation + (1.0 - alpha) * previous).clamp(0.0, 1.0)
}

/// `numerator / denominator`, or 0.0 when there is nothing to divide by.
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Lifetime answer totals for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerTotals {
    pub answered: u64,
    pub correct: u64,
    pub total_response_ms: u64,
}

impl AnswerTotals {
    pub fn record(&mut self, correct: bool, response_time_ms: u64) {
        self.answered += 1;
        if correct {
            self.correct += 1;
        }
        self.total_response_ms = self.total_response_ms.saturating_add(response_time_ms);
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.answered)
    }

    pub fn avg_response_secs(&self) -> f64 {
        ratio(self.total_response_ms, self.answered) / 1000.0
    }
}

/// Composite skill level on a 0–10 scale.
///
/// Weighs raw accuracy (50%), experience on a log scale saturating at 1000
/// answers (30%), and speed where 5s or faster is full marks and 30s or
/// slower is none (20%). Users with no answers sit at 1.0.
pub fn skill_level(totals: &AnswerTotals) -> f64 {
    if totals.answered == 0 {
        return 1.0;
    }

    let experience = ((totals.answered as f64 + 1.0).ln() / 1000f64.ln()).min(1.0);
    let avg_secs = totals.avg_response_secs();
    let speed = if avg_secs > 0.0 {
        ((30.0 - avg_secs) / 25.0).clamp(0.0, 1.0)
    } else {
        0.5
    };

    let level = (totals.accuracy() * 0.5 + experience * 0.3 + speed * 0.2) * 10.0;
    (level * 10.0).round() / 10.0
}
