//! Answer verdicts for typed responses.

use async_trait::async_trait;

use cluecraft_core::model::Clue;
use cluecraft_core::traits::{AnswerJudge, Verdict};

const LEADING_ARTICLES: [&str; 3] = ["a", "an", "the"];

/// Accepts a response that matches the answer or any alternative after
/// normalization: case, punctuation and a leading article are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatchJudge;

pub fn normalize_answer(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.len() > 1 && LEADING_ARTICLES.contains(&words[0]) {
        words.remove(0);
    }
    words.join(" ")
}

#[async_trait]
impl AnswerJudge for ExactMatchJudge {
    async fn judge(&self, clue: &Clue, response: &str) -> anyhow::Result<Verdict> {
        let response = normalize_answer(response);
        let correct = !response.is_empty()
            && clue
                .accepted_answers()
                .any(|answer| normalize_answer(answer) == response);
        Ok(Verdict {
            correct,
            confidence: Some(if correct { 1.0 } else { 0.0 }),
        })
    }
}
