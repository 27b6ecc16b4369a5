//! Core data model types for cluecraft.
//!
//! These are the records the engine reads from the catalog, the session
//! configuration it is driven by, and the events it emits.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// Catalog-assigned clue identifier.
pub type ClueId = String;

/// Opaque user identifier supplied by the identity layer.
pub type UserId = String;

/// Coarse difficulty bucket, 1 (easiest) to 5 (hardest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tier(u8);

impl Tier {
    pub const MIN: Tier = Tier(1);
    pub const MAX: Tier = Tier(5);

    /// Build a tier, returning `None` outside 1..=5.
    pub fn new(value: u8) -> Option<Tier> {
        (1..=5).contains(&value).then_some(Tier(value))
    }

    /// Build a tier, clamping any integer into 1..=5.
    pub fn clamped(value: i64) -> Tier {
        Tier(value.clamp(1, 5) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// One tier harder, saturating at 5.
    pub fn harder(self) -> Tier {
        Tier::clamped(self.0 as i64 + 1)
    }

    /// One tier easier, saturating at 1.
    pub fn easier(self) -> Tier {
        Tier::clamped(self.0 as i64 - 1)
    }

    pub fn distance(self, other: Tier) -> u8 {
        self.0.abs_diff(other.0)
    }

    pub fn all() -> impl Iterator<Item = Tier> {
        (1..=5).map(Tier)
    }
}

impl Default for Tier {
    fn default() -> Self {
        Tier(3)
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Tier::new(value).ok_or_else(|| format!("tier must be between 1 and 5, got {value}"))
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> u8 {
        tier.0
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated trivia clue. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clue {
    /// Unique identifier within the catalog.
    pub id: ClueId,
    /// Normalized (trimmed, uppercase) category name.
    pub category: String,
    /// The clue text shown to the player.
    pub prompt: String,
    /// Canonical correct response.
    pub answer: String,
    /// Additional accepted responses, in preference order.
    #[serde(default)]
    pub alternatives: Vec<String>,
    /// Point value on the board.
    pub value: u32,
    /// Round tag as recorded in the source data.
    #[serde(default)]
    pub round: String,
    /// Nominal difficulty tier.
    pub tier: Tier,
}

impl Clue {
    /// The canonical answer followed by every alternative.
    pub fn accepted_answers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.answer.as_str()).chain(self.alternatives.iter().map(String::as_str))
    }
}

/// Board round a clue was played in, derived from its round tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundKind {
    Single,
    Double,
    Final,
}

impl RoundKind {
    pub fn from_tag(tag: &str) -> RoundKind {
        let tag = tag.to_lowercase();
        if tag.contains("double") {
            RoundKind::Double
        } else if tag.contains("final") || tag.contains("tiebreaker") {
            RoundKind::Final
        } else {
            RoundKind::Single
        }
    }
}

/// How the orchestrator builds its candidate pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Adaptive,
    Review,
    Challenge,
    Practice,
    Weakness,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Adaptive,
        Mode::Review,
        Mode::Challenge,
        Mode::Practice,
        Mode::Weakness,
    ];
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Adaptive => write!(f, "adaptive"),
            Mode::Review => write!(f, "review"),
            Mode::Challenge => write!(f, "challenge"),
            Mode::Practice => write!(f, "practice"),
            Mode::Weakness => write!(f, "weakness"),
        }
    }
}

impl FromStr for Mode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "adaptive" => Ok(Mode::Adaptive),
            "review" => Ok(Mode::Review),
            "challenge" => Ok(Mode::Challenge),
            "practice" => Ok(Mode::Practice),
            "weakness" | "weak" => Ok(Mode::Weakness),
            other => Err(EngineError::Configuration(format!("unknown mode: {other}"))),
        }
    }
}

/// Normalize a category name the way the catalog stores it.
pub fn normalize_category(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Session parameters chosen by the user at session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub mode: Mode,
    /// Normalized category restriction, if any.
    #[serde(default)]
    pub category_filter: Option<String>,
}

impl SessionConfig {
    /// Validate and normalize a session configuration.
    pub fn new(mode: Mode, category_filter: Option<&str>) -> Result<Self, EngineError> {
        let category_filter = category_filter
            .map(|raw| {
                if raw.chars().any(char::is_control) {
                    return Err(EngineError::Configuration(
                        "category filter contains control characters".into(),
                    ));
                }
                let normalized = normalize_category(raw);
                if normalized.is_empty() {
                    return Err(EngineError::Configuration(
                        "category filter is empty".into(),
                    ));
                }
                Ok(normalized)
            })
            .transpose()?;

        Ok(Self {
            mode,
            category_filter,
        })
    }

    /// Parse a mode name and optional filter, as supplied by a user.
    pub fn parse(mode: &str, category_filter: Option<&str>) -> Result<Self, EngineError> {
        Self::new(mode.parse()?, category_filter)
    }
}

/// An answered clue, as reported into `record_outcome`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    pub user_id: UserId,
    pub clue_id: ClueId,
    pub category: String,
    pub correct: bool,
    pub response_time_ms: u64,
}

/// The append-only record written to the progress store for each answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEvent {
    pub id: Uuid,
    pub session_id: Uuid,
    #[serde(flatten)]
    pub outcome: OutcomeEvent,
    pub tier: Tier,
    pub quality: u8,
    pub answered_at: DateTime<Utc>,
}

/// Result of asking the orchestrator for the next clue.
#[derive(Debug, Clone, PartialEq)]
pub enum NextClue {
    /// A clue to present.
    Clue(Clue),
    /// No candidate exists for this mode, even after clearing the session's
    /// seen set for the pool.
    Exhausted,
}

impl NextClue {
    pub fn clue(&self) -> Option<&Clue> {
        match self {
            NextClue::Clue(clue) => Some(clue),
            NextClue::Exhausted => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, NextClue::Exhausted)
    }
}
