//! Clue records, validation, tier derivation, and the in-memory catalog.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{normalize_category, Clue, RoundKind, Tier};
use crate::traits::ClueCatalog;

/// Minimum recorded attempts before historical success shifts a tier.
const MIN_ATTEMPTS_FOR_HISTORY: u32 = 10;

/// A clue as supplied by a catalog source. Every field is optional here;
/// [`validate_record`] decides whether it is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClueRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "question")]
    pub prompt: Option<String>,
    #[serde(default, alias = "canonical_answer")]
    pub answer: Option<String>,
    #[serde(default, alias = "alternative_answers")]
    pub alternatives: Vec<String>,
    /// Board value; accepts numbers or strings such as `"$1,200"`.
    #[serde(default, deserialize_with = "deserialize_value")]
    pub value: Option<i64>,
    #[serde(default)]
    pub round: Option<String>,
    #[serde(default, alias = "tier")]
    pub difficulty_tier: Option<u8>,
    #[serde(default)]
    pub times_asked: Option<u32>,
    #[serde(default)]
    pub times_correct: Option<u32>,
    #[serde(default)]
    pub air_date: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Int(i64),
    Text(String),
}

fn deserialize_value<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawValue>::deserialize(deserializer)? {
        None => None,
        Some(RawValue::Int(v)) => Some(v),
        Some(RawValue::Text(text)) => parse_value_text(&text),
    })
}

fn parse_value_text(text: &str) -> Option<i64> {
    let digits: String = text
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    digits.parse().ok()
}

/// A problem found in a catalog record or file.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogWarning {
    /// The clue ID (if known).
    pub clue_id: Option<String>,
    pub message: String,
}

impl CatalogWarning {
    pub fn new(clue_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            clue_id: clue_id.map(str::to_string),
            message: message.into(),
        }
    }
}

impl fmt::Display for CatalogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.clue_id {
            Some(id) => write!(f, "[{id}] {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

fn required<'a>(field: &'a Option<String>) -> Option<&'a str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Turn a raw record into a [`Clue`], or explain why it is unusable.
pub fn validate_record(record: &ClueRecord) -> Result<Clue, CatalogWarning> {
    let Some(id) = required(&record.id) else {
        return Err(CatalogWarning::new(None, "missing id"));
    };
    let warn = |message: &str| CatalogWarning::new(Some(id), message);

    let category = required(&record.category)
        .map(normalize_category)
        .ok_or_else(|| warn("missing category"))?;
    let prompt = required(&record.prompt).ok_or_else(|| warn("missing prompt"))?;

    let mut alternatives: Vec<String> = record
        .alternatives
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();
    let answer = match required(&record.answer) {
        Some(answer) => answer.to_string(),
        None if !alternatives.is_empty() => alternatives.remove(0),
        None => return Err(warn("no accepted answer")),
    };

    let value = record.value.unwrap_or(0);
    if value < 0 {
        return Err(warn(&format!("negative value: {value}")));
    }
    let value = u32::try_from(value).map_err(|_| warn(&format!("value out of range: {value}")))?;

    let round = record.round.as_deref().unwrap_or_default().trim().to_string();
    let tier = match record.difficulty_tier {
        Some(raw) => Tier::new(raw).ok_or_else(|| warn(&format!("difficulty tier out of range: {raw}")))?,
        None => derive_tier(value, &round, record.times_asked, record.times_correct),
    };

    Ok(Clue {
        id: id.to_string(),
        category,
        prompt: prompt.to_string(),
        answer,
        alternatives,
        value,
        round,
        tier,
    })
}

/// Nominal tier from board value, round, and historical success rate.
///
/// Double-round values are halved so both rounds share one scale; final
/// round clues are always the hardest tier.
pub fn derive_tier(
    value: u32,
    round: &str,
    times_asked: Option<u32>,
    times_correct: Option<u32>,
) -> Tier {
    let base = match RoundKind::from_tag(round) {
        RoundKind::Final => return Tier::MAX,
        RoundKind::Double => value / 2,
        RoundKind::Single => value,
    };
    let tier = match base {
        0..=200 => 1,
        201..=400 => 2,
        401..=600 => 3,
        601..=800 => 4,
        _ => 5,
    };

    let adjustment = match (times_asked, times_correct) {
        (Some(asked), Some(correct)) if asked >= MIN_ATTEMPTS_FOR_HISTORY => {
            let rate = correct.min(asked) as f64 / asked as f64;
            if rate > 0.85 {
                -1
            } else if rate < 0.35 {
                1
            } else {
                0
            }
        }
        _ => 0,
    };

    Tier::clamped(tier + adjustment)
}

/// A catalog held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    records: Vec<ClueRecord>,
    by_id: HashMap<String, usize>,
    warnings: Vec<CatalogWarning>,
}

impl InMemoryCatalog {
    /// Build a catalog. Later records reusing an id are dropped with a warning.
    pub fn new(records: impl IntoIterator<Item = ClueRecord>) -> Self {
        let mut catalog = Self::default();
        for record in records {
            let id = record.id.as_deref().map(str::trim).map(str::to_string);
            if let Some(id) = id.filter(|id| !id.is_empty()) {
                if catalog.by_id.contains_key(&id) {
                    tracing::warn!(clue_id = %id, "duplicate clue id, keeping the first record");
                    catalog
                        .warnings
                        .push(CatalogWarning::new(Some(&id), format!("duplicate clue ID: {id}")));
                    continue;
                }
                catalog.by_id.insert(id, catalog.records.len());
            }
            catalog.records.push(record);
        }
        catalog
    }

    /// Problems found while building the catalog.
    pub fn warnings(&self) -> &[CatalogWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record, in load order.
    pub fn all_records(&self) -> &[ClueRecord] {
        &self.records
    }
}

impl ClueCatalog for InMemoryCatalog {
    fn records(&self, category: Option<&str>) -> Vec<ClueRecord> {
        match category {
            None => self.records.clone(),
            Some(filter) => {
                let filter = normalize_category(filter);
                self.records
                    .iter()
                    .filter(|r| {
                        r.category
                            .as_deref()
                            .is_some_and(|c| normalize_category(c) == filter)
                    })
                    .cloned()
                    .collect()
            }
        }
    }

    fn record(&self, id: &str) -> Option<ClueRecord> {
        self.by_id.get(id.trim()).map(|&i| self.records[i].clone())
    }

    fn categories(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for category in self.records.iter().filter_map(|r| required(&r.category)) {
            *counts.entry(normalize_category(category)).or_default() += 1;
        }
        let mut categories: Vec<(String, usize)> = counts.into_iter().collect();
        categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        categories
    }
}
