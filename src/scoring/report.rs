use serde::{Deserialize, Serialize};

use crate::scoring::normalize::percentage;

/// Outcome of one scored item (question, blank, pair, zone, sentence...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ItemFeedback {
    pub index: usize,
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Sentence holding a blank and the blank's rank inside it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<BlankLocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl ItemFeedback {
    pub fn new(index: usize, is_correct: bool) -> Self {
        Self {
            index,
            is_correct,
            ..Default::default()
        }
    }

    pub fn prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn expected<S: Into<String>>(mut self, expected: S) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn given<S: Into<String>>(mut self, given: S) -> Self {
        self.given = Some(given.into());
        self
    }

    pub fn note<S: Into<String>>(mut self, note: S) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BlankLocation {
    pub sentence: usize,
    pub blank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ScoreReport {
    /// Percentage in `0..=100`.
    pub score: f64,
    pub correct: usize,
    pub total: usize,
    pub details: Vec<ItemFeedback>,
    /// Answers that match nothing in the exercise (word search).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmatched: Vec<String>,
}

impl ScoreReport {
    pub fn new(correct: usize, total: usize, details: Vec<ItemFeedback>) -> Self {
        Self {
            score: percentage(correct, total),
            correct,
            total,
            details,
            unmatched: Vec::new(),
        }
    }

    /// Report where every item is worth one point.
    pub fn from_items(details: Vec<ItemFeedback>) -> Self {
        let correct = details.iter().filter(|d| d.is_correct).count();
        let total = details.len();
        Self::new(correct, total, details)
    }

    pub fn with_unmatched(mut self, unmatched: Vec<String>) -> Self {
        self.unmatched = unmatched;
        self
    }
}
