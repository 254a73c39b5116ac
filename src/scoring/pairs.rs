use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::scoring::de::{Indexed, LenientIndex};
use crate::scoring::qcm::NO_ANSWER;
use crate::scoring::{ExerciseKind, ExerciseScorer, ItemFeedback, ScoreReport, ScoringError, ScoringResult};

/// One side of a pair: plain text or a typed item (`{"type": "image", "content": url}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PairItem {
    Text(String),
    Typed {
        #[serde(rename = "type")]
        kind: String,
        content: String,
    },
}

impl PairItem {
    pub fn display(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Typed { content, .. } => content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    pub left: PairItem,
    pub right: PairItem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairsContent {
    pub pairs: Vec<Pair>,
}

impl ExerciseScorer for PairsContent {
    /// Left index to the chosen right index, both in content order.
    type Answers = Indexed<LenientIndex>;
    const KIND: ExerciseKind = ExerciseKind::Pairs;

    fn validate(&self) -> ScoringResult<()> {
        if self.pairs.len() < 2 {
            return Err(ScoringError::content(Self::KIND, "at least two pairs are required"));
        }
        if self
            .pairs
            .iter()
            .any(|p| p.left.display().trim().is_empty() || p.right.display().trim().is_empty())
        {
            return Err(ScoringError::content(Self::KIND, "pairs cannot have an empty side"));
        }
        Ok(())
    }

    fn score(&self, _description: &str, answers: &Self::Answers) -> ScoreReport {
        let details = self
            .pairs
            .iter()
            .enumerate()
            .map(|(idx, pair)| {
                let chosen = answers.get(idx).and_then(|a| a.within(self.pairs.len()));
                let given = chosen
                    .map(|right| self.pairs[right].right.display())
                    .unwrap_or(NO_ANSWER);

                ItemFeedback::new(idx, chosen == Some(idx))
                    .prompt(pair.left.display())
                    .expected(pair.right.display())
                    .given(given)
            })
            .collect();

        ScoreReport::from_items(details)
    }

    fn student_view<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        let left: Vec<&PairItem> = self.pairs.iter().map(|p| &p.left).collect();
        let mut right: Vec<Value> = self
            .pairs
            .iter()
            .enumerate()
            .map(|(index, p)| json!({ "index": index, "item": p.right }))
            .collect();
        right.shuffle(rng);

        json!({ "left_items": left, "right_items": right })
    }
}
