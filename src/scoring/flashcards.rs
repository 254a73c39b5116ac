use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::scoring::de::{Indexed, LenientText};
use crate::scoring::normalize::same_answer;
use crate::scoring::{ExerciseKind, ExerciseScorer, ItemFeedback, ScoreReport, ScoringError, ScoringResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardsContent {
    pub cards: Vec<Flashcard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ExerciseScorer for FlashcardsContent {
    type Answers = Indexed<LenientText>;
    const KIND: ExerciseKind = ExerciseKind::Flashcards;

    fn validate(&self) -> ScoringResult<()> {
        if self.cards.is_empty() {
            return Err(ScoringError::content(Self::KIND, "at least one card is required"));
        }
        if let Some(idx) = self.cards.iter().position(|c| c.answer.trim().is_empty()) {
            return Err(ScoringError::content(
                Self::KIND,
                format!("card {} has no answer", idx + 1),
            ));
        }
        Ok(())
    }

    fn score(&self, _description: &str, answers: &Self::Answers) -> ScoreReport {
        let details = self
            .cards
            .iter()
            .enumerate()
            .map(|(idx, card)| {
                let given = answers.get(idx).map(LenientText::as_str).unwrap_or_default();
                ItemFeedback::new(idx, same_answer(given, &card.answer))
                    .prompt(&card.question)
                    .expected(&card.answer)
                    .given(given)
            })
            .collect();

        ScoreReport::from_items(details)
    }

    fn student_view<R: Rng + ?Sized>(&self, _rng: &mut R) -> Value {
        let cards: Vec<Value> = self
            .cards
            .iter()
            .map(|c| json!({ "question": c.question, "image": c.image }))
            .collect();
        json!({ "cards": cards })
    }
}
