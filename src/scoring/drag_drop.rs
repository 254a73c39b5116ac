use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::scoring::de::{Indexed, LenientIndex};
use crate::scoring::qcm::NO_ANSWER;
use crate::scoring::{ExerciseKind, ExerciseScorer, ItemFeedback, ScoreReport, ScoringError, ScoringResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragDropContent {
    pub draggable_items: Vec<String>,
    pub drop_zones: Vec<String>,
    /// Item index expected in each zone.
    pub correct_order: Vec<LenientIndex>,
}

impl DragDropContent {
    fn item(&self, idx: Option<usize>) -> Option<&str> {
        idx.and_then(|i| self.draggable_items.get(i)).map(String::as_str)
    }
}

impl ExerciseScorer for DragDropContent {
    /// Zone index to the dropped item index.
    type Answers = Indexed<LenientIndex>;
    const KIND: ExerciseKind = ExerciseKind::DragAndDrop;

    fn validate(&self) -> ScoringResult<()> {
        if self.drop_zones.is_empty() || self.draggable_items.is_empty() {
            return Err(ScoringError::content(Self::KIND, "items and zones are required"));
        }
        if self.correct_order.len() != self.drop_zones.len() {
            return Err(ScoringError::content(
                Self::KIND,
                "correct_order must name one item per zone",
            ));
        }
        if self
            .correct_order
            .iter()
            .any(|idx| idx.within(self.draggable_items.len()).is_none())
        {
            return Err(ScoringError::content(Self::KIND, "correct_order points to a missing item"));
        }
        Ok(())
    }

    fn score(&self, _description: &str, answers: &Self::Answers) -> ScoreReport {
        let items = self.draggable_items.len();
        let details = self
            .drop_zones
            .iter()
            .enumerate()
            .map(|(zone, label)| {
                let expected = self.correct_order.get(zone).and_then(|i| i.within(items));
                let placed = answers.get(zone).and_then(|i| i.within(items));

                let mut item = ItemFeedback::new(zone, placed.is_some() && placed == expected)
                    .prompt(label)
                    .given(self.item(placed).unwrap_or(NO_ANSWER));
                if let Some(text) = self.item(expected) {
                    item = item.expected(text);
                }
                item
            })
            .collect();

        ScoreReport::from_items(details)
    }

    fn student_view<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        let mut items: Vec<Value> = self
            .draggable_items
            .iter()
            .enumerate()
            .map(|(index, text)| json!({ "index": index, "text": text }))
            .collect();
        items.shuffle(rng);

        json!({ "draggable_items": items, "drop_zones": self.drop_zones })
    }
}
