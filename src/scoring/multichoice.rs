use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::scoring::de::{Indexed, LenientIndex};
use crate::scoring::qcm::NO_ANSWER;
use crate::scoring::{ExerciseKind, ExerciseScorer, ItemFeedback, ScoreReport, ScoringError, ScoringResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiChoiceContent {
    pub questions: Vec<MultiChoiceQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiChoiceQuestion {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_options: Vec<LenientIndex>,
    #[serde(default, skip_serializing)]
    pub text: Option<String>,
    #[serde(default, skip_serializing)]
    pub choices: Vec<String>,
}

impl MultiChoiceQuestion {
    fn canonicalize(&mut self) {
        if let Some(text) = self.text.take().filter(|_| self.question.trim().is_empty()) {
            self.question = text;
        }
        let choices = std::mem::take(&mut self.choices);
        if self.options.is_empty() {
            self.options = choices;
        }
    }

    /// Indices given that point to no option.
    fn strays(&self, indices: &[LenientIndex]) -> usize {
        indices
            .iter()
            .filter(|idx| idx.get().is_some() && idx.within(self.options.len()).is_none())
            .count()
    }

    fn selection(&self, indices: &[LenientIndex]) -> BTreeSet<usize> {
        indices
            .iter()
            .filter_map(|idx| idx.within(self.options.len()))
            .collect()
    }

    fn describe(&self, selection: &BTreeSet<usize>) -> String {
        selection
            .iter()
            .map(|idx| self.options[*idx].as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl ExerciseScorer for MultiChoiceContent {
    type Answers = Indexed<Vec<LenientIndex>>;
    const KIND: ExerciseKind = ExerciseKind::QcmMultichoix;

    fn canonicalize(&mut self) {
        self.questions.iter_mut().for_each(MultiChoiceQuestion::canonicalize);
    }

    fn validate(&self) -> ScoringResult<()> {
        if self.questions.is_empty() {
            return Err(ScoringError::content(Self::KIND, "at least one question is required"));
        }
        for (idx, question) in self.questions.iter().enumerate() {
            if question.question.trim().is_empty() {
                return Err(ScoringError::content(
                    Self::KIND,
                    format!("question {} has no text", idx + 1),
                ));
            }
            if question.options.len() < 2 {
                return Err(ScoringError::content(
                    Self::KIND,
                    format!("question {} needs at least two options", idx + 1),
                ));
            }
            let selection = question.selection(&question.correct_options);
            if selection.is_empty() || selection.len() != question.correct_options.len() {
                return Err(ScoringError::content(
                    Self::KIND,
                    format!("question {} has invalid correct options", idx + 1),
                ));
            }
        }
        Ok(())
    }

    fn score(&self, _description: &str, answers: &Self::Answers) -> ScoreReport {
        let details = self
            .questions
            .iter()
            .enumerate()
            .map(|(idx, question)| {
                let expected = question.selection(&question.correct_options);
                let indices = answers.get(idx).map(Vec::as_slice).unwrap_or_default();
                let given = question.selection(indices);
                let strays = question.strays(indices);

                let given_text = if given.is_empty() {
                    NO_ANSWER.to_string()
                } else {
                    question.describe(&given)
                };

                let is_correct = strays == 0 && !expected.is_empty() && given == expected;
                let item = ItemFeedback::new(idx, is_correct)
                    .prompt(&question.question)
                    .expected(question.describe(&expected))
                    .given(given_text);
                if strays > 0 {
                    item.note("une option cochée n'existe pas")
                } else {
                    item
                }
            })
            .collect();

        ScoreReport::from_items(details)
    }

    fn student_view<R: Rng + ?Sized>(&self, _rng: &mut R) -> Value {
        let questions: Vec<Value> = self
            .questions
            .iter()
            .map(|q| json!({ "question": q.question, "options": q.options }))
            .collect();
        json!({ "questions": questions })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn content() -> MultiChoiceContent {
        let mut content: MultiChoiceContent = serde_json::from_value(json!({
            "questions": [
                { "question": "Nombres pairs", "options": ["1", "2", "3", "4"], "correct_options": [1, 3] },
                { "text": "Voyelles", "choices": ["a", "b", "e"], "correct_options": ["0", "2"] }
            ]
        }))
        .unwrap();
        content.canonicalize();
        content
    }

    #[test]
    fn legacy_keys_fill_in_missing_ones() {
        let mut content: MultiChoiceContent = serde_json::from_value(json!({
            "questions": [{
                "question": "Couleurs primaires",
                "text": "ancien",
                "options": ["rouge", "vert", "bleu"],
                "choices": ["x"],
                "correct_options": [0, 2]
            }]
        }))
        .unwrap();
        content.canonicalize();

        assert_eq!(content.questions[0].question, "Couleurs primaires");
        assert_eq!(content.questions[0].options.len(), 3);
        assert!(content.validate().is_ok());
        assert_eq!(self::content().questions[1].options, vec!["a", "b", "e"]);
    }

    #[test]
    fn option_out_of_range_is_wrong() {
        let answers: Indexed<Vec<LenientIndex>> =
            serde_json::from_value(json!([[1, 3, 99], [0, 2]])).unwrap();
        let report = content().score("", &answers);

        assert!(!report.details[0].is_correct);
        assert!(report.details[0].note.is_some());
        assert!(report.details[1].is_correct);
    }

    #[test]
    fn correct_on_exact_selection_only() {
        let answers: Indexed<Vec<LenientIndex>> =
            serde_json::from_value(json!([[3, 1], [0]])).unwrap();
        let report = content().score("", &answers);

        assert_eq!(report.correct, 1);
        assert_eq!(report.total, 2);
        assert_eq!(report.score, 50.0);
        assert_eq!(report.details[0].expected.as_deref(), Some("2, 4"));
        assert_eq!(report.details[1].given.as_deref(), Some("a"));
    }

    #[test]
    fn superset_is_wrong() {
        let answers: Indexed<Vec<LenientIndex>> =
            serde_json::from_value(json!({ "0": [0, 1, 3] })).unwrap();
        let report = content().score("", &answers);
        assert_eq!(report.correct, 0);
        assert_eq!(report.details[1].given.as_deref(), Some(NO_ANSWER));
    }

    #[test]
    fn rejects_question_without_correct_options() {
        let content: MultiChoiceContent = serde_json::from_value(json!({
            "questions": [{ "question": "?", "options": ["a", "b"], "correct_options": [] }]
        }))
        .unwrap();
        assert!(content.validate().is_err());
    }
}
