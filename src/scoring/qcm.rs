use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::scoring::de::{Indexed, LenientIndex, lenient_index};
use crate::scoring::{ExerciseKind, ExerciseScorer, ItemFeedback, ScoreReport, ScoringError, ScoringResult};

pub(crate) const NOT_SPECIFIED: &str = "Non spécifiée";
pub(crate) const NO_ANSWER: &str = "Aucune réponse";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcmContent {
    pub questions: Vec<QcmQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcmQuestion {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub correct: Option<i64>,
    #[serde(default, skip_serializing)]
    pub text: Option<String>,
    #[serde(default, skip_serializing)]
    pub choices: Vec<String>,
    #[serde(default, deserialize_with = "lenient_index", skip_serializing)]
    pub correct_answer: Option<i64>,
}

impl QcmQuestion {
    /// Moves `text`, `choices` and `correct_answer` into the current keys, which win when
    /// both are present.
    pub(crate) fn canonicalize(&mut self) {
        if let Some(text) = self.text.take().filter(|_| self.question.trim().is_empty()) {
            self.question = text;
        }
        let choices = std::mem::take(&mut self.choices);
        if self.options.is_empty() {
            self.options = choices;
        }
        let correct_answer = self.correct_answer.take();
        self.correct = self.correct.or(correct_answer);
    }

    fn option_text(&self, idx: Option<i64>) -> Option<&str> {
        let idx = LenientIndex(idx).within(self.options.len())?;
        Some(self.options[idx].as_str())
    }
}

impl ExerciseScorer for QcmContent {
    type Answers = Indexed<LenientIndex>;
    const KIND: ExerciseKind = ExerciseKind::Qcm;

    fn canonicalize(&mut self) {
        self.questions.iter_mut().for_each(QcmQuestion::canonicalize);
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
            if question.correct.is_some() && question.option_text(question.correct).is_none() {
                return Err(ScoringError::content(
                    Self::KIND,
                    format!("question {} points to a missing option", idx + 1),
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
                let given = answers.get(idx).and_then(LenientIndex::get);
                let given_text = question.option_text(given).unwrap_or(NO_ANSWER);

                let Some(correct) = question.correct else {
                    return ItemFeedback::new(idx, false)
                        .prompt(&question.question)
                        .expected(NOT_SPECIFIED)
                        .given(given_text)
                        .note("la bonne réponse n'est pas définie pour cette question");
                };

                let expected_text = question.option_text(Some(correct)).unwrap_or(NOT_SPECIFIED);
                ItemFeedback::new(idx, given == Some(correct))
                    .prompt(&question.question)
                    .expected(expected_text)
                    .given(given_text)
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
