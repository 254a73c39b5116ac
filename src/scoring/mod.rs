//! Answer checking for every exercise type.
//!
//! Content is parsed per [`ExerciseKind`] into an [`ExerciseContent`], student answers into a
//! [`Submission`] of the same kind, and [`score`] compares both into a [`ScoreReport`].

mod blanks;
mod de;
mod dictation;
mod drag_drop;
mod error;
mod flashcards;
mod kind;
mod labeling;
mod multichoice;
pub mod normalize;
mod pairs;
mod qcm;
mod report;
mod underline;
mod word_search;

use std::fmt::Debug;

use rand::Rng;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use blanks::{FillInBlanksContent, SortDirection, WordPlacementContent};
pub use de::{Indexed, LenientIndex, LenientText, WordList};
pub use dictation::DictationContent;
pub use drag_drop::DragDropContent;
pub use error::{ScoringError, ScoringResult};
pub use flashcards::FlashcardsContent;
pub use kind::ExerciseKind;
pub use labeling::LabelingContent;
pub use multichoice::MultiChoiceContent;
pub use pairs::PairsContent;
pub use qcm::QcmContent;
pub use report::{BlankLocation, ItemFeedback, ScoreReport};
pub use underline::UnderlineContent;
pub use word_search::{WordSearchContent, generate_grid};

/// Content of one exercise type and the way answers to it are checked.
pub trait ExerciseScorer: Debug + Clone + PartialEq + Serialize + DeserializeOwned {
    type Answers: Debug + Clone + Default + PartialEq + Serialize + DeserializeOwned;
    const KIND: ExerciseKind;

    /// Rewrites legacy field layouts into the stored form.
    fn canonicalize(&mut self) {}

    fn validate(&self) -> ScoringResult<()>;

    /// Fills generated parts of the content (word search grid).
    fn prepare<R: Rng + ?Sized>(&mut self, _rng: &mut R) -> ScoringResult<()> {
        Ok(())
    }

    fn score(&self, description: &str, answers: &Self::Answers) -> ScoreReport;

    /// Content shown to students: no answer keys, word banks shuffled.
    fn student_view<R: Rng + ?Sized>(&self, rng: &mut R) -> Value;
}

fn parse_content<T: ExerciseScorer>(value: &Value) -> ScoringResult<T> {
    let mut content: T =
        serde_json::from_value(value.clone()).map_err(|e| ScoringError::content_json(T::KIND, e))?;
    content.canonicalize();
    content.validate()?;
    Ok(content)
}

fn parse_answers<T: ExerciseScorer>(value: &Value) -> ScoringResult<T::Answers> {
    if value.is_null() {
        return Ok(T::Answers::default());
    }
    serde_json::from_value(value.clone()).map_err(|e| ScoringError::submission_json(T::KIND, e))
}

macro_rules! exercise_kinds {
    ($($variant:ident => $content:ty),+ $(,)?) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum ExerciseContent {
            $($variant($content),)+
        }

        #[derive(Debug, Clone, PartialEq)]
        pub enum Submission {
            $($variant(<$content as ExerciseScorer>::Answers),)+
        }

        impl ExerciseContent {
            /// Parses and validates stored or submitted content for `kind`.
            pub fn parse(kind: ExerciseKind, value: &Value) -> ScoringResult<Self> {
                match kind {
                    $(ExerciseKind::$variant => Ok(Self::$variant(parse_content::<$content>(value)?)),)+
                }
            }

            pub fn kind(&self) -> ExerciseKind {
                match self {
                    $(Self::$variant(_) => ExerciseKind::$variant,)+
                }
            }

            pub fn prepare<R: Rng + ?Sized>(&mut self, rng: &mut R) -> ScoringResult<()> {
                match self {
                    $(Self::$variant(content) => content.prepare(rng),)+
                }
            }

            pub fn student_view<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
                match self {
                    $(Self::$variant(content) => content.student_view(rng),)+
                }
            }

            pub fn to_value(&self) -> ScoringResult<Value> {
                let value = match self {
                    $(Self::$variant(content) => serde_json::to_value(content),)+
                };
                value.map_err(|e| ScoringError::content_json(self.kind(), e))
            }

            fn score_submission(&self, description: &str, submission: &Submission) -> ScoringResult<ScoreReport> {
                match (self, submission) {
                    $((Self::$variant(content), Submission::$variant(answers)) => Ok(content.score(description, answers)),)+
                    (content, submission) => Err(ScoringError::submission(
                        content.kind(),
                        format!("answers were given for {}", submission.kind()),
                    )),
                }
            }
        }

        impl Submission {
            pub fn parse(kind: ExerciseKind, value: &Value) -> ScoringResult<Self> {
                match kind {
                    $(ExerciseKind::$variant => Ok(Self::$variant(parse_answers::<$content>(value)?)),)+
                }
            }

            pub fn kind(&self) -> ExerciseKind {
                match self {
                    $(Self::$variant(_) => ExerciseKind::$variant,)+
                }
            }

            pub fn to_value(&self) -> ScoringResult<Value> {
                let value = match self {
                    $(Self::$variant(answers) => serde_json::to_value(answers),)+
                };
                value.map_err(|e| ScoringError::submission_json(self.kind(), e))
            }
        }
    };
}

exercise_kinds! {
    Qcm => QcmContent,
    QcmMultichoix => MultiChoiceContent,
    FillInBlanks => FillInBlanksContent,
    WordPlacement => WordPlacementContent,
    WordSearch => WordSearchContent,
    Pairs => PairsContent,
    DragAndDrop => DragDropContent,
    Flashcards => FlashcardsContent,
    Dictation => DictationContent,
    ImageLabeling => LabelingContent,
    UnderlineWords => UnderlineContent,
}

/// Scores `submission` against `content`. The description is needed to recognise
/// number ordering exercises.
pub fn score(content: &ExerciseContent, description: &str, submission: &Submission) -> ScoringResult<ScoreReport> {
    let report = content.score_submission(description, submission)?;
    for item in report.details.iter().filter(|item| !item.is_correct) {
        tracing::debug!(index = item.index, expected = ?item.expected, given = ?item.given, "wrong answer");
    }
    tracing::info!(
        kind = %content.kind(),
        score = report.score,
        correct = report.correct,
        total = report.total,
        "submission scored"
    );
    Ok(report)
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_rejects_content_of_another_kind() {
        let qcm = json!({ "questions": [{ "question": "?", "options": ["a", "b"], "correct": 0 }] });
        assert!(ExerciseContent::parse(ExerciseKind::Qcm, &qcm).is_ok());

        let err = ExerciseContent::parse(ExerciseKind::Pairs, &qcm).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidContent { kind: ExerciseKind::Pairs, .. }));
    }

    #[test]
    fn scores_through_the_enum() {
        let content = ExerciseContent::parse(
            ExerciseKind::FillInBlanks,
            &json!({ "text": "Le ___ et la ___", "words": ["chat", "souris"] }),
        )
        .unwrap();
        let submission = Submission::parse(ExerciseKind::FillInBlanks, &json!(["chat", "rat"])).unwrap();

        let report = score(&content, "", &submission).unwrap();
        assert_eq!(report.score, 50.0);
    }

    #[test]
    fn mismatched_submission_is_an_error() {
        let content = ExerciseContent::parse(
            ExerciseKind::Flashcards,
            &json!({ "cards": [{ "question": "1 + 1", "answer": "2" }] }),
        )
        .unwrap();
        let submission = Submission::parse(ExerciseKind::Dictation, &json!(["2"])).unwrap();

        assert!(score(&content, "", &submission).is_err());
    }

    #[test]
    fn null_answers_score_zero() {
        let content = ExerciseContent::parse(
            ExerciseKind::Flashcards,
            &json!({ "cards": [{ "question": "1 + 1", "answer": "2" }] }),
        )
        .unwrap();
        let submission = Submission::parse(ExerciseKind::Flashcards, &Value::Null).unwrap();

        let report = score(&content, "", &submission).unwrap();
        assert_eq!(report.correct, 0);
        assert_eq!(report.total, 1);
    }

    #[test]
    fn malformed_answers_are_rejected() {
        let err = Submission::parse(ExerciseKind::Qcm, &json!("abc")).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidSubmission { .. }));
    }

    #[test]
    fn prepared_word_search_keeps_its_grid() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut content =
            ExerciseContent::parse(ExerciseKind::WordSearch, &json!({ "words": ["lune", "soleil"] })).unwrap();
        content.prepare(&mut rng).unwrap();

        let stored = content.to_value().unwrap();
        assert_eq!(stored["words"], json!(["LUNE", "SOLEIL"]));
        assert_eq!(stored["grid"].as_array().map(Vec::len), Some(15));

        let reparsed = ExerciseContent::parse(ExerciseKind::WordSearch, &stored).unwrap();
        assert_eq!(reparsed, content);
    }

    #[test]
    fn student_views_never_leak_answer_keys() {
        let mut rng = StdRng::seed_from_u64(5);
        let samples = [
            (ExerciseKind::Qcm, json!({ "questions": [{ "question": "?", "options": ["a", "b"], "correct": 1 }] })),
            (ExerciseKind::QcmMultichoix, json!({ "questions": [{ "question": "?", "options": ["a", "b"], "correct_options": [0] }] })),
            (ExerciseKind::FillInBlanks, json!({ "text": "Un ___", "words": ["chat"] })),
            (ExerciseKind::DragAndDrop, json!({ "draggable_items": ["a"], "drop_zones": ["z"], "correct_order": [0] })),
            (ExerciseKind::Flashcards, json!({ "cards": [{ "question": "q", "answer": "secret" }] })),
            (ExerciseKind::Dictation, json!({ "sentences": ["secret"] })),
            (ExerciseKind::UnderlineWords, json!({ "sentences": [{ "text": "Le chat", "words_to_underline": ["chat"] }] })),
        ];

        for (kind, value) in samples {
            let view = ExerciseContent::parse(kind, &value).unwrap().student_view(&mut rng).to_string();
            for key in ["\"correct\"", "correct_options", "correct_order", "\"answer\"", "words_to_underline", "secret"] {
                assert!(!view.contains(key), "{kind} view leaks {key}: {view}");
            }
        }
    }
}
