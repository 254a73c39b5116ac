use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::scoring::de::{Indexed, LenientText};
use crate::scoring::normalize::{dictation_text, round1};
use crate::scoring::{ExerciseKind, ExerciseScorer, ItemFeedback, ScoreReport, ScoringError, ScoringResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictationContent {
    pub sentences: Vec<String>,
    /// Audio URL per sentence.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audio: Vec<String>,
}

/// Share of reference words found at the same position, in percent.
pub fn similarity(given: &str, expected: &str) -> f64 {
    let given: Vec<&str> = given.split_whitespace().collect();
    let expected: Vec<&str> = expected.split_whitespace().collect();

    if expected.is_empty() {
        return if given.is_empty() { 100.0 } else { 0.0 };
    }

    let matches = given.iter().zip(&expected).filter(|(g, e)| g == e).count();
    round1(matches as f64 / expected.len() as f64 * 100.0)
}

impl ExerciseScorer for DictationContent {
    type Answers = Indexed<LenientText>;
    const KIND: ExerciseKind = ExerciseKind::Dictation;

    fn validate(&self) -> ScoringResult<()> {
        if self.sentences.iter().all(|s| s.trim().is_empty()) {
            return Err(ScoringError::content(Self::KIND, "at least one sentence is required"));
        }
        Ok(())
    }

    fn score(&self, _description: &str, answers: &Self::Answers) -> ScoreReport {
        let details = self
            .sentences
            .iter()
            .enumerate()
            .map(|(idx, sentence)| {
                let raw = answers.get(idx).map(LenientText::as_str).unwrap_or_default();
                let given = dictation_text(raw);
                let expected = dictation_text(sentence);

                let mut item = ItemFeedback::new(idx, given == expected)
                    .expected(sentence)
                    .given(raw);
                item.similarity = Some(similarity(&given, &expected));
                item
            })
            .collect();

        ScoreReport::from_items(details)
    }

    fn student_view<R: Rng + ?Sized>(&self, _rng: &mut R) -> Value {
        json!({ "sentence_count": self.sentences.len(), "audio": self.audio })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn similarity_counts_positional_matches() {
        assert_eq!(similarity("le chat dort", "le chat dort"), 100.0);
        assert_eq!(similarity("le chien dort", "le chat dort"), 66.7);
        assert_eq!(similarity("chat le dort", "le chat dort"), 33.3);
        assert_eq!(similarity("", ""), 100.0);
        assert_eq!(similarity("mot", ""), 0.0);
    }

    #[test]
    fn punctuation_and_case_are_ignored() {
        let content = DictationContent {
            sentences: vec!["Le chat dort.".into(), "Il pleut, il mouille.".into()],
            audio: Vec::new(),
        };
        let answers: Indexed<LenientText> =
            serde_json::from_value(json!(["le Chat  dort", "il pleut il mouille"])).unwrap();
        let report = content.score("", &answers);

        assert_eq!(report.correct, 2);
        assert_eq!(report.details[0].similarity, Some(100.0));

        let view = content.student_view(&mut rand::rng());
        assert_eq!(view["sentence_count"], 2);
        assert!(view.get("sentences").is_none());
    }
}
