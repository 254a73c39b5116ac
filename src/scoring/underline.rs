use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::scoring::de::{Indexed, WordList};
use crate::scoring::normalize::underlined_word;
use crate::scoring::{ExerciseKind, ExerciseScorer, ItemFeedback, ScoreReport, ScoringError, ScoringResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderlineContent {
    #[serde(default)]
    pub sentences: Vec<UnderlineSentence>,
    /// Older key for `sentences`.
    #[serde(default, skip_serializing)]
    pub words: Vec<UnderlineSentence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderlineSentence {
    pub text: String,
    pub words_to_underline: WordList,
}

fn word_set(words: &WordList) -> BTreeSet<String> {
    words
        .words()
        .map(underlined_word)
        .filter(|w| !w.is_empty())
        .collect()
}

impl ExerciseScorer for UnderlineContent {
    type Answers = Indexed<WordList>;
    const KIND: ExerciseKind = ExerciseKind::UnderlineWords;

    fn canonicalize(&mut self) {
        let words = std::mem::take(&mut self.words);
        if self.sentences.is_empty() {
            self.sentences = words;
        }
    }

    fn validate(&self) -> ScoringResult<()> {
        if self.sentences.is_empty() {
            return Err(ScoringError::content(Self::KIND, "at least one sentence is required"));
        }
        if let Some(idx) = self
            .sentences
            .iter()
            .position(|s| word_set(&s.words_to_underline).is_empty())
        {
            return Err(ScoringError::content(
                Self::KIND,
                format!("sentence {} has no word to underline", idx + 1),
            ));
        }
        Ok(())
    }

    fn score(&self, _description: &str, answers: &Self::Answers) -> ScoreReport {
        let details = self
            .sentences
            .iter()
            .enumerate()
            .map(|(idx, sentence)| {
                let expected = word_set(&sentence.words_to_underline);
                let given = answers.get(idx).map(word_set).unwrap_or_default();

                let mut item = ItemFeedback::new(idx, given == expected)
                    .prompt(&sentence.text)
                    .expected(join(&expected))
                    .given(join(&given));
                item.missing = expected.difference(&given).cloned().collect();
                item.extra = given.difference(&expected).cloned().collect();
                item
            })
            .collect();

        ScoreReport::from_items(details)
    }

    fn student_view<R: Rng + ?Sized>(&self, _rng: &mut R) -> Value {
        let sentences: Vec<Value> = self
            .sentences
            .iter()
            .map(|s| json!({ "text": s.text }))
            .collect();
        json!({ "sentences": sentences })
    }
}

fn join(words: &BTreeSet<String>) -> String {
    words.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
