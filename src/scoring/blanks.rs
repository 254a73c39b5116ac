//! Texts with `___` blanks: fill-in-the-blanks and word placement.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::scoring::de::{Indexed, LenientText};
use crate::scoring::normalize::{count_blanks, fold, same_answer};
use crate::scoring::report::BlankLocation;
use crate::scoring::{ExerciseKind, ExerciseScorer, ItemFeedback, ScoreReport, ScoringError, ScoringResult};

pub type BlankAnswers = Indexed<LenientText>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillInBlanksContent {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sentences: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub words: Vec<String>,
    #[serde(default, skip_serializing)]
    pub available_words: Vec<String>,
    /// Each answer may fill any blank, each expected word is used once.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub order_insensitive: bool,
}

impl FillInBlanksContent {
    /// Blanks of the sentences, or of the text when there are no sentences.
    pub fn blanks(&self) -> Vec<BlankLocation> {
        if self.sentences.is_empty() {
            return blank_locations(self.text.as_slice());
        }
        blank_locations(&self.sentences)
    }
}

impl ExerciseScorer for FillInBlanksContent {
    type Answers = BlankAnswers;
    const KIND: ExerciseKind = ExerciseKind::FillInBlanks;

    fn canonicalize(&mut self) {
        if self.words.is_empty() {
            self.words = std::mem::take(&mut self.available_words);
        }
        self.available_words.clear();
    }

    fn validate(&self) -> ScoringResult<()> {
        validate_blanks(Self::KIND, &self.blanks(), &self.words)
    }

    fn score(&self, description: &str, answers: &Self::Answers) -> ScoreReport {
        let blanks = self.blanks();
        let total = blanks.len().max(self.words.len());

        if let Some(direction) = SortDirection::detect(description) {
            return score_ordering(direction, &blanks, &self.words, answers, total);
        }
        if self.order_insensitive {
            return score_unordered(&blanks, &self.words, answers, total);
        }
        score_positional(&blanks, &self.words, answers, total)
    }

    fn student_view<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        let mut words = self.words.clone();
        words.shuffle(rng);

        let mut view = json!({ "words": words, "blank_count": self.blanks().len() });
        if self.sentences.is_empty() {
            view["text"] = json!(self.text);
        } else {
            view["sentences"] = json!(self.sentences);
        }
        view
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordPlacementContent {
    pub sentences: Vec<String>,
    pub answers: Vec<String>,
}

impl ExerciseScorer for WordPlacementContent {
    type Answers = BlankAnswers;
    const KIND: ExerciseKind = ExerciseKind::WordPlacement;

    fn validate(&self) -> ScoringResult<()> {
        validate_blanks(Self::KIND, &blank_locations(&self.sentences), &self.answers)
    }

    fn score(&self, _description: &str, answers: &Self::Answers) -> ScoreReport {
        let blanks = blank_locations(&self.sentences);
        let total = blanks.len().max(self.answers.len());
        score_positional(&blanks, &self.answers, answers, total)
    }

    fn student_view<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        let mut words = self.answers.clone();
        words.shuffle(rng);
        json!({
            "sentences": self.sentences,
            "words": words,
            "blank_count": blank_locations(&self.sentences).len(),
        })
    }
}

pub fn blank_locations<S: AsRef<str>>(texts: &[S]) -> Vec<BlankLocation> {
    texts
        .iter()
        .enumerate()
        .flat_map(|(sentence, text)| {
            (0..count_blanks(text.as_ref())).map(move |blank| BlankLocation { sentence, blank })
        })
        .collect()
}

fn validate_blanks(kind: ExerciseKind, blanks: &[BlankLocation], words: &[String]) -> ScoringResult<()> {
    if blanks.is_empty() {
        return Err(ScoringError::content(kind, "the text contains no ___ blank"));
    }
    if words.iter().all(|w| w.trim().is_empty()) {
        return Err(ScoringError::content(kind, "at least one expected word is required"));
    }
    Ok(())
}

fn feedback(idx: usize, blanks: &[BlankLocation], is_correct: bool) -> ItemFeedback {
    let mut item = ItemFeedback::new(idx, is_correct);
    item.location = blanks.get(idx).copied();
    item
}

fn given_at(answers: &BlankAnswers, idx: usize) -> &str {
    answers.get(idx).map(LenientText::as_str).unwrap_or_default()
}

fn score_positional(
    blanks: &[BlankLocation],
    expected: &[String],
    answers: &BlankAnswers,
    total: usize,
) -> ScoreReport {
    let details = (0..total)
        .map(|idx| {
            let given = given_at(answers, idx);
            match expected.get(idx) {
                Some(word) => feedback(idx, blanks, same_answer(given, word))
                    .expected(word)
                    .given(given),
                None => feedback(idx, blanks, false)
                    .given(given)
                    .note("aucun mot attendu pour ce trou"),
            }
        })
        .collect();

    ScoreReport::from_items(details)
}

fn score_unordered(
    blanks: &[BlankLocation],
    expected: &[String],
    answers: &BlankAnswers,
    total: usize,
) -> ScoreReport {
    let mut unused: Vec<Option<&String>> = expected.iter().map(Some).collect();

    let details = (0..total)
        .map(|idx| {
            let given = given_at(answers, idx);
            let matched = unused
                .iter_mut()
                .find(|slot| slot.is_some_and(|word| same_answer(given, word)))
                .and_then(Option::take);

            match matched {
                Some(word) => feedback(idx, blanks, true).expected(word).given(given),
                None => feedback(idx, blanks, false).given(given),
            }
        })
        .collect();

    ScoreReport::from_items(details)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Ordering exercises are recognised from their instructions
    /// ("Ranger les nombres dans l'ordre croissant").
    pub fn detect(description: &str) -> Option<Self> {
        let description = fold(description);
        if !description.contains("ranger") {
            return None;
        }
        if !description.contains("ordre") {
            return None;
        }
        if description.contains("décroissant") || description.contains("decroissant") {
            Some(Self::Descending)
        } else if description.contains("croissant") {
            Some(Self::Ascending)
        } else {
            None
        }
    }

    fn holds(&self, values: &[f64]) -> bool {
        values.windows(2).all(|pair| match self {
            Self::Ascending => pair[0] <= pair[1],
            Self::Descending => pair[0] >= pair[1],
        })
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse::<f64>().ok()
}

fn parse_numbers<'a>(texts: impl Iterator<Item = &'a str>) -> Option<Vec<f64>> {
    texts
        .filter(|t| !t.trim().is_empty())
        .map(parse_number)
        .collect()
}

/// Distinct values in ascending order, `-0.0` counted as `0.0`.
fn distinct(values: Vec<f64>) -> Vec<f64> {
    let mut values: Vec<f64> = values.into_iter().map(|v| v + 0.0).collect();
    values.sort_by(f64::total_cmp);
    values.dedup_by(|a, b| a.total_cmp(b).is_eq());
    values
}

fn score_ordering(
    direction: SortDirection,
    blanks: &[BlankLocation],
    expected: &[String],
    answers: &BlankAnswers,
    total: usize,
) -> ScoreReport {
    let given_numbers = parse_numbers(answers.0.values().map(LenientText::as_str));
    let expected_numbers = parse_numbers(expected.iter().map(String::as_str));

    let (correct, note) = match (given_numbers, expected_numbers) {
        (Some(given), Some(expected)) if !given.is_empty() => {
            let ordered = direction.holds(&given);
            let same_set = distinct(given) == distinct(expected);
            match (ordered, same_set) {
                (true, true) => (total, "ordre correct"),
                (true, false) => (total / 2, "ordre respecté mais nombres différents"),
                _ => (0, "ordre incorrect"),
            }
        }
        (Some(_), Some(_)) => (0, "aucune réponse"),
        _ => (0, "réponse non numérique"),
    };

    let details = (0..total)
        .map(|idx| {
            let given = given_at(answers, idx);
            let mut item = feedback(idx, blanks, correct == total && total > 0).given(given).note(note);
            if let Some(word) = expected.get(idx) {
                item = item.expected(word);
            }
            item
        })
        .collect();

    ScoreReport::new(correct, total, details)
}

#[cfg(test)]
mod test {
    use super::*;

    fn answers(values: Value) -> BlankAnswers {
        serde_json::from_value(values).unwrap()
    }

    fn parse(value: Value) -> FillInBlanksContent {
        let mut content: FillInBlanksContent = serde_json::from_value(value).unwrap();
        content.canonicalize();
        content
    }

    #[test]
    fn sentences_take_priority_over_text() {
        let content = parse(json!({
            "sentences": ["Le ___ dort.", "Le ___ aboie et le ___ miaule."],
            "text": "___ ___ ___ ___",
            "words": ["chat", "chien", "chat"]
        }));

        let blanks = content.blanks();
        assert_eq!(blanks.len(), 3);
        assert_eq!(blanks[2], BlankLocation { sentence: 1, blank: 1 });
    }

    #[test]
    fn falls_back_to_available_words() {
        let content = parse(json!({ "text": "Un ___", "available_words": ["chat"] }));
        assert_eq!(content.words, vec!["chat"]);
        assert!(content.validate().is_ok());
        assert!(serde_json::to_value(&content).unwrap().get("available_words").is_none());
    }

    #[test]
    fn positional_blanks_ignore_case_and_padding() {
        let content = parse(json!({
            "sentences": ["Le ___ dort.", "Le ___ aboie."],
            "words": ["chat", "chien"]
        }));

        let report = content.score("Complète les phrases", &answers(json!([" Chat ", "loup"])));
        assert_eq!(report.correct, 1);
        assert_eq!(report.total, 2);
        assert_eq!(report.details[1].location, Some(BlankLocation { sentence: 1, blank: 0 }));
        assert_eq!(report.details[1].expected.as_deref(), Some("chien"));
    }

    #[test]
    fn total_counts_extra_words() {
        let content = parse(json!({ "text": "Un ___", "words": ["chat", "chien"] }));
        let report = content.score("", &answers(json!(["chat"])));
        assert_eq!(report.total, 2);
        assert_eq!(report.score, 50.0);
    }

    #[test]
    fn unordered_blanks_consume_each_word_once() {
        let content = parse(json!({
            "text": "___ et ___",
            "words": ["sel", "poivre"],
            "order_insensitive": true
        }));

        let swapped = content.score("", &answers(json!(["poivre", "sel"])));
        assert_eq!(swapped.correct, 2);

        let repeated = content.score("", &answers(json!(["sel", "sel"])));
        assert_eq!(repeated.correct, 1);
    }

    #[test]
    fn detects_ordering_instructions() {
        assert_eq!(
            SortDirection::detect("Ranger les nombres dans l'ordre croissant"),
            Some(SortDirection::Ascending)
        );
        assert_eq!(
            SortDirection::detect("Ranger ces nombres dans l'ordre DÉCROISSANT"),
            Some(SortDirection::Descending)
        );
        assert_eq!(SortDirection::detect("Range ces nombres dans l'ordre croissant"), None);
        assert_eq!(
            SortDirection::detect("Ranger dans l'ordre decroissant"),
            Some(SortDirection::Descending)
        );
        assert_eq!(SortDirection::detect("Complète le texte"), None);
    }

    #[test]
    fn ordering_exercise_scores_whole_sequence() {
        let content = parse(json!({ "text": "___ < ___ < ___", "words": ["1,5", "2", "10"] }));
        let description = "Ranger les nombres dans l'ordre croissant";

        let ordered = content.score(description, &answers(json!(["1.5", "2", "10"])));
        assert_eq!(ordered.correct, 3);
        assert_eq!(ordered.score, 100.0);

        let other_numbers = content.score(description, &answers(json!(["1", "2", "10"])));
        assert_eq!(other_numbers.correct, 1);

        let unordered = content.score(description, &answers(json!(["2", "1,5", "10"])));
        assert_eq!(unordered.correct, 0);

        let not_numbers = content.score(description, &answers(json!(["un", "deux", "dix"])));
        assert_eq!(not_numbers.correct, 0);

        let empty = content.score(description, &answers(json!([])));
        assert_eq!(empty.correct, 0);
    }

    #[test]
    fn ordering_compares_distinct_numbers() {
        let content = parse(json!({ "text": "___ ___ ___", "words": ["2", "2", "5"] }));
        let description = "Ranger les nombres dans l'ordre croissant";

        let report = content.score(description, &answers(json!(["2", "5", "5"])));
        assert_eq!(report.correct, 3);
        assert_eq!(report.score, 100.0);

        let signed_zero = parse(json!({ "text": "___ ___", "words": ["-0", "1"] }));
        assert_eq!(signed_zero.score(description, &answers(json!(["0", "1"]))).correct, 2);
    }

    #[test]
    fn word_placement_uses_answers() {
        let content: WordPlacementContent = serde_json::from_value(json!({
            "sentences": ["Le soleil ___ à l'est.", "Il se ___ à l'ouest."],
            "answers": ["se lève", "couche"]
        }))
        .unwrap();

        assert!(content.validate().is_ok());
        let report = content.score("", &answers(json!({ "0": "se lève", "1": "Couche" })));
        assert_eq!(report.correct, 2);

        let view = content.student_view(&mut rand::rng());
        assert!(view.get("answers").is_none());
        assert_eq!(view["words"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn rejects_text_without_blanks() {
        let content = parse(json!({ "text": "Pas de trou", "words": ["x"] }));
        assert!(content.validate().is_err());
    }
}
