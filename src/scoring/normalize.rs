//! Text folding shared by the scorers.

/// Marker used for a blank in sentences and texts.
pub const BLANK: &str = "___";

const UNDERLINE_TRIM: &[char] = &[
    '.', ',', '!', '?', ';', ':', '\'', '"', '(', ')', '[', ']', '{', '}', '«', '»',
];

const ELISIONS: &[&str] = &["qu'", "l'", "d'", "n'", "m'", "t'", "s'", "c'", "j'"];

/// Trimmed, lower-cased form used for free-text answers.
pub fn fold(text: &str) -> String {
    text.trim().to_lowercase()
}

pub fn same_answer(given: &str, expected: &str) -> bool {
    !given.trim().is_empty() && fold(given) == fold(expected)
}

pub fn count_blanks(text: &str) -> usize {
    text.matches(BLANK).count()
}

/// Lower-case, drop ASCII punctuation and collapse runs of whitespace.
pub fn dictation_text(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();

    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normal form of an underlined word: `L'Autoroute,` and `autoroute` are the same word.
pub fn underlined_word(word: &str) -> String {
    let lowered = word.trim().to_lowercase().replace('’', "'");
    let stripped = lowered.trim_matches(UNDERLINE_TRIM);

    ELISIONS
        .iter()
        .find_map(|prefix| stripped.strip_prefix(prefix))
        .unwrap_or(stripped)
        .to_string()
}

pub fn percentage(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fold_ignores_case_and_padding() {
        assert_eq!(fold("  Isocèle "), "isocèle");
        assert!(same_answer("RECTANGLE", "rectangle "));
        assert!(!same_answer("   ", ""));
    }

    #[test]
    fn blank_count_is_non_overlapping() {
        assert_eq!(count_blanks("Un triangle ___ et ___"), 2);
        assert_eq!(count_blanks("______"), 2);
        assert_eq!(count_blanks("rien"), 0);
    }

    #[test]
    fn dictation_text_drops_punctuation() {
        assert_eq!(dictation_text("Le chat,  dort. "), "le chat dort");
        assert_eq!(dictation_text("L'été!"), "lété");
    }

    #[test]
    fn underlined_word_strips_elisions() {
        assert_eq!(underlined_word("L'autoroute,"), "autoroute");
        assert_eq!(underlined_word("«Qu’il»"), "il");
        assert_eq!(underlined_word("les"), "les");
        assert_eq!(underlined_word("(chien)"), "chien");
    }

    #[test]
    fn percentage_of_empty_total_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(round1(33.333), 33.3);
    }
}
