use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::scoring::ScoringError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Qcm,
    QcmMultichoix,
    FillInBlanks,
    WordPlacement,
    WordSearch,
    Pairs,
    DragAndDrop,
    Flashcards,
    Dictation,
    ImageLabeling,
    UnderlineWords,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 11] = [
        Self::Qcm,
        Self::QcmMultichoix,
        Self::FillInBlanks,
        Self::WordPlacement,
        Self::WordSearch,
        Self::Pairs,
        Self::DragAndDrop,
        Self::Flashcards,
        Self::Dictation,
        Self::ImageLabeling,
        Self::UnderlineWords,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Qcm => "qcm",
            Self::QcmMultichoix => "qcm_multichoix",
            Self::FillInBlanks => "fill_in_blanks",
            Self::WordPlacement => "word_placement",
            Self::WordSearch => "word_search",
            Self::Pairs => "pairs",
            Self::DragAndDrop => "drag_and_drop",
            Self::Flashcards => "flashcards",
            Self::Dictation => "dictation",
            Self::ImageLabeling => "image_labeling",
            Self::UnderlineWords => "underline_words",
        }
    }

    /// French label shown in the exercise library.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Qcm => "QCM",
            Self::QcmMultichoix => "QCM multichoix",
            Self::FillInBlanks => "Texte à trous",
            Self::WordPlacement => "Mots à placer",
            Self::WordSearch => "Mots mêlés",
            Self::Pairs => "Association de paires",
            Self::DragAndDrop => "Glisser-déposer",
            Self::Flashcards => "Cartes mémoire",
            Self::Dictation => "Dictée",
            Self::ImageLabeling => "Étiquettes sur image",
            Self::UnderlineWords => "Souligner les mots",
        }
    }
}

impl std::fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == trimmed)
            .ok_or_else(|| ScoringError::UnknownKind(trimmed.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_every_stored_name() {
        for kind in ExerciseKind::ALL {
            assert_eq!(kind.as_str().parse::<ExerciseKind>().unwrap(), kind);
        }
    }

    #[test]
    fn serde_uses_stored_names() {
        let json = serde_json::to_string(&ExerciseKind::QcmMultichoix).unwrap();
        assert_eq!(json, "\"qcm_multichoix\"");
    }

    #[test]
    fn rejects_unknown_name() {
        let err = "pair_match".parse::<ExerciseKind>().unwrap_err();
        assert!(matches!(err, ScoringError::UnknownKind(name) if name == "pair_match"));
    }
}
