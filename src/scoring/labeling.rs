use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::scoring::de::LenientText;
use crate::scoring::normalize::same_answer;
use crate::scoring::{ExerciseKind, ExerciseScorer, ItemFeedback, ScoreReport, ScoringError, ScoringResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelingContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_image: Option<String>,
    pub zones: Vec<LabelZone>,
}

/// Zone position in percent of the image size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelZone {
    pub x: f64,
    pub y: f64,
    pub label: String,
}

impl ExerciseScorer for LabelingContent {
    /// Zone id, counted from 1, to the chosen label.
    type Answers = BTreeMap<String, LenientText>;
    const KIND: ExerciseKind = ExerciseKind::ImageLabeling;

    fn validate(&self) -> ScoringResult<()> {
        if self.zones.is_empty() {
            return Err(ScoringError::content(Self::KIND, "at least one zone is required"));
        }
        if let Some(idx) = self.zones.iter().position(|z| z.label.trim().is_empty()) {
            return Err(ScoringError::content(
                Self::KIND,
                format!("zone {} has no label", idx + 1),
            ));
        }
        Ok(())
    }

    fn score(&self, _description: &str, answers: &Self::Answers) -> ScoreReport {
        let details = self
            .zones
            .iter()
            .enumerate()
            .map(|(idx, zone)| {
                let given = zone_answer(answers, idx + 1).unwrap_or_default();
                ItemFeedback::new(idx, same_answer(given, &zone.label))
                    .expected(&zone.label)
                    .given(given)
            })
            .collect();

        ScoreReport::from_items(details)
    }

    fn student_view<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        let zones: Vec<Value> = self
            .zones
            .iter()
            .enumerate()
            .map(|(idx, z)| json!({ "id": idx + 1, "x": z.x, "y": z.y }))
            .collect();
        let mut labels: Vec<&str> = self.zones.iter().map(|z| z.label.as_str()).collect();
        labels.shuffle(rng);

        json!({ "main_image": self.main_image, "zones": zones, "labels": labels })
    }
}

/// Label chosen for zone `id`; keys are compared trimmed.
fn zone_answer(answers: &BTreeMap<String, LenientText>, id: usize) -> Option<&str> {
    let id = id.to_string();
    answers
        .iter()
        .find(|(key, _)| key.trim() == id)
        .map(|(_, label)| label.as_str())
}

#[cfg(test)]
mod test {
    use super::*;

    fn content() -> LabelingContent {
        serde_json::from_value(json!({
            "main_image": "/static/uploads/coeur.png",
            "zones": [
                { "x": 10.0, "y": 20.0, "label": "Oreillette" },
                { "x": 40, "y": 60, "label": "Ventricule" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn zones_are_matched_by_one_based_id() {
        let answers: BTreeMap<String, LenientText> =
            serde_json::from_value(json!({ "1": "oreillette ", "2": "Aorte" })).unwrap();
        let report = content().score("", &answers);

        assert_eq!(report.correct, 1);
        assert_eq!(report.details[1].expected.as_deref(), Some("Ventricule"));
    }

    #[test]
    fn padded_zone_ids_still_match() {
        let answers: BTreeMap<String, LenientText> =
            serde_json::from_value(json!({ " 1": "Oreillette", "2 ": "Ventricule" })).unwrap();
        let report = content().score("", &answers);

        assert_eq!(report.correct, 2);
        assert_eq!(report.score, 100.0);
        assert_eq!(report.details[0].given.as_deref(), Some("Oreillette"));
    }

    #[test]
    fn student_view_moves_labels_to_a_bank() {
        let view = content().student_view(&mut rand::rng());
        assert!(view["zones"][0].get("label").is_none());
        assert_eq!(view["zones"][1]["id"], 2);
        assert_eq!(view["labels"].as_array().map(Vec::len), Some(2));
    }
}
