use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    model::{
        StudentProgress,
        entity::{Exercise, ExerciseCreate, ExerciseFilter},
    },
    scoring::{ExerciseContent, ExerciseKind, ScoreReport, ScoringResult},
    web::dto::admin::default_limit,
};

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ExerciseBody {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub exercise_type: ExerciseKind,
    #[schema(value_type = Object)]
    pub content: Value,
    #[serde(default)]
    pub subject: Option<String>,
    /// Absent or 0 for unlimited attempts.
    #[serde(default)]
    pub max_attempts: Option<i32>,
}

impl ExerciseBody {
    /// Validates the content for its type and fills its generated parts.
    pub fn into_create<R: Rng + ?Sized>(self, rng: &mut R) -> ScoringResult<ExerciseCreate> {
        let mut content = ExerciseContent::parse(self.exercise_type, &self.content)?;
        content.prepare(rng)?;

        Ok(ExerciseCreate {
            title: self.title,
            description: self.description,
            exercise_type: self.exercise_type,
            content: content.to_value()?,
            subject: self.subject.filter(|s| !s.trim().is_empty()),
            max_attempts: self.max_attempts.filter(|max| *max > 0),
        })
    }
}

/// Exercise without its content, as listed in the library and in courses.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExerciseSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub exercise_type: String,
    pub subject: Option<String>,
    pub max_attempts: Option<i32>,
    pub teacher_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<&Exercise> for ExerciseSummary {
    fn from(exercise: &Exercise) -> Self {
        Self {
            id: exercise.id(),
            title: exercise.title().to_string(),
            description: exercise.description().to_string(),
            exercise_type: exercise.exercise_type().to_string(),
            subject: exercise.subject().map(str::to_string),
            max_attempts: exercise.max_attempts(),
            teacher_id: exercise.teacher_id(),
            created_at: exercise.created_at(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExerciseResponse {
    #[serde(flatten)]
    pub summary: ExerciseSummary,
    #[schema(value_type = Object)]
    pub content: Value,
    /// `true` when answer keys were removed from `content`.
    pub redacted: bool,
}

impl ExerciseResponse {
    /// Full content for authors, the student view for everyone else.
    pub fn for_viewer<R: Rng + ?Sized>(
        exercise: &Exercise,
        full: bool,
        rng: &mut R,
    ) -> ScoringResult<Self> {
        let content = if full {
            exercise.content().clone()
        } else {
            exercise.parsed_content()?.student_view(rng)
        };

        Ok(Self {
            summary: ExerciseSummary::from(exercise),
            content,
            redacted: !full,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct LibraryQuery {
    pub exercise_type: Option<ExerciseKind>,
    pub subject: Option<String>,
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl LibraryQuery {
    pub fn filter(&self) -> ExerciseFilter {
        ExerciseFilter {
            exercise_type: self.exercise_type,
            subject: self.subject.clone().filter(|s| !s.trim().is_empty()),
            search: self.search.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmitBody {
    #[serde(default)]
    pub course_id: Option<Uuid>,
    /// List indexed by item, or an object keyed by item index (zone id for image labeling).
    #[serde(default)]
    #[schema(value_type = Object)]
    pub answers: Value,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubmitResponse {
    pub attempt_id: Uuid,
    pub report: ScoreReport,
    pub progress: StudentProgress,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct StatsQuery {
    pub course_id: Option<Uuid>,
}
