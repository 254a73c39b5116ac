use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{model::entity::Course, web::dto::exercises::ExerciseSummary};

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LinkExerciseBody {
    pub exercise_id: Uuid,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CourseDetails {
    #[serde(flatten)]
    pub course: Course,
    pub exercises: Vec<ExerciseSummary>,
}
