use serde::{Deserialize, Serialize};

use crate::model::entity::{Classroom, Course};

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct JoinClassBody {
    pub access_code: String,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseBody {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ClassDetails {
    #[serde(flatten)]
    pub class: Classroom,
    pub courses: Vec<Course>,
}
