use serde::{Deserialize, Serialize};

use crate::web::SubscriptionStatus;

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct TeacherListQuery {
    pub status: Option<SubscriptionStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

pub(crate) fn default_limit() -> i64 {
    20
}

#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RejectBody {
    #[serde(default)]
    pub reason: Option<String>,
}
