use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Enrolment of a student in a class.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct ClassMembership {
    pub class_id: Uuid,
    pub student_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

impl ResourceTyped for ClassMembership {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Membership
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct EnrolledStudent {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub email: String,
    pub joined_at: DateTime<Utc>,
}

impl ClassMembership {
    /// Enrols the actor. `Ok(None)` when already enrolled.
    pub async fn join(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        class_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO class_students (class_id, student_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            RETURNING *
            "#,
        )
        .bind(class_id)
        .bind(actor.user_id())
        .fetch_optional(mm.executor())
        .await?;
        Ok(row)
    }

    pub async fn is_enrolled(
        mm: &ModelManager,
        student_id: Uuid,
        class_id: Uuid,
    ) -> DatabaseResult<bool> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM class_students WHERE class_id = $1 AND student_id = $2)",
        )
        .bind(class_id)
        .bind(student_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(found)
    }

    pub async fn students(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        class_id: Uuid,
    ) -> DatabaseResult<Vec<EnrolledStudent>> {
        let rows = sqlx::query_as(
            r#"
            SELECT u.id, u.username, u.name, u.email, cs.joined_at
            FROM class_students cs
            JOIN users u ON u.id = cs.student_id
            WHERE cs.class_id = $1
            ORDER BY u.name, u.username
            "#,
        )
        .bind(class_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }

    /// `false` when the student was not enrolled.
    pub async fn remove(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        class_id: Uuid,
        student_id: Uuid,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM class_students WHERE class_id = $1 AND student_id = $2")
            .bind(class_id)
            .bind(student_id)
            .execute(mm.executor())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
