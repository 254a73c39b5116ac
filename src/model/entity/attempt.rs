use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::{AuthenticatedUser, UserRole};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct ExerciseAttempt {
    id: Uuid,
    student_id: Uuid,
    exercise_id: Uuid,
    course_id: Option<Uuid>,
    score: f64,
    #[schema(value_type = Object)]
    answers: serde_json::Value,
    #[schema(value_type = Object)]
    feedback: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for ExerciseAttempt {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Attempt
    }
}

impl ExerciseAttempt {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn student_id(&self) -> Uuid {
        self.student_id
    }

    pub fn exercise_id(&self) -> Uuid {
        self.exercise_id
    }

    pub fn course_id(&self) -> Option<Uuid> {
        self.course_id
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn answers(&self) -> &serde_json::Value {
        &self.answers
    }

    pub fn feedback(&self) -> &serde_json::Value {
        &self.feedback
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExerciseAttemptCreate {
    pub exercise_id: Uuid,
    pub course_id: Option<Uuid>,
    pub score: f64,
    pub answers: serde_json::Value,
    pub feedback: serde_json::Value,
}

#[async_trait]
impl CrudRepository<ExerciseAttempt, ExerciseAttemptCreate, Uuid> for ExerciseAttempt {
    /// Records an attempt of the actor.
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: ExerciseAttemptCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO exercise_attempts (id, student_id, exercise_id, course_id, score, answers, feedback)
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(data.exercise_id)
        .bind(data.course_id)
        .bind(data.score.clamp(0.0, 100.0))
        .bind(&data.answers)
        .bind(&data.feedback)
        .fetch_one(mm.executor())
        .await?;
        Ok(created)
    }

    /// Stores a new score for the same answers, e.g. after the exercise was corrected.
    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ExerciseAttemptCreate,
    ) -> DatabaseResult<Self> {
        let score = data.score.clamp(0.0, 100.0);
        sqlx::query("UPDATE exercise_attempts SET score = $1, answers = $2, feedback = $3 WHERE id = $4")
            .bind(score)
            .bind(&data.answers)
            .bind(&data.feedback)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.score = score;
        self.answers = data.answers;
        self.feedback = data.feedback;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM exercise_attempts WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM exercise_attempts WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Own attempts; admins see all of them.
    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT * FROM exercise_attempts
            WHERE $1 OR student_id = $2
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(actor.user_role() == UserRole::Admin)
        .bind(actor.user_id())
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM exercise_attempts WHERE $1 OR student_id = $2")
                .bind(actor.user_role() == UserRole::Admin)
                .bind(actor.user_id())
                .fetch_one(mm.executor())
                .await?;
        Ok(result)
    }
}

impl_paginatable_for!(ExerciseAttempt, ExerciseAttemptCreate, Uuid);

#[async_trait]
impl HasOwner for ExerciseAttempt {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.student_id)
    }
}

impl ExerciseAttempt {
    /// Records an attempt unless the actor already used `max_attempts` on the exercise, in which
    /// case `None` is returned. Submissions of one student to one exercise are serialized.
    pub async fn create_within_limit(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: ExerciseAttemptCreate,
        max_attempts: Option<i32>,
    ) -> DatabaseResult<Option<Self>> {
        let mut tx = mm.executor().begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text || ':' || $2::text))")
            .bind(actor.user_id())
            .bind(data.exercise_id)
            .execute(&mut *tx)
            .await?;

        if let Some(max_attempts) = max_attempts {
            let used: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM exercise_attempts WHERE student_id = $1 AND exercise_id = $2",
            )
            .bind(actor.user_id())
            .bind(data.exercise_id)
            .fetch_one(&mut *tx)
            .await?;
            if used >= i64::from(max_attempts) {
                return Ok(None);
            }
        }

        let created = sqlx::query_as(
            r#"
            INSERT INTO exercise_attempts (id, student_id, exercise_id, course_id, score, answers, feedback)
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(data.exercise_id)
        .bind(data.course_id)
        .bind(data.score.clamp(0.0, 100.0))
        .bind(&data.answers)
        .bind(&data.feedback)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(created))
    }

    pub async fn count_for(
        mm: &ModelManager,
        student_id: Uuid,
        exercise_id: Uuid,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM exercise_attempts WHERE student_id = $1 AND exercise_id = $2",
        )
        .bind(student_id)
        .bind(exercise_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }
}
