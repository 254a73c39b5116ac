use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::scoring::{ExerciseContent, ExerciseKind, ScoringResult};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Exercise {
    id: Uuid,
    title: String,
    description: String,
    exercise_type: String,
    #[schema(value_type = Object)]
    content: serde_json::Value,
    subject: Option<String>,
    max_attempts: Option<i32>,
    teacher_id: Uuid,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for Exercise {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Exercise
    }
}

impl Exercise {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn exercise_type(&self) -> &str {
        &self.exercise_type
    }

    pub fn content(&self) -> &serde_json::Value {
        &self.content
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn teacher_id(&self) -> Uuid {
        self.teacher_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Attempt limit; `None` when unlimited (a stored 0 also means unlimited).
    pub fn max_attempts(&self) -> Option<i32> {
        self.max_attempts.filter(|max| *max > 0)
    }

    pub fn kind(&self) -> ScoringResult<ExerciseKind> {
        self.exercise_type.parse()
    }

    pub fn parsed_content(&self) -> ScoringResult<ExerciseContent> {
        ExerciseContent::parse(self.kind()?, &self.content)
    }
}

/// `content` must already be validated and prepared for `exercise_type`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ExerciseCreate {
    pub title: String,
    pub description: String,
    pub exercise_type: ExerciseKind,
    #[schema(value_type = Object)]
    pub content: serde_json::Value,
    pub subject: Option<String>,
    pub max_attempts: Option<i32>,
}

/// Library filters, all optional.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct ExerciseFilter {
    pub exercise_type: Option<ExerciseKind>,
    pub subject: Option<String>,
    /// Case-insensitive match on title or description.
    pub search: Option<String>,
}

impl ExerciseFilter {
    fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.replace('%', "\\%").replace('_', "\\_")))
    }
}

#[async_trait]
impl CrudRepository<Exercise, ExerciseCreate, Uuid> for Exercise {
    /// The actor becomes the exercise author.
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: ExerciseCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO exercises (id, title, description, exercise_type, content, subject, max_attempts, teacher_id)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.exercise_type.as_str())
        .bind(&data.content)
        .bind(&data.subject)
        .bind(data.max_attempts)
        .bind(actor.user_id())
        .fetch_one(mm.executor())
        .await?;
        Ok(created)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ExerciseCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query(
            r#"
            UPDATE exercises
            SET title = $1, description = $2, exercise_type = $3, content = $4, subject = $5, max_attempts = $6
            WHERE id = $7
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.exercise_type.as_str())
        .bind(&data.content)
        .bind(&data.subject)
        .bind(data.max_attempts)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.title = data.title;
        self.description = data.description;
        self.exercise_type = data.exercise_type.to_string();
        self.content = data.content;
        self.subject = data.subject;
        self.max_attempts = data.max_attempts;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM exercises WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM exercises WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        Self::search(mm, actor, &ExerciseFilter::default(), limit, offset).await
    }

    async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        Self::count_filtered(mm, actor, &ExerciseFilter::default()).await
    }
}

impl_paginatable_for!(Exercise, ExerciseCreate, Uuid);

#[async_trait]
impl HasOwner for Exercise {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.teacher_id)
    }
}

const FILTER_CLAUSE: &str = r#"
    ($1::TEXT IS NULL OR exercise_type = $1)
    AND ($2::TEXT IS NULL OR lower(subject) = lower($2))
    AND ($3::TEXT IS NULL OR title ILIKE $3 OR description ILIKE $3)
"#;

impl Exercise {
    /// Exercise library, newest first.
    pub async fn search(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        filter: &ExerciseFilter,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let query = format!(
            "SELECT * FROM exercises WHERE {FILTER_CLAUSE} ORDER BY created_at DESC LIMIT $4 OFFSET $5"
        );
        let result = sqlx::query_as(&query)
            .bind(filter.exercise_type.map(|k| k.as_str()))
            .bind(&filter.subject)
            .bind(filter.search_pattern())
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn count_filtered(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        filter: &ExerciseFilter,
    ) -> DatabaseResult<i64> {
        let query = format!("SELECT COUNT(*) FROM exercises WHERE {FILTER_CLAUSE}");
        let result: i64 = sqlx::query_scalar(&query)
            .bind(filter.exercise_type.map(|k| k.as_str()))
            .bind(&filter.subject)
            .bind(filter.search_pattern())
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }

    /// Exercises linked to a course, in course order.
    pub async fn all_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT e.* FROM exercises e
            JOIN course_exercises ce ON ce.exercise_id = e.id
            WHERE ce.course_id = $1
            ORDER BY ce.position
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    /// Whether a student reaches this exercise through a course of one of their classes.
    pub async fn is_assigned_to(&self, mm: &ModelManager, student_id: Uuid) -> DatabaseResult<bool> {
        let found: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM course_exercises ce
                JOIN courses co ON co.id = ce.course_id
                JOIN class_students cs ON cs.class_id = co.class_id
                WHERE ce.exercise_id = $1 AND cs.student_id = $2
            )
            "#,
        )
        .bind(self.id)
        .bind(student_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(found)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn search_pattern_escapes_wildcards() {
        let filter = ExerciseFilter {
            search: Some(" 100% _ ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search_pattern().as_deref(), Some("%100\\% \\_%"));
        assert_eq!(ExerciseFilter::default().search_pattern(), None);
    }
}
