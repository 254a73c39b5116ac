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
pub struct Course {
    id: Uuid,
    class_id: Uuid,
    title: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for Course {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Course
    }
}

impl Course {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn class_id(&self) -> Uuid {
        self.class_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseCreate {
    pub class_id: Uuid,
    pub title: String,
    pub content: String,
}

#[async_trait]
impl CrudRepository<Course, CourseCreate, Uuid> for Course {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            "INSERT INTO courses (id, class_id, title, content) VALUES ($1,$2,$3,$4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.class_id)
        .bind(&data.title)
        .bind(&data.content)
        .fetch_one(mm.executor())
        .await?;
        Ok(created)
    }

    /// Courses stay in their class, `class_id` is ignored.
    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE courses SET title = $1, content = $2 WHERE id = $3")
            .bind(&data.title)
            .bind(&data.content)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.title = data.title;
        self.content = data.content;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM courses WHERE id = $1")
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
        let result = sqlx::query_as(
            r#"
            SELECT co.* FROM courses co
            JOIN classes c ON c.id = co.class_id
            WHERE $1
                OR c.teacher_id = $2
                OR EXISTS (SELECT 1 FROM class_students cs WHERE cs.class_id = c.id AND cs.student_id = $2)
            ORDER BY co.created_at
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
        let result: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM courses co
            JOIN classes c ON c.id = co.class_id
            WHERE $1
                OR c.teacher_id = $2
                OR EXISTS (SELECT 1 FROM class_students cs WHERE cs.class_id = c.id AND cs.student_id = $2)
            "#,
        )
        .bind(actor.user_role() == UserRole::Admin)
        .bind(actor.user_id())
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }
}

impl_paginatable_for!(Course, CourseCreate, Uuid);

#[async_trait]
impl HasOwner for Course {
    type OwnerId = Uuid;

    /// Teacher of the class holding the course.
    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let teacher_id = sqlx::query_scalar("SELECT teacher_id FROM classes WHERE id = $1")
            .bind(self.class_id)
            .fetch_one(mm.executor())
            .await?;
        Ok(teacher_id)
    }
}

impl Course {
    pub async fn all_by_class(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        class_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses WHERE class_id = $1 ORDER BY created_at")
            .bind(class_id)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    /// Links an exercise at the end of the course. `false` when already linked.
    pub async fn link_exercise(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        exercise_id: Uuid,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO course_exercises (course_id, exercise_id, position)
            SELECT $1, $2, COALESCE(MAX(position) + 1, 0)
            FROM course_exercises WHERE course_id = $1
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(self.id)
        .bind(exercise_id)
        .execute(mm.executor())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// `false` when the exercise was not linked.
    pub async fn unlink_exercise(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        exercise_id: Uuid,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM course_exercises WHERE course_id = $1 AND exercise_id = $2")
            .bind(self.id)
            .bind(exercise_id)
            .execute(mm.executor())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn has_exercise(&self, mm: &ModelManager, exercise_id: Uuid) -> DatabaseResult<bool> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM course_exercises WHERE course_id = $1 AND exercise_id = $2)",
        )
        .bind(self.id)
        .bind(exercise_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(found)
    }
}
