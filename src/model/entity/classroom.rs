use crate::auth::generate_access_code;
use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{DatabaseError, ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::{AuthenticatedUser, UserRole};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

const ACCESS_CODE_TRIES: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Classroom {
    id: Uuid,
    name: String,
    description: String,
    teacher_id: Uuid,
    access_code: String,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for Classroom {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Class
    }
}

impl Classroom {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn teacher_id(&self) -> Uuid {
        self.teacher_id
    }

    pub fn access_code(&self) -> &str {
        &self.access_code
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ClassroomCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[async_trait]
impl CrudRepository<Classroom, ClassroomCreate, Uuid> for Classroom {
    /// The actor becomes the class teacher. Access code collisions are retried.
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: ClassroomCreate,
    ) -> DatabaseResult<Self> {
        let mut tries = 0;

        loop {
            tries += 1;
            let result: DatabaseResult<Self> = sqlx::query_as(
                r#"
                INSERT INTO classes (id, name, description, teacher_id, access_code)
                VALUES ($1,$2,$3,$4,$5)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&data.name)
            .bind(&data.description)
            .bind(actor.user_id())
            .bind(generate_access_code())
            .fetch_one(mm.executor())
            .await
            .map_err(DatabaseError::from);

            match result {
                Ok(created) => return Ok(created),
                Err(e) if e.is_unique_violation() && tries < ACCESS_CODE_TRIES => {
                    tracing::debug!("access code collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ClassroomCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE classes SET name = $1, description = $2 WHERE id = $3")
            .bind(&data.name)
            .bind(&data.description)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.name = data.name;
        self.description = data.description;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM classes WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM classes WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Admins see every class, teachers their own, students those they joined.
    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let query = match actor.user_role() {
            UserRole::Admin => {
                "SELECT * FROM classes WHERE $1::UUID IS NOT NULL ORDER BY created_at DESC LIMIT $2 OFFSET $3"
            }
            UserRole::Teacher => {
                "SELECT * FROM classes WHERE teacher_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
            }
            UserRole::Student => {
                r#"
                SELECT c.* FROM classes c
                JOIN class_students cs ON cs.class_id = c.id
                WHERE cs.student_id = $1
                ORDER BY cs.joined_at DESC
                LIMIT $2 OFFSET $3
                "#
            }
        };

        let result = sqlx::query_as(query)
            .bind(actor.user_id())
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let query = match actor.user_role() {
            UserRole::Admin => "SELECT COUNT(*) FROM classes WHERE $1::UUID IS NOT NULL",
            UserRole::Teacher => "SELECT COUNT(*) FROM classes WHERE teacher_id = $1",
            UserRole::Student => "SELECT COUNT(*) FROM class_students WHERE student_id = $1",
        };

        let result: i64 = sqlx::query_scalar(query)
            .bind(actor.user_id())
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}

impl_paginatable_for!(Classroom, ClassroomCreate, Uuid);

#[async_trait]
impl HasOwner for Classroom {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.teacher_id)
    }
}

impl Classroom {
    pub async fn find_by_access_code(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        code: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM classes WHERE access_code = $1")
            .bind(code.trim().to_uppercase())
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }
}
