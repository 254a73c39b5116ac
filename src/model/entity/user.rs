use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::web::AuthenticatedUser;
use crate::web::{SubscriptionStatus, UserRole};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};

pub static BOOTSTRAP_ADMIN_USERNAME: &str = "admin";
pub static BOOTSTRAP_ADMIN_EMAIL: &str = "admin@example.com";

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct UserEntity {
    id: uuid::Uuid,
    username: String,
    email: String,
    name: String,
    #[serde(skip)]
    password_hash: String,
    role: String,
    school_name: Option<String>,
    subscription_status: String,
    rejection_reason: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UserEntityCreateUpdate {
    pub username: String,
    pub email: String,
    pub name: String,
    /// Empty on update keeps the current password.
    pub password_hash: String,
    pub role: UserRole,
    pub school_name: Option<String>,
}

impl ResourceTyped for UserEntity {
    fn get_resource_type() -> crate::model::repo::ResourceType {
        crate::model::repo::ResourceType::User
    }
}

impl UserEntity {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.as_str())
    }

    pub fn school_name(&self) -> Option<&str> {
        self.school_name.as_deref()
    }

    pub fn subscription_status(&self) -> SubscriptionStatus {
        SubscriptionStatus::from(self.subscription_status.as_str())
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    pub fn authenticated(&self) -> AuthenticatedUser {
        AuthenticatedUser::new(self.id, self.role(), self.subscription_status())
    }
}

/// Students and admins need no review, teachers wait for an admin.
fn initial_subscription(role: UserRole) -> SubscriptionStatus {
    match role {
        UserRole::Teacher => SubscriptionStatus::Pending,
        UserRole::Admin | UserRole::Student => SubscriptionStatus::Approved,
    }
}

#[async_trait::async_trait]
impl CrudRepository<UserEntity, UserEntityCreateUpdate, uuid::Uuid> for UserEntity {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityCreateUpdate,
    ) -> DatabaseResult<Self> {
        let status = initial_subscription(data.role);
        let approved_at = (status == SubscriptionStatus::Approved).then(Utc::now);

        let created = sqlx::query_as(
            r#"
            INSERT INTO users (id, username, email, name, password_hash, role, school_name, subscription_status, approved_at)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.name)
        .bind(&data.password_hash)
        .bind(data.role.to_string())
        .bind(&data.school_name)
        .bind(status.to_string())
        .bind(approved_at)
        .fetch_one(mm.executor())
        .await?;

        Ok(created)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityCreateUpdate,
    ) -> DatabaseResult<Self> {
        if !data.password_hash.is_empty() {
            self.password_hash = data.password_hash;
        }

        sqlx::query(
            "UPDATE users SET username = $1, email = $2, name = $3, school_name = $4, password_hash = $5 WHERE id = $6",
        )
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.name)
        .bind(&data.school_name)
        .bind(&self.password_hash)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.username = data.username;
        self.email = data.email;
        self.name = data.name;
        self.school_name = data.school_name;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM users ORDER BY created_at LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(UserEntity, UserEntityCreateUpdate, Uuid);

#[async_trait]
impl HasOwner for UserEntity {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.id) // owners of users are themselves
    }
}

impl UserEntity {
    pub async fn find_by_username(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        username: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn find_by_email(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        email: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email.trim())
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Teachers, newest first, optionally restricted to one subscription state.
    pub async fn list_teachers(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        status: Option<SubscriptionStatus>,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT * FROM users
            WHERE role = 'teacher' AND ($1::TEXT IS NULL OR subscription_status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status.map(|s| s.to_string()))
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn count_teachers(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        status: Option<SubscriptionStatus>,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE role = 'teacher' AND ($1::TEXT IS NULL OR subscription_status = $1)",
        )
        .bind(status.map(|s| s.to_string()))
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn set_subscription(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        status: SubscriptionStatus,
        rejection_reason: Option<String>,
    ) -> DatabaseResult<Self> {
        let approved_at = (status == SubscriptionStatus::Approved).then(Utc::now);

        sqlx::query(
            "UPDATE users SET subscription_status = $1, rejection_reason = $2, approved_at = $3 WHERE id = $4",
        )
        .bind(status.to_string())
        .bind(&rejection_reason)
        .bind(approved_at)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.subscription_status = status.to_string();
        self.rejection_reason = rejection_reason;
        self.approved_at = approved_at;
        Ok(self)
    }

    /// Creates the bootstrap admin account unless an admin already exists.
    pub async fn ensure_admin(mm: &ModelManager, password_hash: String) -> DatabaseResult<Option<Self>> {
        let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(mm.executor())
            .await?;
        if admins > 0 {
            return Ok(None);
        }

        let data = UserEntityCreateUpdate {
            username: BOOTSTRAP_ADMIN_USERNAME.to_string(),
            email: BOOTSTRAP_ADMIN_EMAIL.to_string(),
            name: String::from("Administrateur"),
            password_hash,
            role: UserRole::Admin,
            school_name: None,
        };
        let created = Self::create(mm, &AuthenticatedUser::admin(), data).await?;
        Ok(Some(created))
    }
}
