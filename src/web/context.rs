//! Request context, e.g. user id, its role, subscription state, etc.
//!

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};

use crate::web::{WebResult, error::WebError};

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    user_id: uuid::Uuid,
    user_role: UserRole,
    subscription: SubscriptionStatus,
}

impl AuthenticatedUser {
    pub fn new(user_id: uuid::Uuid, user_role: UserRole, subscription: SubscriptionStatus) -> Self {
        Self {
            user_id,
            user_role,
            subscription,
        }
    }

    pub fn admin() -> Self {
        Self {
            user_role: UserRole::Admin,
            user_id: uuid::Uuid::max(), // admin ID
            subscription: SubscriptionStatus::Approved,
        }
    }

    pub fn user_id(&self) -> uuid::Uuid {
        self.user_id
    }

    pub fn user_role(&self) -> UserRole {
        self.user_role
    }

    pub fn subscription(&self) -> SubscriptionStatus {
        self.subscription
    }

    pub fn is_admin(&self) -> bool {
        self.user_role == UserRole::Admin
    }

    /// Admins, and teachers whose subscription was approved.
    pub fn can_author(&self) -> bool {
        match self.user_role {
            UserRole::Admin => true,
            UserRole::Teacher => self.subscription == SubscriptionStatus::Approved,
            UserRole::Student => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Teacher,
    Student,
}

impl From<&str> for UserRole {
    fn from(value: &str) -> Self {
        match value {
            "admin" => Self::Admin,
            "teacher" => Self::Teacher,
            _ => Self::Student,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Teacher => write!(f, "teacher"),
            Self::Student => write!(f, "student"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Pending,
    Approved,
    Rejected,
}

impl From<&str> for SubscriptionStatus {
    fn from(value: &str) -> Self {
        match value {
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    maybe_user: Option<AuthenticatedUser>,
}

impl RequestContext {
    pub fn new(maybe_user: Option<AuthenticatedUser>) -> Self {
        Self { maybe_user }
    }

    pub fn admin() -> Self {
        Self::new(Some(AuthenticatedUser::admin()))
    }

    pub fn maybe_user(&self) -> Option<&AuthenticatedUser> {
        self.maybe_user.as_ref()
    }

    pub fn user(&self) -> WebResult<&AuthenticatedUser> {
        self.maybe_user.as_ref().ok_or(WebError::auth_required())
    }

    pub fn admin_user(&self) -> WebResult<&AuthenticatedUser> {
        let user = self.user()?;
        if !user.is_admin() {
            return Err(WebError::auth_role_required(UserRole::Admin));
        }
        Ok(user)
    }

    /// User allowed to create classes, courses and exercises.
    pub fn author(&self) -> WebResult<&AuthenticatedUser> {
        let user = self.user()?;
        match user.user_role() {
            UserRole::Student => Err(WebError::auth_role_required(UserRole::Teacher)),
            _ if !user.can_author() => Err(WebError::auth_subscription_required(user.subscription())),
            _ => Ok(user),
        }
    }

    pub fn student(&self) -> WebResult<&AuthenticatedUser> {
        let user = self.user()?;
        if user.user_role() != UserRole::Student {
            return Err(WebError::auth_role_required(UserRole::Student));
        }
        Ok(user)
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts.extensions.get::<RequestContext>();
        if let Some(ctx) = ctx {
            Ok(ctx.clone())
        } else {
            Ok(RequestContext::new(None))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn user(role: UserRole, subscription: SubscriptionStatus) -> RequestContext {
        RequestContext::new(Some(AuthenticatedUser::new(uuid::Uuid::new_v4(), role, subscription)))
    }

    #[test]
    fn roles_round_trip_through_strings() {
        for role in [UserRole::Admin, UserRole::Teacher, UserRole::Student] {
            assert_eq!(UserRole::from(role.to_string().as_str()), role);
        }
        assert_eq!(SubscriptionStatus::from("approved"), SubscriptionStatus::Approved);
        assert_eq!(SubscriptionStatus::from("paid"), SubscriptionStatus::Pending);
    }

    #[test]
    fn only_approved_teachers_and_admins_author() {
        assert!(user(UserRole::Teacher, SubscriptionStatus::Approved).author().is_ok());
        assert!(user(UserRole::Admin, SubscriptionStatus::Approved).author().is_ok());
        assert!(user(UserRole::Teacher, SubscriptionStatus::Pending).author().is_err());
        assert!(user(UserRole::Student, SubscriptionStatus::Approved).author().is_err());
        assert!(RequestContext::new(None).author().is_err());
    }

    #[test]
    fn student_guard() {
        assert!(user(UserRole::Student, SubscriptionStatus::Approved).student().is_ok());
        assert!(user(UserRole::Teacher, SubscriptionStatus::Approved).student().is_err());
    }
}
