use serde::{Deserialize, Serialize};

use crate::web::{UserRole, WebError, WebResult};

fn require(field: &str, value: &str) -> WebResult<()> {
    if value.trim().is_empty() {
        return Err(WebError::user_bad_request(format!("`{field}` must not be empty")));
    }
    Ok(())
}

fn require_email(email: &str) -> WebResult<()> {
    require("email", email)?;
    let valid = email
        .trim()
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(WebError::user_bad_request("`email` is not a valid address"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct StudentSignupBody {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Display name, defaults to the username.
    #[serde(default)]
    pub name: Option<String>,
}

impl StudentSignupBody {
    pub fn validate(&self) -> WebResult<()> {
        require("username", &self.username)?;
        require_email(&self.email)?;
        require("password", &self.password)
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct TeacherSignupBody {
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub school_name: Option<String>,
}

impl TeacherSignupBody {
    pub fn validate(&self) -> WebResult<()> {
        require("username", &self.username)?;
        require_email(&self.email)?;
        require("password", &self.password)?;
        require("name", &self.name)
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SigninBody {
    pub email: String,
    pub password: String,
}

/// Account update. Absent fields keep their current value.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UserUpdateBody {
    pub username: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub school_name: Option<String>,
}

impl UserUpdateBody {
    pub fn validate(&self) -> WebResult<()> {
        if let Some(username) = &self.username {
            require("username", username)?;
        }
        if let Some(email) = &self.email {
            require_email(email)?;
        }
        if let Some(password) = &self.password {
            require("password", password)?;
        }
        Ok(())
    }
}

/// Role and subscription of the current session.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VerifyResponse {
    pub user_id: uuid::Uuid,
    pub role: UserRole,
    pub can_author: bool,
}

#[cfg(test)]
mod test {
    use super::*;

    fn student(email: &str) -> StudentSignupBody {
        StudentSignupBody {
            username: "eleve".to_string(),
            email: email.to_string(),
            password: "secret".to_string(),
            name: None,
        }
    }

    #[test]
    fn signup_requires_a_plausible_email() {
        assert!(student("eleve@ecole.fr").validate().is_ok());
        assert!(student("eleve").validate().is_err());
        assert!(student("@ecole.fr").validate().is_err());
        assert!(student("eleve@localhost").validate().is_err());
    }

    #[test]
    fn update_only_checks_given_fields() {
        assert!(UserUpdateBody::default().validate().is_ok());
        let body = UserUpdateBody {
            username: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(body.validate().is_err());
    }
}
