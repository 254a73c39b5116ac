use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::{
    auth::CryptError,
    error::log_error,
    model::{DatabaseError, ResourceType},
    scoring::ScoringError,
    web::{SubscriptionStatus, UserRole},
};

pub type WebResult<T> = std::result::Result<T, WebError>;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("RegistrationUserConflict")]
    RegistrationUserConflict,
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("AuthenticationCookieNotFound, cookie: {cookie}")]
    AuthenticationCookieNotFound { cookie: String },

    #[error("AuthenticationCookieInvalid, cookie: {cookie}. Error: {error}")]
    AuthenticationCookieInvalid {
        cookie: String,
        error: jsonwebtoken::errors::Error,
    },

    #[error("AuthenticationRequired")]
    AuthenticationRequired,

    #[error("AuthenticationInvalidCredentials")]
    AuthenticationInvalidCredentials,

    #[error("AuthenticationRoleRequired: {role}")]
    AuthenticationRoleRequired { role: UserRole },

    #[error("AuthenticationSubscriptionRequired, current: {status}")]
    AuthenticationSubscriptionRequired { status: SubscriptionStatus },
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("ResourceNotFound: {resource_type:?}")]
    ResourceNotFound { resource_type: ResourceType },

    #[error("ResourceForbidden: {resource_type:?}")]
    ResourceForbidden { resource_type: ResourceType },

    #[error("ResourceFetchError: {resource_type:?}. Error: {error}")]
    ResourceFetchError {
        resource_type: ResourceType,
        error: DatabaseError,
    },

    #[error("ResourceBadRequest: {resource_type:?}")]
    ResourceBadRequest { resource_type: ResourceType },

    #[error("ResourceConflict: {resource_type:?}")]
    ResourceConflict { resource_type: ResourceType },
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("RequestBadRequest: {0}")]
    RequestBadRequest(String),

    #[error("RequestInvalidExercise: {0}")]
    RequestInvalidExercise(#[from] ScoringError),

    #[error("RequestAttemptsExhausted: {max_attempts}")]
    RequestAttemptsExhausted { max_attempts: i32 },
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RequestBadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RequestInvalidExercise(_) => StatusCode::BAD_REQUEST,
            Self::RequestAttemptsExhausted { .. } => StatusCode::FORBIDDEN,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::RequestBadRequest(reason) => format!("Request error, {reason}."),
            Self::RequestInvalidExercise(e) => format!("Request error, {e}."),
            Self::RequestAttemptsExhausted { max_attempts } => {
                format!("Request error, all {max_attempts} attempts have been used.")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("ServerCryptError: {0}")]
    ServerCryptError(#[from] crate::auth::CryptError),
    #[error("ServerStoredExerciseError: {0}")]
    ServerStoredExerciseError(ScoringError),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    pub fn client_display(&self) -> String {
        String::from("Internal server error.")
    }
}

impl RegistrationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RegistrationUserConflict => StatusCode::CONFLICT,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::RegistrationUserConflict => {
                String::from("Registration error, user already exists.")
            }
        }
    }
}

impl AuthenticationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::AuthenticationCookieNotFound { .. } => StatusCode::NOT_FOUND,
            Self::AuthenticationInvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AuthenticationCookieInvalid { .. } => StatusCode::BAD_REQUEST,
            Self::AuthenticationRoleRequired { .. } => StatusCode::FORBIDDEN,
            Self::AuthenticationSubscriptionRequired { .. } => StatusCode::FORBIDDEN,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::AuthenticationCookieInvalid { .. } => {
                String::from("Authentication error, cookie invalid.")
            }
            Self::AuthenticationCookieNotFound { .. } => {
                String::from("Authentication error, cookie not found.")
            }
            Self::AuthenticationRequired => String::from("Authentication required."),
            Self::AuthenticationInvalidCredentials => {
                String::from("Authentication error, user not found or password is invalid.")
            }
            Self::AuthenticationRoleRequired { role } => {
                format!("Authentication error, {role} account required.")
            }
            Self::AuthenticationSubscriptionRequired { status } => {
                format!("Authentication error, teacher subscription is {status}.")
            }
        }
    }
}

impl ResourceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            Self::ResourceForbidden { .. } => StatusCode::FORBIDDEN,
            Self::ResourceFetchError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ResourceBadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::ResourceConflict { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceNotFound { .. } => String::from("Resource error, resource not found."),
            Self::ResourceForbidden { .. } => String::from("Resource error, resource forbidden."),
            Self::ResourceFetchError { .. } => {
                String::from("Resource error, unable to fetch resource.")
            }
            Self::ResourceBadRequest { .. } => String::from("Resource error, bad request."),
            Self::ResourceConflict { .. } => String::from("Resource error, resource already exists."),
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("ResourceError - {0}")]
    ResourceError(#[from] ResourceError),
    #[error("AuthenticationError - {0}")]
    AuthenticationError(#[from] AuthenticationError),
    #[error("RegistrationError - {0}")]
    RegistrationError(#[from] RegistrationError),
    #[error("RequestError - {0}")]
    RequestError(#[from] RequestError),
    #[error("ServerError - {0}")]
    ServerError(#[from] ServerError),
}

impl WebError {
    pub fn resource_not_found(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceNotFound {
            resource_type: r#type,
        })
    }

    pub fn resource_forbidden(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceForbidden {
            resource_type: r#type,
        })
    }

    pub fn resource_fetch_error(r#type: ResourceType, error: DatabaseError) -> Self {
        Self::ResourceError(ResourceError::ResourceFetchError {
            resource_type: r#type,
            error,
        })
    }

    pub fn resource_bad_request(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceBadRequest {
            resource_type: r#type,
        })
    }

    pub fn resource_conflict(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceConflict {
            resource_type: r#type,
        })
    }

    /// Maps `Forbidden` to 403, a unique violation to 409 and anything else to 500.
    pub fn resource_error(r#type: ResourceType, error: DatabaseError) -> Self {
        match error {
            DatabaseError::Forbidden => Self::resource_forbidden(r#type),
            e if e.is_unique_violation() => Self::resource_conflict(r#type),
            e => Self::resource_fetch_error(r#type, e),
        }
    }

    pub fn auth_cookie_not_found<S: Into<String>>(cookie: S) -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationCookieNotFound {
            cookie: cookie.into(),
        })
    }

    pub fn auth_cookie_invalid<S: Into<String>>(
        cookie: S,
        error: jsonwebtoken::errors::Error,
    ) -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationCookieInvalid {
            cookie: cookie.into(),
            error,
        })
    }

    pub fn auth_required() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationRequired)
    }

    pub fn auth_invalid_credentials() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationInvalidCredentials)
    }

    pub fn auth_role_required(role: UserRole) -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationRoleRequired { role })
    }

    pub fn auth_subscription_required(status: SubscriptionStatus) -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationSubscriptionRequired { status })
    }

    pub fn user_bad_request<S: Into<String>>(reason: S) -> Self {
        Self::RequestError(RequestError::RequestBadRequest(reason.into()))
    }

    pub fn invalid_exercise(error: ScoringError) -> Self {
        Self::RequestError(RequestError::RequestInvalidExercise(error))
    }

    pub fn attempts_exhausted(max_attempts: i32) -> Self {
        Self::RequestError(RequestError::RequestAttemptsExhausted { max_attempts })
    }

    pub fn registration_conflict() -> Self {
        Self::RegistrationError(RegistrationError::RegistrationUserConflict)
    }

    pub fn server_crypt_error(e: CryptError) -> Self {
        Self::ServerError(ServerError::ServerCryptError(e))
    }

    /// Exercise content in the database no longer parses for its type.
    pub fn server_stored_exercise(e: ScoringError) -> Self {
        Self::ServerError(ServerError::ServerStoredExerciseError(e))
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            Self::ResourceError(e) => e.status_code(),
            Self::RegistrationError(e) => e.status_code(),
            Self::AuthenticationError(e) => e.status_code(),
            Self::RequestError(e) => e.status_code(),
            Self::ServerError(e) => e.status_code(),
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceError(e) => e.client_display(),
            Self::RegistrationError(e) => e.client_display(),
            Self::AuthenticationError(e) => e.client_display(),
            Self::RequestError(e) => e.client_display(),
            Self::ServerError(e) => e.client_display(),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message for the client
    pub message: String,
    /// HTTP status code (stringified)
    pub status_code: String,
    /// Optional debug details (only in debug mode)
    pub details: Option<String>,
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        log_error(&self);

        let status_code = self.status_code();
        let display = self.client_display();

        let body = ErrorResponse {
            message: display,
            status_code: status_code.as_str().to_string(),
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        };

        (status_code, Json(body)).into_response()
    }
}
