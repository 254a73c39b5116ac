use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use tower_cookies::{Cookie, Cookies, cookie::SameSite};
use uuid::Uuid;

use crate::{
    Config,
    auth::{self, UserClaims, hash_password, verify_password},
    model::{
        CrudRepository, PaginatableRepository, ResourceTyped,
        entity::{UserEntity, UserEntityCreateUpdate},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, UserRole, WebError, WebResult,
        dto::account::{
            SigninBody, StudentSignupBody, TeacherSignupBody, UserUpdateBody, VerifyResponse,
        },
        error::ErrorResponse,
        middlewares::{self, AUTH_TOKEN},
        routes::{PaginationQuery, ensure_owner},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/page", get(user_list_handler))
        .route("/verify", get(user_verify_handler))
        .route("/me", get(user_me_handler))
        .route(
            "/{id}",
            put(user_update_handler).delete(user_delete_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/signup/student", post(user_signup_student_handler))
        .route("/signup/teacher", post(user_signup_teacher_handler))
        .route("/signin", post(user_signin_handler))
        .route("/signout", post(user_signout_handler))
        .merge(protected)
        .with_state(state)
}

async fn start_session(cookies: &Cookies, user: &UserEntity) -> WebResult<()> {
    let app = Config::get_or_init(false).await.app();
    let claims = UserClaims::session(user.id(), app.session_hours());
    let token = auth::generate_token(claims, app.jwt())
        .map_err(|e| WebError::server_crypt_error(e.into()))?;

    let mut cookie = Cookie::new(AUTH_TOKEN, token);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookies.add(cookie);
    Ok(())
}

/// 409 when the username or the email is taken by another account.
async fn ensure_available(
    state: &AppState,
    username: &str,
    email: &str,
    current: Option<Uuid>,
) -> WebResult<()> {
    let admin = AuthenticatedUser::admin();
    let by_username = UserEntity::find_by_username(state.pool(), &admin, username)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;
    let by_email = UserEntity::find_by_email(state.pool(), &admin, email)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    let taken = [by_username, by_email]
        .into_iter()
        .flatten()
        .any(|found| Some(found.id()) != current);
    if taken {
        return Err(WebError::registration_conflict());
    }
    Ok(())
}

async fn register(
    state: &AppState,
    cookies: &Cookies,
    data: UserEntityCreateUpdate,
) -> WebResult<UserEntity> {
    ensure_available(state, &data.username, &data.email, None).await?;

    let created = UserEntity::create(state.pool(), &AuthenticatedUser::admin(), data)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                WebError::registration_conflict()
            } else {
                WebError::resource_fetch_error(UserEntity::get_resource_type(), e)
            }
        })?;

    tracing::info!(user = %created.id(), role = %created.role(), "account created");
    start_session(cookies, &created).await?;
    Ok(created)
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signup/student",
    request_body = StudentSignupBody,
    description = "Creates a student account and signs it in",
    responses(
        (status = 200, description = "User created successfully", body = UserEntity),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 409, description = "User already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account"
)]
async fn user_signup_student_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<StudentSignupBody>,
) -> WebResult<impl IntoResponse> {
    payload.validate()?;

    let hash = hash_password(&payload.password).map_err(WebError::server_crypt_error)?;
    let username = payload.username.trim().to_string();
    let data = UserEntityCreateUpdate {
        name: payload
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| username.clone()),
        username,
        email: payload.email.trim().to_string(),
        password_hash: hash,
        role: UserRole::Student,
        school_name: None,
    };

    let created = register(&state, &cookies, data).await?;
    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signup/teacher",
    request_body = TeacherSignupBody,
    description = "Creates a teacher account waiting for admin approval",
    responses(
        (status = 200, description = "User created successfully", body = UserEntity),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 409, description = "User already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account"
)]
async fn user_signup_teacher_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<TeacherSignupBody>,
) -> WebResult<impl IntoResponse> {
    payload.validate()?;

    let hash = hash_password(&payload.password).map_err(WebError::server_crypt_error)?;
    let data = UserEntityCreateUpdate {
        username: payload.username.trim().to_string(),
        email: payload.email.trim().to_string(),
        name: payload.name.trim().to_string(),
        password_hash: hash,
        role: UserRole::Teacher,
        school_name: payload.school_name.filter(|s| !s.trim().is_empty()),
    };

    let created = register(&state, &cookies, data).await?;
    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signin",
    description = "Authorizes user in the system",
    request_body = SigninBody,
    responses(
        (status = 200, description = "User signed in", body = UserEntity),
        (status = 401, description = "Credentials invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
)]
async fn user_signin_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<SigninBody>,
) -> WebResult<impl IntoResponse> {
    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_by_email(state.pool(), &admin, &payload.email)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(WebError::auth_invalid_credentials)?;

    let is_verified = verify_password(&payload.password, found.hash())
        .map_err(WebError::server_crypt_error)?;

    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    start_session(&cookies, &found).await?;
    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signout",
    description = "Drops the session cookie",
    responses(
        (status = 200, description = "Signed out"),
    ),
    tag = "account",
)]
async fn user_signout_handler(cookies: Cookies) -> impl IntoResponse {
    let cookie = Cookie::build((AUTH_TOKEN, "")).path("/").build();
    cookies.remove(cookie);
    StatusCode::OK
}

#[utoipa::path(
    get,
    path = "/api/v1/account/verify",
    description = "Checks the session cookie",
    responses(
        (status = 200, description = "Session is valid", body = VerifyResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn user_verify_handler(ctx: RequestContext) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    Ok((
        StatusCode::OK,
        Json(VerifyResponse {
            user_id: user.user_id(),
            role: user.user_role(),
            can_author: user.can_author(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/me",
    description = "Returns the signed in user",
    responses(
        (status = 200, description = "Current user", body = UserEntity),
        (status = 401, description = "Not signed in", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn user_me_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(WebError::auth_required)?;

    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/page",
    request_body = PaginationQuery,
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<UserEntity>),
        (status = 401, description = "You're not signed in", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn user_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let users = UserEntity::page(state.pool(), user, page.limit, page.offset)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(users)))
}

async fn find_user(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<UserEntity> {
    let found = UserEntity::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(UserEntity::get_resource_type()))?;

    ensure_owner(state.pool(), user, &found).await?;
    Ok(found)
}

#[utoipa::path(
    put,
    path = "/api/v1/account/{id}",
    request_body = UserUpdateBody,
    responses(
        (status = 200, description = "User updated successfully", body = UserEntity),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You doesn't have enough permissions to do this", body = ErrorResponse),
        (status = 409, description = "Username or email already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn user_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    payload.validate()?;

    let found = find_user(&state, user, id).await?;

    let username = payload
        .username
        .map(|u| u.trim().to_string())
        .unwrap_or_else(|| found.username().to_string());
    let email = payload
        .email
        .map(|e| e.trim().to_string())
        .unwrap_or_else(|| found.email().to_string());
    ensure_available(&state, &username, &email, Some(found.id())).await?;

    let password_hash = match payload.password {
        Some(password) => hash_password(&password).map_err(WebError::server_crypt_error)?,
        None => String::new(),
    };

    let data = UserEntityCreateUpdate {
        username,
        email,
        name: payload.name.unwrap_or_else(|| found.name().to_string()),
        password_hash,
        role: found.role(),
        school_name: payload
            .school_name
            .or_else(|| found.school_name().map(str::to_string)),
    };

    let updated = found
        .update(state.pool(), user, data)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                WebError::registration_conflict()
            } else {
                WebError::resource_fetch_error(UserEntity::get_resource_type(), e)
            }
        })?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/account/{id}",
    description = "Deletes specified user",
    responses(
        (status = 200, description = "User deleted successfully"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn user_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = find_user(&state, user, id).await?;

    found
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
