use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{CrudRepository, Page, ResourceTyped, entity::UserEntity},
    web::{
        AppState, AuthenticatedUser, RequestContext, SubscriptionStatus, UserRole, WebError,
        WebResult,
        dto::admin::{RejectBody, TeacherListQuery},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/teachers", get(admin_teachers_handler))
        .route("/teachers/{id}/approve", post(admin_approve_handler))
        .route("/teachers/{id}/reject", post(admin_reject_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/teachers",
    description = "Lists teacher accounts, optionally by subscription status",
    request_body = TeacherListQuery,
    responses(
        (status = 200, description = "Returns requested page", body = Page<UserEntity>),
        (status = 401, description = "You're not signed in", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
async fn admin_teachers_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Query(query): Query<TeacherListQuery>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;

    let items = UserEntity::list_teachers(state.pool(), admin, query.status, query.limit, query.offset)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;
    let total = UserEntity::count_teachers(state.pool(), admin, query.status)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    Ok((
        StatusCode::OK,
        Json(Page::new(items, total, query.limit, query.offset)),
    ))
}

async fn find_teacher(
    state: &AppState,
    admin: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<UserEntity> {
    let found = UserEntity::find_by_id(state.pool(), admin, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(UserEntity::get_resource_type()))?;

    if found.role() != UserRole::Teacher {
        return Err(WebError::user_bad_request("only teacher subscriptions are reviewed"));
    }
    Ok(found)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/teachers/{id}/approve",
    description = "Approves a teacher subscription",
    responses(
        (status = 200, description = "Teacher approved", body = UserEntity),
        (status = 400, description = "User is not a teacher", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
async fn admin_approve_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    let teacher = find_teacher(&state, admin, id).await?;

    let updated = teacher
        .set_subscription(state.pool(), admin, SubscriptionStatus::Approved, None)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    tracing::info!(teacher = %updated.id(), "teacher subscription approved");
    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/teachers/{id}/reject",
    description = "Rejects a teacher subscription",
    request_body = RejectBody,
    responses(
        (status = 200, description = "Teacher rejected", body = UserEntity),
        (status = 400, description = "User is not a teacher", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
async fn admin_reject_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectBody>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin_user()?;
    let teacher = find_teacher(&state, admin, id).await?;

    let reason = payload.reason.filter(|r| !r.trim().is_empty());
    let updated = teacher
        .set_subscription(state.pool(), admin, SubscriptionStatus::Rejected, reason)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    tracing::info!(teacher = %updated.id(), "teacher subscription rejected");
    Ok((StatusCode::OK, Json(updated)))
}
