use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped,
        entity::{Course, CourseCreate, Exercise},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::{
            classes::CourseBody,
            courses::{CourseDetails, LinkExerciseBody},
            exercises::ExerciseSummary,
        },
        error::ErrorResponse,
        middlewares,
        routes::{
            classes::{ensure_class_reader, find_class},
            ensure_owner,
        },
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/{id}",
            get(courses_get_handler)
                .put(courses_update_handler)
                .delete(courses_delete_handler),
        )
        .route("/{id}/exercises", post(courses_link_exercise_handler))
        .route(
            "/{id}/exercises/{exercise_id}",
            delete(courses_unlink_exercise_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

pub(crate) async fn find_course(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Course> {
    Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    description = "Returns a course with its exercises in course order",
    responses(
        (status = 200, description = "Course found", body = CourseDetails),
        (status = 403, description = "You're not part of this class", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn courses_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_course(&state, user, id).await?;
    let class = find_class(&state, user, course.class_id()).await?;
    ensure_class_reader(&state, user, class.id(), class.teacher_id()).await?;

    let exercises = Exercise::all_by_course(state.pool(), user, course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Exercise::get_resource_type(), e))?;

    let details = CourseDetails {
        course,
        exercises: exercises.iter().map(ExerciseSummary::from).collect(),
    };
    Ok((StatusCode::OK, Json(details)))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    request_body = CourseBody,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn courses_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CourseBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.author()?;
    if payload.title.trim().is_empty() {
        return Err(WebError::user_bad_request("`title` must not be empty"));
    }

    let course = find_course(&state, user, id).await?;
    ensure_owner(state.pool(), user, &course).await?;

    let data = CourseCreate {
        class_id: course.class_id(),
        title: payload.title,
        content: payload.content,
    };
    let updated = course
        .update(state.pool(), user, data)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    responses(
        (status = 200, description = "Course deleted"),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn courses_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_course(&state, user, id).await?;
    ensure_owner(state.pool(), user, &course).await?;

    course
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/exercises",
    description = "Appends a library exercise to the course",
    request_body = LinkExerciseBody,
    responses(
        (status = 200, description = "Exercise linked", body = ExerciseSummary),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Course or exercise not found", body = ErrorResponse),
        (status = 409, description = "Exercise already linked", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn courses_link_exercise_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LinkExerciseBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.author()?;
    let course = find_course(&state, user, id).await?;
    ensure_owner(state.pool(), user, &course).await?;

    let exercise = Exercise::find_by_id(state.pool(), user, payload.exercise_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Exercise::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Exercise::get_resource_type()))?;

    let linked = course
        .link_exercise(state.pool(), user, exercise.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
    if !linked {
        return Err(WebError::resource_conflict(Exercise::get_resource_type()));
    }

    Ok((StatusCode::OK, Json(ExerciseSummary::from(&exercise))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}/exercises/{exercise_id}",
    responses(
        (status = 200, description = "Exercise unlinked"),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Course not found or exercise not linked", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn courses_unlink_exercise_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, exercise_id)): Path<(Uuid, Uuid)>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_course(&state, user, id).await?;
    ensure_owner(state.pool(), user, &course).await?;

    let unlinked = course
        .unlink_exercise(state.pool(), user, exercise_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
    if !unlinked {
        return Err(WebError::resource_not_found(Exercise::get_resource_type()));
    }

    Ok(StatusCode::OK)
}
