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
    model::{
        CrudRepository, ExerciseStats, Page, ResourceType, ResourceTyped, StudentProgress,
        entity::{ClassMembership, Exercise, ExerciseAttempt, ExerciseAttemptCreate},
    },
    scoring::{self, ScoringError, Submission},
    web::{
        AppState, AuthenticatedUser, RequestContext, UserRole, WebError, WebResult,
        dto::exercises::{
            ExerciseBody, ExerciseResponse, ExerciseSummary, LibraryQuery, StatsQuery,
            SubmitBody, SubmitResponse,
        },
        error::ErrorResponse,
        middlewares,
        routes::{courses::find_course, ensure_owner},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(exercises_list_handler).post(exercises_create_handler))
        .route(
            "/{id}",
            get(exercises_get_handler)
                .put(exercises_update_handler)
                .delete(exercises_delete_handler),
        )
        .route("/{id}/submit", post(exercises_submit_handler))
        .route("/{id}/progress", get(exercises_progress_handler))
        .route("/{id}/stats", get(exercises_stats_handler))
        .route("/{id}/attempts/{attempt_id}", get(exercises_attempt_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn find_exercise(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Exercise> {
    Exercise::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Exercise::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Exercise::get_resource_type()))
}

fn prepare_body(payload: ExerciseBody) -> WebResult<crate::model::entity::ExerciseCreate> {
    if payload.title.trim().is_empty() {
        return Err(WebError::user_bad_request("`title` must not be empty"));
    }
    let mut rng = rand::rng();
    payload.into_create(&mut rng).map_err(WebError::invalid_exercise)
}

#[utoipa::path(
    post,
    path = "/api/v1/exercises",
    description = "Adds an exercise to the library; content is validated for its type",
    request_body = ExerciseBody,
    responses(
        (status = 200, description = "Exercise created", body = Exercise),
        (status = 400, description = "Invalid content", body = ErrorResponse),
        (status = 403, description = "Approved teacher account required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "exercises",
    security(
        ("cookie" = [])
    )
)]
async fn exercises_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<ExerciseBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.author()?;
    let data = prepare_body(payload)?;

    let created = Exercise::create(state.pool(), user, data)
        .await
        .map_err(|e| WebError::resource_fetch_error(Exercise::get_resource_type(), e))?;

    tracing::info!(exercise = %created.id(), kind = created.exercise_type(), "exercise created");
    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/exercises",
    description = "Exercise library, newest first",
    request_body = LibraryQuery,
    responses(
        (status = 200, description = "Returns requested page", body = Page<ExerciseSummary>),
        (status = 403, description = "Approved teacher account required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "exercises",
    security(
        ("cookie" = [])
    )
)]
async fn exercises_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Query(query): Query<LibraryQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.author()?;
    let filter = query.filter();

    let items = Exercise::search(state.pool(), user, &filter, query.limit, query.offset)
        .await
        .map_err(|e| WebError::resource_fetch_error(Exercise::get_resource_type(), e))?;
    let total = Exercise::count_filtered(state.pool(), user, &filter)
        .await
        .map_err(|e| WebError::resource_fetch_error(Exercise::get_resource_type(), e))?;

    let page = Page::new(items, total, query.limit, query.offset);
    Ok((StatusCode::OK, Json(page.map(|e| ExerciseSummary::from(&e)))))
}

#[utoipa::path(
    get,
    path = "/api/v1/exercises/{id}",
    description = "Full content for its author, content without answer keys for everyone else",
    responses(
        (status = 200, description = "Exercise found", body = ExerciseResponse),
        (status = 403, description = "Exercise is not assigned to you", body = ErrorResponse),
        (status = 404, description = "Exercise not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "exercises",
    security(
        ("cookie" = [])
    )
)]
async fn exercises_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let exercise = find_exercise(&state, user, id).await?;

    if user.user_role() == UserRole::Student {
        let assigned = exercise
            .is_assigned_to(state.pool(), user.user_id())
            .await
            .map_err(|e| WebError::resource_fetch_error(Exercise::get_resource_type(), e))?;
        if !assigned {
            return Err(WebError::resource_forbidden(Exercise::get_resource_type()));
        }
    }

    let full = user.is_admin() || exercise.teacher_id() == user.user_id();
    let response = {
        let mut rng = rand::rng();
        ExerciseResponse::for_viewer(&exercise, full, &mut rng)
    }
    .map_err(WebError::server_stored_exercise)?;

    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    put,
    path = "/api/v1/exercises/{id}",
    request_body = ExerciseBody,
    responses(
        (status = 200, description = "Exercise updated", body = Exercise),
        (status = 400, description = "Invalid content", body = ErrorResponse),
        (status = 403, description = "You don't own this exercise", body = ErrorResponse),
        (status = 404, description = "Exercise not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "exercises",
    security(
        ("cookie" = [])
    )
)]
async fn exercises_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExerciseBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.author()?;
    let exercise = find_exercise(&state, user, id).await?;
    ensure_owner(state.pool(), user, &exercise).await?;

    let data = prepare_body(payload)?;
    let updated = exercise
        .update(state.pool(), user, data)
        .await
        .map_err(|e| WebError::resource_fetch_error(Exercise::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/exercises/{id}",
    responses(
        (status = 200, description = "Exercise deleted"),
        (status = 403, description = "You don't own this exercise", body = ErrorResponse),
        (status = 404, description = "Exercise not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "exercises",
    security(
        ("cookie" = [])
    )
)]
async fn exercises_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let exercise = find_exercise(&state, user, id).await?;
    ensure_owner(state.pool(), user, &exercise).await?;

    exercise
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Exercise::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

/// Checks that the student reaches the exercise, through `course_id` when given.
async fn ensure_submittable(
    state: &AppState,
    user: &AuthenticatedUser,
    exercise: &Exercise,
    course_id: Option<Uuid>,
) -> WebResult<()> {
    let Some(course_id) = course_id else {
        let assigned = exercise
            .is_assigned_to(state.pool(), user.user_id())
            .await
            .map_err(|e| WebError::resource_fetch_error(Exercise::get_resource_type(), e))?;
        if !assigned {
            return Err(WebError::resource_forbidden(Exercise::get_resource_type()));
        }
        return Ok(());
    };

    let course = find_course(state, user, course_id).await?;
    let enrolled = ClassMembership::is_enrolled(state.pool(), user.user_id(), course.class_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Membership, e))?;
    if !enrolled {
        return Err(WebError::resource_forbidden(ResourceType::Class));
    }

    let linked = course
        .has_exercise(state.pool(), exercise.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Course, e))?;
    if !linked {
        return Err(WebError::user_bad_request("exercise is not part of this course"));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/exercises/{id}/submit",
    description = "Scores the answers of the current student and records the attempt",
    request_body = SubmitBody,
    responses(
        (status = 200, description = "Answers scored", body = SubmitResponse),
        (status = 400, description = "Malformed answers, or exercise not in the course", body = ErrorResponse),
        (status = 403, description = "Not enrolled, or no attempts left", body = ErrorResponse),
        (status = 404, description = "Exercise or course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "exercises",
    security(
        ("cookie" = [])
    )
)]
async fn exercises_submit_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.student()?;
    let exercise = find_exercise(&state, user, id).await?;
    ensure_submittable(&state, user, &exercise, payload.course_id).await?;

    let progress = StudentProgress::fetch(
        state.pool(),
        user.user_id(),
        exercise.id(),
        exercise.max_attempts(),
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(ExerciseAttempt::get_resource_type(), e))?;
    if let (true, Some(max_attempts)) = (progress.exhausted(), exercise.max_attempts()) {
        return Err(WebError::attempts_exhausted(max_attempts));
    }

    let content = exercise
        .parsed_content()
        .map_err(WebError::server_stored_exercise)?;
    let submission =
        Submission::parse(content.kind(), &payload.answers).map_err(WebError::invalid_exercise)?;
    let report = scoring::score(&content, exercise.description(), &submission)
        .map_err(WebError::invalid_exercise)?;

    let feedback = serde_json::to_value(&report).map_err(|e| {
        WebError::server_stored_exercise(ScoringError::submission(content.kind(), e.to_string()))
    })?;
    let data = ExerciseAttemptCreate {
        exercise_id: exercise.id(),
        course_id: payload.course_id,
        score: report.score,
        answers: payload.answers,
        feedback,
    };
    let attempt = ExerciseAttempt::create_within_limit(state.pool(), user, data, exercise.max_attempts())
        .await
        .map_err(|e| WebError::resource_fetch_error(ExerciseAttempt::get_resource_type(), e))?;
    let Some(attempt) = attempt else {
        return Err(WebError::attempts_exhausted(exercise.max_attempts().unwrap_or_default()));
    };

    let progress = StudentProgress::fetch(
        state.pool(),
        user.user_id(),
        exercise.id(),
        exercise.max_attempts(),
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(ExerciseAttempt::get_resource_type(), e))?;

    Ok((
        StatusCode::OK,
        Json(SubmitResponse {
            attempt_id: attempt.id(),
            report,
            progress,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/exercises/{id}/progress",
    description = "Progress of the current user on an exercise",
    responses(
        (status = 200, description = "Progress", body = StudentProgress),
        (status = 404, description = "Exercise not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "exercises",
    security(
        ("cookie" = [])
    )
)]
async fn exercises_progress_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let exercise = find_exercise(&state, user, id).await?;

    let progress = StudentProgress::fetch(
        state.pool(),
        user.user_id(),
        exercise.id(),
        exercise.max_attempts(),
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(ExerciseAttempt::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(progress)))
}

#[utoipa::path(
    get,
    path = "/api/v1/exercises/{id}/stats",
    description = "Attempt statistics, for the exercise author or for the teacher of `course_id`",
    request_body = StatsQuery,
    responses(
        (status = 200, description = "Statistics", body = ExerciseStats),
        (status = 400, description = "Exercise is not part of the course", body = ErrorResponse),
        (status = 403, description = "You don't own this exercise or course", body = ErrorResponse),
        (status = 404, description = "Exercise or course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "exercises",
    security(
        ("cookie" = [])
    )
)]
async fn exercises_stats_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<StatsQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.author()?;
    let exercise = find_exercise(&state, user, id).await?;

    match query.course_id {
        Some(course_id) => {
            let course = find_course(&state, user, course_id).await?;
            ensure_owner(state.pool(), user, &course).await?;

            let linked = course
                .has_exercise(state.pool(), exercise.id())
                .await
                .map_err(|e| WebError::resource_fetch_error(ResourceType::Course, e))?;
            if !linked {
                return Err(WebError::user_bad_request("exercise is not part of this course"));
            }
        }
        None => ensure_owner(state.pool(), user, &exercise).await?,
    }

    let stats = ExerciseStats::fetch(state.pool(), exercise.id(), query.course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ExerciseAttempt::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(stats)))
}

#[utoipa::path(
    get,
    path = "/api/v1/exercises/{id}/attempts/{attempt_id}",
    description = "One attempt with its answers and feedback",
    responses(
        (status = 200, description = "Attempt found", body = ExerciseAttempt),
        (status = 403, description = "Not your attempt", body = ErrorResponse),
        (status = 404, description = "Attempt not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "exercises",
    security(
        ("cookie" = [])
    )
)]
async fn exercises_attempt_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, attempt_id)): Path<(Uuid, Uuid)>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let exercise = find_exercise(&state, user, id).await?;

    let attempt = ExerciseAttempt::find_by_id(state.pool(), user, attempt_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ExerciseAttempt::get_resource_type(), e))?
        .filter(|attempt| attempt.exercise_id() == exercise.id())
        .ok_or_else(|| WebError::resource_not_found(ExerciseAttempt::get_resource_type()))?;

    // the exercise author may review every attempt
    if exercise.teacher_id() != user.user_id() {
        ensure_owner(state.pool(), user, &attempt).await?;
    }

    Ok((StatusCode::OK, Json(attempt)))
}
