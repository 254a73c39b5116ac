use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, PaginatableRepository, ResourceType, ResourceTyped,
        entity::{ClassMembership, Classroom, ClassroomCreate, Course, CourseCreate, EnrolledStudent},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::classes::{ClassDetails, CourseBody, JoinClassBody},
        error::ErrorResponse,
        middlewares,
        routes::{PaginationQuery, ensure_owner},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(classes_list_handler).post(classes_create_handler))
        .route("/join", post(classes_join_handler))
        .route(
            "/{id}",
            get(classes_get_handler)
                .put(classes_update_handler)
                .delete(classes_delete_handler),
        )
        .route("/{id}/students", get(classes_students_handler))
        .route(
            "/{id}/students/{student_id}",
            delete(classes_remove_student_handler),
        )
        .route("/{id}/courses", post(classes_add_course_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

pub(crate) async fn find_class(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Classroom> {
    Classroom::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Classroom::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Classroom::get_resource_type()))
}

/// Class teacher, admins and enrolled students may read a class and its courses.
pub(crate) async fn ensure_class_reader(
    state: &AppState,
    user: &AuthenticatedUser,
    class_id: Uuid,
    teacher_id: Uuid,
) -> WebResult<()> {
    if user.is_admin() || user.user_id() == teacher_id {
        return Ok(());
    }

    let enrolled = ClassMembership::is_enrolled(state.pool(), user.user_id(), class_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Membership, e))?;
    if !enrolled {
        return Err(WebError::resource_forbidden(Classroom::get_resource_type()));
    }
    Ok(())
}

fn require_name(name: &str) -> WebResult<()> {
    if name.trim().is_empty() {
        return Err(WebError::user_bad_request("`name` must not be empty"));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/classes",
    description = "Creates a class with a fresh access code",
    request_body = ClassroomCreate,
    responses(
        (status = 200, description = "Class created", body = Classroom),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 401, description = "You're not signed in", body = ErrorResponse),
        (status = 403, description = "Approved teacher account required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "classes",
    security(
        ("cookie" = [])
    )
)]
async fn classes_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<ClassroomCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.author()?;
    require_name(&payload.name)?;

    let created = Classroom::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_error(Classroom::get_resource_type(), e))?;

    tracing::info!(class = %created.id(), code = created.access_code(), "class created");
    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/classes",
    description = "Own classes for teachers, joined classes for students, all for admins",
    request_body = PaginationQuery,
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<Classroom>),
        (status = 401, description = "You're not signed in", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "classes",
    security(
        ("cookie" = [])
    )
)]
async fn classes_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let classes = Classroom::page(state.pool(), user, page.limit, page.offset)
        .await
        .map_err(|e| WebError::resource_fetch_error(Classroom::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(classes)))
}

#[utoipa::path(
    get,
    path = "/api/v1/classes/{id}",
    description = "Returns a class with its courses",
    responses(
        (status = 200, description = "Class found", body = ClassDetails),
        (status = 403, description = "You're not part of this class", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "classes",
    security(
        ("cookie" = [])
    )
)]
async fn classes_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let class = find_class(&state, user, id).await?;
    ensure_class_reader(&state, user, class.id(), class.teacher_id()).await?;

    let courses = Course::all_by_class(state.pool(), user, class.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(ClassDetails { class, courses })))
}

#[utoipa::path(
    put,
    path = "/api/v1/classes/{id}",
    request_body = ClassroomCreate,
    responses(
        (status = 200, description = "Class updated", body = Classroom),
        (status = 403, description = "You don't own this class", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "classes",
    security(
        ("cookie" = [])
    )
)]
async fn classes_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClassroomCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.author()?;
    require_name(&payload.name)?;

    let class = find_class(&state, user, id).await?;
    ensure_owner(state.pool(), user, &class).await?;

    let updated = class
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Classroom::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/classes/{id}",
    description = "Deletes a class with its courses and enrolments",
    responses(
        (status = 200, description = "Class deleted"),
        (status = 403, description = "You don't own this class", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "classes",
    security(
        ("cookie" = [])
    )
)]
async fn classes_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let class = find_class(&state, user, id).await?;
    ensure_owner(state.pool(), user, &class).await?;

    class
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Classroom::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/classes/join",
    description = "Enrols the current student with a class access code",
    request_body = JoinClassBody,
    responses(
        (status = 200, description = "Joined the class", body = Classroom),
        (status = 403, description = "Student account required", body = ErrorResponse),
        (status = 404, description = "Unknown access code", body = ErrorResponse),
        (status = 409, description = "Already enrolled", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "classes",
    security(
        ("cookie" = [])
    )
)]
async fn classes_join_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<JoinClassBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.student()?;

    let class = Classroom::find_by_access_code(state.pool(), user, &payload.access_code)
        .await
        .map_err(|e| WebError::resource_fetch_error(Classroom::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Classroom::get_resource_type()))?;

    let joined = ClassMembership::join(state.pool(), user, class.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(ClassMembership::get_resource_type(), e))?;
    if joined.is_none() {
        return Err(WebError::resource_conflict(ClassMembership::get_resource_type()));
    }

    tracing::info!(class = %class.id(), student = %user.user_id(), "student joined class");
    Ok((StatusCode::OK, Json(class)))
}

#[utoipa::path(
    get,
    path = "/api/v1/classes/{id}/students",
    description = "Lists the students enrolled in a class",
    responses(
        (status = 200, description = "Enrolled students", body = Vec<EnrolledStudent>),
        (status = 403, description = "You don't own this class", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "classes",
    security(
        ("cookie" = [])
    )
)]
async fn classes_students_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let class = find_class(&state, user, id).await?;
    ensure_owner(state.pool(), user, &class).await?;

    let students = ClassMembership::students(state.pool(), user, class.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(ClassMembership::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(students)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/classes/{id}/students/{student_id}",
    description = "Removes a student from a class",
    responses(
        (status = 200, description = "Student removed"),
        (status = 403, description = "You don't own this class", body = ErrorResponse),
        (status = 404, description = "Class or enrolment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "classes",
    security(
        ("cookie" = [])
    )
)]
async fn classes_remove_student_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let class = find_class(&state, user, id).await?;
    ensure_owner(state.pool(), user, &class).await?;

    let removed = ClassMembership::remove(state.pool(), user, class.id(), student_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ClassMembership::get_resource_type(), e))?;
    if !removed {
        return Err(WebError::resource_not_found(ClassMembership::get_resource_type()));
    }

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/classes/{id}/courses",
    description = "Adds a course to a class",
    request_body = CourseBody,
    responses(
        (status = 200, description = "Course created", body = Course),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 403, description = "You don't own this class", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "classes",
    security(
        ("cookie" = [])
    )
)]
async fn classes_add_course_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CourseBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.author()?;
    if payload.title.trim().is_empty() {
        return Err(WebError::user_bad_request("`title` must not be empty"));
    }

    let class = find_class(&state, user, id).await?;
    ensure_owner(state.pool(), user, &class).await?;

    let data = CourseCreate {
        class_id: class.id(),
        title: payload.title,
        content: payload.content,
    };
    let created = Course::create(state.pool(), user, data)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}
