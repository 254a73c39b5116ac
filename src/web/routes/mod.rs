use crate::{
    Config,
    model::{HasOwner, ModelManager, ResourceTyped, check_access},
    web::{AppState, AuthenticatedUser, WebError, WebResult, doc::ApiDoc},
};
use axum::Router;
use serde::Deserialize;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

pub mod admin;
pub mod classes;
pub mod courses;
pub mod exercises;
pub mod user;

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct PaginationQuery {
    #[serde(default = "crate::web::dto::admin::default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

/// Fails with 403 unless `user` owns `resource` or is an admin.
pub(crate) async fn ensure_owner<T>(
    mm: &ModelManager,
    user: &AuthenticatedUser,
    resource: &T,
) -> WebResult<()>
where
    T: HasOwner<OwnerId = Uuid> + ResourceTyped + Sync,
{
    check_access(mm, user, resource, user.user_id())
        .await
        .map_err(|e| WebError::resource_error(T::get_resource_type(), e))
}

pub fn build_app<S: Send + Sync + Clone + 'static>(
    state: AppState,
    config: &'static Config,
) -> Router<S> {
    let mut router = Router::new()
        .nest("/api/v1/account", user::routes(state.clone()))
        .nest("/api/v1/admin", admin::routes(state.clone()))
        .nest("/api/v1/classes", classes::routes(state.clone()))
        .nest("/api/v1/courses", courses::routes(state.clone()))
        .nest("/api/v1/exercises", exercises::routes(state.clone()))
        .layer(CookieManagerLayer::default())
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if config.app().docs() {
        let openapi = ApiDoc::openapi();

        router = router.merge(SwaggerUi::new("/api/v1/docs").url("/api-doc/openapi.json", openapi));
    }

    router
}
