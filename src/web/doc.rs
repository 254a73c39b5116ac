use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "SID",
                    "JWT token for current user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::routes::user::user_signup_student_handler,
        crate::web::routes::user::user_signup_teacher_handler,
        crate::web::routes::user::user_signin_handler,
        crate::web::routes::user::user_signout_handler,
        crate::web::routes::user::user_verify_handler,
        crate::web::routes::user::user_me_handler,
        crate::web::routes::user::user_list_handler,
        crate::web::routes::user::user_update_handler,
        crate::web::routes::user::user_delete_handler,
        crate::web::routes::admin::admin_teachers_handler,
        crate::web::routes::admin::admin_approve_handler,
        crate::web::routes::admin::admin_reject_handler,
        crate::web::routes::classes::classes_create_handler,
        crate::web::routes::classes::classes_list_handler,
        crate::web::routes::classes::classes_get_handler,
        crate::web::routes::classes::classes_update_handler,
        crate::web::routes::classes::classes_delete_handler,
        crate::web::routes::classes::classes_join_handler,
        crate::web::routes::classes::classes_students_handler,
        crate::web::routes::classes::classes_remove_student_handler,
        crate::web::routes::classes::classes_add_course_handler,
        crate::web::routes::courses::courses_get_handler,
        crate::web::routes::courses::courses_update_handler,
        crate::web::routes::courses::courses_delete_handler,
        crate::web::routes::courses::courses_link_exercise_handler,
        crate::web::routes::courses::courses_unlink_exercise_handler,
        crate::web::routes::exercises::exercises_create_handler,
        crate::web::routes::exercises::exercises_list_handler,
        crate::web::routes::exercises::exercises_get_handler,
        crate::web::routes::exercises::exercises_update_handler,
        crate::web::routes::exercises::exercises_delete_handler,
        crate::web::routes::exercises::exercises_submit_handler,
        crate::web::routes::exercises::exercises_progress_handler,
        crate::web::routes::exercises::exercises_stats_handler,
        crate::web::routes::exercises::exercises_attempt_handler,
    ),
    tags(
        (name = "account", description = "Sign up, sessions and account management"),
        (name = "admin", description = "Teacher subscription review"),
        (name = "classes", description = "Classes, access codes and enrolments"),
        (name = "courses", description = "Courses and their exercises"),
        (name = "exercises", description = "Exercise library, submissions and statistics"),
    ),
    modifiers(&CookieAuthModifier),
)]
pub struct ApiDoc;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn openapi_lists_every_route_group() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        for path in [
            "/api/v1/account/signin",
            "/api/v1/admin/teachers",
            "/api/v1/classes/join",
            "/api/v1/courses/{id}/exercises",
            "/api/v1/exercises/{id}/submit",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }
}
