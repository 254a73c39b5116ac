mod common;
use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    Action, Flow, approve_teacher_action, id_of, setup_server, setup_test_db, signin_action,
    signin_admin_action, signup_student_action, signup_teacher_action,
};

#[tokio::test]
async fn route_class_lifecycle_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_teacher_action("prof", "secret").with_save_as("teacher"))
        // pending teachers can't author anything yet
        .step(
            Action::new("class_create", "POST", "/api/v1/classes")
                .with_body(json!({ "name": "CM2 A" }))
                .with_expect(StatusCode::FORBIDDEN)
                .assert_body(|body| assert!(body.contains("pending"))),
        )
        .step(signin_admin_action())
        .step(approve_teacher_action("teacher").assert_body(|body| {
            assert!(body.contains("\"subscription_status\":\"approved\""));
        }))
        .step(signin_action("prof", "secret"))
        .step(
            Action::new("class_create", "POST", "/api/v1/classes")
                .with_body(json!({ "name": "CM2 A", "description": "Salle 12" }))
                .assert_json(|body, _| {
                    let code = body["access_code"].as_str().unwrap();
                    assert_eq!(code.len(), 6);
                    assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
                })
                .with_save_as("class"),
        )
        .step(
            Action::new("class_create_empty", "POST", "/api/v1/classes")
                .with_body(json!({ "name": "  " }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("course_create", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/classes/{}/courses", id_of(ctx, "class")))
                .with_body(json!({ "title": "Les fractions", "content": "Chapitre 3" }))
                .with_save_as("course"),
        )
        .step(
            signup_student_action("eleve", "secret")
                .with_clear_cookies(true)
                .with_save_as("student"),
        )
        // not enrolled yet
        .step(
            Action::new("class_get", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/classes/{}", id_of(ctx, "class")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        // access codes are case-insensitive
        .step(
            Action::new("class_join", "POST", "/api/v1/classes/join").with_dyn_body(|ctx| {
                let code = ctx.get("class")["access_code"].as_str().unwrap().to_lowercase();
                json!({ "access_code": code })
            }),
        )
        .step(
            Action::new("class_join_twice", "POST", "/api/v1/classes/join")
                .with_dyn_body(|ctx| json!({ "access_code": ctx.get("class")["access_code"] }))
                .with_expect(StatusCode::CONFLICT),
        )
        .step(
            Action::new("class_join_unknown", "POST", "/api/v1/classes/join")
                .with_body(json!({ "access_code": "nope" }))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("class_get", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/classes/{}", id_of(ctx, "class")))
                .assert_body(|body| {
                    assert!(body.contains("CM2 A"));
                    assert!(body.contains("Les fractions"));
                }),
        )
        .step(
            Action::new("class_list", "GET", "/api/v1/classes")
                .assert_json(|body, _| assert_eq!(body["total"], 1)),
        )
        // students don't manage classes
        .step(
            Action::new("class_create", "POST", "/api/v1/classes")
                .with_body(json!({ "name": "Pirate" }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("class_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/classes/{}", id_of(ctx, "class")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_action("prof", "secret"))
        .step(
            Action::new("class_students", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/classes/{}/students", id_of(ctx, "class")))
                .assert_json(|body, _| {
                    let students = body.as_array().unwrap();
                    assert_eq!(students.len(), 1);
                    assert_eq!(students[0]["username"], "eleve");
                }),
        )
        .step(
            Action::new("class_update", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/classes/{}", id_of(ctx, "class")))
                .with_body(json!({ "name": "CM2 B" }))
                .assert_json(|body, ctx| {
                    assert_eq!(body["name"], "CM2 B");
                    assert_eq!(body["access_code"], ctx.get("class")["access_code"]);
                }),
        )
        .step(
            Action::new("class_remove_student", "DELETE", "dynamic").with_dyn_path(|ctx| {
                format!(
                    "/api/v1/classes/{}/students/{}",
                    id_of(ctx, "class"),
                    id_of(ctx, "student")
                )
            }),
        )
        .step(
            Action::new("class_remove_student_twice", "DELETE", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/classes/{}/students/{}",
                        id_of(ctx, "class"),
                        id_of(ctx, "student")
                    )
                })
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("class_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/classes/{}", id_of(ctx, "class"))),
        )
        .step(
            Action::new("course_get", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "course")))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_admin_teacher_review_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_teacher_action("prof1", "secret").with_save_as("prof1"))
        .step(signup_teacher_action("prof2", "secret").with_save_as("prof2"))
        .step(
            Action::new("teachers", "GET", "/api/v1/admin/teachers")
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_admin_action())
        .step(
            Action::new("teachers", "GET", "/api/v1/admin/teachers")
                .with_param("status", "pending")
                .assert_json(|body, _| assert_eq!(body["total"], 2)),
        )
        .step(
            Action::new("reject", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/admin/teachers/{}/reject", id_of(ctx, "prof2")))
                .with_body(json!({ "reason": "École inconnue" }))
                .assert_json(|body, _| {
                    assert_eq!(body["subscription_status"], "rejected");
                    assert_eq!(body["rejection_reason"], "École inconnue");
                }),
        )
        .step(approve_teacher_action("prof1"))
        .step(
            Action::new("teachers", "GET", "/api/v1/admin/teachers")
                .with_param("status", "pending")
                .assert_json(|body, _| assert_eq!(body["total"], 0)),
        )
        .step(
            Action::new("teachers", "GET", "/api/v1/admin/teachers")
                .assert_json(|body, _| assert_eq!(body["total"], 2)),
        )
        .step(signin_action("prof2", "secret"))
        .step(
            Action::new("class_create", "POST", "/api/v1/classes")
                .with_body(json!({ "name": "Refusée" }))
                .with_expect(StatusCode::FORBIDDEN)
                .assert_body(|body| assert!(body.contains("rejected"))),
        )
        .run(&mut server, pool)
        .await;
}
