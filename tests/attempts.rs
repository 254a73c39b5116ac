mod common;
use classe_numerique::model::entity::{ExerciseAttempt, ExerciseAttemptCreate};
use classe_numerique::model::{DbConnection, ModelManager};
use classe_numerique::web::{AuthenticatedUser, SubscriptionStatus, UserRole};
use serde_json::json;
use uuid::Uuid;

use crate::common::setup_test_db;

async fn insert_user(mm: &ModelManager, username: &str, role: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, role, subscription_status)
         VALUES ($1, $2, $3, 'x', $4, 'approved')",
    )
    .bind(id)
    .bind(username)
    .bind(format!("{username}@ecole.fr"))
    .bind(role)
    .execute(mm.executor())
    .await
    .unwrap();
    id
}

async fn insert_exercise(mm: &ModelManager, teacher_id: Uuid, max_attempts: Option<i32>) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO exercises (id, title, exercise_type, content, max_attempts, teacher_id)
         VALUES ($1, 'Calcul', 'qcm', $2, $3, $4)",
    )
    .bind(id)
    .bind(json!({ "questions": [{ "question": "2 + 2 ?", "options": ["3", "4"], "correct": 1 }] }))
    .bind(max_attempts)
    .bind(teacher_id)
    .execute(mm.executor())
    .await
    .unwrap();
    id
}

fn attempt(exercise_id: Uuid) -> ExerciseAttemptCreate {
    ExerciseAttemptCreate {
        exercise_id,
        course_id: None,
        score: 100.0,
        answers: json!([1]),
        feedback: json!({}),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_respect_the_attempt_limit() {
    let db = setup_test_db().await;
    let mm = ModelManager::new(DbConnection::from_pool(db.pool().clone()));

    let teacher = insert_user(&mm, "prof", "teacher").await;
    let student = insert_user(&mm, "eleve", "student").await;
    let exercise = insert_exercise(&mm, teacher, Some(2)).await;
    let actor = AuthenticatedUser::new(student, UserRole::Student, SubscriptionStatus::Approved);

    let (a, b, c, d) = tokio::join!(
        ExerciseAttempt::create_within_limit(&mm, &actor, attempt(exercise), Some(2)),
        ExerciseAttempt::create_within_limit(&mm, &actor, attempt(exercise), Some(2)),
        ExerciseAttempt::create_within_limit(&mm, &actor, attempt(exercise), Some(2)),
        ExerciseAttempt::create_within_limit(&mm, &actor, attempt(exercise), Some(2)),
    );
    let recorded = [a, b, c, d]
        .into_iter()
        .map(Result::unwrap)
        .filter(Option::is_some)
        .count();

    assert_eq!(recorded, 2);
    assert_eq!(ExerciseAttempt::count_for(&mm, student, exercise).await.unwrap(), 2);
}

#[tokio::test]
async fn unlimited_exercise_records_every_attempt() {
    let db = setup_test_db().await;
    let mm = ModelManager::new(DbConnection::from_pool(db.pool().clone()));

    let teacher = insert_user(&mm, "prof", "teacher").await;
    let student = insert_user(&mm, "eleve", "student").await;
    let exercise = insert_exercise(&mm, teacher, None).await;
    let actor = AuthenticatedUser::new(student, UserRole::Student, SubscriptionStatus::Approved);

    for _ in 0..3 {
        let created = ExerciseAttempt::create_within_limit(&mm, &actor, attempt(exercise), None)
            .await
            .unwrap();
        assert!(created.is_some());
    }
    assert_eq!(ExerciseAttempt::count_for(&mm, student, exercise).await.unwrap(), 3);
}
