//! Read-only aggregates over exercise attempts.

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::{ModelManager, error::DatabaseResult};

/// Progress of one student on one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct StudentProgress {
    pub attempts: i64,
    pub best_score: Option<f64>,
    pub last_score: Option<f64>,
    /// `None` when attempts are unlimited.
    #[sqlx(skip)]
    pub remaining_attempts: Option<i64>,
}

pub fn remaining_attempts(max_attempts: Option<i32>, attempts: i64) -> Option<i64> {
    max_attempts
        .filter(|max| *max > 0)
        .map(|max| (i64::from(max) - attempts).max(0))
}

impl StudentProgress {
    pub async fn fetch(
        mm: &ModelManager,
        student_id: Uuid,
        exercise_id: Uuid,
        max_attempts: Option<i32>,
    ) -> DatabaseResult<Self> {
        let mut progress: Self = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) AS attempts,
                MAX(score) AS best_score,
                (
                    SELECT score FROM exercise_attempts
                    WHERE student_id = $1 AND exercise_id = $2
                    ORDER BY created_at DESC
                    LIMIT 1
                ) AS last_score
            FROM exercise_attempts
            WHERE student_id = $1 AND exercise_id = $2
            "#,
        )
        .bind(student_id)
        .bind(exercise_id)
        .fetch_one(mm.executor())
        .await?;

        progress.remaining_attempts = remaining_attempts(max_attempts, progress.attempts);
        Ok(progress)
    }

    pub fn exhausted(&self) -> bool {
        self.remaining_attempts == Some(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct StudentProgressRow {
    pub student_id: Uuid,
    pub username: String,
    pub name: String,
    pub attempts: i64,
    pub best_score: Option<f64>,
    pub last_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct ExerciseStats {
    pub total_attempts: i64,
    pub unique_students: i64,
    pub average_score: Option<f64>,
    pub best_score: Option<f64>,
    pub lowest_score: Option<f64>,
    #[sqlx(skip)]
    pub students: Vec<StudentProgressRow>,
}

impl ExerciseStats {
    /// Statistics of an exercise, restricted to attempts made in `course_id` when given.
    ///
    /// With a course, every student of the course's class gets a row, even without attempts.
    /// Without one, only students who attempted the exercise are listed.
    pub async fn fetch(
        mm: &ModelManager,
        exercise_id: Uuid,
        course_id: Option<Uuid>,
    ) -> DatabaseResult<Self> {
        let mut stats: Self = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) AS total_attempts,
                COUNT(DISTINCT student_id) AS unique_students,
                AVG(score) AS average_score,
                MAX(score) AS best_score,
                MIN(score) AS lowest_score
            FROM exercise_attempts
            WHERE exercise_id = $1 AND ($2::UUID IS NULL OR course_id = $2)
            "#,
        )
        .bind(exercise_id)
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;

        stats.students = match course_id {
            Some(course_id) => Self::class_rows(mm, exercise_id, course_id).await?,
            None => Self::attempt_rows(mm, exercise_id).await?,
        };
        Ok(stats)
    }

    async fn class_rows(
        mm: &ModelManager,
        exercise_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<StudentProgressRow>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                u.id AS student_id,
                u.username,
                u.name,
                COUNT(a.id) AS attempts,
                MAX(a.score) AS best_score,
                (
                    SELECT a2.score FROM exercise_attempts a2
                    WHERE a2.student_id = u.id AND a2.exercise_id = $1 AND a2.course_id = $2
                    ORDER BY a2.created_at DESC
                    LIMIT 1
                ) AS last_score
            FROM courses co
            JOIN class_students cs ON cs.class_id = co.class_id
            JOIN users u ON u.id = cs.student_id
            LEFT JOIN exercise_attempts a
                ON a.student_id = u.id AND a.exercise_id = $1 AND a.course_id = $2
            WHERE co.id = $2
            GROUP BY u.id
            ORDER BY u.name, u.username
            "#,
        )
        .bind(exercise_id)
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }

    async fn attempt_rows(
        mm: &ModelManager,
        exercise_id: Uuid,
    ) -> DatabaseResult<Vec<StudentProgressRow>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                u.id AS student_id,
                u.username,
                u.name,
                COUNT(a.id) AS attempts,
                MAX(a.score) AS best_score,
                (
                    SELECT a2.score FROM exercise_attempts a2
                    WHERE a2.student_id = u.id AND a2.exercise_id = $1
                    ORDER BY a2.created_at DESC
                    LIMIT 1
                ) AS last_score
            FROM exercise_attempts a
            JOIN users u ON u.id = a.student_id
            WHERE a.exercise_id = $1
            GROUP BY u.id
            ORDER BY u.name, u.username
            "#,
        )
        .bind(exercise_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
