use sqlx::types::Json;
use time::PrimitiveDateTime;

use crate::db::models::Answer;

pub(crate) const COLUMNS: &str = "\
    id, assignment_id, question_id, choice_id, selected_choice_ids, text_body, \
    file_reference, score, feedback, created_at, updated_at";

pub(crate) struct UpsertAnswer<'a> {
    pub(crate) id: &'a str,
    pub(crate) assignment_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) choice_id: Option<&'a str>,
    pub(crate) selected_choice_ids: Option<Vec<String>>,
    pub(crate) text_body: Option<&'a str>,
    pub(crate) file_reference: Option<&'a str>,
    pub(crate) now: PrimitiveDateTime,
}

/// At most one answer per (assignment, question). Replacing content resets
/// score and feedback: a changed answer invalidates any prior grade.
pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    answer: UpsertAnswer<'_>,
) -> Result<Answer, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "INSERT INTO answers (
            id, assignment_id, question_id, choice_id, selected_choice_ids,
            text_body, file_reference, score, feedback, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,NULL,NULL,$8,$8)
        ON CONFLICT (assignment_id, question_id) DO UPDATE
        SET choice_id = EXCLUDED.choice_id,
            selected_choice_ids = EXCLUDED.selected_choice_ids,
            text_body = EXCLUDED.text_body,
            file_reference = EXCLUDED.file_reference,
            score = NULL,
            feedback = NULL,
            updated_at = EXCLUDED.updated_at
        RETURNING {COLUMNS}"
    ))
    .bind(answer.id)
    .bind(answer.assignment_id)
    .bind(answer.question_id)
    .bind(answer.choice_id)
    .bind(answer.selected_choice_ids.map(Json))
    .bind(answer.text_body)
    .bind(answer.file_reference)
    .bind(answer.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_assignment(
    executor: impl sqlx::PgExecutor<'_>,
    assignment_id: &str,
) -> Result<Vec<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "SELECT {COLUMNS} FROM answers WHERE assignment_id = $1"
    ))
    .bind(assignment_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn count_by_assignment(
    executor: impl sqlx::PgExecutor<'_>,
    assignment_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM answers WHERE assignment_id = $1")
        .bind(assignment_id)
        .fetch_one(executor)
        .await
}

/// Auto-scoring writes on submission.
pub(crate) async fn set_auto_score(
    executor: impl sqlx::PgExecutor<'_>,
    answer_id: &str,
    score: f64,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE answers SET score = $1, updated_at = $2 WHERE id = $3")
        .bind(score)
        .bind(now)
        .bind(answer_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Teacher grading writes; keeps feedback when none is supplied.
pub(crate) async fn set_manual_score(
    executor: impl sqlx::PgExecutor<'_>,
    assignment_id: &str,
    question_id: &str,
    score: f64,
    feedback: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE answers
         SET score = $1,
             feedback = COALESCE($2, feedback),
             updated_at = $3
         WHERE assignment_id = $4 AND question_id = $5",
    )
    .bind(score)
    .bind(feedback)
    .bind(now)
    .bind(assignment_id)
    .bind(question_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
