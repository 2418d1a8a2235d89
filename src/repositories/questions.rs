use time::PrimitiveDateTime;

use crate::db::models::{Choice, Question};
use crate::db::types::QuestionKind;

pub(crate) const COLUMNS: &str =
    "id, assessment_id, kind, prompt, points, order_index, created_at, updated_at";

pub(crate) const CHOICE_COLUMNS: &str =
    "id, question_id, content, is_correct, order_index, created_at";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) assessment_id: &'a str,
    pub(crate) kind: QuestionKind,
    pub(crate) prompt: &'a str,
    pub(crate) points: f64,
    pub(crate) order_index: i32,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    question: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (id, assessment_id, kind, prompt, points, order_index, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
         RETURNING {COLUMNS}"
    ))
    .bind(question.id)
    .bind(question.assessment_id)
    .bind(question.kind)
    .bind(question.prompt)
    .bind(question.points)
    .bind(question.order_index)
    .bind(question.now)
    .fetch_one(executor)
    .await
}

pub(crate) struct CreateChoice<'a> {
    pub(crate) id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) content: &'a str,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create_choice(
    executor: impl sqlx::PgExecutor<'_>,
    choice: CreateChoice<'_>,
) -> Result<Choice, sqlx::Error> {
    sqlx::query_as::<_, Choice>(&format!(
        "INSERT INTO choices (id, question_id, content, is_correct, order_index, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {CHOICE_COLUMNS}"
    ))
    .bind(choice.id)
    .bind(choice.question_id)
    .bind(choice.content)
    .bind(choice.is_correct)
    .bind(choice.order_index)
    .bind(choice.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_assessment(
    executor: impl sqlx::PgExecutor<'_>,
    assessment_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE assessment_id = $1 ORDER BY order_index"
    ))
    .bind(assessment_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn list_choices_by_question(
    executor: impl sqlx::PgExecutor<'_>,
    question_id: &str,
) -> Result<Vec<Choice>, sqlx::Error> {
    sqlx::query_as::<_, Choice>(&format!(
        "SELECT {CHOICE_COLUMNS} FROM choices WHERE question_id = $1 ORDER BY order_index"
    ))
    .bind(question_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_choices_by_assessment(
    executor: impl sqlx::PgExecutor<'_>,
    assessment_id: &str,
) -> Result<Vec<Choice>, sqlx::Error> {
    sqlx::query_as::<_, Choice>(&format!(
        "SELECT c.{} FROM choices c
         JOIN questions q ON q.id = c.question_id
         WHERE q.assessment_id = $1
         ORDER BY q.order_index, c.order_index",
        CHOICE_COLUMNS.replace(", ", ", c."),
    ))
    .bind(assessment_id)
    .fetch_all(executor)
    .await
}
