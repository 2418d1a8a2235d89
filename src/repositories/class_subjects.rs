use crate::db::models::ClassSubject;

pub(crate) const COLUMNS: &str =
    "id, class_id, subject_id, coefficient, created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<ClassSubject>, sqlx::Error> {
    sqlx::query_as::<_, ClassSubject>(&format!(
        "SELECT {COLUMNS} FROM class_subjects WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}
