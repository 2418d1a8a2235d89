use crate::db::models::Enrollment;

pub(crate) const COLUMNS: &str = "id, class_id, student_id, created_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!("SELECT {COLUMNS} FROM enrollments WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn list_by_class(
    executor: impl sqlx::PgExecutor<'_>,
    class_id: &str,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE class_id = $1 ORDER BY created_at"
    ))
    .bind(class_id)
    .fetch_all(executor)
    .await
}
