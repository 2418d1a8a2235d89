use time::PrimitiveDateTime;

use crate::db::models::TeachingPeriod;

pub(crate) const COLUMNS: &str =
    "id, class_subject_id, teacher_id, valid_from, valid_to, created_at";

/// Serializes teacher replacements per class-subject for the lifetime of
/// the surrounding transaction. Concurrent replacements on the same
/// pairing queue here and the later one re-reads committed history.
pub(crate) async fn acquire_class_subject_lock(
    executor: impl sqlx::PgExecutor<'_>,
    class_subject_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(class_subject_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn find_open(
    executor: impl sqlx::PgExecutor<'_>,
    class_subject_id: &str,
) -> Result<Option<TeachingPeriod>, sqlx::Error> {
    sqlx::query_as::<_, TeachingPeriod>(&format!(
        "SELECT {COLUMNS} FROM teaching_periods
         WHERE class_subject_id = $1 AND valid_to IS NULL"
    ))
    .bind(class_subject_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn close(
    executor: impl sqlx::PgExecutor<'_>,
    period_id: &str,
    valid_to: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE teaching_periods SET valid_to = $1 WHERE id = $2 AND valid_to IS NULL")
        .bind(valid_to)
        .bind(period_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) struct CreatePeriod<'a> {
    pub(crate) id: &'a str,
    pub(crate) class_subject_id: &'a str,
    pub(crate) teacher_id: &'a str,
    pub(crate) valid_from: PrimitiveDateTime,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    period: CreatePeriod<'_>,
) -> Result<TeachingPeriod, sqlx::Error> {
    sqlx::query_as::<_, TeachingPeriod>(&format!(
        "INSERT INTO teaching_periods (id, class_subject_id, teacher_id, valid_from, valid_to, created_at)
         VALUES ($1,$2,$3,$4,NULL,$5)
         RETURNING {COLUMNS}"
    ))
    .bind(period.id)
    .bind(period.class_subject_id)
    .bind(period.teacher_id)
    .bind(period.valid_from)
    .bind(period.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_class_subject(
    executor: impl sqlx::PgExecutor<'_>,
    class_subject_id: &str,
) -> Result<Vec<TeachingPeriod>, sqlx::Error> {
    sqlx::query_as::<_, TeachingPeriod>(&format!(
        "SELECT {COLUMNS} FROM teaching_periods
         WHERE class_subject_id = $1
         ORDER BY valid_from"
    ))
    .bind(class_subject_id)
    .fetch_all(executor)
    .await
}
