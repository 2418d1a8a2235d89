use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::AssignmentEvent;
use crate::db::types::EventKind;

pub(crate) const COLUMNS: &str = "id, assignment_id, event, reason, actor, created_at";

/// Append-only provenance trail; reopen/reassign reasons land here.
pub(crate) async fn record(
    executor: impl sqlx::PgExecutor<'_>,
    assignment_id: &str,
    event: EventKind,
    reason: Option<&str>,
    actor: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO assignment_events (id, assignment_id, event, reason, actor, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(assignment_id)
    .bind(event)
    .bind(reason)
    .bind(actor)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn list_by_assignment(
    executor: impl sqlx::PgExecutor<'_>,
    assignment_id: &str,
) -> Result<Vec<AssignmentEvent>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentEvent>(&format!(
        "SELECT {COLUMNS} FROM assignment_events
         WHERE assignment_id = $1
         ORDER BY created_at"
    ))
    .bind(assignment_id)
    .fetch_all(executor)
    .await
}
