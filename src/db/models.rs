use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{DeliveryMode, EventKind, QuestionKind, UserRole, ViolationTag};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) full_name: String,
    pub(crate) role: UserRole,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Enrollment {
    pub(crate) id: String,
    pub(crate) class_id: String,
    pub(crate) student_id: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ClassSubject {
    pub(crate) id: String,
    pub(crate) class_id: String,
    pub(crate) subject_id: String,
    pub(crate) coefficient: f64,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// One teacher-of-record period for a class-subject pairing.
/// Periods are half-open: `[valid_from, valid_to)`, with the currently
/// open period carrying `valid_to = NULL`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct TeachingPeriod {
    pub(crate) id: String,
    pub(crate) class_subject_id: String,
    pub(crate) teacher_id: String,
    pub(crate) valid_from: PrimitiveDateTime,
    pub(crate) valid_to: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Assessment {
    pub(crate) id: String,
    pub(crate) class_subject_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) coefficient: f64,
    pub(crate) delivery_mode: DeliveryMode,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) available_from: PrimitiveDateTime,
    pub(crate) due_at: PrimitiveDateTime,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) assessment_id: String,
    pub(crate) kind: QuestionKind,
    pub(crate) prompt: String,
    pub(crate) points: f64,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Choice {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) content: String,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

/// The binding of one enrollment to one assessment. Lifecycle state is
/// derived from the timestamp columns, never stored separately.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Assignment {
    pub(crate) id: String,
    pub(crate) assessment_id: String,
    pub(crate) enrollment_id: String,
    pub(crate) assigned_at: PrimitiveDateTime,
    pub(crate) started_at: Option<PrimitiveDateTime>,
    pub(crate) submitted_at: Option<PrimitiveDateTime>,
    pub(crate) graded_at: Option<PrimitiveDateTime>,
    pub(crate) score: Option<f64>,
    pub(crate) security_violation: Option<ViolationTag>,
    pub(crate) forced_submission: bool,
    pub(crate) teacher_notes: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Answer {
    pub(crate) id: String,
    pub(crate) assignment_id: String,
    pub(crate) question_id: String,
    pub(crate) choice_id: Option<String>,
    pub(crate) selected_choice_ids: Option<Json<Vec<String>>>,
    pub(crate) text_body: Option<String>,
    pub(crate) file_reference: Option<String>,
    pub(crate) score: Option<f64>,
    pub(crate) feedback: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AssignmentEvent {
    pub(crate) id: String,
    pub(crate) assignment_id: String,
    pub(crate) event: EventKind,
    pub(crate) reason: Option<String>,
    pub(crate) actor: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}
