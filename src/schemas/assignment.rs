use serde::{Deserialize, Serialize};
use validator::Validate;

pub(crate) use crate::core::time::format_primitive;
use crate::db::models::{Answer, Assignment, AssignmentEvent};
use crate::db::types::{EventKind, ViolationTag};
use crate::services::aggregation::ProvisionalTotal;
use crate::services::lifecycle::{AssignmentRef, AssignmentStatus};
use crate::services::scoring::AnswerContent;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StartAssignmentRequest {
    #[serde(alias = "enrollmentId")]
    #[validate(length(min = 1, message = "enrollment_id must not be empty"))]
    pub(crate) enrollment_id: String,
}

/// One answer as submitted; exactly one content field is expected to be
/// set, matching the question kind. Shape is enforced by the engine, not
/// by serde.
#[derive(Debug, Deserialize)]
pub(crate) struct AnswerPayload {
    #[serde(default)]
    #[serde(alias = "choiceId")]
    pub(crate) choice_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "selectedChoiceIds")]
    pub(crate) selected_choice_ids: Option<Vec<String>>,
    #[serde(default)]
    #[serde(alias = "textBody")]
    pub(crate) text_body: Option<String>,
    #[serde(default)]
    #[serde(alias = "fileReference")]
    pub(crate) file_reference: Option<String>,
}

impl AnswerPayload {
    pub(crate) fn as_content(&self) -> AnswerContent<'_> {
        AnswerContent {
            choice_id: self.choice_id.as_deref(),
            selected_choice_ids: self.selected_choice_ids.as_deref(),
            text_body: self.text_body.as_deref(),
            file_reference: self.file_reference.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ViolationRequest {
    pub(crate) violation: ViolationTag,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ManualGradeRequest {
    #[validate(range(min = 0.0, message = "score must be non-negative"))]
    pub(crate) score: f64,
    #[serde(default)]
    pub(crate) feedback: Option<String>,
    #[serde(default)]
    #[serde(alias = "gradedBy")]
    pub(crate) graded_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FinalizeRequest {
    #[serde(default)]
    #[serde(alias = "teacherNotes")]
    pub(crate) teacher_notes: Option<String>,
    #[serde(default)]
    pub(crate) actor: Option<String>,
}

/// Reopen and reassign are audited actions; the reason is mandatory.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LifecycleActionRequest {
    #[validate(length(min = 1, message = "reason must not be empty"))]
    pub(crate) reason: String,
    #[serde(default)]
    pub(crate) actor: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerResponse {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) choice_id: Option<String>,
    pub(crate) selected_choice_ids: Option<Vec<String>>,
    pub(crate) text_body: Option<String>,
    pub(crate) file_reference: Option<String>,
    pub(crate) score: Option<f64>,
    pub(crate) feedback: Option<String>,
    pub(crate) updated_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentEventResponse {
    pub(crate) event: EventKind,
    pub(crate) reason: Option<String>,
    pub(crate) actor: Option<String>,
    pub(crate) created_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentResponse {
    pub(crate) id: String,
    pub(crate) assessment_id: String,
    pub(crate) enrollment_id: String,
    pub(crate) status: AssignmentStatus,
    pub(crate) assigned_at: String,
    pub(crate) started_at: Option<String>,
    pub(crate) submitted_at: Option<String>,
    pub(crate) graded_at: Option<String>,
    pub(crate) score: Option<f64>,
    pub(crate) pending_manual: usize,
    pub(crate) security_violation: Option<ViolationTag>,
    pub(crate) forced_submission: bool,
    pub(crate) teacher_notes: Option<String>,
    pub(crate) answers: Vec<AnswerResponse>,
    pub(crate) events: Vec<AssignmentEventResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GradeResponse {
    pub(crate) finalized: bool,
    pub(crate) pending_manual: usize,
    pub(crate) assignment: AssignmentResponse,
}

/// Teacher-facing roster entry. Virtual assignments carry no id: the row
/// does not exist until the student's first interaction materializes it.
#[derive(Debug, Serialize)]
pub(crate) struct AssignmentListItem {
    pub(crate) id: Option<String>,
    pub(crate) enrollment_id: String,
    pub(crate) student_id: String,
    pub(crate) status: AssignmentStatus,
    pub(crate) score: Option<f64>,
    pub(crate) submitted_at: Option<String>,
    pub(crate) forced_submission: bool,
}

pub(crate) fn answer_to_response(answer: Answer) -> AnswerResponse {
    AnswerResponse {
        id: answer.id,
        question_id: answer.question_id,
        choice_id: answer.choice_id,
        selected_choice_ids: answer.selected_choice_ids.map(|ids| ids.0),
        text_body: answer.text_body,
        file_reference: answer.file_reference,
        score: answer.score,
        feedback: answer.feedback,
        updated_at: format_primitive(answer.updated_at),
    }
}

pub(crate) fn event_to_response(event: AssignmentEvent) -> AssignmentEventResponse {
    AssignmentEventResponse {
        event: event.event,
        reason: event.reason,
        actor: event.actor,
        created_at: format_primitive(event.created_at),
    }
}

pub(crate) fn assignment_to_response(
    assignment: Assignment,
    total: ProvisionalTotal,
    answers: Vec<Answer>,
    events: Vec<AssignmentEvent>,
) -> AssignmentResponse {
    AssignmentResponse {
        status: crate::services::lifecycle::assignment_status(&assignment),
        id: assignment.id,
        assessment_id: assignment.assessment_id,
        enrollment_id: assignment.enrollment_id,
        assigned_at: format_primitive(assignment.assigned_at),
        started_at: assignment.started_at.map(format_primitive),
        submitted_at: assignment.submitted_at.map(format_primitive),
        graded_at: assignment.graded_at.map(format_primitive),
        score: assignment.score,
        pending_manual: total.pending_manual,
        security_violation: assignment.security_violation,
        forced_submission: assignment.forced_submission,
        teacher_notes: assignment.teacher_notes,
        answers: answers.into_iter().map(answer_to_response).collect(),
        events: events.into_iter().map(event_to_response).collect(),
    }
}

pub(crate) fn roster_item(reference: AssignmentRef, student_id: String) -> AssignmentListItem {
    let status = reference.status();
    match reference {
        AssignmentRef::Persisted(assignment) => AssignmentListItem {
            id: Some(assignment.id),
            enrollment_id: assignment.enrollment_id,
            student_id,
            status,
            score: assignment.score,
            submitted_at: assignment.submitted_at.map(format_primitive),
            forced_submission: assignment.forced_submission,
        },
        AssignmentRef::Virtual { enrollment, .. } => AssignmentListItem {
            id: None,
            enrollment_id: enrollment.id,
            student_id,
            status,
            score: None,
            submitted_at: None,
            forced_submission: false,
        },
    }
}
