use serde::Serialize;

use crate::db::models::{Assignment, Enrollment};
use crate::db::types::DeliveryMode;
use crate::services::error::EngineError;

/// Logical lifecycle state. Never stored: derived from the timestamp
/// columns by [`assignment_status`] so no two code paths can disagree
/// about what state an assignment is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum AssignmentStatus {
    NotStarted,
    InProgress,
    Submitted,
    Graded,
}

impl AssignmentStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::Graded => "graded",
        }
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single authoritative derivation of lifecycle state from timestamps.
pub(crate) fn assignment_status(assignment: &Assignment) -> AssignmentStatus {
    if assignment.graded_at.is_some() {
        AssignmentStatus::Graded
    } else if assignment.submitted_at.is_some() {
        AssignmentStatus::Submitted
    } else if assignment.started_at.is_some() {
        AssignmentStatus::InProgress
    } else {
        AssignmentStatus::NotStarted
    }
}

/// An assignment as seen on the read path: either a persisted row or a
/// synthetic entry derived from an enrollment with no row yet. Virtual
/// entries carry no id and must be materialized before any write.
#[derive(Debug, Clone)]
pub(crate) enum AssignmentRef {
    Persisted(Assignment),
    Virtual { assessment_id: String, enrollment: Enrollment },
}

impl AssignmentRef {
    pub(crate) fn status(&self) -> AssignmentStatus {
        match self {
            Self::Persisted(assignment) => assignment_status(assignment),
            Self::Virtual { .. } => AssignmentStatus::NotStarted,
        }
    }
}

/// Answers may be recorded before the first start (the write itself starts
/// the assignment) and while in progress, never after submission.
pub(crate) fn ensure_can_record_answer(status: AssignmentStatus) -> Result<(), EngineError> {
    match status {
        AssignmentStatus::NotStarted | AssignmentStatus::InProgress => Ok(()),
        from => Err(EngineError::InvalidTransition { from, action: "record an answer for" }),
    }
}

pub(crate) fn ensure_can_start(status: AssignmentStatus) -> Result<(), EngineError> {
    match status {
        AssignmentStatus::NotStarted | AssignmentStatus::InProgress => Ok(()),
        from => Err(EngineError::InvalidTransition { from, action: "start" }),
    }
}

/// Submission (voluntary or violation-forced) is legal only from
/// `in_progress`; this is what makes the gate one-way.
pub(crate) fn ensure_can_submit(status: AssignmentStatus) -> Result<(), EngineError> {
    match status {
        AssignmentStatus::InProgress => Ok(()),
        from => Err(EngineError::InvalidTransition { from, action: "submit" }),
    }
}

pub(crate) fn ensure_can_grade(status: AssignmentStatus) -> Result<(), EngineError> {
    match status {
        AssignmentStatus::Submitted => Ok(()),
        from => Err(EngineError::InvalidTransition { from, action: "grade" }),
    }
}

/// Reopen models "the student was cut off unfairly, let them resume": it
/// is restricted to supervised assignments that were force-submitted by an
/// interruption. A clean voluntary submission stays final.
pub(crate) fn ensure_can_reopen(
    assignment: &Assignment,
    delivery_mode: DeliveryMode,
) -> Result<(), EngineError> {
    let status = assignment_status(assignment);
    match status {
        AssignmentStatus::Submitted | AssignmentStatus::Graded => {}
        from => return Err(EngineError::InvalidTransition { from, action: "reopen" }),
    }

    if delivery_mode != DeliveryMode::Supervised || !assignment.forced_submission {
        return Err(EngineError::InvalidTransition { from: status, action: "reopen" });
    }

    Ok(())
}

/// Reassign gives a fresh attempt without a second row; it is only legal
/// while nothing has been answered yet.
pub(crate) fn ensure_can_reassign(
    status: AssignmentStatus,
    answer_count: i64,
) -> Result<(), EngineError> {
    if answer_count > 0 {
        return Err(EngineError::InvalidTransition { from: status, action: "reassign" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, PrimitiveDateTime, Time};

    fn ts(hour: u8) -> PrimitiveDateTime {
        let date = Date::from_calendar_date(2026, time::Month::April, 14).unwrap();
        PrimitiveDateTime::new(date, Time::from_hms(hour, 0, 0).unwrap())
    }

    fn assignment() -> Assignment {
        Assignment {
            id: "as-1".to_string(),
            assessment_id: "ax-1".to_string(),
            enrollment_id: "en-1".to_string(),
            assigned_at: ts(8),
            started_at: None,
            submitted_at: None,
            graded_at: None,
            score: None,
            security_violation: None,
            forced_submission: false,
            teacher_notes: None,
            created_at: ts(8),
            updated_at: ts(8),
        }
    }

    #[test]
    fn status_is_derived_from_timestamps() {
        let mut a = assignment();
        assert_eq!(assignment_status(&a), AssignmentStatus::NotStarted);

        a.started_at = Some(ts(9));
        assert_eq!(assignment_status(&a), AssignmentStatus::InProgress);

        a.submitted_at = Some(ts(10));
        assert_eq!(assignment_status(&a), AssignmentStatus::Submitted);

        a.graded_at = Some(ts(11));
        assert_eq!(assignment_status(&a), AssignmentStatus::Graded);
    }

    #[test]
    fn submit_requires_in_progress() {
        assert!(ensure_can_submit(AssignmentStatus::InProgress).is_ok());

        for status in [
            AssignmentStatus::NotStarted,
            AssignmentStatus::Submitted,
            AssignmentStatus::Graded,
        ] {
            let err = ensure_can_submit(status).unwrap_err();
            assert!(matches!(err, EngineError::InvalidTransition { from, action: "submit" } if from == status));
        }
    }

    #[test]
    fn answers_are_rejected_after_submission() {
        assert!(ensure_can_record_answer(AssignmentStatus::NotStarted).is_ok());
        assert!(ensure_can_record_answer(AssignmentStatus::InProgress).is_ok());
        assert!(ensure_can_record_answer(AssignmentStatus::Submitted).is_err());
        assert!(ensure_can_record_answer(AssignmentStatus::Graded).is_err());
    }

    #[test]
    fn reopen_rejects_voluntary_submission() {
        let mut a = assignment();
        a.started_at = Some(ts(9));
        a.submitted_at = Some(ts(10));
        a.forced_submission = false;

        assert!(ensure_can_reopen(&a, DeliveryMode::Supervised).is_err());
    }

    #[test]
    fn reopen_accepts_forced_supervised_submission() {
        let mut a = assignment();
        a.started_at = Some(ts(9));
        a.submitted_at = Some(ts(10));
        a.forced_submission = true;

        assert!(ensure_can_reopen(&a, DeliveryMode::Supervised).is_ok());
        // Still legal after grading: the interruption does not expire.
        a.graded_at = Some(ts(11));
        assert!(ensure_can_reopen(&a, DeliveryMode::Supervised).is_ok());
    }

    #[test]
    fn reopen_rejects_homework_and_unsubmitted() {
        let mut a = assignment();
        a.started_at = Some(ts(9));
        a.submitted_at = Some(ts(10));
        a.forced_submission = true;
        assert!(ensure_can_reopen(&a, DeliveryMode::Homework).is_err());

        let mut open = assignment();
        open.started_at = Some(ts(9));
        open.forced_submission = true;
        assert!(ensure_can_reopen(&open, DeliveryMode::Supervised).is_err());
    }

    #[test]
    fn reassign_requires_zero_answers() {
        assert!(ensure_can_reassign(AssignmentStatus::InProgress, 0).is_ok());
        assert!(ensure_can_reassign(AssignmentStatus::Submitted, 0).is_ok());
        assert!(ensure_can_reassign(AssignmentStatus::InProgress, 2).is_err());
    }

    #[test]
    fn virtual_assignments_read_as_not_started() {
        let enrollment = Enrollment {
            id: "en-1".to_string(),
            class_id: "cl-1".to_string(),
            student_id: "st-1".to_string(),
            created_at: ts(8),
        };
        let reference =
            AssignmentRef::Virtual { assessment_id: "ax-1".to_string(), enrollment };

        assert_eq!(reference.status(), AssignmentStatus::NotStarted);
    }
}
