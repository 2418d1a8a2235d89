use axum::{
    routing::{get, post, put},
    Router,
};

use crate::core::state::AppState;

pub(crate) mod helpers;
mod student;
mod teacher;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:assignment_id", get(student::get_assignment))
        .route("/:assignment_id/answers/:question_id", put(student::record_answer))
        .route("/:assignment_id/submit", post(student::submit_assignment))
        .route("/:assignment_id/violation", post(student::report_violation))
        .route("/:assignment_id/answers/:question_id/grade", put(teacher::grade_manual_answer))
        .route("/:assignment_id/finalize", post(teacher::finalize_assignment))
        .route("/:assignment_id/reopen", post(teacher::reopen_assignment))
        .route("/:assignment_id/reassign", post(teacher::reassign_assignment))
}
