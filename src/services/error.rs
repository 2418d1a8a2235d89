use thiserror::Error;

use crate::services::lifecycle::AssignmentStatus;

/// Domain failures of the grading engine. All of these are recoverable at
/// the call site; the HTTP layer maps them onto 4xx responses. Persistence
/// failures are carried separately and stay infrastructure errors.
#[derive(Debug, Error)]
pub(crate) enum EngineError {
    #[error("answer does not match question shape: {0}")]
    InvalidAnswerShape(String),

    #[error("cannot {action} an assignment that is {from}")]
    InvalidTransition { from: AssignmentStatus, action: &'static str },

    #[error("effective date conflicts with teaching history: {0}")]
    InvalidEffectiveDate(String),

    #[error("{remaining} manually graded question(s) still unscored")]
    IncompleteGrading { remaining: usize },
}

/// Engine operation outcome: domain rejections are separated from
/// infrastructure failures so callers can map them independently.
#[derive(Debug, Error)]
pub(crate) enum EngineOpError {
    #[error(transparent)]
    Domain(#[from] EngineError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("persistence failure: {0}")]
    Db(#[from] sqlx::Error),
}
