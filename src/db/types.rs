use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Teacher,
    Student,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "questionkind", rename_all = "snake_case")]
pub(crate) enum QuestionKind {
    Text,
    SingleSelect,
    MultiSelect,
    Boolean,
    FileUpload,
}

impl QuestionKind {
    /// Kinds the scorer can grade without human judgment.
    pub(crate) fn is_auto_gradable(self) -> bool {
        matches!(self, Self::SingleSelect | Self::MultiSelect | Self::Boolean)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "deliverymode", rename_all = "lowercase")]
pub(crate) enum DeliveryMode {
    Supervised,
    Homework,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "violationtag", rename_all = "snake_case")]
pub(crate) enum ViolationTag {
    TabSwitch,
    FullscreenExit,
    DeadlineExpired,
}

impl ViolationTag {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::TabSwitch => "tab_switch",
            Self::FullscreenExit => "fullscreen_exit",
            Self::DeadlineExpired => "deadline_expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "assignmentevent", rename_all = "snake_case")]
pub(crate) enum EventKind {
    Materialized,
    Started,
    Submitted,
    ForcedSubmission,
    ManualScore,
    Graded,
    Reopened,
    Reassigned,
}
