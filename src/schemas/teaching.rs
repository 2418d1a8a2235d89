use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use validator::Validate;

pub(crate) use crate::core::time::format_primitive;
use crate::db::models::TeachingPeriod;
use crate::schemas::deserialize_datetime_flexible;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ReplaceTeacherRequest {
    #[serde(alias = "teacherId")]
    #[validate(length(min = 1, message = "teacher_id must not be empty"))]
    pub(crate) teacher_id: String,
    #[serde(alias = "effectiveDate", deserialize_with = "deserialize_datetime_flexible")]
    pub(crate) effective_date: PrimitiveDateTime,
}

#[derive(Debug, Serialize)]
pub(crate) struct TeachingPeriodResponse {
    pub(crate) id: String,
    pub(crate) teacher_id: String,
    pub(crate) valid_from: String,
    pub(crate) valid_to: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CurrentTeacherResponse {
    pub(crate) class_subject_id: String,
    pub(crate) as_of: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) teacher_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectAverageItem {
    pub(crate) assessment_id: String,
    pub(crate) title: String,
    pub(crate) score: f64,
    pub(crate) total_points: f64,
    pub(crate) normalized: f64,
    pub(crate) coefficient: f64,
    pub(crate) graded_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectAverageResponse {
    pub(crate) class_subject_id: String,
    pub(crate) student_id: String,
    pub(crate) as_of: String,
    pub(crate) scale: f64,
    /// Null until at least one assessment is graded; never zero-filled.
    pub(crate) average: Option<f64>,
    pub(crate) assessments: Vec<SubjectAverageItem>,
    /// Attribution only: who owned the class-subject at `as_of`.
    pub(crate) teacher_of_record: Option<String>,
}

pub(crate) fn period_to_response(period: TeachingPeriod) -> TeachingPeriodResponse {
    TeachingPeriodResponse {
        id: period.id,
        teacher_id: period.teacher_id,
        valid_from: format_primitive(period.valid_from),
        valid_to: period.valid_to.map(format_primitive),
    }
}
