use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use validator::Validate;

pub(crate) use crate::core::time::format_primitive;
use crate::db::models::{Assessment, Choice, Question};
use crate::db::types::{DeliveryMode, QuestionKind};
use crate::schemas::deserialize_datetime_flexible;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ChoiceCreate {
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub(crate) content: String,
    #[serde(default)]
    #[serde(alias = "isCorrect")]
    pub(crate) is_correct: bool,
    #[serde(alias = "orderIndex")]
    #[validate(range(min = 0, message = "order_index must be non-negative"))]
    pub(crate) order_index: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    pub(crate) kind: QuestionKind,
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub(crate) prompt: String,
    #[validate(range(exclusive_min = 0.0, message = "points must be positive"))]
    pub(crate) points: f64,
    #[serde(alias = "orderIndex")]
    #[validate(range(min = 0, message = "order_index must be non-negative"))]
    pub(crate) order_index: i32,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) choices: Vec<ChoiceCreate>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssessmentCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "coefficient must be positive"))]
    pub(crate) coefficient: f64,
    #[serde(alias = "deliveryMode")]
    pub(crate) delivery_mode: DeliveryMode,
    #[serde(default)]
    #[serde(alias = "durationMinutes")]
    pub(crate) duration_minutes: Option<i32>,
    #[serde(alias = "availableFrom", deserialize_with = "deserialize_datetime_flexible")]
    pub(crate) available_from: PrimitiveDateTime,
    #[serde(alias = "dueAt", deserialize_with = "deserialize_datetime_flexible")]
    pub(crate) due_at: PrimitiveDateTime,
    #[serde(alias = "createdBy")]
    pub(crate) created_by: String,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) questions: Vec<QuestionCreate>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChoiceResponse {
    pub(crate) id: String,
    pub(crate) content: String,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) kind: QuestionKind,
    pub(crate) prompt: String,
    pub(crate) points: f64,
    pub(crate) order_index: i32,
    pub(crate) choices: Vec<ChoiceResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssessmentResponse {
    pub(crate) id: String,
    pub(crate) class_subject_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) coefficient: f64,
    pub(crate) delivery_mode: DeliveryMode,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) available_from: String,
    pub(crate) due_at: String,
    pub(crate) total_points: f64,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    pub(crate) questions: Vec<QuestionResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssessmentSummaryResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) coefficient: f64,
    pub(crate) delivery_mode: DeliveryMode,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) available_from: String,
    pub(crate) due_at: String,
    pub(crate) total_points: f64,
    pub(crate) question_count: i64,
}

pub(crate) fn question_to_response(question: Question, choices: &[Choice]) -> QuestionResponse {
    QuestionResponse {
        choices: choices
            .iter()
            .filter(|choice| choice.question_id == question.id)
            .map(|choice| ChoiceResponse {
                id: choice.id.clone(),
                content: choice.content.clone(),
                is_correct: choice.is_correct,
                order_index: choice.order_index,
            })
            .collect(),
        id: question.id,
        kind: question.kind,
        prompt: question.prompt,
        points: question.points,
        order_index: question.order_index,
    }
}

pub(crate) fn assessment_to_response(
    assessment: Assessment,
    questions: Vec<Question>,
    choices: &[Choice],
) -> AssessmentResponse {
    let total_points = questions.iter().map(|question| question.points).sum();

    AssessmentResponse {
        id: assessment.id,
        class_subject_id: assessment.class_subject_id,
        title: assessment.title,
        description: assessment.description,
        coefficient: assessment.coefficient,
        delivery_mode: assessment.delivery_mode,
        duration_minutes: assessment.duration_minutes,
        available_from: format_primitive(assessment.available_from),
        due_at: format_primitive(assessment.due_at),
        total_points,
        created_by: assessment.created_by,
        created_at: format_primitive(assessment.created_at),
        updated_at: format_primitive(assessment.updated_at),
        questions: questions
            .into_iter()
            .map(|question| question_to_response(question, choices))
            .collect(),
    }
}
