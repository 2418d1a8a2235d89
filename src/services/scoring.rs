use std::collections::BTreeSet;

use crate::db::models::{Answer, Choice, Question};
use crate::db::types::QuestionKind;
use crate::services::error::EngineError;

/// What the scorer decided for one (question, answer) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ScoreOutcome {
    /// Auto-gradable kinds: a definite score and verdict.
    Scored { score: f64, is_correct: bool },
    /// Text and file answers: the score stays null until a human grades.
    Manual,
}

/// A question as the scorer sees it: kind, weight, and the choice key.
/// Decoupled from the persisted row so scoring stays a pure function.
#[derive(Debug, Clone)]
pub(crate) struct QuestionDef<'a> {
    pub(crate) kind: QuestionKind,
    pub(crate) points: f64,
    pub(crate) choices: Vec<ChoiceKey<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ChoiceKey<'a> {
    pub(crate) id: &'a str,
    pub(crate) is_correct: bool,
}

impl<'a> QuestionDef<'a> {
    pub(crate) fn from_model(question: &Question, choices: &'a [Choice]) -> Self {
        Self {
            kind: question.kind,
            points: question.points,
            choices: choices
                .iter()
                .filter(|choice| choice.question_id == question.id)
                .map(|choice| ChoiceKey { id: &choice.id, is_correct: choice.is_correct })
                .collect(),
        }
    }

    fn contains_choice(&self, id: &str) -> bool {
        self.choices.iter().any(|choice| choice.id == id)
    }

    fn correct_ids(&self) -> BTreeSet<&'a str> {
        self.choices.iter().filter(|choice| choice.is_correct).map(|choice| choice.id).collect()
    }
}

/// The submitted content of one answer, shape-agnostic. At most one of the
/// fields is expected to be populated, matching the question kind.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct AnswerContent<'a> {
    pub(crate) choice_id: Option<&'a str>,
    pub(crate) selected_choice_ids: Option<&'a [String]>,
    pub(crate) text_body: Option<&'a str>,
    pub(crate) file_reference: Option<&'a str>,
}

impl<'a> AnswerContent<'a> {
    pub(crate) fn from_model(answer: &'a Answer) -> Self {
        Self {
            choice_id: answer.choice_id.as_deref(),
            selected_choice_ids: answer.selected_choice_ids.as_ref().map(|ids| ids.0.as_slice()),
            text_body: answer.text_body.as_deref(),
            file_reference: answer.file_reference.as_deref(),
        }
    }
}

/// Checks that the populated content fields match the question kind and
/// that every referenced choice belongs to the question. Runs before any
/// scoring and before an answer is persisted.
pub(crate) fn validate_answer_shape(
    question: &QuestionDef<'_>,
    content: &AnswerContent<'_>,
) -> Result<(), EngineError> {
    match question.kind {
        QuestionKind::SingleSelect | QuestionKind::Boolean => {
            let Some(choice_id) = content.choice_id else {
                return Err(EngineError::InvalidAnswerShape(
                    "a single choice id is required".to_string(),
                ));
            };
            if content.selected_choice_ids.is_some()
                || content.text_body.is_some()
                || content.file_reference.is_some()
            {
                return Err(EngineError::InvalidAnswerShape(
                    "only choice_id may be set for this question".to_string(),
                ));
            }
            if !question.contains_choice(choice_id) {
                return Err(EngineError::InvalidAnswerShape(format!(
                    "choice {choice_id} does not belong to this question"
                )));
            }
        }
        QuestionKind::MultiSelect => {
            let Some(selected) = content.selected_choice_ids else {
                return Err(EngineError::InvalidAnswerShape(
                    "a set of selected choice ids is required".to_string(),
                ));
            };
            if content.choice_id.is_some()
                || content.text_body.is_some()
                || content.file_reference.is_some()
            {
                return Err(EngineError::InvalidAnswerShape(
                    "only selected_choice_ids may be set for this question".to_string(),
                ));
            }
            for id in selected {
                if !question.contains_choice(id) {
                    return Err(EngineError::InvalidAnswerShape(format!(
                        "choice {id} does not belong to this question"
                    )));
                }
            }
        }
        QuestionKind::Text => {
            if content.text_body.is_none() {
                return Err(EngineError::InvalidAnswerShape("text_body is required".to_string()));
            }
            if content.choice_id.is_some()
                || content.selected_choice_ids.is_some()
                || content.file_reference.is_some()
            {
                return Err(EngineError::InvalidAnswerShape(
                    "only text_body may be set for this question".to_string(),
                ));
            }
        }
        QuestionKind::FileUpload => {
            if content.file_reference.is_none() {
                return Err(EngineError::InvalidAnswerShape(
                    "file_reference is required".to_string(),
                ));
            }
            if content.choice_id.is_some()
                || content.selected_choice_ids.is_some()
                || content.text_body.is_some()
            {
                return Err(EngineError::InvalidAnswerShape(
                    "only file_reference may be set for this question".to_string(),
                ));
            }
        }
    }

    Ok(())
}

/// Scores one answer against one question definition. Pure: the result is
/// a function of its arguments alone, so a regrade of the same inputs is
/// reproducible for audits and appeals.
///
/// A missing answer scores 0 on auto-gradable kinds and stays pending on
/// manual kinds. Manual kinds are a no-op rather than an error so callers
/// can iterate uniformly over every question of an assessment.
pub(crate) fn score_answer(
    question: &QuestionDef<'_>,
    answer: Option<&AnswerContent<'_>>,
) -> Result<ScoreOutcome, EngineError> {
    if !question.kind.is_auto_gradable() {
        return Ok(ScoreOutcome::Manual);
    }

    let Some(content) = answer else {
        return Ok(ScoreOutcome::Scored { score: 0.0, is_correct: false });
    };

    validate_answer_shape(question, content)?;

    let is_correct = match question.kind {
        QuestionKind::SingleSelect | QuestionKind::Boolean => {
            let selected = content.choice_id.unwrap_or_default();
            question.choices.iter().any(|choice| choice.id == selected && choice.is_correct)
        }
        QuestionKind::MultiSelect => {
            // Exact set equality; no partial credit.
            let selected: BTreeSet<&str> = content
                .selected_choice_ids
                .unwrap_or_default()
                .iter()
                .map(String::as_str)
                .collect();
            !selected.is_empty() && selected == question.correct_ids()
        }
        QuestionKind::Text | QuestionKind::FileUpload => unreachable!("manual kinds return early"),
    };

    let score = if is_correct { question.points } else { 0.0 };
    Ok(ScoreOutcome::Scored { score, is_correct })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multi_question<'a>(points: f64) -> QuestionDef<'a> {
        QuestionDef {
            kind: QuestionKind::MultiSelect,
            points,
            choices: vec![
                ChoiceKey { id: "a", is_correct: true },
                ChoiceKey { id: "b", is_correct: false },
                ChoiceKey { id: "c", is_correct: true },
                ChoiceKey { id: "d", is_correct: false },
            ],
        }
    }

    fn single_question<'a>() -> QuestionDef<'a> {
        QuestionDef {
            kind: QuestionKind::SingleSelect,
            points: 5.0,
            choices: vec![
                ChoiceKey { id: "x", is_correct: false },
                ChoiceKey { id: "y", is_correct: true },
            ],
        }
    }

    fn selected<'a>(ids: &'a [String]) -> AnswerContent<'a> {
        AnswerContent { selected_choice_ids: Some(ids), ..Default::default() }
    }

    #[test]
    fn single_select_scores_full_points_on_correct_choice() {
        let question = single_question();
        let answer = AnswerContent { choice_id: Some("y"), ..Default::default() };

        let outcome = score_answer(&question, Some(&answer)).unwrap();
        assert_eq!(outcome, ScoreOutcome::Scored { score: 5.0, is_correct: true });
    }

    #[test]
    fn single_select_scores_zero_on_wrong_choice() {
        let question = single_question();
        let answer = AnswerContent { choice_id: Some("x"), ..Default::default() };

        let outcome = score_answer(&question, Some(&answer)).unwrap();
        assert_eq!(outcome, ScoreOutcome::Scored { score: 0.0, is_correct: false });
    }

    #[test]
    fn multi_select_gives_no_partial_credit() {
        let question = multi_question(10.0);

        let just_a = vec!["a".to_string()];
        let exact = vec!["a".to_string(), "c".to_string()];
        let superset = vec!["a".to_string(), "c".to_string(), "d".to_string()];

        assert_eq!(
            score_answer(&question, Some(&selected(&just_a))).unwrap(),
            ScoreOutcome::Scored { score: 0.0, is_correct: false }
        );
        assert_eq!(
            score_answer(&question, Some(&selected(&exact))).unwrap(),
            ScoreOutcome::Scored { score: 10.0, is_correct: true }
        );
        assert_eq!(
            score_answer(&question, Some(&selected(&superset))).unwrap(),
            ScoreOutcome::Scored { score: 0.0, is_correct: false }
        );
    }

    #[test]
    fn multi_select_order_does_not_matter() {
        let question = multi_question(10.0);
        let reversed = vec!["c".to_string(), "a".to_string()];

        assert_eq!(
            score_answer(&question, Some(&selected(&reversed))).unwrap(),
            ScoreOutcome::Scored { score: 10.0, is_correct: true }
        );
    }

    #[test]
    fn scoring_is_deterministic() {
        let question = multi_question(10.0);
        let ids = vec!["a".to_string(), "c".to_string()];
        let answer = selected(&ids);

        let first = score_answer(&question, Some(&answer)).unwrap();
        let second = score_answer(&question, Some(&answer)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_answer_scores_zero_on_auto_kinds() {
        let question = single_question();
        assert_eq!(
            score_answer(&question, None).unwrap(),
            ScoreOutcome::Scored { score: 0.0, is_correct: false }
        );
    }

    #[test]
    fn missing_answer_stays_pending_on_manual_kinds() {
        let question = QuestionDef { kind: QuestionKind::Text, points: 4.0, choices: vec![] };
        assert_eq!(score_answer(&question, None).unwrap(), ScoreOutcome::Manual);
    }

    #[test]
    fn manual_kinds_are_never_auto_scored() {
        let question = QuestionDef { kind: QuestionKind::FileUpload, points: 4.0, choices: vec![] };
        let answer = AnswerContent { file_reference: Some("uploads/essay.pdf"), ..Default::default() };

        assert_eq!(score_answer(&question, Some(&answer)).unwrap(), ScoreOutcome::Manual);
    }

    #[test]
    fn foreign_choice_id_is_rejected_before_scoring() {
        let question = single_question();
        let answer = AnswerContent { choice_id: Some("stranger"), ..Default::default() };

        assert!(matches!(
            score_answer(&question, Some(&answer)),
            Err(EngineError::InvalidAnswerShape(_))
        ));
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let question = single_question();
        let ids = vec!["y".to_string()];
        // Multi-select payload against a single-select question.
        let answer = selected(&ids);

        assert!(matches!(
            validate_answer_shape(&question, &answer),
            Err(EngineError::InvalidAnswerShape(_))
        ));
    }

    #[test]
    fn boolean_behaves_like_single_select() {
        let question = QuestionDef {
            kind: QuestionKind::Boolean,
            points: 1.0,
            choices: vec![
                ChoiceKey { id: "true", is_correct: true },
                ChoiceKey { id: "false", is_correct: false },
            ],
        };
        let answer = AnswerContent { choice_id: Some("true"), ..Default::default() };

        assert_eq!(
            score_answer(&question, Some(&answer)).unwrap(),
            ScoreOutcome::Scored { score: 1.0, is_correct: true }
        );
    }
}
