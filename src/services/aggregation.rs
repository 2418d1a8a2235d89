use crate::db::models::{Answer, Question};

/// Provisional total of one assignment: null per-question scores count as
/// zero, and `pending_manual` says how many manual scores are still owed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ProvisionalTotal {
    pub(crate) score: f64,
    pub(crate) pending_manual: usize,
}

impl ProvisionalTotal {
    pub(crate) fn is_complete(&self) -> bool {
        self.pending_manual == 0
    }
}

/// Sums per-question scores into an assignment total. `None` scores are
/// manual questions awaiting a teacher; they contribute nothing yet and
/// keep the total provisional.
pub(crate) fn assignment_total<I>(scores: I) -> ProvisionalTotal
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut total = 0.0;
    let mut pending_manual = 0;

    for score in scores {
        match score {
            Some(value) => total += value,
            None => pending_manual += 1,
        }
    }

    ProvisionalTotal { score: total, pending_manual }
}

/// Maps every question of an assessment onto its score slot. `None` marks
/// a manual answer still awaiting a teacher; everything else is settled:
/// unanswered questions owe nothing and auto answers carry their stored
/// score (zero until the submission pass writes one).
pub(crate) fn per_question_scores(questions: &[Question], answers: &[Answer]) -> Vec<Option<f64>> {
    questions
        .iter()
        .map(|question| {
            let answer = answers.iter().find(|answer| answer.question_id == question.id);
            match (question.kind.is_auto_gradable(), answer) {
                (true, Some(answer)) => Some(answer.score.unwrap_or(0.0)),
                (false, Some(answer)) => answer.score,
                (_, None) => Some(0.0),
            }
        })
        .collect()
}

/// One graded assessment as the subject aggregator consumes it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GradedResult {
    pub(crate) score: f64,
    pub(crate) total_points: f64,
    pub(crate) coefficient: f64,
}

/// Coefficient-weighted average of graded assessments, normalized onto
/// `scale`. Ungraded work never reaches this function: the caller selects
/// graded assignments only, so an unscored assessment cannot drag the
/// average down. Returns `None` when nothing is graded yet.
///
/// Intermediate math keeps full precision; rounding happens once at the
/// presentation boundary via [`round_display`].
pub(crate) fn subject_average(results: &[GradedResult], scale: f64) -> Option<f64> {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for result in results {
        if result.total_points <= 0.0 {
            // Nothing to normalize against; skip rather than divide by zero.
            tracing::warn!(
                coefficient = result.coefficient,
                "Assessment with zero possible points excluded from subject average"
            );
            continue;
        }

        let normalized = result.score / result.total_points * scale;
        weighted_sum += normalized * result.coefficient;
        weight_total += result.coefficient;
    }

    if weight_total <= 0.0 {
        return None;
    }

    Some(weighted_sum / weight_total)
}

/// Two-decimal rounding for responses. Only ever applied to values about
/// to leave the service.
pub(crate) fn round_display(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::QuestionKind;
    use time::{Date, PrimitiveDateTime, Time};

    fn ts() -> PrimitiveDateTime {
        let date = Date::from_calendar_date(2026, time::Month::June, 2).unwrap();
        PrimitiveDateTime::new(date, Time::from_hms(12, 0, 0).unwrap())
    }

    fn question(id: &str, kind: QuestionKind, points: f64) -> Question {
        Question {
            id: id.to_string(),
            assessment_id: "ax-1".to_string(),
            kind,
            prompt: format!("question {id}"),
            points,
            order_index: 0,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn answer(question_id: &str, score: Option<f64>) -> Answer {
        Answer {
            id: format!("an-{question_id}"),
            assignment_id: "as-1".to_string(),
            question_id: question_id.to_string(),
            choice_id: None,
            selected_choice_ids: None,
            text_body: Some("response".to_string()),
            file_reference: None,
            score,
            feedback: None,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    #[test]
    fn score_slots_distinguish_pending_from_settled() {
        let questions = vec![
            question("q1", QuestionKind::SingleSelect, 5.0),
            question("q2", QuestionKind::Boolean, 1.0),
            question("q3", QuestionKind::Text, 4.0),
            question("q4", QuestionKind::FileUpload, 6.0),
        ];
        // q1 answered and auto-scored, q2 never answered, q3 answered but
        // awaiting a teacher, q4 never answered.
        let answers = vec![answer("q1", Some(5.0)), answer("q3", None)];

        let slots = per_question_scores(&questions, &answers);
        assert_eq!(slots, vec![Some(5.0), Some(0.0), None, Some(0.0)]);

        let total = assignment_total(slots);
        assert_eq!(total, ProvisionalTotal { score: 5.0, pending_manual: 1 });
    }

    #[test]
    fn assignment_total_counts_pending_manual_scores() {
        let total = assignment_total([Some(4.0), None, Some(2.5), None]);
        assert_eq!(total, ProvisionalTotal { score: 6.5, pending_manual: 2 });
        assert!(!total.is_complete());
    }

    #[test]
    fn assignment_total_of_nothing_is_complete_zero() {
        let total = assignment_total([]);
        assert_eq!(total, ProvisionalTotal { score: 0.0, pending_manual: 0 });
        assert!(total.is_complete());
    }

    #[test]
    fn average_ignores_work_the_caller_left_out() {
        // One graded assessment at 15/20 with coefficient 2; the ungraded
        // coefficient-3 assessment never enters the input set.
        let results =
            [GradedResult { score: 15.0, total_points: 20.0, coefficient: 2.0 }];

        let average = subject_average(&results, 20.0).unwrap();
        assert_eq!(average, 15.0);
    }

    #[test]
    fn average_weights_by_coefficient() {
        let results = [
            GradedResult { score: 10.0, total_points: 10.0, coefficient: 1.0 }, // 20/20
            GradedResult { score: 5.0, total_points: 10.0, coefficient: 3.0 },  // 10/20
        ];

        let average = subject_average(&results, 20.0).unwrap();
        assert_eq!(average, (20.0 + 10.0 * 3.0) / 4.0);
    }

    #[test]
    fn average_is_none_when_nothing_is_graded() {
        assert_eq!(subject_average(&[], 20.0), None);
    }

    #[test]
    fn zero_point_assessments_are_excluded_not_fatal() {
        let results = [
            GradedResult { score: 0.0, total_points: 0.0, coefficient: 5.0 },
            GradedResult { score: 9.0, total_points: 10.0, coefficient: 1.0 },
        ];

        let average = subject_average(&results, 20.0).unwrap();
        assert_eq!(average, 18.0);
    }

    #[test]
    fn only_zero_point_assessments_yield_none() {
        let results = [GradedResult { score: 0.0, total_points: 0.0, coefficient: 2.0 }];
        assert_eq!(subject_average(&results, 20.0), None);
    }

    #[test]
    fn intermediate_precision_is_not_rounded() {
        // 1/3 of the scale, three times: rounding each term to two decimals
        // first would give 6.67; full precision keeps the exact value.
        let results = [
            GradedResult { score: 1.0, total_points: 3.0, coefficient: 1.0 },
            GradedResult { score: 1.0, total_points: 3.0, coefficient: 1.0 },
            GradedResult { score: 1.0, total_points: 3.0, coefficient: 1.0 },
        ];

        let average = subject_average(&results, 20.0).unwrap();
        assert!((average - 20.0 / 3.0).abs() < 1e-12);
        assert_eq!(round_display(average), 6.67);
    }

    #[test]
    fn round_display_rounds_at_two_decimals() {
        assert_eq!(round_display(14.996), 15.0);
        assert_eq!(round_display(14.994), 14.99);
        assert_eq!(round_display(15.0), 15.0);
    }
}
