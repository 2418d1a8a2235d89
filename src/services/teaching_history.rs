use time::PrimitiveDateTime;

use crate::db::models::TeachingPeriod;
use crate::services::error::EngineError;

/// Resolves the period covering `as_of` under the half-open convention
/// `[valid_from, valid_to)`. Because the write path keeps the periods
/// contiguous, at most one period can match; a date before the first
/// period yields `None` rather than an error.
pub(crate) fn period_as_of(
    periods: &[TeachingPeriod],
    as_of: PrimitiveDateTime,
) -> Option<&TeachingPeriod> {
    periods.iter().find(|period| {
        period.valid_from <= as_of && period.valid_to.map_or(true, |end| as_of < end)
    })
}

pub(crate) fn teacher_as_of(
    periods: &[TeachingPeriod],
    as_of: PrimitiveDateTime,
) -> Option<&str> {
    period_as_of(periods, as_of).map(|period| period.teacher_id.as_str())
}

/// Guard for a teacher replacement: history only moves forward, so the
/// effective date must fall strictly after the open period began. Closing
/// at `valid_to = effective_date` then keeps the timeline gap-free.
pub(crate) fn validate_replacement(
    open_period: Option<&TeachingPeriod>,
    effective_date: PrimitiveDateTime,
) -> Result<(), EngineError> {
    if let Some(open) = open_period {
        if effective_date <= open.valid_from {
            return Err(EngineError::InvalidEffectiveDate(format!(
                "effective date {} does not come after the open period starting {}",
                crate::core::time::format_primitive(effective_date),
                crate::core::time::format_primitive(open.valid_from),
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Time};

    fn day(day: u8) -> PrimitiveDateTime {
        let date = Date::from_calendar_date(2026, time::Month::September, day).unwrap();
        PrimitiveDateTime::new(date, Time::MIDNIGHT)
    }

    fn period(id: &str, teacher: &str, from: u8, to: Option<u8>) -> TeachingPeriod {
        TeachingPeriod {
            id: id.to_string(),
            class_subject_id: "cs-1".to_string(),
            teacher_id: teacher.to_string(),
            valid_from: day(from),
            valid_to: to.map(day),
            created_at: day(from),
        }
    }

    fn history() -> Vec<TeachingPeriod> {
        vec![
            period("p1", "t-ada", 1, Some(10)),
            period("p2", "t-boole", 10, Some(20)),
            period("p3", "t-curie", 20, None),
        ]
    }

    #[test]
    fn exactly_one_teacher_matches_every_covered_instant() {
        let periods = history();

        for probe in 1..=28 {
            let matches = periods
                .iter()
                .filter(|p| {
                    p.valid_from <= day(probe) && p.valid_to.map_or(true, |end| day(probe) < end)
                })
                .count();
            assert_eq!(matches, 1, "day {probe} matched {matches} periods");
        }

        assert_eq!(teacher_as_of(&periods, day(5)), Some("t-ada"));
        assert_eq!(teacher_as_of(&periods, day(15)), Some("t-boole"));
        assert_eq!(teacher_as_of(&periods, day(25)), Some("t-curie"));
    }

    #[test]
    fn boundary_day_belongs_to_the_incoming_teacher() {
        let periods = history();
        assert_eq!(teacher_as_of(&periods, day(10)), Some("t-boole"));
        assert_eq!(teacher_as_of(&periods, day(20)), Some("t-curie"));
    }

    #[test]
    fn dates_before_the_first_period_have_no_teacher() {
        let periods = vec![period("p1", "t-ada", 10, None)];
        assert_eq!(teacher_as_of(&periods, day(9)), None);
    }

    #[test]
    fn replacement_must_move_forward() {
        let open = period("p1", "t-ada", 10, None);

        assert!(validate_replacement(Some(&open), day(9)).is_err());
        assert!(validate_replacement(Some(&open), day(10)).is_err());
        assert!(validate_replacement(Some(&open), day(11)).is_ok());
    }

    #[test]
    fn first_assignment_accepts_any_date() {
        assert!(validate_replacement(None, day(1)).is_ok());
    }
}
