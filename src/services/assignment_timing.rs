use anyhow::{anyhow, Result};
use time::{Duration, PrimitiveDateTime};

use crate::db::types::DeliveryMode;

/// Supervised assessments must carry a positive duration; homework must
/// not carry one at all. Validated at assessment creation.
pub(crate) fn normalize_duration_for_mode(
    mode: DeliveryMode,
    duration_minutes: Option<i32>,
) -> Result<Option<i32>> {
    match mode {
        DeliveryMode::Supervised => {
            let duration = duration_minutes.ok_or_else(|| {
                anyhow!("duration_minutes is required when delivery_mode is 'supervised'")
            })?;
            if duration <= 0 {
                return Err(anyhow!(
                    "duration_minutes must be positive when delivery_mode is 'supervised'"
                ));
            }
            Ok(Some(duration))
        }
        DeliveryMode::Homework => {
            if duration_minutes.is_some() {
                return Err(anyhow!(
                    "duration_minutes must be null when delivery_mode is 'homework'"
                ));
            }
            Ok(None)
        }
    }
}

/// The instant an in-progress assignment must be closed: for supervised
/// work the per-student clock (`started_at + duration`) capped at the
/// assessment's `due_at`; homework simply ends at `due_at`.
pub(crate) fn hard_deadline(
    mode: DeliveryMode,
    started_at: PrimitiveDateTime,
    due_at: PrimitiveDateTime,
    duration_minutes: Option<i32>,
) -> PrimitiveDateTime {
    match (mode, duration_minutes) {
        (DeliveryMode::Supervised, Some(duration)) => {
            let clock_deadline = started_at + Duration::minutes(duration as i64);
            if clock_deadline < due_at {
                clock_deadline
            } else {
                due_at
            }
        }
        _ => due_at,
    }
}

/// Grace applies to supervised work only; homework deadlines are exact.
pub(crate) fn grace_seconds(mode: DeliveryMode, configured_seconds: u64) -> i64 {
    match mode {
        DeliveryMode::Supervised => configured_seconds as i64,
        DeliveryMode::Homework => 0,
    }
}

pub(crate) fn is_past_deadline(
    mode: DeliveryMode,
    started_at: PrimitiveDateTime,
    due_at: PrimitiveDateTime,
    duration_minutes: Option<i32>,
    configured_grace_seconds: u64,
    now: PrimitiveDateTime,
) -> bool {
    let deadline = hard_deadline(mode, started_at, due_at, duration_minutes)
        + Duration::seconds(grace_seconds(mode, configured_grace_seconds));
    now > deadline
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Time};

    fn at(hour: u8, minute: u8) -> PrimitiveDateTime {
        let date = Date::from_calendar_date(2026, time::Month::May, 5).unwrap();
        PrimitiveDateTime::new(date, Time::from_hms(hour, minute, 0).unwrap())
    }

    #[test]
    fn supervised_requires_positive_duration() {
        assert!(normalize_duration_for_mode(DeliveryMode::Supervised, None).is_err());
        assert!(normalize_duration_for_mode(DeliveryMode::Supervised, Some(0)).is_err());
        assert_eq!(
            normalize_duration_for_mode(DeliveryMode::Supervised, Some(45)).unwrap(),
            Some(45)
        );
    }

    #[test]
    fn homework_rejects_duration() {
        assert!(normalize_duration_for_mode(DeliveryMode::Homework, Some(45)).is_err());
        assert_eq!(normalize_duration_for_mode(DeliveryMode::Homework, None).unwrap(), None);
    }

    #[test]
    fn supervised_deadline_is_clock_capped_at_due() {
        // 45-minute clock ends before the bell.
        assert_eq!(
            hard_deadline(DeliveryMode::Supervised, at(9, 0), at(12, 0), Some(45)),
            at(9, 45)
        );
        // Started late: the bell wins.
        assert_eq!(
            hard_deadline(DeliveryMode::Supervised, at(11, 30), at(12, 0), Some(45)),
            at(12, 0)
        );
    }

    #[test]
    fn homework_deadline_is_due_at() {
        assert_eq!(hard_deadline(DeliveryMode::Homework, at(9, 0), at(23, 0), None), at(23, 0));
    }

    #[test]
    fn grace_applies_to_supervised_only() {
        assert_eq!(grace_seconds(DeliveryMode::Supervised, 300), 300);
        assert_eq!(grace_seconds(DeliveryMode::Homework, 300), 0);
    }

    #[test]
    fn past_deadline_honors_grace() {
        // Deadline 9:45; 300s grace keeps 9:49 open and closes 9:51.
        assert!(!is_past_deadline(
            DeliveryMode::Supervised,
            at(9, 0),
            at(12, 0),
            Some(45),
            300,
            at(9, 49),
        ));
        assert!(is_past_deadline(
            DeliveryMode::Supervised,
            at(9, 0),
            at(12, 0),
            Some(45),
            300,
            at(9, 51),
        ));
    }
}
