use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime, UtcOffset,
};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn to_primitive_utc(value: OffsetDateTime) -> PrimitiveDateTime {
    let utc = value.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

/// Accepts RFC3339 as well as the zone-less "YYYY-MM-DDTHH:MM[:SS]" shapes
/// browsers send from datetime-local inputs; zone-less values are read as UTC.
pub(crate) fn parse_datetime_flexible(raw: &str) -> Option<PrimitiveDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(to_primitive_utc(value));
    }

    if let Ok(value) =
        PrimitiveDateTime::parse(raw, &format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    {
        return Some(value);
    }
    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(value);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Time};

    fn at(hour: u8, minute: u8) -> PrimitiveDateTime {
        let date = Date::from_calendar_date(2026, time::Month::March, 9).unwrap();
        PrimitiveDateTime::new(date, Time::from_hms(hour, minute, 0).unwrap())
    }

    #[test]
    fn format_primitive_outputs_utc_z() {
        assert_eq!(format_primitive(at(10, 20)), "2026-03-09T10:20:00Z");
    }

    #[test]
    fn parse_flexible_accepts_rfc3339_with_offset() {
        let parsed = parse_datetime_flexible("2026-03-09T13:20:00+03:00").unwrap();
        assert_eq!(parsed, at(10, 20));
    }

    #[test]
    fn parse_flexible_accepts_zoneless_minutes() {
        let parsed = parse_datetime_flexible("2026-03-09T10:20").unwrap();
        assert_eq!(parsed, at(10, 20));
    }

    #[test]
    fn parse_flexible_rejects_garbage() {
        assert!(parse_datetime_flexible("not-a-date").is_none());
    }
}
