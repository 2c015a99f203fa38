use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parses ISO-8601 timestamps with either `+03:00` or `+0300` style offsets.
pub fn parse_iso_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn accepts_both_offset_styles() {
        let expected = Utc.with_ymd_and_hms(2025, 7, 19, 9, 0, 0).unwrap();
        assert_eq!(parse_iso_timestamp("2025-07-19T12:00:00+0300"), Some(expected));
        assert_eq!(parse_iso_timestamp("2025-07-19T12:00:00+03:00"), Some(expected));
        assert_eq!(parse_iso_timestamp("2025-07-19T09:00:00Z"), Some(expected));
        assert_eq!(parse_iso_timestamp("19.07.2025"), None);
    }
}
