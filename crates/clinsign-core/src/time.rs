use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Current UTC timestamp. All domain timestamps flow through here so tests
/// and callers agree on the clock representation.
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Format a timestamp as RFC 3339 for logs and audit records.
pub fn format_rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_else(|_| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_utc_is_utc() {
        let ts = now_utc();
        assert_eq!(ts.offset(), time::UtcOffset::UTC);
    }

    #[test]
    fn test_format_rfc3339() {
        let ts = time::macros::datetime!(2024-05-15 14:30:00 UTC);
        assert_eq!(format_rfc3339(ts), "2024-05-15T14:30:00Z");
    }
}
