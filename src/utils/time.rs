use chrono::{DateTime, Duration, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Timestamp `hours` after `from`, or `None` past chrono's representable range
pub fn hours_after(from: DateTime<Utc>, hours: u32) -> Option<DateTime<Utc>> {
    from.checked_add_signed(Duration::hours(i64::from(hours)))
}
