//! Calendar-day date filters.

use crate::api::ListQuery;
use crate::error::{GlimtError, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// `created_after` / `created_before` as UTC instants.
///
/// `created_after` is the start of its day and compares with `>`;
/// `created_before` is the last millisecond of its day and compares with `<`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayRange {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

impl DayRange {
    pub fn parse(created_after: Option<&str>, created_before: Option<&str>) -> Result<Self> {
        Ok(Self {
            after: created_after
                .map(|d| day_bound(d, "created_after", NaiveTime::MIN))
                .transpose()?,
            before: created_before
                .map(|d| day_bound(d, "created_before", end_of_day()))
                .transpose()?,
        })
    }

    /// True when no instant can satisfy both bounds.
    pub fn is_inverted(&self) -> bool {
        matches!((self.after, self.before), (Some(a), Some(b)) if a > b)
    }

    /// List query for one page, carrying these bounds.
    pub fn query(&self, limit: u32, offset: u64) -> ListQuery {
        ListQuery {
            limit,
            offset,
            created_after: self.after,
            created_before: self.before,
        }
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
}

fn day_bound(value: &str, field: &str, time: NaiveTime) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        GlimtError::InvalidInput(format!(
            "{} must be a YYYY-MM-DD date, got '{}'",
            field, value
        ))
    })?;
    Ok(date.and_time(time).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_bounds() {
        let range = DayRange::parse(Some("2024-03-01"), Some("2024-03-02")).unwrap();
        assert_eq!(range.after, Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()));
        let before = range.before.unwrap();
        assert_eq!(before.to_rfc3339(), "2024-03-02T23:59:59.999+00:00");
        assert!(!range.is_inverted());
    }

    #[test]
    fn test_same_day_is_not_inverted() {
        let range = DayRange::parse(Some("2024-03-01"), Some("2024-03-01")).unwrap();
        assert!(!range.is_inverted());
    }

    #[test]
    fn test_inverted_range() {
        let range = DayRange::parse(Some("2024-03-05"), Some("2024-03-01")).unwrap();
        assert!(range.is_inverted());
    }

    #[test]
    fn test_malformed_date() {
        let err = DayRange::parse(Some("03/01/2024"), None).unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().contains("created_after"));
        assert!(DayRange::parse(None, Some("2024-02-30")).is_err());
    }

    #[test]
    fn test_unbounded() {
        let range = DayRange::parse(None, None).unwrap();
        assert_eq!(range, DayRange::default());
        assert_eq!(range.query(25, 50).offset, 50);
    }
}
