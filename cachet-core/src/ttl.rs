//! Time-to-live values and their normalization to whole seconds.
//!
//! Every layer that accepts a TTL funnels it through [`normalize`] so the
//! driver boundary only ever sees `Option<u64>` seconds, where `None` means
//! the entry never expires.

use chrono::{DateTime, Months, TimeDelta, Utc};

/// A relative time-to-live, as accepted by the public cache API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Plain seconds. Passed through unchanged.
    Seconds(u64),
    /// A signed duration, measured against the current instant.
    Duration(TimeDelta),
    /// Calendar months, so "one month" from January 31st lands on the last
    /// day of February.
    Months(u32),
}

impl Ttl {
    /// Builds a calendar-month TTL.
    pub fn months(months: u32) -> Self {
        Ttl::Months(months)
    }

    /// Converts the TTL into seconds relative to `now`, floored at zero.
    pub fn seconds_from(&self, now: DateTime<Utc>) -> u64 {
        match *self {
            Ttl::Seconds(seconds) => seconds,
            Ttl::Duration(delta) => match now.checked_add_signed(delta) {
                Some(later) => non_negative(later - now),
                None => non_negative(delta),
            },
            Ttl::Months(months) => match now.checked_add_months(Months::new(months)) {
                Some(later) => non_negative(later - now),
                None => u64::MAX,
            },
        }
    }
}

fn non_negative(delta: TimeDelta) -> u64 {
    u64::try_from(delta.num_seconds()).unwrap_or(0)
}

impl From<u64> for Ttl {
    fn from(seconds: u64) -> Self {
        Ttl::Seconds(seconds)
    }
}

impl From<u32> for Ttl {
    fn from(seconds: u32) -> Self {
        Ttl::Seconds(u64::from(seconds))
    }
}

/// Negative seconds clamp to zero: the entry is born expired.
impl From<i64> for Ttl {
    fn from(seconds: i64) -> Self {
        Ttl::Seconds(u64::try_from(seconds).unwrap_or(0))
    }
}

impl From<i32> for Ttl {
    fn from(seconds: i32) -> Self {
        Ttl::from(i64::from(seconds))
    }
}

impl From<std::time::Duration> for Ttl {
    fn from(duration: std::time::Duration) -> Self {
        Ttl::Seconds(duration.as_secs())
    }
}

impl From<TimeDelta> for Ttl {
    fn from(delta: TimeDelta) -> Self {
        Ttl::Duration(delta)
    }
}

/// Normalizes an optional TTL into seconds from now.
#[inline]
pub fn normalize(ttl: Option<Ttl>) -> Option<u64> {
    normalize_at(ttl, Utc::now())
}

/// Same as [`normalize`], against an explicit instant.
pub fn normalize_at(ttl: Option<Ttl>, now: DateTime<Utc>) -> Option<u64> {
    ttl.map(|ttl| ttl.seconds_from(now))
}

/// Absolute expiry for a TTL in seconds.
///
/// A TTL too large to represent as a timestamp is treated as no expiry.
pub fn expires_at(ttl_secs: Option<u64>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let seconds = i64::try_from(ttl_secs?).ok()?;
    now.checked_add_signed(TimeDelta::try_seconds(seconds)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn none_means_no_expiration() {
        assert_eq!(normalize(None), None);
    }

    #[test]
    fn seconds_pass_through_unchanged() {
        assert_eq!(normalize(Some(Ttl::Seconds(0))), Some(0));
        assert_eq!(normalize(Some(Ttl::Seconds(3600))), Some(3600));
    }

    #[test]
    fn negative_inputs_floor_at_zero() {
        assert_eq!(normalize(Some(Ttl::from(-5i64))), Some(0));
        assert_eq!(
            normalize(Some(Ttl::Duration(TimeDelta::seconds(-30)))),
            Some(0)
        );
    }

    #[test]
    fn sub_second_durations_truncate() {
        let ttl = Ttl::from(std::time::Duration::from_millis(1_900));
        assert_eq!(normalize(Some(ttl)), Some(1));
        let ttl = Ttl::Duration(TimeDelta::milliseconds(100));
        assert_eq!(normalize(Some(ttl)), Some(0));
    }

    #[test]
    fn duration_matches_equivalent_seconds() {
        let now = at(2024, 6, 1);
        let as_delta = normalize_at(Some(Ttl::Duration(TimeDelta::minutes(5))), now);
        let as_secs = normalize_at(Some(Ttl::Seconds(300)), now);
        assert_eq!(as_delta, as_secs);
    }

    #[test]
    fn months_follow_the_calendar() {
        let ttl = Some(Ttl::months(1));
        assert_eq!(normalize_at(ttl, at(2024, 2, 1)), Some(29 * 86_400));
        assert_eq!(normalize_at(ttl, at(2023, 2, 1)), Some(28 * 86_400));
    }

    #[test]
    fn expires_at_handles_overflow_as_never() {
        let now = at(2024, 1, 1);
        assert_eq!(expires_at(None, now), None);
        assert_eq!(expires_at(Some(60), now), Some(now + TimeDelta::seconds(60)));
        assert_eq!(expires_at(Some(u64::MAX), now), None);
    }
}
