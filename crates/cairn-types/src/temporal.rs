use std::sync::RwLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::error::{TypeError, TypeResult};

/// Wall-clock instant used for every lifecycle timestamp.
pub type Timestamp = DateTime<Utc>;

/// Source of the current time.
///
/// Lifecycle hooks never call `Utc::now()` directly; they resolve "now"
/// through a `Clock` so tests can freeze or step time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

/// Clock backed by the system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    at: RwLock<Timestamp>,
}

impl FixedClock {
    /// Freeze the clock at `at`.
    pub fn new(at: Timestamp) -> Self {
        Self {
            at: RwLock::new(at),
        }
    }

    /// Move the clock to an absolute instant.
    pub fn set(&self, at: Timestamp) {
        let mut guard = self.at.write().unwrap_or_else(|e| e.into_inner());
        *guard = at;
    }

    /// Step the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut guard = self.at.write().unwrap_or_else(|e| e.into_inner());
        *guard = *guard + by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.at.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// Resolve a textual date/time into an instant.
///
/// Accepts the token `"now"` (resolved through `clock`), RFC 3339 text,
/// `YYYY-MM-DD HH:MM:SS` (taken as UTC), and bare `YYYY-MM-DD` dates
/// (midnight UTC).
pub fn parse_timestamp(input: &str, clock: &dyn Clock) -> TypeResult<Timestamp> {
    if input.trim().eq_ignore_ascii_case("now") {
        return Ok(clock.now());
    }
    parse_stored_timestamp(input)
}

/// Like [`parse_timestamp`] without the `"now"` token.
///
/// Used for values read back from storage, where no clock applies.
pub fn parse_stored_timestamp(input: &str) -> TypeResult<Timestamp> {
    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(TypeError::InvalidTimestamp {
        input: input.to_string(),
        reason: "expected \"now\", RFC 3339, or YYYY-MM-DD[ HH:MM:SS]".into(),
    })
}

/// Canonical text form of a timestamp (RFC 3339, UTC, microseconds).
///
/// The fixed precision keeps stored values lexically sortable.
pub fn format_timestamp(at: &Timestamp) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn now_token_uses_clock() {
        let clock = fixed();
        let at = parse_timestamp("now", &clock).unwrap();
        assert_eq!(at, clock.now());
        assert_eq!(parse_timestamp(" NOW ", &clock).unwrap(), clock.now());
    }

    #[test]
    fn parses_supported_formats() {
        let clock = fixed();
        let expected = Utc.with_ymd_and_hms(2023, 6, 15, 8, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2023-06-15T08:30:00Z", &clock).unwrap(), expected);
        assert_eq!(parse_timestamp("2023-06-15 08:30:00", &clock).unwrap(), expected);
        assert_eq!(
            parse_timestamp("2023-06-15", &clock).unwrap(),
            Utc.with_ymd_and_hms(2023, 6, 15, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn stored_text_has_no_now_token() {
        let expected = Utc.with_ymd_and_hms(2023, 6, 15, 8, 30, 0).unwrap();
        assert_eq!(parse_stored_timestamp("2023-06-15 08:30:00").unwrap(), expected);
        assert!(matches!(
            parse_stored_timestamp("now"),
            Err(TypeError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn rejects_garbage() {
        let clock = fixed();
        assert!(matches!(
            parse_timestamp("next tuesday", &clock),
            Err(TypeError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn fixed_clock_moves_only_on_request() {
        let clock = fixed();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);
        clock.advance(Duration::seconds(5));
        assert_eq!(clock.now(), t0 + Duration::seconds(5));
        clock.set(t0);
        assert_eq!(clock.now(), t0);
    }

    #[test]
    fn formatted_timestamps_sort_lexically() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = a + Duration::milliseconds(500);
        assert!(format_timestamp(&a) < format_timestamp(&b));
        assert!(format_timestamp(&a).ends_with('Z'));
    }

    #[test]
    fn system_clock_is_recent() {
        let now = SystemClock.now();
        assert!(now.timestamp() > 1_577_836_800);
    }
}
