use chrono::{DateTime, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use common::domain::{Clock, DomainError, DomainResult};
use std::borrow::Cow;
use std::sync::Arc;

/// Date-like value found in a measurement payload
#[derive(Debug, Clone, PartialEq)]
pub enum DateLike {
    /// No date field was supplied; resolves to "today"
    Absent,
    /// Unix epoch seconds, fractional part allowed
    EpochSeconds(f64),
    /// ISO-8601 date or date-time, with or without an offset
    Iso(String),
}

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M%:z",
];

const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Resolves payload dates to calendar days in a reference timezone
///
/// "Now" is read from the clock on every call so a long-running bridge
/// never reuses a stale day.
#[derive(Clone)]
pub struct DateResolver {
    timezone: Tz,
    clock: Arc<dyn Clock>,
}

impl DateResolver {
    pub fn new(timezone: Tz, clock: Arc<dyn Clock>) -> Self {
        Self { timezone, clock }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn resolve(&self, date_like: &DateLike) -> DomainResult<NaiveDate> {
        match date_like {
            DateLike::Absent => Ok(self.clock.now().with_timezone(&self.timezone).date_naive()),
            DateLike::EpochSeconds(seconds) => epoch_to_local_date(*seconds, self.timezone),
            DateLike::Iso(text) => iso_to_local_date(text, self.timezone),
        }
    }
}

impl std::fmt::Debug for DateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DateResolver")
            .field("timezone", &self.timezone)
            .finish_non_exhaustive()
    }
}

/// Calendar day in `timezone` of a Unix timestamp in seconds
pub fn epoch_to_local_date(seconds: f64, timezone: Tz) -> DomainResult<NaiveDate> {
    let out_of_range = || DomainError::ParseError(format!("timestamp {} is out of range", seconds));

    if !seconds.is_finite() {
        return Err(out_of_range());
    }

    let whole = seconds.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return Err(out_of_range());
    }
    let nanos = (((seconds - whole) * 1e9).round() as u32).min(999_999_999);

    let instant = DateTime::from_timestamp(whole as i64, nanos).ok_or_else(out_of_range)?;
    Ok(instant.with_timezone(&timezone).date_naive())
}

/// Calendar day in `timezone` of an ISO-8601 string
///
/// Values without an offset are taken to already be in `timezone`.
pub fn iso_to_local_date(text: &str, timezone: Tz) -> DomainResult<NaiveDate> {
    let expanded = expand_hour_only_time(text.trim());
    let normalized = normalize_offset(&expanded);

    for format in OFFSET_FORMATS {
        if let Ok(instant) = DateTime::parse_from_str(&normalized, format) {
            return Ok(instant.with_timezone(&timezone).date_naive());
        }
    }

    // local wall-clock time in the reference zone: its date is already the answer
    for format in LOCAL_FORMATS {
        if let Ok(local) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Ok(local.date());
        }
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .map_err(|_| DomainError::ParseError(format!("unparseable date '{}'", text)))
}

/// Rewrite `YYYY-MM-DDTHH` as `YYYY-MM-DDTHH:00`, keeping any offset that follows
pub fn expand_hour_only_time(text: &str) -> Cow<'_, str> {
    const HOUR_END: usize = "YYYY-MM-DDTHH".len();

    let bytes = text.as_bytes();
    let hour_only = text.is_ascii()
        && bytes.len() >= HOUR_END
        && matches!(bytes[HOUR_END - 3], b'T' | b't' | b' ')
        && bytes[HOUR_END - 2..HOUR_END].iter().all(u8::is_ascii_digit)
        && bytes
            .get(HOUR_END)
            .map_or(true, |b| matches!(b, b'+' | b'-' | b'Z' | b'z'));
    if !hour_only {
        return Cow::Borrowed(text);
    }

    Cow::Owned(format!("{}:00{}", &text[..HOUR_END], &text[HOUR_END..]))
}

/// Rewrite a trailing offset into `±HH:MM` form
///
/// Handles `±HHMM`, hour-only `±HH` and `Z`. Only applies after a time
/// component, so date-only strings are untouched.
pub fn normalize_offset(text: &str) -> Cow<'_, str> {
    const DATE_LEN: usize = "YYYY-MM-DD".len();

    let bytes = text.as_bytes();
    let has_time = text.is_ascii()
        && bytes.len() > DATE_LEN
        && matches!(bytes[DATE_LEN], b'T' | b't' | b' ');
    if !has_time {
        return Cow::Borrowed(text);
    }

    if matches!(bytes[bytes.len() - 1], b'Z' | b'z') {
        return Cow::Owned(format!("{}+00:00", &text[..text.len() - 1]));
    }

    if has_bare_offset(bytes, "+HHMM".len()) {
        let (head, minutes) = text.split_at(text.len() - 2);
        return Cow::Owned(format!("{}:{}", head, minutes));
    }

    if has_bare_offset(bytes, "+HH".len()) {
        return Cow::Owned(format!("{}:00", text));
    }

    Cow::Borrowed(text)
}

/// Sign followed by digits in the last `len` bytes, past the date part
fn has_bare_offset(bytes: &[u8], len: usize) -> bool {
    const DATE_LEN: usize = "YYYY-MM-DD".len();

    let Some(start) = bytes.len().checked_sub(len) else {
        return false;
    };
    if start <= DATE_LEN {
        return false;
    }

    let offset = &bytes[start..];
    matches!(offset[0], b'+' | b'-') && offset[1..].iter().all(u8::is_ascii_digit)
}
