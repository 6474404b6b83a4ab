//! # Date Windows
//!
//! Half-open `[start, end)` calendar intervals that bucket commits into the
//! period before and the period after an adoption date. Boundaries are taken
//! at start of day in one target timezone, so a commit lands in exactly one
//! window whatever offset its committer used.

use chrono::{DateTime, Days, Duration, FixedOffset, Local, NaiveDate, Offset, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{AnalysisError, Result};

/// Timezone in which window boundaries and day buckets are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowTz {
    #[default]
    Utc,
    /// The host's local zone, resolved per date (DST aware).
    Local,
    Fixed(FixedOffset),
}

impl WindowTz {
    /// The instant at which `date` begins in this zone.
    pub fn start_of_day(&self, date: NaiveDate) -> Result<DateTime<FixedOffset>> {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| AnalysisError::invalid_range(format!("no midnight for {date}")))?;

        let resolved = match self {
            WindowTz::Utc => Some(Utc.from_utc_datetime(&midnight).with_timezone(&Utc.fix())),
            WindowTz::Fixed(offset) => offset.from_local_datetime(&midnight).earliest(),
            WindowTz::Local => Local
                .from_local_datetime(&midnight)
                .earliest()
                // midnight skipped by a DST jump; the day starts an hour later
                .or_else(|| {
                    Local
                        .from_local_datetime(&(midnight + Duration::hours(1)))
                        .earliest()
                })
                .map(|dt| dt.with_timezone(&dt.offset().fix())),
        };

        resolved.ok_or_else(|| {
            AnalysisError::invalid_range(format!("{date} has no start of day in {self}"))
        })
    }

    /// Calendar date of `timestamp` as seen from this zone.
    pub fn local_date(&self, timestamp: &DateTime<FixedOffset>) -> NaiveDate {
        match self {
            WindowTz::Utc => timestamp.with_timezone(&Utc).date_naive(),
            WindowTz::Local => timestamp.with_timezone(&Local).date_naive(),
            WindowTz::Fixed(offset) => timestamp.with_timezone(offset).date_naive(),
        }
    }
}

fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let sign = match raw.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let rest = &raw[1..];
    if !rest.is_ascii() {
        return None;
    }
    let (hours, minutes) = match rest.len() {
        2 => (rest, "00"),
        4 => (&rest[..2], &rest[2..]),
        5 if rest.as_bytes()[2] == b':' => (&rest[..2], &rest[3..]),
        _ => return None,
    };
    if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl FromStr for WindowTz {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
            return Ok(WindowTz::Utc);
        }
        if trimmed.eq_ignore_ascii_case("local") {
            return Ok(WindowTz::Local);
        }
        parse_offset(trimmed).map(WindowTz::Fixed).ok_or_else(|| {
            AnalysisError::invalid_range(format!(
                "unrecognized timezone '{trimmed}' (expected UTC, local or +HH:MM)"
            ))
        })
    }
}

impl fmt::Display for WindowTz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowTz::Utc => write!(f, "UTC"),
            WindowTz::Local => write!(f, "local"),
            WindowTz::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

impl Serialize for WindowTz {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WindowTz {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// An immutable half-open interval of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
    timezone: WindowTz,
}

impl DateWindow {
    /// Create a window, rejecting empty or inverted ranges.
    pub fn new(start: NaiveDate, end: NaiveDate, timezone: WindowTz) -> Result<Self> {
        if start >= end {
            return Err(AnalysisError::invalid_range(format!(
                "window start {start} must precede end {end}"
            )));
        }
        Ok(Self {
            start,
            end,
            timezone,
        })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn timezone(&self) -> WindowTz {
        self.timezone
    }

    /// Number of calendar days covered.
    pub fn length_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn start_instant(&self) -> Result<DateTime<FixedOffset>> {
        self.timezone.start_of_day(self.start)
    }

    pub fn end_instant(&self) -> Result<DateTime<FixedOffset>> {
        self.timezone.start_of_day(self.end)
    }

    /// Whether `timestamp` falls on a day inside `[start, end)` in the
    /// window's timezone.
    pub fn contains(&self, timestamp: &DateTime<FixedOffset>) -> bool {
        let day = self.timezone.local_date(timestamp);
        day >= self.start && day < self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}) {}", self.start, self.end, self.timezone)
    }
}

/// The two adjacent windows around an adoption date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowPair {
    pub before: DateWindow,
    pub after: DateWindow,
}

impl WindowPair {
    /// `before = [adoption - days_before, adoption)` and
    /// `after = [adoption, adoption + days_after)`.
    pub fn around(
        adoption: NaiveDate,
        days_before: i64,
        days_after: i64,
        timezone: WindowTz,
    ) -> Result<Self> {
        if days_before <= 0 {
            return Err(AnalysisError::invalid_range(format!(
                "days before adoption must be positive, got {days_before}"
            )));
        }
        if days_after <= 0 {
            return Err(AnalysisError::invalid_range(format!(
                "days after adoption must be positive, got {days_after}"
            )));
        }

        let start = adoption
            .checked_sub_days(Days::new(days_before as u64))
            .ok_or_else(|| AnalysisError::invalid_range("before window underflows the calendar"))?;
        let end = adoption
            .checked_add_days(Days::new(days_after as u64))
            .ok_or_else(|| AnalysisError::invalid_range("after window overflows the calendar"))?;

        let before = DateWindow::new(start, adoption, timezone)?;
        let after = DateWindow::new(adoption, end, timezone)?;

        // every boundary must exist as an instant for the log query
        before.start_instant()?;
        after.start_instant()?;
        after.end_instant()?;

        Ok(Self { before, after })
    }
}
