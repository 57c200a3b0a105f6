//! The source of "now" for date comparisons, billing-date advancement and
//! alert day counts.

use std::fmt::Debug;

use time::{Date, OffsetDateTime, UtcOffset, macros::format_description};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// Tells the current time.
pub trait Clock: Debug + Send + Sync {
    /// The current date and time in the user's local offset.
    fn now(&self) -> OffsetDateTime;

    /// The current calendar date in the user's local offset.
    fn today(&self) -> Date {
        self.now().date()
    }
}

/// A [Clock] that reads the system time and converts it to a canonical timezone.
#[derive(Debug, Clone)]
pub struct SystemClock {
    local_timezone: String,
}

impl SystemClock {
    /// Create a clock for `local_timezone`, a canonical timezone name such as "Pacific/Auckland".
    ///
    /// Returns `None` if the timezone is not known.
    pub fn new(local_timezone: &str) -> Option<Self> {
        get_local_offset(local_timezone)?;

        Some(Self {
            local_timezone: local_timezone.to_owned(),
        })
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();

        match get_local_offset(&self.local_timezone) {
            Some(offset) => now.to_offset(offset),
            None => {
                tracing::warn!(
                    "Could not get the offset for timezone \"{}\", falling back to UTC.",
                    self.local_timezone
                );
                now
            }
        }
    }
}

/// A [Clock] that is stuck at a single point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Parse a calendar date written as `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns [Error::InvalidDate] if `text` is not a valid date.
pub fn parse_date(text: &str) -> Result<Date, Error> {
    Date::parse(text.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| Error::InvalidDate(text.to_owned()))
}

fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}
