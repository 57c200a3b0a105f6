//! Calendar arithmetic for advancing billing dates.

use time::{Date, Month};

use crate::Error;

/// Add `months` calendar months to `date`.
///
/// The day of the month is kept where possible. When the target month is shorter the
/// result is clamped to its last day, so Jan 31 plus one month is Feb 28 (or 29).
///
/// # Errors
///
/// Returns [Error::InvalidDate] if the result is outside the supported date range.
pub fn add_months(date: Date, months: u32) -> Result<Date, Error> {
    let month_index = u8::from(date.month()) as i64 - 1 + months as i64;
    let year = date.year() as i64 + month_index.div_euclid(12);
    let target_month = (month_index.rem_euclid(12) + 1) as u8;

    let year = i32::try_from(year).map_err(|_| Error::InvalidDate(date.to_string()))?;
    let month = Month::try_from(target_month).map_err(|_| Error::InvalidDate(date.to_string()))?;
    let day = date.day().min(last_day_of_month(year, month));

    Date::from_calendar_date(year, month, day).map_err(|_| Error::InvalidDate(date.to_string()))
}

/// Add `years` calendar years to `date`, clamping Feb 29 to Feb 28 in common years.
///
/// # Errors
///
/// Returns [Error::InvalidDate] if the result is outside the supported date range.
pub fn add_years(date: Date, years: u32) -> Result<Date, Error> {
    add_months(date, years.saturating_mul(12))
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
