use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};

use crate::error::FormError;

/// Parse a wall-clock time like `09:30` or `9:5`.
pub fn parse_clock(s: &str) -> Result<NaiveTime, FormError> {
    let invalid = || FormError::InvalidTime(s.to_string());
    let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
    let hour: u32 = h.trim().parse().map_err(|_| invalid())?;
    let minute: u32 = m.trim().parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

pub fn parse_date(s: &str) -> Result<NaiveDate, FormError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| FormError::InvalidDate(s.to_string()))
}

/// Local instant for `date` at `time`. On a DST fold the earlier one wins.
pub fn at(date: NaiveDate, time: NaiveTime) -> Result<DateTime<Local>, FormError> {
    let naive = date.and_time(time);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| FormError::NonexistentLocalTime(naive.format("%Y-%m-%d %H:%M").to_string()))
}

/// Start and optional end of an interaction entered as a date plus clock
/// strings. There is no end when the event is all-day or no end time was
/// entered; an all-day event without a start time begins at midnight.
pub fn schedule(
    date: NaiveDate,
    start_time: &str,
    end_time: &str,
    all_day: bool,
) -> Result<(DateTime<Local>, Option<DateTime<Local>>), FormError> {
    let start_clock = if all_day && start_time.trim().is_empty() {
        NaiveTime::MIN
    } else {
        parse_clock(start_time)?
    };
    let start = at(date, start_clock)?;

    if all_day || end_time.trim().is_empty() {
        return Ok((start, None));
    }
    let end = at(date, parse_clock(end_time)?)?;
    if end < start {
        return Err(FormError::EndBeforeStart);
    }
    Ok((start, Some(end)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan10() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    #[test]
    fn padding_is_optional() {
        assert_eq!(parse_clock("9:5").unwrap(), NaiveTime::from_hms_opt(9, 5, 0).unwrap());
        assert_eq!(parse_clock(" 09:00 ").unwrap(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn malformed_clock_is_reported() {
        for bad in ["", "9", "ab:cd", "24:00", "10:60", "9:-1"] {
            assert_eq!(parse_clock(bad), Err(FormError::InvalidTime(bad.to_string())), "{bad}");
        }
    }

    #[test]
    fn timed_schedule_uses_both_clocks() {
        let (start, end) = schedule(jan10(), "09:00", "10:00", false).unwrap();
        assert_eq!(start.naive_local(), jan10().and_hms_opt(9, 0, 0).unwrap());
        assert_eq!(end.unwrap().naive_local(), jan10().and_hms_opt(10, 0, 0).unwrap());
    }

    #[test]
    fn all_day_drops_the_end() {
        let (start, end) = schedule(jan10(), "", "10:00", true).unwrap();
        assert_eq!(start.naive_local(), jan10().and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(end, None);
    }

    #[test]
    fn blank_end_drops_the_end() {
        let (_, end) = schedule(jan10(), "14:00", "  ", false).unwrap();
        assert_eq!(end, None);
    }

    #[test]
    fn end_before_start_is_rejected() {
        assert_eq!(
            schedule(jan10(), "11:00", "10:00", false),
            Err(FormError::EndBeforeStart)
        );
    }
}
