//! 12-hour clock conversion for time fields
//!
//! Time fields store a full date-time. Widgets edit hours, minutes, seconds
//! and an AM/PM period; writing those back keeps the stored date part.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Period {
    Am,
    Pm,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Am => "AM",
            Period::Pm => "PM",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Period::Am => Period::Pm,
            Period::Pm => Period::Am,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "AM" => Ok(Period::Am),
            "PM" => Ok(Period::Pm),
            _ => Err(FilterError::InvalidPeriod(s.to_string())),
        }
    }
}

/// A time of day on a 12-hour clock
///
/// `hours` is 1..=12 for display. Midnight reads as 12 AM and noon as 12 PM.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeValue {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub period: Period,
}

impl TimeValue {
    pub fn new(hours: u32, minutes: u32, seconds: u32, period: Period) -> Self {
        Self {
            hours,
            minutes,
            seconds,
            period,
        }
    }

    pub fn from_datetime(value: NaiveDateTime) -> Self {
        let hours = value.hour();
        let period = if hours >= 12 { Period::Pm } else { Period::Am };
        let display = match hours % 12 {
            0 => 12,
            h => h,
        };
        Self::new(display, value.minute(), value.second(), period)
    }

    /// Hour on a 24-hour clock
    ///
    /// An hour of 12 counts as 0 before the period is applied.
    pub fn hours_24(&self) -> u32 {
        let base = self.hours % 12;
        match self.period {
            Period::Am => base,
            Period::Pm => base + 12,
        }
    }

    /// `date` with its time of day replaced by this value
    ///
    /// Fails when any component is out of range.
    pub fn apply_to(&self, date: NaiveDateTime) -> Result<NaiveDateTime> {
        if self.hours == 0 || self.hours > 12 {
            return Err(self.invalid());
        }
        let time = NaiveTime::from_hms_opt(self.hours_24(), self.minutes, self.seconds)
            .ok_or_else(|| self.invalid())?;
        Ok(date.date().and_time(time))
    }

    fn invalid(&self) -> FilterError {
        FilterError::InvalidTime {
            hours: self.hours,
            minutes: self.minutes,
            seconds: self.seconds,
        }
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02} {}",
            self.hours, self.minutes, self.seconds, self.period
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .unwrap()
    }

    #[test]
    fn test_display_hours() {
        assert_eq!(TimeValue::from_datetime(at(0, 5, 0)), TimeValue::new(12, 5, 0, Period::Am));
        assert_eq!(TimeValue::from_datetime(at(12, 0, 0)), TimeValue::new(12, 0, 0, Period::Pm));
        assert_eq!(TimeValue::from_datetime(at(15, 30, 9)), TimeValue::new(3, 30, 9, Period::Pm));
        assert_eq!(TimeValue::from_datetime(at(9, 0, 0)).to_string(), "09:00:00 AM");
    }

    #[test]
    fn test_apply_keeps_date() {
        let base = at(8, 0, 0);
        let pm = TimeValue::new(3, 15, 0, Period::Pm).apply_to(base).unwrap();
        assert_eq!(pm, at(15, 15, 0));
        let midnight = TimeValue::new(12, 0, 0, Period::Am).apply_to(base).unwrap();
        assert_eq!(midnight, at(0, 0, 0));
        let noon = TimeValue::new(12, 0, 0, Period::Pm).apply_to(base).unwrap();
        assert_eq!(noon, at(12, 0, 0));
    }

    #[test]
    fn test_round_trip_through_display_hours() {
        for h in 0..24 {
            let value = at(h, 1, 2);
            assert_eq!(TimeValue::from_datetime(value).apply_to(value).unwrap(), value);
        }
    }

    #[test]
    fn test_out_of_range_rejected() {
        let base = at(8, 0, 0);
        assert!(matches!(
            TimeValue::new(13, 0, 0, Period::Am).apply_to(base),
            Err(FilterError::InvalidTime { hours: 13, .. })
        ));
        assert!(TimeValue::new(0, 0, 0, Period::Am).apply_to(base).is_err());
        assert!(TimeValue::new(1, 60, 0, Period::Am).apply_to(base).is_err());
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("pm".parse::<Period>().unwrap(), Period::Pm);
        assert_eq!(Period::Am.toggle(), Period::Pm);
        assert!("noon".parse::<Period>().is_err());
    }
}
