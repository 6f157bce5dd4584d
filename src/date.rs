use crate::error::{ScheduleError, ScheduleResult};
use chrono::{Datelike, NaiveDate, Weekday};
use std::fmt;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Earliest and latest year `Date::new` accepts; four digits keep `YYYYMMDD` records fixed-width.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// A calendar day in the proleptic Gregorian calendar, years 1 to 9999.
///
/// Field order matters: the derived ordering compares year, then month, then day.
/// Day arithmetic may step one day past 12/31/9999, as the runoff date of a late
/// slot on the last representable day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    year: i32,
    month: u32,
    day: u32,
}

impl Date {
    /// Builds a date from `month` (1-12), `day` and `year`.
    pub fn new(month: u32, day: u32, year: i32) -> ScheduleResult<Self> {
        if !Self::is_valid(month, day, year) {
            return Err(ScheduleError::InvalidDate { month, day, year });
        }
        Ok(Self { year, month, day })
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn is_leap_year(year: i32) -> bool {
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }

    /// Number of days in `month` of `year`. Returns 0 for a month outside 1-12.
    pub fn max_day(month: u32, year: i32) -> u32 {
        match month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 if Self::is_leap_year(year) => 29,
            2 => 28,
            _ => 0,
        }
    }

    fn is_valid(month: u32, day: u32, year: i32) -> bool {
        (MIN_YEAR..=MAX_YEAR).contains(&year)
            && (1..=12).contains(&month)
            && day >= 1
            && day <= Self::max_day(month, year)
    }

    /// Day of the week via Zeller's congruence (January and February count as
    /// months 13 and 14 of the previous year).
    pub fn weekday(&self) -> Weekday {
        let (year, month) = if self.month <= 2 {
            (i64::from(self.year) - 1, i64::from(self.month) + 12)
        } else {
            (i64::from(self.year), i64::from(self.month))
        };
        let day = i64::from(self.day);
        let index = (day + 13 * (month + 1) / 5 + year + year.div_euclid(4) - year.div_euclid(100)
            + year.div_euclid(400)
            + 5)
            .rem_euclid(7);
        match index {
            0 => Weekday::Mon,
            1 => Weekday::Tue,
            2 => Weekday::Wed,
            3 => Weekday::Thu,
            4 => Weekday::Fri,
            5 => Weekday::Sat,
            _ => Weekday::Sun,
        }
    }

    pub fn next_day(&self) -> Self {
        if self.day < Self::max_day(self.month, self.year) {
            Self {
                day: self.day + 1,
                ..*self
            }
        } else if self.month < 12 {
            Self {
                year: self.year,
                month: self.month + 1,
                day: 1,
            }
        } else {
            Self {
                year: self.year + 1,
                month: 1,
                day: 1,
            }
        }
    }

    pub fn previous_day(&self) -> Self {
        if self.day > 1 {
            Self {
                day: self.day - 1,
                ..*self
            }
        } else if self.month > 1 {
            Self {
                year: self.year,
                month: self.month - 1,
                day: Self::max_day(self.month - 1, self.year),
            }
        } else {
            Self {
                year: self.year - 1,
                month: 12,
                day: 31,
            }
        }
    }

    pub fn next_week(&self) -> Self {
        (0..7).fold(*self, |date, _| date.next_day())
    }

    /// Same day of the following month, clamped to that month's last day.
    pub fn next_month(&self) -> Self {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        Self {
            year,
            month,
            day: self.day.min(Self::max_day(month, year)),
        }
    }

    pub fn month_name(&self) -> &'static str {
        MONTHS[(self.month - 1) as usize]
    }

    /// The date as `YYYYMMDD`.
    pub fn concatenated(&self) -> String {
        format!("{:04}{:02}{:02}", self.year, self.month, self.day)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.month, self.day, self.year)
    }
}

impl TryFrom<Date> for NaiveDate {
    type Error = ScheduleError;

    fn try_from(date: Date) -> Result<Self, Self::Error> {
        NaiveDate::from_ymd_opt(date.year, date.month, date.day).ok_or(ScheduleError::InvalidDate {
            month: date.month,
            day: date.day,
            year: date.year,
        })
    }
}

impl TryFrom<NaiveDate> for Date {
    type Error = ScheduleError;

    fn try_from(value: NaiveDate) -> Result<Self, Self::Error> {
        Date::new(value.month(), value.day(), value.year())
    }
}
