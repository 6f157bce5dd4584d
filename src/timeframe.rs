use crate::error::{ScheduleError, ScheduleResult};
use std::fmt;

pub const MINUTES_PER_DAY: u32 = 1440;
pub const GRANULARITY: u32 = 15;
pub const LATEST_START: u32 = 1425;
pub const MAX_DURATION: u32 = 1425;

/// A slot of time within a day, in minutes since midnight.
///
/// Both the start and the duration are multiples of 15 minutes. A timeframe may
/// run past midnight; see [`Timeframe::next_day_runoff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timeframe {
    start: u32,
    duration: u32,
}

impl Timeframe {
    /// Builds a timeframe from a start (0..=1425) and a duration (15..=1425) in minutes.
    pub fn new(start: u32, duration: u32) -> ScheduleResult<Self> {
        Self::validated(i64::from(start), i64::from(duration))
    }

    /// Builds a timeframe from fractional hours, each rounded to the nearest quarter hour.
    pub fn from_hours(start: f64, duration: f64) -> ScheduleResult<Self> {
        Self::validated(Self::quarter_hours_in(start)?, Self::quarter_hours_in(duration)?)
    }

    fn quarter_hours_in(hours: f64) -> ScheduleResult<i64> {
        if !hours.is_finite() {
            return Err(ScheduleError::invalid_timeframe(format!(
                "The time {hours} is not a number of hours!"
            )));
        }
        Ok((hours * 60.0 / f64::from(GRANULARITY)).round() as i64 * i64::from(GRANULARITY))
    }

    fn validated(start: i64, duration: i64) -> ScheduleResult<Self> {
        let granularity = i64::from(GRANULARITY);
        if start % granularity != 0 {
            return Err(ScheduleError::invalid_timeframe(format!(
                "The time {start} is not a multiple of 15!"
            )));
        }
        if !(0..=i64::from(LATEST_START)).contains(&start) {
            return Err(ScheduleError::invalid_timeframe(format!(
                "The time {start} is out of range!"
            )));
        }
        if duration % granularity != 0 {
            return Err(ScheduleError::invalid_timeframe(format!(
                "The duration {duration} is not a multiple of 15!"
            )));
        }
        if !(granularity..=i64::from(MAX_DURATION)).contains(&duration) {
            return Err(ScheduleError::invalid_timeframe(format!(
                "The duration {duration} is out of range!"
            )));
        }
        Ok(Self {
            start: start as u32,
            duration: duration as u32,
        })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Exclusive end in minutes; exceeds 1440 when the slot runs into the next day.
    pub fn end(&self) -> u32 {
        self.start + self.duration
    }

    pub fn start_hours(&self) -> f64 {
        f64::from(self.start) / 60.0
    }

    pub fn duration_hours(&self) -> f64 {
        f64::from(self.duration) / 60.0
    }

    /// Minutes of this timeframe that fall on the following day.
    pub fn next_day_runoff(&self) -> u32 {
        self.end().saturating_sub(MINUTES_PER_DAY)
    }

    /// Splits a timeframe at midnight.
    ///
    /// With `next_day_portion` false this is the part up to midnight, otherwise the
    /// part after midnight starting at minute 0. Without runoff the timeframe is
    /// returned unchanged.
    pub fn truncate(&self, next_day_portion: bool) -> Self {
        let runoff = self.next_day_runoff();
        if runoff == 0 {
            *self
        } else if next_day_portion {
            Self {
                start: 0,
                duration: runoff,
            }
        } else {
            Self {
                start: self.start,
                duration: self.duration - runoff,
            }
        }
    }

    /// Whether the half-open intervals `[start, end)` of both timeframes overlap.
    pub fn conflicts_with(&self, other: &Timeframe) -> bool {
        (self.start >= other.start && self.start < other.end())
            || (other.start >= self.start && other.start < self.end())
    }
}

fn clock(minutes: u32) -> String {
    format!("{}:{:02}", (minutes / 60) % 24, minutes % 60)
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", clock(self.start), clock(self.end()))
    }
}
