use crate::{
    AntiTask, Date, RecurringTask, Schedulable, Schedule, ScheduleError, Task, TaskFrequency,
    TaskKind, Timeframe, TransientTask,
};
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeJsonError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub trait ScheduleStore {
    fn save_schedule(&self, schedule: &Schedule) -> PersistenceResult<()>;
    fn load_schedule(&self) -> PersistenceResult<Option<Schedule>>;
}

/// Flat, serializable form of a single task.
///
/// Dates are `YYYYMMDD`; `end_date` and `frequency` are only set for recurring tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: String,
    pub category: String,
    pub kind: TaskKind,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    pub start_minute: u32,
    pub duration_minute: u32,
    #[serde(default)]
    pub frequency: Option<TaskFrequency>,
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        let timeframe = task.timeframe();
        let (start_date, end_date, frequency) = match task {
            Task::Transient(transient) => (transient.active_date(), None, None),
            Task::Anti(anti_task) => (anti_task.active_date(), None, None),
            Task::Recurring(recurring) => (
                recurring.starting_date(),
                Some(recurring.ending_date().concatenated()),
                Some(recurring.frequency()),
            ),
        };
        Self {
            name: task.name().to_string(),
            category: task.category().to_string(),
            kind: task.kind(),
            start_date: start_date.concatenated(),
            end_date,
            start_minute: timeframe.start(),
            duration_minute: timeframe.duration(),
            frequency,
        }
    }
}

impl TaskRecord {
    pub fn into_task(self) -> PersistenceResult<Task> {
        let timeframe = Timeframe::new(self.start_minute, self.duration_minute)?;
        let start_date = parse_compact_date(&self.start_date)?;
        let task = match self.kind {
            TaskKind::Transient => {
                TransientTask::new(self.name, &self.category, timeframe, start_date)?.into()
            }
            TaskKind::Cancellation => {
                if self.category != TaskKind::Cancellation.as_str() {
                    return Err(PersistenceError::InvalidData(format!(
                        "anti-task '{}' has category '{}'",
                        self.name, self.category
                    )));
                }
                AntiTask::new(self.name, timeframe, start_date).into()
            }
            TaskKind::Recurring => {
                let end_date = self.end_date.as_deref().ok_or_else(|| {
                    PersistenceError::InvalidData(format!(
                        "recurring task '{}' has no end date",
                        self.name
                    ))
                })?;
                let frequency = self.frequency.ok_or_else(|| {
                    PersistenceError::InvalidData(format!(
                        "recurring task '{}' has no frequency",
                        self.name
                    ))
                })?;
                RecurringTask::new(
                    self.name,
                    &self.category,
                    timeframe,
                    start_date,
                    parse_compact_date(end_date)?,
                    frequency,
                )?
                .into()
            }
        };
        Ok(task)
    }
}

/// Parses a `YYYYMMDD` date.
pub fn parse_compact_date(input: &str) -> PersistenceResult<Date> {
    let input = input.trim();
    if input.len() != 8 || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PersistenceError::InvalidData(format!(
            "invalid date '{input}' (expected YYYYMMDD)"
        )));
    }
    let number = |range: std::ops::Range<usize>| {
        input[range]
            .parse::<u32>()
            .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
    };
    let year = number(0..4)?;
    let month = number(4..6)?;
    let day = number(6..8)?;
    Ok(Date::new(month, day, year as i32)?)
}

fn admission_rank(kind: TaskKind) -> u8 {
    match kind {
        TaskKind::Recurring => 0,
        TaskKind::Cancellation => 1,
        TaskKind::Transient => 2,
    }
}

/// Records for every task, recurring tasks first, then anti-tasks, then transient tasks.
pub fn records_from_schedule(schedule: &Schedule) -> Vec<TaskRecord> {
    let recurring = schedule.recurring_tasks().into_iter().map(Task::from);
    let anti = schedule.anti_tasks().into_iter().map(Task::from);
    let transient = schedule.transient_tasks().into_iter().map(Task::from);
    recurring
        .chain(anti)
        .chain(transient)
        .map(|task| TaskRecord::from(&task))
        .collect()
}

/// Rebuilds a schedule through the normal admission path.
///
/// Records are admitted recurring first so anti-tasks find their target and
/// transient tasks may use cancelled slots.
pub fn schedule_from_records(mut records: Vec<TaskRecord>) -> PersistenceResult<Schedule> {
    records.sort_by_key(|record| admission_rank(record.kind));
    let mut schedule = Schedule::new();
    for record in records {
        schedule.add_task(record.into_task()?)?;
    }
    Ok(schedule)
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_schedule_from_csv, load_schedule_from_json, save_schedule_to_csv, save_schedule_to_json,
};
