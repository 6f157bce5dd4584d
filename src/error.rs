use thiserror::Error;

/// Failures raised by the scheduling core.
///
/// Every variant carries enough detail to be shown to an end user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("Invalid Date: {month}.{day}.{year}")]
    InvalidDate { month: u32, day: u32, year: i32 },

    #[error("{0}")]
    InvalidTimeframe(String),

    #[error("{0}")]
    InvalidTask(String),

    #[error("The task \"{task}\" conflicts with an existing task: \"{conflicting}\"")]
    TaskConflict { task: String, conflicting: String },
}

impl ScheduleError {
    pub(crate) fn invalid_task(message: impl Into<String>) -> Self {
        Self::InvalidTask(message.into())
    }

    pub(crate) fn invalid_timeframe(message: impl Into<String>) -> Self {
        Self::InvalidTimeframe(message.into())
    }

    pub(crate) fn conflict(task: impl Into<String>, conflicting: impl Into<String>) -> Self {
        Self::TaskConflict {
            task: task.into(),
            conflicting: conflicting.into(),
        }
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
