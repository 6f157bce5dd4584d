pub mod date;
pub mod error;
pub mod persistence;
pub mod schedule;
pub mod task;
pub mod timeframe;

pub use date::Date;
pub use error::{ScheduleError, ScheduleResult};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteScheduleStore;
pub use persistence::{
    PersistenceError, ScheduleStore, TaskRecord, load_schedule_from_csv, load_schedule_from_json,
    save_schedule_to_csv, save_schedule_to_json,
};
pub use schedule::{Schedule, TaskId};
pub use task::{
    AntiTask, Occurrences, RecurringTask, Schedulable, Task, TaskFrequency, TaskKind,
    TransientTask,
};
pub use timeframe::Timeframe;
