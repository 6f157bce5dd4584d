use crate::date::Date;
use crate::error::{ScheduleError, ScheduleResult};
use crate::timeframe::Timeframe;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Dated occurrences of a task, already split at midnight.
pub type Occurrences = BTreeMap<Date, BTreeSet<Timeframe>>;

const TRANSIENT_CATEGORIES: &[&str] = &["Visit", "Shopping", "Appointment"];
const RECURRING_CATEGORIES: &[&str] = &["Class", "Study", "Sleep", "Exercise", "Work", "Meal"];
const CANCELLATION_CATEGORIES: &[&str] = &["Cancellation"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Transient,
    Recurring,
    Cancellation,
}

impl TaskKind {
    /// Categories a task of this kind may be filed under.
    pub fn valid_categories(self) -> &'static [&'static str] {
        match self {
            TaskKind::Transient => TRANSIENT_CATEGORIES,
            TaskKind::Recurring => RECURRING_CATEGORIES,
            TaskKind::Cancellation => CANCELLATION_CATEGORIES,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Transient => "Transient",
            TaskKind::Recurring => "Recurring",
            TaskKind::Cancellation => "Cancellation",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "transient" => Some(TaskKind::Transient),
            "recurring" => Some(TaskKind::Recurring),
            "cancellation" | "anti" => Some(TaskKind::Cancellation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl TaskFrequency {
    /// Numeric code used by the JSON interchange format.
    pub fn value(self) -> u32 {
        match self {
            TaskFrequency::Daily => 1,
            TaskFrequency::Weekly => 7,
            TaskFrequency::Monthly => 30,
        }
    }

    /// Decodes [`TaskFrequency::value`]; anything unrecognised is treated as monthly.
    pub fn from_value(value: u32) -> Self {
        match value {
            1 => TaskFrequency::Daily,
            7 => TaskFrequency::Weekly,
            _ => TaskFrequency::Monthly,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskFrequency::Daily => "daily",
            TaskFrequency::Weekly => "weekly",
            TaskFrequency::Monthly => "monthly",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(TaskFrequency::Daily),
            "weekly" => Some(TaskFrequency::Weekly),
            "monthly" => Some(TaskFrequency::Monthly),
            _ => None,
        }
    }

    /// The date of the occurrence following one on `date`.
    pub fn advance(self, date: &Date) -> Date {
        match self {
            TaskFrequency::Daily => date.next_day(),
            TaskFrequency::Weekly => date.next_week(),
            TaskFrequency::Monthly => date.next_month(),
        }
    }
}

/// Behaviour shared by every task variant: a named, categorised slot that
/// expands into dated occurrences.
pub trait Schedulable {
    fn name(&self) -> &str;
    fn category(&self) -> &str;
    fn kind(&self) -> TaskKind;
    /// The nominal timeframe, before splitting at midnight.
    fn timeframe(&self) -> Timeframe;
    fn active_times(&self) -> &Occurrences;

    fn valid_categories(&self) -> &'static [&'static str] {
        self.kind().valid_categories()
    }

    /// A copy of every date this task occupies with the timeframes on that date.
    fn scheduled_times(&self) -> Occurrences {
        self.active_times().clone()
    }

    /// Timeframes occupied on `date`; empty when the task is not active then.
    fn daily_timeframes(&self, date: &Date) -> BTreeSet<Timeframe> {
        self.active_times().get(date).cloned().unwrap_or_default()
    }

    fn is_active_on(&self, date: &Date) -> bool {
        self.active_times()
            .get(date)
            .is_some_and(|timeframes| !timeframes.is_empty())
    }

    /// Whether any occurrence of this task overlaps one of `other` on a shared date.
    fn conflicts_with(&self, other: &dyn Schedulable) -> bool {
        let theirs = other.active_times();
        self.active_times().iter().any(|(date, timeframes)| {
            theirs.get(date).is_some_and(|other_timeframes| {
                timeframes
                    .iter()
                    .any(|tf| other_timeframes.iter().any(|other_tf| tf.conflicts_with(other_tf)))
            })
        })
    }
}

fn checked_category(kind: TaskKind, category: &str) -> ScheduleResult<String> {
    if kind.valid_categories().contains(&category) {
        Ok(category.to_string())
    } else {
        Err(ScheduleError::invalid_task(format!(
            "{category} is not a valid category for a {} task!",
            kind.as_str().to_ascii_lowercase()
        )))
    }
}

fn add_daily_timeframe(times: &mut Occurrences, date: Date, timeframe: Timeframe) {
    times.entry(date).or_default().insert(timeframe);
}

fn remove_daily_timeframe(times: &mut Occurrences, date: Date, timeframe: Timeframe) {
    if let Some(timeframes) = times.get_mut(&date) {
        timeframes.remove(&timeframe);
        if timeframes.is_empty() {
            times.remove(&date);
        }
    }
}

/// Registers one occurrence starting on `date`, spilling onto the next day when
/// the timeframe runs past midnight.
fn add_occurrence(times: &mut Occurrences, date: Date, timeframe: Timeframe) {
    if timeframe.next_day_runoff() > 0 {
        add_daily_timeframe(times, date, timeframe.truncate(false));
        add_daily_timeframe(times, date.next_day(), timeframe.truncate(true));
    } else {
        add_daily_timeframe(times, date, timeframe);
    }
}

fn remove_occurrence(times: &mut Occurrences, date: Date, timeframe: Timeframe) {
    if timeframe.next_day_runoff() > 0 {
        remove_daily_timeframe(times, date, timeframe.truncate(false));
        remove_daily_timeframe(times, date.next_day(), timeframe.truncate(true));
    } else {
        remove_daily_timeframe(times, date, timeframe);
    }
}

fn single_occurrence(date: Date, timeframe: Timeframe) -> Occurrences {
    let mut times = Occurrences::new();
    add_occurrence(&mut times, date, timeframe);
    times
}

/// A one-off activity on a single date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientTask {
    name: String,
    category: String,
    timeframe: Timeframe,
    active_date: Date,
    active_times: Occurrences,
}

impl TransientTask {
    pub fn new(
        name: impl Into<String>,
        category: &str,
        timeframe: Timeframe,
        date: Date,
    ) -> ScheduleResult<Self> {
        let category = checked_category(TaskKind::Transient, category)?;
        Ok(Self {
            name: name.into(),
            category,
            timeframe,
            active_date: date,
            active_times: single_occurrence(date, timeframe),
        })
    }

    pub fn active_date(&self) -> Date {
        self.active_date
    }
}

impl Schedulable for TransientTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Transient
    }

    fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    fn active_times(&self) -> &Occurrences {
        &self.active_times
    }
}

/// Cancels exactly one occurrence of a recurring task.
///
/// Its own occurrences describe the slot it cancels; it never blocks other tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntiTask {
    name: String,
    timeframe: Timeframe,
    active_date: Date,
    active_times: Occurrences,
}

impl AntiTask {
    pub fn new(name: impl Into<String>, timeframe: Timeframe, date: Date) -> Self {
        Self {
            name: name.into(),
            timeframe,
            active_date: date,
            active_times: single_occurrence(date, timeframe),
        }
    }

    pub fn active_date(&self) -> Date {
        self.active_date
    }
}

impl Schedulable for AntiTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        CANCELLATION_CATEGORIES[0]
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Cancellation
    }

    fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    fn active_times(&self) -> &Occurrences {
        &self.active_times
    }
}

/// An activity repeating at a fixed frequency between two dates (inclusive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringTask {
    name: String,
    category: String,
    timeframe: Timeframe,
    starting_date: Date,
    ending_date: Date,
    frequency: TaskFrequency,
    /// Attached cancellations keyed by the date of the occurrence they cancel.
    anti_tasks: BTreeMap<Date, AntiTask>,
    active_times: Occurrences,
}

impl RecurringTask {
    pub fn new(
        name: impl Into<String>,
        category: &str,
        timeframe: Timeframe,
        starting_date: Date,
        ending_date: Date,
        frequency: TaskFrequency,
    ) -> ScheduleResult<Self> {
        let name = name.into();
        let category = checked_category(TaskKind::Recurring, category)?;
        if ending_date < starting_date {
            return Err(ScheduleError::invalid_task(format!(
                "The recurring task {name} ends on {ending_date} before it starts on {starting_date}!"
            )));
        }
        let mut task = Self {
            name,
            category,
            timeframe,
            starting_date,
            ending_date,
            frequency,
            anti_tasks: BTreeMap::new(),
            active_times: Occurrences::new(),
        };
        task.generate_scheduled_times();
        Ok(task)
    }

    pub fn starting_date(&self) -> Date {
        self.starting_date
    }

    pub fn ending_date(&self) -> Date {
        self.ending_date
    }

    pub fn frequency(&self) -> TaskFrequency {
        self.frequency
    }

    /// Every date an occurrence starts on, cancelled or not.
    pub fn occurrence_dates(&self) -> Vec<Date> {
        let mut dates = Vec::new();
        let mut current = self.starting_date;
        while current <= self.ending_date {
            dates.push(current);
            current = self.frequency.advance(&current);
        }
        dates
    }

    /// Whether a non-cancelled occurrence starts on `date`.
    pub fn occurs_on(&self, date: &Date) -> bool {
        !self.anti_tasks.contains_key(date) && self.occurrence_dates().contains(date)
    }

    pub fn has_anti_task_on(&self, date: &Date) -> bool {
        self.anti_tasks.contains_key(date)
    }

    pub fn anti_task_dates(&self) -> BTreeSet<Date> {
        self.anti_tasks.keys().copied().collect()
    }

    pub fn anti_tasks(&self) -> Vec<AntiTask> {
        self.anti_tasks.values().cloned().collect()
    }

    fn generate_scheduled_times(&mut self) {
        let mut times = Occurrences::new();
        for date in self.occurrence_dates() {
            if !self.anti_tasks.contains_key(&date) {
                add_occurrence(&mut times, date, self.timeframe);
            }
        }
        self.active_times = times;
    }

    /// The current occurrences on the dates an occurrence starting on `date`
    /// touches, with an empty set for dates the task no longer occupies.
    fn times_affected_by(&self, date: Date) -> Occurrences {
        let mut dates = vec![date];
        if self.timeframe.next_day_runoff() > 0 {
            dates.push(date.next_day());
        }
        dates
            .into_iter()
            .map(|d| (d, self.daily_timeframes(&d)))
            .collect()
    }

    /// Cancels the occurrence matched by `anti_task`.
    ///
    /// Returns the occurrences left on the affected date(s) so the caller can patch
    /// its own indices. The schedule is responsible for keeping its registry of
    /// which recurring task an anti-task cancels.
    pub fn add_anti_task(&mut self, anti_task: &AntiTask) -> ScheduleResult<Occurrences> {
        let date = anti_task.active_date();
        if let Some(existing) = self.anti_tasks.get(&date) {
            if existing.timeframe().conflicts_with(&anti_task.timeframe()) {
                return Err(ScheduleError::invalid_task(format!(
                    "An anti-task {} already cancels the recurring task {} at this time.",
                    existing.name(),
                    self.name
                )));
            }
        }
        if !self.occurs_on(&date) {
            return Err(ScheduleError::invalid_task(format!(
                "The recurring task {} is not active on the date of the anti-task {}.",
                self.name,
                anti_task.name()
            )));
        }
        if self.timeframe != anti_task.timeframe() {
            return Err(ScheduleError::invalid_task(format!(
                "The recurring task {} has a different timeframe than the anti-task {}.",
                self.name,
                anti_task.name()
            )));
        }
        self.anti_tasks.insert(date, anti_task.clone());
        remove_occurrence(&mut self.active_times, date, self.timeframe);
        Ok(self.times_affected_by(date))
    }

    /// Detaches `anti_task` and restores the occurrence it cancelled.
    ///
    /// Does not check the restored occurrence against other tasks; that is up to
    /// the schedule, which can undo the detachment with [`Self::add_anti_task`].
    pub fn remove_anti_task(&mut self, anti_task: &AntiTask) -> ScheduleResult<Occurrences> {
        let date = anti_task.active_date();
        if self.anti_tasks.get(&date) != Some(anti_task) {
            return Err(ScheduleError::invalid_task(format!(
                "The anti-task {} does not apply to {} and cannot be removed from it!",
                anti_task.name(),
                self.name
            )));
        }
        add_occurrence(&mut self.active_times, date, self.timeframe);
        self.anti_tasks.remove(&date);
        Ok(self.times_affected_by(date))
    }
}

impl Schedulable for RecurringTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Recurring
    }

    fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    fn active_times(&self) -> &Occurrences {
        &self.active_times
    }
}

/// Any task a schedule can hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Transient(TransientTask),
    Recurring(RecurringTask),
    Anti(AntiTask),
}

impl Task {
    fn inner(&self) -> &dyn Schedulable {
        match self {
            Task::Transient(task) => task,
            Task::Recurring(task) => task,
            Task::Anti(task) => task,
        }
    }

    pub fn as_recurring(&self) -> Option<&RecurringTask> {
        match self {
            Task::Recurring(task) => Some(task),
            _ => None,
        }
    }

    pub fn as_transient(&self) -> Option<&TransientTask> {
        match self {
            Task::Transient(task) => Some(task),
            _ => None,
        }
    }

    pub fn as_anti(&self) -> Option<&AntiTask> {
        match self {
            Task::Anti(task) => Some(task),
            _ => None,
        }
    }
}

impl Schedulable for Task {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn category(&self) -> &str {
        self.inner().category()
    }

    fn kind(&self) -> TaskKind {
        self.inner().kind()
    }

    fn timeframe(&self) -> Timeframe {
        self.inner().timeframe()
    }

    fn active_times(&self) -> &Occurrences {
        self.inner().active_times()
    }
}

impl From<TransientTask> for Task {
    fn from(task: TransientTask) -> Self {
        Task::Transient(task)
    }
}

impl From<RecurringTask> for Task {
    fn from(task: RecurringTask) -> Self {
        Task::Recurring(task)
    }
}

impl From<AntiTask> for Task {
    fn from(task: AntiTask) -> Self {
        Task::Anti(task)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
