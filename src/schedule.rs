use crate::date::Date;
use crate::error::{ScheduleError, ScheduleResult};
use crate::task::{AntiTask, RecurringTask, Schedulable, Task, TaskKind, TransientTask};
use crate::timeframe::Timeframe;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info, warn};

/// Handle for a task owned by a [`Schedule`]. Only meaningful for the schedule that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owns every scheduled task and keeps the per-date and per-category indices in
/// step with the tasks' current occurrences.
///
/// Cloning a schedule deep-copies all of its state.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    tasks: BTreeMap<TaskId, Task>,
    next_id: u64,
    calendar: BTreeMap<Date, BTreeSet<TaskId>>,
    categories: BTreeMap<String, BTreeSet<TaskId>>,
    // anti-task -> the recurring task whose occurrence it cancels
    cancellations: BTreeMap<TaskId, TaskId>,
}

fn link<K: Ord>(index: &mut BTreeMap<K, BTreeSet<TaskId>>, key: K, id: TaskId) {
    index.entry(key).or_default().insert(id);
}

fn unlink<K: Ord>(index: &mut BTreeMap<K, BTreeSet<TaskId>>, key: &K, id: TaskId) {
    if let Some(ids) = index.get_mut(key) {
        ids.remove(&id);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn allocate_id(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Admits any kind of task, dispatching to the matching typed operation.
    pub fn add_task(&mut self, task: impl Into<Task>) -> ScheduleResult<TaskId> {
        match task.into() {
            Task::Transient(task) => self.add_transient_task(task),
            Task::Recurring(task) => self.add_recurring_task(task),
            Task::Anti(task) => self.add_anti_task(task),
        }
    }

    pub fn add_transient_task(&mut self, task: TransientTask) -> ScheduleResult<TaskId> {
        self.admit(Task::Transient(task))
    }

    pub fn add_recurring_task(&mut self, task: RecurringTask) -> ScheduleResult<TaskId> {
        self.admit(Task::Recurring(task))
    }

    /// Checks every occurrence of `task` against the calendar and only then links it in.
    fn admit(&mut self, task: Task) -> ScheduleResult<TaskId> {
        let times = task.scheduled_times();
        for (date, timeframes) in &times {
            if let Some(conflicting) = self.find_conflicting_task(date, timeframes, None) {
                let conflicting = self.task_name(conflicting);
                warn!(task = task.name(), %date, %conflicting, "rejected conflicting task");
                return Err(ScheduleError::conflict(task.name(), conflicting));
            }
        }
        let id = self.allocate_id();
        for date in times.keys() {
            link(&mut self.calendar, *date, id);
        }
        link(&mut self.categories, task.category().to_string(), id);
        debug!(%id, task = task.name(), dates = times.len(), "task admitted");
        self.tasks.insert(id, task);
        Ok(id)
    }

    /// The first task on `date` with a timeframe overlapping one of `timeframes`.
    ///
    /// Anti-tasks never block a slot; `ignore` excludes one task from the scan.
    fn find_conflicting_task(
        &self,
        date: &Date,
        timeframes: &BTreeSet<Timeframe>,
        ignore: Option<TaskId>,
    ) -> Option<TaskId> {
        let ids = self.calendar.get(date)?;
        ids.iter()
            .copied()
            .filter(|id| Some(*id) != ignore)
            .find(|id| {
                self.tasks.get(id).is_some_and(|existing| {
                    existing.kind() != TaskKind::Cancellation
                        && existing.daily_timeframes(date).iter().any(|existing_tf| {
                            timeframes.iter().any(|tf| tf.conflicts_with(existing_tf))
                        })
                })
            })
    }

    fn task_name(&self, id: TaskId) -> String {
        self.tasks
            .get(&id)
            .map(|task| task.name().to_string())
            .unwrap_or_else(|| id.to_string())
    }

    /// Attaches an anti-task to the recurring task it cancels.
    ///
    /// The cancelled occurrence disappears from the calendar and the anti-task is
    /// filed on its own date(s) under `Cancellation`.
    pub fn add_anti_task(&mut self, anti_task: AntiTask) -> ScheduleResult<TaskId> {
        let date = anti_task.active_date();
        let Some(daily) = self.calendar.get(&date) else {
            return Err(ScheduleError::invalid_task(format!(
                "There are no tasks on {date} for the anti-task \"{}\" to affect!",
                anti_task.name()
            )));
        };
        let candidates: Vec<TaskId> = daily
            .iter()
            .copied()
            .filter(|id| {
                self.tasks.get(id).and_then(Task::as_recurring).is_some_and(|recurring| {
                    recurring.timeframe() == anti_task.timeframe()
                })
            })
            .collect();
        let target = candidates
            .iter()
            .copied()
            .find(|id| {
                self.tasks
                    .get(id)
                    .and_then(Task::as_recurring)
                    .is_some_and(|recurring| recurring.occurs_on(&date))
            })
            .or_else(|| candidates.first().copied())
            .ok_or_else(|| {
                ScheduleError::invalid_task(format!(
                    "There are no applicable tasks on {date} for the anti-task \"{}\" to affect!",
                    anti_task.name()
                ))
            })?;

        let affected = self.recurring_mut(target)?.add_anti_task(&anti_task)?;
        for (affected_date, timeframes) in &affected {
            if timeframes.is_empty() {
                unlink(&mut self.calendar, affected_date, target);
            }
        }

        let id = self.allocate_id();
        for anti_date in anti_task.active_times().keys() {
            link(&mut self.calendar, *anti_date, id);
        }
        link(&mut self.categories, anti_task.category().to_string(), id);
        self.cancellations.insert(id, target);
        debug!(
            %id,
            anti_task = anti_task.name(),
            cancelled = %self.task_name(target),
            %date,
            "anti-task attached"
        );
        self.tasks.insert(id, Task::Anti(anti_task));
        Ok(id)
    }

    fn recurring_mut(&mut self, id: TaskId) -> ScheduleResult<&mut RecurringTask> {
        match self.tasks.get_mut(&id) {
            Some(Task::Recurring(task)) => Ok(task),
            _ => Err(ScheduleError::invalid_task(format!(
                "Task {id} is not a recurring task in this schedule!"
            ))),
        }
    }

    /// Removes a task and returns it.
    ///
    /// Removing an anti-task restores the occurrence it cancelled; if that
    /// occurrence now overlaps another task the removal is undone and
    /// [`ScheduleError::TaskConflict`] is returned. Removing a recurring task also
    /// removes the anti-tasks attached to it.
    pub fn remove_task(&mut self, id: TaskId) -> ScheduleResult<Task> {
        match self.tasks.get(&id).map(|task| task.kind()) {
            Some(TaskKind::Cancellation) => self.remove_anti_task(id),
            Some(TaskKind::Recurring) => {
                let attached: Vec<TaskId> = self
                    .cancellations
                    .iter()
                    .filter(|(_, recurring)| **recurring == id)
                    .map(|(anti, _)| *anti)
                    .collect();
                for anti in attached {
                    self.cancellations.remove(&anti);
                    if let Some(task) = self.unlink_task(anti) {
                        debug!(anti_task = task.name(), "dropped anti-task of removed recurring task");
                    }
                }
                self.unlink_task(id).ok_or_else(|| Self::unknown_task(id))
            }
            Some(TaskKind::Transient) => self.unlink_task(id).ok_or_else(|| Self::unknown_task(id)),
            None => Err(Self::unknown_task(id)),
        }
    }

    fn unknown_task(id: TaskId) -> ScheduleError {
        ScheduleError::invalid_task(format!("There is no task {id} in this schedule!"))
    }

    /// Drops a task from the owned set and both indices.
    fn unlink_task(&mut self, id: TaskId) -> Option<Task> {
        let task = self.tasks.remove(&id)?;
        for date in task.active_times().keys() {
            unlink(&mut self.calendar, date, id);
        }
        unlink(&mut self.categories, &task.category().to_string(), id);
        Some(task)
    }

    fn remove_anti_task(&mut self, id: TaskId) -> ScheduleResult<Task> {
        let anti_task = self
            .tasks
            .get(&id)
            .and_then(Task::as_anti)
            .cloned()
            .ok_or_else(|| Self::unknown_task(id))?;
        let recurring_id = self.cancellations.get(&id).copied().ok_or_else(|| {
            ScheduleError::invalid_task(format!(
                "The anti-task {} is not attached to any recurring task!",
                anti_task.name()
            ))
        })?;

        let restored = self.recurring_mut(recurring_id)?.remove_anti_task(&anti_task)?;
        // Only the restored dates can gain a conflict.
        let conflict = restored.iter().find_map(|(date, timeframes)| {
            self.find_conflicting_task(date, timeframes, Some(recurring_id))
        });
        if let Some(conflicting) = conflict {
            self.recurring_mut(recurring_id)?.add_anti_task(&anti_task)?;
            let recurring = self.task_name(recurring_id);
            let conflicting = self.task_name(conflicting);
            warn!(
                anti_task = anti_task.name(),
                %recurring,
                %conflicting,
                "anti-task removal rolled back"
            );
            return Err(ScheduleError::conflict(recurring, conflicting));
        }

        for (date, timeframes) in &restored {
            if !timeframes.is_empty() {
                link(&mut self.calendar, *date, recurring_id);
            }
        }
        self.cancellations.remove(&id);
        debug!(
            anti_task = anti_task.name(),
            restored = %self.task_name(recurring_id),
            "anti-task detached"
        );
        self.unlink_task(id).ok_or_else(|| Self::unknown_task(id))
    }

    /// A copy of the tasks occupying `date`, ordered by their first slot that day.
    /// `None` when nothing is scheduled.
    pub fn daily_tasks(&self, date: &Date) -> Option<Vec<Task>> {
        let ids = self.calendar.get(date)?;
        let mut tasks: Vec<Task> = ids.iter().filter_map(|id| self.tasks.get(id)).cloned().collect();
        tasks.sort_by(|a, b| {
            let first = |task: &Task| task.daily_timeframes(date).into_iter().next();
            first(a)
                .cmp(&first(b))
                .then_with(|| a.name().cmp(b.name()))
        });
        Some(tasks)
    }

    /// Occupied dates between `start` and `end` (inclusive) with their tasks.
    pub fn tasks_between(&self, start: &Date, end: &Date) -> BTreeMap<Date, Vec<Task>> {
        if end < start {
            return BTreeMap::new();
        }
        self.calendar
            .range(*start..=*end)
            .filter_map(|(date, _)| self.daily_tasks(date).map(|tasks| (*date, tasks)))
            .collect()
    }

    /// A copy of the tasks filed under `category`, or `None` if there are none.
    pub fn tasks_by_category(&self, category: &str) -> Option<Vec<Task>> {
        let ids = self.categories.get(category)?;
        Some(ids.iter().filter_map(|id| self.tasks.get(id)).cloned().collect())
    }

    pub fn active_categories(&self) -> BTreeSet<String> {
        self.categories.keys().cloned().collect()
    }

    /// Looks a task up by id.
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Id of the first task named `name`. Linear in the number of tasks.
    pub fn task_id(&self, name: &str) -> Option<TaskId> {
        self.tasks
            .iter()
            .find(|(_, task)| task.name() == name)
            .map(|(id, _)| *id)
    }

    /// Ids of every task named `name`, in admission order.
    pub fn task_ids(&self, name: &str) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|(_, task)| task.name() == name)
            .map(|(id, _)| *id)
            .collect()
    }

    /// First task named `name`, of any kind. Linear in the number of tasks.
    pub fn task(&self, name: &str) -> Option<Task> {
        self.tasks.values().find(|task| task.name() == name).cloned()
    }

    pub fn recurring_task(&self, name: &str) -> Option<RecurringTask> {
        self.tasks
            .values()
            .filter_map(Task::as_recurring)
            .find(|task| task.name() == name)
            .cloned()
    }

    pub fn transient_task(&self, name: &str) -> Option<TransientTask> {
        self.tasks
            .values()
            .filter_map(Task::as_transient)
            .find(|task| task.name() == name)
            .cloned()
    }

    pub fn anti_task(&self, name: &str) -> Option<AntiTask> {
        self.tasks
            .values()
            .filter_map(Task::as_anti)
            .find(|task| task.name() == name)
            .cloned()
    }

    pub fn recurring_tasks(&self) -> Vec<RecurringTask> {
        self.tasks.values().filter_map(Task::as_recurring).cloned().collect()
    }

    pub fn transient_tasks(&self) -> Vec<TransientTask> {
        self.tasks.values().filter_map(Task::as_transient).cloned().collect()
    }

    pub fn anti_tasks(&self) -> Vec<AntiTask> {
        self.tasks.values().filter_map(Task::as_anti).cloned().collect()
    }

    /// The recurring task an anti-task cancels, if it is attached.
    pub fn cancelled_task(&self, anti_task: TaskId) -> Option<TaskId> {
        self.cancellations.get(&anti_task).copied()
    }

    /// Builds a new schedule holding the tasks of both schedules.
    ///
    /// Recurring and transient tasks of `other` go through the normal admission
    /// checks, so any conflict aborts the merge. Anti-tasks of `other` are copied
    /// in without re-validation, still attached to their (re-admitted) recurring task.
    pub fn merge(&self, other: &Schedule) -> ScheduleResult<Schedule> {
        let mut merged = self.clone();
        let mut remapped = BTreeMap::new();
        for (id, task) in &other.tasks {
            if let Task::Recurring(recurring) = task {
                remapped.insert(*id, merged.add_recurring_task(recurring.clone())?);
            }
        }
        for (id, task) in &other.tasks {
            if let Task::Anti(anti_task) = task {
                let new_id = merged.allocate_id();
                for date in anti_task.active_times().keys() {
                    link(&mut merged.calendar, *date, new_id);
                }
                link(&mut merged.categories, anti_task.category().to_string(), new_id);
                if let Some(recurring) = other.cancellations.get(id).and_then(|r| remapped.get(r)) {
                    merged.cancellations.insert(new_id, *recurring);
                }
                merged.tasks.insert(new_id, task.clone());
            }
        }
        for task in other.tasks.values() {
            if let Task::Transient(transient) = task {
                merged.add_transient_task(transient.clone())?;
            }
        }
        info!(
            tasks = merged.len(),
            received = other.len(),
            "schedules merged"
        );
        Ok(merged)
    }
}
