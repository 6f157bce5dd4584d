use schedule_planner::{
    AntiTask, Date, RecurringTask, Schedulable, Schedule, ScheduleError, Task, TaskFrequency,
    TaskKind, Timeframe, TransientTask,
};

fn d(month: u32, day: u32, year: i32) -> Date {
    Date::new(month, day, year).unwrap()
}

fn tf(start: u32, duration: u32) -> Timeframe {
    Timeframe::new(start, duration).unwrap()
}

fn work() -> RecurringTask {
    RecurringTask::new(
        "Work",
        "Work",
        tf(540, 480),
        d(1, 1, 2020),
        d(1, 10, 2020),
        TaskFrequency::Daily,
    )
    .unwrap()
}

fn dentist(date: Date) -> TransientTask {
    TransientTask::new("Dentist", "Appointment", tf(600, 60), date).unwrap()
}

fn names(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|task| task.name()).collect()
}

#[test]
fn empty_schedule_has_nothing_on_any_day() {
    let schedule = Schedule::new();
    assert!(schedule.is_empty());
    assert!(schedule.daily_tasks(&d(1, 1, 2020)).is_none());
    assert!(schedule.tasks_by_category("Work").is_none());
    assert!(schedule.active_categories().is_empty());
}

#[test]
fn conflicting_task_is_rejected_without_touching_the_schedule() {
    let mut schedule = Schedule::new();
    schedule.add_task(work()).unwrap();

    let err = schedule.add_task(dentist(d(1, 5, 2020))).unwrap_err();
    assert_eq!(
        err.to_string(),
        "The task \"Dentist\" conflicts with an existing task: \"Work\""
    );
    assert_eq!(schedule.len(), 1);
    assert_eq!(names(&schedule.daily_tasks(&d(1, 5, 2020)).unwrap()), vec!["Work"]);
    assert!(schedule.tasks_by_category("Appointment").is_none());
    assert!(schedule.transient_task("Dentist").is_none());
}

#[test]
fn partially_conflicting_recurring_task_is_rejected_as_a_whole() {
    let mut schedule = Schedule::new();
    schedule.add_task(dentist(d(1, 20, 2020))).unwrap();
    let clash = RecurringTask::new(
        "Class",
        "Class",
        tf(630, 60),
        d(1, 6, 2020),
        d(2, 28, 2020),
        TaskFrequency::Weekly,
    )
    .unwrap();

    assert!(matches!(
        schedule.add_task(clash),
        Err(ScheduleError::TaskConflict { .. })
    ));
    assert!(schedule.daily_tasks(&d(1, 6, 2020)).is_none());
    assert_eq!(schedule.active_categories().len(), 1);
}

#[test]
fn adjacent_and_overnight_tasks_are_indexed_on_every_date_they_touch() {
    let mut schedule = Schedule::new();
    schedule.add_task(work()).unwrap();
    let lunch_after = TransientTask::new("Errand", "Shopping", tf(1020, 60), d(1, 3, 2020)).unwrap();
    schedule.add_task(lunch_after).unwrap();
    let late = TransientTask::new("Flight", "Visit", tf(1380, 120), d(1, 10, 2020)).unwrap();
    schedule.add_task(late).unwrap();

    assert_eq!(
        names(&schedule.daily_tasks(&d(1, 3, 2020)).unwrap()),
        vec!["Work", "Errand"]
    );
    assert_eq!(
        names(&schedule.daily_tasks(&d(1, 11, 2020)).unwrap()),
        vec!["Flight"]
    );
}

#[test]
fn daily_tasks_are_ordered_by_start_time() {
    let mut schedule = Schedule::new();
    let date = d(3, 2, 2020);
    for (name, start) in [("Late", 900), ("Early", 480), ("Middle", 600)] {
        schedule
            .add_task(TransientTask::new(name, "Visit", tf(start, 60), date).unwrap())
            .unwrap();
    }
    assert_eq!(
        names(&schedule.daily_tasks(&date).unwrap()),
        vec!["Early", "Middle", "Late"]
    );
}

#[test]
fn anti_task_frees_exactly_the_cancelled_occurrence() {
    let mut schedule = Schedule::new();
    let work_id = schedule.add_task(work()).unwrap();
    let anti_id = schedule
        .add_task(AntiTask::new("Day off", tf(540, 480), d(1, 5, 2020)))
        .unwrap();

    assert_eq!(schedule.cancelled_task(anti_id), Some(work_id));
    let work = schedule.recurring_task("Work").unwrap();
    assert_eq!(work.scheduled_times().len(), 9);
    assert!(!work.is_active_on(&d(1, 5, 2020)));
    assert!(work.is_active_on(&d(1, 4, 2020)));
    assert!(work.is_active_on(&d(1, 6, 2020)));

    let on_day_off = schedule.daily_tasks(&d(1, 5, 2020)).unwrap();
    assert_eq!(on_day_off.len(), 1);
    assert_eq!(on_day_off[0].kind(), TaskKind::Cancellation);
    assert_eq!(
        names(&schedule.tasks_by_category("Cancellation").unwrap()),
        vec!["Day off"]
    );

    // the freed slot can now be booked
    schedule.add_task(dentist(d(1, 5, 2020))).unwrap();
    assert!(schedule.add_task(dentist(d(1, 6, 2020))).is_err());
}

#[test]
fn anti_task_cancelling_an_overnight_occurrence_frees_both_dates() {
    let mut schedule = Schedule::new();
    let sleep = RecurringTask::new(
        "Sleep",
        "Sleep",
        tf(1380, 480),
        d(1, 1, 2020),
        d(1, 7, 2020),
        TaskFrequency::Weekly,
    )
    .unwrap();
    schedule.add_task(sleep).unwrap();
    schedule
        .add_task(AntiTask::new("Night out", tf(1380, 480), d(1, 1, 2020)))
        .unwrap();

    assert!(schedule.recurring_task("Sleep").unwrap().scheduled_times().is_empty());
    for date in [d(1, 1, 2020), d(1, 2, 2020)] {
        let tasks = schedule.daily_tasks(&date).unwrap();
        assert_eq!(names(&tasks), vec!["Night out"]);
    }
}

#[test]
fn anti_task_needs_a_matching_recurring_occurrence() {
    let mut schedule = Schedule::new();
    let err = schedule
        .add_task(AntiTask::new("Nothing", tf(540, 480), d(1, 5, 2020)))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "There are no tasks on 1/5/2020 for the anti-task \"Nothing\" to affect!"
    );

    schedule.add_task(work()).unwrap();
    let err = schedule
        .add_task(AntiTask::new("Wrong slot", tf(540, 60), d(1, 5, 2020)))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidTask(_)));

    schedule
        .add_task(AntiTask::new("Day off", tf(540, 480), d(1, 5, 2020)))
        .unwrap();
    assert!(
        schedule
            .add_task(AntiTask::new("Again", tf(540, 480), d(1, 5, 2020)))
            .is_err()
    );
    assert_eq!(schedule.anti_tasks().len(), 1);
}

#[test]
fn removing_an_anti_task_restores_the_occurrence() {
    let mut schedule = Schedule::new();
    schedule.add_task(work()).unwrap();
    let anti_id = schedule
        .add_task(AntiTask::new("Day off", tf(540, 480), d(1, 5, 2020)))
        .unwrap();

    let removed = schedule.remove_task(anti_id).unwrap();
    assert_eq!(removed.name(), "Day off");
    assert_eq!(schedule.recurring_task("Work").unwrap(), work());
    assert_eq!(names(&schedule.daily_tasks(&d(1, 5, 2020)).unwrap()), vec!["Work"]);
    assert!(schedule.tasks_by_category("Cancellation").is_none());
    assert_eq!(schedule.cancelled_task(anti_id), None);
}

#[test]
fn blocked_anti_task_removal_rolls_back_and_can_be_retried() {
    let mut schedule = Schedule::new();
    let work_id = schedule.add_task(work()).unwrap();
    let anti_id = schedule
        .add_task(AntiTask::new("Day off", tf(540, 480), d(1, 5, 2020)))
        .unwrap();
    schedule.add_task(dentist(d(1, 5, 2020))).unwrap();

    let before_tasks = schedule.daily_tasks(&d(1, 5, 2020));
    let before_work = schedule.recurring_task("Work");

    for _ in 0..2 {
        let err = schedule.remove_task(anti_id).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::TaskConflict {
                task: "Work".into(),
                conflicting: "Dentist".into()
            }
        );
        assert_eq!(schedule.daily_tasks(&d(1, 5, 2020)), before_tasks);
        assert_eq!(schedule.recurring_task("Work"), before_work);
        assert_eq!(schedule.cancelled_task(anti_id), Some(work_id));
        assert_eq!(schedule.len(), 3);
    }

    let dentist_id = schedule.task_id("Dentist").unwrap();
    schedule.remove_task(dentist_id).unwrap();
    schedule.remove_task(anti_id).unwrap();
    assert_eq!(schedule.recurring_task("Work").unwrap(), work());
}

#[test]
fn rollback_covers_the_runoff_date_of_an_overnight_occurrence() {
    let mut schedule = Schedule::new();
    let sleep = RecurringTask::new(
        "Sleep",
        "Sleep",
        tf(1380, 480),
        d(1, 1, 2020),
        d(1, 5, 2020),
        TaskFrequency::Daily,
    )
    .unwrap();
    let sleep_id = schedule.add_task(sleep.clone()).unwrap();
    let anti_id = schedule
        .add_task(AntiTask::new("All-nighter", tf(1380, 480), d(1, 1, 2020)))
        .unwrap();
    // only the early-morning half of the cancelled night is reused
    schedule
        .add_task(TransientTask::new("Late", "Visit", tf(60, 60), d(1, 2, 2020)).unwrap())
        .unwrap();

    let snapshot = |schedule: &Schedule| {
        (
            schedule.daily_tasks(&d(1, 1, 2020)),
            schedule.daily_tasks(&d(1, 2, 2020)),
            schedule.recurring_task("Sleep"),
        )
    };
    let before = snapshot(&schedule);

    for _ in 0..2 {
        assert_eq!(
            schedule.remove_task(anti_id),
            Err(ScheduleError::TaskConflict {
                task: "Sleep".into(),
                conflicting: "Late".into()
            })
        );
        assert_eq!(snapshot(&schedule), before);
        assert_eq!(schedule.cancelled_task(anti_id), Some(sleep_id));
    }

    let late_id = schedule.task_id("Late").unwrap();
    schedule.remove_task(late_id).unwrap();
    schedule.remove_task(anti_id).unwrap();
    assert_eq!(schedule.recurring_task("Sleep").unwrap(), sleep);
    assert_eq!(names(&schedule.daily_tasks(&d(1, 1, 2020)).unwrap()), vec!["Sleep"]);
}

#[test]
fn task_ids_lists_every_task_sharing_a_name() {
    let mut schedule = Schedule::new();
    let work_id = schedule.add_task(work()).unwrap();
    let anti_id = schedule
        .add_task(AntiTask::new("Work", tf(540, 480), d(1, 5, 2020)))
        .unwrap();

    assert_eq!(schedule.task_ids("Work"), vec![work_id, anti_id]);
    assert!(schedule.task_ids("Nobody").is_empty());
}

#[test]
fn removing_a_recurring_task_drops_its_anti_tasks() {
    let mut schedule = Schedule::new();
    let work_id = schedule.add_task(work()).unwrap();
    schedule
        .add_task(AntiTask::new("Day off", tf(540, 480), d(1, 5, 2020)))
        .unwrap();

    schedule.remove_task(work_id).unwrap();
    assert!(schedule.is_empty());
    assert!(schedule.active_categories().is_empty());
    assert!(schedule.daily_tasks(&d(1, 5, 2020)).is_none());
    assert!(schedule.remove_task(work_id).is_err());
}

#[test]
fn returned_tasks_are_copies() {
    let mut schedule = Schedule::new();
    schedule.add_task(work()).unwrap();

    let mut tasks = schedule.daily_tasks(&d(1, 2, 2020)).unwrap();
    tasks.clear();
    let mut copy = schedule.clone();
    let id = copy.task_id("Work").unwrap();
    copy.remove_task(id).unwrap();

    assert_eq!(schedule.daily_tasks(&d(1, 2, 2020)).unwrap().len(), 1);
    assert_eq!(schedule.len(), 1);
    assert!(copy.is_empty());
}

#[test]
fn tasks_between_lists_occupied_dates_in_order() {
    let mut schedule = Schedule::new();
    schedule.add_task(work()).unwrap();
    schedule
        .add_task(TransientTask::new("Party", "Visit", tf(1200, 120), d(1, 12, 2020)).unwrap())
        .unwrap();

    let range = schedule.tasks_between(&d(1, 9, 2020), &d(1, 31, 2020));
    let dates: Vec<Date> = range.keys().copied().collect();
    assert_eq!(dates, vec![d(1, 9, 2020), d(1, 10, 2020), d(1, 12, 2020)]);
    assert_eq!(names(&range[&d(1, 12, 2020)]), vec!["Party"]);
    assert!(schedule.tasks_between(&d(2, 1, 2020), &d(1, 1, 2020)).is_empty());
}

#[test]
fn lookups_by_name_and_kind() {
    let mut schedule = Schedule::new();
    let id = schedule.add_task(work()).unwrap();
    schedule.add_task(dentist(d(2, 1, 2020))).unwrap();

    assert_eq!(schedule.task_id("Work"), Some(id));
    assert_eq!(schedule.get(id).map(|task| task.kind()), Some(TaskKind::Recurring));
    assert!(schedule.transient_task("Work").is_none());
    assert_eq!(schedule.transient_tasks().len(), 1);
    assert_eq!(schedule.recurring_tasks().len(), 1);
    assert_eq!(
        schedule.active_categories().into_iter().collect::<Vec<_>>(),
        vec!["Appointment".to_string(), "Work".to_string()]
    );
}
