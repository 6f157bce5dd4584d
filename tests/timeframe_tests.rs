use schedule_planner::{ScheduleError, Timeframe};

fn tf(start: u32, duration: u32) -> Timeframe {
    Timeframe::new(start, duration).unwrap()
}

#[test]
fn rejects_misaligned_and_out_of_range_values() {
    assert_eq!(
        Timeframe::new(10, 60),
        Err(ScheduleError::InvalidTimeframe(
            "The time 10 is not a multiple of 15!".into()
        ))
    );
    assert_eq!(
        Timeframe::new(1440, 60),
        Err(ScheduleError::InvalidTimeframe(
            "The time 1440 is out of range!".into()
        ))
    );
    assert_eq!(
        Timeframe::new(60, 20),
        Err(ScheduleError::InvalidTimeframe(
            "The duration 20 is not a multiple of 15!".into()
        ))
    );
    assert!(Timeframe::new(60, 0).is_err());
    assert!(Timeframe::new(60, 1440).is_err());
    assert!(Timeframe::new(1425, 1425).is_ok());
    assert!(Timeframe::new(0, 15).is_ok());
}

#[test]
fn overlap_is_symmetric_and_half_open() {
    let cases = [
        (tf(600, 60), tf(630, 60), true),
        (tf(600, 60), tf(660, 60), false),
        (tf(600, 120), tf(630, 15), true),
        (tf(0, 15), tf(15, 15), false),
        (tf(600, 60), tf(600, 60), true),
    ];
    for (a, b, expected) in cases {
        assert_eq!(a.conflicts_with(&b), expected, "{a} vs {b}");
        assert_eq!(b.conflicts_with(&a), expected, "{b} vs {a}");
    }
}

#[test]
fn late_evening_slot_splits_at_midnight() {
    let late = tf(1380, 120);
    assert_eq!(late.end(), 1500);
    assert_eq!(late.next_day_runoff(), 60);
    assert_eq!(late.truncate(false), tf(1380, 60));
    assert_eq!(late.truncate(true), tf(0, 60));
}

#[test]
fn truncating_without_runoff_is_a_no_op() {
    let morning = tf(540, 60);
    assert_eq!(morning.next_day_runoff(), 0);
    assert_eq!(morning.truncate(true), morning);
    assert_eq!(morning.truncate(false), morning);
    assert_eq!(tf(1380, 60).next_day_runoff(), 0);
}

#[test]
fn hours_are_rounded_to_the_nearest_quarter() {
    let timeframe = Timeframe::from_hours(9.1, 1.4).unwrap();
    assert_eq!(timeframe, tf(540, 90));
    assert_eq!(timeframe.start_hours(), 9.0);
    assert_eq!(timeframe.duration_hours(), 1.5);
    assert_eq!(Timeframe::from_hours(23.75, 0.25).unwrap(), tf(1425, 15));
    assert!(Timeframe::from_hours(f64::NAN, 1.0).is_err());
    assert!(Timeframe::from_hours(24.0, 1.0).is_err());
}

#[test]
fn displays_as_clock_times() {
    assert_eq!(tf(540, 90).to_string(), "9:00 to 10:30");
    assert_eq!(tf(1380, 120).to_string(), "23:00 to 1:00");
}
