use chrono::{Duration, Utc};

use ticket_cell::services::estimator::{estimated_call_time, wait_duration};

#[test]
fn test_first_position_still_waits_one_unit() {
    let now = Utc::now();
    let unit = Duration::minutes(15);

    let estimate = estimated_call_time(1, unit, now);
    assert_eq!(estimate, now + unit, "position 1 is never told 'no wait'");
    assert!(estimate >= now + unit);
}

#[test]
fn test_estimate_is_strictly_increasing_in_position() {
    let now = Utc::now();
    let unit = Duration::minutes(15);

    let mut previous = estimated_call_time(1, unit, now);
    for n in 2..=20 {
        let estimate = estimated_call_time(n, unit, now);
        assert!(
            estimate > previous,
            "estimate for position {} must exceed position {}",
            n,
            n - 1
        );
        previous = estimate;
    }
}

#[test]
fn test_estimate_is_deterministic() {
    let now = Utc::now();
    let unit = Duration::minutes(20);

    assert_eq!(
        estimated_call_time(7, unit, now),
        estimated_call_time(7, unit, now)
    );
}

#[test]
fn test_wait_duration_scales_with_position() {
    let unit = Duration::minutes(10);
    assert_eq!(wait_duration(3, unit), Duration::minutes(30));
    assert_eq!(wait_duration(1, unit), unit);
}

#[test]
fn test_wait_duration_floors_at_one_unit() {
    let unit = Duration::minutes(10);
    assert_eq!(wait_duration(0, unit), unit);
}
