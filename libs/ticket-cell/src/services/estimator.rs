use chrono::{DateTime, Duration, Utc};

/// How long the holder of `sequence_number` should expect to wait.
///
/// Position 1 still waits one full service unit: the patient ahead of nobody
/// is told "one consultation from now", never "no wait".
pub fn wait_duration(sequence_number: u32, avg_service_duration: Duration) -> Duration {
    avg_service_duration * sequence_number.max(1) as i32
}

/// Pure estimate of when the ticket holder will be called. No I/O, no state;
/// safe to recompute on every display refresh. Strictly increasing in
/// `sequence_number` for a fixed `now`.
pub fn estimated_call_time(
    sequence_number: u32,
    avg_service_duration: Duration,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    now + wait_duration(sequence_number, avg_service_duration)
}
