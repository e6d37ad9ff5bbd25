use boggle_types::GamePhase;
use chrono::{DateTime, Utc};

/// Derives the current lifecycle phase from persisted state and wall-clock
/// time. Pure: `now` is always supplied by the caller, never sampled here,
/// and there is no background timer anywhere in the system.
///
/// `Completed` is sticky. Once a caller observes it, the caller is expected
/// to persist it so the phase can never regress even though it is re-derived
/// on every access.
pub fn derive_phase(
    persisted: GamePhase,
    start_time: Option<DateTime<Utc>>,
    time_limit_secs: Option<i64>,
    now: DateTime<Utc>,
) -> GamePhase {
    match persisted {
        GamePhase::Completed => GamePhase::Completed,
        GamePhase::Pending => GamePhase::Pending,
        GamePhase::Active => match (start_time, time_limit_secs) {
            (Some(start), Some(limit)) if (now - start).num_seconds() >= limit => {
                GamePhase::Completed
            }
            _ => GamePhase::Active,
        },
    }
}

/// Seconds remaining before the game expires, clamped at zero.
pub fn time_left(start_time: DateTime<Utc>, time_limit_secs: i64, now: DateTime<Utc>) -> i64 {
    (time_limit_secs - (now - start_time).num_seconds()).max(0)
}
