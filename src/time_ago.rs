use chrono::{DateTime, Utc};

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 86_400_000;

/// Relative age of `past` as seen from `now`. Future timestamps read as "Just now".
pub fn time_ago(past: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - past).num_milliseconds();

    if diff < MINUTE_MS {
        "Just now".to_string()
    } else if diff < HOUR_MS {
        format!("{}m ago", diff / MINUTE_MS)
    } else if diff < DAY_MS {
        format!("{}h ago", diff / HOUR_MS)
    } else {
        format!("{}d ago", diff / DAY_MS)
    }
}
