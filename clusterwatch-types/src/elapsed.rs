//! Human-readable elapsed time for status messages.
//!
//! Spans are shown with the largest non-zero unit and the unit directly
//! below it, so a message that has been live for a while reads `3h 10m`
//! rather than `3h 10m 42s`.

use chrono::TimeDelta;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const YEAR: i64 = 365 * DAY;

/// Unit suffix and size in seconds, largest first.
const UNITS: &[(&str, i64)] = &[("y", YEAR), ("d", DAY), ("h", HOUR), ("m", MINUTE), ("s", 1)];

/// Format an elapsed span, e.g. `"3h 10m"`, `"2d 0h"`, `"45s"`.
///
/// Zero formats as `"0s"`. Negative spans (clock skew between us and the
/// chat server) get a leading `-`.
pub fn format_elapsed(delta: TimeDelta) -> String {
    let total = delta.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let mut rest = total.unsigned_abs() as i64;

    let mut values = [0i64; 5];
    for (slot, (_, size)) in values.iter_mut().zip(UNITS) {
        *slot = rest / size;
        rest %= size;
    }

    let Some(first) = values.iter().position(|v| *v > 0) else {
        return "0s".to_string();
    };

    let segments: Vec<String> = (first..UNITS.len())
        .take(2)
        .map(|i| format!("{}{}", values[i], UNITS[i].0))
        .collect();

    format!("{}{}", sign, segments.join(" "))
}
