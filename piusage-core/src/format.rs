//! Human-readable formatting for reset times, token counts and costs.

use chrono::{DateTime, Local, Utc};

/// Formats the time until a window resets.
///
/// | remaining        | output            |
/// |------------------|-------------------|
/// | already passed   | `now`             |
/// | under a minute   | `<1m`             |
/// | under an hour    | `59m`             |
/// | under a day      | `3h`, `3h 20m`    |
/// | under a week     | `1d`, `1d 1h`     |
/// | a week or more   | `Mar 14` (local)  |
pub fn format_reset_time(resets_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (resets_at - now).num_seconds();
    if secs <= 0 {
        return "now".to_string();
    }

    let minutes = secs / 60;
    if minutes < 1 {
        return "<1m".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m");
    }

    let hours = minutes / 60;
    if hours < 24 {
        let rem = minutes % 60;
        return if rem == 0 {
            format!("{hours}h")
        } else {
            format!("{hours}h {rem}m")
        };
    }

    let days = hours / 24;
    if days < 7 {
        let rem = hours % 24;
        return if rem == 0 {
            format!("{days}d")
        } else {
            format!("{days}d {rem}h")
        };
    }

    resets_at.with_timezone(&Local).format("%b %-d").to_string()
}

/// Formats an optional reset time, empty when unknown.
pub fn format_reset_label(resets_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    resets_at
        .map(|at| format_reset_time(at, now))
        .unwrap_or_default()
}

/// Formats a token count compactly (`950`, `12.3k`, `4.5M`).
#[allow(clippy::cast_precision_loss)]
pub fn format_tokens(tokens: u64) -> String {
    match tokens {
        0..=999 => tokens.to_string(),
        1_000..=999_999 => format!("{:.1}k", tokens as f64 / 1_000.0),
        1_000_000..=999_999_999 => format!("{:.1}M", tokens as f64 / 1_000_000.0),
        _ => format!("{:.1}B", tokens as f64 / 1_000_000_000.0),
    }
}

/// Formats a USD amount. Non-zero amounts under a cent show as `<$0.01`.
pub fn format_cost(usd: f64) -> String {
    if usd > 0.0 && usd < 0.01 {
        "<$0.01".to_string()
    } else {
        format!("${usd:.2}")
    }
}

/// Formats a percentage without decimals.
pub fn format_percent(percent: f64) -> String {
    format!("{percent:.0}%")
}
