//! Line building blocks shared by the panels.
//!
//! Panels render to plain `String` lines that may carry ANSI color. Widths
//! are always measured on the visible text.

use chrono::{DateTime, Utc};
use piusage_core::format::{format_percent, format_reset_label};
use piusage_core::{RateWindow, Theme, ThemeColor};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Minimum inner width of a box.
pub const MIN_INNER_WIDTH: usize = 20;

/// Terminal columns taken by `text`, ignoring ANSI escape sequences.
/// Wide characters count two.
pub fn visible_width(text: &str) -> usize {
    plain(text).width()
}

/// `text` stripped of escape sequences.
pub fn plain(text: &str) -> String {
    String::from_utf8_lossy(&strip_ansi_escapes::strip(text)).into_owned()
}

/// Pads or truncates `text` to exactly `width` visible columns.
///
/// Colored text that does not fit loses its color when truncated.
pub fn fit(text: &str, width: usize) -> String {
    let visible = visible_width(text);
    if visible <= width {
        return format!("{text}{}", " ".repeat(width - visible));
    }
    if width == 0 {
        return String::new();
    }
    let mut truncated = String::new();
    let mut used = 0;
    for c in plain(text).chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        used += w;
        truncated.push(c);
    }
    truncated.push('…');
    // A wide character that did not fit leaves one column to fill.
    truncated.push_str(&" ".repeat(width - 1 - used));
    truncated
}

/// Wraps `lines` in a box of total `width` with `title` in the top border.
pub fn boxed(title: &str, lines: &[String], width: usize, theme: &dyn Theme) -> Vec<String> {
    let inner = width.saturating_sub(4).max(MIN_INNER_WIDTH);
    let title = fit(&format!(" {title} "), inner.min(visible_width(title) + 2));
    let title_width = visible_width(&title);

    let mut out = Vec::with_capacity(lines.len() + 2);
    out.push(format!(
        "{}{}{}",
        theme.fg(ThemeColor::Border, "┌─"),
        theme.bold(&theme.fg(ThemeColor::Accent, &title)),
        theme.fg(
            ThemeColor::Border,
            &format!("{}┐", "─".repeat((inner + 1).saturating_sub(title_width)))
        ),
    ));
    let side = theme.fg(ThemeColor::Border, "│");
    for line in lines {
        out.push(format!("{side} {} {side}", fit(line, inner)));
    }
    out.push(theme.fg(
        ThemeColor::Border,
        &format!("└{}┘", "─".repeat(inner + 2)),
    ));
    out
}

/// Usage bar of `width` cells, filled by percentage used.
pub fn usage_bar(used_percent: f64, width: usize, theme: &dyn Theme) -> String {
    let used = used_percent.clamp(0.0, 100.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((used / 100.0) * width as f64).round() as usize;
    let bar = format!(
        "{}{}",
        BAR_FULL.to_string().repeat(filled.min(width)),
        BAR_EMPTY.to_string().repeat(width.saturating_sub(filled))
    );
    theme.fg(ThemeColor::for_used_percent(used), &bar)
}

/// Bar scaled to `value / max`, for cost charts.
pub fn ratio_bar(value: f64, max: f64, width: usize, theme: &dyn Theme) -> String {
    let ratio = if max > 0.0 { (value / max).clamp(0.0, 1.0) } else { 0.0 };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = (ratio * width as f64).round() as usize;
    theme.fg(
        ThemeColor::Info,
        &format!(
            "{}{}",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(width.saturating_sub(filled))
        ),
    )
}

/// One window row: `5h    ████░░░░  40%  resets 2h 10m`.
pub fn window_row(
    window: &RateWindow,
    bar_width: usize,
    now: DateTime<Utc>,
    theme: &dyn Theme,
) -> String {
    let percent = format!("{:>4}", format_percent(window.used_percent));
    format!(
        "{:<6} {} {}  {}",
        window.label,
        usage_bar(window.used_percent, bar_width, theme),
        theme.fg(ThemeColor::for_used_percent(window.used_percent), &percent),
        theme.dim(&format_reset_label(window.resets_at, now)),
    )
}

/// Compact one-line summary: `5h 40% · Week 12%`.
pub fn window_summary(windows: &[RateWindow], theme: &dyn Theme) -> String {
    windows
        .iter()
        .map(|w| {
            format!(
                "{} {}",
                w.label,
                theme.fg(
                    ThemeColor::for_used_percent(w.used_percent),
                    &format_percent(w.used_percent)
                )
            )
        })
        .collect::<Vec<_>>()
        .join(" · ")
}
