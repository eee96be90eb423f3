//! Terminal coloring capability.
//!
//! Panels never emit escape codes directly; they ask a [`Theme`] to color
//! text by role. [`AnsiTheme`] writes SGR sequences, [`PlainTheme`] returns
//! text unchanged (for `--plain` and tests).

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const BLUE: &str = "\x1b[34m";
const CYAN: &str = "\x1b[36m";
const GRAY: &str = "\x1b[90m";

/// Semantic color roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeColor {
    /// Titles and the selected row.
    Accent,
    /// Healthy usage and recommendations.
    Success,
    /// Usage getting close to the limit.
    Warning,
    /// Exhausted quota and errors.
    Error,
    /// Secondary text.
    Muted,
    /// Box borders.
    Border,
    /// Links and identifiers.
    Info,
}

impl ThemeColor {
    /// Color for a usage bar, by percentage used.
    pub fn for_used_percent(used_percent: f64) -> Self {
        let remaining = 100.0 - used_percent;
        if remaining < 20.0 {
            Self::Error
        } else if remaining < 50.0 {
            Self::Warning
        } else {
            Self::Success
        }
    }
}

/// The coloring surface panels render against.
pub trait Theme: Send + Sync {
    /// Colors `text` with a role.
    fn fg(&self, color: ThemeColor, text: &str) -> String;

    /// Bold text.
    fn bold(&self, text: &str) -> String;

    /// Dimmed text.
    fn dim(&self, text: &str) -> String;
}

/// ANSI escape sequence theme.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiTheme;

impl AnsiTheme {
    fn code(color: ThemeColor) -> &'static str {
        match color {
            ThemeColor::Accent => CYAN,
            ThemeColor::Success => GREEN,
            ThemeColor::Warning => YELLOW,
            ThemeColor::Error => RED,
            ThemeColor::Muted | ThemeColor::Border => GRAY,
            ThemeColor::Info => BLUE,
        }
    }
}

impl Theme for AnsiTheme {
    fn fg(&self, color: ThemeColor, text: &str) -> String {
        format!("{}{text}{RESET}", Self::code(color))
    }

    fn bold(&self, text: &str) -> String {
        format!("{BOLD}{text}{RESET}")
    }

    fn dim(&self, text: &str) -> String {
        format!("{DIM}{text}{RESET}")
    }
}

/// Theme that leaves text untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTheme;

impl Theme for PlainTheme {
    fn fg(&self, _color: ThemeColor, text: &str) -> String {
        text.to_string()
    }

    fn bold(&self, text: &str) -> String {
        text.to_string()
    }

    fn dim(&self, text: &str) -> String {
        text.to_string()
    }
}
