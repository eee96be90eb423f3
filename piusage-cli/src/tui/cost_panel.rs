//! The cost panel: spend per provider and model, one tab per period.

use piusage_core::format::{format_cost, format_tokens};
use piusage_core::{CostPeriod, CostReport, ProviderCost, Theme, ThemeColor};

use super::frame::{boxed, ratio_bar};
use super::{Action, Component, Key, Panel, PanelState};

const TITLE: &str = "Cost";
const BAR_WIDTH: usize = 16;

/// Spend browser over session logs.
#[derive(Debug)]
pub struct CostPanel {
    state: PanelState,
    tabs: Vec<CostPeriod>,
    tab: usize,
    reports: Vec<CostReport>,
    cursor: usize,
    /// Provider whose logs the next Backspace deletes.
    confirm_delete: Option<String>,
    /// Provider whose logs are being deleted; keys are ignored meanwhile.
    deleting: Option<String>,
}

/// Tabs for a `cost` invocation: a custom day count goes first.
pub fn tabs_for(days: Option<u32>) -> Vec<CostPeriod> {
    let mut tabs = Vec::with_capacity(4);
    if let Some(days) = days.filter(|d| *d > 0) {
        tabs.push(CostPeriod::Days(days));
    }
    tabs.extend_from_slice(CostPeriod::tabs());
    tabs
}

impl CostPanel {
    /// Panel over `tabs`, opened on `initial` if present.
    pub fn new(tabs: Vec<CostPeriod>, initial: CostPeriod) -> Self {
        let tab = tabs.iter().position(|t| *t == initial).unwrap_or(0);
        Self {
            state: PanelState::Loading,
            tabs,
            tab,
            reports: Vec::new(),
            cursor: 0,
            confirm_delete: None,
            deleting: None,
        }
    }

    /// Periods this panel needs reports for, in tab order.
    pub fn tabs(&self) -> &[CostPeriod] {
        &self.tabs
    }

    fn report(&self) -> Option<&CostReport> {
        let period = self.tabs.get(self.tab)?;
        self.reports.iter().find(|r| r.period == *period)
    }

    fn providers(&self) -> &[ProviderCost] {
        self.report().map_or(&[], |r| r.providers.as_slice())
    }

    /// Arms deletion for the selected provider, or fires it when armed.
    fn delete_key(&mut self) -> Action {
        let Some(provider) = self.providers().get(self.cursor).map(|p| p.provider.clone()) else {
            return Action::None;
        };
        if self.confirm_delete.as_deref() != Some(provider.as_str()) {
            self.confirm_delete = Some(provider);
            return Action::None;
        }
        self.confirm_delete = None;
        self.deleting = Some(provider.clone());
        Action::DeleteLogs { provider }
    }

    fn footer(&self, theme: &dyn Theme) -> String {
        if let Some(provider) = &self.deleting {
            return theme.dim(&format!("Deleting {provider} session logs…"));
        }
        if let Some(provider) = &self.confirm_delete {
            return theme.fg(
                ThemeColor::Warning,
                &format!("backspace again deletes {provider} session logs · any other key cancels"),
            );
        }
        theme.dim("←→ period · ↑↓ provider · ⌫ delete logs · esc close")
    }

    fn tab_bar(&self, theme: &dyn Theme) -> String {
        self.tabs
            .iter()
            .enumerate()
            .map(|(i, period)| {
                let label = format!(" {} ", period.label());
                if i == self.tab {
                    theme.bold(&theme.fg(ThemeColor::Accent, &format!("[{label}]")))
                } else {
                    theme.dim(&format!(" {label} "))
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }

    fn provider_lines(&self, report: &CostReport, theme: &dyn Theme) -> Vec<String> {
        let max = report
            .providers
            .iter()
            .map(ProviderCost::cost_usd)
            .fold(0.0_f64, f64::max);

        let mut lines = Vec::new();
        for (i, provider) in report.providers.iter().enumerate() {
            let selected = i == self.cursor;
            let cursor = if selected {
                theme.fg(ThemeColor::Accent, "›")
            } else {
                " ".to_string()
            };
            let name = format!("{:<16}", provider.provider);
            lines.push(format!(
                "{cursor} {} {} {:>9}  {:>7} tok  {:>5} msg",
                if selected { theme.bold(&name) } else { name },
                ratio_bar(provider.cost_usd(), max, BAR_WIDTH, theme),
                format_cost(provider.cost_usd()),
                format_tokens(provider.total_tokens()),
                provider.messages(),
            ));

            if selected {
                for model in &provider.models {
                    let speed = model
                        .tokens_per_second()
                        .map(|tps| format!("  {tps:.1} tok/s"))
                        .unwrap_or_default();
                    lines.push(theme.dim(&format!(
                        "    {:<30} {:>9}  {:>7} tok  {:>5} msg{speed}",
                        model.model,
                        format_cost(model.cost_usd),
                        format_tokens(model.total_tokens()),
                        model.messages,
                    )));
                }
            }
        }
        lines
    }
}

impl Component for CostPanel {
    fn handle_key(&mut self, key: Key) -> Action {
        if self.deleting.is_some() {
            return Action::None;
        }
        if self.confirm_delete.is_some() && key != Key::Backspace {
            self.confirm_delete = None;
            return Action::None;
        }
        if key.is_close() {
            self.state = PanelState::Closed;
            return Action::Close;
        }
        if self.state != PanelState::Ready {
            return Action::None;
        }

        match key {
            Key::Backspace => return self.delete_key(),
            Key::Left | Key::Char('h') => {
                self.tab = self.tab.checked_sub(1).unwrap_or(self.tabs.len().saturating_sub(1));
                self.cursor = 0;
            }
            Key::Right | Key::Tab | Key::Char('l') => {
                self.tab = if self.tab + 1 < self.tabs.len() { self.tab + 1 } else { 0 };
                self.cursor = 0;
            }
            k if k.is_up() => self.cursor = self.cursor.saturating_sub(1),
            k if k.is_down() => {
                if self.cursor + 1 < self.providers().len() {
                    self.cursor += 1;
                }
            }
            _ => {}
        }
        Action::None
    }

    fn render(&self, width: usize, theme: &dyn Theme) -> Vec<String> {
        let mut lines = vec![self.tab_bar(theme), String::new()];

        match (self.state, self.report()) {
            (PanelState::Loading, _) => lines.push(theme.dim("Scanning session logs…")),
            (_, None) => lines.push(theme.dim("No data for this period.")),
            (_, Some(report)) if report.is_empty() => {
                lines.push(theme.dim(&format!(
                    "No usage recorded ({} sessions scanned).",
                    report.sessions_scanned
                )));
            }
            (_, Some(report)) => {
                lines.extend(self.provider_lines(report, theme));
                lines.push(String::new());
                lines.push(theme.bold(&format!(
                    "Total {}  ·  {} tokens  ·  {} messages  ·  {} sessions",
                    format_cost(report.total_cost_usd()),
                    format_tokens(report.total_tokens()),
                    report.total_messages(),
                    report.sessions_scanned,
                )));
            }
        }

        lines.push(String::new());
        lines.push(self.footer(theme));
        boxed(TITLE, &lines, width, theme)
    }
}

impl Panel for CostPanel {
    type Data = Vec<CostReport>;

    fn loaded(&mut self, reports: Vec<CostReport>) {
        self.reports = reports;
        self.cursor = 0;
        self.deleting = None;
        if self.state == PanelState::Loading {
            self.state = PanelState::Ready;
        }
    }

    fn state(&self) -> PanelState {
        self.state
    }
}
