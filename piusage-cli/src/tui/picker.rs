//! One-provider account picker for `claude-select` and `codex-select`.

use piusage_core::{ProviderKind, Theme, ThemeColor, UsageSnapshot};
use piusage_providers::ProviderUsage;

use super::frame::{boxed, window_summary};
use super::{Action, Component, Key, Panel, PanelState};

/// Picks the account a provider should use.
#[derive(Debug)]
pub struct AccountPicker {
    kind: ProviderKind,
    state: PanelState,
    usage: Option<ProviderUsage>,
    cursor: usize,
}

impl AccountPicker {
    /// Picker for `kind`, loading.
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            state: PanelState::Loading,
            usage: None,
            cursor: 0,
        }
    }

    fn accounts(&self) -> Vec<&UsageSnapshot> {
        self.usage
            .iter()
            .flat_map(|u| u.snapshots.iter())
            .filter(|s| s.account_key.is_some())
            .collect()
    }

    fn line(&self, index: usize, snapshot: &UsageSnapshot, theme: &dyn Theme) -> String {
        let Some(usage) = &self.usage else {
            return String::new();
        };
        let key = snapshot.account_key.as_deref().unwrap_or_default();

        let cursor = if index == self.cursor {
            theme.fg(ThemeColor::Accent, "›")
        } else {
            " ".to_string()
        };
        let mark = if usage.active_key.as_deref() == Some(key) {
            theme.fg(ThemeColor::Success, "●")
        } else {
            theme.fg(ThemeColor::Muted, "○")
        };
        let name = snapshot.email.as_deref().unwrap_or(key);
        let name = if index == self.cursor {
            theme.bold(name)
        } else {
            name.to_string()
        };

        let mut line = format!("{cursor} {mark} {name}");
        if let Some(plan) = &snapshot.plan {
            line.push_str(&format!("  {}", theme.fg(ThemeColor::Info, plan)));
        }
        if snapshot.has_data() {
            line.push_str(&format!("  {}", window_summary(&snapshot.windows, theme)));
        }
        if let Some(error) = &snapshot.error {
            line.push_str(&format!("  {}", theme.dim(error)));
        }
        if usage.recommended.as_deref() == Some(key) {
            line.push_str(&format!("  {}", theme.fg(ThemeColor::Success, "★")));
        }
        line
    }
}

impl Component for AccountPicker {
    fn handle_key(&mut self, key: Key) -> Action {
        match self.state {
            PanelState::Switching | PanelState::Closed => return Action::None,
            PanelState::Loading => {
                if key.is_close() {
                    self.state = PanelState::Closed;
                    return Action::Close;
                }
                return Action::None;
            }
            PanelState::Ready => {}
        }

        if key.is_close() {
            self.state = PanelState::Closed;
            return Action::Close;
        }
        let count = self.accounts().len();
        if key.is_up() {
            self.cursor = self.cursor.saturating_sub(1);
        } else if key.is_down() && self.cursor + 1 < count {
            self.cursor += 1;
        } else if key == Key::Enter {
            let Some(selected) = self
                .accounts()
                .get(self.cursor)
                .and_then(|s| s.account_key.clone())
            else {
                return Action::None;
            };
            let is_active = self
                .usage
                .as_ref()
                .is_some_and(|u| u.active_key.as_deref() == Some(selected.as_str()));
            if is_active {
                self.state = PanelState::Closed;
                return Action::Close;
            }
            self.state = PanelState::Switching;
            return Action::Switch {
                prefix: self.kind.key_prefix().to_string(),
                key: selected,
            };
        }
        Action::None
    }

    fn render(&self, width: usize, theme: &dyn Theme) -> Vec<String> {
        let title = format!("{} accounts", self.kind.display_name());
        let mut lines = Vec::new();

        match self.state {
            PanelState::Loading => lines.push(theme.dim("Loading…")),
            _ => {
                let accounts = self.accounts();
                if accounts.is_empty() {
                    lines.push(theme.dim(&format!(
                        "No {} accounts stored.",
                        self.kind.display_name()
                    )));
                }
                for (index, snapshot) in accounts.into_iter().enumerate() {
                    lines.push(self.line(index, snapshot, theme));
                }
            }
        }

        lines.push(String::new());
        lines.push(match self.state {
            PanelState::Switching => theme.fg(ThemeColor::Accent, "Switching…"),
            _ => theme.dim("↑↓ select · enter use · esc cancel · ★ most headroom"),
        });
        boxed(&title, &lines, width, theme)
    }
}

impl Panel for AccountPicker {
    type Data = ProviderUsage;

    fn loaded(&mut self, usage: ProviderUsage) {
        self.cursor = usage
            .snapshots
            .iter()
            .filter(|s| s.account_key.is_some())
            .position(|s| s.account_key == usage.recommended)
            .unwrap_or(0);
        self.usage = Some(usage);
        if self.state == PanelState::Loading {
            self.state = PanelState::Ready;
        }
    }

    fn state(&self) -> PanelState {
        self.state
    }
}
