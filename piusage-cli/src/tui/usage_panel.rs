//! The usage panel: every provider, every stored account.

use chrono::{DateTime, Utc};
use piusage_core::{ProviderKind, ProviderStatus, Theme, ThemeColor, UsageSnapshot};
use piusage_providers::ProviderUsage;

use super::frame::{boxed, window_row};
use super::{Action, Component, Key, Panel, PanelState};

const TITLE: &str = "Usage";
const RECOMMENDED_TAG: &str = "★ recommended";
const ACTIVE_MARK: &str = "●";
const INACTIVE_MARK: &str = "○";
const CURSOR: &str = "›";

/// What the panel shows once loaded.
#[derive(Debug, Clone, Default)]
pub struct UsageData {
    /// Per-provider usage, in display order.
    pub providers: Vec<ProviderUsage>,
    /// Status page results, if fetched.
    pub statuses: Vec<(ProviderKind, ProviderStatus)>,
    /// When the fetch finished; reset labels count from here.
    pub fetched_at: DateTime<Utc>,
}

impl UsageData {
    fn status(&self, kind: ProviderKind) -> Option<&ProviderStatus> {
        self.statuses
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, status)| status)
    }
}

/// A row the cursor can stop on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Selectable {
    provider: usize,
    key: String,
}

/// Usage overview with account switching.
#[derive(Debug)]
pub struct UsagePanel {
    state: PanelState,
    data: UsageData,
    rows: Vec<Selectable>,
    cursor: usize,
    bar_width: usize,
}

impl UsagePanel {
    /// Empty panel in the loading state.
    pub fn new(bar_width: usize) -> Self {
        Self {
            state: PanelState::Loading,
            data: UsageData::default(),
            rows: Vec::new(),
            cursor: 0,
            bar_width,
        }
    }

    fn selectable_rows(data: &UsageData) -> Vec<Selectable> {
        data.providers
            .iter()
            .enumerate()
            .filter(|(_, usage)| usage.kind.supports_account_switching())
            .flat_map(|(provider, usage)| {
                usage.visible().filter_map(move |snapshot| {
                    Some(Selectable {
                        provider,
                        key: snapshot.account_key.clone()?,
                    })
                })
            })
            .collect()
    }

    fn selected(&self) -> Option<&Selectable> {
        self.rows.get(self.cursor)
    }

    fn is_selected(&self, provider: usize, snapshot: &UsageSnapshot) -> bool {
        self.selected().is_some_and(|row| {
            row.provider == provider && snapshot.account_key.as_deref() == Some(row.key.as_str())
        })
    }

    fn status_line(&self, kind: ProviderKind, theme: &dyn Theme) -> String {
        let name = theme.bold(kind.display_name());
        match self.data.status(kind) {
            Some(status) => {
                let color = if status.is_operational() {
                    ThemeColor::Success
                } else if status.has_issues() {
                    ThemeColor::Warning
                } else {
                    ThemeColor::Muted
                };
                format!(
                    "{name}  {}",
                    theme.fg(
                        color,
                        &format!("{} {}", status.indicator.symbol(), status.description)
                    )
                )
            }
            None => name,
        }
    }

    fn account_lines(
        &self,
        provider: usize,
        usage: &ProviderUsage,
        snapshot: &UsageSnapshot,
        theme: &dyn Theme,
    ) -> Vec<String> {
        let key = snapshot.account_key.as_deref();
        let is_active = key.is_some() && key == usage.active_key.as_deref();
        let is_recommended = key.is_some() && key == usage.recommended.as_deref();

        let cursor = if self.is_selected(provider, snapshot) {
            theme.fg(ThemeColor::Accent, CURSOR)
        } else {
            " ".to_string()
        };
        let mark = if is_active {
            theme.fg(ThemeColor::Success, ACTIVE_MARK)
        } else if key.is_some() {
            theme.fg(ThemeColor::Muted, INACTIVE_MARK)
        } else {
            " ".to_string()
        };
        let name = snapshot
            .email
            .as_deref()
            .or(key)
            .unwrap_or(snapshot.display_name.as_str());

        let mut header = format!("{cursor} {mark} {name}");
        if let Some(plan) = &snapshot.plan {
            header.push_str(&format!("  {}", theme.fg(ThemeColor::Info, plan)));
        }
        if is_recommended {
            header.push_str(&format!("  {}", theme.fg(ThemeColor::Success, RECOMMENDED_TAG)));
        }

        let mut lines = vec![header];
        for window in &snapshot.windows {
            lines.push(format!(
                "    {}",
                window_row(window, self.bar_width, self.data.fetched_at, theme)
            ));
        }
        if let Some(error) = &snapshot.error {
            lines.push(format!("    {}", theme.dim(error)));
        }
        lines
    }

    fn body(&self, theme: &dyn Theme) -> Vec<String> {
        let mut lines = Vec::new();
        for (provider, usage) in self.data.providers.iter().enumerate() {
            if usage.is_unconfigured() {
                continue;
            }
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(self.status_line(usage.kind, theme));
            for snapshot in usage.visible() {
                lines.extend(self.account_lines(provider, usage, snapshot, theme));
            }
        }
        if lines.is_empty() {
            lines.push(theme.dim("No accounts configured. Log in with the pi agent first."));
        }
        lines
    }

    fn footer(&self, theme: &dyn Theme) -> String {
        match self.state {
            PanelState::Loading => theme.dim("Fetching usage… · esc close"),
            PanelState::Switching => match self.selected() {
                Some(row) => theme.fg(ThemeColor::Accent, &format!("Switching to {}…", row.key)),
                None => String::new(),
            },
            PanelState::Ready | PanelState::Closed if self.rows.is_empty() => {
                theme.dim("esc close")
            }
            PanelState::Ready | PanelState::Closed => {
                theme.dim("↑↓ select · enter switch · esc close")
            }
        }
    }
}

impl Component for UsagePanel {
    fn handle_key(&mut self, key: Key) -> Action {
        match self.state {
            PanelState::Switching | PanelState::Closed => Action::None,
            PanelState::Loading if key.is_close() => {
                self.state = PanelState::Closed;
                Action::Close
            }
            PanelState::Loading => Action::None,
            PanelState::Ready => {
                if key.is_close() {
                    self.state = PanelState::Closed;
                    return Action::Close;
                }
                if key.is_up() {
                    self.cursor = self.cursor.saturating_sub(1);
                } else if key.is_down() {
                    if self.cursor + 1 < self.rows.len() {
                        self.cursor += 1;
                    }
                } else if key == Key::Enter {
                    let Some(row) = self.selected().cloned() else {
                        return Action::None;
                    };
                    let usage = &self.data.providers[row.provider];
                    if usage.active_key.as_deref() == Some(row.key.as_str()) {
                        self.state = PanelState::Closed;
                        return Action::Close;
                    }
                    self.state = PanelState::Switching;
                    return Action::Switch {
                        prefix: usage.kind.key_prefix().to_string(),
                        key: row.key,
                    };
                }
                Action::None
            }
        }
    }

    fn render(&self, width: usize, theme: &dyn Theme) -> Vec<String> {
        let mut lines = if self.state == PanelState::Loading {
            vec![theme.dim("Loading…")]
        } else {
            self.body(theme)
        };
        lines.push(String::new());
        lines.push(self.footer(theme));
        boxed(TITLE, &lines, width, theme)
    }
}

impl Panel for UsagePanel {
    type Data = UsageData;

    fn loaded(&mut self, data: UsageData) {
        self.rows = Self::selectable_rows(&data);
        self.cursor = self
            .rows
            .iter()
            .position(|row| {
                data.providers[row.provider].active_key.as_deref() == Some(row.key.as_str())
            })
            .unwrap_or(0);
        self.data = data;
        if self.state == PanelState::Loading {
            self.state = PanelState::Ready;
        }
    }

    fn state(&self) -> PanelState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::frame::plain;
    use chrono::Duration;
    use piusage_core::{CredentialEntry, PlainTheme, RateWindow, NO_API_KEY};
    use piusage_store::CredentialStore;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn snapshot(kind: ProviderKind, key: &str, email: &str, used: f64) -> UsageSnapshot {
        let mut s = UsageSnapshot::new(kind).for_account(key);
        s.email = Some(email.to_string());
        s.push_window(RateWindow::new("5h", used).resetting_at(Some(now() + Duration::hours(2))));
        s
    }

    fn data() -> UsageData {
        let mut store = CredentialStore::new("/tmp/auth.json");
        for key in ["anthropic", "anthropic-1"] {
            store.insert(key, &CredentialEntry::oauth("t")).unwrap();
        }
        let claude = ProviderUsage::new(
            ProviderKind::Claude,
            vec![
                snapshot(ProviderKind::Claude, "anthropic", "a@x.io", 90.0),
                snapshot(ProviderKind::Claude, "anthropic-1", "b@x.io", 10.0),
            ],
            &store,
            now(),
        );
        let zai = ProviderUsage::new(
            ProviderKind::Zai,
            vec![UsageSnapshot::with_error(ProviderKind::Zai, NO_API_KEY)],
            &store,
            now(),
        );
        UsageData {
            providers: vec![claude, zai],
            statuses: Vec::new(),
            fetched_at: now(),
        }
    }

    fn text(panel: &UsagePanel) -> String {
        panel
            .render(80, &PlainTheme)
            .iter()
            .map(|l| plain(l))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_loading_state() {
        let mut panel = UsagePanel::new(10);
        assert_eq!(panel.state(), PanelState::Loading);
        assert!(text(&panel).contains("Loading"));
        assert_eq!(panel.handle_key(Key::Enter), Action::None);
        assert_eq!(panel.handle_key(Key::Escape), Action::Close);
        assert_eq!(panel.state(), PanelState::Closed);
    }

    #[test]
    fn test_render_marks_active_and_recommended() {
        let mut panel = UsagePanel::new(10);
        panel.loaded(data());
        let out = text(&panel);

        assert!(out.contains("› ● a@x.io"), "{out}");
        assert!(out.contains("○ b@x.io  ★ recommended"), "{out}");
        assert!(out.contains("█████████░  90%  2h"), "{out}");
        assert!(!out.contains("Z.AI"), "unconfigured provider is hidden");
    }

    #[test]
    fn test_enter_on_other_account_switches_once() {
        let mut panel = UsagePanel::new(10);
        panel.loaded(data());
        assert_eq!(panel.handle_key(Key::Down), Action::None);
        assert_eq!(
            panel.handle_key(Key::Enter),
            Action::Switch {
                prefix: "anthropic".into(),
                key: "anthropic-1".into()
            }
        );
        assert_eq!(panel.state(), PanelState::Switching);
        assert_eq!(panel.handle_key(Key::Enter), Action::None);
        assert!(text(&panel).contains("Switching to anthropic-1"));
    }

    #[test]
    fn test_enter_on_active_account_closes() {
        let mut panel = UsagePanel::new(10);
        panel.loaded(data());
        assert_eq!(panel.handle_key(Key::Up), Action::None);
        assert_eq!(panel.handle_key(Key::Enter), Action::Close);
    }

    #[test]
    fn test_error_rows_stay_visible() {
        let mut data = data();
        data.providers[1].snapshots = vec![UsageSnapshot::with_error(ProviderKind::Zai, "http 500")];
        let mut panel = UsagePanel::new(10);
        panel.loaded(data);
        let out = text(&panel);
        assert!(out.contains("Z.AI"), "{out}");
        assert!(out.contains("http 500"), "{out}");
    }

    #[test]
    fn test_unconfigured_rows_hidden_error_rows_kept() {
        use piusage_core::NO_CREDENTIALS;

        let mut store = CredentialStore::new("/tmp/auth.json");
        store.insert("openai-codex", &CredentialEntry::default()).unwrap();
        store.insert("openai-codex-1", &CredentialEntry::oauth("t")).unwrap();
        let codex = ProviderUsage::new(
            ProviderKind::Codex,
            vec![
                UsageSnapshot::with_error(ProviderKind::Codex, NO_CREDENTIALS)
                    .for_account("openai-codex"),
                UsageSnapshot::with_error(ProviderKind::Codex, "http 500")
                    .for_account("openai-codex-1"),
            ],
            &store,
            now(),
        );
        let mut panel = UsagePanel::new(10);
        panel.loaded(UsageData {
            providers: vec![codex],
            statuses: Vec::new(),
            fetched_at: now(),
        });

        let out = text(&panel);
        assert!(out.contains("openai-codex-1"), "{out}");
        assert!(out.contains("http 500"), "{out}");
        assert!(!out.contains(NO_CREDENTIALS), "{out}");
        let bare_rows = out
            .lines()
            .filter(|l| l.contains("openai-codex") && !l.contains("openai-codex-1"))
            .count();
        assert_eq!(bare_rows, 0, "{out}");
    }

    #[test]
    fn test_empty_panel() {
        let mut panel = UsagePanel::new(10);
        panel.loaded(UsageData::default());
        assert!(text(&panel).contains("No accounts configured"));
        assert_eq!(panel.handle_key(Key::Enter), Action::None);
        assert_eq!(panel.handle_key(Key::Char('q')), Action::Close);
    }
}
